//! Prefix handling for registry symbol names.
//!
//! Commands carry a lower-case call prefix (`glClear`, `glXSwapBuffers`), constants an upper-case
//! namespace prefix (`GL_TEXTURE_2D`). Emitted code drops both.

/// Call prefixes, longest first so that `glX` wins over `gl`.
const COMMAND_PREFIXES: &[&str] = &["glX", "wgl", "egl", "gl"];

const ENUM_PREFIXES: &[&str] = &["GLX_", "WGL_", "EGL_", "GL_"];

/// Removes the call prefix from a command or parameter name.
///
/// The prefix only counts when it is followed by an upper-case letter or a digit, which makes the
/// operation idempotent: a stripped name never starts with a lower-case prefix again.
pub fn trim_command_prefix(name: &str) -> &str {
    for prefix in COMMAND_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            if rest
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            {
                return rest;
            }
        }
    }
    name
}

/// Removes the namespace prefix from a constant name, unless the result would start with a digit.
pub fn trim_enum_prefix(name: &str) -> &str {
    for prefix in ENUM_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            if rest.starts_with(|c: char| c.is_ascii_digit()) {
                return name;
            }
            return rest;
        }
    }
    name
}
