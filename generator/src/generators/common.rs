use glbind_registry::{
    CommandSignature, Diagnostic, Diagnostics, Dialect, EnumConstant, EnumKind, Outcome,
    Parameter, ResolvedPackage, TypeDefinition, TypeDescriptor, TypeMap,
};

use super::{EmitOptions, GenerateError};

/// Receives the parts of a package in emission order.
pub(super) trait PackageVisitor: Sized {
    fn visit_type_definition(
        &mut self,
        context: &mut GeneratorContext,
        type_definition: &TypeDefinition,
    ) -> Result<(), GenerateError>;

    fn visit_enum(
        &mut self,
        context: &mut GeneratorContext,
        constant: &EnumConstant,
        literal: EnumLiteral,
    ) -> Result<(), GenerateError>;

    /// Only called for commands whose every type has a rendering.
    fn visit_command(
        &mut self,
        context: &mut GeneratorContext,
        command: &CommandSignature,
    ) -> Result<(), GenerateError>;

    fn finish(self, context: &GeneratorContext) -> Result<String, GenerateError>;
}

pub(super) struct GeneratorContext<'a> {
    pub(super) package: &'a ResolvedPackage,
    pub(super) types: TypeMap,
    pub(super) options: EmitOptions<'a>,
    pub(super) diagnostics: Diagnostics,
}

impl<'a> GeneratorContext<'a> {
    pub(super) fn new(
        package: &'a ResolvedPackage,
        dialect: Dialect,
        options: EmitOptions<'a>,
    ) -> Self {
        Self {
            package,
            types: TypeMap::new(dialect),
            options,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Reference pages only describe the desktop family.
    pub(super) fn purpose(&self, command: &CommandSignature) -> Option<String> {
        if self.package.family != "gl" {
            return None;
        }
        self.options
            .docs?
            .annotation(self.package.version.major, &command.name)
    }

    /// Documentation lines for a wrapper: the summary, then one line per annotated parameter.
    pub(super) fn doc_lines(&self, command: &CommandSignature) -> Vec<String> {
        let mut lines: Vec<String> = self.purpose(command).into_iter().collect();
        for parameter in &command.parameters {
            if let Some(note) = parameter_note(parameter) {
                lines.push(note);
            }
        }
        lines
    }

    pub(super) fn linkage(&self) -> &'static Linkage {
        linkage(&self.package.family)
    }

    pub(super) fn title(&self) -> String {
        let package = self.package;
        match &package.profile {
            Some(profile) => format!("{} {} ({profile})", package.family, package.version),
            None => format!("{} {}", package.family, package.version),
        }
    }
}

fn parameter_note(parameter: &Parameter) -> Option<String> {
    let group = parameter.group.as_ref().map(|group| format!("group `{group}`"));
    let len = parameter.len.as_ref().map(|len| format!("length `{len}`"));
    let details: Vec<String> = group.into_iter().chain(len).collect();
    if details.is_empty() {
        None
    } else {
        Some(format!("`{}`: {}", parameter.name, details.join(", ")))
    }
}

/// The first type of `command` the dialect cannot spell.
fn unsupported_type<'c>(
    types: &TypeMap,
    command: &'c CommandSignature,
) -> Option<&'c TypeDescriptor> {
    if !types.supports(&command.return_type, true) {
        return Some(&command.return_type);
    }
    command
        .parameters
        .iter()
        .map(|p| &p.type_)
        .find(|t| !types.supports(t, false))
}

/// Walks `context.package` in emission order: type definitions as declared, then constants and
/// commands each sorted by name byte-wise.
pub(super) fn emit<V: PackageVisitor>(
    mut visitor: V,
    mut context: GeneratorContext,
) -> Result<Outcome<String>, GenerateError> {
    let package = context.package;

    for type_definition in &package.type_definitions {
        visitor.visit_type_definition(&mut context, type_definition)?;
    }

    let mut enums: Vec<&EnumConstant> = package.enums.values().collect();
    enums.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    for constant in enums {
        match EnumLiteral::parse(&constant.value, constant.kind) {
            Some(literal) => visitor.visit_enum(&mut context, constant, literal)?,
            None => context.diagnostics.push(Diagnostic::UnsupportedEnumValue {
                name: constant.name.clone(),
                value: constant.value.clone(),
            }),
        }
    }

    let mut commands: Vec<&CommandSignature> = package.commands.values().collect();
    commands.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    for command in commands {
        if let Some(type_) = unsupported_type(&context.types, command) {
            context.diagnostics.push(Diagnostic::UnsupportedType {
                command: command.name.clone(),
                ty: type_.clone(),
            });
            continue;
        }
        visitor.visit_command(&mut context, command)?;
    }

    let text = visitor.finish(&context)?;
    tracing::debug!(
        package = %context.title(),
        diagnostics = context.diagnostics.len(),
        "emitted package"
    );
    Ok(Outcome::new(text, context.diagnostics))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum LiteralType {
    Int32,
    Uint32,
    Bitmask,
    Uint64,
}

/// An enum value both dialects accept as an integer literal, C suffixes removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct EnumLiteral {
    pub(super) digits: String,
    pub(super) type_: LiteralType,
}

impl EnumLiteral {
    pub(super) fn parse(value: &str, kind: EnumKind) -> Option<Self> {
        let value = value.trim();
        let (body, wide) = if let Some(body) = value
            .strip_suffix("ull")
            .or_else(|| value.strip_suffix("ULL"))
        {
            (body, true)
        } else {
            (value.trim_end_matches(['u', 'U']), false)
        };

        let (negative, magnitude) = match body.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, body),
        };
        let parsed = match magnitude
            .strip_prefix("0x")
            .or_else(|| magnitude.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None if magnitude.bytes().all(|b| b.is_ascii_digit()) => magnitude.parse(),
            None => return None,
        }
        .ok()?;

        let type_ = if negative {
            if parsed > i32::MAX as u64 + 1 {
                return None;
            }
            LiteralType::Int32
        } else if wide || parsed > u64::from(u32::MAX) {
            LiteralType::Uint64
        } else if kind == EnumKind::Bitmask {
            LiteralType::Bitmask
        } else {
            LiteralType::Uint32
        };
        Some(Self {
            digits: body.to_string(),
            type_,
        })
    }
}

/// Where the native library lives on each platform.
#[derive(Debug)]
pub(super) struct Linkage {
    /// `(GOOS, LDFLAGS)`
    pub(super) ldflags: [(&'static str, &'static str); 3],
    /// `(target_os, library path)`
    pub(super) libraries: [(&'static str, &'static str); 3],
}

static OPENGL: Linkage = Linkage {
    ldflags: [
        ("darwin", "-framework OpenGL"),
        ("linux", "-lGL"),
        ("windows", "-lopengl32"),
    ],
    libraries: [
        ("macos", "/System/Library/Frameworks/OpenGL.framework/OpenGL"),
        ("linux", "libGL.so.1"),
        ("windows", "opengl32.dll"),
    ],
};

static GLES1: Linkage = Linkage {
    ldflags: [
        ("darwin", "-lGLESv1_CM"),
        ("linux", "-lGLESv1_CM"),
        ("windows", "-llibGLESv1_CM"),
    ],
    libraries: [
        ("macos", "libGLESv1_CM.dylib"),
        ("linux", "libGLESv1_CM.so.1"),
        ("windows", "libGLESv1_CM.dll"),
    ],
};

static GLES2: Linkage = Linkage {
    ldflags: [
        ("darwin", "-lGLESv2"),
        ("linux", "-lGLESv2"),
        ("windows", "-llibGLESv2"),
    ],
    libraries: [
        ("macos", "libGLESv2.dylib"),
        ("linux", "libGLESv2.so.2"),
        ("windows", "libGLESv2.dll"),
    ],
};

static EGL: Linkage = Linkage {
    ldflags: [
        ("darwin", "-lEGL"),
        ("linux", "-lEGL"),
        ("windows", "-llibEGL"),
    ],
    libraries: [
        ("macos", "libEGL.dylib"),
        ("linux", "libEGL.so.1"),
        ("windows", "libEGL.dll"),
    ],
};

pub(super) fn linkage(family: &str) -> &'static Linkage {
    match family {
        "gles1" => &GLES1,
        "gles2" | "glsc2" => &GLES2,
        "egl" => &EGL,
        _ => &OPENGL,
    }
}

#[cfg(test)]
mod tests {
    use glbind_registry::{PointerDepth, Version};

    use super::super::tests::{package, OPTIONS};
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl PackageVisitor for Recorder {
        fn visit_type_definition(
            &mut self,
            _context: &mut GeneratorContext,
            type_definition: &TypeDefinition,
        ) -> Result<(), GenerateError> {
            self.events.push(format!("type {}", type_definition.name));
            Ok(())
        }

        fn visit_enum(
            &mut self,
            _context: &mut GeneratorContext,
            constant: &EnumConstant,
            _literal: EnumLiteral,
        ) -> Result<(), GenerateError> {
            self.events.push(format!("enum {}", constant.name));
            Ok(())
        }

        fn visit_command(
            &mut self,
            _context: &mut GeneratorContext,
            command: &CommandSignature,
        ) -> Result<(), GenerateError> {
            self.events.push(format!("command {}", command.name));
            Ok(())
        }

        fn finish(self, _context: &GeneratorContext) -> Result<String, GenerateError> {
            Ok(self.events.join("\n"))
        }
    }

    #[test]
    fn visits_sorted_supported_symbols() {
        let package = package();
        let context = GeneratorContext::new(&package, Dialect::Rust, OPTIONS);
        let outcome = emit(Recorder::default(), context).unwrap();
        let events: Vec<&str> = outcome.value.lines().filter(|l| !l.starts_with("type")).collect();
        assert_eq!(
            events,
            [
                "enum COLOR_BUFFER_BIT",
                "enum FRONT",
                "enum GL_3D",
                "enum TIMEOUT_IGNORED",
                "command Clear",
                "command IsEnabled",
                "command MapBuffer",
                "command ShaderSource",
            ]
        );
        assert_eq!(
            outcome.diagnostics,
            [
                Diagnostic::UnsupportedEnumValue {
                    name: "ALIAS".into(),
                    value: "GL_FRONT".into(),
                },
                Diagnostic::UnsupportedType {
                    command: "DebugMessageCallback".into(),
                    ty: TypeDescriptor::new("GLDEBUGPROC", false, PointerDepth::Zero),
                },
            ]
        );
    }

    #[test]
    fn classifies_enum_literals() {
        let parse = |value| EnumLiteral::parse(value, EnumKind::Plain).map(|l| (l.digits, l.type_));
        assert_eq!(parse("0x0404"), Some(("0x0404".into(), LiteralType::Uint32)));
        assert_eq!(parse("0xFFFFFFFFu"), Some(("0xFFFFFFFF".into(), LiteralType::Uint32)));
        assert_eq!(
            parse("0xFFFFFFFFFFFFFFFFull"),
            Some(("0xFFFFFFFFFFFFFFFF".into(), LiteralType::Uint64))
        );
        assert_eq!(parse("-1"), Some(("-1".into(), LiteralType::Int32)));
        assert_eq!(parse("((EGLint)-1)"), None);
        assert_eq!(parse("GL_FRONT"), None);
        assert_eq!(parse(""), None);
        assert_eq!(
            EnumLiteral::parse("0x00004000", EnumKind::Bitmask).map(|l| l.type_),
            Some(LiteralType::Bitmask)
        );
    }

    #[test]
    fn documents_parameter_metadata() {
        let package = package();
        let context = GeneratorContext::new(&package, Dialect::Go, OPTIONS);
        let lines = context.doc_lines(&package.commands["ShaderSource"]);
        assert_eq!(lines, ["`string`: length `count`", "`length`: length `count`"]);
        assert_eq!(context.title(), "gl 2.0");
        assert_eq!(context.package.version, Version::new(2, 0));
        assert_eq!(context.linkage().ldflags[1], ("linux", "-lGL"));
        assert_eq!(linkage("gles2").libraries[1], ("linux", "libGLESv2.so.2"));
    }
}
