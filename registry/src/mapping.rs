//! Table-driven translation of registry types into target-language spellings.
//!
//! Every dialect owns one table from registry base name to a [`Primitive`]. A primitive names the
//! native spelling used by wrapper signatures, the foreign spelling used by the raw declarations,
//! and the [`Strategy`] that decides how indirection and marshaling work for it.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::types::{PointerDepth, TypeDescriptor};

/// Placeholder for the marshaled value inside a conversion template.
pub const VALUE_PLACEHOLDER: &str = "{}";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    Rust,
    Go,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Identical representation on both sides.
    Cast,
    /// Foreign boolean. Native boolean only by value: behind a pointer the bytes are exposed.
    Boolean,
    /// `void`: the first level of indirection becomes the opaque address type.
    Untyped,
    /// A handle typedef that already is an address.
    Opaque,
    /// Pointer-sized integer. No spelling behind indirection.
    Scalar,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Primitive {
    pub native: &'static str,
    pub foreign: &'static str,
    pub strategy: Strategy,
}

type Table = HashMap<&'static str, Primitive>;

fn table(rows: &[(&[&'static str], &'static str, &'static str, Strategy)]) -> Table {
    let mut table = Table::new();
    for (names, native, foreign, strategy) in rows.iter().copied() {
        for name in names {
            table.insert(
                *name,
                Primitive {
                    native,
                    foreign,
                    strategy,
                },
            );
        }
    }
    table
}

/// Named types every emitted Go package declares for itself, as `(name, underlying type)`.
pub const GO_PACKAGE_TYPES: [(&str, &str); 2] = [("Bitfield", "uint32"), ("Enum", "uint32")];

/// Names the Go runtime support package (`glt`) declares.
pub const GO_RUNTIME_TYPES: [&str; 1] = ["Pointer"];

lazy_static! {
    static ref RUST_TABLE: Table = {
        use Strategy::*;
        table(&[
            (&["GLenum"], "u32", "u32", Cast),
            (&["GLbitfield"], "u32", "u32", Cast),
            (&["GLboolean"], "bool", "u8", Boolean),
            (&["GLbyte"], "i8", "i8", Cast),
            (&["GLubyte"], "u8", "u8", Cast),
            (&["GLchar", "GLcharARB"], "i8", "i8", Cast),
            (&["GLshort"], "i16", "i16", Cast),
            (&["GLushort"], "u16", "u16", Cast),
            (&["GLhalf", "GLhalfARB", "GLhalfNV"], "u16", "u16", Cast),
            (&["GLint", "GLsizei", "GLfixed", "GLclampx"], "i32", "i32", Cast),
            (&["GLuint"], "u32", "u32", Cast),
            (&["GLint64", "GLint64EXT"], "i64", "i64", Cast),
            (&["GLuint64", "GLuint64EXT"], "u64", "u64", Cast),
            (&["GLfloat", "GLclampf"], "f32", "f32", Cast),
            (&["GLdouble", "GLclampd"], "f64", "f64", Cast),
            (&["GLintptr", "GLintptrARB", "GLsizeiptr", "GLsizeiptrARB", "GLvdpauSurfaceNV"], "isize", "isize", Scalar),
            (&["void", "GLvoid"], "Pointer", "c_void", Untyped),
            (&["GLsync", "GLeglImageOES", "GLhandleARB"], "Pointer", "*mut c_void", Opaque),
        ])
    };

    static ref GO_TABLE: Table = {
        use Strategy::*;
        table(&[
            (&["GLenum"], "Enum", "C.GLenum", Cast),
            (&["GLbitfield"], "Bitfield", "C.GLbitfield", Cast),
            (&["GLboolean"], "bool", "C.GLboolean", Boolean),
            (&["GLbyte"], "int8", "C.GLbyte", Cast),
            (&["GLubyte"], "uint8", "C.GLubyte", Cast),
            (&["GLchar"], "int8", "C.GLchar", Cast),
            (&["GLcharARB"], "int8", "C.GLcharARB", Cast),
            (&["GLshort"], "int16", "C.GLshort", Cast),
            (&["GLushort"], "uint16", "C.GLushort", Cast),
            (&["GLhalfNV"], "uint16", "C.GLhalfNV", Cast),
            (&["GLint"], "int32", "C.GLint", Cast),
            (&["GLsizei"], "int32", "C.GLsizei", Cast),
            (&["GLfixed"], "int32", "C.GLfixed", Cast),
            (&["GLuint"], "uint32", "C.GLuint", Cast),
            (&["GLint64"], "int64", "C.GLint64", Cast),
            (&["GLint64EXT"], "int64", "C.GLint64EXT", Cast),
            (&["GLuint64"], "uint64", "C.GLuint64", Cast),
            (&["GLuint64EXT"], "uint64", "C.GLuint64EXT", Cast),
            (&["GLfloat"], "float32", "C.GLfloat", Cast),
            (&["GLclampf"], "float32", "C.GLclampf", Cast),
            (&["GLdouble"], "float64", "C.GLdouble", Cast),
            (&["GLclampd"], "float64", "C.GLclampd", Cast),
            (&["GLintptr"], "int", "C.GLintptr", Scalar),
            (&["GLintptrARB"], "int", "C.GLintptrARB", Scalar),
            (&["GLsizeiptr"], "int", "C.GLsizeiptr", Scalar),
            (&["GLsizeiptrARB"], "int", "C.GLsizeiptrARB", Scalar),
            (&["void", "GLvoid"], "glt.Pointer", "unsafe.Pointer", Untyped),
            (&["GLsync"], "glt.Pointer", "C.GLsync", Opaque),
            (&["GLeglImageOES"], "glt.Pointer", "C.GLeglImageOES", Opaque),
            (&["GLhandleARB"], "glt.Pointer", "C.GLhandleARB", Opaque),
        ])
    };
}

/// Spells `depth` levels of indirection around `target`.
fn indirect(dialect: Dialect, target: &str, is_const: bool, depth: usize) -> String {
    match dialect {
        Dialect::Go => format!("{}{target}", "*".repeat(depth)),
        Dialect::Rust => {
            let level = if is_const { "*const " } else { "*mut " };
            format!("{}{target}", level.repeat(depth))
        }
    }
}

/// Substitutes `value` into a conversion template.
pub fn apply(template: &str, value: &str) -> String {
    template.replace(VALUE_PLACEHOLDER, value)
}

/// The type mapping of one dialect.
#[derive(Copy, Clone, Debug)]
pub struct TypeMap {
    dialect: Dialect,
    table: &'static Table,
}

impl TypeMap {
    pub fn new(dialect: Dialect) -> Self {
        let table: &'static Table = match dialect {
            Dialect::Rust => &RUST_TABLE,
            Dialect::Go => &GO_TABLE,
        };
        Self { dialect, table }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn primitive(&self, base_name: &str) -> Option<&'static Primitive> {
        self.table.get(base_name)
    }

    /// The spelling wrapper signatures use, or `None` when the type cannot be expressed.
    pub fn render(&self, type_: &TypeDescriptor) -> Option<String> {
        let primitive = self.primitive(type_.base_name())?;
        let depth = type_.pointer_depth();
        let is_const = type_.is_const();
        match (primitive.strategy, depth) {
            (Strategy::Boolean, PointerDepth::Zero) => Some(primitive.native.to_string()),
            (Strategy::Boolean, _) => {
                let byte = match self.dialect {
                    Dialect::Rust => "u8",
                    Dialect::Go => "byte",
                };
                Some(indirect(self.dialect, byte, is_const, depth.count()))
            }
            (Strategy::Untyped, PointerDepth::Zero) => None,
            (Strategy::Untyped, _) => Some(indirect(
                self.dialect,
                primitive.native,
                is_const,
                depth.count() - 1,
            )),
            (Strategy::Scalar, PointerDepth::Zero) => Some(primitive.native.to_string()),
            (Strategy::Scalar, _) => None,
            (Strategy::Cast | Strategy::Opaque, _) => Some(indirect(
                self.dialect,
                primitive.native,
                is_const,
                depth.count(),
            )),
        }
    }

    /// The spelling the raw foreign declaration uses.
    pub fn render_foreign(&self, type_: &TypeDescriptor) -> Option<String> {
        let primitive = self.primitive(type_.base_name())?;
        let depth = type_.pointer_depth();
        match (primitive.strategy, depth) {
            (Strategy::Untyped, PointerDepth::Zero) => None,
            (Strategy::Scalar, PointerDepth::One | PointerDepth::Two) => None,
            (Strategy::Untyped, _) if self.dialect == Dialect::Go => Some(indirect(
                self.dialect,
                primitive.foreign,
                false,
                depth.count() - 1,
            )),
            _ => Some(indirect(
                self.dialect,
                primitive.foreign,
                type_.is_const(),
                depth.count(),
            )),
        }
    }

    /// Template turning a native value into its foreign representation, for arguments.
    pub fn conversion_expression(&self, type_: &TypeDescriptor) -> Option<String> {
        let native = self.render(type_)?;
        let foreign = self.render_foreign(type_)?;
        let strategy = self.primitive(type_.base_name())?.strategy;
        let depth = type_.pointer_depth();
        let template = match self.dialect {
            Dialect::Rust if native == foreign => VALUE_PLACEHOLDER.to_string(),
            Dialect::Rust => format!("{VALUE_PLACEHOLDER} as {foreign}"),
            Dialect::Go => match (strategy, depth) {
                (Strategy::Boolean, PointerDepth::Zero) => format!("glBool({VALUE_PLACEHOLDER})"),
                (Strategy::Cast | Strategy::Scalar, PointerDepth::Zero) => {
                    format!("({foreign})({VALUE_PLACEHOLDER})")
                }
                (Strategy::Untyped, PointerDepth::One) => {
                    format!("unsafe.Pointer({VALUE_PLACEHOLDER})")
                }
                _ => format!("({foreign})(unsafe.Pointer({VALUE_PLACEHOLDER}))"),
            },
        };
        Some(template)
    }

    /// Template turning a foreign result back into its native representation.
    pub fn return_conversion_expression(&self, type_: &TypeDescriptor) -> Option<String> {
        let native = self.render(type_)?;
        let foreign = self.render_foreign(type_)?;
        let strategy = self.primitive(type_.base_name())?.strategy;
        let depth = type_.pointer_depth();
        let template = match (self.dialect, strategy, depth) {
            (Dialect::Rust, Strategy::Boolean, PointerDepth::Zero) => {
                format!("{VALUE_PLACEHOLDER} != 0")
            }
            (Dialect::Rust, _, _) if native == foreign => VALUE_PLACEHOLDER.to_string(),
            (Dialect::Rust, _, _) => format!("{VALUE_PLACEHOLDER} as {native}"),
            (Dialect::Go, Strategy::Boolean, PointerDepth::Zero) => {
                format!("goBool({VALUE_PLACEHOLDER})")
            }
            (Dialect::Go, Strategy::Cast | Strategy::Scalar, PointerDepth::Zero) => {
                format!("({native})({VALUE_PLACEHOLDER})")
            }
            (Dialect::Go, Strategy::Untyped, PointerDepth::One) => {
                format!("({native})(uintptr({VALUE_PLACEHOLDER}))")
            }
            (Dialect::Go, Strategy::Opaque, PointerDepth::Zero) => {
                format!("({native})(uintptr(unsafe.Pointer({VALUE_PLACEHOLDER})))")
            }
            (Dialect::Go, _, _) => format!("({native})(unsafe.Pointer({VALUE_PLACEHOLDER}))"),
        };
        Some(template)
    }

    /// Whether every type crossing the boundary has a spelling. `void` returns are allowed.
    pub fn supports(&self, type_: &TypeDescriptor, is_return: bool) -> bool {
        (is_return && type_.is_void()) || self.render(type_).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(base: &str, is_const: bool, depth: PointerDepth) -> TypeDescriptor {
        TypeDescriptor::new(base, is_const, depth)
    }

    #[test]
    fn renders_primitives_with_indirection() {
        let rust = TypeMap::new(Dialect::Rust);
        let go = TypeMap::new(Dialect::Go);

        let t = ty("GLfloat", true, PointerDepth::One);
        assert_eq!(rust.render(&t).as_deref(), Some("*const f32"));
        assert_eq!(go.render(&t).as_deref(), Some("*float32"));

        let t = ty("GLchar", false, PointerDepth::Two);
        assert_eq!(rust.render(&t).as_deref(), Some("*mut *mut i8"));
        assert_eq!(go.render(&t).as_deref(), Some("**int8"));
    }

    #[test]
    fn pointer_depths_are_never_collapsed() {
        let go = TypeMap::new(Dialect::Go);
        let one = go.render(&ty("GLuint", false, PointerDepth::One));
        let two = go.render(&ty("GLuint", false, PointerDepth::Two));
        assert_ne!(one, two);
    }

    #[test]
    fn booleans_are_native_only_by_value() {
        let rust = TypeMap::new(Dialect::Rust);
        let go = TypeMap::new(Dialect::Go);
        let value = ty("GLboolean", false, PointerDepth::Zero);
        let pointer = ty("GLboolean", false, PointerDepth::One);

        assert_eq!(rust.render(&value).as_deref(), Some("bool"));
        assert_eq!(rust.render(&pointer).as_deref(), Some("*mut u8"));
        assert_eq!(go.render(&value).as_deref(), Some("bool"));
        assert_eq!(go.render(&pointer).as_deref(), Some("*byte"));

        assert_eq!(rust.conversion_expression(&value).as_deref(), Some("{} as u8"));
        assert_eq!(rust.return_conversion_expression(&value).as_deref(), Some("{} != 0"));
        assert_eq!(go.conversion_expression(&value).as_deref(), Some("glBool({})"));
    }

    #[test]
    fn void_pointers_become_the_opaque_address_type() {
        let rust = TypeMap::new(Dialect::Rust);
        let go = TypeMap::new(Dialect::Go);
        let one = ty("void", true, PointerDepth::One);
        let two = ty("void", false, PointerDepth::Two);

        assert_eq!(rust.render(&one).as_deref(), Some("Pointer"));
        assert_eq!(rust.render_foreign(&one).as_deref(), Some("*const c_void"));
        assert_eq!(rust.conversion_expression(&one).as_deref(), Some("{} as *const c_void"));
        assert_eq!(go.render(&one).as_deref(), Some("glt.Pointer"));
        assert_eq!(go.render(&two).as_deref(), Some("*glt.Pointer"));
        assert_eq!(go.render_foreign(&two).as_deref(), Some("*unsafe.Pointer"));
        assert_eq!(go.render(&ty("void", false, PointerDepth::Zero)), None);
    }

    #[test]
    fn unknown_and_unsupported_types_have_no_rendering() {
        let rust = TypeMap::new(Dialect::Rust);
        assert_eq!(rust.render(&ty("GLDEBUGPROC", false, PointerDepth::Zero)), None);
        assert_eq!(rust.render(&ty("GLintptr", false, PointerDepth::One)), None);
        assert_eq!(rust.conversion_expression(&ty("GLDEBUGPROC", false, PointerDepth::Zero)), None);
        assert!(rust.supports(&ty("void", false, PointerDepth::Zero), true));
        assert!(!rust.supports(&ty("void", false, PointerDepth::Zero), false));
    }

    #[test]
    fn go_conversions_go_through_cgo_types() {
        let go = TypeMap::new(Dialect::Go);
        let t = ty("GLfloat", true, PointerDepth::One);
        assert_eq!(
            go.conversion_expression(&t).as_deref(),
            Some("(*C.GLfloat)(unsafe.Pointer({}))")
        );
        let t = ty("GLenum", false, PointerDepth::Zero);
        assert_eq!(apply(&go.conversion_expression(&t).unwrap(), "mode"), "(C.GLenum)(mode)");
        assert_eq!(
            apply(&go.return_conversion_expression(&t).unwrap(), "r"),
            "(Enum)(r)"
        );
    }

    #[test]
    fn go_natives_are_builtin_or_declared() {
        const BUILTIN: &[&str] = &[
            "bool", "int", "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32",
            "uint64", "float32", "float64",
        ];
        for primitive in GO_TABLE.values() {
            let native = primitive.native;
            let declared = match native.strip_prefix("glt.") {
                Some(name) => GO_RUNTIME_TYPES.contains(&name),
                None => {
                    BUILTIN.contains(&native)
                        || GO_PACKAGE_TYPES.iter().any(|(name, _)| *name == native)
                }
            };
            assert!(declared, "{native} is not declared anywhere");
        }
    }

    #[test]
    fn identical_rust_representations_need_no_conversion() {
        let rust = TypeMap::new(Dialect::Rust);
        let t = ty("GLuint", false, PointerDepth::Zero);
        assert_eq!(rust.conversion_expression(&t).as_deref(), Some("{}"));
        let t = ty("GLsync", false, PointerDepth::Zero);
        assert_eq!(rust.render(&t).as_deref(), Some("Pointer"));
        assert_eq!(rust.conversion_expression(&t).as_deref(), Some("{} as *mut c_void"));
    }
}
