//! Loading and resolution of Khronos-style API registries (`gl.xml`, `glx.xml`, `wgl.xml`,
//! `egl.xml`).
//!
//! [`Registry::parse`] maps the document onto typed records, [`FeatureResolver`] replays the
//! feature revisions of one family up to a version, and [`TypeMap`] spells the resulting types
//! in a target language.

pub mod diagnostics;
pub mod error;
pub mod mapping;
pub mod naming;
pub mod registry;
pub mod resolver;
pub mod signature;
pub mod types;
pub mod version;

pub use diagnostics::{Diagnostic, Diagnostics, Outcome, SymbolKind};
pub use error::{RegistryError, ResolveError, SignatureError};
pub use mapping::{Dialect, TypeMap};
pub use registry::{
    EnumConstant, EnumGroup, EnumKind, EnumTable, FeatureRevision, Registry, SymbolRef,
    TypeDefinition,
};
pub use resolver::{FeatureResolver, ResolvedPackage};
pub use types::{CommandSignature, ParamLen, Parameter, PointerDepth, TypeDescriptor};
pub use version::{ParseVersionError, Version};
