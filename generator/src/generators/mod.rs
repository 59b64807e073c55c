mod common;

#[cfg(feature = "generator-go")]
mod go;
#[cfg(feature = "generator-rust")]
mod rust;

#[cfg(not(any(feature = "generator-rust", feature = "generator-go")))]
compile_error!("At least one generator must be enabled");

use clap::ValueEnum;
use thiserror::Error;

use glbind_registry::{Dialect, Outcome, ResolvedPackage};

use crate::docs::DocIndex;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("emitted text could not be formatted")]
    Format(#[from] std::fmt::Error),
    #[cfg(feature = "generator-rust")]
    #[error("emitted Rust does not parse")]
    Syntax(#[from] syn::Error),
}

/// Inputs of one emission besides the package itself.
#[derive(Clone, Copy, Debug)]
pub struct EmitOptions<'a> {
    pub docs: Option<&'a DocIndex>,
    /// Import path of the Go support package.
    pub go_runtime: &'a str,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Generator {
    #[cfg(feature = "generator-rust")]
    Rust,
    #[cfg(feature = "generator-go")]
    Go,
}

impl Default for Generator {
    #[cfg(feature = "generator-rust")]
    fn default() -> Self {
        Self::Rust
    }

    #[cfg(not(feature = "generator-rust"))]
    fn default() -> Self {
        Self::Go
    }
}

impl Generator {
    pub fn dialect(self) -> Dialect {
        match self {
            #[cfg(feature = "generator-rust")]
            Self::Rust => Dialect::Rust,
            #[cfg(feature = "generator-go")]
            Self::Go => Dialect::Go,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            #[cfg(feature = "generator-rust")]
            Self::Rust => "rs",
            #[cfg(feature = "generator-go")]
            Self::Go => "go",
        }
    }

    pub fn generate(
        self,
        package: &ResolvedPackage,
        options: EmitOptions,
    ) -> Result<Outcome<String>, GenerateError> {
        let context = common::GeneratorContext::new(package, self.dialect(), options);
        match self {
            #[cfg(feature = "generator-rust")]
            Self::Rust => common::emit(rust::RustVisitor::default(), context),
            #[cfg(feature = "generator-go")]
            Self::Go => common::emit(go::GoVisitor::default(), context),
        }
    }
}
