use thiserror::Error;

use crate::version::{ParseVersionError, Version};

/// The registry document could not be mapped onto the expected record shapes.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("the registry is not well-formed XML")]
    Xml(#[from] roxmltree::Error),
    #[error("expected root element <{expected}>, found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },
    #[error("<{element}> is missing the required attribute {attribute:?}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("feature {feature:?} has an invalid version number")]
    InvalidVersion {
        feature: String,
        #[source]
        source: ParseVersionError,
    },
}

/// A signature fragment uses grammar the parser does not know.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("unrecognized type token {0:?}")]
    UnknownToken(String),
    #[error("unexpected element <{0}> in signature")]
    UnexpectedElement(String),
    #[error("signature has no <name> element")]
    MissingName,
    #[error("signature fragment is not well-formed")]
    Malformed,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("the registry has no feature for api {0:?}")]
    UnknownFamily(String),
    #[error("api {family:?} has no feature with version {version}")]
    UnknownVersion { family: String, version: Version },
}
