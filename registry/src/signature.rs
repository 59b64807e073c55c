//! Parser for the inline signature markup of `<proto>` and `<param>` elements.
//!
//! A fragment interleaves free text with two marker elements:
//!
//! ```xml
//! <param>const <ptype>GLfloat</ptype> *<name>coords</name></param>
//! ```
//!
//! `<ptype>` wraps the base type name and `<name>` the identifier. The free text in between may
//! only hold the few qualifier spellings the registry actually uses.

use roxmltree::{Node, NodeType};

use crate::error::SignatureError;
use crate::naming::trim_command_prefix;
use crate::types::{PointerDepth, TypeDescriptor};

pub const PTYPE_TAG: &str = "ptype";
pub const NAME_TAG: &str = "name";

#[derive(Default)]
struct Declaration {
    base_name: String,
    is_const: bool,
    pointer_depth: PointerDepth,
}

impl Declaration {
    fn apply_token(&mut self, token: &str) -> Result<(), SignatureError> {
        match token {
            "" => {}
            "void" => {
                self.base_name = "void".into();
                self.pointer_depth = PointerDepth::Zero;
            }
            "void *" => {
                self.base_name = "void".into();
                self.pointer_depth = PointerDepth::One;
            }
            "const void *" => {
                self.base_name = "void".into();
                self.is_const = true;
                self.pointer_depth = PointerDepth::One;
            }
            "*" => self.pointer_depth = PointerDepth::One,
            "**" | "*const*" => self.pointer_depth = PointerDepth::Two,
            "const" => self.is_const = true,
            other => return Err(SignatureError::UnknownToken(other.to_string())),
        }
        Ok(())
    }
}

fn marker_text(marker: Node) -> Result<String, SignatureError> {
    let mut text = String::new();
    for child in marker.children() {
        match child.node_type() {
            NodeType::Text => text.push_str(child.text().unwrap_or_default()),
            NodeType::Element => {
                return Err(SignatureError::UnexpectedElement(
                    child.tag_name().name().to_string(),
                ))
            }
            _ => {}
        }
    }
    Ok(text.trim().to_string())
}

/// Parses one declaration into its identifier (call prefix removed) and type.
pub fn parse_signature(fragment: Node) -> Result<(String, TypeDescriptor), SignatureError> {
    let mut declaration = Declaration::default();
    let mut name = None;

    for child in fragment.children() {
        match child.node_type() {
            NodeType::Text => {
                declaration.apply_token(child.text().unwrap_or_default().trim())?;
            }
            NodeType::Element => match child.tag_name().name() {
                PTYPE_TAG => declaration.base_name = marker_text(child)?,
                NAME_TAG => name = Some(trim_command_prefix(&marker_text(child)?).to_string()),
                other => return Err(SignatureError::UnexpectedElement(other.to_string())),
            },
            _ => {}
        }
    }

    let name = name.ok_or(SignatureError::MissingName)?;
    let type_ = TypeDescriptor::new(
        declaration.base_name,
        declaration.is_const,
        declaration.pointer_depth,
    );
    Ok((name, type_))
}

/// Parses the inner markup of a fragment given as text, e.g. `void <name>glFlush</name>`.
pub fn parse_fragment(markup: &str) -> Result<(String, TypeDescriptor), SignatureError> {
    let wrapped = format!("<fragment>{markup}</fragment>");
    let document = roxmltree::Document::parse(&wrapped).map_err(|_| SignatureError::Malformed)?;
    parse_signature(document.root_element())
}

/// Produces the inner markup the registry would use to declare `name` with type `type_`.
pub fn synthesize_fragment(name: &str, type_: &TypeDescriptor) -> String {
    let qualifier = if type_.is_const() { "const " } else { "" };
    let indirection = match type_.pointer_depth() {
        PointerDepth::Zero => " ",
        PointerDepth::One => " *",
        PointerDepth::Two => " **",
    };
    format!(
        "{qualifier}<{PTYPE_TAG}>{}</{PTYPE_TAG}>{indirection}<{NAME_TAG}>{name}</{NAME_TAG}>",
        type_.base_name()
    )
}
