//! Mapping of the `<registry>` document onto typed records.

use std::collections::{BTreeMap, BTreeSet};

use roxmltree::{Document, Node, NodeType};

use crate::diagnostics::{Diagnostic, Diagnostics, Outcome};
use crate::error::RegistryError;
use crate::signature::parse_signature;
use crate::types::{CommandSignature, ParamLen, Parameter};
use crate::version::Version;

/// Type definitions with this name stand for a platform header the target already provides.
pub const PLATFORM_SHIM_TYPE: &str = "khrplatform";

fn required_attribute<'a>(
    node: Node<'a, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<&'a str, RegistryError> {
    node.attribute(attribute)
        .ok_or(RegistryError::MissingAttribute { element, attribute })
}

fn non_empty_attribute(node: Node, attribute: &str) -> Option<String> {
    node.attribute(attribute)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn child_elements<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == tag)
}

/// The markup of `node` as it appears in the document, for diagnostics.
fn source_text(document: &Document, node: Node) -> String {
    document.input_text()[node.range()].to_string()
}

/// A `<type>` declaration, kept verbatim for the primitive alias block of emitted code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDefinition {
    pub name: String,
    /// `None` when the definition applies to every family.
    pub api: Option<String>,
    pub requires: Option<String>,
    /// The C text, with `<apientry/>` spelled out as `APIENTRY`.
    pub source_text: String,
    pub doc_comment: String,
}

impl TypeDefinition {
    pub const TAG_NAME: &'static str = "type";

    pub fn map_from_xml(type_: Node) -> Self {
        let mut name = type_.attribute("name").unwrap_or_default().to_string();
        let mut source_text = String::new();
        for child in type_.children() {
            match child.node_type() {
                NodeType::Text => source_text.push_str(child.text().unwrap_or_default()),
                NodeType::Element if child.tag_name().name() == "apientry" => {
                    source_text.push_str("APIENTRY")
                }
                NodeType::Element => {
                    let text: String = child
                        .descendants()
                        .filter(|n| n.is_text())
                        .filter_map(|n| n.text())
                        .collect();
                    if child.tag_name().name() == "name" {
                        name = text.clone();
                    }
                    source_text.push_str(&text);
                }
                _ => {}
            }
        }

        Self {
            name,
            api: non_empty_attribute(type_, "api"),
            requires: non_empty_attribute(type_, "requires"),
            source_text,
            doc_comment: type_.attribute("comment").unwrap_or_default().to_string(),
        }
    }

    pub fn applies_to(&self, family: &str) -> bool {
        self.api.as_deref().map_or(true, |api| api == family)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EnumKind {
    #[default]
    Plain,
    Bitmask,
}

/// A named constant. Inside the registry pool `name` is the declared name (`GL_FRONT`); inside
/// a resolved package it is the emitted name (`FRONT`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumConstant {
    pub name: String,
    /// The literal as written; never evaluated.
    pub value: String,
    pub group: String,
    pub kind: EnumKind,
}

/// One `<enums>` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumTable {
    pub namespace: String,
    pub group: String,
    pub kind: EnumKind,
    pub comment: String,
    pub constants: Vec<EnumConstant>,
}

impl EnumTable {
    pub const TAG_NAME: &'static str = "enums";

    pub fn map_from_xml(enums: Node) -> Result<Self, RegistryError> {
        let group = enums.attribute("group").unwrap_or_default().to_string();
        let kind = match enums.attribute("type") {
            Some("bitmask") => EnumKind::Bitmask,
            _ => EnumKind::Plain,
        };

        let mut constants = Vec::new();
        for enum_ in child_elements(enums, "enum") {
            let name = required_attribute(enum_, "enum", "name")?;
            let value = required_attribute(enum_, "enum", "value")?;
            constants.push(EnumConstant {
                name: name.to_string(),
                value: value.to_string(),
                group: enum_
                    .attribute("group")
                    .map_or_else(|| group.clone(), str::to_string),
                kind,
            });
        }

        Ok(Self {
            namespace: enums.attribute("namespace").unwrap_or_default().to_string(),
            group,
            kind,
            comment: enums.attribute("comment").unwrap_or_default().to_string(),
            constants,
        })
    }
}

/// A `<group>` listing the constants valid for some parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumGroup {
    pub name: String,
    pub members: Vec<String>,
}

impl EnumGroup {
    pub const TAG_NAME: &'static str = "group";

    pub fn map_from_xml(group: Node) -> Result<Self, RegistryError> {
        let name = required_attribute(group, "group", "name")?.to_string();
        let members = child_elements(group, "enum")
            .map(|enum_| required_attribute(enum_, "enum", "name").map(str::to_string))
            .collect::<Result<_, _>>()?;
        Ok(Self { name, members })
    }
}

/// A reference from a `require`/`remove` block, tagged with the block's profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolRef {
    pub name: String,
    pub profile: Option<String>,
}

impl SymbolRef {
    pub fn applies_to(&self, profile: Option<&str>) -> bool {
        match (self.profile.as_deref(), profile) {
            (Some(own), Some(requested)) => own == requested,
            _ => true,
        }
    }
}

/// A `<feature>`: the delta one version applies to its family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureRevision {
    pub family: String,
    pub name: String,
    pub version: Version,
    pub added_enums: Vec<SymbolRef>,
    pub removed_enums: Vec<SymbolRef>,
    pub added_commands: Vec<SymbolRef>,
    pub removed_commands: Vec<SymbolRef>,
}

impl FeatureRevision {
    pub const TAG_NAME: &'static str = "feature";

    pub fn map_from_xml(feature: Node) -> Result<Self, RegistryError> {
        let family = required_attribute(feature, "feature", "api")?.to_string();
        let name = feature.attribute("name").unwrap_or_default().to_string();
        let number = required_attribute(feature, "feature", "number")?;
        let version = number
            .parse()
            .map_err(|source| RegistryError::InvalidVersion {
                feature: name.clone(),
                source,
            })?;

        let mut revision = Self {
            family,
            name,
            version,
            added_enums: Vec::new(),
            removed_enums: Vec::new(),
            added_commands: Vec::new(),
            removed_commands: Vec::new(),
        };

        for block in feature.children().filter(Node::is_element) {
            let (enums, commands) = match block.tag_name().name() {
                "require" => (&mut revision.added_enums, &mut revision.added_commands),
                "remove" => (&mut revision.removed_enums, &mut revision.removed_commands),
                _ => continue,
            };
            let profile = non_empty_attribute(block, "profile");
            for item in block.children().filter(Node::is_element) {
                let (target, element) = match item.tag_name().name() {
                    "enum" => (&mut *enums, "enum"),
                    "command" => (&mut *commands, "command"),
                    _ => continue,
                };
                let name = required_attribute(item, element, "name")?;
                target.push(SymbolRef {
                    name: name.to_string(),
                    profile: profile.clone(),
                });
            }
        }

        Ok(revision)
    }
}

/// Maps one `<command>`. `Ok(None)` means the command was dropped with a diagnostic.
fn map_command(
    document: &Document,
    command: Node,
    diagnostics: &mut Diagnostics,
) -> Result<Option<CommandSignature>, RegistryError> {
    let proto = child_elements(command, "proto")
        .next()
        .ok_or(RegistryError::MissingAttribute {
            element: "command",
            attribute: "proto",
        })?;
    let (name, return_type) = match parse_signature(proto) {
        Ok(parsed) => parsed,
        Err(error) => {
            diagnostics.push(Diagnostic::UnparseableCommand {
                text: source_text(document, proto),
                error,
            });
            return Ok(None);
        }
    };
    let entry_point = child_elements(proto, "name")
        .next()
        .and_then(|n| n.text())
        .unwrap_or_default()
        .trim()
        .to_string();

    let mut parameters = Vec::new();
    for param in child_elements(command, "param") {
        match parse_signature(param) {
            Ok((param_name, type_)) => parameters.push(Parameter {
                name: param_name,
                type_,
                group: non_empty_attribute(param, "group"),
                len: param.attribute("len").map(ParamLen::parse),
            }),
            Err(error) => {
                diagnostics.push(Diagnostic::UnparseableParameter {
                    command: name,
                    text: source_text(document, param),
                    error,
                });
                return Ok(None);
            }
        }
    }

    Ok(Some(CommandSignature {
        name,
        entry_point,
        parameters,
        return_type,
    }))
}

/// Everything the resolver needs from one registry document.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    pub comment: String,
    /// In document order, platform shims removed.
    pub type_definitions: Vec<TypeDefinition>,
    pub groups: Vec<EnumGroup>,
    pub enum_tables: Vec<EnumTable>,
    /// Every constant by declared name. Later tables overwrite earlier ones.
    pub enums: BTreeMap<String, EnumConstant>,
    /// Every parsed command by de-prefixed name. Later declarations overwrite earlier ones.
    pub commands: BTreeMap<String, CommandSignature>,
    /// In document order.
    pub features: Vec<FeatureRevision>,
}

impl Registry {
    pub const TAG_NAME: &'static str = "registry";

    pub fn parse(text: &str) -> Result<Outcome<Self>, RegistryError> {
        let document = Document::parse(text)?;
        Self::load(&document)
    }

    pub fn load(document: &Document) -> Result<Outcome<Self>, RegistryError> {
        let root = document.root_element();
        if root.tag_name().name() != Self::TAG_NAME {
            return Err(RegistryError::UnexpectedRoot {
                expected: Self::TAG_NAME,
                found: root.tag_name().name().to_string(),
            });
        }

        let mut diagnostics = Diagnostics::new();
        let mut registry = Self::default();

        for child in root.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "comment" => registry.comment = child.text().unwrap_or_default().to_string(),
                "types" => {
                    for type_ in child_elements(child, TypeDefinition::TAG_NAME) {
                        let type_ = TypeDefinition::map_from_xml(type_);
                        if type_.name == PLATFORM_SHIM_TYPE {
                            continue;
                        }
                        registry.type_definitions.push(type_);
                    }
                }
                "groups" => {
                    for group in child_elements(child, EnumGroup::TAG_NAME) {
                        registry.groups.push(EnumGroup::map_from_xml(group)?);
                    }
                }
                EnumTable::TAG_NAME => {
                    let table = EnumTable::map_from_xml(child)?;
                    for constant in &table.constants {
                        registry
                            .enums
                            .insert(constant.name.clone(), constant.clone());
                    }
                    registry.enum_tables.push(table);
                }
                "commands" => {
                    for command in child_elements(child, "command") {
                        if let Some(command) = map_command(document, command, &mut diagnostics)? {
                            registry.commands.insert(command.name.clone(), command);
                        }
                    }
                }
                FeatureRevision::TAG_NAME => {
                    registry
                        .features
                        .push(FeatureRevision::map_from_xml(child)?);
                }
                _ => {}
            }
        }

        tracing::info!(
            types = registry.type_definitions.len(),
            enums = registry.enums.len(),
            commands = registry.commands.len(),
            features = registry.features.len(),
            "loaded registry"
        );
        Ok(Outcome::new(registry, diagnostics))
    }

    /// Family ids in byte order.
    pub fn families(&self) -> Vec<&str> {
        self.features
            .iter()
            .map(|f| f.family.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Versions declared for `family`, ascending.
    pub fn versions(&self, family: &str) -> Vec<Version> {
        self.features
            .iter()
            .filter(|f| f.family == family)
            .map(|f| f.version)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignatureError;
    use crate::types::{PointerDepth, TypeDescriptor};

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<registry>
    <comment>test registry</comment>
    <types>
        <type name="khrplatform">#include &lt;KHR/khrplatform.h&gt;</type>
        <type requires="khrplatform">typedef unsigned int <name>GLenum</name>;</type>
        <type api="gles2" comment="embedded only">typedef int <name>GLfixed</name>;</type>
        <type>typedef void (<apientry/> *<name>GLDEBUGPROC</name>)(void);</type>
    </types>
    <groups>
        <group name="ClearBufferMask">
            <enum name="GL_COLOR_BUFFER_BIT"/>
        </group>
    </groups>
    <enums namespace="GL" group="ClearBufferMask" type="bitmask">
        <enum value="0x00004000" name="GL_COLOR_BUFFER_BIT"/>
    </enums>
    <enums namespace="GL">
        <enum value="0x0404" name="GL_FRONT"/>
        <enum value="0x0405" name="GL_FRONT" group="Duplicate"/>
    </enums>
    <commands namespace="GL">
        <command>
            <proto>void <name>glClear</name></proto>
            <param group="ClearBufferMask"><ptype>GLbitfield</ptype> <name>mask</name></param>
        </command>
        <command>
            <proto>void <name>glBroken</name></proto>
            <param>foo bar <name>x</name></param>
        </command>
        <command>
            <proto>unsigned <name>glWeird</name></proto>
        </command>
    </commands>
    <feature api="gl" name="GL_VERSION_1_0" number="1.0">
        <require>
            <enum name="GL_FRONT"/>
            <command name="glClear"/>
        </require>
        <remove profile="core">
            <enum name="GL_FRONT"/>
        </remove>
    </feature>
</registry>
"#;

    #[test]
    fn loads_every_record_kind() {
        let outcome = Registry::parse(DOCUMENT).unwrap();
        let registry = outcome.value;

        assert_eq!(registry.comment, "test registry");
        let names: Vec<_> = registry
            .type_definitions
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, ["GLenum", "GLfixed", "GLDEBUGPROC"]);
        assert_eq!(
            registry.type_definitions[2].source_text,
            "typedef void (APIENTRY *GLDEBUGPROC)(void);"
        );
        assert!(!registry.type_definitions[1].applies_to("gl"));
        assert!(registry.type_definitions[0].applies_to("gl"));

        assert_eq!(registry.groups[0].members, ["GL_COLOR_BUFFER_BIT"]);
        assert_eq!(
            registry.enums["GL_COLOR_BUFFER_BIT"].kind,
            EnumKind::Bitmask
        );

        let clear = &registry.commands["Clear"];
        assert_eq!(clear.entry_point, "glClear");
        assert_eq!(clear.parameters[0].name, "mask");
        assert_eq!(
            clear.parameters[0].type_,
            TypeDescriptor::new("GLbitfield", false, PointerDepth::Zero)
        );
        assert_eq!(
            clear.parameters[0].group.as_deref(),
            Some("ClearBufferMask")
        );

        let feature = &registry.features[0];
        assert_eq!(feature.version, Version::new(1, 0));
        assert_eq!(feature.added_commands[0].name, "glClear");
        assert_eq!(feature.removed_enums[0].profile.as_deref(), Some("core"));
    }

    #[test]
    fn later_enum_definition_wins() {
        let registry = Registry::parse(DOCUMENT).unwrap().value;
        let front = &registry.enums["GL_FRONT"];
        assert_eq!(front.value, "0x0405");
        assert_eq!(front.group, "Duplicate");
    }

    #[test]
    fn unparseable_commands_are_dropped_with_diagnostics() {
        let outcome = Registry::parse(DOCUMENT).unwrap();
        assert!(!outcome.value.commands.contains_key("Broken"));
        assert!(!outcome.value.commands.contains_key("Weird"));
        assert_eq!(outcome.diagnostics.len(), 2);
        assert!(outcome.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::UnparseableParameter { command, error: SignatureError::UnknownToken(token), .. }
                if command == "Broken" && token == "foo bar"
        )));
        assert!(outcome.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::UnparseableCommand { text, .. } if text.contains("glWeird")
        )));
    }

    #[test]
    fn rejects_foreign_documents() {
        assert!(matches!(
            Registry::parse("<schema/>"),
            Err(RegistryError::UnexpectedRoot { .. })
        ));
        assert!(matches!(
            Registry::parse("<registry>"),
            Err(RegistryError::Xml(_))
        ));
        assert!(matches!(
            Registry::parse(r#"<registry><feature api="gl" number="one"/></registry>"#),
            Err(RegistryError::InvalidVersion { .. })
        ));
    }
}
