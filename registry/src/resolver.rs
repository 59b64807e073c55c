//! Replays feature revisions to materialize the symbol set of one (family, version) pair.

use std::collections::BTreeMap;

use crate::diagnostics::{Diagnostic, Diagnostics, Outcome, SymbolKind};
use crate::error::ResolveError;
use crate::naming::{trim_command_prefix, trim_enum_prefix};
use crate::registry::{EnumConstant, FeatureRevision, Registry, SymbolRef, TypeDefinition};
use crate::types::CommandSignature;
use crate::version::Version;

/// The complete API of one family at one version, keyed by emitted names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub family: String,
    pub version: Version,
    pub profile: Option<String>,
    pub enums: BTreeMap<String, EnumConstant>,
    pub commands: BTreeMap<String, CommandSignature>,
    pub type_definitions: Vec<TypeDefinition>,
}

/// Resolution context over one loaded registry.
#[derive(Copy, Clone, Debug)]
pub struct FeatureResolver<'r> {
    registry: &'r Registry,
}

struct Replay<'a> {
    family: &'a str,
    version: Version,
    diagnostics: &'a mut Diagnostics,
}

fn applicable<'s>(
    refs: &'s [SymbolRef],
    profile: Option<&'s str>,
) -> impl Iterator<Item = &'s SymbolRef> + 's {
    refs.iter().filter(move |r| r.applies_to(profile))
}

impl Replay<'_> {
    fn not_found(&mut self, kind: SymbolKind, name: &str) {
        self.diagnostics.push(Diagnostic::SymbolNotFound {
            family: self.family.to_string(),
            version: self.version,
            kind,
            name: name.to_string(),
        });
    }

    fn absent(&mut self, kind: SymbolKind, name: &str) {
        self.diagnostics.push(Diagnostic::RemovedSymbolAbsent {
            family: self.family.to_string(),
            version: self.version,
            kind,
            name: name.to_string(),
        });
    }
}

impl<'r> FeatureResolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Builds the package for `family` at `version`.
    ///
    /// Revisions of the family up to and including `version` are replayed in ascending version
    /// order. Within one revision additions are applied before removals, so a symbol both
    /// required and removed by the same revision ends up absent. Blocks tagged with a profile
    /// other than `profile` are skipped; with no profile requested every block applies.
    pub fn resolve(
        &self,
        family: &str,
        version: Version,
        profile: Option<&str>,
    ) -> Result<Outcome<ResolvedPackage>, ResolveError> {
        let features = &self.registry.features;
        if !features.iter().any(|f| f.family == family) {
            return Err(ResolveError::UnknownFamily(family.to_string()));
        }
        if !features
            .iter()
            .any(|f| f.family == family && f.version == version)
        {
            return Err(ResolveError::UnknownVersion {
                family: family.to_string(),
                version,
            });
        }

        let mut revisions: Vec<&FeatureRevision> = features
            .iter()
            .filter(|f| f.family == family && f.version <= version)
            .collect();
        revisions.sort_by_key(|f| f.version);

        let mut enums = BTreeMap::new();
        let mut commands = BTreeMap::new();
        let mut diagnostics = Diagnostics::new();

        for revision in revisions {
            tracing::debug!(family, version = %revision.version, "applying {}", revision.name);
            let mut replay = Replay {
                family,
                version: revision.version,
                diagnostics: &mut diagnostics,
            };

            for symbol in applicable(&revision.added_enums, profile) {
                match self.registry.enums.get(&symbol.name) {
                    Some(constant) => {
                        let name = trim_enum_prefix(&symbol.name).to_string();
                        enums.insert(
                            name.clone(),
                            EnumConstant {
                                name,
                                ..constant.clone()
                            },
                        );
                    }
                    None => replay.not_found(SymbolKind::Enum, &symbol.name),
                }
            }
            for symbol in applicable(&revision.added_commands, profile) {
                let name = trim_command_prefix(&symbol.name);
                match self.registry.commands.get(name) {
                    Some(command) => {
                        commands.insert(name.to_string(), command.clone());
                    }
                    None => replay.not_found(SymbolKind::Command, &symbol.name),
                }
            }

            for symbol in applicable(&revision.removed_enums, profile) {
                if enums.remove(trim_enum_prefix(&symbol.name)).is_none() {
                    replay.absent(SymbolKind::Enum, &symbol.name);
                }
            }
            for symbol in applicable(&revision.removed_commands, profile) {
                if commands.remove(trim_command_prefix(&symbol.name)).is_none() {
                    replay.absent(SymbolKind::Command, &symbol.name);
                }
            }
        }

        let type_definitions = self
            .registry
            .type_definitions
            .iter()
            .filter(|t| t.applies_to(family))
            .cloned()
            .collect();

        tracing::info!(
            family,
            %version,
            enums = enums.len(),
            commands = commands.len(),
            "resolved package"
        );
        let package = ResolvedPackage {
            family: family.to_string(),
            version,
            profile: profile.map(str::to_string),
            enums,
            commands,
            type_definitions,
        };
        Ok(Outcome::new(package, diagnostics))
    }

    /// Resolves every (family, version) pair the registry declares, each independently.
    pub fn resolve_all(
        &self,
        profile: Option<&str>,
    ) -> Vec<Result<Outcome<ResolvedPackage>, ResolveError>> {
        let mut packages = Vec::new();
        for family in self.registry.families() {
            for version in self.registry.versions(family) {
                packages.push(self.resolve(family, version, profile));
            }
        }
        packages
    }
}
