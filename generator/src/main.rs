mod cli;
mod docs;
mod download;
mod generators;
mod output;

use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use glbind_registry::{FeatureResolver, Registry, RegistryError, ResolveError, Version};

use cli::{Cli, Command, GenerateArgs, PullArgs};
use docs::{DocError, DocIndex};
use download::{DownloadError, Downloader};
use generators::{EmitOptions, GenerateError};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("unable to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Docs(#[from] DocError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("{failed} of {requested} packages could not be generated")]
    Incomplete { failed: usize, requested: usize },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// The (family, version) pairs a `generate` run covers.
///
/// Explicit families and versions are paired as given so that unknown ones are reported; a
/// version filter alone only applies to families that declare it.
fn select_packages(registry: &Registry, apis: &[String], versions: &[Version]) -> Vec<(String, Version)> {
    let families: Vec<String> = if apis.is_empty() {
        registry.families().into_iter().map(str::to_string).collect()
    } else {
        apis.to_vec()
    };

    let mut selected = Vec::new();
    for family in families {
        let declared = registry.versions(&family);
        let wanted: Vec<Version> = match (versions.is_empty(), apis.is_empty()) {
            (true, _) => declared,
            (false, false) => versions.to_vec(),
            (false, true) => versions
                .iter()
                .copied()
                .filter(|v| declared.contains(v))
                .collect(),
        };
        selected.extend(wanted.into_iter().map(|version| (family.clone(), version)));
    }
    selected
}

fn generate(args: GenerateArgs) -> Result<(), GeneratorError> {
    let text = std::fs::read_to_string(&args.spec).map_err(|source| GeneratorError::Read {
        path: args.spec.clone(),
        source,
    })?;
    let loaded = Registry::parse(&text)?;
    let registry = loaded.value;
    if !loaded.diagnostics.is_empty() {
        tracing::warn!(count = loaded.diagnostics.len(), "registry loaded with diagnostics");
    }

    let docs = args.docs.as_deref().map(DocIndex::load).transpose()?;
    let options = EmitOptions {
        docs: docs.as_ref(),
        go_runtime: &args.go_runtime,
    };
    let profile = args.profile.map(|p| p.as_str());
    let resolver = FeatureResolver::new(&registry);
    let selected = select_packages(&registry, &args.apis, &args.versions);

    let mut failed = 0;
    for (family, version) in &selected {
        let resolved = match resolver.resolve(family, *version, profile) {
            Ok(resolved) => resolved,
            Err(error) => {
                tracing::error!("{error}");
                failed += 1;
                continue;
            }
        };
        let emitted = args.dialect.generate(&resolved.value, options)?;
        let path = output::write_package(
            &args.out,
            family,
            *version,
            args.dialect.extension(),
            &emitted.value,
        )
        .map_err(|source| GeneratorError::Write {
            path: output::package_path(&args.out, family, *version, args.dialect.extension()),
            source,
        })?;
        tracing::info!(
            path = %path.display(),
            enums = resolved.value.enums.len(),
            commands = resolved.value.commands.len(),
            diagnostics = resolved.diagnostics.len() + emitted.diagnostics.len(),
            "generated {family} {version}"
        );
    }

    if failed > 0 {
        return Err(GeneratorError::Incomplete {
            failed,
            requested: selected.len(),
        });
    }
    Ok(())
}

fn pull_specs(args: PullArgs) -> Result<(), GeneratorError> {
    let files = Downloader::default().pull_specs(args.spec_source(), &args.odir)?;
    tracing::info!(files = files.len(), "registry documents downloaded");
    Ok(())
}

fn pull_docs(args: PullArgs) -> Result<(), GeneratorError> {
    let pages = Downloader::default().pull_docs(args.doc_source(), &args.odir)?;
    tracing::info!(pages, "reference pages downloaded");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Pullspec(args) => pull_specs(args),
        Command::Pulldoc(args) => pull_docs(args),
        Command::Generate(args) => generate(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            let mut source = error.source();
            while let Some(cause) = source {
                tracing::error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
