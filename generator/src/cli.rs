use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use glbind_registry::Version;

use crate::download::DEFAULT_DOCS_URL;
use crate::generators::Generator;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Raise log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Download the registry documents (gl.xml, glx.xml, wgl.xml, egl.xml)
    Pullspec(PullArgs),
    /// Download the reference pages used for documentation comments
    Pulldoc(PullArgs),
    /// Generate bindings from a registry document
    Generate(GenerateArgs),
}

#[derive(Args)]
pub struct PullArgs {
    /// Base URL to download from. Defaults to the Khronos registry.
    #[arg(long)]
    pub src: Option<String>,

    #[arg(long, default_value = ".")]
    pub odir: PathBuf,
}

impl PullArgs {
    pub fn spec_source(&self) -> Option<&str> {
        self.src.as_deref()
    }

    pub fn doc_source(&self) -> &str {
        self.src.as_deref().unwrap_or(DEFAULT_DOCS_URL)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    Core,
    Compatibility,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Compatibility => "compatibility",
        }
    }
}

#[derive(Args)]
pub struct GenerateArgs {
    /// The registry document, e.g. gl.xml
    #[arg(long)]
    pub spec: PathBuf,

    /// Directory produced by `pulldoc`
    #[arg(long)]
    pub docs: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Generator::default())]
    pub dialect: Generator,

    /// Families to generate (repeatable). All families when omitted.
    #[arg(long = "api")]
    pub apis: Vec<String>,

    /// Versions to generate as major.minor (repeatable). All versions when omitted.
    #[arg(long = "version")]
    pub versions: Vec<Version>,

    /// Only apply require/remove blocks of this profile
    #[arg(long, value_enum)]
    pub profile: Option<Profile>,

    #[arg(long)]
    pub out: PathBuf,

    /// Import path of the Go runtime support package
    #[arg(long, default_value = "github.com/chsc/gogl2/glt")]
    pub go_runtime: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_filters() {
        let cli = Cli::try_parse_from([
            "glbind-generator",
            "generate",
            "--spec",
            "gl.xml",
            "--api",
            "gl",
            "--version",
            "3.3",
            "--version",
            "4.6",
            "--profile",
            "core",
            "--out",
            "out",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.apis, ["gl"]);
        assert_eq!(args.versions, [Version::new(3, 3), Version::new(4, 6)]);
        assert_eq!(args.profile, Some(Profile::Core));
        assert_eq!(args.dialect, Generator::default());
    }

    #[test]
    fn rejects_malformed_versions() {
        let result = Cli::try_parse_from([
            "glbind-generator",
            "generate",
            "--spec",
            "gl.xml",
            "--version",
            "four",
            "--out",
            "out",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn pull_commands_default_their_source() {
        let cli = Cli::try_parse_from(["glbind-generator", "-v", "pulldoc", "--odir", "docs"]).unwrap();
        assert_eq!(cli.verbose, 1);
        let Command::Pulldoc(args) = cli.command else {
            panic!("expected pulldoc");
        };
        assert_eq!(args.doc_source(), DEFAULT_DOCS_URL);
        assert_eq!(args.odir, PathBuf::from("docs"));
        assert_eq!(args.spec_source(), None);
    }
}
