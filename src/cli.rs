use crate::config::{AncestorStrategy, CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "jeffuscator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Obfuscate identifiers in JavaScript files")]
#[command(
    long_about = "Jeffuscator renames local identifiers in JavaScript sources and writes \
                  each result next to the original as name.jeff.js, or into a mirrored \
                  tree under an output directory."
)]
#[command(after_help = "EXAMPLES:\n  \
    jeffuscator -i src\n  \
    jeffuscator -i src/app.js\n  \
    jeffuscator -i src -o dist --verbose\n  \
    jeffuscator -i src -o dist --dry-run --output-format json\n  \
    jeffuscator --generate-config")]
pub struct Cli {
    /// JavaScript file or directory to obfuscate
    #[arg(short, long)]
    pub input_path: Option<PathBuf>,

    /// Directory receiving the obfuscated tree (defaults to beside each source)
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// Directory names to skip while scanning
    #[arg(short, long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// How the shared ancestor of the input files is found
    #[arg(long, value_enum)]
    pub ancestor_strategy: Option<AncestorStrategyArg>,

    /// Also rename top-level bindings
    #[arg(long)]
    pub mangle_toplevel: bool,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show planned output paths without writing)
    #[arg(long, help = "Show where each file would be written without writing it")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AncestorStrategyArg {
    /// Shared leading directories
    Segments,
    /// Longest shared run of characters
    Textual,
}

impl From<AncestorStrategyArg> for AncestorStrategy {
    fn from(arg: AncestorStrategyArg) -> Self {
        match arg {
            AncestorStrategyArg::Segments => AncestorStrategy::Segments,
            AncestorStrategyArg::Textual => AncestorStrategy::Textual,
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides()?;
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> Result<CliOverrides> {
        let output_dir = self.output_path.as_deref().map(absolutize).transpose()?;

        Ok(CliOverrides::new()
            .with_output_dir(output_dir)
            .with_ancestor_strategy(self.ancestor_strategy.map(AncestorStrategy::from))
            .with_exclude(self.exclude.clone())
            .with_mangle_toplevel(self.mangle_toplevel.then_some(true)))
    }

    /// The input path made absolute against the working directory.
    pub fn resolved_input_path(&self) -> Result<Option<PathBuf>> {
        self.input_path.as_deref().map(absolutize).transpose()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose > 0 && !self.quiet
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

/// Joins relative paths onto the working directory. The path is not
/// canonicalized, so it need not exist yet.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("jeffuscator").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_input_is_optional_for_clap() {
        let cli = parse(&[]);
        assert!(cli.input_path.is_none());
        assert!(cli.resolved_input_path().unwrap().is_none());
    }

    #[test]
    fn test_paths_are_absolutized() {
        let cli = parse(&["-i", "src", "-o", "out"]);
        let cwd = std::env::current_dir().unwrap();

        assert_eq!(cli.resolved_input_path().unwrap(), Some(cwd.join("src")));
        assert_eq!(
            cli.create_cli_overrides().unwrap().output_dir,
            Some(cwd.join("out"))
        );

        let cli = parse(&["--input-path", "/abs/app.js"]);
        assert_eq!(
            cli.resolved_input_path().unwrap(),
            Some(PathBuf::from("/abs/app.js"))
        );
        assert_eq!(absolutize(Path::new("/abs")).unwrap(), PathBuf::from("/abs"));
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&[
            "-i",
            "src",
            "--ancestor-strategy",
            "textual",
            "--exclude",
            "vendor,dist",
            "--mangle-toplevel",
        ]);
        let overrides = cli.create_cli_overrides().unwrap();

        assert_eq!(overrides.ancestor_strategy, Some(AncestorStrategy::Textual));
        assert_eq!(
            overrides.exclude,
            Some(vec!["vendor".to_string(), "dist".to_string()])
        );
        assert_eq!(overrides.mangle_toplevel, Some(true));

        let overrides = parse(&["-i", "src"]).create_cli_overrides().unwrap();
        assert!(overrides.ancestor_strategy.is_none());
        assert!(overrides.mangle_toplevel.is_none());
    }

    #[test]
    fn test_verbosity() {
        let cli = parse(&["-i", "src", "-vv"]);
        assert!(cli.is_verbose());
        assert_eq!(cli.verbosity_level(), 2);

        let cli = parse(&["-i", "src", "-q"]);
        assert!(!cli.is_verbose());
        assert_eq!(cli.verbosity_level(), 0);

        assert!(Cli::try_parse_from(["jeffuscator", "-q", "-v"]).is_err());
    }
}
