use clap::Parser;
use jeffuscator::{
    build_info, Cli, JeffError, Jeffuscator, OutputFormatter, OutputMode, UserFriendlyError,
};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();
    setup_logging(cli.verbosity_level());

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    // Reported before any config file is read.
    if cli.input_path.is_none() {
        let error = JeffError::MissingInput;
        print_startup_error(&error);
        return error.exit_code();
    }

    let input = match cli.resolved_input_path() {
        Ok(input) => input,
        Err(e) => {
            print_startup_error(&e);
            return e.exit_code();
        }
    };

    let jeffuscator = match Jeffuscator::from_cli(&cli) {
        Ok(jeffuscator) => jeffuscator,
        Err(e) => {
            print_startup_error(&e);
            return e.exit_code();
        }
    };

    tracing::debug!(build = %build_info(), input = ?input, "starting");

    if cli.dry_run {
        return handle_dry_run(&jeffuscator, input.as_deref());
    }

    match jeffuscator.obfuscate(input.as_deref()) {
        Ok(report) => {
            jeffuscator.output_formatter().print_report(&report);
            0
        }
        Err(e) => {
            jeffuscator.handle_error(&e);
            e.exit_code()
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "jeffuscator.toml".to_string());

    match Jeffuscator::generate_sample_config(&config_path) {
        Ok(()) => {
            if !cli.quiet {
                println!("Generated sample configuration file: {}", config_path);
                println!("\nTo use this configuration:");
                println!("  jeffuscator -i <path> --config {}", config_path);
            }
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            e.exit_code()
        }
    }
}

fn handle_dry_run(jeffuscator: &Jeffuscator, input: Option<&std::path::Path>) -> i32 {
    let formatter = jeffuscator.output_formatter();
    formatter.info("DRY RUN MODE - No files will be written");

    match jeffuscator.plan(input) {
        Ok(report) => {
            formatter.print_report(&report);
            formatter.info("Run without --dry-run to write the obfuscated files");
            0
        }
        Err(e) => {
            jeffuscator.handle_error(&e);
            e.exit_code()
        }
    }
}

fn print_startup_error(error: &JeffError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

/// `RUST_LOG` wins; otherwise each `-v` raises the level by one step.
fn setup_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbosity {
            0 => "jeffuscator=warn",
            1 => "jeffuscator=info",
            2 => "jeffuscator=debug",
            _ => "jeffuscator=trace",
        })
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
