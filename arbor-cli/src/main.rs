use std::path::Path;
use std::process;

use arbor::{Program, ProgramOptions};
use arbor_config::ArborConfig;

mod error;
mod exit_codes;
mod logging;

use error::{handle_cli_result, CliResult};

/// Load configuration, continuing with defaults when it cannot be read.
fn load_cli_configuration() -> ArborConfig {
    match arbor_config::load_configuration() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Configuration loading failed: {e}");
            eprintln!("Continuing with default configuration...");
            ArborConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let config = load_cli_configuration();
    logging::configure_logging(config.log_level.as_deref());
    tracing::debug!(commands_dir = %config.commands_dir.display(), "starting");

    let exit_code = handle_cli_result(run(config).await);
    process::exit(exit_code);
}

async fn run(config: ArborConfig) -> CliResult<()> {
    ensure_commands_dir(&config.commands_dir)?;
    let program = Program::new(ProgramOptions::from(config));
    program.run(std::env::args_os()).await?;
    Ok(())
}

fn ensure_commands_dir(dir: &Path) -> anyhow::Result<()> {
    anyhow::ensure!(
        dir.is_dir(),
        "commands directory '{}' does not exist (set ARBOR_COMMANDS_DIR or commands_dir in .arbor/arbor.toml)",
        dir.display()
    );
    Ok(())
}
