//! Atlas CLI binary.

use anyhow::Result;
use atlas::cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to stderr so `--json` output stays parseable.
    // Example: RUST_LOG=atlas=debug atlas cycles --root g:a:1
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("atlas=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting atlas CLI");

    let cli = Cli::parse_args();
    cli.execute()?;

    tracing::debug!("Atlas CLI completed successfully");
    Ok(())
}
