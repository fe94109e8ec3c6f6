use super::{with_options, Services};
use crate::configuration::Configuration;
use crate::error::Result;
use crate::process::CommandOptions;

/// Fail unless `<tool> version` exits cleanly.
pub fn check_installed(services: &Services<'_>, config: &Configuration, tool: &str) -> Result<()> {
    let descriptor = with_options(
        services.command(config, tool),
        CommandOptions::new()
            .logging_start(format!("Checking {} installation", tool))
            .logging_finish(format!("Found {}", tool)),
    )
    .arg("version")
    .label(format!("{}-version", tool));
    let result = services.run(descriptor)?;
    tracing::debug!(tool, version = %result.stdout, "tool found");
    Ok(())
}
