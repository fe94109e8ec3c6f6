use super::{with_options, Services};
use crate::configuration::Configuration;
use crate::error::{Error, Result};
use crate::process::{CommandDescriptor, CommandOptions, CommandSequence};
use crate::prompt::YesNoPrompt;

pub const REMOTE: &str = "autodeploy";

const UNCOMMITTED_QUESTION: &str =
    "You have uncommitted changes in your current branch, would you like to continue?";

fn git(services: &Services<'_>, config: &Configuration) -> CommandDescriptor {
    with_options(services.command(config, "git"), CommandOptions::new().namespace("git"))
}

/// Ask before deploying a dirty working tree; declining aborts.
pub fn check_working_changes(services: &Services<'_>, config: &mut Configuration) -> Result<()> {
    let descriptor = with_options(
        git(services, config),
        CommandOptions::new().logging_start("Checking for uncommitted changes"),
    );
    let result = services.run(descriptor.args(["diff-index", "HEAD"]))?;
    if result.stdout.is_empty() {
        return Ok(());
    }

    let proceed = services
        .prompter
        .confirm(&YesNoPrompt::new(UNCOMMITTED_QUESTION, false))?;
    if !proceed {
        return Err(Error::workflow_aborted(
            "check-working-changes",
            "Aborting deploy due to uncommitted changes",
        ));
    }
    Ok(())
}

/// Point the `autodeploy` remote at the selected app and force-push the
/// current branch to its `master`.
pub fn deploy_current_branch(services: &Services<'_>, config: &mut Configuration) -> Result<()> {
    let git_url = config.require_str("parameters.heroku.app.git_url")?.to_string();
    let push = git(services, config);

    let results = CommandSequence::new(CommandOptions::new())
        .push(with_options(
            git(services, config).args(["remote", "remove", REMOTE]),
            CommandOptions::new().exit_on_error(false),
        ))
        .push(git(services, config).args(["remote", "add", REMOTE, git_url.as_str()]))
        .push(
            git(services, config)
                .args(["rev-parse", "--abbrev-ref", "HEAD"])
                .label("branch"),
        )
        .push_with(move |results| {
            let branch = results
                .by_label("branch")
                .map(|r| r.stdout.clone())
                .filter(|b| !b.is_empty())
                .ok_or_else(|| Error::other("Could not determine the current git branch"))?;
            Ok(with_options(
                push.args(["push".to_string(), REMOTE.to_string(), format!("{}:master", branch), "-f".to_string()]),
                CommandOptions::new()
                    .namespace("deploy")
                    .verbose(true)
                    .logging_start(format!("Pushing {} to Heroku", branch))
                    .logging_finish(format!("Pushed {} to Heroku", branch)),
            ))
        })
        .run(services.runner)?;

    tracing::info!(commands = results.len(), "branch pushed");
    Ok(())
}
