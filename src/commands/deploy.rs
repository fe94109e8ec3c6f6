use clap::Args;
use serde::Serialize;

use orizuru::configuration::Configuration;
use orizuru::deploy::{self, Services};
use orizuru::pipeline::{FailurePolicy, LogReporter, WorkflowRun};
use orizuru::process::SystemRunner;
use orizuru::prompt::PromptEngine;
use orizuru::settings::SettingsStore;
use orizuru::{log_status, paths};

use super::{CmdResult, GlobalArgs};
use crate::output::EXIT_WORKFLOW_FAILED;

#[derive(Args)]
pub struct DeployArgs {
    /// Report a failing step and finish the run instead of aborting with its error
    #[arg(long)]
    pub report_failures: bool,
}

#[derive(Serialize)]
pub struct DeployOutput {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    pub run: WorkflowRun,
}

pub fn run(args: DeployArgs, global: &GlobalArgs) -> CmdResult<DeployOutput> {
    let root = paths::project_root()?;
    let settings = SettingsStore::for_project(&root);
    let prompter = PromptEngine::new();
    let services = Services {
        runner: &SystemRunner,
        prompter: &prompter,
        settings: &settings,
        root: &root,
    };

    let policy = if args.report_failures {
        FailurePolicy::Report
    } else {
        FailurePolicy::Propagate
    };

    let mut config = Configuration::new(global.invocation());
    let run = deploy::deploy_workflow(services, policy)
        .reporter(LogReporter)
        .run(&mut config)?;

    let app = config.get_str("parameters.heroku.app.name").map(str::to_string);
    if let Some(app) = &app {
        if run.succeeded() {
            log_status!("deploy", "Deployed to {}", app);
        }
    }

    let exit_code = if run.succeeded() { 0 } else { EXIT_WORKFLOW_FAILED };
    Ok((
        DeployOutput {
            command: "deploy".to_string(),
            app,
            run,
        },
        exit_code,
    ))
}
