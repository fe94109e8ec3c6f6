use clap::Args;
use serde::Serialize;

use orizuru::configuration::Configuration;
use orizuru::deploy::{self, Services};
use orizuru::paths;
use orizuru::pipeline::{FailurePolicy, LogReporter, WorkflowRun};
use orizuru::process::SystemRunner;
use orizuru::prompt::PromptEngine;
use orizuru::settings::SettingsStore;

use super::{CmdResult, GlobalArgs};
use crate::output::EXIT_WORKFLOW_FAILED;

#[derive(Args)]
pub struct CertificateArgs {}

#[derive(Serialize)]
pub struct CertificateOutput {
    pub command: String,
    pub directory: String,
    pub generated: bool,
    pub run: WorkflowRun,
}

pub fn run(_args: CertificateArgs, global: &GlobalArgs) -> CmdResult<CertificateOutput> {
    let root = paths::project_root()?;
    let settings = SettingsStore::for_project(&root);
    let prompter = PromptEngine::new();
    let services = Services {
        runner: &SystemRunner,
        prompter: &prompter,
        settings: &settings,
        root: &root,
    };

    let mut config = Configuration::new(global.invocation());
    let run = deploy::certificate_workflow(services, FailurePolicy::Propagate)
        .reporter(LogReporter)
        .run(&mut config)?;

    let exit_code = if run.succeeded() { 0 } else { EXIT_WORKFLOW_FAILED };
    Ok((
        CertificateOutput {
            command: "certificate".to_string(),
            directory: paths::certificate_dir(&root).display().to_string(),
            generated: config.contains("certificate.publicKey"),
            run,
        },
        exit_code,
    ))
}
