//! Deploy workflows: thin call sites that feed the process runner and the
//! prompter, composed into [`Workflow`]s over a [`Configuration`].
//!
//! Configuration layout used by the steps:
//!
//! - `orizuru.*` - persisted project settings, loaded at start
//! - `heroku.apps` - apps visible to the logged-in user
//! - `heroku.app.json` - the project's `app.json`
//! - `parameters.heroku.app` - the selected app
//! - `parameters.certificate.*` - certificate subject answers
//! - `certificate.publicKey` / `certificate.privateKey` - generated PEM text

pub mod certificate;
pub mod git;
pub mod heroku;
pub mod tools;

use std::path::Path;

use serde_json::Value;

use crate::configuration::Configuration;
use crate::error::{Error, Result};
use crate::logging;
use crate::pipeline::{FailurePolicy, Step, Workflow};
use crate::process::{CommandDescriptor, CommandOptions, CommandResult, CommandRunner};
use crate::prompt::Prompter;
use crate::settings::SettingsStore;

/// Collaborators shared by every deploy step.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub runner: &'a dyn CommandRunner,
    pub prompter: &'a dyn Prompter,
    pub settings: &'a SettingsStore,
    pub root: &'a Path,
}

impl<'a> Services<'a> {
    /// A command rooted in the project directory with the invocation's shared
    /// options applied underneath its own.
    pub fn command(&self, config: &Configuration, executable: &str) -> CommandDescriptor {
        CommandDescriptor::new(executable)
            .working_dir(self.root)
            .options(config.command_options())
    }

    pub fn run(&self, descriptor: CommandDescriptor) -> Result<CommandResult> {
        self.runner.run(&descriptor)
    }
}

/// Parse a command's stdout as JSON.
pub fn stdout_json(result: &CommandResult) -> Result<Value> {
    serde_json::from_str(&result.stdout).map_err(|e| {
        Error::validation_invalid_json(e, Some(format!("output of '{}'", result.formatted_command)))
    })
}

pub(crate) fn with_options(descriptor: CommandDescriptor, own: CommandOptions) -> CommandDescriptor {
    let merged = own.merged_over(&descriptor.options);
    descriptor.options(merged)
}

/// Load persisted settings into `orizuru.*`.
pub fn read_settings(services: &Services<'_>, config: &mut Configuration) -> Result<()> {
    let settings = services.settings.load()?;
    config.set_value("orizuru", settings)
}

/// Persist one setting and mirror it into `orizuru.<key>`.
pub fn write_setting(
    services: &Services<'_>,
    config: &mut Configuration,
    key: &str,
    value: Value,
) -> Result<()> {
    services.settings.write_setting(key, value.clone())?;
    config.set_value(&format!("orizuru.{}", key), value)
}

pub fn deploy_workflow<'a>(services: Services<'a>, policy: FailurePolicy) -> Workflow<'a, Configuration> {
    let s = services;
    Workflow::new("deploy")
        .policy(policy)
        .step(Step::log("start", "Starting full deploy"))
        .step(Step::log("check-installations", "Checking for required installations"))
        .then("sfdx-installed", move |c: &mut Configuration| tools::check_installed(&s, c, "sfdx"))
        .then("heroku-installed", move |c: &mut Configuration| tools::check_installed(&s, c, "heroku"))
        .then("openssl-installed", move |c: &mut Configuration| tools::check_installed(&s, c, "openssl"))
        .then("read-settings", move |c: &mut Configuration| read_settings(&s, c))
        .step(Step::log("read-app-json-log", "Reading app.json"))
        .then("read-app-json", move |c: &mut Configuration| heroku::read_app_json(&s, c))
        .step(Step::log("obtain-apps", "Obtaining Heroku Apps"))
        .then("get-all-apps", move |c: &mut Configuration| heroku::get_all_apps(&s, c))
        .then("select-app", move |c: &mut Configuration| heroku::select_app(&s, c))
        .then("persist-app", move |c: &mut Configuration| {
            let name = c.require_str("parameters.heroku.app.name")?.to_string();
            write_setting(&s, c, "heroku.app.name", Value::String(name))
        })
        .step(Step::log("buildpacks-log", "Adding buildpacks"))
        .then("add-buildpacks", move |c: &mut Configuration| heroku::add_buildpacks(&s, c))
        .step(Step::log("addons-log", "Adding add-ons"))
        .then("add-addons", move |c: &mut Configuration| heroku::add_addons(&s, c))
        .then("check-working-changes", move |c: &mut Configuration| git::check_working_changes(&s, c))
        .step(Step::log("deploy-log", "Deploy code"))
        .then("deploy-branch", move |c: &mut Configuration| git::deploy_current_branch(&s, c))
        .steps(certificate::steps(s))
        .step(Step::log("formation-log", "Adding dyno formation"))
        .then("add-formation", move |c: &mut Configuration| heroku::add_formation(&s, c))
        .then("finish", |_: &mut Configuration| {
            logging::event("Finished full deploy");
            Ok(())
        })
}

pub fn certificate_workflow<'a>(services: Services<'a>, policy: FailurePolicy) -> Workflow<'a, Configuration> {
    let s = services;
    Workflow::new("certificate")
        .policy(policy)
        .then("openssl-installed", move |c: &mut Configuration| tools::check_installed(&s, c, "openssl"))
        .steps(certificate::steps(s))
        .step(Step::log("finish", "Generated certificates"))
}


#[cfg(test)]
mod tests {
    use super::fixtures::Fixture;
    use super::*;
    use crate::pipeline::{StepStatus, WorkflowStatus};
    use crate::process::testing::RecordingRunner;
    use serde_json::json;

    #[test]
    fn read_settings_loads_into_orizuru_namespace() {
        let fx = Fixture::new(RecordingRunner::new(), &[]);
        fx.settings.write_setting("heroku.app.name", json!("demo")).unwrap();
        let mut config = Configuration::default();

        read_settings(&fx.services(), &mut config).unwrap();

        assert_eq!(config.get_str("orizuru.heroku.app.name"), Some("demo"));
    }

    #[test]
    fn write_setting_persists_and_mirrors() {
        let fx = Fixture::new(RecordingRunner::new(), &[]);
        let mut config = Configuration::default();

        write_setting(&fx.services(), &mut config, "sfdx.hub.username", json!("me@example.com")).unwrap();

        assert_eq!(config.get_str("orizuru.sfdx.hub.username"), Some("me@example.com"));
        assert_eq!(
            fx.settings.read_setting("sfdx.hub.username").unwrap(),
            Some(json!("me@example.com"))
        );
    }

    #[test]
    fn missing_tool_stops_deploy_before_any_other_command() {
        let runner = RecordingRunner::new().fail_on("heroku version");
        let fx = Fixture::new(runner, &[]);
        let mut config = Configuration::default();

        let run = deploy_workflow(fx.services(), FailurePolicy::Report)
            .reporter(crate::pipeline::LogReporter)
            .run(&mut config)
            .unwrap();

        assert_eq!(run.status, WorkflowStatus::Failed);
        assert_eq!(run.failed_step.as_deref(), Some("heroku-installed"));
        assert_eq!(fx.runner.calls(), vec!["sfdx version", "heroku version"]);
        assert!(run
            .steps
            .iter()
            .skip_while(|s| s.id != "heroku-installed")
            .skip(1)
            .all(|s| s.status == StepStatus::Skipped));
    }

    #[test]
    fn missing_tool_propagates_by_default() {
        let runner = RecordingRunner::new().fail_on("sfdx version");
        let fx = Fixture::new(runner, &[]);
        let mut config = Configuration::default();

        let err = deploy_workflow(fx.services(), FailurePolicy::default())
            .run(&mut config)
            .unwrap_err();

        assert_eq!(err.code.as_str(), "process.non_zero_exit");
    }

    #[test]
    fn full_deploy_runs_every_step_in_order() {
        let apps = json!([{ "name": "demo", "git_url": "https://git.heroku.com/demo.git" }]);
        let runner = RecordingRunner::new()
            .respond("heroku apps --all --json", &apps.to_string())
            .respond("heroku addons -a demo --json", "[]")
            .respond("git rev-parse --abbrev-ref HEAD", "main");
        let fx = Fixture::new(
            runner,
            &["demo", "GB", "Some-State", "Leeds", "FinancialForce", "", "test@test.com"],
        );
        fx.write_app_json(&json!({
            "buildpacks": [{ "url": "heroku/nodejs" }],
            "addons": ["cloudamqp:lemur"],
            "formation": { "web": { "quantity": 1, "size": "standard-1X" } }
        }));
        let cert_dir = crate::paths::certificate_dir(&fx.root());
        std::fs::create_dir_all(&cert_dir).unwrap();
        std::fs::write(cert_dir.join("certificate.pem"), "CERT\n").unwrap();
        std::fs::write(cert_dir.join("key.pem"), "KEY\n").unwrap();

        let mut config = Configuration::default();
        let run = deploy_workflow(fx.services(), FailurePolicy::Propagate)
            .run(&mut config)
            .unwrap();

        assert!(run.succeeded());
        assert_eq!(
            fx.runner.calls(),
            vec![
                "sfdx version",
                "heroku version",
                "openssl version",
                "heroku apps --all --json",
                "heroku buildpacks:add --index 1 heroku/nodejs -a demo",
                "heroku addons -a demo --json",
                "heroku addons:create cloudamqp:lemur -a demo",
                "git diff-index HEAD",
                "git remote remove autodeploy",
                "git remote add autodeploy https://git.heroku.com/demo.git",
                "git rev-parse --abbrev-ref HEAD",
                "git push autodeploy main:master -f",
                "openssl req -newkey rsa:2048 -nodes -keyout key.pem -x509 -days 365 -out certificate.pem -subj /C=GB/ST=Some-State/L=Leeds/O=FinancialForce/OU=/CN=test@test.com",
                "heroku ps:scale web=1:standard-1X -a demo",
            ]
        );
        assert_eq!(config.get_str("certificate.publicKey"), Some("CERT"));
        assert_eq!(
            fx.settings.read_setting("heroku.app.name").unwrap(),
            Some(json!("demo"))
        );
    }
}
