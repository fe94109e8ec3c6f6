//! Heroku CLI call sites: app discovery and selection, buildpacks, add-ons
//! and dyno formation, all driven by the project's `app.json`.

use serde_json::Value;

use super::{stdout_json, with_options, Services};
use crate::configuration::Configuration;
use crate::error::{Error, Result};
use crate::paths;
use crate::process::{CommandDescriptor, CommandOptions, CommandSequence};
use crate::prompt::SelectPrompt;
use crate::utils::io;

pub const NEW_APP: &str = "<<Create new Heroku App>>";
pub const NEW_ORG_APP: &str = "<<Create new Heroku Organization App>>";

const NAMESPACE: &str = "heroku";

fn heroku(services: &Services<'_>, config: &Configuration) -> CommandDescriptor {
    with_options(
        services.command(config, "heroku"),
        CommandOptions::new().namespace(NAMESPACE),
    )
}

/// Load `app.json` from the project root into `heroku.app.json`.
pub fn read_app_json(services: &Services<'_>, config: &mut Configuration) -> Result<()> {
    let path = paths::app_json(services.root);
    let content = io::read_file(&path, "read app.json").map_err(|_| {
        Error::validation_invalid_argument(
            "app.json",
            "app.json is required in the root of your project when deploying to heroku.",
            Some(path.display().to_string()),
            None,
        )
    })?;
    let parsed: Value = serde_json::from_str(&content)
        .map_err(|e| Error::validation_invalid_json(e, Some(path.display().to_string())))?;
    config.set_value("heroku.app.json", parsed)
}

/// Every app the logged-in user can see, into `heroku.apps`.
pub fn get_all_apps(services: &Services<'_>, config: &mut Configuration) -> Result<()> {
    let descriptor = with_options(
        heroku(services, config),
        CommandOptions::new()
            .logging_start("Retrieving Heroku apps")
            .logging_finish("Retrieved Heroku apps"),
    );
    let result = services.run(descriptor.args(["apps", "--all", "--json"]))?;
    let apps = stdout_json(&result)?;
    config.set_value("heroku.apps", apps)
}

fn app_names(config: &Configuration) -> Vec<String> {
    config
        .get("heroku.apps")
        .and_then(Value::as_array)
        .map(|apps| {
            apps.iter()
                .filter_map(|app| app.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Ask which app to deploy to, offering to create one. The previously used
/// app is the default when it still exists. The chosen app lands in
/// `parameters.heroku.app`.
pub fn select_app(services: &Services<'_>, config: &mut Configuration) -> Result<()> {
    let names = app_names(config);
    let previous = config.get_str("orizuru.heroku.app.name").map(str::to_string);

    let mut options = names.clone();
    options.push(NEW_APP.to_string());
    options.push(NEW_ORG_APP.to_string());

    let default_index = previous
        .as_deref()
        .and_then(|prev| options.iter().position(|o| o == prev))
        .unwrap_or(names.len());

    let prompt = SelectPrompt::new("Select a Heroku App", options).default_index(default_index);
    let choice = services.prompter.select(&prompt)?;

    let app = match choice.as_str() {
        NEW_APP => create_app(services, config, None)?,
        NEW_ORG_APP => {
            let org = select_org(services, config)?;
            create_app(services, config, Some(&org))?
        }
        name => existing_app(config, name)?,
    };

    let name = app.get("name").and_then(Value::as_str).unwrap_or_default();
    tracing::info!(app = name, "heroku app selected");
    config.set_value("parameters.heroku.app", app)
}

fn existing_app(config: &Configuration, name: &str) -> Result<Value> {
    config
        .get("heroku.apps")
        .and_then(Value::as_array)
        .and_then(|apps| {
            apps.iter()
                .find(|app| app.get("name").and_then(Value::as_str) == Some(name))
        })
        .cloned()
        .ok_or_else(|| {
            Error::validation_invalid_argument(
                "app",
                format!("Unknown Heroku app: {}", name),
                Some(name.to_string()),
                Some(app_names(config)),
            )
        })
}

fn select_org(services: &Services<'_>, config: &Configuration) -> Result<String> {
    let result = services.run(heroku(services, config).args(["orgs", "--json"]))?;
    let orgs = stdout_json(&result)?;
    let names: Vec<String> = orgs
        .as_array()
        .map(|orgs| {
            orgs.iter()
                .filter_map(|org| org.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if names.is_empty() {
        return Err(Error::validation_invalid_argument(
            "organization",
            "No Heroku organizations available",
            None,
            None,
        ));
    }

    services
        .prompter
        .select(&SelectPrompt::new("Select a Heroku Organization", names))
}

fn create_app(services: &Services<'_>, config: &Configuration, org: Option<&str>) -> Result<Value> {
    let mut descriptor = with_options(
        heroku(services, config),
        CommandOptions::new()
            .logging_start("Creating Heroku app")
            .logging_finish("Created Heroku app"),
    )
    .arg("create");
    if let Some(org) = org {
        descriptor = descriptor.args(["-t", org]);
    }
    let result = services.run(descriptor.arg("--json"))?;
    stdout_json(&result)
}

fn app_name(config: &Configuration) -> Result<String> {
    config
        .require_str("parameters.heroku.app.name")
        .map(str::to_string)
}

/// `app.json` buildpacks, added in order with 1-based indexes. Failures are
/// tolerated since a buildpack may already be present.
pub fn add_buildpacks(services: &Services<'_>, config: &mut Configuration) -> Result<()> {
    let app = app_name(config)?;
    let urls: Vec<String> = config
        .get("heroku.app.json.buildpacks")
        .and_then(Value::as_array)
        .map(|packs| {
            packs
                .iter()
                .filter_map(|pack| pack.get("url").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let commands = urls.iter().enumerate().map(|(i, url)| {
        with_options(
            heroku(services, config),
            CommandOptions::new()
                .logging_start(format!("Adding buildpack: {}", url))
                .logging_finish(format!("Added buildpack: {}", url)),
        )
        .arg("buildpacks:add")
            .args(["--index".to_string(), (i + 1).to_string(), url.clone()])
            .args(["-a", app.as_str()])
    });

    CommandSequence::new(CommandOptions::new().exit_on_error(false))
        .extend(commands)
        .run(services.runner)?;
    Ok(())
}

/// Plan name of an `app.json` add-on entry: either a bare string or an
/// object with a `plan` field.
fn addon_plan(entry: &Value) -> Option<&str> {
    entry
        .as_str()
        .or_else(|| entry.get("plan").and_then(Value::as_str))
}

/// Create every `app.json` add-on whose plan the app does not have yet.
pub fn add_addons(services: &Services<'_>, config: &mut Configuration) -> Result<()> {
    let app = app_name(config)?;
    let result = services.run(heroku(services, config).args(["addons", "-a", app.as_str(), "--json"]))?;
    let existing = stdout_json(&result)?;
    let existing: Vec<&str> = existing
        .as_array()
        .map(|addons| {
            addons
                .iter()
                .filter_map(|addon| addon.pointer("/plan/name").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    let wanted: Vec<String> = config
        .get("heroku.app.json.addons")
        .and_then(Value::as_array)
        .map(|addons| {
            addons
                .iter()
                .filter_map(addon_plan)
                .filter(|plan| !existing.contains(plan))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let commands: Vec<CommandDescriptor> = wanted
        .iter()
        .map(|plan| {
            with_options(
                heroku(services, config),
                CommandOptions::new()
                    .logging_start(format!("Creating add-on: {}", plan))
                    .logging_finish(format!("Created add-on: {}", plan)),
            )
            .args(["addons:create", plan.as_str(), "-a", app.as_str()])
        })
        .collect();

    CommandSequence::new(CommandOptions::new())
        .extend(commands)
        .run(services.runner)?;
    Ok(())
}

/// Scale each `app.json` formation entry: `<type>=<quantity>:<size>`.
pub fn add_formation(services: &Services<'_>, config: &mut Configuration) -> Result<()> {
    let app = app_name(config)?;
    let formation = match config.get("heroku.app.json.formation").and_then(Value::as_object) {
        Some(formation) => formation.clone(),
        None => return Ok(()),
    };

    let mut commands = Vec::with_capacity(formation.len());
    for (process_type, entry) in &formation {
        let quantity = entry.get("quantity").map(scalar).unwrap_or_else(|| "1".to_string());
        let size = entry.get("size").map(scalar).ok_or_else(|| {
            Error::config_invalid_value(
                format!("formation.{}.size", process_type),
                None,
                "a dyno size is required",
            )
        })?;
        commands.push(
            with_options(
                heroku(services, config),
                CommandOptions::new()
                    .logging_start(format!("Scaling {} dynos", process_type))
                    .logging_finish(format!("Scaled {} dynos", process_type)),
            )
            .arg("ps:scale")
                .arg(format!("{}={}:{}", process_type, quantity, size))
                .args(["-a", app.as_str()]),
        );
    }

    CommandSequence::new(CommandOptions::new())
        .extend(commands)
        .run(services.runner)?;
    Ok(())
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
