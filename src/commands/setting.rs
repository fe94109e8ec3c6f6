use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::Value;

use orizuru::paths;
use orizuru::settings::SettingsStore;

use super::{parse_value, CmdResult, GlobalArgs};

#[derive(Args)]
pub struct SettingArgs {
    #[command(subcommand)]
    pub command: SettingCommand,
}

#[derive(Subcommand)]
pub enum SettingCommand {
    /// Read a setting by dotted key
    Get { key: String },
    /// Write a setting; the value is parsed as JSON when possible
    Set { key: String, value: String },
}

#[derive(Serialize)]
pub struct SettingOutput {
    pub command: String,
    pub key: String,
    pub value: Value,
    pub path: String,
}

pub fn run(args: SettingArgs, _global: &GlobalArgs) -> CmdResult<SettingOutput> {
    let root = paths::project_root()?;
    let store = SettingsStore::for_project(&root);
    let path = store.path().display().to_string();

    match args.command {
        SettingCommand::Get { key } => {
            let value = store.read_setting(&key)?.unwrap_or(Value::Null);
            Ok((
                SettingOutput {
                    command: "setting.get".to_string(),
                    key,
                    value,
                    path,
                },
                0,
            ))
        }
        SettingCommand::Set { key, value } => {
            let value = parse_value(&value);
            store.write_setting(&key, value.clone())?;
            Ok((
                SettingOutput {
                    command: "setting.set".to_string(),
                    key,
                    value,
                    path,
                },
                0,
            ))
        }
    }
}
