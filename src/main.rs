use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{certificate, deploy, setting, transport, GlobalArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "orizuru")]
#[command(version = VERSION)]
#[command(about = "Orizuru deployment workflows and Apex transport generation")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the current branch to a Heroku app described by app.json
    Deploy(deploy::DeployArgs),
    /// Generate a self-signed certificate with openssl
    Certificate(certificate::CertificateArgs),
    /// Generate Apex transport classes from Avro schemas
    Transport(transport::TransportArgs),
    /// Read or write project settings
    Setting(setting::SettingArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    orizuru::logging::init(&cli.global.invocation());

    let (json_result, exit_code) = commands::run_json(cli.command, &cli.global);
    if let Err(err) = &json_result {
        orizuru::logging::error(err);
    }
    if let Err(err) = output::print_json_result(json_result) {
        orizuru::logging::error(&err);
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
