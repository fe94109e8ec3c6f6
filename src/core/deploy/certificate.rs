//! Self-signed certificate generation through `openssl`.

use serde::{Deserialize, Serialize};

use super::{with_options, Services};
use crate::configuration::Configuration;
use crate::error::Result;
use crate::paths;
use crate::pipeline::Step;
use crate::process::CommandOptions;
use crate::prompt::TextPrompt;
use crate::utils::io;

/// Subject fields for `openssl req -subj`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub country: String,
    pub state: String,
    pub locality: String,
    pub organization: String,
    pub organizational_unit: String,
    pub common_name: String,
}

impl Subject {
    /// `/C=../ST=../L=../O=../OU=../CN=..`
    pub fn to_subj(&self) -> String {
        format!(
            "/C={}/ST={}/L={}/O={}/OU={}/CN={}",
            self.country,
            self.state,
            self.locality,
            self.organization,
            self.organizational_unit,
            self.common_name
        )
    }
}

/// Ask for each subject field. Locality and unit may be left empty.
pub fn ask_questions(services: &Services<'_>) -> Result<Subject> {
    let prompter = services.prompter;
    Ok(Subject {
        country: prompter
            .input(&TextPrompt::new("Country Name (2 letter code)").with_default("GB"))?,
        state: prompter
            .input(&TextPrompt::new("State or Province Name (full name)").with_default("Some-State"))?,
        locality: prompter.input(&TextPrompt::new("Locality Name (eg, city)").optional())?,
        organization: prompter
            .input(&TextPrompt::new("Organization Name (eg, company)").with_default("FinancialForce"))?,
        organizational_unit: prompter
            .input(&TextPrompt::new("Organizational Unit Name (eg, section)").optional())?,
        common_name: prompter.input(
            &TextPrompt::new("Common Name (e.g. server FQDN or YOUR name)").with_default("test@test.com"),
        )?,
    })
}

/// Write `certificate.pem` and `key.pem` into the project's certificate
/// directory.
pub fn create(services: &Services<'_>, config: &Configuration) -> Result<()> {
    let subject: Subject = config.require("parameters.certificate")?;
    let dir = paths::certificate_dir(services.root);
    io::ensure_dir(&dir, "create certificate directory")?;

    let descriptor = with_options(
        services.command(config, "openssl"),
        CommandOptions::new()
            .namespace("certificate")
            .logging_start("Generating self-signed certificate")
            .logging_finish("Generated self-signed certificate"),
    )
    .args([
        "req",
        "-newkey",
        "rsa:2048",
        "-nodes",
        "-keyout",
        paths::PRIVATE_KEY_FILE,
        "-x509",
        "-days",
        "365",
        "-out",
        paths::CERTIFICATE_FILE,
        "-subj",
    ])
    .arg(subject.to_subj())
    .working_dir(&dir);

    services.run(descriptor)?;
    Ok(())
}

/// Load the generated PEM files into `certificate.publicKey` and
/// `certificate.privateKey`. Missing files are logged, not fatal.
pub fn read(services: &Services<'_>, config: &mut Configuration) -> Result<()> {
    let dir = paths::certificate_dir(services.root);
    let public = io::read_file(&dir.join(paths::CERTIFICATE_FILE), "read certificate");
    let private = io::read_file(&dir.join(paths::PRIVATE_KEY_FILE), "read private key");

    match (public, private) {
        (Ok(public), Ok(private)) => {
            config.set_value("certificate.publicKey", public.trim().into())?;
            config.set_value("certificate.privateKey", private.trim().into())
        }
        (Err(err), _) | (_, Err(err)) => {
            tracing::warn!(error = %err.message, dir = %dir.display(), "certificate read failed");
            crate::logging::event("Certificate files have not been found");
            Ok(())
        }
    }
}

pub fn steps<'a>(services: Services<'a>) -> Vec<Step<'a, Configuration>> {
    let s = services;
    vec![
        Step::log("certificate-log", "Generating certificates..."),
        Step::merge("certificate-questions", "parameters.certificate", move |_: &Configuration| {
            ask_questions(&s)
        }),
        Step::new("certificate-create", move |c: &mut Configuration| create(&s, c)),
        Step::new("certificate-read", move |c: &mut Configuration| read(&s, c)),
    ]
}
