use clap::Args;

use orizuru::transport::{self, TransportOutput};
use orizuru::{log_status, paths};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct TransportArgs {
    /// Directory searched recursively for .avsc schema files
    pub input: String,

    /// Directory the generated Apex class and its metadata are written to
    pub output: String,
}

pub fn run(args: TransportArgs, _global: &GlobalArgs) -> CmdResult<TransportOutput> {
    let cwd = paths::project_root()?;
    let input = paths::resolve_user_path(&cwd, &args.input)?;
    let output = paths::resolve_user_path(&cwd, &args.output)?;

    let result = transport::generate_from_dir(&input, &output)?;
    log_status!(
        "transport",
        "Generated {} classes from {} schema files into {}",
        result.classes.len(),
        result.input_files.len(),
        output.display()
    );

    Ok((result, 0))
}
