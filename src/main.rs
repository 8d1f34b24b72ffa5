use std::process::ExitCode;

use clap::Parser;
use credlify::{
    configatron::CredlifyArgs,
    error::{CredlifyError, ErrorAction, ErrorKind},
    events::CredlifyAlerts,
    utils::pretty_print::pretty_print,
    CredlifyRuntime,
};

/// Entry point of the scaffolder: parses the command line, runs the pipeline in the current
/// working directory and turns its outcome into the process exit status.
#[tokio::main]
async fn main() -> ExitCode {
    let args = CredlifyArgs::parse();

    let current_dir = match std::env::current_dir() {
        Ok(current_dir) => current_dir,
        Err(err) => {
            return report_failure(CredlifyError::raise_critical_other_error(
                ErrorKind::CurrentWorkingDirRetrievalFailed,
                &format!("Failed to retrieve the current working directory: {}", err),
                ErrorAction::Exit,
            ));
        }
    };

    let mut runtime = CredlifyRuntime::new(args, current_dir);

    match runtime.run().await {
        // Exit codes outside the portable range are reported as a plain failure.
        Ok(code) => u8::try_from(code)
            .map(ExitCode::from)
            .unwrap_or(ExitCode::FAILURE),
        Err(err) => report_failure(err),
    }
}

fn report_failure(err: CredlifyError) -> ExitCode {
    pretty_print(CredlifyAlerts::create_credlify_error(err));

    ExitCode::FAILURE
}
