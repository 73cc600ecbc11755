//! The main function for the LibroLog command-line application
use std::process::ExitCode;

fn main() -> ExitCode {
    // A missing `.env` is fine, the environment itself may carry the configuration.
    if let Err(err) = dotenvy::dotenv()
        && !err.not_found()
    {
        return report_env_error(&err);
    }
    librolog_lib::run()
}

#[allow(clippy::print_stderr, reason = "No other tracing loaded at this point")]
fn report_env_error(err: &dotenvy::Error) -> ExitCode {
    eprintln!("Failed to load environment variables! Error: {err}");
    ExitCode::FAILURE
}
