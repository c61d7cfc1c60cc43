use std::process::ExitCode;

fn main() -> ExitCode {
    // Errors are already logged by `app::run`.
    match r2b2_extractor::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(err.exit_code()),
    }
}
