use std::process::ExitCode;

fn main() -> ExitCode {
    match stepsim::app::run_scripts() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
