use std::process::ExitCode;

fn main() -> ExitCode {
    match co2_arima::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
