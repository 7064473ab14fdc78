use std::process::ExitCode;

use sirv::runner::run_with_args;

fn main() -> ExitCode {
    match run_with_args() {
        Ok(model) => {
            println!("tick={} {}", model.tick(), model.counts());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
