use std::process::ExitCode;

mod app;
mod logging;
mod progress;
mod prompt;

use xmv::XmvError;

fn main() -> ExitCode {
    let args = xmv::cli::parse();
    match app::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<XmvError>() {
            Some(xe) => ExitCode::from(xe.code()),
            None => {
                xmv::output::print_error(&format!("{e:#}"));
                ExitCode::FAILURE
            }
        },
    }
}
