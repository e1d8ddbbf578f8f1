//! gtm - resolve werf configuration files against the head commit

use std::process::ExitCode;

use giterminism::cli;
use giterminism::ui::output;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
