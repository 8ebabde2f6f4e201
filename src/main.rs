//! mavengen - local Maven repository generator

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = mavengen::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
