//! Format Python files in place.

use pyfmt_cli::Mode;
use std::process::ExitCode;

fn main() -> ExitCode {
    pyfmt_cli::run(Mode::InPlace)
}
