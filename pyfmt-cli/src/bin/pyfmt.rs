//! Format Python source to stdout.

use pyfmt_cli::Mode;
use std::process::ExitCode;

fn main() -> ExitCode {
    pyfmt_cli::run(Mode::Stdout)
}
