//! aerofilter CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`. Failures are reported
//! as a single JSON error line and a non-zero exit code.

use aerofilter::cli;

fn main() {
    if let Err(e) = cli::run() {
        if cli::write_error(e.code_str(), e.message()).is_err() {
            eprintln!("{}", e);
        }
        std::process::exit(1);
    }
}
