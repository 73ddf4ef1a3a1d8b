//! antity CLI entry point
//!
//! Installs the log subscriber, then delegates everything to the CLI
//! module. The response envelope is already on stdout when a command
//! fails; the error is repeated on stderr and the process exits non-zero.

use antity::{cli, observability};

fn main() {
    observability::init_tracing();

    if let Err(e) = cli::run() {
        eprintln!("{}: {}", e.code(), e);
        std::process::exit(1);
    }
}
