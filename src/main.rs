//! # orphan-finder CLI
//!
//! Command-line interface for the orphan finder.
//!
//! ## Usage
//! ```bash
//! orphan-finder find ~/Incoming --album ~/Albums --output ~/Orphans
//! orphan-finder index --album ~/Albums --album /mnt/backup/Albums
//! ```

mod cli;

use console::style;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::from(2)
        }
    }
}
