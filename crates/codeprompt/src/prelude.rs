pub use crate::error::Error;

pub use anstream::eprintln;
pub use anstream::println;
pub use color_eyre::eyre::{eyre, Context, Result};
pub use std::format as f;

use indicatif::{ProgressBar, ProgressStyle};

pub fn new_table() -> prettytable::Table {
    let mut table = prettytable::Table::new();

    let format = prettytable::format::FormatBuilder::new()
        .padding(1, 1)
        .build();

    table.set_format(format);

    table
}

/// Create a steady-ticking spinner on stderr
pub fn new_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

/// Helper to set spinner message if spinner is present
pub fn set_spinner_msg(spinner: Option<&ProgressBar>, msg: impl Into<String>) {
    let msg = msg.into();
    log::debug!("{msg}");
    if let Some(s) = spinner {
        s.set_message(msg);
    }
}
