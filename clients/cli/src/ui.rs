use std::io::IsTerminal;

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use fury::PageProgress;
use once_cell::sync::Lazy;
use spinners::{Spinner, Spinners};

static SHOULD_COLORIZE: Lazy<bool> = Lazy::new(|| {
    colored::control::ShouldColorize::from_env().should_colorize()
});

/// Spinner on stderr while more pages are fetched. Stays quiet when stderr
/// isn't a terminal.
pub struct SpinnerProgress {
    message: &'static str,
    spinner: Option<Spinner>,
}

impl SpinnerProgress {
    pub fn new(message: &'static str) -> Self {
        Self {
            message,
            spinner: None,
        }
    }
}

impl PageProgress for SpinnerProgress {
    fn start(&mut self) {
        if std::io::stderr().is_terminal() {
            self.spinner =
                Some(Spinner::new(Spinners::Dots9, self.message.to_owned()));
        }
    }

    fn finish(&mut self) {
        if let Some(mut spinner) = self.spinner.take() {
            spinner.stop_with_message(String::new());
        }
    }
}

impl Drop for SpinnerProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Starts a spinner if stderr is a terminal.
pub fn spin_if_terminal(message: &str) -> Option<Spinner> {
    std::io::stderr()
        .is_terminal()
        .then(|| Spinner::new(Spinners::Dots9, message.to_owned()))
}

pub fn stop_spinner(spinner: Option<Spinner>) {
    if let Some(mut spinner) = spinner {
        spinner.stop_with_message(String::new());
    }
}

/// Local time, with a rough age for anything younger than a day.
pub fn time_with_ago(t: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let out = t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
    let ago = now.signed_duration_since(t);
    if ago < chrono::Duration::zero() || ago >= chrono::Duration::hours(24) {
        return out;
    }

    let rough = if ago.num_hours() > 0 {
        format!("{}h", ago.num_hours())
    } else if ago.num_minutes() > 0 {
        format!("{}m", ago.num_minutes())
    } else {
        format!("{}s", ago.num_seconds())
    };
    format!("{out} (~ {rough} ago)")
}

/// Marks the current choice in a list.
pub fn marker(selected: bool) -> String {
    match (selected, *SHOULD_COLORIZE) {
        | (true, true) => "*".green().bold().to_string(),
        | (true, false) => "*".to_owned(),
        | (false, _) => " ".to_owned(),
    }
}
