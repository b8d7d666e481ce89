//! Output formatting and progress indicators

use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner for operations with unknown duration
///
/// Hidden when stderr is not a terminal.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Print a success line on stdout
pub fn print_success(message: &str) {
    println!("{} {message}", status::SUCCESS);
}

/// Print an indented detail line on stdout
pub fn print_detail(message: &str) {
    println!("  {message}");
}

/// Format an error and its causes for display
pub fn format_error(error: &anyhow::Error) -> String {
    let mut message = format!("{} {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        message.push_str(&format!("\n  Caused by: {cause}"));
    }
    message
}

/// Print an error and its causes on stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{}", format_error(error));
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";
}
