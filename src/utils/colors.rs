// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Terminal output helpers
//!
//! Provides consistent styling across the CLI.

use colored::Colorize;

/// Whether stdout is an interactive terminal
pub fn is_interactive() -> bool {
    console::Term::stdout().is_term()
}

/// Whether stderr is an interactive terminal; progress bars draw there
pub fn stderr_is_interactive() -> bool {
    console::Term::stderr().is_term()
}

/// Check if colors should be used
pub fn should_use_colors() -> bool {
    // Respect NO_COLOR environment variable
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    is_interactive()
}

/// Style for code/commands
pub fn code(msg: &str) -> colored::ColoredString {
    msg.cyan()
}

/// Print a styled header
pub fn print_header(title: &str) {
    println!("{}", title.bold());
    println!("{}", "═".repeat(title.chars().count().max(40)));
}

/// Print a styled section
pub fn print_section(title: &str) {
    println!();
    println!("{}:", title.bold());
}

/// Print a key/value line
pub fn print_field(key: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", key).dimmed(), value);
}

/// Print a success check
pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print an error cross
pub fn print_error(msg: &str) {
    eprintln!("  {} {}", "✗".red(), msg);
}

/// Print a warning
pub fn print_warning(msg: &str) {
    eprintln!("  {} {}", "⚠".yellow(), msg);
}

/// Print a skipped item
pub fn print_skipped(msg: &str) {
    println!("  {} {}", "○".dimmed(), msg);
}
