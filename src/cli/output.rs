//! Plain stdout formatting helpers shared by the `status` and `check`
//! subcommands.

use std::fmt::Display;

use owo_colors::OwoColorize;

pub fn header(version: &str) {
    println!("{} {}", "arbitrex".bold(), version.dimmed());
    println!();
}

pub fn field(label: &str, value: impl Display) {
    println!("  {:<16} {}", label.dimmed(), value);
}

pub fn success(message: &str) {
    println!("  {} {}", "\u{2713}".green(), message);
}

pub fn warning(message: &str) {
    println!("  {} {}", "\u{26a0}".yellow(), message);
}

pub fn error(message: &str) {
    eprintln!("  {} {}", "\u{d7}".red(), message);
}

pub fn section(title: &str) {
    println!();
    println!("{}", title.bold());
}
