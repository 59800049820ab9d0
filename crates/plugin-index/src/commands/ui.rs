//! Console styling for command output.

use console::{style, StyledObject};
use std::fmt::Display;

/// Status line prefixed by a blue arrow.
pub fn info(msg: impl Display) {
    println!("{} {}", style("→").blue().bold(), msg);
}

/// Status line prefixed by a yellow bang.
pub fn warn(msg: impl Display) {
    println!("{} {}", style("!").yellow().bold(), msg);
}

/// Plugin, branch or view names.
pub fn name(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

/// Counts.
pub fn num(n: impl Display) -> StyledObject<String> {
    style(n.to_string()).cyan().bold()
}

/// Secondary text such as descriptions and URLs.
pub fn dim(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

/// Bold underlined title followed by a blank line.
pub fn header(title: impl Display) {
    println!("{}", style(title.to_string()).bold().underlined());
    println!();
}
