//! Human-readable rendering of a record.

use std::io::{self, Write};

use colored::Colorize;

use crate::domain::record::{Record, Value};

pub const HEADER: &str = "The following information will be sent to the GNOME project:";
pub const FOOTER: &str =
    "This information will be collected anonymously and will be used to help improve the GNOME project.";

/// Width of the longest label, "Workspaces only on primary".
const LABEL_WIDTH: usize = 26;
const GUTTER: usize = 4;

/// Print every entry in collection order. Lists get their own line.
pub fn render(record: &Record, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}\n", HEADER)?;
    for (label, value) in record.iter() {
        let name = label.as_str();
        match value {
            Value::List(_) => {
                writeln!(out, "{}", name.bold())?;
                writeln!(out, "{}", value)?;
            }
            _ => {
                let padding = (LABEL_WIDTH + GUTTER).saturating_sub(name.len());
                writeln!(out, "{}{}{}", name.bold(), " ".repeat(padding), value)?;
            }
        }
    }
    writeln!(out, "\n{}\n", FOOTER)?;
    Ok(())
}
