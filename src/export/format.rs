//! Line formats shared by the console and file sinks

use crate::export::Match;

/// Formats one match as a single output line (including the newline)
pub type FormatFn = fn(&Match) -> String;

/// `address selector text`, space separated
pub fn plain_format(record: &Match) -> String {
    format!("{} {} {}\n", record.address, record.selector, record.text)
}

/// `"address","selector","text"` with embedded double quotes turned into
/// single quotes
pub fn csv_format(record: &Match) -> String {
    format!(
        "\"{}\",\"{}\",\"{}\"\n",
        record.address.replace('"', "'"),
        record.selector.replace('"', "'"),
        record.text.replace('"', "'")
    )
}
