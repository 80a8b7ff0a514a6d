use clap::{Parser, Subcommand};

/// Hoymiles statistics decoder
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Options {
    /// Config file to read
    #[clap(short = 'c', long = "config", default_value = "config.yaml")]
    pub config_file: String,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a capture file and print the resulting live data as JSON
    Decode {
        /// JSON lines, one reception cycle per line
        capture: String,
    },
    /// Build a raw statistics record from field values
    Encode {
        /// Serial of a configured inverter, selects the record layout
        serial: String,
        /// YAML list of {type, channel, field, value}
        values: String,
    },
}

impl Options {
    pub fn new() -> Self {
        Self::parse()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let options = Options::parse_from(["hoymiles-stats", "decode", "capture.jsonl"]);
        assert_eq!(options.config_file, "config.yaml");
        assert!(matches!(options.command, Some(Command::Decode { capture }) if capture == "capture.jsonl"));

        let options = Options::parse_from(["hoymiles-stats", "-c", "other.yaml", "encode", "112100000001", "v.yaml"]);
        assert_eq!(options.config_file, "other.yaml");
        assert!(matches!(options.command, Some(Command::Encode { .. })));

        assert!(Options::parse_from(["hoymiles-stats"]).command.is_none());
    }
}
