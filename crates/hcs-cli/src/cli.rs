use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use hcs_types::{ConsensusTimestamp, TopicId};

#[derive(Parser)]
#[command(
    name = "hcs",
    about = "Inspect consensus topics, message history, and topic-backed files",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML client configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub network: Option<String>,

    /// Mirror node base URL
    #[arg(long, global = true)]
    pub mirror_url: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read topic metadata and history
    Topic(TopicArgs),
    /// Resolve files and compute file memos
    File(FileArgs),
}

#[derive(Args)]
pub struct TopicArgs {
    #[command(subcommand)]
    pub action: TopicAction,
}

#[derive(Subcommand)]
pub enum TopicAction {
    /// Show a topic's metadata
    Info { topic_id: TopicId },
    /// List a topic's messages in consensus order
    Messages(MessagesArgs),
}

#[derive(Args)]
pub struct MessagesArgs {
    pub topic_id: TopicId,
    /// Earliest consensus time (RFC 3339 or `seconds.nanos`)
    #[arg(long, value_parser = parse_time)]
    pub from: Option<DateTime<Utc>>,
    /// Latest consensus time (RFC 3339 or `seconds.nanos`)
    #[arg(long, value_parser = parse_time)]
    pub to: Option<DateTime<Utc>>,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct FileArgs {
    #[command(subcommand)]
    pub action: FileAction,
}

#[derive(Subcommand)]
pub enum FileAction {
    /// Rebuild and verify a file stored on a topic
    Resolve {
        topic_id: TopicId,
        /// Write the payload here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compute the memo a local file would be published under
    Memo { path: PathBuf },
    /// Check whether a string is a well-formed file memo
    CheckMemo { memo: String },
}

pub fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = ConsensusTimestamp::parse(s) {
        return Ok(ts.to_datetime());
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 or seconds.nanos: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_topic_info() {
        let cli = Cli::try_parse_from(["hcs", "topic", "info", "0.0.1234"]).unwrap();
        if let Command::Topic(TopicArgs { action: TopicAction::Info { topic_id } }) = cli.command {
            assert_eq!(topic_id, TopicId::new(0, 0, 1234));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_bad_topic_id() {
        assert!(Cli::try_parse_from(["hcs", "topic", "info", "not-a-topic"]).is_err());
    }

    #[test]
    fn parse_topic_messages_window() {
        let cli = Cli::try_parse_from([
            "hcs", "topic", "messages", "0.0.7",
            "--from", "2024-01-01T00:00:00Z",
            "--to", "1704067260.000000000",
            "-n", "10",
        ])
        .unwrap();
        if let Command::Topic(TopicArgs { action: TopicAction::Messages(args) }) = cli.command {
            assert_eq!(args.limit, Some(10));
            assert_eq!(args.from.unwrap().timestamp(), 1_704_067_200);
            assert_eq!(args.to.unwrap().timestamp(), 1_704_067_260);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_bad_time() {
        assert!(Cli::try_parse_from(["hcs", "topic", "messages", "0.0.7", "--from", "yesterday"]).is_err());
    }

    #[test]
    fn parse_file_resolve_output() {
        let cli = Cli::try_parse_from(["hcs", "file", "resolve", "0.0.9", "-o", "out.bin"]).unwrap();
        if let Command::File(FileArgs { action: FileAction::Resolve { topic_id, output } }) = cli.command {
            assert_eq!(topic_id, TopicId::new(0, 0, 9));
            assert_eq!(output, Some(PathBuf::from("out.bin")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_file_check_memo() {
        let cli = Cli::try_parse_from(["hcs", "file", "check-memo", "abc:zstd:base64"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::File(FileArgs { action: FileAction::CheckMemo { .. } })
        ));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "hcs", "file", "memo", "a.txt",
            "--network", "mainnet",
            "--mirror-url", "http://localhost:5551",
            "--config", "hcs.toml",
            "--format", "json",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(cli.network.as_deref(), Some("mainnet"));
        assert_eq!(cli.mirror_url.as_deref(), Some("http://localhost:5551"));
        assert_eq!(cli.config, Some(PathBuf::from("hcs.toml")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
    }
}
