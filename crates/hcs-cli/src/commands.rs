use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use hcs_codec::FileCodec;
use hcs_sdk::{ClientConfig, FileMemo, HcsClient, MessageFilter, TopicInfo, TopicMessage};
use hcs_types::TopicId;
use serde_json::json;
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Topic(TopicArgs { action }) => match action {
            TopicAction::Info { topic_id } => cmd_topic_info(client(config)?, topic_id, format).await,
            TopicAction::Messages(args) => cmd_topic_messages(client(config)?, args, format).await,
        },
        Command::File(FileArgs { action }) => match action {
            FileAction::Resolve { topic_id, output } => {
                cmd_file_resolve(client(config)?, topic_id, output.as_deref(), format).await
            }
            FileAction::Memo { path } => cmd_file_memo(&config, &path, format),
            FileAction::CheckMemo { memo } => cmd_check_memo(&memo, format),
        },
    }
}

/// Config file first, then command-line overrides.
fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(network) = &cli.network {
        config.network = network.clone();
    }
    if let Some(url) = &cli.mirror_url {
        config.mirror.base_url = url.clone();
    }
    debug!(network = %config.network, mirror = %config.mirror.base_url, "configuration resolved");
    Ok(config)
}

fn client(config: ClientConfig) -> anyhow::Result<HcsClient> {
    // The CLI holds no signing keys, so it never has a consensus client either.
    Ok(HcsClient::read_only(ClientConfig {
        direct_queries: false,
        ..config
    })?)
}

async fn cmd_topic_info(client: HcsClient, topic_id: TopicId, format: OutputFormat) -> anyhow::Result<()> {
    let info = client.topics().get_topic_info(&topic_id).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        OutputFormat::Text => print_topic_info(&info),
    }
    Ok(())
}

fn print_topic_info(info: &TopicInfo) {
    let none = || "none".dimmed().to_string();
    println!("Topic {}", info.topic_id.to_string().yellow().bold());
    println!("  Memo: {}", info.memo);
    println!("  Admin key: {}", info.admin_key.clone().unwrap_or_else(none));
    println!("  Submit key: {}", info.submit_key.clone().unwrap_or_else(none));
    if let Some(period) = info.auto_renew_period {
        println!("  Auto-renew period: {period}s");
    }
    if let Some(account) = info.auto_renew_account_id {
        println!("  Auto-renew account: {account}");
    }
    if let Some(expiry) = info.expiration_time {
        println!("  Expires: {expiry}");
    }
    if info.is_mutable() {
        println!("  {}", "mutable".yellow());
    } else {
        println!("  {}", "immutable".green());
    }
    if FileMemo::is_valid(&info.memo) {
        println!("  {} file topic", "✓".green());
    }
}

async fn cmd_topic_messages(client: HcsClient, args: MessagesArgs, format: OutputFormat) -> anyhow::Result<()> {
    let filter = MessageFilter {
        from: args.from,
        to: args.to,
        limit: args.limit,
        ..Default::default()
    };
    let messages = client.messages().get_topic_messages(&args.topic_id, &filter).await?;
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = messages.iter().map(message_json).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            if messages.is_empty() {
                println!("No messages.");
            }
            for message in &messages {
                println!(
                    "{} {} {}",
                    format!("#{}", message.sequence_number).yellow(),
                    message.consensus_timestamp.to_string().dimmed(),
                    String::from_utf8_lossy(&message.contents)
                );
            }
        }
    }
    Ok(())
}

fn message_json(message: &TopicMessage) -> serde_json::Value {
    json!({
        "consensus_timestamp": message.consensus_timestamp.to_string(),
        "sequence_number": message.sequence_number,
        "size": message.contents.len(),
        "contents": String::from_utf8_lossy(&message.contents),
    })
}

async fn cmd_file_resolve(
    client: HcsClient,
    topic_id: TopicId,
    output: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let payload = client.files().resolve_file(&topic_id).await?;
    let Some(path) = output else {
        std::io::stdout().lock().write_all(&payload)?;
        return Ok(());
    };
    std::fs::write(path, &payload).with_context(|| format!("writing {}", path.display()))?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "topic_id": topic_id, "size": payload.len(), "output": path.display().to_string() })
        ),
        OutputFormat::Text => println!(
            "{} Resolved {} ({} bytes) to {}",
            "✓".green().bold(),
            topic_id.to_string().yellow(),
            payload.len(),
            path.display().to_string().bold()
        ),
    }
    Ok(())
}

fn cmd_file_memo(config: &ClientConfig, path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let payload = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let memo = FileCodec::standard(config.max_message_bytes).memo_for(&payload);
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "path": path.display().to_string(), "size": payload.len(), "memo": memo.to_string() })
        ),
        OutputFormat::Text => println!("{memo}"),
    }
    Ok(())
}

fn cmd_check_memo(memo: &str, format: OutputFormat) -> anyhow::Result<()> {
    let parsed = FileMemo::parse(memo);
    match (format, &parsed) {
        (OutputFormat::Json, Ok(m)) => println!("{}", json!({ "valid": true, "sha256": m.digest().to_hex() })),
        (OutputFormat::Json, Err(e)) => println!("{}", json!({ "valid": false, "reason": e.to_string() })),
        (OutputFormat::Text, Ok(m)) => {
            println!("{} Valid file memo", "✓".green().bold());
            println!("  SHA-256: {}", m.digest().to_hex().cyan());
        }
        (OutputFormat::Text, Err(e)) => println!("{} {}", "✗".red().bold(), e),
    }
    if parsed.is_err() {
        bail!("invalid file memo");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults_without_flags() {
        let config = resolve_config(&parse(&["hcs", "file", "check-memo", "x"])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "network = \"previewnet\"\n[mirror]\nbase_url = \"http://from-file\"").unwrap();
        let path = file.path().to_str().unwrap();

        let config = resolve_config(&parse(&["hcs", "--config", path, "file", "check-memo", "x"])).unwrap();
        assert_eq!(config.network, "previewnet");
        assert_eq!(config.mirror.base_url, "http://from-file");

        let config = resolve_config(&parse(&[
            "hcs", "--config", path, "--network", "mainnet",
            "--mirror-url", "http://from-flag", "file", "check-memo", "x",
        ]))
        .unwrap();
        assert_eq!(config.network, "mainnet");
        assert_eq!(config.mirror.base_url, "http://from-flag");
    }

    #[test]
    fn cli_client_reads_through_rest() {
        let config = ClientConfig {
            direct_queries: true,
            ..Default::default()
        };
        let client = client(config).unwrap();
        assert_eq!(client.transport_kind().to_string(), "rest");
    }

    #[test]
    fn memo_of_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        cmd_file_memo(&ClientConfig::default(), file.path(), OutputFormat::Text).unwrap();
        assert!(cmd_file_memo(&ClientConfig::default(), Path::new("/nonexistent/file"), OutputFormat::Text).is_err());
    }

    #[test]
    fn check_memo_exit_status() {
        let memo = FileCodec::standard(1024).memo_for(b"hello world").to_string();
        assert!(cmd_check_memo(&memo, OutputFormat::Json).is_ok());
        assert!(cmd_check_memo(&memo.to_uppercase(), OutputFormat::Text).is_err());
        assert!(cmd_check_memo("abc:zstd:base64", OutputFormat::Json).is_err());
    }
}
