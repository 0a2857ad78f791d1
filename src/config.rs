//! Command line and config file handling
//!
//! Values are resolved in order: command line, config file, defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use feedscope_feed::{HistoryBuffer, InternalRule};
use feedscope_net::DEFAULT_RETRY;

pub const DEFAULT_URL: &str = "http://localhost:5000";

/// feedscope - follow a server-sent events message feed in the terminal
#[derive(Parser, Debug, Default)]
#[command(name = "feedscope")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base URL of the feed server (serves /events and /health)
    #[arg(long)]
    pub url: Option<String>,

    /// Config file (TOML)
    #[arg(long, env = "FEEDSCOPE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of messages kept in history
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Reconnect delay in milliseconds until the server sets one
    #[arg(long)]
    pub retry_ms: Option<u64>,

    /// Initial text filter
    #[arg(long)]
    pub filter: Option<String>,

    /// Start with internal API requests hidden
    #[arg(long)]
    pub hide_internal: bool,

    /// Print matching messages to stdout instead of opening the TUI
    #[arg(long)]
    pub plain: bool,

    /// Disable ANSI highlighting in plain mode
    #[arg(long)]
    pub no_color: bool,

    /// Write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Contents of the config file
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub buffer_size: Option<usize>,
    pub retry_ms: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub internal: Option<InternalRule>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub url: String,
    pub buffer_size: usize,
    pub retry: Duration,
    pub log_file: Option<PathBuf>,
    pub internal: InternalRule,
    pub filter: Option<String>,
    pub hide_internal: bool,
    pub plain: bool,
    pub color: bool,
}

impl Settings {
    /// Read the config file named by the arguments (if any) and resolve
    pub fn load(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(args, file)
    }

    pub fn resolve(args: Args, file: FileConfig) -> Result<Self> {
        let buffer_size = args
            .buffer_size
            .or(file.buffer_size)
            .unwrap_or(HistoryBuffer::DEFAULT_CAPACITY);
        if buffer_size == 0 {
            anyhow::bail!("buffer size must be at least 1");
        }

        let retry = args
            .retry_ms
            .or(file.retry_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RETRY);

        Ok(Self {
            url: args
                .url
                .or(file.url)
                .unwrap_or_else(|| DEFAULT_URL.to_string()),
            buffer_size,
            retry,
            log_file: args.log_file.or(file.log_file),
            internal: file.internal.unwrap_or_default(),
            filter: args.filter,
            hide_internal: args.hide_internal,
            plain: args.plain,
            color: !args.no_color,
        })
    }
}
