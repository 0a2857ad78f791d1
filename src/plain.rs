//! Line-oriented output for pipes and terminals without the TUI

use std::io::{self, Write};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

use feedscope_feed::{RenderedRow, StreamClient};
use feedscope_net::{Endpoints, StreamEvent, StreamManager, http_client, load_topic};
use feedscope_types::MessageKind;

use crate::config::Settings;
use crate::{build_client, dispatch};

const REVERSE_ON: &str = "\x1b[7m";
const REVERSE_OFF: &str = "\x1b[27m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

pub async fn run(settings: Settings) -> Result<()> {
    let endpoints = Endpoints::new(&settings.url)?;
    let http = http_client()?;
    let mut client = build_client(&settings)?;

    let topic = load_topic(&http, &endpoints.health).await;
    info!("Following {} (topic: {})", endpoints.events, topic.label());

    let (stream_tx, mut stream_rx) = mpsc::unbounded_channel::<StreamEvent>();
    let mut stream_manager = StreamManager::new();
    stream_manager.start(http, endpoints.events.clone(), settings.retry, stream_tx);

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let result = print_feed(
        &mut client,
        &mut stream_rx,
        shutdown,
        &mut io::stdout(),
        settings.color,
    )
    .await;

    stream_manager.stop();
    result
}

/// Print each shown row until `shutdown` resolves, the stream task ends or
/// the output is closed
async fn print_feed<W: Write>(
    client: &mut StreamClient,
    stream_rx: &mut mpsc::UnboundedReceiver<StreamEvent>,
    shutdown: impl Future<Output = ()>,
    out: &mut W,
    color: bool,
) -> Result<()> {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => return Ok(()),

            event = stream_rx.recv() => {
                let Some(event) = event else {
                    // Stream task finished (server closed the feed)
                    return Ok(());
                };
                if let Some(row) = dispatch(client, event) {
                    let line = format_row(row, color);
                    if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
                        // Downstream pipe closed
                        if e.kind() == io::ErrorKind::BrokenPipe {
                            return Ok(());
                        }
                        return Err(e.into());
                    }
                }
            }
        }
    }
}

/// `[ts] content`, with matches in reverse video when color is on
fn format_row(row: &RenderedRow, color: bool) -> String {
    if !color {
        return row.plain_text();
    }

    let text = row.marked_text(REVERSE_ON, REVERSE_OFF);
    match row.kind {
        MessageKind::Message => text,
        MessageKind::Error => format!("{}{}{}", RED, text, RESET),
        MessageKind::Info => format!("{}{}{}", CYAN, text, RESET),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedscope_feed::InternalRule;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[test]
    fn test_format_row_highlights_matches() {
        let mut client = StreamClient::new(10, InternalRule::default());
        client.apply_filter("error").unwrap();
        let row = client.on_message("disk Error here").unwrap().clone();

        let colored = format_row(&row, true);
        assert!(colored.ends_with("disk \x1b[7mError\x1b[27m here"));

        let plain = format_row(&row, false);
        assert!(plain.ends_with("] disk Error here"));
        assert!(!plain.contains('\x1b'));
    }

    #[test]
    fn test_format_row_colors_lifecycle_records() {
        let mut client = StreamClient::new(10, InternalRule::default());
        let row = client.on_error().unwrap().clone();

        let colored = format_row(&row, true);
        assert!(colored.starts_with(RED));
        assert!(colored.ends_with(RESET));
    }

    #[tokio::test]
    async fn test_prints_shown_rows_until_stream_ends() {
        let mut client = StreamClient::new(10, InternalRule::default());
        client.apply_filter("disk").unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(StreamEvent::Message("disk full".to_string())).unwrap();
        tx.send(StreamEvent::Message("all good".to_string())).unwrap();
        drop(tx);

        let mut out = Vec::new();
        print_feed(&mut client, &mut rx, std::future::pending(), &mut out, false)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("] disk full"));
    }

    #[tokio::test]
    async fn test_shutdown_stops_an_idle_feed() {
        let mut client = StreamClient::new(10, InternalRule::default());
        let (tx, mut rx) = mpsc::unbounded_channel::<StreamEvent>();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let shutdown = async {
            let _ = stop_rx.await;
        };

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = stop_tx.send(());
        });

        let mut out = Vec::new();
        tokio::time::timeout(
            Duration::from_secs(5),
            print_feed(&mut client, &mut rx, shutdown, &mut out, false),
        )
        .await
        .expect("feed did not stop")
        .unwrap();

        assert!(out.is_empty());
        drop(tx);
    }
}
