mod config;
mod plain;

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use feedscope_feed::{RenderedRow, StreamClient};
use feedscope_net::{Endpoints, StreamEvent, StreamManager, TopicLabel, http_client, load_topic};
use feedscope_tui::app::PAGE_SIZE;
use feedscope_tui::{
    Action, AppState, Event, EventHandler, FeedViewerScreen, HelpOverlay, KeyBindings, KeyContext,
    Tui,
};

use crate::config::{Args, Settings};

/// Rows moved per mouse wheel notch
const WHEEL_STEP: usize = 3;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let result = run(args).await;

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run(args: Args) -> Result<()> {
    let settings = Settings::load(args)?;
    init_tracing(&settings)?;

    if settings.plain {
        plain::run(settings).await
    } else {
        run_app(settings).await
    }
}

/// Logs go to the log file when one is configured. Without one, plain mode
/// logs to stderr and the TUI discards them so the screen stays intact.
fn init_tracing(settings: &Settings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &settings.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if settings.plain => builder.with_writer(std::io::stderr).init(),
        None => builder.with_writer(std::io::sink).init(),
    }

    Ok(())
}

/// Client configured from settings, with the initial filter applied
pub(crate) fn build_client(settings: &Settings) -> Result<StreamClient> {
    let mut client = StreamClient::new(settings.buffer_size, settings.internal.clone());
    if let Some(pattern) = &settings.filter {
        client
            .apply_filter(pattern)
            .with_context(|| format!("Invalid filter {:?}", pattern))?;
    }
    client.set_hide_internal(settings.hide_internal);
    Ok(client)
}

/// Feed one transport event into the client; returns the row if one was shown
pub(crate) fn dispatch(client: &mut StreamClient, event: StreamEvent) -> Option<&RenderedRow> {
    match event {
        StreamEvent::Open => client.on_open(),
        StreamEvent::Message(data) => client.on_message(data),
        StreamEvent::Error(reason) => {
            tracing::debug!("Stream error: {}", reason);
            client.on_error()
        }
        StreamEvent::Closed => client.on_closed(),
    }
}

async fn run_app(settings: Settings) -> Result<()> {
    let endpoints = Endpoints::new(&settings.url)?;
    let http = http_client()?;
    let mut client = build_client(&settings)?;

    // Create channels
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (stream_tx, mut stream_rx) = mpsc::unbounded_channel::<StreamEvent>();
    let (topic_tx, mut topic_rx) = mpsc::unbounded_channel::<TopicLabel>();

    let mut state = AppState::new(endpoints.base.as_str());

    let mut stream_manager = StreamManager::new();
    stream_manager.start(
        http.clone(),
        endpoints.events.clone(),
        settings.retry,
        stream_tx,
    );

    // Topic lookup runs once, alongside the stream
    {
        let http = http.clone();
        let url = endpoints.health.clone();
        tokio::spawn(async move {
            let topic = load_topic(&http, &url).await;
            let _ = topic_tx.send(topic);
        });
    }

    let mut tui = Tui::new().context("Failed to initialize terminal")?;
    let mut events = EventHandler::new(Duration::from_millis(250));
    let keybindings = KeyBindings::new();

    // Initial render
    render(&mut tui, &mut state, &client)?;

    // Main event loop
    loop {
        tokio::select! {
            // Handle terminal events
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let action = if state.search_active {
                            keybindings.get_filter_input_action(&key)
                        } else {
                            keybindings.get_action(KeyContext::FeedViewer, &key)
                        };
                        if let Some(action) = action {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Paste(text) => {
                        if state.search_active {
                            let _ = action_tx.send(Action::SearchPaste(text));
                        }
                    }
                    Event::Scroll(direction) => {
                        let action = if direction > 0 {
                            Action::ScrollDown(WHEEL_STEP)
                        } else {
                            Action::ScrollUp(WHEEL_STEP)
                        };
                        let _ = action_tx.send(action);
                    }
                    Event::Tick => {}
                    Event::Resize(_, _) => {
                        let _ = action_tx.send(Action::Render);
                    }
                    Event::Error(e) => {
                        state.show_error(e);
                    }
                }
            }

            // Handle stream events, draining whatever is queued before painting
            Some(event) = stream_rx.recv() => {
                if dispatch(&mut client, event).is_some() {
                    state.row_inserted();
                }
                while let Ok(event) = stream_rx.try_recv() {
                    if dispatch(&mut client, event).is_some() {
                        state.row_inserted();
                    }
                }
            }

            Some(topic) = topic_rx.recv() => {
                state.topic = topic;
            }

            // Handle user actions
            Some(action) = action_rx.recv() => {
                handle_action(&mut state, &mut client, action);
            }
        }

        if state.should_quit {
            break;
        }

        state.connection = stream_manager.stats();
        render(&mut tui, &mut state, &client)?;
    }

    // Cleanup
    stream_manager.stop();
    events.shutdown();
    tui.restore()?;

    Ok(())
}

fn handle_action(state: &mut AppState, client: &mut StreamClient, action: Action) {
    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::Back => {
            if state.help_visible {
                state.help_visible = false;
            } else {
                state.dismiss_message();
            }
        }
        Action::ToggleHelp => {
            state.help_visible = !state.help_visible;
        }

        // Filter input
        Action::OpenSearch => {
            let current = client.filter().text.pattern().to_string();
            state.start_search(&current);
        }
        Action::CloseSearch => {
            state.cancel_search();
        }
        Action::SearchInput(c) => {
            state.search_input_char(c);
        }
        Action::SearchPaste(text) => {
            state.search_input_paste(&text);
        }
        Action::SearchBackspace => {
            state.search_input_backspace();
        }
        Action::SearchClear => {
            state.search_input.clear();
        }

        // Filtering
        Action::ApplyFilter => match client.apply_filter(&state.search_input) {
            Ok(changed) => {
                state.cancel_search();
                if changed {
                    state.scroll_to_top();
                }
            }
            Err(e) => {
                state.filter_error = Some(format!("Invalid filter: {}", e));
            }
        },
        Action::ClearFilter => {
            client.clear_filter();
            state.search_input.clear();
            state.filter_error = None;
            state.scroll_to_top();
        }
        Action::ToggleHideInternal => {
            let hide = !client.hide_internal();
            client.set_hide_internal(hide);
        }

        // Feed actions
        Action::ClearMessages => {
            client.clear_all_messages();
            state.scroll_to_top();
        }
        Action::ExportMessages => {
            let filename = export_filename(&state.topic);
            match export_rows(Path::new(&filename), client) {
                Ok(count) => {
                    state.show_notice(format!("Exported {} messages to {}", count, filename));
                }
                Err(e) => {
                    state.show_error(format!("Export failed: {:#}", e));
                }
            }
        }

        // Scrolling
        Action::ScrollUp(n) => state.scroll_up(n),
        Action::ScrollDown(n) => state.scroll_down(n),
        Action::PageUp => state.scroll_up(PAGE_SIZE),
        Action::PageDown => state.scroll_down(PAGE_SIZE),
        Action::ScrollToTop => state.scroll_to_top(),
        Action::ScrollToBottom => state.scroll_to_bottom(),
        Action::ToggleFollow => state.toggle_follow(),

        Action::Render => {}
    }
}

fn render(tui: &mut Tui, state: &mut AppState, client: &StreamClient) -> Result<()> {
    tui.terminal().draw(|frame| {
        FeedViewerScreen::render(frame, state, client);

        // Render help overlay if visible
        if state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;

    Ok(())
}

/// `feed_<topic>_<YYYYmmdd_HHMMSS>.log` in the working directory
fn export_filename(topic: &TopicLabel) -> String {
    let name = match topic {
        TopicLabel::Topic(name) => name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
        _ => "messages".to_string(),
    };
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("feed_{}_{}.log", name, timestamp)
}

/// Write the visible rows oldest first, one `[ts] content` line each
fn export_rows(path: &Path, client: &StreamClient) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let mut count = 0;
    for row in client.view().iter().rev() {
        writeln!(writer, "{}", row.plain_text())?;
        count += 1;
    }
    writer.flush()?;

    Ok(count)
}
