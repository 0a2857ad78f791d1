//! TUI components for feedscope
//!
//! This crate provides the terminal user interface for feedscope,
//! including state management, keybindings, event handling, and UI components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{HelpOverlay, StatusBar, feed_hints};
pub use ui::screens::FeedViewerScreen;
pub use ui::{Layout, Theme};
