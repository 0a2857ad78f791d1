pub mod components;
mod layout;
pub mod screens;
mod theme;

pub use layout::{FeedAreas, Layout};
pub use theme::Theme;
