mod feed_viewer;

pub use feed_viewer::{FeedViewerScreen, fit_segments};
