//! Progress tracking and unlock visualization for a fixed catalog of watchable items.
//!
//! # Usage
//! 1. Load a [`Catalog`] and build a [`GraphIndex`] from it.
//! 1. Load a [`ProgressStore`] from a [`KeyValueBackend`](progress::KeyValueBackend).
//! 1. Create a [`Controller`] with a [`Renderer`] over some [`Surface`](render::Surface).
//! 1. Call [`Controller::refresh()`] on load and resize, and the action methods on user input.

pub mod error;
pub use error::Result;
pub use error::Error;

pub mod config;
pub use config::WatchmapConfig;

pub mod catalog;
pub use catalog::Catalog;
pub use catalog::Item;

pub mod progress;
pub use progress::ProgressStore;
pub use progress::WatchedState;

pub mod graph_index;
pub use graph_index::GraphIndex;

pub mod unlock;
pub use unlock::Evaluator;
pub use unlock::NodeState;

pub mod layout;
pub use layout::LayoutMetrics;

pub mod render;
pub use render::Renderer;

pub mod controller;
pub use controller::Controller;
