//! # fleetsync-renderer
//!
//! Tera-based HTML rendering of the fleet status page.
//!
//! Rendering is split in two: [`StatusPage::from_snapshot`] builds the page as
//! a plain value (sorted rows plus footer metadata), and
//! [`StatusRenderer::render`] turns that value into a document. Neither step
//! knows anything about HTTP.
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use fleetsync_core::SnapshotStore;
//! use fleetsync_renderer::{StatusPage, StatusRenderer};
//!
//! fn page(store: &SnapshotStore) -> Option<String> {
//!     let renderer = StatusRenderer::new().ok()?;
//!     let page = StatusPage::from_snapshot(&store.current(), "scraper", Utc::now());
//!     renderer.render(&page).ok()
//! }
//! ```

pub mod error;
pub mod page;

pub use error::RenderError;
pub use page::{StatusPage, StatusRenderer, NO_DATA};
