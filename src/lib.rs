//! Sleep-session record keeping.
//!
//! A single-table SQLite store behind a dedicated worker thread, a repository
//! that republishes a live history snapshot after every write, and reactive
//! view-state holders for the tracker and quality screens. Rendering and
//! navigation live outside this crate; they subscribe to the watch channels
//! exposed here and call the command handlers.

pub mod db;
pub mod repository;
pub mod tracker;

pub use db::{Database, SleepNight, UNRATED_QUALITY};
pub use repository::NightRepository;
pub use tracker::{OneShot, QualityController, TrackerController, TrackerSnapshot};
