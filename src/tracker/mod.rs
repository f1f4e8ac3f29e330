mod controller;
mod format;
mod quality;
mod signals;

pub use controller::{TrackerController, TrackerSnapshot};
pub use format::format_nights;
pub use quality::QualityController;
pub use signals::OneShot;
