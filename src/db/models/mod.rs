mod night;

pub use night::{SleepNight, UNRATED_QUALITY};
