pub mod event;
pub mod level;
pub mod prefs;
pub mod schedule;
pub mod step;
pub mod world;
