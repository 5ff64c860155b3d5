pub mod setup;
pub mod sync;
pub mod ui;
