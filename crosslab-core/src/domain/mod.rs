//! Domain types for CrossLab

pub mod bar;
pub mod series;
pub mod window;

pub use bar::Bar;
pub use series::{validate_bars, Series};
pub use window::{MovingAverageWindow, WindowRole};
