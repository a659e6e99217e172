pub mod config;
pub mod eta;
pub mod fleet;
pub mod geo;
pub mod grid;
pub mod motion;
pub mod orderlog;
pub mod sim;
pub mod vehicle;
