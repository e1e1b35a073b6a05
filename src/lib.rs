pub mod app;
pub mod cluster;
pub mod logging;
pub mod report;
pub mod settings;
pub mod spans;
mod util;
