mod app;
mod config;
mod effects;
mod files;
pub mod logging;
mod persistence;
mod ui;

pub use app::{run_convert, run_login, run_logout, run_whoami, ConvertRequest};
pub use config::ConfigOverrides;
