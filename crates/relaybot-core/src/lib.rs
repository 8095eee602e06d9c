pub mod error;
pub mod types;
pub mod config;
pub mod util;
pub mod store;
pub mod user_config;
pub mod transcript;
pub mod provider;
pub mod telegram;
pub mod handler;
pub mod dispatch;
pub mod http;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
