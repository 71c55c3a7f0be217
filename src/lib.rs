pub mod client;
pub mod config;
pub mod host;
pub mod i18n;
pub mod logging;
pub mod lookup;
pub mod telegram;
pub mod testing;
pub mod utils;
