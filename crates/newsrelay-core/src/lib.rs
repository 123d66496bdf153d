pub mod config;
pub mod error;
pub mod feed;
pub mod notify;
pub mod scheduler;
pub mod storage;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::AppConfig;
pub use error::{Error, Result};
