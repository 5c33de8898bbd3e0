pub mod config;
pub mod errors;
pub mod helius;
pub mod programs;
pub mod types;
pub mod utils;

pub use config::{
    AmountPolicy, FileConfig, HeliusConfig, PagingConfig, RetryConfig, TrackedPrograms, UpdaterConfig, WalletCountMode,
};
pub use errors::{Error, Result};
pub use types::*;
