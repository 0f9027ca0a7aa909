//! Cartera Configuration Layer
//!
//! A single TOML document configures storage, money rounding, batch transfer
//! rules, the portfolio classifier and logging. Every section and every field
//! is optional; missing values fall back to defaults.
//!
//! # Example
//!
//! ```rust
//! use cartera_config::CarteraConfig;
//!
//! let config = CarteraConfig::from_toml_str(
//!     r#"
//!     [money]
//!     scale = 2
//!
//!     [batch]
//!     allow_overdraft = true
//!     "#,
//! )
//! .unwrap();
//!
//! assert!(config.batch.allow_overdraft);
//! assert_eq!(config.storage.path, "./data/cartera.redb");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod model;

pub use error::{ConfigError, ConfigResult};
pub use model::{
    BatchConfig, CarteraConfig, ClassifierSettings, LoggingConfig, MoneyConfig, StorageConfig,
};
