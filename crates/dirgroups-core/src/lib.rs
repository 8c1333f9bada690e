//! dirgroups Core Library
//!
//! Error taxonomy and configuration shared by the dirgroups crates.

pub mod config;
pub mod error;

pub use config::{DirgroupsConfig, LdapConfig, LdapServerType, LoggingConfig, MEMBER_UID};
pub use error::{Error, ErrorKind, Result};

/// dirgroups version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service identifier used when the caller does not supply one
pub const DEFAULT_SERVICE_ID: &str = "dirgroups";
