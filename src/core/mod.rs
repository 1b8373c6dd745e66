//! Core application plumbing.
//!
//! Configuration loading and the builders that turn it into the storage,
//! backend and exporter the wizard runs against.

mod config;

pub use config::{
    BackendConfig, BackendKind, Config, ExportConfig, StorageConfig, ENV_BACKEND_URL, ENV_DATA_DIR,
};
