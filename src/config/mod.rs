//! Application Configuration
//!
//! Run-time settings loaded from TOML, plus credentials taken from the
//! environment.
//!
//! ## Loading Order
//!
//! 1. `PHASETRACK_CONFIG` environment variable (path to TOML file)
//! 2. `phasetrack.toml` in the current working directory
//! 3. Built-in defaults
//!
//! A path given on the command line is loaded strictly: any error is fatal.
//!
//! ## Usage
//!
//! The loaded [`AppConfig`] is passed by value or reference into the source,
//! sink and runner constructors. There is no process-wide config handle.
//!
//! ```ignore
//! let config = AppConfig::load();
//! let segmenter = PhaseSegmenter::new(config.segmentation.confirmation_window);
//! ```

mod app_config;
mod credentials;
pub mod defaults;
pub mod validation;

pub use app_config::*;
pub use credentials::{CredentialError, Credentials, OpenSkyLogin};
