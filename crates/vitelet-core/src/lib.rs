#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod dev;
pub mod error;
pub mod version;

pub use config::{load_config_file, ConfigFile, DevConfig};
pub use dev::{DevServer, ModuleRequest, ServedModule};
pub use error::{DevError, Error};
pub use version::VERSION;
