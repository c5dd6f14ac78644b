//! `vizbee-core`: configuration, settings and user-facing reporting shared by
//! every other vizbee crate.
//!
//! | Module     | Responsibility                                              |
//! |------------|-------------------------------------------------------------|
//! | `config`   | Load `.vizbee.yml`: env substitution, parsing, typed tree   |
//! | `schema`   | Structural validation with a field → violations map         |
//! | `settings` | API url / credentials layered from env and CLI via figment  |
//! | `report`   | `Reporter` sink: console, daemon log, in-memory capture     |
//! | `render`   | YAML-style text block for structured error payloads         |

pub mod config;
pub mod error;
pub mod render;
pub mod report;
pub mod schema;
pub mod settings;

pub use config::{Config, ConnectionConfig, DashboardConfig, DatasetConfig, DEFAULT_CONNECTION};
pub use error::{ConfigError, Result};
pub use report::{ConsoleReporter, LogReporter, MemoryReporter, Reporter, Severity};
pub use schema::{SchemaErrors, Violation};
pub use settings::{AgentSettings, SettingsOverrides};
