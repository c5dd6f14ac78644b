//! `vizbee-db`: named database connections and tabular query results.
//!
//! Connections are opened once from the `connections` section of the config
//! and shared by every dataset that references them. SQLite is the bundled
//! driver; URLs follow the `sqlite:///relative.db` / `sqlite:////abs.db`
//! convention, `sqlite://` opens an in-memory database.

pub mod error;
pub mod registry;
pub mod result;

pub use error::{DbError, Result};
pub use registry::{ConnectionRegistry, Database};
pub use result::QueryResult;
