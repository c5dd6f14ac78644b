//! `vizbee-agent`: datasets, dashboards and the agent that pushes them.
//!
//! An [`Agent`] is built once from a validated config: it opens every
//! connection, binds each dataset to its connection and holds the API client.
//! From there it can push single items, run a full [`Agent::sync`], prune
//! remote orphans or hand every dataset to the scheduler with
//! [`Agent::start`].
//!
//! All user-facing output goes through the injected `Reporter`.

pub mod app;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod item;
pub mod reconcile;

pub use app::Agent;
pub use dashboard::Dashboard;
pub use dataset::Dataset;
pub use error::{AgentError, Result};
pub use item::Item;
pub use reconcile::PruneOutcome;
