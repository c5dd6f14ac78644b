//! `vizbee-remote`: HTTP client for the vizbee API.
//!
//! Three calls per resource kind: upsert (`PUT /{kind}s/{slug}`), list
//! (`GET /{kind}s/`) and delete (`DELETE /{kind}s/{slug}`). Responses are
//! classified into [`Upsert`] outcomes or typed [`RemoteError`]s; nothing here
//! prints or exits, callers report through their `Reporter`.

pub mod client;
pub mod error;
pub mod types;

pub use client::{Credentials, RemoteClient};
pub use error::{RemoteError, Result};
pub use types::{RemoteItem, ResourceKind, Upsert};
