use std::fmt;

use serde::{Deserialize, Serialize};

/// The two kinds of resource the agent manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Dataset,
    Dashboard,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Dataset => "dataset",
            ResourceKind::Dashboard => "dashboard",
        }
    }

    /// Path segment of the collection on the API.
    pub fn url_prefix(&self) -> &'static str {
        match self {
            ResourceKind::Dataset => "datasets",
            ResourceKind::Dashboard => "dashboards",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful upsert. The API answers 201 for new resources, 200 otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    Created { url: String },
    Updated { url: String },
}

impl Upsert {
    pub fn verb(&self) -> &'static str {
        match self {
            Upsert::Created { .. } => "created",
            Upsert::Updated { .. } => "updated",
        }
    }

    /// Where the resource can be viewed.
    pub fn url(&self) -> &str {
        match self {
            Upsert::Created { url } | Upsert::Updated { url } => url,
        }
    }
}

/// One entry of a listing; fields other than `slug` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteItem {
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpsertResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidationResponse {
    pub errors: serde_json::Value,
}
