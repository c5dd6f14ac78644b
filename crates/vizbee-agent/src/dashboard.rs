use serde_json::{json, Value};
use vizbee_core::{DashboardConfig, Reporter};
use vizbee_db::DbError;
use vizbee_remote::ResourceKind;

use crate::item::Item;

/// A named group of dataset slugs. The slugs are sent as-is; the API decides
/// whether they exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    slug: String,
    name: Option<String>,
    datasets: Vec<String>,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            slug: config.slug,
            name: config.name,
            datasets: config.datasets,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
}

impl Item for Dashboard {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Dashboard
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn payload(&self, _reporter: &dyn Reporter) -> Result<Value, DbError> {
        Ok(json!({
            "name": self.name,
            "datasets": self.datasets,
        }))
    }
}
