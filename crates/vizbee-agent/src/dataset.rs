use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;
use vizbee_core::{DatasetConfig, Reporter};
use vizbee_db::{Database, DbError, QueryResult};
use vizbee_remote::ResourceKind;
use vizbee_scheduler::{Job, Schedule, SchedulerEngine};

use crate::error::{AgentError, Result};
use crate::item::Item;

/// A named SQL query bound to one database connection.
#[derive(Debug, Clone)]
pub struct Dataset {
    slug: String,
    query: String,
    name: Option<String>,
    graph: Option<Value>,
    schedule: Option<String>,
    connection: Arc<Database>,
}

impl Dataset {
    /// `config.schedule` is expected to already carry the top-level default.
    pub fn new(config: DatasetConfig, connection: Arc<Database>) -> Self {
        Self {
            slug: config.slug,
            query: config.query,
            name: config.name,
            graph: config.graph,
            schedule: config.schedule,
            connection,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replace the query for the rest of this process. The config file is
    /// left untouched.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Run the query. Database errors are reported as critical and returned.
    pub fn execute(&self, reporter: &dyn Reporter) -> std::result::Result<QueryResult, DbError> {
        reporter.info(&format!("Executing: `{}`", self.slug));
        self.connection
            .query(&self.query)
            .inspect_err(|e| reporter.critical(&e.to_string()))
    }

    /// Register an interval job pushing this dataset.
    pub fn schedule_job(&self, scheduler: &mut SchedulerEngine) -> Result<Job> {
        let text = self
            .schedule
            .as_deref()
            .ok_or_else(|| AgentError::MissingSchedule {
                slug: self.slug.clone(),
            })?;
        let invalid = |source| AgentError::InvalidSchedule {
            slug: self.slug.clone(),
            source,
        };
        let schedule: Schedule = text.parse().map_err(invalid)?;

        let job = scheduler
            .add_job(&format!("push {}", self.slug), schedule, &self.slug)
            .map_err(invalid)?;
        info!(slug = %self.slug, job_id = %job.id, %schedule, "dataset scheduled");
        Ok(job)
    }
}

impl Item for Dataset {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Dataset
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn payload(&self, reporter: &dyn Reporter) -> std::result::Result<Value, DbError> {
        let data = self.execute(reporter)?;
        Ok(json!({
            "name": self.name,
            "graph": self.graph,
            "query": self.query,
            "data": data,
        }))
    }
}
