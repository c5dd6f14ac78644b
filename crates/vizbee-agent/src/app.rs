use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, warn};
use vizbee_core::{AgentSettings, Config, Reporter};
use vizbee_db::ConnectionRegistry;
use vizbee_remote::{Credentials, RemoteClient, ResourceKind};
use vizbee_scheduler::{Job, JobHandler, SchedulerEngine};

use crate::dashboard::Dashboard;
use crate::dataset::Dataset;
use crate::error::{AgentError, Result};
use crate::item::{self, Item};

/// Loaded configuration bound to live connections and the API client.
pub struct Agent {
    remote: RemoteClient,
    reporter: Arc<dyn Reporter>,
    datasets: Vec<Dataset>,
    dashboards: Vec<Dashboard>,
}

impl Agent {
    /// Load the config file named in `settings` and connect everything.
    pub fn bootstrap(settings: &AgentSettings, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let config = Config::load(&settings.config_path)?;
        let remote = RemoteClient::new(
            settings.api_url.as_str(),
            Credentials {
                client_id: settings.client_id.clone(),
                client_secret: settings.client_secret.clone(),
            },
        )?;
        Self::from_config(config, remote, reporter)
    }

    /// Open every connection and bind each dataset to its own. Fails on the
    /// first connection that cannot be opened or the first dataset naming an
    /// unknown connection.
    pub fn from_config(
        config: Config,
        remote: RemoteClient,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self> {
        let registry = ConnectionRegistry::open(&config.connections)?;

        let datasets = config
            .datasets
            .into_iter()
            .map(|d| -> Result<Dataset> {
                let db = registry
                    .get(&d.connection)
                    .ok_or_else(|| AgentError::UnknownConnection {
                        slug: d.slug.clone(),
                        connection: d.connection.clone(),
                    })?;
                Ok(Dataset::new(d, db))
            })
            .collect::<Result<Vec<_>>>()?;

        let dashboards: Vec<Dashboard> = config.dashboards.into_iter().map(Dashboard::new).collect();

        info!(
            connections = registry.len(),
            datasets = datasets.len(),
            dashboards = dashboards.len(),
            "agent ready"
        );

        Ok(Self {
            remote,
            reporter,
            datasets,
            dashboards,
        })
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    pub fn remote(&self) -> &RemoteClient {
        &self.remote
    }

    pub fn dataset(&self, slug: &str) -> Result<&Dataset> {
        self.datasets
            .iter()
            .find(|d| d.slug() == slug)
            .ok_or_else(|| unknown(ResourceKind::Dataset, slug))
    }

    pub fn dataset_mut(&mut self, slug: &str) -> Result<&mut Dataset> {
        self.datasets
            .iter_mut()
            .find(|d| d.slug() == slug)
            .ok_or_else(|| unknown(ResourceKind::Dataset, slug))
    }

    pub fn dashboard(&self, slug: &str) -> Result<&Dashboard> {
        self.dashboards
            .iter()
            .find(|d| d.slug() == slug)
            .ok_or_else(|| unknown(ResourceKind::Dashboard, slug))
    }

    /// Look up any item by kind and slug.
    pub fn item(&self, kind: ResourceKind, slug: &str) -> Result<&dyn Item> {
        let item: &dyn Item = match kind {
            ResourceKind::Dataset => self.dataset(slug)?,
            ResourceKind::Dashboard => self.dashboard(slug)?,
        };
        Ok(item)
    }

    /// Local slugs of `kind`, in config order.
    pub fn local_slugs(&self, kind: ResourceKind) -> Vec<String> {
        match kind {
            ResourceKind::Dataset => self.datasets.iter().map(|d| d.slug().to_string()).collect(),
            ResourceKind::Dashboard => self
                .dashboards
                .iter()
                .map(|d| d.slug().to_string())
                .collect(),
        }
    }

    /// Remote slugs of `kind`, in the order the API lists them.
    pub async fn remote_slugs(&self, kind: ResourceKind) -> Result<Vec<String>> {
        Ok(self.remote.list(kind).await?)
    }

    /// Push one item. Unknown slugs are errors; push failures are reported
    /// and come back as `Ok(false)`.
    pub async fn push(&self, kind: ResourceKind, slug: &str, open: bool) -> Result<bool> {
        let item = self.item(kind, slug)?;
        Ok(item::push(item, &self.remote, self.reporter(), open).await)
    }

    /// Push every dataset, then every dashboard, stopping at the first
    /// failure.
    pub async fn sync(&self) -> bool {
        let items = self
            .datasets
            .iter()
            .map(|d| d as &dyn Item)
            .chain(self.dashboards.iter().map(|d| d as &dyn Item));

        for item in items {
            if !item::push(item, &self.remote, self.reporter(), false).await {
                self.reporter.critical("Sync failed");
                return false;
            }
        }
        true
    }

    /// One scheduler job per dataset. Fails on the first dataset without a
    /// valid schedule.
    pub fn schedule_jobs(&self) -> Result<SchedulerEngine> {
        let mut engine = SchedulerEngine::new();
        for dataset in &self.datasets {
            dataset.schedule_job(&mut engine)?;
        }
        Ok(engine)
    }

    /// Schedule every dataset, optionally sync once, then process jobs until
    /// `shutdown` flips to `true`.
    ///
    /// Returns `Ok(false)` when the initial sync failed; the failure has
    /// already been reported.
    pub async fn start(&self, initial_sync: bool, shutdown: watch::Receiver<bool>) -> Result<bool> {
        let engine = self.schedule_jobs()?;

        if initial_sync {
            self.reporter.info("Triggering initial sync");
            if !self.sync().await {
                return Ok(false);
            }
        }

        self.reporter.info("Start processing jobs");
        engine.run(self, shutdown).await;
        Ok(true)
    }
}

fn unknown(kind: ResourceKind, slug: &str) -> AgentError {
    AgentError::UnknownItem {
        kind,
        slug: slug.to_string(),
    }
}

/// Scheduled jobs carry the dataset slug as their action.
#[async_trait]
impl JobHandler for Agent {
    async fn run(&self, job: &Job) -> bool {
        let Ok(dataset) = self.dataset(&job.action) else {
            warn!(job_id = %job.id, slug = %job.action, "job refers to an unknown dataset");
            return false;
        };
        item::push(dataset, &self.remote, self.reporter(), false).await
    }
}
