//! Removal of remote resources that no longer exist locally.

use std::collections::BTreeSet;

use tracing::{debug, info};
use vizbee_remote::ResourceKind;

use crate::app::Agent;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneOutcome {
    /// No orphans; nothing was asked or deleted.
    UpToDate,
    /// The confirmation was declined; nothing was deleted.
    Declined,
    Pruned {
        deleted: Vec<String>,
        failed: Vec<String>,
    },
}

impl PruneOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            PruneOutcome::UpToDate | PruneOutcome::Declined => true,
            PruneOutcome::Pruned { failed, .. } => failed.is_empty(),
        }
    }
}

/// Remote slugs without a local counterpart, sorted and deduplicated.
pub fn orphans<S: AsRef<str>>(remote: &[String], local: &[S]) -> Vec<String> {
    let local: BTreeSet<&str> = local.iter().map(|s| s.as_ref()).collect();
    remote
        .iter()
        .map(String::as_str)
        .filter(|slug| !local.contains(slug))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

impl Agent {
    /// Remote resources of `kind` that are not in the config.
    pub async fn orphans(&self, kind: ResourceKind) -> Result<Vec<String>> {
        let remote = self.remote_slugs(kind).await?;
        Ok(orphans(&remote, &self.local_slugs(kind)))
    }

    /// Delete every orphan of `kind`.
    ///
    /// Unless `force` is set, `confirm` sees the orphan list first and can
    /// cancel. Deletions run one at a time in slug order; a failed deletion
    /// is reported and the rest still run.
    pub async fn prune<F>(&self, kind: ResourceKind, force: bool, confirm: F) -> Result<PruneOutcome>
    where
        F: FnOnce(&[String]) -> bool,
    {
        let orphans = self.orphans(kind).await?;
        let reporter = self.reporter();

        if orphans.is_empty() {
            reporter.info("Remote is up to date");
            return Ok(PruneOutcome::UpToDate);
        }

        if !force && !confirm(&orphans) {
            info!(%kind, count = orphans.len(), "prune declined");
            return Ok(PruneOutcome::Declined);
        }

        let mut deleted = Vec::with_capacity(orphans.len());
        let mut failed = Vec::new();
        for slug in orphans {
            reporter.info(&format!("Deleting {kind} `{slug}`"));
            match self.remote().delete(kind, &slug).await {
                Ok(()) => deleted.push(slug),
                Err(e) => {
                    debug!(%kind, slug = %slug, "delete failed: {e}");
                    e.report(reporter);
                    failed.push(slug);
                }
            }
        }

        Ok(PruneOutcome::Pruned { deleted, failed })
    }
}
