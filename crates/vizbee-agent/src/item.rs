//! Push protocol shared by datasets and dashboards.

use serde_json::Value;
use tracing::{debug, warn};
use vizbee_core::Reporter;
use vizbee_db::DbError;
use vizbee_remote::{RemoteClient, ResourceKind};

/// Something that can be pushed to the API under a slug.
pub trait Item: Send + Sync {
    fn kind(&self) -> ResourceKind;

    fn slug(&self) -> &str;

    /// Body of the upsert request. Building it may run a query.
    fn payload(&self, reporter: &dyn Reporter) -> Result<Value, DbError>;
}

/// Create or update `item` remotely.
///
/// Every outcome is reported; `true` only when the API accepted the payload.
/// When `open` is set, the returned URL is opened in the browser.
pub async fn push<I>(item: &I, remote: &RemoteClient, reporter: &dyn Reporter, open: bool) -> bool
where
    I: Item + ?Sized,
{
    let slug = item.slug();
    let kind = item.kind();

    let Ok(payload) = item.payload(reporter) else {
        debug!(%kind, slug, "payload unavailable; push skipped");
        return false;
    };

    reporter.info(&format!("Pushing: `{slug}`"));

    match remote.upsert(kind, slug, &payload).await {
        Ok(outcome) => {
            reporter.info(&format!(
                "Successfully {} `{slug}`: {}",
                outcome.verb(),
                outcome.url()
            ));
            if open {
                if let Err(e) = open::that(outcome.url()) {
                    warn!(%kind, slug, url = outcome.url(), "cannot open browser: {e}");
                }
            }
            true
        }
        Err(e) => {
            debug!(%kind, slug, "push failed: {e}");
            e.report(reporter);
            false
        }
    }
}
