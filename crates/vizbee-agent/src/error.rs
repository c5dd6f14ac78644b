use thiserror::Error;
use vizbee_core::{ConfigError, Reporter, Severity};
use vizbee_db::DbError;
use vizbee_remote::{RemoteError, ResourceKind};
use vizbee_scheduler::SchedulerError;

/// Failures that stop a command. Per-item push failures are not errors;
/// they are reported where they happen and surface as `false`.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Error initializing connections: {0}")]
    Connection(#[from] DbError),

    #[error("Error initializing connections: dataset `{slug}` uses unknown connection `{connection}`")]
    UnknownConnection { slug: String, connection: String },

    #[error("No scheduling rule found for `{slug}`")]
    MissingSchedule { slug: String },

    #[error("{source} for `{slug}`")]
    InvalidSchedule {
        slug: String,
        #[source]
        source: SchedulerError,
    },

    #[error("Invalid {kind} `{slug}`")]
    UnknownItem { kind: ResourceKind, slug: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl AgentError {
    pub fn severity(&self) -> Severity {
        match self {
            AgentError::Remote(e) => e.severity(),
            _ => Severity::Critical,
        }
    }

    pub fn describe(&self, interactive: bool) -> String {
        match self {
            AgentError::Config(e) => e.describe(interactive),
            AgentError::Remote(e) => e.describe(interactive),
            other => other.to_string(),
        }
    }

    pub fn report(&self, reporter: &dyn Reporter) {
        reporter.emit(self.severity(), &self.describe(reporter.is_interactive()));
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use vizbee_core::MemoryReporter;

    #[test]
    fn messages() {
        assert_eq!(
            AgentError::MissingSchedule {
                slug: "daily-users".into()
            }
            .to_string(),
            "No scheduling rule found for `daily-users`"
        );
        assert_eq!(
            AgentError::UnknownItem {
                kind: ResourceKind::Dashboard,
                slug: "nope".into()
            }
            .to_string(),
            "Invalid dashboard `nope`"
        );
        assert_eq!(
            AgentError::InvalidSchedule {
                slug: "daily-users".into(),
                source: SchedulerError::InvalidSchedule("0 seconds".into()),
            }
            .to_string(),
            "Invalid schedule `0 seconds` for `daily-users`"
        );
    }

    #[test]
    fn config_errors_are_critical() {
        let reporter = MemoryReporter::new(true);
        AgentError::from(ConfigError::NotFound {
            path: "not.found.yml".into(),
        })
        .report(&reporter);
        assert_eq!(
            reporter.entries(),
            vec![(Severity::Critical, "`not.found.yml` not found".to_string())]
        );
    }

    #[test]
    fn remote_errors_keep_their_severity() {
        let err = AgentError::from(RemoteError::UnexpectedStatus { status: 500 });
        assert_eq!(err.severity(), Severity::Warning);
    }
}
