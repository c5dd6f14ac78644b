use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use vizbee_agent::{Agent, AgentError};
use vizbee_core::{AgentSettings, ConsoleReporter, LogReporter, Reporter, SettingsOverrides};
use vizbee_remote::ResourceKind;

mod editor;
mod prompt;

/// Push SQL datasets and dashboards to vizbee
#[derive(Parser, Debug)]
#[command(name = "vizbee", version, long_about = None)]
struct Cli {
    /// The YAML configuration file path [default: .vizbee.yml]
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// The application id
    #[arg(long, global = true)]
    client_id: Option<String>,

    /// The application secret
    #[arg(long, global = true)]
    client_secret: Option<String>,

    /// The API url
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log through tracing instead of printing to the terminal
    #[arg(long, global = true)]
    daemon: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Push all datasets and dashboards
    Sync,
    /// Start the scheduler
    Start {
        /// Skip the initial sync
        #[arg(long)]
        no_sync: bool,
    },
    /// Manage datasets
    #[command(subcommand)]
    Dataset(DatasetCommand),
    /// Manage dashboards
    #[command(subcommand)]
    Dashboard(DashboardCommand),
}

#[derive(Subcommand, Debug)]
enum DatasetCommand {
    /// Execute given dataset query
    Execute {
        slug: String,
        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit given dataset query, then execute it
    Edit { slug: String },
    /// List available datasets
    List {
        #[arg(long)]
        remote: bool,
    },
    /// Push given dataset
    Push {
        slug: String,
        /// Open the pushed dataset in the browser
        #[arg(long)]
        open: bool,
    },
    /// Delete remote orphan datasets
    Prune {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DashboardCommand {
    /// List available dashboards
    List {
        #[arg(long)]
        remote: bool,
    },
    /// Push given dashboard
    Push {
        slug: String,
        #[arg(long)]
        open: bool,
    },
    /// Delete remote orphan dashboards
    Prune {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.daemon { "vizbee=info" } else { "vizbee=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let reporter: Arc<dyn Reporter> = if cli.daemon {
        Arc::new(LogReporter)
    } else {
        Arc::new(ConsoleReporter)
    };

    match run(cli, reporter.clone()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            match e.downcast_ref::<AgentError>() {
                Some(agent_error) => agent_error.report(reporter.as_ref()),
                None => reporter.critical(&format!("{e:#}")),
            }
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` means the failure was already reported.
async fn run(cli: Cli, reporter: Arc<dyn Reporter>) -> anyhow::Result<bool> {
    let overrides = SettingsOverrides {
        config_path: cli.config,
        api_url: cli.api_url,
        client_id: cli.client_id,
        client_secret: cli.client_secret,
    };
    let settings = AgentSettings::load(&overrides).map_err(AgentError::from)?;
    let mut agent = Agent::bootstrap(&settings, reporter.clone())?;

    match cli.command {
        Command::Sync => Ok(agent.sync().await),
        Command::Start { no_sync } => start(&agent, !no_sync).await,
        Command::Dataset(cmd) => match cmd {
            DatasetCommand::Execute { slug, json } => {
                let dataset = agent.dataset(&slug)?;
                let Ok(result) = dataset.execute(reporter.as_ref()) else {
                    return Ok(false);
                };
                if json {
                    println!("{}", result.to_json()?);
                } else {
                    println!("{result}");
                }
                Ok(true)
            }
            DatasetCommand::Edit { slug } => {
                let dataset = agent.dataset_mut(&slug)?;
                let query = editor::edit(dataset.query(), "sql")?;
                dataset.set_query(query);
                let Ok(result) = dataset.execute(reporter.as_ref()) else {
                    return Ok(false);
                };
                println!("{result}");
                Ok(true)
            }
            DatasetCommand::List { remote } => list(&agent, ResourceKind::Dataset, remote).await,
            DatasetCommand::Push { slug, open } => {
                Ok(agent.push(ResourceKind::Dataset, &slug, open).await?)
            }
            DatasetCommand::Prune { force } => prune(&agent, ResourceKind::Dataset, force).await,
        },
        Command::Dashboard(cmd) => match cmd {
            DashboardCommand::List { remote } => {
                list(&agent, ResourceKind::Dashboard, remote).await
            }
            DashboardCommand::Push { slug, open } => {
                Ok(agent.push(ResourceKind::Dashboard, &slug, open).await?)
            }
            DashboardCommand::Prune { force } => {
                prune(&agent, ResourceKind::Dashboard, force).await
            }
        },
    }
}

async fn start(agent: &Agent, initial_sync: bool) -> anyhow::Result<bool> {
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received; stopping after the current job");
            let _ = shutdown_tx.send(true);
        }
    });

    Ok(agent.start(initial_sync, shutdown_rx).await?)
}

async fn list(agent: &Agent, kind: ResourceKind, remote: bool) -> anyhow::Result<bool> {
    let slugs = if remote {
        agent.remote_slugs(kind).await?
    } else {
        agent.local_slugs(kind)
    };
    for slug in slugs {
        println!("{slug}");
    }
    Ok(true)
}

async fn prune(agent: &Agent, kind: ResourceKind, force: bool) -> anyhow::Result<bool> {
    let outcome = agent.prune(kind, force, prompt::confirm_deletion).await?;
    Ok(outcome.is_success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vizbee",
            "dataset",
            "push",
            "daily-users",
            "--open",
            "-c",
            "conf.yml",
            "--daemon",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("conf.yml"));
        assert!(cli.daemon);
        assert!(matches!(
            cli.command,
            Command::Dataset(DatasetCommand::Push { ref slug, open: true }) if slug == "daily-users"
        ));
    }

    #[test]
    fn start_defaults_to_initial_sync() {
        let cli = Cli::try_parse_from(["vizbee", "start"]).unwrap();
        assert!(matches!(cli.command, Command::Start { no_sync: false }));
        let cli = Cli::try_parse_from(["vizbee", "start", "--no-sync"]).unwrap();
        assert!(matches!(cli.command, Command::Start { no_sync: true }));
    }

    #[test]
    fn dashboard_has_no_execute() {
        assert!(Cli::try_parse_from(["vizbee", "dashboard", "execute", "x"]).is_err());
    }
}
