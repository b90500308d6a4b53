use std::process::ExitCode;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::error;
use tracing_subscriber::EnvFilter;

use article_notifier::config;
use article_notifier::notion::NotionClient;
use article_notifier::pipeline;
use article_notifier::teams::TeamsClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    exit_code(run().await)
}

/// Log a fatal error once and turn the outcome into the process status.
fn exit_code(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    tracing::info!("Loading .env...");
    let cfg = config::load(None).context("Error loading .env file")?;

    let notion = NotionClient::from_config(&cfg)?;
    let teams = TeamsClient::new()?;
    let mut rng = StdRng::from_entropy();

    pipeline::run(&cfg, &notion, &notion, &teams, &mut rng).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use article_notifier::pipeline::RunError;

    #[test]
    fn success_exits_zero() {
        assert_eq!(exit_code(Ok(())), ExitCode::SUCCESS);
    }

    #[test]
    fn run_errors_exit_non_zero() {
        let err = RunError::NoArticles { notified: false };
        assert_eq!(exit_code(Err(err.into())), ExitCode::FAILURE);
    }
}
