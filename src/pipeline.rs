//! One run of the job: fetch, pick, notify, mark published.
use rand::Rng;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::articles::{self, SelectError};
use crate::config::{Config, EmptyResultPolicy};
use crate::model::Article;
use crate::notion::{DatabaseQuery, PageUpdate};
use crate::teams::{self, MessageSender};

/// Fatal exits of a run. Collaborator errors are carried unchanged.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("fetching articles failed: {0:#}")]
    Fetch(anyhow::Error),
    #[error("no ready articles found (notified: {notified})")]
    NoArticles { notified: bool },
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error("sending notification failed: {0:#}")]
    Notify(anyhow::Error),
    #[error("marking article {id} as published failed: {cause:#}")]
    MarkRead { id: String, cause: anyhow::Error },
}

/// Run the pipeline once and return the article that was announced.
#[instrument(skip_all)]
pub async fn run<R>(
    cfg: &Config,
    db: &dyn DatabaseQuery,
    pages: &dyn PageUpdate,
    sender: &dyn MessageSender,
    rng: &mut R,
) -> Result<Article, RunError>
where
    R: Rng + ?Sized,
{
    info!("Fetching articles...");
    let candidates = articles::fetch_articles(db, &cfg.notion.database_id, cfg.app.debug)
        .await
        .map_err(RunError::Fetch)?;
    info!(count = candidates.len(), "fetched articles");

    if candidates.is_empty() {
        return match cfg.app.on_empty {
            EmptyResultPolicy::Skip => {
                warn!("No available articles found, nothing to send");
                Err(RunError::NoArticles { notified: false })
            }
            EmptyResultPolicy::Notify => {
                warn!("No available articles found, sending apology");
                teams::send_card(sender, &cfg.teams.webhook_url, &teams::unavailable_card())
                    .await
                    .map_err(RunError::Notify)?;
                info!("Apology sent");
                Err(RunError::NoArticles { notified: true })
            }
        };
    }

    info!("Picking random article...");
    let article = articles::pick_random(&candidates, rng)?.clone();
    if cfg.app.debug {
        articles::dump_yaml("picked article", &article);
    }

    info!(id = %article.id, title = %article.title, "Triggering webhook...");
    let card = teams::article_card(&article);
    teams::send_card(sender, &cfg.teams.webhook_url, &card)
        .await
        .map_err(RunError::Notify)?;

    info!(id = %article.id, "Marking article as published...");
    articles::mark_published(
        pages,
        cfg.notion.published_property_id.as_deref(),
        &article,
    )
    .await
    .map_err(|cause| RunError::MarkRead {
        id: article.id.clone(),
        cause,
    })?;

    info!(id = %article.id, "Success!");
    Ok(article)
}
