//! Article fetching, mapping, selection and publishing.
use anyhow::{Context, Result};
use rand::Rng;
use thiserror::Error;
use tracing::{info, instrument};

use crate::model::Article;
use crate::notion::model::{Page, PropertyValue, QueryResponse, RichText};
use crate::notion::{
    build_mark_published_request, build_ready_articles_query, DatabaseQuery, PageUpdate,
    PUBLISHED_PROPERTY,
};

pub const TITLE_PROPERTY: &str = "Name";
pub const EXCERPT_PROPERTY: &str = "Excerpt";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("page {page}: property '{property}' is {found}, expected {expected}")]
    UnexpectedType {
        page: String,
        property: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("cannot pick an article from an empty list")]
    EmptyInput,
}

/// Map a query response into articles, one per page, in response order.
///
/// Missing properties fall back to empty text / unchecked. A property holding
/// a different kind than expected is rejected.
pub fn map_articles(res: &QueryResponse) -> Result<Vec<Article>, DecodeError> {
    res.results.iter().map(map_page).collect()
}

fn map_page(page: &Page) -> Result<Article, DecodeError> {
    let title = match page.properties.get(TITLE_PROPERTY) {
        None => String::new(),
        Some(PropertyValue::Title { title, .. }) => first_plain_text(title),
        Some(other) => return Err(unexpected(page, TITLE_PROPERTY, "title", other)),
    };

    let excerpt = match page.properties.get(EXCERPT_PROPERTY) {
        None => String::new(),
        Some(PropertyValue::RichText { rich_text, .. }) => first_plain_text(rich_text),
        Some(other) => return Err(unexpected(page, EXCERPT_PROPERTY, "rich_text", other)),
    };

    let published = match page.properties.get(PUBLISHED_PROPERTY) {
        None => false,
        Some(PropertyValue::Checkbox { checkbox, .. }) => *checkbox,
        Some(other) => return Err(unexpected(page, PUBLISHED_PROPERTY, "checkbox", other)),
    };

    Ok(Article {
        id: page.id.clone(),
        url: page.url.clone(),
        title,
        excerpt,
        published,
    })
}

fn first_plain_text(runs: &[RichText]) -> String {
    runs.first()
        .map(|run| run.plain_text.clone())
        .unwrap_or_default()
}

fn unexpected(
    page: &Page,
    property: &'static str,
    expected: &'static str,
    found: &PropertyValue,
) -> DecodeError {
    DecodeError::UnexpectedType {
        page: page.id.clone(),
        property,
        expected,
        found: found.kind(),
    }
}

/// Query the database for ready, unpublished articles.
///
/// Query errors are returned as-is. With `debug` set, the raw response body
/// is logged as YAML before decoding.
#[instrument(skip(db, debug))]
pub async fn fetch_articles(
    db: &dyn DatabaseQuery,
    database_id: &str,
    debug: bool,
) -> Result<Vec<Article>> {
    let query = build_ready_articles_query();
    let raw = db.query_database(database_id, &query).await?;

    if debug {
        dump_yaml("query response", &raw);
    }

    let res: QueryResponse =
        serde_json::from_value(raw).context("unexpected Notion query response shape")?;
    Ok(map_articles(&res)?)
}

/// Pick one article uniformly at random.
pub fn pick_random<'a, R>(articles: &'a [Article], rng: &mut R) -> Result<&'a Article, SelectError>
where
    R: Rng + ?Sized,
{
    if articles.is_empty() {
        return Err(SelectError::EmptyInput);
    }
    let index = rng.gen_range(0..articles.len());
    Ok(&articles[index])
}

/// Set the article's Published checkbox. Client errors are returned as-is.
pub async fn mark_published(
    pages: &dyn PageUpdate,
    published_property_id: Option<&str>,
    article: &Article,
) -> Result<()> {
    let body = build_mark_published_request(published_property_id);
    pages.update_page(&article.id, &body).await
}

pub(crate) fn dump_yaml<T: serde::Serialize>(label: &str, value: &T) {
    match render_yaml(value) {
        Ok(yaml) => info!("{}:\n{}", label, yaml),
        Err(err) => info!(%err, "{} could not be rendered", label),
    }
}

fn render_yaml<T: serde::Serialize>(value: &T) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(value)
}
