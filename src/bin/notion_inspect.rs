use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use article_notifier::config;
use article_notifier::notion::NotionClient;

/// Print the property names, ids and types of a Notion database.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the env file
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Database ID to inspect (defaults to NOTION_DB_ID)
    #[arg(long)]
    db_id: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.env_file))
        .with_context(|| format!("failed to load {}", args.env_file.display()))?;
    let client = NotionClient::from_config(&cfg)?;
    let db_id = args.db_id.unwrap_or_else(|| cfg.notion.database_id.clone());

    let db = client.retrieve_database(&db_id).await?;
    let title: String = db.title.iter().map(|t| t.plain_text.as_str()).collect();
    println!("Database ID: {}", db.id);
    println!("Title: {}", title);
    println!("Properties:");
    let mut props: Vec<_> = db.properties.into_iter().collect();
    props.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, prop) in props {
        println!("  {} -> {{ id: {}, type: {} }}", name, prop.id, prop.typ);
    }
    Ok(())
}
