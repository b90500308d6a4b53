use serde::Serialize;

/// One candidate article pulled from the Notion database.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub published: bool,
}
