use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Deserialize, Debug)]
pub struct DatabaseProperty {
    pub id: String,
    #[serde(rename = "type")]
    pub typ: String,
}

#[derive(Deserialize, Debug)]
pub struct RetrieveDatabaseResp {
    pub id: String,
    #[serde(default)]
    pub title: Vec<RichText>,
    pub properties: HashMap<String, DatabaseProperty>,
}

/// Response of `POST v1/databases/{id}/query`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_edited_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

/// A page property, tagged by Notion's `type` field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default)]
        id: String,
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        id: String,
        rich_text: Vec<RichText>,
    },
    Checkbox {
        #[serde(default)]
        id: String,
        checkbox: bool,
    },
    #[serde(other)]
    Unsupported,
}

impl PropertyValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Title { .. } => "title",
            PropertyValue::RichText { .. } => "rich_text",
            PropertyValue::Checkbox { .. } => "checkbox",
            PropertyValue::Unsupported => "unsupported",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    pub plain_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl RichText {
    pub fn plain(text: &str) -> Self {
        Self {
            plain_text: text.to_string(),
            href: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_query_response() {
        let raw = json!({
            "object": "list",
            "results": [{
                "object": "page",
                "id": "page-1",
                "url": "https://www.notion.so/page-1",
                "created_time": "2023-01-02T03:04:05.000Z",
                "last_edited_time": "2023-01-03T03:04:05.000Z",
                "properties": {
                    "Name": {
                        "id": "title",
                        "type": "title",
                        "title": [{ "type": "text", "plain_text": "Hello", "href": null }]
                    },
                    "Excerpt": { "id": "ex", "type": "rich_text", "rich_text": [] },
                    "Published": { "id": "pub", "type": "checkbox", "checkbox": false },
                    "Updated": { "id": "upd", "type": "last_edited_time", "last_edited_time": "2023-01-03T03:04:05.000Z" }
                }
            }],
            "has_more": false,
            "next_cursor": null
        });

        let resp: QueryResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(resp.results.len(), 1);
        let page = &resp.results[0];
        assert_eq!(page.id, "page-1");
        assert_eq!(
            page.properties["Name"],
            PropertyValue::Title {
                id: "title".into(),
                title: vec![RichText::plain("Hello")],
            }
        );
        assert_eq!(page.properties["Excerpt"].kind(), "rich_text");
        assert_eq!(page.properties["Updated"], PropertyValue::Unsupported);
    }
}
