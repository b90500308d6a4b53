//! Pick one ready article from a Notion database, announce it on a Teams
//! webhook and mark it as published.

pub mod articles;
pub mod config;
pub mod model;
pub mod notion;
pub mod pipeline;
pub mod teams;
