use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_hidden: bool,
}

/// Article fields supplied at ingestion time; id and created_at are
/// assigned by the database.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub is_hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// One subscription row: either a category subscription or a keyword
/// subscription, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub id: i64,
    pub user_id: i64,
    pub category: Option<String>,
    pub keyword: Option<String>,
    pub enabled: bool,
}

impl NotificationConfig {
    pub fn is_keyword(&self) -> bool {
        self.category.is_none() && self.keyword.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Raw headline record handed over by the external news source, decided
/// once at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub title: String,
    pub content: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
}
