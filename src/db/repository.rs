use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{Article, Category, NewArticle, Notification, NotificationConfig, User};

use super::schema::SCHEMA;

/// Placeholder keyword row inserted when a user's configs are first
/// provisioned, so the keyword toggle always has a row to show.
const KEYWORD_PLACEHOLDER: &str = "*";

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // User operations

    pub async fn create_user(&self, email: String) -> Result<User> {
        let user = self
            .conn
            .call(move |conn| {
                conn.execute("INSERT INTO users (email) VALUES (?1)", params![email])?;
                let id = conn.last_insert_rowid();
                let user = conn.query_row(
                    "SELECT id, email, created_at FROM users WHERE id = ?1",
                    params![id],
                    |row| Ok(user_from_row(row)),
                )?;
                Ok(user)
            })
            .await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .call(move |conn| {
                let user = conn
                    .query_row(
                        "SELECT id, email, created_at FROM users WHERE id = ?1",
                        params![id],
                        |row| Ok(user_from_row(row)),
                    )
                    .optional()?;
                Ok(user)
            })
            .await?;
        Ok(user)
    }

    // Article operations

    pub async fn create_article(&self, article: NewArticle) -> Result<Article> {
        if article.title.trim().is_empty() {
            return Err(AppError::Article("article title must not be empty".into()));
        }

        let category = if article.category.trim().is_empty() {
            crate::classifier::DEFAULT_CATEGORY.to_string()
        } else {
            article.category
        };

        let created = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO articles (title, content, url, category) VALUES (?1, ?2, ?3, ?4)",
                    params![article.title, article.content, article.url, category],
                )?;
                let id = conn.last_insert_rowid();
                let created = conn.query_row(
                    &format!("SELECT {ARTICLE_COLUMNS} FROM articles a WHERE a.id = ?1"),
                    params![id],
                    |row| Ok(article_from_row(row)),
                )?;
                Ok(created)
            })
            .await?;
        Ok(created)
    }

    /// Fetch by id without visibility filtering (admin/detail path).
    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let article = self
            .conn
            .call(move |conn| {
                let article = conn
                    .query_row(
                        &format!("SELECT {ARTICLE_COLUMNS} FROM articles a WHERE a.id = ?1"),
                        params![id],
                        |row| Ok(article_from_row(row)),
                    )
                    .optional()?;
                Ok(article)
            })
            .await?;
        Ok(article)
    }

    /// Paginated listing of visible articles: not hidden, category not
    /// hidden, and no blacklisted keyword in title or content.
    pub async fn list_visible(&self, skip: u32, limit: u32) -> Result<Vec<Article>> {
        let articles = self
            .conn
            .call(move |conn| {
                let blacklist = blacklisted_keywords(conn)?;
                let mut sql = format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles a \
                     JOIN categories c ON a.category = c.name \
                     WHERE a.is_hidden = 0 AND c.is_hidden = 0"
                );
                let mut args: Vec<String> = Vec::new();
                push_blacklist_filters(&mut sql, &mut args, &blacklist);
                sql.push_str(&format!(" LIMIT {limit} OFFSET {skip}"));

                let mut stmt = conn.prepare(&sql)?;
                let articles = stmt
                    .query_map(params_from_iter(args), |row| Ok(article_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    /// Visible articles whose title or content contains the query,
    /// case-insensitively, newest first.
    pub async fn search(&self, query: &str) -> Result<Vec<Article>> {
        let query = query.to_lowercase();
        let articles = self
            .conn
            .call(move |conn| {
                let blacklist = blacklisted_keywords(conn)?;
                let mut sql = format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles a \
                     JOIN categories c ON a.category = c.name \
                     WHERE a.is_hidden = 0 AND c.is_hidden = 0 \
                     AND (instr(lower(a.title), ?) > 0 OR instr(lower(a.content), ?) > 0)"
                );
                let mut args: Vec<String> = vec![query.clone(), query];
                push_blacklist_filters(&mut sql, &mut args, &blacklist);
                sql.push_str(" ORDER BY a.created_at DESC, a.id DESC");

                let mut stmt = conn.prepare(&sql)?;
                let articles = stmt
                    .query_map(params_from_iter(args), |row| Ok(article_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    /// Visible articles created on the given date, optionally restricted
    /// to one category, newest first.
    pub async fn get_by_date(
        &self,
        date: NaiveDate,
        category: Option<String>,
    ) -> Result<Vec<Article>> {
        self.get_by_range(date, date, category).await
    }

    /// Visible articles created within [start, end] (inclusive days),
    /// optionally restricted to one category, newest first.
    pub async fn get_by_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        category: Option<String>,
    ) -> Result<Vec<Article>> {
        let from = start.format("%Y-%m-%d 00:00:00").to_string();
        let to = (end + Duration::days(1))
            .format("%Y-%m-%d 00:00:00")
            .to_string();

        let articles = self
            .conn
            .call(move |conn| {
                let blacklist = blacklisted_keywords(conn)?;
                let mut sql = format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles a \
                     JOIN categories c ON a.category = c.name \
                     WHERE a.is_hidden = 0 AND c.is_hidden = 0 \
                     AND a.created_at >= ? AND a.created_at < ?"
                );
                let mut args: Vec<String> = vec![from, to];
                if let Some(cat) = category {
                    sql.push_str(" AND a.category = ?");
                    args.push(cat);
                }
                push_blacklist_filters(&mut sql, &mut args, &blacklist);
                sql.push_str(" ORDER BY a.created_at DESC, a.id DESC");

                let mut stmt = conn.prepare(&sql)?;
                let articles = stmt
                    .query_map(params_from_iter(args), |row| Ok(article_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    /// Idempotent: hiding a hidden or missing article is a no-op.
    pub async fn hide_article(&self, id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE articles SET is_hidden = 1 WHERE id = ?1",
                    params![id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Blacklist operations

    pub async fn add_blacklisted_keyword(&self, keyword: &str) -> Result<()> {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return Err(AppError::Validation(
                "blacklist keyword must not be empty".into(),
            ));
        }
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO blacklisted_keywords (keyword) VALUES (?1)",
                    params![keyword],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn remove_blacklisted_keyword(&self, keyword: &str) -> Result<()> {
        let keyword = keyword.trim().to_lowercase();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM blacklisted_keywords WHERE keyword = ?1",
                    params![keyword],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_blacklisted_keywords(&self) -> Result<Vec<String>> {
        let keywords = self
            .conn
            .call(|conn| {
                let keywords = blacklisted_keywords(conn)?;
                Ok(keywords)
            })
            .await?;
        Ok(keywords)
    }

    // Category operations

    pub async fn create_category_if_not_exists(&self, name: &str) -> Result<Category> {
        let name = name.to_string();
        let category = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
                    params![name],
                )?;
                let category = conn.query_row(
                    "SELECT id, name, is_hidden FROM categories WHERE name = ?1",
                    params![name],
                    |row| Ok(category_from_row(row)),
                )?;
                Ok(category)
            })
            .await?;
        Ok(category)
    }

    /// Explicit admin creation; duplicates are rejected rather than ignored.
    pub async fn create_category(&self, name: &str) -> Result<Category> {
        let owned = name.to_string();
        let result = self
            .conn
            .call(move |conn| {
                conn.execute("INSERT INTO categories (name) VALUES (?1)", params![owned])?;
                let id = conn.last_insert_rowid();
                let category = conn.query_row(
                    "SELECT id, name, is_hidden FROM categories WHERE id = ?1",
                    params![id],
                    |row| Ok(category_from_row(row)),
                )?;
                Ok(category)
            })
            .await;

        match result {
            Ok(category) => Ok(category),
            Err(e) if is_unique_violation(&e) => Err(AppError::Validation(format!(
                "category '{name}' already exists"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn hide_category(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE categories SET is_hidden = 1 WHERE name = ?1",
                    params![name],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_all_categories(&self) -> Result<Vec<Category>> {
        let categories = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT id, name, is_hidden FROM categories ORDER BY name")?;
                let categories = stmt
                    .query_map([], |row| Ok(category_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(categories)
            })
            .await?;
        Ok(categories)
    }

    // Notification config operations

    /// Fetch a user's subscription rows, lazily provisioning them on
    /// first access: one disabled row per existing category plus one
    /// disabled placeholder keyword row, all in one transaction.
    pub async fn get_or_provision_user_configs(
        &self,
        user_id: i64,
    ) -> Result<Vec<NotificationConfig>> {
        let configs = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                let existing: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM notification_configs WHERE user_id = ?1",
                    params![user_id],
                    |row| row.get(0),
                )?;

                if existing == 0 {
                    let names: Vec<String> = {
                        let mut stmt = tx.prepare("SELECT name FROM categories ORDER BY name")?;
                        let names = stmt
                            .query_map([], |row| row.get(0))?
                            .collect::<std::result::Result<Vec<_>, _>>()?;
                        names
                    };
                    for name in names {
                        tx.execute(
                            "INSERT INTO notification_configs (user_id, category, enabled) VALUES (?1, ?2, 0)",
                            params![user_id, name],
                        )?;
                    }
                    tx.execute(
                        "INSERT INTO notification_configs (user_id, keyword, enabled) VALUES (?1, ?2, 0)",
                        params![user_id, KEYWORD_PLACEHOLDER],
                    )?;
                }

                let configs = {
                    let mut stmt = tx.prepare(
                        "SELECT id, user_id, category, keyword, enabled \
                         FROM notification_configs WHERE user_id = ?1 ORDER BY id",
                    )?;
                    let configs = stmt
                        .query_map(params![user_id], |row| Ok(config_from_row(row)))?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    configs
                };

                tx.commit()?;
                Ok(configs)
            })
            .await?;
        Ok(configs)
    }

    /// Toggle one subscription row; returns None when the id is unknown.
    pub async fn update_config(
        &self,
        config_id: i64,
        enabled: bool,
    ) -> Result<Option<NotificationConfig>> {
        let config = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE notification_configs SET enabled = ?1 WHERE id = ?2",
                    params![enabled, config_id],
                )?;
                let config = conn
                    .query_row(
                        "SELECT id, user_id, category, keyword, enabled \
                         FROM notification_configs WHERE id = ?1",
                        params![config_id],
                        |row| Ok(config_from_row(row)),
                    )
                    .optional()?;
                Ok(config)
            })
            .await?;
        Ok(config)
    }

    /// Replace all keyword subscriptions for a user in one transaction:
    /// delete-all-then-insert, one enabled row per keyword. Category
    /// rows are untouched.
    pub async fn replace_keywords(&self, user_id: i64, keywords: Vec<String>) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "DELETE FROM notification_configs WHERE user_id = ?1 AND keyword IS NOT NULL",
                    params![user_id],
                )?;
                for keyword in keywords {
                    tx.execute(
                        "INSERT INTO notification_configs (user_id, keyword, enabled) VALUES (?1, ?2, 1)",
                        params![user_id, keyword],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_enabled_configs_for_category(
        &self,
        category: &str,
    ) -> Result<Vec<NotificationConfig>> {
        let category = category.to_string();
        let configs = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, category, keyword, enabled \
                     FROM notification_configs WHERE category = ?1 AND enabled = 1 ORDER BY id",
                )?;
                let configs = stmt
                    .query_map(params![category], |row| Ok(config_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(configs)
            })
            .await?;
        Ok(configs)
    }

    pub async fn get_enabled_keyword_configs(&self) -> Result<Vec<NotificationConfig>> {
        let configs = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, category, keyword, enabled \
                     FROM notification_configs WHERE keyword IS NOT NULL AND enabled = 1 ORDER BY id",
                )?;
                let configs = stmt
                    .query_map([], |row| Ok(config_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(configs)
            })
            .await?;
        Ok(configs)
    }

    // Notification operations

    pub async fn create_notification(&self, user_id: i64, message: String) -> Result<Notification> {
        let notification = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO notifications (user_id, message) VALUES (?1, ?2)",
                    params![user_id, message],
                )?;
                let id = conn.last_insert_rowid();
                let notification = conn.query_row(
                    "SELECT id, user_id, message, created_at FROM notifications WHERE id = ?1",
                    params![id],
                    |row| Ok(notification_from_row(row)),
                )?;
                Ok(notification)
            })
            .await?;
        Ok(notification)
    }

    /// Delivered notification history for a user, newest first.
    pub async fn get_notifications_for_user(&self, user_id: i64) -> Result<Vec<Notification>> {
        let notifications = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, message, created_at FROM notifications \
                     WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
                )?;
                let notifications = stmt
                    .query_map(params![user_id], |row| Ok(notification_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(notifications)
            })
            .await?;
        Ok(notifications)
    }
}

const ARTICLE_COLUMNS: &str =
    "a.id, a.title, a.content, a.url, a.category, a.created_at, a.is_hidden";

fn blacklisted_keywords(conn: &rusqlite::Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT keyword FROM blacklisted_keywords")?;
    let kws = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(kws.into_iter().map(|k| k.to_lowercase()).collect())
}

/// Appends one exclusion clause per blacklisted keyword; each keyword
/// binds twice (title and content).
fn push_blacklist_filters(sql: &mut String, args: &mut Vec<String>, blacklist: &[String]) {
    for keyword in blacklist {
        sql.push_str(" AND instr(lower(a.title), ?) = 0 AND instr(lower(a.content), ?) = 0");
        args.push(keyword.clone());
        args.push(keyword.clone());
    }
}

fn is_unique_violation(error: &tokio_rusqlite::Error) -> bool {
    matches!(
        error,
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn datetime_column(row: &Row, idx: usize) -> DateTime<Utc> {
    row.get::<_, String>(idx)
        .ok()
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now)
}

fn article_from_row(row: &Row) -> Article {
    Article {
        id: row.get(0).unwrap(),
        title: row.get(1).unwrap(),
        content: row.get(2).unwrap(),
        url: row.get(3).unwrap(),
        category: row.get(4).unwrap(),
        created_at: datetime_column(row, 5),
        is_hidden: row.get::<_, i64>(6).unwrap() != 0,
    }
}

fn category_from_row(row: &Row) -> Category {
    Category {
        id: row.get(0).unwrap(),
        name: row.get(1).unwrap(),
        is_hidden: row.get::<_, i64>(2).unwrap() != 0,
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get(0).unwrap(),
        email: row.get(1).unwrap(),
        created_at: datetime_column(row, 2),
    }
}

fn config_from_row(row: &Row) -> NotificationConfig {
    NotificationConfig {
        id: row.get(0).unwrap(),
        user_id: row.get(1).unwrap(),
        category: row.get(2).unwrap(),
        keyword: row.get(3).unwrap(),
        enabled: row.get::<_, i64>(4).unwrap() != 0,
    }
}

fn notification_from_row(row: &Row) -> Notification {
    Notification {
        id: row.get(0).unwrap(),
        user_id: row.get(1).unwrap(),
        message: row.get(2).unwrap(),
        created_at: datetime_column(row, 3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_repo() -> (Repository, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        (repo, dir)
    }

    fn new_article(title: &str, content: &str, category: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            content: content.to_string(),
            url: None,
            category: category.to_string(),
        }
    }

    async fn seed_category(repo: &Repository, name: &str) {
        repo.create_category_if_not_exists(name).await.unwrap();
    }

    #[tokio::test]
    async fn create_article_rejects_empty_title() {
        let (repo, _dir) = test_repo().await;
        let err = repo
            .create_article(new_article("   ", "body", "general"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Article(_)));
    }

    #[tokio::test]
    async fn create_article_defaults_blank_category_to_general() {
        let (repo, _dir) = test_repo().await;
        let article = repo
            .create_article(new_article("Hello", "", ""))
            .await
            .unwrap();
        assert_eq!(article.category.as_deref(), Some("general"));
    }

    #[tokio::test]
    async fn hidden_articles_and_hidden_categories_are_excluded() {
        let (repo, _dir) = test_repo().await;
        seed_category(&repo, "business").await;
        seed_category(&repo, "sports").await;

        let visible = repo
            .create_article(new_article("Markets up", "", "business"))
            .await
            .unwrap();
        let hidden = repo
            .create_article(new_article("Markets down", "", "business"))
            .await
            .unwrap();
        repo.create_article(new_article("Cup final", "", "sports"))
            .await
            .unwrap();

        repo.hide_article(hidden.id).await.unwrap();
        repo.hide_category("sports").await.unwrap();

        let listed = repo.list_visible(0, 10).await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![visible.id]);

        // Hidden rows stay out of search and date queries too
        assert!(repo.search("cup").await.unwrap().is_empty());
        let today = Utc::now().date_naive();
        let by_date = repo.get_by_date(today, None).await.unwrap();
        assert_eq!(by_date.len(), 1);
        assert_eq!(by_date[0].id, visible.id);
    }

    #[tokio::test]
    async fn hide_article_is_idempotent_and_ignores_missing_ids() {
        let (repo, _dir) = test_repo().await;
        seed_category(&repo, "general").await;
        let article = repo
            .create_article(new_article("One", "", "general"))
            .await
            .unwrap();

        repo.hide_article(article.id).await.unwrap();
        repo.hide_article(article.id).await.unwrap();
        repo.hide_article(9999).await.unwrap();

        let stored = repo.get_article(article.id).await.unwrap().unwrap();
        assert!(stored.is_hidden);
    }

    #[tokio::test]
    async fn blacklist_excludes_matching_articles_retroactively() {
        let (repo, _dir) = test_repo().await;
        seed_category(&repo, "general").await;
        repo.create_article(new_article("Gossip about SCANDAL", "", "general"))
            .await
            .unwrap();
        repo.create_article(new_article("Clean title", "scandal in the body", "general"))
            .await
            .unwrap();
        let kept = repo
            .create_article(new_article("Weather report", "sunny", "general"))
            .await
            .unwrap();

        // Keyword added after the articles were stored; rows stay put
        repo.add_blacklisted_keyword("Scandal").await.unwrap();

        let listed = repo.list_visible(0, 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, kept.id);
        assert!(repo.search("scandal").await.unwrap().is_empty());

        // The underlying rows were never deleted
        assert!(repo.get_article(1).await.unwrap().is_some());

        repo.remove_blacklisted_keyword("scandal").await.unwrap();
        assert_eq!(repo.list_visible(0, 10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn add_blacklisted_keyword_normalizes_and_deduplicates() {
        let (repo, _dir) = test_repo().await;
        repo.add_blacklisted_keyword("SPAM").await.unwrap();
        repo.add_blacklisted_keyword("spam").await.unwrap();
        assert_eq!(repo.get_blacklisted_keywords().await.unwrap(), vec!["spam"]);

        let err = repo.add_blacklisted_keyword("  ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn search_matches_title_or_content_substring() {
        let (repo, _dir) = test_repo().await;
        seed_category(&repo, "business").await;
        let a = repo
            .create_article(new_article("Stocks rally", "markets surge", "business"))
            .await
            .unwrap();
        repo.create_article(new_article("Quiet day", "nothing happened", "business"))
            .await
            .unwrap();

        let by_title = repo.search("RALLY").await.unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].id, a.id);

        let by_content = repo.search("surge").await.unwrap();
        assert_eq!(by_content.len(), 1);
        assert_eq!(by_content[0].id, a.id);
    }

    #[tokio::test]
    async fn get_by_range_filters_by_category() {
        let (repo, _dir) = test_repo().await;
        seed_category(&repo, "business").await;
        seed_category(&repo, "health").await;
        repo.create_article(new_article("Markets", "", "business"))
            .await
            .unwrap();
        repo.create_article(new_article("Vaccines", "", "health"))
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let all = repo.get_by_range(today, today, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let business = repo
            .get_by_range(today, today, Some("business".to_string()))
            .await
            .unwrap();
        assert_eq!(business.len(), 1);
        assert_eq!(business[0].title, "Markets");

        let yesterday = today - Duration::days(1);
        let stale = repo.get_by_range(yesterday, yesterday, None).await.unwrap();
        assert!(stale.is_empty());
    }

    #[tokio::test]
    async fn category_creation_is_idempotent() {
        let (repo, _dir) = test_repo().await;
        let first = repo.create_category_if_not_exists("science").await.unwrap();
        let second = repo.create_category_if_not_exists("science").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(repo.get_all_categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn explicit_category_creation_rejects_duplicates() {
        let (repo, _dir) = test_repo().await;
        repo.create_category("science").await.unwrap();
        let err = repo.create_category("science").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn configs_are_provisioned_once_per_user() {
        let (repo, _dir) = test_repo().await;
        seed_category(&repo, "business").await;
        seed_category(&repo, "sports").await;
        let user = repo.create_user("a@example.com".to_string()).await.unwrap();

        let configs = repo.get_or_provision_user_configs(user.id).await.unwrap();
        // One disabled row per category plus the placeholder keyword row
        assert_eq!(configs.len(), 3);
        assert!(configs.iter().all(|c| !c.enabled));
        assert_eq!(configs.iter().filter(|c| c.category.is_some()).count(), 2);
        let keyword_rows: Vec<_> = configs.iter().filter(|c| c.keyword.is_some()).collect();
        assert_eq!(keyword_rows.len(), 1);
        assert_eq!(keyword_rows[0].keyword.as_deref(), Some("*"));

        // Second call must not duplicate rows
        let again = repo.get_or_provision_user_configs(user.id).await.unwrap();
        assert_eq!(again.len(), 3);
    }

    #[tokio::test]
    async fn update_config_toggles_and_ignores_unknown_ids() {
        let (repo, _dir) = test_repo().await;
        seed_category(&repo, "business").await;
        let user = repo.create_user("a@example.com".to_string()).await.unwrap();
        let configs = repo.get_or_provision_user_configs(user.id).await.unwrap();

        let toggled = repo
            .update_config(configs[0].id, true)
            .await
            .unwrap()
            .unwrap();
        assert!(toggled.enabled);

        assert!(repo.update_config(9999, true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_keywords_swaps_keyword_rows_and_keeps_category_rows() {
        let (repo, _dir) = test_repo().await;
        seed_category(&repo, "business").await;
        let user = repo.create_user("a@example.com".to_string()).await.unwrap();
        repo.get_or_provision_user_configs(user.id).await.unwrap();

        repo.replace_keywords(user.id, vec!["trade".into(), "rust".into()])
            .await
            .unwrap();
        let configs = repo.get_or_provision_user_configs(user.id).await.unwrap();
        let keywords: Vec<&str> = configs
            .iter()
            .filter_map(|c| c.keyword.as_deref())
            .collect();
        assert_eq!(keywords, vec!["trade", "rust"]);
        assert!(configs
            .iter()
            .filter(|c| c.keyword.is_some())
            .all(|c| c.enabled));
        assert_eq!(configs.iter().filter(|c| c.category.is_some()).count(), 1);

        // Empty replacement clears every keyword row
        repo.replace_keywords(user.id, vec![]).await.unwrap();
        let configs = repo.get_or_provision_user_configs(user.id).await.unwrap();
        assert!(configs.iter().all(|c| c.keyword.is_none()));
        assert_eq!(configs.iter().filter(|c| c.category.is_some()).count(), 1);
    }

    #[tokio::test]
    async fn notification_history_is_newest_first() {
        let (repo, _dir) = test_repo().await;
        let user = repo.create_user("a@example.com".to_string()).await.unwrap();
        repo.create_notification(user.id, "first".into()).await.unwrap();
        repo.create_notification(user.id, "second".into()).await.unwrap();

        let history = repo.get_notifications_for_user(user.id).await.unwrap();
        let messages: Vec<&str> = history.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "first"]);
    }
}
