use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use crate::classifier;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{Article, Headline, NewArticle};
use crate::services::NotificationService;

// Deliveries within a run touch disjoint users, so a small concurrent
// window is safe.
const MAX_CONCURRENT_DELIVERIES: usize = 4;

/// Ingestion and notification fan-out engine: classifies and stores a
/// batch of headlines, then notifies subscribed users at most once per
/// (user, article) pair.
pub struct ArticleProcessor {
    repository: Arc<Repository>,
    notifications: Arc<NotificationService>,
    // Fan-out dedup state is run-scoped memory; overlapping runs must
    // not interleave.
    run_lock: Mutex<()>,
}

struct PendingDelivery {
    user_id: i64,
    message: String,
    url: Option<String>,
}

impl ArticleProcessor {
    pub fn new(repository: Arc<Repository>, notifications: Arc<NotificationService>) -> Self {
        Self {
            repository,
            notifications,
            run_lock: Mutex::new(()),
        }
    }

    /// Classify and persist a batch of headlines, then fan out
    /// notifications for every stored article.
    ///
    /// A storage or classification failure aborts the remaining batch;
    /// articles committed before the failure remain stored. Delivery
    /// failures for individual recipients are logged and never abort
    /// the run.
    pub async fn process_and_store(&self, headlines: Vec<Headline>) -> Result<Vec<Article>> {
        let _guard = self.run_lock.lock().await;

        let mut stored = Vec::with_capacity(headlines.len());
        for headline in headlines {
            let article = self.store_single(headline).await.map_err(|e| {
                AppError::Article(format!("failed to process article batch: {e}"))
            })?;
            stored.push(article);
        }

        for article in &stored {
            self.fan_out(article).await?;
        }

        tracing::info!("Ingestion run stored {} articles", stored.len());
        Ok(stored)
    }

    async fn store_single(&self, headline: Headline) -> Result<Article> {
        let content = headline.content.unwrap_or_default();
        let full_text = format!("{} {}", headline.title, content);
        let category = classifier::classify(&full_text);

        self.repository.create_category_if_not_exists(category).await?;

        self.repository
            .create_article(NewArticle {
                title: headline.title,
                content,
                url: headline.url,
                category: category.to_string(),
            })
            .await
    }

    /// One fan-out pass for one article: category subscribers first,
    /// then keyword subscribers, with a per-article dedup set shared
    /// across both passes.
    async fn fan_out(&self, article: &Article) -> Result<()> {
        let Some(category) = article.category.as_deref() else {
            // Classifier always assigns a label; guard anyway.
            return Ok(());
        };

        let mut notified: HashSet<i64> = HashSet::new();
        let mut pending: Vec<PendingDelivery> = Vec::new();

        let category_configs = self
            .repository
            .get_enabled_configs_for_category(category)
            .await?;
        for config in category_configs {
            if notified.insert(config.user_id) {
                pending.push(PendingDelivery {
                    user_id: config.user_id,
                    message: format!("New article in {}: {}", category, article.title),
                    url: article.url.clone(),
                });
            }
        }

        let keyword_configs = self.repository.get_enabled_keyword_configs().await?;
        let article_text = format!("{} {}", article.title, article.content).to_lowercase();
        for config in keyword_configs {
            if notified.contains(&config.user_id) {
                continue;
            }
            let Some(keyword) = config.keyword.as_deref() else {
                continue;
            };
            if article_text.contains(&keyword.to_lowercase()) {
                notified.insert(config.user_id);
                pending.push(PendingDelivery {
                    user_id: config.user_id,
                    message: format!(
                        "New article matching keyword '{}': {}",
                        keyword, article.title
                    ),
                    url: None,
                });
            }
        }

        // Recipients are distinct at this point; deliveries can overlap.
        stream::iter(pending)
            .for_each_concurrent(MAX_CONCURRENT_DELIVERIES, |delivery| async move {
                if let Err(e) = self
                    .notifications
                    .deliver(delivery.user_id, &delivery.message, delivery.url.as_deref())
                    .await
                {
                    tracing::warn!(
                        "Skipping notification for user {} on article {}: {}",
                        delivery.user_id,
                        article.id,
                        e
                    );
                }
            })
            .await;

        Ok(())
    }
}
