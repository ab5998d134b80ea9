use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::Headline;

const NEWS_API_URL: &str = "https://newsapi.org/v2/top-headlines";

/// Response envelope decoded once at the boundary; everything past this
/// point works with typed `Headline` records.
#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
}

pub struct NewsApiClient {
    client: Client,
    api_key: String,
    country: String,
    page_size: u32,
}

impl NewsApiClient {
    pub fn new(api_key: String, country: String, page_size: u32) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("newswire/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            country,
            page_size,
        }
    }

    /// Fetch top headlines, optionally restricted to a source-side
    /// category. Any transport or API-level failure aborts the run.
    pub async fn fetch_top_headlines(&self, category: Option<&str>) -> Result<Vec<Headline>> {
        let mut query: Vec<(&str, String)> = vec![
            ("apiKey", self.api_key.clone()),
            ("country", self.country.clone()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(category) = category {
            query.push(("category", category.to_string()));
        }

        let response = self
            .client
            .get(NEWS_API_URL)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::ExternalSource(format!("news source unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalSource(format!(
                "news source returned HTTP {}",
                response.status()
            )));
        }

        let envelope: HeadlinesResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalSource(format!("bad news source response: {e}")))?;

        if envelope.status != "ok" {
            return Err(AppError::ExternalSource(format!(
                "news source error: {}",
                envelope.message.unwrap_or_else(|| envelope.status.clone())
            )));
        }

        Ok(map_headlines(envelope.articles, category))
    }
}

/// Map raw source records to headlines, dropping entries without a title
/// and urls that do not parse.
fn map_headlines(articles: Vec<RawArticle>, category: Option<&str>) -> Vec<Headline> {
    articles
        .into_iter()
        .filter_map(|article| {
            let title = article.title.filter(|t| !t.trim().is_empty())?;
            let url = article
                .url
                .filter(|u| url::Url::parse(u).is_ok());
            Some(Headline {
                title,
                content: article.description,
                url,
                category: category.map(|c| c.to_string()),
            })
        })
        .collect()
}
