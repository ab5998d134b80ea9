use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

mod classifier;
mod config;
mod db;
mod error;
mod models;
mod news;
mod services;

use config::Config;
use db::Repository;
use error::{AppError, Result};
use models::Article;
use news::NewsApiClient;
use services::{ArticleProcessor, Mailer, NotificationService};

const USAGE: &str = "Usage: newswire [COMMAND]

Commands:
  (none)                               run periodic ingestion
  --fetch [category]                   fetch headlines once and exit
  --add-user <email>                   register a notification recipient
  --list [skip] [limit]                list visible articles
  --search <query>                     search visible articles
  --by-date <YYYY-MM-DD> [category]    articles for one day
  --by-range <start> <end> [category]  articles within a date range
  --show-article <id>                  print one article
  --hide-article <id>                  hide one article
  --hide-category <name>               hide a whole category
  --add-category <name>                create a category
  --blacklist-add <keyword>            add a blacklist keyword
  --blacklist-remove <keyword>         remove a blacklist keyword
  --blacklist-list                     show blacklist keywords
  --configs <user-id>                  show a user's subscription rows
  --toggle <config-id> <on|off>        enable/disable one subscription
  --set-keywords <user-id> <kw,kw,..>  replace a user's keyword subscriptions
  --history <user-id>                  show delivered notifications";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Load configuration
    let config = Config::load()?;

    let repository = Arc::new(Repository::new(&config.db_path).await?);
    let mailer = Arc::new(Mailer::from_config(config.smtp.as_ref())?);
    let notifications = Arc::new(NotificationService::new(repository.clone(), mailer));
    let processor = ArticleProcessor::new(repository.clone(), notifications.clone());

    match args.get(1).map(String::as_str) {
        None => run_scheduler(&config, &processor).await,
        Some("--fetch") => {
            let client = news_client(&config)?;
            let category = args.get(2).map(String::as_str);
            let headlines = client.fetch_top_headlines(category).await?;
            let stored = processor.process_and_store(headlines).await?;
            println!("Stored {} articles", stored.len());
            Ok(())
        }
        Some("--add-user") => {
            let email = required_arg(&args, 2, "email")?;
            let user = repository.create_user(email.to_string()).await?;
            println!("Created user {} ({})", user.id, user.email);
            Ok(())
        }
        Some("--list") => {
            let skip = optional_number(&args, 2)?.unwrap_or(0);
            let limit = optional_number(&args, 3)?.unwrap_or(10);
            print_articles(&repository.list_visible(skip as u32, limit as u32).await?);
            Ok(())
        }
        Some("--search") => {
            let query = required_arg(&args, 2, "query")?;
            print_articles(&repository.search(query).await?);
            Ok(())
        }
        Some("--by-date") => {
            let date = parse_date(required_arg(&args, 2, "date")?)?;
            let category = args.get(3).cloned();
            print_articles(&repository.get_by_date(date, category).await?);
            Ok(())
        }
        Some("--by-range") => {
            let start = parse_date(required_arg(&args, 2, "start date")?)?;
            let end = parse_date(required_arg(&args, 3, "end date")?)?;
            let category = args.get(4).cloned();
            print_articles(&repository.get_by_range(start, end, category).await?);
            Ok(())
        }
        Some("--show-article") => {
            let id = required_number(&args, 2, "article id")?;
            match repository.get_article(id).await? {
                Some(article) => {
                    println!("{}", article.title);
                    if let Some(url) = &article.url {
                        println!("{url}");
                    }
                    if !article.content.is_empty() {
                        println!("\n{}", article.content);
                    }
                }
                None => println!("No article with id {id}"),
            }
            Ok(())
        }
        Some("--hide-article") => {
            let id = required_number(&args, 2, "article id")?;
            repository.hide_article(id).await?;
            println!("Article {id} hidden");
            Ok(())
        }
        Some("--hide-category") => {
            let name = required_arg(&args, 2, "category name")?;
            repository.hide_category(name).await?;
            println!("Category '{name}' hidden");
            Ok(())
        }
        Some("--add-category") => {
            let name = required_arg(&args, 2, "category name")?;
            let category = repository.create_category(name).await?;
            println!("Created category {} ({})", category.id, category.name);
            Ok(())
        }
        Some("--blacklist-add") => {
            let keyword = required_arg(&args, 2, "keyword")?;
            repository.add_blacklisted_keyword(keyword).await?;
            println!("Blacklisted '{}'", keyword.trim().to_lowercase());
            Ok(())
        }
        Some("--blacklist-remove") => {
            let keyword = required_arg(&args, 2, "keyword")?;
            repository.remove_blacklisted_keyword(keyword).await?;
            println!("Removed '{}'", keyword.trim().to_lowercase());
            Ok(())
        }
        Some("--blacklist-list") => {
            for keyword in repository.get_blacklisted_keywords().await? {
                println!("{keyword}");
            }
            Ok(())
        }
        Some("--configs") => {
            let user_id = required_number(&args, 2, "user id")?;
            for config in notifications.get_user_configs(user_id).await? {
                let (kind, value) = if config.is_keyword() {
                    ("keyword", config.keyword.as_deref().unwrap_or_default())
                } else {
                    ("category", config.category.as_deref().unwrap_or_default())
                };
                let state = if config.enabled { "on" } else { "off" };
                println!("{:>4}  {:8} {:24} {}", config.id, kind, value, state);
            }
            Ok(())
        }
        Some("--toggle") => {
            let config_id = required_number(&args, 2, "config id")?;
            let enabled = match required_arg(&args, 3, "on|off")? {
                "on" => true,
                "off" => false,
                other => {
                    return Err(AppError::Validation(format!(
                        "expected 'on' or 'off', got '{other}'"
                    )))
                }
            };
            match notifications.update_config(config_id, enabled).await? {
                Some(config) => println!(
                    "Config {} is now {}",
                    config.id,
                    if config.enabled { "on" } else { "off" }
                ),
                None => println!("No config with id {config_id}"),
            }
            Ok(())
        }
        Some("--set-keywords") => {
            let user_id = required_number(&args, 2, "user id")?;
            let keywords: Vec<String> = args
                .get(3)
                .map(|list| list.split(',').map(str::to_string).collect())
                .unwrap_or_default();
            notifications.update_keywords(user_id, keywords).await?;
            println!("Keywords updated for user {user_id}");
            Ok(())
        }
        Some("--history") => {
            let user_id = required_number(&args, 2, "user id")?;
            for notification in notifications.get_history(user_id).await? {
                println!(
                    "{}  {}",
                    notification.created_at.format("%Y-%m-%d %H:%M"),
                    notification.message
                );
            }
            Ok(())
        }
        Some(_) => {
            eprintln!("{USAGE}");
            Ok(())
        }
    }
}

/// Periodic ingestion, first run immediately, then every configured
/// interval.
async fn run_scheduler(config: &Config, processor: &ArticleProcessor) -> Result<()> {
    let client = news_client(config)?;
    tracing::info!(
        "Fetching headlines every {} minutes",
        config.fetch_interval_minutes
    );
    let mut ticker = tokio::time::interval(Duration::from_secs(
        u64::from(config.fetch_interval_minutes) * 60,
    ));
    loop {
        ticker.tick().await;
        match client.fetch_top_headlines(None).await {
            Ok(headlines) => match processor.process_and_store(headlines).await {
                Ok(stored) => tracing::info!("Ingestion run stored {} articles", stored.len()),
                Err(e) => tracing::error!("Ingestion run failed: {e}"),
            },
            Err(e) => tracing::error!("Headline fetch failed: {e}"),
        }
    }
}

fn news_client(config: &Config) -> Result<NewsApiClient> {
    let api_key = config.news_api_key.clone().ok_or_else(|| {
        AppError::Config(format!(
            "news_api_key is not set; add it to {}",
            Config::config_path().display()
        ))
    })?;
    Ok(NewsApiClient::new(
        api_key,
        config.news_country.clone(),
        config.news_page_size,
    ))
}

fn print_articles(articles: &[Article]) {
    for article in articles {
        println!(
            "{:>5}  {:12}  {}",
            article.id,
            article.category.as_deref().unwrap_or("-"),
            article.title
        );
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("expected YYYY-MM-DD date, got '{raw}'")))
}

fn required_arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| AppError::Validation(format!("missing argument: {name}\n\n{USAGE}")))
}

fn required_number(args: &[String], index: usize, name: &str) -> Result<i64> {
    let raw = required_arg(args, index, name)?;
    raw.parse()
        .map_err(|_| AppError::Validation(format!("{name} must be a number, got '{raw}'")))
}

fn optional_number(args: &[String], index: usize) -> Result<Option<i64>> {
    match args.get(index) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("expected a number, got '{raw}'"))),
    }
}
