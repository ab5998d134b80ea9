mod mailer;
mod notifications;
mod processing;

pub use mailer::Mailer;
pub use notifications::NotificationService;
pub use processing::ArticleProcessor;
