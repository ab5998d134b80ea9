mod client;

pub use client::NewsApiClient;
