use async_trait::async_trait;

use crate::common::error::AppResult;

pub mod groq;

pub use groq::GroqFormatter;

/// Overlay text split into a headline and the body shown under it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedText {
    pub title: String,
    pub body: String,
}

impl FormattedText {
    /// Raw text used as the body unchanged.
    pub fn passthrough(raw: &str) -> Self {
        Self {
            title: String::new(),
            body: raw.trim().to_string(),
        }
    }
}

#[async_trait]
pub trait TextFormatter: Send + Sync {
    async fn format(&self, raw: &str) -> AppResult<FormattedText>;
}
