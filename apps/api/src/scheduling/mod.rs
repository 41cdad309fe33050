//! Scheduling-link service.
//!
//! The provider's event-type link is fetched on first use and reused until it
//! is older than the configured TTL or explicitly invalidated. Each candidate
//! gets a personalized copy with their name and email in the query string.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

pub mod calendly;
pub mod handlers;

pub use calendly::CalendlyProvider;

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("CALENDLY_API_KEY is not set")]
    MissingCredential,

    #[error("scheduling provider rejected the token (status {0})")]
    Unauthorized(u16),

    #[error("scheduling request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("scheduling provider error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("scheduling provider response is missing {0}")]
    MissingField(&'static str),

    #[error("invalid scheduling link {0:?}")]
    InvalidLink(String),
}

impl SchedulingError {
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            SchedulingError::MissingCredential | SchedulingError::Unauthorized(_)
        )
    }
}

/// A calendar provider that can hand out a booking link.
#[async_trait]
pub trait SchedulingProvider: Send + Sync {
    /// Identity of the account that owns the token.
    async fn current_user_uri(&self) -> Result<String, SchedulingError>;

    /// Booking link of that account's first event type.
    async fn event_type_link(&self, user_uri: &str) -> Result<String, SchedulingError>;
}

#[derive(Debug, Clone)]
struct CachedLink {
    url: String,
    fetched_at: Instant,
}

pub struct SchedulingService {
    provider: Arc<dyn SchedulingProvider>,
    ttl: Duration,
    cache: Mutex<Option<CachedLink>>,
}

impl SchedulingService {
    pub fn new(provider: Arc<dyn SchedulingProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// The shared booking link, fetched when absent or expired.
    /// Concurrent callers wait on one fetch.
    pub async fn scheduling_link(&self) -> Result<String, SchedulingError> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(cached.url.clone());
            }
            debug!("Scheduling link expired; refetching");
        }

        let user_uri = self.provider.current_user_uri().await?;
        let url = self.provider.event_type_link(&user_uri).await?;
        Url::parse(&url).map_err(|_| SchedulingError::InvalidLink(url.clone()))?;

        info!("Fetched scheduling link");
        *cache = Some(CachedLink {
            url: url.clone(),
            fetched_at: Instant::now(),
        });
        Ok(url)
    }

    /// Drops the cached link. Returns whether one was held.
    pub async fn invalidate(&self) -> bool {
        let dropped = self.cache.lock().await.take().is_some();
        info!("Scheduling link cache invalidated (had entry: {dropped})");
        dropped
    }

    pub async fn personalized_link(
        &self,
        name: &str,
        email: &str,
    ) -> Result<String, SchedulingError> {
        let link = self.scheduling_link().await?;
        personalize(&link, name, email)
    }
}

/// `<link>?name=<name>&email=<email>`, form-encoded.
pub fn personalize(link: &str, name: &str, email: &str) -> Result<String, SchedulingError> {
    let mut url = Url::parse(link).map_err(|_| SchedulingError::InvalidLink(link.to_string()))?;
    url.query_pairs_mut()
        .append_pair("name", name)
        .append_pair("email", email);
    Ok(url.into())
}
