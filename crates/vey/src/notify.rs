//! Out-of-band delivery of challenges and tokens.
//!
//! After a successful begin step the caller hands the issued value to a
//! [`Notifier`], which delivers it to the address owner. Delivery is outside
//! the protocol: a failed delivery leaves the cache entry in place to expire
//! unused.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use vey_authn::Token;
use vey_storage::BoxError;

/// Number of leading token characters shown in logs.
const FINGERPRINT_LEN: usize = 6;

/// A delivery failure.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct NotifyError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl NotifyError {
    /// Creates a delivery error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    /// Creates a delivery error with a message and source error.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self { message: message.into(), source: Some(Arc::new(source)) }
    }
}

/// Delivers challenges and tokens to email owners.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a registration challenge, which the recipient signs with the
    /// private key being registered.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the challenge could not be delivered.
    async fn send_challenge(&self, email: &str, challenge: &Token) -> Result<(), NotifyError>;

    /// Sends a revocation token, which the recipient returns to confirm.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the token could not be delivered.
    async fn send_token(&self, email: &str, token: &Token) -> Result<(), NotifyError>;
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    async fn send_challenge(&self, email: &str, challenge: &Token) -> Result<(), NotifyError> {
        (**self).send_challenge(email, challenge).await
    }

    async fn send_token(&self, email: &str, token: &Token) -> Result<(), NotifyError> {
        (**self).send_token(email, token).await
    }
}

/// What a [`MemoryNotifier`] last delivered.
#[derive(Clone, Debug, Default)]
pub struct Deliveries {
    /// Recipient of the most recent delivery of either kind.
    pub email: Option<String>,
    /// Most recent challenge.
    pub challenge: Option<Token>,
    /// Most recent revocation token.
    pub token: Option<Token>,
}

/// Records the latest deliveries in memory instead of sending them.
///
/// Intended for tests, where the recorded values stand in for the
/// recipient's inbox.
#[derive(Clone, Debug, Default)]
pub struct MemoryNotifier {
    deliveries: Arc<Mutex<Deliveries>>,
}

impl MemoryNotifier {
    /// Creates a notifier with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded deliveries.
    #[must_use]
    pub fn deliveries(&self) -> Deliveries {
        self.deliveries.lock().clone()
    }

    /// Returns the most recent challenge.
    #[must_use]
    pub fn last_challenge(&self) -> Option<Token> {
        self.deliveries.lock().challenge.clone()
    }

    /// Returns the most recent revocation token.
    #[must_use]
    pub fn last_token(&self) -> Option<Token> {
        self.deliveries.lock().token.clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send_challenge(&self, email: &str, challenge: &Token) -> Result<(), NotifyError> {
        let mut deliveries = self.deliveries.lock();
        deliveries.email = Some(email.to_owned());
        deliveries.challenge = Some(challenge.clone());
        Ok(())
    }

    async fn send_token(&self, email: &str, token: &Token) -> Result<(), NotifyError> {
        let mut deliveries = self.deliveries.lock();
        deliveries.email = Some(email.to_owned());
        deliveries.token = Some(token.clone());
        Ok(())
    }
}

/// Logs each delivery, then forwards it to the wrapped notifier.
///
/// Only the address domain and a short prefix of the value are logged.
/// Errors from the inner notifier are propagated.
#[derive(Clone, Debug, Default)]
pub struct LoggingNotifier<N> {
    inner: N,
}

impl<N> LoggingNotifier<N> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: N) -> Self {
        Self { inner }
    }

    /// Returns the wrapped notifier.
    #[must_use]
    pub fn inner(&self) -> &N {
        &self.inner
    }
}

#[async_trait]
impl<N: Notifier> Notifier for LoggingNotifier<N> {
    async fn send_challenge(&self, email: &str, challenge: &Token) -> Result<(), NotifyError> {
        tracing::info!(
            recipient = %MaskedEmail(email),
            challenge = fingerprint(challenge),
            "sending challenge"
        );
        self.inner.send_challenge(email, challenge).await
    }

    async fn send_token(&self, email: &str, token: &Token) -> Result<(), NotifyError> {
        tracing::info!(recipient = %MaskedEmail(email), token = fingerprint(token), "sending token");
        self.inner.send_token(email, token).await
    }
}

/// Accepts and discards every delivery.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send_challenge(&self, _email: &str, _challenge: &Token) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn send_token(&self, _email: &str, _token: &Token) -> Result<(), NotifyError> {
        Ok(())
    }
}

fn fingerprint(token: &Token) -> &str {
    let value = token.as_str();
    value.get(..FINGERPRINT_LEN).unwrap_or(value)
}

/// Displays an address as `***@domain`.
struct MaskedEmail<'a>(&'a str);

impl fmt::Display for MaskedEmail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.rsplit_once('@') {
            Some((_, domain)) => write!(f, "***@{domain}"),
            None => f.write_str("***"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Unreachable;

    #[async_trait]
    impl Notifier for Unreachable {
        async fn send_challenge(&self, _: &str, _: &Token) -> Result<(), NotifyError> {
            Err(NotifyError::new("mail relay down"))
        }

        async fn send_token(&self, _: &str, _: &Token) -> Result<(), NotifyError> {
            Err(NotifyError::new("mail relay down"))
        }
    }

    #[tokio::test]
    async fn test_memory_notifier_records_latest() {
        let notifier = MemoryNotifier::new();
        notifier.send_challenge("a@example.com", &Token::from_encoded("c1")).await.unwrap();
        notifier.send_challenge("b@example.com", &Token::from_encoded("c2")).await.unwrap();
        notifier.send_token("c@example.com", &Token::from_encoded("t1")).await.unwrap();

        let deliveries = notifier.deliveries();
        assert_eq!(deliveries.email.as_deref(), Some("c@example.com"));
        assert_eq!(notifier.last_challenge(), Some(Token::from_encoded("c2")));
        assert_eq!(notifier.last_token(), Some(Token::from_encoded("t1")));
    }

    #[tokio::test]
    async fn test_memory_notifier_clones_share_state() {
        let notifier = MemoryNotifier::new();
        let observer = notifier.clone();
        notifier.send_token("a@example.com", &Token::from_encoded("t")).await.unwrap();
        assert_eq!(observer.last_token(), Some(Token::from_encoded("t")));
    }

    #[tokio::test]
    async fn test_logging_notifier_forwards() {
        let notifier = LoggingNotifier::new(MemoryNotifier::new());
        notifier.send_challenge("a@example.com", &Token::from_encoded("challenge")).await.unwrap();
        assert_eq!(notifier.inner().last_challenge(), Some(Token::from_encoded("challenge")));
    }

    #[tokio::test]
    async fn test_logging_notifier_propagates_errors() {
        let notifier = LoggingNotifier::new(Unreachable);
        let err = notifier.send_token("a@example.com", &Token::from_encoded("t")).await.unwrap_err();
        assert_eq!(err.to_string(), "mail relay down");
    }

    #[tokio::test]
    async fn test_null_notifier_accepts_everything() {
        NullNotifier.send_challenge("a@example.com", &Token::from_encoded("c")).await.unwrap();
        NullNotifier.send_token("a@example.com", &Token::from_encoded("t")).await.unwrap();
    }

    #[tokio::test]
    async fn test_arc_dyn_notifier() {
        let memory = MemoryNotifier::new();
        let notifier: Arc<dyn Notifier> = Arc::new(memory.clone());
        notifier.send_token("a@example.com", &Token::from_encoded("t")).await.unwrap();
        assert_eq!(memory.last_token(), Some(Token::from_encoded("t")));
    }

    #[test]
    fn test_masking() {
        assert_eq!(MaskedEmail("alice@example.com").to_string(), "***@example.com");
        assert_eq!(MaskedEmail("not-an-address").to_string(), "***");
        assert_eq!(fingerprint(&Token::from_encoded("abcdefghij")), "abcdef");
        assert_eq!(fingerprint(&Token::from_encoded("abc")), "abc");
    }
}
