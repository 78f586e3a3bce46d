//! The begin/commit registration protocol.

use std::{sync::Arc, time::Duration};

use tracing::Span;
use vey_authn::{Digester, SignatureVerifier, Token, VerifierRegistry, generate_token, validate_email};
use vey_storage::{ChallengeCache, ConfigError, KeyStore, PendingRecord, PublicKey};

use crate::error::{Result, VeyError};

/// Default lifetime of an issued challenge or token (15 minutes).
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(15 * 60);

fn default_verifiers() -> Arc<dyn SignatureVerifier> {
    Arc::new(VerifierRegistry::default())
}

fn default_span() -> Span {
    tracing::info_span!("vey")
}

/// The registration orchestrator.
///
/// Composes a [`Digester`], a [`ChallengeCache`], a [`KeyStore`] and a
/// [`SignatureVerifier`] into the four-step protocol:
///
/// | Step | Effect |
/// |------|--------|
/// | [`begin_put`](Self::begin_put) | Issue a challenge bound to the identity |
/// | [`commit_put`](Self::commit_put) | Consume the challenge, check the signature, add the key |
/// | [`begin_delete`](Self::begin_delete) | Issue a token bound to the identity and key |
/// | [`commit_delete`](Self::commit_delete) | Consume the token, remove the key |
///
/// `Vey` holds no locks and no mutable state of its own; clones share the
/// same backends and may be used from any number of tasks.
///
/// Every operation runs in a span named after it, parented to the span
/// given at construction.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use vey::Vey;
/// use vey_authn::HmacDigester;
/// use vey_storage::{MemoryChallengeCache, MemoryKeyStore};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let vey = Vey::builder()
///     .digester(Arc::new(HmacDigester::new("salt").unwrap()))
///     .cache(Arc::new(MemoryChallengeCache::new()))
///     .store(Arc::new(MemoryKeyStore::new()))
///     .build()
///     .unwrap();
///
/// assert!(vey.get_keys("test@example.com").await.unwrap().is_empty());
/// let challenge = vey.begin_put("test@example.com").await.unwrap();
/// assert!(!challenge.as_str().is_empty());
/// # });
/// ```
#[derive(Clone)]
pub struct Vey {
    digester: Arc<dyn Digester>,
    cache: Arc<dyn ChallengeCache>,
    store: Arc<dyn KeyStore>,
    verifiers: Arc<dyn SignatureVerifier>,
    challenge_ttl: Duration,
    span: Span,
}

#[bon::bon]
impl Vey {
    /// Creates an orchestrator from its collaborators.
    ///
    /// # Optional Fields
    ///
    /// * `verifiers` - default [`VerifierRegistry::default`]
    /// * `challenge_ttl` - default 15 minutes
    /// * `span` - default a fresh `vey` info span
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `challenge_ttl` is zero.
    #[builder]
    pub fn new(
        digester: Arc<dyn Digester>,
        cache: Arc<dyn ChallengeCache>,
        store: Arc<dyn KeyStore>,
        #[builder(default = default_verifiers())] verifiers: Arc<dyn SignatureVerifier>,
        #[builder(default = DEFAULT_CHALLENGE_TTL)] challenge_ttl: Duration,
        #[builder(default = default_span())] span: Span,
    ) -> std::result::Result<Self, ConfigError> {
        if challenge_ttl.is_zero() {
            return Err(ConfigError::invalid("challenge_ttl", "must be greater than zero"));
        }
        Ok(Self { digester, cache, store, verifiers, challenge_ttl, span })
    }

    /// Returns how long issued challenges and tokens stay valid.
    #[must_use]
    pub fn challenge_ttl(&self) -> Duration {
        self.challenge_ttl
    }

    /// Returns the keys registered for `email`, empty if there are none.
    ///
    /// # Errors
    ///
    /// - [`VeyError::InvalidEmail`] if `email` is malformed
    /// - [`VeyError::Internal`] if the key store fails
    #[tracing::instrument(parent = &self.span, skip_all)]
    pub async fn get_keys(&self, email: &str) -> Result<Vec<PublicKey>> {
        validate_email(email)?;
        let digest = self.digester.of(email);
        Ok(self.store.get(&digest).await?)
    }

    /// Issues a registration challenge for `email`.
    ///
    /// The caller delivers the challenge to the address owner, who signs its
    /// bytes with the private key to register.
    ///
    /// # Errors
    ///
    /// - [`VeyError::InvalidEmail`] if `email` is malformed
    /// - [`VeyError::Internal`] if the random source or the cache fails
    #[tracing::instrument(parent = &self.span, skip_all)]
    pub async fn begin_put(&self, email: &str) -> Result<Token> {
        validate_email(email)?;
        let digest = self.digester.of(email);
        self.issue(PendingRecord::put(digest)).await
    }

    /// Registers `public_key` if `signature` is its signature over
    /// `challenge`.
    ///
    /// The challenge is consumed before the signature is checked, so it
    /// cannot be replayed after either outcome.
    ///
    /// # Errors
    ///
    /// - [`VeyError::NotFound`] if the challenge is unknown, used or expired
    /// - [`VeyError::VerifyFailed`] if the signature does not verify
    /// - [`VeyError::Internal`] if the cache or key store fails
    #[tracing::instrument(parent = &self.span, skip_all, fields(key_type = %public_key.key_type))]
    pub async fn commit_put(
        &self,
        challenge: &[u8],
        signature: &[u8],
        public_key: &PublicKey,
    ) -> Result<()> {
        let record = self.cache.take(challenge).await?;
        if record.public_key.is_some() {
            tracing::debug!("revocation token presented as a registration challenge");
            return Err(VeyError::NotFound);
        }

        if !self.verifiers.verify(public_key, signature, challenge) {
            tracing::info!("signature rejected");
            return Err(VeyError::VerifyFailed);
        }

        self.store.put(&record.email_digest, public_key).await?;
        tracing::info!("public key registered");
        Ok(())
    }

    /// Issues a revocation token for `public_key` under `email`.
    ///
    /// The key need not currently be registered; committing a token for an
    /// absent key is a no-op.
    ///
    /// # Errors
    ///
    /// - [`VeyError::InvalidEmail`] if `email` is malformed
    /// - [`VeyError::Internal`] if the random source or the cache fails
    #[tracing::instrument(parent = &self.span, skip_all, fields(key_type = %public_key.key_type))]
    pub async fn begin_delete(&self, email: &str, public_key: &PublicKey) -> Result<Token> {
        validate_email(email)?;
        let digest = self.digester.of(email);
        self.issue(PendingRecord::delete(digest, public_key.clone())).await
    }

    /// Removes the key bound to `token`.
    ///
    /// # Errors
    ///
    /// - [`VeyError::NotFound`] if the token is unknown, used or expired
    /// - [`VeyError::Internal`] if the cache or key store fails
    #[tracing::instrument(parent = &self.span, skip_all)]
    pub async fn commit_delete(&self, token: &[u8]) -> Result<()> {
        let record = self.cache.take(token).await?;
        let Some(public_key) = record.public_key else {
            tracing::debug!("registration challenge presented as a revocation token");
            return Err(VeyError::NotFound);
        };

        self.store.delete(&record.email_digest, &public_key).await?;
        tracing::info!(key_type = %public_key.key_type, "public key revoked");
        Ok(())
    }

    /// Checks that both backends are reachable.
    ///
    /// # Errors
    ///
    /// Returns [`VeyError::Internal`] naming the first backend that failed.
    #[tracing::instrument(parent = &self.span, skip_all)]
    pub async fn health_check(&self) -> Result<()> {
        self.cache
            .health_check()
            .await
            .map_err(|err| VeyError::unhealthy("challenge cache", err))?;
        self.store.health_check().await.map_err(|err| VeyError::unhealthy("key store", err))?;
        Ok(())
    }

    async fn issue(&self, record: PendingRecord) -> Result<Token> {
        let token = generate_token()?;
        self.cache.set(token.as_bytes(), record, self.challenge_ttl).await?;
        tracing::debug!(ttl = ?self.challenge_ttl, "challenge issued");
        Ok(token)
    }
}

impl std::fmt::Debug for Vey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vey").field("challenge_ttl", &self.challenge_ttl).finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vey_authn::HmacDigester;
    use vey_storage::{MemoryChallengeCache, MemoryKeyStore};

    use super::*;

    fn builder_inputs() -> (Arc<dyn Digester>, Arc<dyn ChallengeCache>, Arc<dyn KeyStore>) {
        (
            Arc::new(HmacDigester::new("salt").unwrap()),
            Arc::new(MemoryChallengeCache::new()),
            Arc::new(MemoryKeyStore::new()),
        )
    }

    #[test]
    fn test_defaults() {
        let (digester, cache, store) = builder_inputs();
        let vey = Vey::builder().digester(digester).cache(cache).store(store).build().unwrap();
        assert_eq!(vey.challenge_ttl(), DEFAULT_CHALLENGE_TTL);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let (digester, cache, store) = builder_inputs();
        let result = Vey::builder()
            .digester(digester)
            .cache(cache)
            .store(store)
            .challenge_ttl(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidValue { field: "challenge_ttl", .. })));
    }

    #[test]
    fn test_debug_omits_collaborators() {
        let (digester, cache, store) = builder_inputs();
        let vey = Vey::builder().digester(digester).cache(cache).store(store).build().unwrap();
        assert!(format!("{vey:?}").starts_with("Vey { challenge_ttl: 900s"));
    }
}
