//! Transport-agnostic request handling: protocol steps plus delivery.

use vey_storage::PublicKey;

use crate::{
    error::{Result, VeyError},
    notify::Notifier,
    service::Vey,
};

/// Pairs a [`Vey`] with a [`Notifier`] so that each begin step also
/// delivers its challenge or token to the address owner.
///
/// A transport layer maps its requests onto these methods one-to-one.
/// Issued values never pass back through the return values of the
/// `request_*` methods; the owner can only learn them from the delivery.
///
/// ```
/// use std::sync::Arc;
///
/// use vey::{KeyServer, MemoryNotifier, Vey};
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
/// let inbox = MemoryNotifier::new();
/// let server = KeyServer::new(vey, inbox.clone());
///
/// server.request_put("test@example.com").await.unwrap();
/// assert!(inbox.last_challenge().is_some());
/// # });
/// ```
#[derive(Clone, Debug)]
pub struct KeyServer<N> {
    vey: Vey,
    notifier: N,
}

impl<N: Notifier> KeyServer<N> {
    /// Creates a server delivering through `notifier`.
    #[must_use]
    pub fn new(vey: Vey, notifier: N) -> Self {
        Self { vey, notifier }
    }

    /// Returns the underlying orchestrator.
    #[must_use]
    pub fn vey(&self) -> &Vey {
        &self.vey
    }

    /// Returns the notifier.
    #[must_use]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Returns the keys registered for `email`.
    ///
    /// # Errors
    ///
    /// See [`Vey::get_keys`].
    pub async fn get_keys(&self, email: &str) -> Result<Vec<PublicKey>> {
        self.vey.get_keys(email).await
    }

    /// Issues a registration challenge and sends it to `email`.
    ///
    /// # Errors
    ///
    /// Any error of [`Vey::begin_put`], or [`VeyError::Notify`] if delivery
    /// fails. A failed delivery leaves the challenge to expire unused.
    pub async fn request_put(&self, email: &str) -> Result<()> {
        let challenge = self.vey.begin_put(email).await?;
        self.notifier.send_challenge(email, &challenge).await.map_err(VeyError::from)
    }

    /// Registers `public_key` against the identity bound to `challenge`.
    ///
    /// # Errors
    ///
    /// See [`Vey::commit_put`].
    pub async fn confirm_put(
        &self,
        challenge: &[u8],
        signature: &[u8],
        public_key: &PublicKey,
    ) -> Result<()> {
        self.vey.commit_put(challenge, signature, public_key).await
    }

    /// Issues a revocation token for `public_key` and sends it to `email`.
    ///
    /// # Errors
    ///
    /// Any error of [`Vey::begin_delete`], or [`VeyError::Notify`] if
    /// delivery fails.
    pub async fn request_delete(&self, email: &str, public_key: &PublicKey) -> Result<()> {
        let token = self.vey.begin_delete(email, public_key).await?;
        self.notifier.send_token(email, &token).await.map_err(VeyError::from)
    }

    /// Revokes the key bound to `token`.
    ///
    /// # Errors
    ///
    /// See [`Vey::commit_delete`].
    pub async fn confirm_delete(&self, token: &[u8]) -> Result<()> {
        self.vey.commit_delete(token).await
    }

    /// Checks that both backends are reachable.
    ///
    /// # Errors
    ///
    /// See [`Vey::health_check`].
    pub async fn health_check(&self) -> Result<()> {
        self.vey.health_check().await
    }
}
