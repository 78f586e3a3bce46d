//! # Vey
//!
//! An email-verified public key registry. A user registers a public key
//! against an email address by proving control of both the inbox and the
//! private key, and later revokes it by proving control of the inbox.
//!
//! ## Protocol
//!
//! ```text
//!   begin_put(email) ──► challenge ──(email)──► owner signs challenge
//!                                                       │
//!   commit_put(challenge, signature, key) ◄─────────────┘
//!
//!   begin_delete(email, key) ──► token ──(email)──► owner returns token
//!                                                       │
//!   commit_delete(token) ◄──────────────────────────────┘
//! ```
//!
//! Challenges and tokens are single-use and expire after the configured
//! lifetime. Identities are stored only as salted digests of the address.
//!
//! ## Crates
//!
//! - [`vey_storage`]: challenge cache and key store contracts, in-memory backends
//! - [`vey_storage_mongo`]: MongoDB backends
//! - [`vey_authn`]: email validation, digests, tokens and signature verification
//! - `vey` (this crate): the orchestrator, notifiers and configuration
//!
//! ## Example
//!
//! ```
//! use vey::{KeyServer, MemoryNotifier, Vey, VeyConfig};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let config = VeyConfig::builder().salt("salt").build().unwrap();
//! let vey = Vey::from_config(&config).await.unwrap();
//! let server = KeyServer::new(vey, MemoryNotifier::new());
//!
//! server.request_put("test@example.com").await.unwrap();
//! let challenge = server.notifier().last_challenge().unwrap();
//! // The owner signs `challenge.as_bytes()` and calls `confirm_put`.
//! # let _ = challenge;
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod config;
pub mod error;
pub mod notify;
pub mod server;
pub mod service;

pub use backend::{Backends, build_backends};
pub use config::{BackendConfig, VeyConfig};
pub use error::{Result, VeyError};
pub use notify::{Deliveries, LoggingNotifier, MemoryNotifier, Notifier, NotifyError, NullNotifier};
pub use server::KeyServer;
pub use service::{DEFAULT_CHALLENGE_TTL, Vey};
pub use vey_authn::Token;
pub use vey_storage::{PublicKey, PublicKeyType};
