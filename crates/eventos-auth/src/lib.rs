//! # eventos-auth
//!
//! Credential lifecycle for the eventos services.
//!
//! This crate provides:
//! - HS256 token issuance and validation over a shared base64 secret
//! - A self-renewing single-slot token cache with proactive renewal
//! - Concrete fetchers for the external catalog login and the inter-service
//!   token endpoint
//! - An outbound HTTP client that attaches the cached bearer token and
//!   recovers from a single 401 per request
//!
//! ## Modules
//!
//! - [`cache`] - Token cache and the `CredentialFetcher` seam
//! - [`client`] - Bearer-attaching HTTP client with 401 recovery
//! - [`config`] - Auth configuration sections
//! - [`fetcher`] - Concrete upstream fetchers
//! - [`token`] - Issuance, validation and payload introspection

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod token;

pub use cache::{Credential, CredentialFetcher, TokenCache, TokenCacheConfig};
pub use client::AuthenticatingClient;
pub use config::{AuthConfig, CacheTuning, ExternalAuthConfig};
pub use error::AuthError;
pub use fetcher::{LoginCredentialFetcher, ServiceTokenFetcher};
pub use token::{ApiClaims, TOKEN_SUBJECT, TokenIssuer, TokenValidator};
