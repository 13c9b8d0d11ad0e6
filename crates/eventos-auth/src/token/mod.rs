//! Token primitives: issuance, validation and signature-free introspection.

pub mod codec;
pub mod jwt;

pub use jwt::{ApiClaims, TOKEN_SUBJECT, TokenIssuer, TokenValidator};
