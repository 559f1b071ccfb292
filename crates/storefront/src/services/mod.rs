//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Customer Account OAuth 2.0 + PKCE session manager
//! - `kv` - Key-value store REST client
//! - `filters` - Vehicle filter lists loaded from KV
//! - `redirects` - Legacy URL redirects loaded from KV

pub mod auth;
pub mod filters;
pub mod kv;
pub mod redirects;
