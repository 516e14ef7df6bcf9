//! Bearer token models: redacted secrets, persisted credentials, and decoded claims.

pub mod claims;
pub mod credential;
pub mod secret;
