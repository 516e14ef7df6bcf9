//! Platform-scoped RBAC directory: users, roles, permissions, and platforms.

pub mod client;
pub mod models;
pub mod scope;

pub use client::*;
pub use models::*;
pub use scope::*;
