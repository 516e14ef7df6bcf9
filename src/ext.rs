//! Public extension contracts.
//!
//! The crate never renders UI; hosts implement these traits to connect session events to their
//! own routing.

pub mod navigator;

pub use navigator::*;
