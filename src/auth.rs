//! Auth-domain identifiers, bearer credentials, decoded claims, and the cached principal.

pub mod id;
pub mod principal;
pub mod token;

pub use id::*;
pub use principal::*;
pub use token::{claims::*, credential::*, secret::*};
