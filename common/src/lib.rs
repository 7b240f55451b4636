//! Minibank Common Types
//!
//! This crate contains shared types used across the minibank ledger,
//! including account identifiers, monetary primitives, request validation
//! and the error taxonomy.

pub mod identifiers;
pub mod monetary;
pub mod request;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use request::*;
pub use error::*;
pub use time::*;
