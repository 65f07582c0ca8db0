//! gradient-revision — revision lifecycle management.
//!
//! # Components
//!
//! - **`manager`** — listing, classification, previous/latest resolution,
//!   retention cleanup
//! - **`error`** — revision lifecycle error types

pub mod error;
pub mod manager;

pub use error::{RevisionError, RevisionResult};
pub use manager::{RevisionInfo, RevisionManager};
