//! # doclog testkit
//!
//! Test utilities for doclog.
//!
//! This crate provides:
//! - Sample payloads with handlers, and a registry that installs them
//! - Gateway fixtures over memory and journal stores
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use doclog_testkit::prelude::*;
//!
//! #[test]
//! fn chain_of_three() {
//!     let gateway = TestGateway::memory();
//!     let ids = push_chain(&gateway, 3);
//!     assert_eq!(gateway.store().document_count().unwrap(), ids.len());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod payloads;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::payloads::*;
}

pub use fixtures::*;
pub use generators::*;
pub use payloads::*;
