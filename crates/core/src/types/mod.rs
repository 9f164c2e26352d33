//! Core type definitions for the contact router.
//!
//! Broken down into submodules by concern.

pub mod cache;
pub mod catalog;
pub mod decision;
pub mod inference;
pub mod turn;

pub use cache::*;
pub use catalog::*;
pub use decision::*;
pub use inference::*;
pub use turn::*;
