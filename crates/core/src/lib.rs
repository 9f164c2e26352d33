#![deny(unused)]
//! Core types, traits, and error definitions for the contact router.
//!
//! This crate provides the building blocks shared by the text and voice
//! routing paths: the destination catalog, cache entries and fingerprints,
//! the tagged routing outcomes, and the seams to the inference backend,
//! the answer store and the intent corpus.

pub mod config;
pub mod error;
pub mod mocks;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::*;
pub use types::*;
