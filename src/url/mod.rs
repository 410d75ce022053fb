//! URL handling module for CCR-Corpus
//!
//! This module provides URL normalization (the identity key used by the
//! frontier and the record log) and link classification into navigation,
//! content, and ignored URLs.

mod classify;
mod normalize;

pub use classify::{LinkClass, LinkClassifier};
pub use normalize::normalize_url;
