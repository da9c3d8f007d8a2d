//! # smelter-core
//!
//! Core infrastructure for the smelter corpus tools.
//!
//! Provides shared abstractions for:
//! - Error taxonomy (`SmelterError`, `Result`)
//! - Content hashing (md5 digests, xxh3 feature hashing)

pub mod error;
pub mod hashing;

pub use error::{Result, SmelterError};
pub use hashing::{hash64, HashFunction, Md5Hasher, XxHash3};
