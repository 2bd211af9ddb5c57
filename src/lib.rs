#![doc = include_str!("../README.md")]

mod cache;
mod error;
mod slab;
#[cfg(feature = "sync")]
mod sync;

pub use cache::SieveCache;
pub use error::{Result, SieveError};
#[cfg(feature = "sync")]
pub use sync::SyncSieveCache;
