//! Shared render caches.
//!
//! Both live on the `Bundler` and are shared by every bundle it creates.

mod content;
mod registry;

pub use content::{CacheEntry, CacheKey, ContentCache};
pub use registry::{RegistryEntry, RegistryStore};
