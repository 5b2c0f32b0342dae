//! Authoritative configuration providers.
//!
//! The store never caches what a source says: every refresh asks the source
//! again, so a source only has to answer "what is the value of this key now".

mod layered;
mod memory;

pub use layered::*;
pub use memory::*;


use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Result;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConfigSource: Send + Sync + 'static {
    /// Resolves the current value of `key`.
    ///
    /// Returns `Ok(None)` when the source does not define the key and
    /// `Err(Error::Refresh(..))` when the source could not be consulted.
    async fn resolve(
        &self,
        key: &str,
    ) -> Result<Option<String>>;
}
