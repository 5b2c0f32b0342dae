mod config_store;
mod entry;

pub use config_store::*;
pub use entry::*;
