mod change_notifier;
mod recent_events;

pub use change_notifier::*;
pub(crate) use recent_events::*;
