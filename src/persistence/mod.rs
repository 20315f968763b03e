//! Persistence adapters.
//!
//! - [`LocalSlot`]: the whole item array in one JSON file, rewritten after
//!   every mutation.
//! - [`RemoteClient`] + [`Subscription`]: one HTTP write per mutation against
//!   the document store server, reads pushed over a WebSocket.
//!
//! Which one is used is a configuration choice, see [`Backend`].

pub mod local;
pub mod remote;
pub mod subscription;

pub use local::{LocalSlot, LocalSlotError, SLOT_KEY};
pub use remote::{RemoteClient, RemoteError};
pub use subscription::{Subscription, SubscriptionEvent};

/// The persistence backend an app instance writes to.
#[derive(Debug, Clone)]
pub enum Backend {
    Local(LocalSlot),
    Remote { client: RemoteClient, list_id: String },
}

impl Backend {
    pub fn is_remote(&self) -> bool {
        matches!(self, Backend::Remote { .. })
    }

    /// Short description for status output.
    pub fn describe(&self) -> String {
        match self {
            Backend::Local(slot) => format!("local ({})", slot.path().display()),
            Backend::Remote { client, list_id } => {
                format!("remote ({}, list {})", client.base_url(), list_id)
            }
        }
    }
}
