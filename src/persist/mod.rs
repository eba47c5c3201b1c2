pub mod codec;
pub mod migrate;
pub mod slot;

pub use codec::{decode, empty_payload, encode, PersistedState};
pub use migrate::CURRENT_VERSION;
pub use slot::{FileSlot, MemorySlot, StorageSlot};
