pub mod backend;
pub mod cache;
pub mod index;
pub mod store;

pub use backend::FileBackend;
pub use cache::FifoCache;
pub use index::{IndexEntry, ShadowFilter, ShadowIndex};
pub use store::{DeathContext, ShadowStore};
