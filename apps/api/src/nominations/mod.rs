pub mod dedup;
pub mod handlers;
pub mod storage;

pub use storage::NominationStore;
