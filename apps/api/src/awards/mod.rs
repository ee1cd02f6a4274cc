pub mod handlers;
pub mod storage;

pub use storage::AwardStore;
