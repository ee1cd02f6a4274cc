pub mod handlers;
pub mod lifecycle;
pub mod storage;

pub use storage::RewardCycleStore;
