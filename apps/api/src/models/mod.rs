pub mod admin;
pub mod award;
pub mod endorsement;
pub mod nomination;
pub mod reward_cycle;
pub mod team;
