pub mod bitrev;
pub mod carryover;
pub mod channel;
pub mod models;
pub mod writer;
