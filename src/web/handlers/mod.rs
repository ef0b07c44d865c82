pub mod games;
pub mod recommendations;
pub mod search;
pub mod stats;
