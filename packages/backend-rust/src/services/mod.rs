pub mod plan;
pub mod review;
pub mod stats;
