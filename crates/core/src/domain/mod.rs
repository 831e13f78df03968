pub mod metrics;
pub mod posting;
pub mod role;
