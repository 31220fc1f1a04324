pub mod bridge;
pub mod oneshot;
