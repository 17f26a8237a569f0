pub mod lifecycle;
pub mod schedule;

pub use lifecycle::TokenLifecycle;
pub use schedule::LifecycleState;
