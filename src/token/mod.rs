pub mod builder;
pub mod handle;

pub use builder::TokenBuilder;
pub use handle::TokenHandle;
