pub mod allocator;
pub mod controller;
pub mod sweeper;

pub use allocator::{SessionIdAllocator, DEFAULT_ALLOCATION_TIMEOUT};
pub use controller::SessionController;
pub use sweeper::EvictionSweeper;
