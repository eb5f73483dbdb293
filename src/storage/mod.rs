//! Durable storage for the form being edited

mod local;
mod memory;
mod traits;

pub use local::JsonFileStorage;
pub use memory::MemoryStorage;
pub use traits::FormStorage;

#[cfg(test)]
pub use traits::MockFormStorage;
