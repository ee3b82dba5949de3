pub mod traits;

// Snapshot store implementations
#[cfg(not(target_arch = "wasm32"))]
pub mod file;
pub mod remote;
