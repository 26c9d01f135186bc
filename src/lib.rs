// Library module for hashr
// Re-exports modules for use in integration tests and the binary

pub mod cli;
pub mod hash;
