// Core infrastructure modules
pub mod core;

// Feature-specific modules
pub mod config;
pub mod repl;
pub mod session;

#[cfg(test)]
mod test_utils;
