pub mod adapters;
pub mod cache;
pub mod config;
pub mod error;
pub mod session;
pub mod sync;

#[cfg(test)]
mod testing;
