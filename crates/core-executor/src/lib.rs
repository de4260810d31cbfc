pub mod codec;
pub mod engine;
pub mod error;
pub mod lease;
pub mod models;
pub mod service;
pub mod stream;
pub mod utils;

#[cfg(test)]
pub mod tests;
