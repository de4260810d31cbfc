pub mod config;
pub mod error;
pub mod layers;
pub mod queries;
pub mod router;
pub mod state;
pub mod test_server;
pub mod web_assets;

#[cfg(test)]
pub mod tests;
