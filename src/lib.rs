pub mod client;
pub mod config;
pub mod exchange_rate;
pub mod handler;
pub mod quote;
pub mod recorder;
pub mod server;
pub mod store;
pub mod upstream;

#[cfg(test)]
mod testing;
