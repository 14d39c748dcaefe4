pub mod client;

pub use client::BitfinexClient;
