pub mod adapters;
pub mod config;
pub mod error;
pub mod service;

#[cfg(test)]
mod testing;

pub use service::AudiobookService;
