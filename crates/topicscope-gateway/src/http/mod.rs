mod client;
mod wire;

pub use client::{HttpBackend, HttpBackendBuilder};
