pub mod client;

pub use client::{AzureClient, BackendOperation};
