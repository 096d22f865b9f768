//! Azure Gateway Core Library
//! Route table, request translation and paced SSE relay for an
//! OpenAI-to-Azure OpenAI gateway

pub mod config;
pub mod proxy;
