//! Proxy module - OpenAI-shaped gateway in front of Azure OpenAI deployments

pub mod error;
pub mod gateway;
pub mod handlers;
pub mod relay;
pub mod route_table;
pub mod server;
pub mod upstream;

pub use error::GatewayError;
pub use relay::SseRelay;
pub use route_table::RouteTable;
pub use server::{build_router, AppState, GatewayServer};
pub use upstream::{AzureClient, BackendOperation};
