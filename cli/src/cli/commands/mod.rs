pub mod models;
pub mod start;
pub mod status;
