// Handlers module
pub mod info;
pub mod openai;
