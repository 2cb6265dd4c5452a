pub mod article;
pub mod client;
pub mod quote;
