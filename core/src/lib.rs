pub mod account;
pub mod audit;
pub mod authorization;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod notification;
pub mod request;
pub mod store;
pub mod types;
