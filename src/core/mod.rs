pub mod app;
pub mod assistant;
pub mod config;
pub mod message;
pub mod models;
pub mod session;
pub mod validator;
