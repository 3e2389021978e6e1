pub mod alerts;
pub mod api;
pub mod config;
pub mod facade;
pub mod poller;
pub mod store;

pub mod error;
