pub mod catalog;
pub mod cli;
pub mod config;
pub mod export;
pub mod reconcile;
pub mod selection;
pub mod store;
