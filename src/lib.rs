pub mod app;
pub mod collector;
pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod output;
pub mod table;
