//! Headlines - A Personalized News Portal
//!
//! This crate serves a single page combining the headlines of a chosen
//! publication, the current weather for a chosen city and a currency
//! conversion rate. Choices are remembered in cookies.

pub mod config;
pub mod currency;
pub mod error;
pub mod http;
pub mod news;
pub mod preferences;
pub mod routes;
pub mod weather;

pub use error::{Error, Result};
