//! # OpsDesk API Server Library
//!
//! HTTP surface of the OpsDesk helpdesk backend.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: environment-driven configuration
//! - `error`: unified error type and HTTP response mapping
//! - `middleware`: security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
