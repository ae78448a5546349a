#![forbid(unsafe_code)]

//! `hablemos` — Spanish practice server.
//!
//! Tutor chat, journal corrections, adaptive conjugation drills and an
//! e-book shelf behind one JSON HTTP API.

pub mod chat;
pub mod config;
pub mod conjugation;
pub mod errors;
pub mod http;
pub mod journal;
pub mod library;
pub mod llm;
pub mod models;
pub mod persistence;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
