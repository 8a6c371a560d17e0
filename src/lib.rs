//! Core of a text-entry study: ambiguous-key word candidates and the
//! session/trial sequencing that runs participants through each keyboard.
//!
//! The binary in `main.rs` is a thin line-driven front end over [`app::StudyApp`].

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod keyboard;
pub mod session;
pub mod store;
