//! HTTP handlers

pub mod health;
pub mod drift;
pub mod models;
