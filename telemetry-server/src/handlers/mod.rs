//! HTTP handlers

pub mod health;
pub mod view;
pub mod status;
pub mod ingest;
pub mod report;
