//! HTTP API: a thin JSON wrapper around the stock engine.

pub mod app;
