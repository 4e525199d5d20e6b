//! Courier - incremental request and multipart upload receiver
//!
//! Core library for line buffering, request-line parsing and streaming uploads.

pub mod config;
pub mod http;
pub mod server;
