//! Terminal diagnostics for download speed and camera access.
//!
//! [`speedtest`] times a HEAD request and a streamed download against a fixed
//! payload URL and reports a simulated upload figure alongside. [`camera`]
//! acquires a capture device, binds it to a preview and guarantees release.

pub mod app;
pub mod camera;
pub mod cli;
pub mod error;
pub mod headless;
pub mod logger;
pub mod settings;
pub mod speedtest;
pub mod ui;
