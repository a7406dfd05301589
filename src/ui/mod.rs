pub mod format;
mod layout;

pub use format::{format_latency, format_rate, PLACEHOLDER};
pub use layout::draw_ui;
