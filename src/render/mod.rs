//! Rendering of the dashboard view.

pub mod html;

pub use html::render_html_dashboard;
