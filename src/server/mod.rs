//! HTTP surface: the contact-form webhook plus health and diagnostics.

pub mod routes;

pub use routes::{AppState, ContactForm, app_routes, mask_secret};
