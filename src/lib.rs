//! Lead intake — classifies contact-form submissions, auto-replies to good
//! leads and keeps a CSV log of everything worth following up.

pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod server;
