//! Small helpers shared across clients.
pub mod hashtags;
