pub mod admin;
pub mod engine;
pub mod error;
pub mod pattern;
pub mod rule;
