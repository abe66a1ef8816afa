pub mod config;
pub mod error;
pub mod gallery;
pub mod gemini;
pub mod image;
pub mod outcome;
