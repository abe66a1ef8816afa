pub mod classifier;
pub mod encoder;
pub mod gateway;
pub mod gemini;
pub mod previews;
