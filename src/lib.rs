pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod wizard;

pub use router::{build_router, AppState};
