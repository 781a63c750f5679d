pub mod chat_turn;
pub mod rest;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the router and the OpenAPI definition for the binaries.
pub use rest::{api_router, ApiDoc};
