//! Engine-neutral request handlers.
//!
//! Handlers take `(AppState, GatewayRequest)` and return a
//! `GatewayResult<GatewayResponse>`; they are bound to routes in
//! `routes::build_router` and never see engine-specific types. Handlers on
//! protected routes assume authentication has already succeeded — the auth
//! middleware halts unauthenticated requests before they get here.

mod meta;
mod todos;

pub use meta::{buildinfo, healthz, limitz, tokenz};
pub use todos::{create_todo, delete_todo, list_todos};
