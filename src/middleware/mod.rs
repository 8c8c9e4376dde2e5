//! Middleware implementations for route groups.
//!
//! The [`Middleware`] trait itself lives with the router abstraction; this
//! module holds the concrete middleware the gateway wires into its groups.
//!
//! [`Middleware`]: crate::router::Middleware

pub mod auth;

pub use auth::RequireAuth;
