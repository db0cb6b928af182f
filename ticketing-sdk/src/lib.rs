//! Shared request and response objects for the event ticketing pool.
//!
//! Everything in here is transport neutral: the core services consume the
//! request types and produce [`objects::Outcome`] values, and any outer
//! layer (CLI, HTTP, RPC) only has to serialize them.

pub mod credentials;
pub mod objects;
