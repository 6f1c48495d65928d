//! sitecost: construction cost estimation.
//!
//! The crate is organised around four components:
//!
//! - [`pricing`]: regional coefficient bundles, quality tier rates, concrete
//!   grades and the server-side material/labor catalog.
//! - [`estimation`]: the quantity and cost derivation modes (construction
//!   cost, concrete slab, raw materials, paint, ready-mix, detailed
//!   breakdown, bricks).
//! - [`chat`]: the keyword intent classifier and its canned replies.
//! - [`client`]: the REST client, session persistence and estimate store.
//!
//! [`server`] and [`db`] provide the `/api` service the client talks to.

pub mod chat;
pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod estimation;
pub mod pricing;
pub mod server;
