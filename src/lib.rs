//! Orrery - authorization graph builder for the inventory service
//!
//! This library models one application's permissions, resources, identities,
//! and entitlements as an in-memory graph, renders the graph as a canonical
//! JSON document, and publishes it. It exposes all modules for testing
//! purposes.

pub mod errors;
pub mod graph;
pub mod ingest;
pub mod publisher;
pub mod records;
pub mod settings;
