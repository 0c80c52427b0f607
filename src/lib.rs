//! Entity embedding evaluation library
//!
//! Compares ways of building an entity vector from its abstract against a
//! reference built from the entities the abstract links to.

pub mod benchmark;
pub mod config;
pub mod corpus;
pub mod embedders;
pub mod resource_monitor;
