//! Common library for the snippetbox workspace
//!
//! This crate provides shared infrastructure used by the services: the
//! PostgreSQL pool, the Redis client and their error types.

pub mod cache;
pub mod database;
pub mod error;
