//! services/api/src/lib.rs
//!
//! HTTP service for job positions: Postgres adapter, JWT verification and
//! the axum router. The binaries in `src/bin` are thin wrappers around it.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
