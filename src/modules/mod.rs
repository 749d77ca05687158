//! Modules layer - Infrastructure components for external integrations
//!
//! Contains adapters for resources outside the database, currently the
//! local upload directory.

pub mod storage;
