//! Storage module for uploaded file content
//!
//! Provides a local-directory store keyed by generated, unguessable
//! filenames. The storage key doubles as the public file-access identifier.

mod local_store;

pub use local_store::LocalStore;
