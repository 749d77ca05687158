pub mod auth;
pub mod boxes;
pub mod entries;
pub mod files;
pub mod public;
