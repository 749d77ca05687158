pub mod public_handler;

pub use public_handler::*;
