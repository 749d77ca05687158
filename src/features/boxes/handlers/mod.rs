pub mod box_handler;

pub use box_handler::*;
