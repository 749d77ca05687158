pub mod box_service;

pub use box_service::BoxService;
