pub mod public_service;

pub use public_service::PublicService;
