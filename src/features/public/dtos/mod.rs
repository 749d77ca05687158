pub mod public_dto;

pub use public_dto::{BoxStatsDto, PublicBoxDto};
