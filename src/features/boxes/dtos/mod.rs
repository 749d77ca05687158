pub mod box_dto;

pub use box_dto::{
    BoxDetailDto, BoxResponseDto, BoxStatus, CreateBoxDto, QrCodeResponseDto, UpdateBoxDto,
};
