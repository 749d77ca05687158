pub mod box_record;

pub use box_record::{BoxRecord, BoxWithCount};
