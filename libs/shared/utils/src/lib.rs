pub mod files;
pub mod hours;
pub mod string;
pub mod test_utils;

pub use files::timestamped_filename;
pub use hours::{format_hours, round_to_quarter};
pub use string::{slugify, unique_id};
