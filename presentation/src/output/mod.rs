//! Meeting report formatting

pub mod console;
pub mod formatter;
