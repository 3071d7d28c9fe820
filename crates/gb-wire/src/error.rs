use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("wire buffer overflow: {needed} more bytes needed at offset {offset}, capacity {capacity}")]
    Overflow {
        offset: usize,
        needed: usize,
        capacity: usize,
    },
    #[error("wire record truncated: wanted {wanted} bytes at offset {offset}")]
    Truncated { offset: usize, wanted: usize },
    #[error("invalid {what} tag {tag}")]
    InvalidTag { what: &'static str, tag: u8 },
    #[error("invalid code point {0:#x} in wire string")]
    InvalidCodePoint(i32),
}
