//! Request limits.
//!
//! # Responsibilities
//! - Cap the size of an inbound request frame
//! - Strip the padding some clients append to fixed-size frames
//!
//! # Design Decisions
//! - Frames are read once; a frame past the cap is refused, never truncated
//! - Limits checked before parsing (early rejection)

/// Largest request frame accepted, in bytes.
pub const MAX_PAYLOAD_SIZE: usize = 1024;

/// Remove trailing NUL padding from a received frame.
pub fn strip_padding(frame: &[u8]) -> &[u8] {
    let end = frame
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    &frame[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_only_trailing_nuls() {
        assert_eq!(strip_padding(b"abc\0\0\0"), b"abc");
        assert_eq!(strip_padding(b"a\0c"), b"a\0c");
        assert_eq!(strip_padding(b"\0\0"), b"");
        assert_eq!(strip_padding(b""), b"");
        assert_eq!(strip_padding(b"query \n"), b"query \n");
    }
}
