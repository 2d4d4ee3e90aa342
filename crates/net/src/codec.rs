//! Demo file encoding and decoding.
//!
//! A demo starts with a header line holding the forced track number as ASCII
//! decimal (`"-1\n"` when no track is forced), followed by frames:
//!
//! ```text
//! [length: i32 LE][pitch: f32 LE][yaw: f32 LE][roll: f32 LE][payload: length bytes]
//! ```

use demoreel_core::{NetMessage, ViewAngles, MAX_MSGLEN};
use std::io::{self, Read, Write};
use thiserror::Error;
use tracing::debug;

/// Header value meaning "no forced track".
pub const NO_FORCED_TRACK: i32 = -1;

/// Default bound on the header line, newline included.
pub const DEFAULT_MAX_HEADER_LEN: usize = 32;

/// Bytes preceding the payload in every frame.
pub const FRAME_HEADER_LEN: usize = 16;

/// Errors produced while reading the header line.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// Underlying read failed.
    #[error("failed to read demo header: {0}")]
    Io(#[from] io::Error),
    /// The file ended before the header newline.
    #[error("demo header ended before its newline")]
    Truncated,
    /// No newline within the allowed header length.
    #[error("demo header is not terminated within {limit} bytes")]
    Unterminated {
        /// Maximum header length that was scanned.
        limit: usize,
    },
    /// A byte other than a digit, a leading `-` or the newline.
    #[error("unexpected byte {byte:#04x} in demo header")]
    InvalidByte {
        /// The offending byte.
        byte: u8,
    },
    /// The header line has no digits.
    #[error("demo header holds no track number")]
    Empty,
    /// The track number does not fit in an `i32`.
    #[error("demo header track number is out of range")]
    Overflow,
}

/// Errors produced while reading or writing a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// A length prefix outside `0..=MAX_MSGLEN`.
    ///
    /// On read this means the file is corrupt; nothing after it can be trusted.
    #[error("demo message length {len} is outside 0..={max}", max = MAX_MSGLEN)]
    InvalidLength {
        /// Length as found (or as requested, when writing).
        len: i64,
    },
    /// Underlying I/O failed.
    #[error("demo frame I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl FrameError {
    /// Corruption that must not be tolerated by continuing to read.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidLength { .. })
    }
}

/// One decoded demo frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoFrame {
    /// View orientation recorded alongside the message.
    pub view_angles: ViewAngles,
    /// The recorded protocol message.
    pub message: NetMessage,
}

/// Write the header line for `track`.
pub fn write_header<W: Write>(writer: &mut W, track: i32) -> io::Result<()> {
    writeln!(writer, "{track}")?;
    writer.flush()
}

/// Read the header line, returning the forced track.
///
/// Bytes are consumed one at a time up to and including the newline, so the
/// reader is left positioned on the first frame. At most `max_len` bytes are
/// examined.
pub fn read_header<R: Read>(reader: &mut R, max_len: usize) -> Result<i32, HeaderError> {
    let mut negative = false;
    let mut digits = 0usize;
    let mut value: i64 = 0;
    let mut byte = [0u8; 1];

    for position in 0..max_len {
        if !read_or_eof(reader, &mut byte)? {
            return Err(HeaderError::Truncated);
        }
        match byte[0] {
            b'\n' => {
                if digits == 0 {
                    return Err(HeaderError::Empty);
                }
                let signed = if negative { -value } else { value };
                return i32::try_from(signed).map_err(|_| HeaderError::Overflow);
            }
            b'-' if position == 0 => negative = true,
            digit @ b'0'..=b'9' => {
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(i64::from(digit - b'0')))
                    .filter(|v| *v <= i64::from(i32::MAX) + 1)
                    .ok_or(HeaderError::Overflow)?;
                digits += 1;
            }
            other => return Err(HeaderError::InvalidByte { byte: other }),
        }
    }

    Err(HeaderError::Unterminated { limit: max_len })
}

/// Write one frame and flush it.
///
/// Payloads longer than [`MAX_MSGLEN`] are refused before anything is written.
pub fn write_frame<W: Write>(
    writer: &mut W,
    payload: &[u8],
    view_angles: ViewAngles,
) -> Result<(), FrameError> {
    if payload.len() > MAX_MSGLEN {
        return Err(FrameError::InvalidLength {
            len: payload.len() as i64,
        });
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as i32).to_le_bytes());
    for angle in view_angles.to_array() {
        frame.extend_from_slice(&angle.to_le_bytes());
    }
    frame.extend_from_slice(payload);

    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Read the next frame.
///
/// Returns `Ok(None)` when the stream ends, whether cleanly between frames or
/// in the middle of a truncated one. A length prefix outside
/// `0..=MAX_MSGLEN` is reported as [`FrameError::InvalidLength`].
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<DemoFrame>, FrameError> {
    let mut prefix = [0u8; 4];
    if !read_or_eof(reader, &mut prefix)? {
        return Ok(None);
    }

    // Checked before anything else is read, so a corrupt prefix is never mistaken for EOF.
    let len = i32::from_le_bytes(prefix);
    if len < 0 || len as usize > MAX_MSGLEN {
        return Err(FrameError::InvalidLength {
            len: i64::from(len),
        });
    }

    let mut angle_bytes = [0u8; FRAME_HEADER_LEN - 4];
    if !read_or_eof(reader, &mut angle_bytes)? {
        debug!(len, "demo frame truncated in view angles");
        return Ok(None);
    }
    let mut angles = [0f32; 3];
    for (i, chunk) in angle_bytes.chunks_exact(4).enumerate() {
        angles[i] = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    let mut payload = vec![0u8; len as usize];
    if !read_or_eof(reader, &mut payload)? {
        debug!(len, "demo frame truncated");
        return Ok(None);
    }

    let message = NetMessage::new(payload).map_err(|_| FrameError::InvalidLength {
        len: i64::from(len),
    })?;

    Ok(Some(DemoFrame {
        view_angles: ViewAngles::from_array(angles),
        message,
    }))
}

/// Fill `buf` completely, or report `false` if the stream ends first.
fn read_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demoreel_core::SVC_DISCONNECT;
    use std::io::Cursor;

    fn header_of(input: &[u8]) -> Result<i32, HeaderError> {
        read_header(&mut Cursor::new(input), DEFAULT_MAX_HEADER_LEN)
    }

    #[test]
    fn test_header_roundtrip_negative_track() {
        let mut buf = Vec::new();
        write_header(&mut buf, -5).unwrap();
        assert_eq!(buf, b"-5\n");
        assert_eq!(header_of(&buf).unwrap(), -5);
    }

    #[test]
    fn test_header_roundtrip_no_track() {
        let mut buf = Vec::new();
        write_header(&mut buf, NO_FORCED_TRACK).unwrap();
        assert_eq!(header_of(&buf).unwrap(), NO_FORCED_TRACK);
    }

    #[test]
    fn test_header_leaves_reader_on_first_frame() {
        let mut cursor = Cursor::new(b"12\nrest".to_vec());
        assert_eq!(read_header(&mut cursor, 8).unwrap(), 12);
        let mut rest = String::new();
        cursor.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "rest");
    }

    #[test]
    fn test_header_extremes() {
        assert_eq!(header_of(b"2147483647\n").unwrap(), i32::MAX);
        assert_eq!(header_of(b"-2147483648\n").unwrap(), i32::MIN);
        assert!(matches!(header_of(b"2147483648\n"), Err(HeaderError::Overflow)));
        assert!(matches!(
            header_of(b"99999999999999999999999\n"),
            Err(HeaderError::Overflow)
        ));
    }

    #[test]
    fn test_header_rejects_malformed_lines() {
        assert!(matches!(header_of(b""), Err(HeaderError::Truncated)));
        assert!(matches!(header_of(b"17"), Err(HeaderError::Truncated)));
        assert!(matches!(header_of(b"\n"), Err(HeaderError::Empty)));
        assert!(matches!(header_of(b"-\n"), Err(HeaderError::Empty)));
        assert!(matches!(
            header_of(b"1-2\n"),
            Err(HeaderError::InvalidByte { byte: b'-' })
        ));
        assert!(matches!(
            header_of(b" 3\n"),
            Err(HeaderError::InvalidByte { byte: b' ' })
        ));
    }

    #[test]
    fn test_header_is_bounded() {
        let long = vec![b'0'; 64];
        assert!(matches!(
            read_header(&mut Cursor::new(long), 16),
            Err(HeaderError::Unterminated { limit: 16 })
        ));
    }

    #[test]
    fn test_frame_layout() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &[0xAA, 0xBB], ViewAngles::new(1.0, -2.5, 0.0)).unwrap();

        assert_eq!(buf.len(), FRAME_HEADER_LEN + 2);
        assert_eq!(&buf[0..4], &2i32.to_le_bytes());
        assert_eq!(&buf[4..8], &1.0f32.to_le_bytes());
        assert_eq!(&buf[8..12], &(-2.5f32).to_le_bytes());
        assert_eq!(&buf[12..16], &0.0f32.to_le_bytes());
        assert_eq!(&buf[16..], &[0xAA, 0xBB]);
    }

    #[test]
    fn test_frame_roundtrip_sequence() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &[1, 2, 3], ViewAngles::new(10.0, 20.0, 30.0)).unwrap();
        write_frame(&mut buf, &[], ViewAngles::ZERO).unwrap();
        write_frame(&mut buf, &[SVC_DISCONNECT], ViewAngles::new(0.5, 0.25, 0.125)).unwrap();

        let mut cursor = Cursor::new(buf);
        let first = read_frame(&mut cursor).unwrap().expect("first frame");
        assert_eq!(first.message.as_bytes(), &[1, 2, 3]);
        assert_eq!(first.view_angles, ViewAngles::new(10.0, 20.0, 30.0));

        let second = read_frame(&mut cursor).unwrap().expect("second frame");
        assert!(second.message.is_empty());

        let third = read_frame(&mut cursor).unwrap().expect("third frame");
        assert!(third.message.is_disconnect());
        assert_eq!(third.view_angles, ViewAngles::new(0.5, 0.25, 0.125));

        assert!(read_frame(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_truncated_payload_ends_stream() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &[9; 32], ViewAngles::ZERO).unwrap();
        buf.truncate(buf.len() - 1);

        assert!(read_frame(&mut Cursor::new(buf)).unwrap().is_none());
    }

    #[test]
    fn test_oversized_length_checked_before_angles() {
        let data = 9000i32.to_le_bytes().to_vec();
        let err = read_frame(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength { len: 9000 }));
    }

    #[test]
    fn test_truncated_angles_end_stream() {
        let mut data = 4i32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0; 7]);
        assert!(read_frame(&mut Cursor::new(data)).unwrap().is_none());
    }

    #[test]
    fn test_truncated_prefix_ends_stream() {
        let data = vec![4, 0, 0];
        assert!(read_frame(&mut Cursor::new(data)).unwrap().is_none());
    }

    #[test]
    fn test_oversized_length_is_fatal() {
        let mut data = ((MAX_MSGLEN + 1) as i32).to_le_bytes().to_vec();
        data.extend_from_slice(&[0; 12]);
        data.extend_from_slice(&vec![0; MAX_MSGLEN + 1]);

        let err = read_frame(&mut Cursor::new(data)).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_negative_length_is_fatal() {
        let mut data = (-1i32).to_le_bytes().to_vec();
        data.extend_from_slice(&[0; 12]);

        let err = read_frame(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength { len: -1 }));
    }

    #[test]
    fn test_write_refuses_oversized_payload() {
        let mut buf = Vec::new();
        let err = write_frame(&mut buf, &vec![0; MAX_MSGLEN + 1], ViewAngles::ZERO).unwrap_err();
        assert!(err.is_fatal());
        assert!(buf.is_empty());
    }
}
