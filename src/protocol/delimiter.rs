//! In-band record splitting for streaming config replies.
//!
//! A streaming reply body is an unbounded sequence of UTF-8 config documents,
//! each terminated by four newlines:
//!
//! ```text
//! {"rev":1,...}\n\n\n\n{"rev":2,...}\n\n\n\n{"rev":3,
//! └──── record ───┘└ delim ┘└──── record ───┘└ delim ┘└ partial ┘
//! ```
//!
//! The buffer is owned by the caller and persists across inbound frames, so a
//! delimiter split over two frames is found once both halves have arrived.

use bytes::{Buf, BytesMut};

/// Delimiter terminating each config document in a streaming reply.
pub const CONFIG_DELIMITER: &[u8] = b"\n\n\n\n";

/// Extract the first complete record from `buffer`.
///
/// If the delimiter occurs at index `i`, returns `trim(buffer[..i])` and leaves
/// `buffer[i + 4..]` in place, which may hold further complete records.
/// If no delimiter is present, returns `None` and the buffer is untouched.
///
/// Call it repeatedly until it returns `None` to drain every complete record.
///
/// # Example
///
/// ```
/// use bytes::BytesMut;
/// use configwire_client::protocol::split_record;
///
/// let mut buf = BytesMut::from(&b" doc1 \n\n\n\ndoc2"[..]);
/// assert_eq!(split_record(&mut buf).as_deref(), Some("doc1"));
/// assert_eq!(split_record(&mut buf), None);
/// assert_eq!(&buf[..], b"doc2");
/// ```
pub fn split_record(buffer: &mut BytesMut) -> Option<String> {
    let index = find_delimiter(buffer)?;
    let record = buffer.split_to(index);
    buffer.advance(CONFIG_DELIMITER.len());
    Some(String::from_utf8_lossy(&record).trim().to_string())
}

/// Drain every complete record currently in `buffer`, in order.
pub fn split_records(buffer: &mut BytesMut) -> Vec<String> {
    let mut records = Vec::new();
    while let Some(record) = split_record(buffer) {
        records.push(record);
    }
    records
}

fn find_delimiter(data: &[u8]) -> Option<usize> {
    data.windows(CONFIG_DELIMITER.len())
        .position(|window| window == CONFIG_DELIMITER)
}
