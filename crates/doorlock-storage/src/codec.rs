//! Fixed-width encoding of audit log records.
//!
//! Each record occupies [`RECORD_SIZE`] bytes:
//!
//! ```text
//! +----------+---------------------+----+
//! | label    | timestamp           | 00 |
//! | 8 bytes  | 19 bytes            |    |
//! +----------+---------------------+----+
//! ```
//!
//! The label is space-padded (or truncated) to exactly eight characters and
//! the timestamp uses the device format `YYYY/MM/DD HH:MM:SS`. Decoding
//! never fails: a region that does not hold a well-formed record is the
//! empty slot (`None`).

use doorlock_core::{
    Timestamp,
    constants::{LABEL_WIDTH, RECORD_SIZE, RECORD_TERMINATOR, TIMESTAMP_WIDTH},
};
use serde::Serialize;

/// Bytes of payload preceding the terminator.
const PAYLOAD_WIDTH: usize = LABEL_WIDTH + TIMESTAMP_WIDTH;

/// Replacement for label characters that cannot be stored.
const LABEL_PLACEHOLDER: char = '?';

/// One access event in the audit log.
///
/// # Examples
///
/// ```
/// use doorlock_core::Timestamp;
/// use doorlock_storage::LogRecord;
///
/// let at = Timestamp::parse("2024/03/15 08:30:00").unwrap();
/// let record = LogRecord::new("Father", at);
///
/// let bytes = record.encode();
/// assert_eq!(&bytes[..8], b"Father  ");
/// assert_eq!(bytes[27], 0);
///
/// assert_eq!(LogRecord::decode(&bytes), Some(record));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    label: String,
    timestamp: Timestamp,
}

impl LogRecord {
    /// Create a record, fitting `label` into the eight-character field.
    ///
    /// Characters outside printable ASCII are replaced with `?` and
    /// trailing spaces are dropped, so the stored label is exactly what
    /// decoding the slot gives back.
    pub fn new(label: &str, timestamp: Timestamp) -> Self {
        let label: String = label
            .chars()
            .take(LABEL_WIDTH)
            .map(|c| {
                if is_printable(c as u32) {
                    c
                } else {
                    LABEL_PLACEHOLDER
                }
            })
            .collect();

        Self {
            label: label.trim_end().to_string(),
            timestamp,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Encode into one slot.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [b' '; RECORD_SIZE];

        for (dst, src) in bytes[..LABEL_WIDTH].iter_mut().zip(self.label.bytes()) {
            *dst = src;
        }
        for (dst, src) in bytes[LABEL_WIDTH..PAYLOAD_WIDTH]
            .iter_mut()
            .zip(self.timestamp.format().bytes())
        {
            *dst = src;
        }
        bytes[PAYLOAD_WIDTH] = RECORD_TERMINATOR;
        bytes
    }

    /// Decode one slot.
    ///
    /// Reads at most [`RECORD_SIZE`] bytes and stops at the first
    /// terminator. Returns `None` (the empty slot) when fewer than 27 bytes
    /// precede the terminator, when any of them is not printable ASCII,
    /// when the label is blank, or when the timestamp does not parse.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let region = &bytes[..bytes.len().min(RECORD_SIZE)];
        let end = region
            .iter()
            .position(|b| *b == RECORD_TERMINATOR)
            .unwrap_or(region.len());
        if end < PAYLOAD_WIDTH {
            return None;
        }

        let payload = &region[..PAYLOAD_WIDTH];
        if !payload.iter().all(|b| is_printable(u32::from(*b))) {
            return None;
        }

        // Printable ASCII is valid UTF-8
        let label = std::str::from_utf8(&payload[..LABEL_WIDTH]).ok()?.trim_end();
        if label.is_empty() {
            return None;
        }
        let timestamp =
            Timestamp::parse(std::str::from_utf8(&payload[LABEL_WIDTH..]).ok()?).ok()?;

        Some(Self {
            label: label.to_string(),
            timestamp,
        })
    }
}

fn is_printable(c: u32) -> bool {
    (0x20..=0x7E).contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn test_encode_layout() {
        let record = LogRecord::new("Mother", at("2025/12/31 23:59:59"));
        let bytes = record.encode();

        assert_eq!(&bytes[..], b"Mother  2025/12/31 23:59:59\0");
    }

    #[test]
    fn test_long_label_truncated() {
        let record = LogRecord::new("Grandmother", at("2024/01/01 00:00:00"));

        assert_eq!(record.label(), "Grandmot");
        assert_eq!(LogRecord::decode(&record.encode()).unwrap().label(), "Grandmot");
    }

    #[test]
    fn test_non_ascii_label_replaced() {
        let record = LogRecord::new("M\u{e3}e", at("2024/01/01 00:00:00"));
        assert_eq!(record.label(), "M?e");
    }

    #[test]
    fn test_daughter_fills_label_exactly() {
        let record = LogRecord::new("Daughter", at("2024/06/01 12:00:00"));
        let bytes = record.encode();

        assert_eq!(&bytes[..8], b"Daughter");
        assert_eq!(LogRecord::decode(&bytes), Some(record));
    }

    #[rstest]
    #[case::all_zero(vec![0u8; RECORD_SIZE])]
    #[case::erased(vec![0xFFu8; RECORD_SIZE])]
    #[case::empty(vec![])]
    #[case::short(b"Son     2024/01/01".to_vec())]
    #[case::early_terminator(b"Son     2024/01/01\012:00:00\0".to_vec())]
    #[case::blank_label(b"        2024/01/01 12:00:00\0".to_vec())]
    #[case::bad_date(b"Son     2024/13/01 12:00:00\0".to_vec())]
    #[case::wrong_separator(b"Son     2024-01-01 12:00:00\0".to_vec())]
    #[case::control_char(b"So\tn    2024/01/01 12:00:00\0".to_vec())]
    fn test_malformed_slots_decode_empty(#[case] bytes: Vec<u8>) {
        assert_eq!(LogRecord::decode(&bytes), None);
    }

    #[test]
    fn test_missing_terminator_still_bounded() {
        let mut bytes = b"Son     2024/01/01 12:00:00X".to_vec();
        // Bytes past the region belong to the next slot and are ignored
        bytes.extend_from_slice(b"garbage");

        let record = LogRecord::decode(&bytes).unwrap();
        assert_eq!(record.label(), "Son");
        assert_eq!(record.timestamp(), at("2024/01/01 12:00:00"));
    }
}
