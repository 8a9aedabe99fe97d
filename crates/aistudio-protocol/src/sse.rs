//! Incremental decoder for `text/event-stream` bodies.
//!
//! Raw bytes are buffered, not decoded text, so a chunk boundary that falls
//! inside a multi-byte character never corrupts a record.

pub const EVENT_SEPARATOR: &[u8] = b"\n\n";
pub const DONE_SENTINEL: &str = "[DONE]";
pub const DATA_PREFIX: &str = "data:";

/// One blank-line delimited event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRecord {
    /// Everything after a leading `data:`, trimmed. `None` when the trimmed
    /// record does not begin with that prefix.
    pub data: Option<String>,
}

impl EventRecord {
    /// Returns `None` for records that are empty after trimming. The whole
    /// record is one payload, so a value wrapped onto continuation lines
    /// stays intact.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let data = raw
            .strip_prefix(DATA_PREFIX)
            .map(|payload| payload.trim().to_string());
        Some(EventRecord { data })
    }

    pub fn is_done(&self) -> bool {
        self.data.as_deref() == Some(DONE_SENTINEL)
    }
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every record it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<EventRecord> {
        // The retained remainder never holds a full separator, so only its
        // tail can pair up with the new bytes.
        let mut cursor = self
            .buffer
            .len()
            .saturating_sub(EVENT_SEPARATOR.len() - 1);
        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = find_separator(&self.buffer[cursor..]) {
            let end = cursor + offset;
            let raw = String::from_utf8_lossy(&self.buffer[consumed..end]);
            if let Some(record) = EventRecord::parse(&raw) {
                records.push(record);
            }
            consumed = end + EVENT_SEPARATOR.len();
            cursor = consumed;
        }
        self.buffer.drain(..consumed);
        records
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// End of input. An unterminated trailing record is dropped; the number
    /// of dropped bytes is returned.
    pub fn finish(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }
}

fn find_separator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(EVENT_SEPARATOR.len())
        .position(|window| window == EVENT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn data(value: &str) -> EventRecord {
        EventRecord {
            data: Some(value.to_string()),
        }
    }

    #[test]
    fn splits_complete_records_and_keeps_remainder() {
        let mut decoder = SseDecoder::new();
        let records = decoder.push(b"data: one\n\ndata: two\n\ndata: thr");
        assert_eq!(records, vec![data("one"), data("two")]);
        assert_eq!(decoder.pending(), "data: thr".len());

        let records = decoder.push(b"ee\n\n");
        assert_eq!(records, vec![data("three")]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn separator_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: a\n").is_empty());
        assert_eq!(decoder.push(b"\ndata: b\n"), vec![data("a")]);
        assert_eq!(decoder.push(b"\n"), vec![data("b")]);
    }

    #[test]
    fn triple_newline_leaves_leading_newline_in_next_record() {
        let mut decoder = SseDecoder::new();
        let records = decoder.push(b"data: a\n\n\ndata: b\n\n");
        assert_eq!(records, vec![data("a"), data("b")]);
    }

    #[test]
    fn records_not_led_by_data_carry_no_payload() {
        let record = EventRecord::parse(": keep-alive").unwrap();
        assert_eq!(record.data, None);

        let record =
            EventRecord::parse("event: response.output_text.delta\ndata: {\"x\":1}").unwrap();
        assert_eq!(record.data, None);

        let record = EventRecord::parse("id: 7\ndata: {\"x\":1}").unwrap();
        assert_eq!(record.data, None);
    }

    #[test]
    fn payload_keeps_continuation_lines() {
        let record = EventRecord::parse("  data: {\"a\":\n{\"b\":1}}  ").unwrap();
        assert_eq!(record.data.as_deref(), Some("{\"a\":\n{\"b\":1}}"));
    }

    #[test]
    fn crlf_lines_are_tolerated() {
        let record = EventRecord::parse("data: {\"a\":1}\r").unwrap();
        assert_eq!(record.data.as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn done_sentinel() {
        let mut decoder = SseDecoder::new();
        let records = decoder.push(b"data: [DONE]\n\n");
        assert_eq!(records.len(), 1);
        assert!(records[0].is_done());
    }

    #[test]
    fn finish_drops_unterminated_record() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: partial");
        assert_eq!(decoder.finish(), "data: partial".len());
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn multibyte_character_split_between_chunks() {
        let text = "data: héllo\n\n".as_bytes();
        let split = text.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&text[..split]).is_empty());
        assert_eq!(decoder.push(&text[split..]), vec![data("héllo")]);
    }
}
