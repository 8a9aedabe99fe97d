use crate::responses::extract_text_delta;
use crate::sse::{EventRecord, SseDecoder};

/// accumulate -> split -> classify -> extract
#[derive(Debug, Default)]
pub struct DeltaDecoder {
    sse: SseDecoder,
    discarded: usize,
}

impl DeltaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one upstream chunk and return the text deltas it completes, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let records = self.sse.push(chunk);
        let mut deltas = Vec::with_capacity(records.len());
        for record in records {
            match classify(&record) {
                Some(delta) => deltas.push(delta),
                None => self.discarded += 1,
            }
        }
        deltas
    }

    /// Records that carried no usable delta so far: keep-alives, the
    /// sentinel, records not led by `data:` and malformed JSON.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn finish(&mut self) -> usize {
        self.sse.finish()
    }
}

fn classify(record: &EventRecord) -> Option<String> {
    let payload = record.data.as_deref()?;
    if record.is_done() || payload.is_empty() {
        return None;
    }
    extract_text_delta(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STREAM: &str = concat!(
        ": keep-alive\n\n",
        "data: {\"output_text\":{\"delta\":\"Hel\"}}\n\n",
        "event: response.output_text.delta\n",
        "data: {\"output_text\":{\"delta\":\"skipped\"}}\n\n",
        "data: {\"output_text\":\n{\"delta\":\"lo, \"}}\n\n",
        "data: {\"type\":\"response.output_text.delta\",\"delta\":\"typed\"}\n\n",
        "data: {\"output_text\":{\"delta\":\n\n",
        "data: {\"type\":\"response.created\"}\n\n",
        "data: {\"output_text\":{\"delta\":\"wörld 🌍\"}}\n\n",
        "data: [DONE]\n\n",
    );

    fn decode_in_chunks(bytes: &[u8], size: usize) -> Vec<String> {
        let mut decoder = DeltaDecoder::new();
        let mut out = Vec::new();
        for chunk in bytes.chunks(size) {
            out.extend(decoder.push(chunk));
        }
        decoder.finish();
        out
    }

    fn expected() -> Vec<String> {
        vec!["Hel".to_string(), "lo, ".to_string(), "wörld 🌍".to_string()]
    }

    #[test]
    fn hello_sequence() {
        let mut decoder = DeltaDecoder::new();
        let mut out = String::new();
        for chunk in [
            "data: {\"output_text\":{\"delta\":\"Hel\"}}\n\n",
            "data: {\"output_text\":{\"delta\":\"lo\"}}\n\n",
            "data: [DONE]\n\n",
        ] {
            out.extend(decoder.push(chunk.as_bytes()));
        }
        assert_eq!(out, "Hello");
        assert_eq!(decoder.discarded(), 1);
    }

    #[test]
    fn one_giant_chunk() {
        assert_eq!(decode_in_chunks(STREAM.as_bytes(), STREAM.len()), expected());
    }

    #[test]
    fn single_byte_chunks() {
        assert_eq!(decode_in_chunks(STREAM.as_bytes(), 1), expected());
    }

    #[test]
    fn every_chunk_size_matches_single_pass() {
        let bytes = STREAM.as_bytes();
        for size in 1..=bytes.len() {
            assert_eq!(decode_in_chunks(bytes, size), expected(), "chunk size {size}");
        }
    }

    #[test]
    fn every_two_way_split_matches_single_pass() {
        // covers cuts mid-separator and inside multi-byte characters
        let bytes = STREAM.as_bytes();
        for cut in 0..=bytes.len() {
            let mut decoder = DeltaDecoder::new();
            let mut out = decoder.push(&bytes[..cut]);
            out.extend(decoder.push(&bytes[cut..]));
            assert_eq!(out, expected(), "cut at {cut}");
        }
    }

    #[test]
    fn malformed_record_does_not_stop_extraction() {
        let mut decoder = DeltaDecoder::new();
        let out = decoder.push(
            b"data: {not json}\n\ndata: {\"output_text\":{\"delta\":\"ok\"}}\n\n",
        );
        assert_eq!(out, vec!["ok".to_string()]);
        assert_eq!(decoder.discarded(), 1);
    }

    #[test]
    fn only_records_led_by_data_are_read() {
        let mut decoder = DeltaDecoder::new();
        assert!(decoder
            .push(b"event: x\ndata: {\"output_text\":{\"delta\":\"A\"}}\n\n")
            .is_empty());
        assert!(decoder
            .push(b"data: {\"type\":\"response.output_text.delta\",\"delta\":\"B\"}\n\n")
            .is_empty());
        assert_eq!(
            decoder.push(b"data: {\"output_text\":\n{\"delta\":\"C\"}}\n\n"),
            vec!["C".to_string()]
        );
        assert_eq!(decoder.discarded(), 2);
    }

    #[test]
    fn sentinel_alone_emits_nothing() {
        let mut decoder = DeltaDecoder::new();
        assert!(decoder.push(b"data: [DONE]\n\n").is_empty());
        assert_eq!(decoder.finish(), 0);
    }
}
