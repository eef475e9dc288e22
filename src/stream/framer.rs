//! Byte framer turning an SSE body stream into discrete records.
//!
//! The robot terminates each record with a doubled newline, either `\n\n` or
//! `\r\r` depending on firmware build. Chunks arrive at arbitrary split
//! points, so the framer buffers across calls and only ever hands out
//! delimiter-exact records.

use bytes::{Buf, BytesMut};

/// Accumulates transport bytes and extracts complete SSE records.
#[derive(Debug, Default)]
pub(crate) struct SseFramer {
    buffer: BytesMut,
}

impl SseFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and drains every record the buffer now completes.
    ///
    /// Records are returned in arrival order. Zero-length records (delimiters
    /// back to back) are consumed but not returned. Bytes after the last
    /// delimiter stay buffered for the next call.
    pub fn append(&mut self, chunk: &[u8]) -> Vec<BytesMut> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(at) = find_delimiter(&self.buffer) {
            let frame = self.buffer.split_to(at);
            self.buffer.advance(2);
            if !frame.is_empty() {
                frames.push(frame);
            }
        }
        frames
    }

    #[cfg(test)]
    fn residual(&self) -> &[u8] {
        &self.buffer
    }
}

fn find_delimiter(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(2)
        .position(|pair| pair == b"\n\n" || pair == b"\r\r")
}

#[cfg(test)]
mod tests {
    use super::SseFramer;

    fn strings(frames: Vec<bytes::BytesMut>) -> Vec<String> {
        frames
            .into_iter()
            .map(|frame| String::from_utf8(frame.to_vec()).expect("utf8 frame"))
            .collect()
    }

    #[test]
    fn chunk_without_delimiter_stays_buffered() {
        let mut framer = SseFramer::new();
        assert!(framer.append(b"event: MapUpdated\ndata: {").is_empty());
        assert_eq!(framer.residual(), b"event: MapUpdated\ndata: {");
    }

    #[test]
    fn chunk_with_multiple_delimiters_yields_frames_in_order() {
        let mut framer = SseFramer::new();
        let frames = framer.append(b"first\n\nsecond\n\nrest");
        assert_eq!(strings(frames), vec!["first", "second"]);
        assert_eq!(framer.residual(), b"rest");
    }

    #[test]
    fn empty_records_are_consumed_but_not_emitted() {
        let mut framer = SseFramer::new();
        let frames = framer.append(b"a\n\n\n\nb\n\n");
        assert_eq!(strings(frames), vec!["a", "b"]);
        assert!(framer.residual().is_empty());
    }

    #[test]
    fn carriage_return_delimiter_is_recognized() {
        let mut framer = SseFramer::new();
        let frames = framer.append(b"ping\r\rpong\r\r");
        assert_eq!(strings(frames), vec!["ping", "pong"]);
    }

    #[test]
    fn earliest_delimiter_wins_regardless_of_kind() {
        let mut framer = SseFramer::new();
        let frames = framer.append(b"a\r\rb\n\n");
        assert_eq!(strings(frames), vec!["a", "b"]);
    }

    #[test]
    fn delimiter_split_across_chunks_is_rejoined() {
        let mut framer = SseFramer::new();
        assert!(framer.append(b"record\n").is_empty());
        let frames = framer.append(b"\nnext");
        assert_eq!(strings(frames), vec!["record"]);
        assert_eq!(framer.residual(), b"next");
    }

    // Every split point of the same byte sequence must produce the same
    // frames and the same residual.
    #[test]
    fn framing_is_invariant_under_chunking() {
        let input: &[u8] = b"event: a\ndata: 1\n\nevent: b\ndata: 2\n\nevent: c\ndata";
        let expected = vec!["event: a\ndata: 1".to_string(), "event: b\ndata: 2".to_string()];

        for split in 0..=input.len() {
            let mut framer = SseFramer::new();
            let mut frames = framer.append(&input[..split]);
            frames.extend(framer.append(&input[split..]));
            assert_eq!(strings(frames), expected, "split at {split}");
            assert_eq!(framer.residual(), b"event: c\ndata", "split at {split}");
        }
    }

    #[test]
    fn byte_at_a_time_chunking_loses_nothing() {
        let input: &[u8] = b"one\n\ntwo\r\rthree\n\n";
        let mut framer = SseFramer::new();
        let mut frames = Vec::new();
        for byte in input {
            frames.extend(framer.append(std::slice::from_ref(byte)));
        }
        assert_eq!(strings(frames), vec!["one", "two", "three"]);
        assert!(framer.residual().is_empty());
    }
}
