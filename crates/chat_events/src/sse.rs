use crate::decoder::decode_line;
use crate::event::StreamEvent;

/// Incremental line demuxer for `data:`-framed event streams.
///
/// Chunk boundaries may split a line anywhere, including in the middle of
/// a multi-byte UTF-8 sequence; the raw byte tail stays buffered until the
/// terminating newline arrives, and decoding happens per extracted line.
#[derive(Debug, Default)]
pub struct SseLineParser {
    buffer: Vec<u8>,
}

impl SseLineParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(split) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line = String::from_utf8_lossy(&self.buffer[..split]).into_owned();
            self.buffer.drain(0..=split);

            if let Some(event) = decode_line(&line) {
                events.push(event);
            }
        }

        events
    }

    /// Parse a complete stream body in one shot.
    pub fn parse_lines(input: &str) -> Vec<StreamEvent> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    pub fn is_empty_buffer(&self) -> bool {
        String::from_utf8_lossy(&self.buffer).trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::SseLineParser;
    use crate::event::EventKind;

    #[test]
    fn parse_lines_incrementally() {
        let mut parser = SseLineParser::default();
        let mut events = Vec::new();

        events.extend(parser.feed(b"data: {\"type\":\"text_delta\",\"delta\":\"Hello\"}\n"));
        assert_eq!(events.len(), 1);

        events.extend(parser.feed(b"data: [DONE]\n"));
        assert_eq!(events.len(), 1);
        assert!(parser.is_empty_buffer());
    }

    #[test]
    fn chunk_boundary_splitting_a_line_is_tolerated() {
        let mut parser = SseLineParser::default();

        let first = parser.feed(b"data: {\"type\":\"text_delta\",\"del");
        assert!(first.is_empty());
        assert!(!parser.is_empty_buffer());

        let second = parser.feed(b"ta\":\"Hi there\"}\n");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].delta.as_deref(), Some("Hi there"));
    }

    #[test]
    fn chunk_boundary_splitting_a_codepoint_is_tolerated() {
        let frame = "data: {\"type\":\"text_delta\",\"delta\":\"你好\"}\n".as_bytes();
        // Split inside the first multi-byte character of the delta.
        let split = frame
            .iter()
            .position(|byte| *byte >= 0x80)
            .expect("frame should contain a multi-byte character")
            + 1;

        let mut parser = SseLineParser::default();
        let first = parser.feed(&frame[..split]);
        assert!(first.is_empty());

        let second = parser.feed(&frame[split..]);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].delta.as_deref(), Some("你好"));
    }

    #[test]
    fn interleaved_non_data_lines_are_skipped() {
        let events = SseLineParser::parse_lines(concat!(
            ": comment\n",
            "data: {\"type\":\"text_start\"}\n",
            "event: ping\n",
            "data: {\"type\":\"text_end\"}\n",
        ));

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, Some(EventKind::TextStart));
        assert_eq!(events[1].kind, Some(EventKind::TextEnd));
    }

    #[test]
    fn trailing_line_without_newline_stays_buffered() {
        let mut parser = SseLineParser::default();
        let events = parser.feed(b"data: {\"type\":\"text_start\"}");

        assert!(events.is_empty());
        assert!(!parser.is_empty_buffer());
    }
}
