//! Incremental decoding of streamed response bodies.

/// Turns arbitrary byte chunks into UTF-8 text, holding back a multi-byte
/// sequence that was split across network chunks until it completes.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes; returns the text that is complete so far.
    pub fn push(&mut self, bytes: &[u8]) -> Result<String, String> {
        self.pending.extend_from_slice(bytes);

        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_string();
                self.pending.clear();
                Ok(text)
            }
            Err(e) if e.error_len().is_none() => {
                // Incomplete sequence at the end: emit the valid prefix only
                let valid = e.valid_up_to();
                let rest = self.pending.split_off(valid);
                let text = String::from_utf8(std::mem::replace(&mut self.pending, rest))
                    .map_err(|e| e.to_string())?;
                Ok(text)
            }
            Err(e) => Err(format!("invalid UTF-8 in stream: {}", e)),
        }
    }

    /// Fails if the stream ended in the middle of a character.
    pub fn finish(&self) -> Result<(), String> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "stream ended inside a UTF-8 sequence ({} dangling bytes)",
                self.pending.len()
            ))
        }
    }
}

/// Splits decoded text into complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and drain every complete line (without the newline).
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            lines.push(line.trim_end_matches(['\n', '\r']).to_string());
        }
        lines
    }

    /// Whatever is left after the last newline.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = rest.trim_end_matches('\r');
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_multibyte_character_is_reassembled() {
        let bytes = "机制".as_bytes();
        let mut decoder = Utf8ChunkDecoder::new();

        assert_eq!(decoder.push(&bytes[..2]).unwrap(), "");
        assert_eq!(decoder.push(&bytes[2..4]).unwrap(), "机");
        assert_eq!(decoder.push(&bytes[4..]).unwrap(), "制");
        decoder.finish().unwrap();
    }

    #[test]
    fn test_invalid_bytes_are_an_error() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert!(decoder.push(&[b'o', b'k', 0xff, b'x']).is_err());
    }

    #[test]
    fn test_dangling_bytes_at_end_are_an_error() {
        let mut decoder = Utf8ChunkDecoder::new();
        decoder.push(&"好".as_bytes()[..1]).unwrap();
        assert!(decoder.finish().is_err());
    }

    #[test]
    fn test_line_buffer_handles_split_lines() {
        let mut lines = LineBuffer::new();
        assert!(lines.push("{\"a\":").is_empty());
        assert_eq!(lines.push("1}\r\n{\"b\"").as_slice(), ["{\"a\":1}"]);
        assert_eq!(lines.push(":2}\n\n").as_slice(), ["{\"b\":2}", ""]);
        assert_eq!(lines.finish(), None);

        lines.push("tail");
        assert_eq!(lines.finish().as_deref(), Some("tail"));
    }
}
