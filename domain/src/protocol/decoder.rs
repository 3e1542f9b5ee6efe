//! Lenient incremental UTF-8 decoding.

/// Decodes a byte stream into text one read at a time.
///
/// Bytes that can never form valid UTF-8 are dropped. An incomplete
/// multi-byte sequence at the end of a read is held back and completed by
/// the next read, so a character split across two TCP segments survives.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk of bytes, returning the text that is complete.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut text = String::with_capacity(input.len());
        let mut rest = input.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    if let Ok(valid) = std::str::from_utf8(valid) {
                        text.push_str(valid);
                    }
                    match e.error_len() {
                        // Invalid sequence: skip it and keep going
                        Some(len) => rest = &after[len..],
                        // Truncated sequence at the end: wait for more bytes
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        text
    }

    /// Whether an incomplete sequence is waiting for its remaining bytes.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
