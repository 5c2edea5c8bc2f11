//! Incremental UTF-8 decoding for byte streams.
//!
//! Network chunk boundaries are transport-determined and routinely fall
//! in the middle of a multi-byte character, especially with CJK chat
//! content. The decoder carries the incomplete tail bytes over to the
//! next call instead of corrupting them.

/// Streaming UTF-8 decoder with carry-over state.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Trailing bytes of an incomplete sequence from the previous chunk
    /// (at most 3: the longest UTF-8 sequence is 4 bytes).
    carry: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk, prepending any carried-over bytes.
    ///
    /// An incomplete sequence at the end of the input is held back for
    /// the next call. Invalid byte sequences in the interior are replaced
    /// with U+FFFD and logged, never propagated as an error.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let bytes: Vec<u8> = if self.carry.is_empty() {
            chunk.to_vec()
        } else {
            let mut combined = std::mem::take(&mut self.carry);
            combined.extend_from_slice(chunk);
            combined
        };

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    out.push_str(s);
                    return out;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    // Safe: from_utf8 vouched for this prefix.
                    out.push_str(std::str::from_utf8(&rest[..valid_up_to]).unwrap_or_default());

                    match e.error_len() {
                        // Truncated sequence at the end of input: carry it
                        // over to the next chunk.
                        None => {
                            self.carry = rest[valid_up_to..].to_vec();
                            return out;
                        }
                        // Genuinely invalid bytes: replace and continue.
                        Some(len) => {
                            tracing::warn!(
                                offset = valid_up_to,
                                len,
                                "invalid UTF-8 in stream chunk, substituting"
                            );
                            out.push('\u{FFFD}');
                            rest = &rest[valid_up_to + len..];
                        }
                    }
                }
            }
        }
    }

    /// Number of carried-over bytes awaiting completion.
    pub fn carry_len(&self) -> usize {
        self.carry.len()
    }

    /// Drop any carried-over bytes.
    pub fn reset(&mut self) {
        self.carry.clear();
    }
}
