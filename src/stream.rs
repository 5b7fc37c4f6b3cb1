//! Stream response reader: incrementally decodes a byte stream into
//! accumulated text, reporting progress through caller-supplied callbacks.

use futures::{pin_mut, Stream, StreamExt};

/// Incremental UTF-8 decoder. Bytes of a multi-byte character that straddle
/// a chunk boundary are held back until the rest arrives; invalid sequences
/// decode to U+FFFD the way a lossy decode would.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    /// Decode the next chunk, returning all text that is complete so far.
    pub fn decode(&mut self, input: &[u8]) -> String {
        self.pending.extend_from_slice(input);
        let mut buf = std::mem::take(&mut self.pending);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&buf) {
                Ok(text) => {
                    out.push_str(text);
                    return out;
                }
                Err(err) => {
                    let (valid, rest) = buf.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        out.push_str(text);
                    }
                    match err.error_len() {
                        // Garbage in the middle: emit a replacement and resume
                        // after the offending bytes.
                        Some(bad) => {
                            out.push('\u{FFFD}');
                            buf = rest[bad..].to_vec();
                        }
                        // Incomplete trailing sequence: wait for more input.
                        None => {
                            self.pending = rest.to_vec();
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Flush the decoder at end of stream. A truncated final character
    /// becomes a single replacement character.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            "\u{FFFD}".to_string()
        }
    }
}

/// Pull every chunk from `stream`, decoding to text as it arrives.
///
/// After each chunk, `on_chunk` receives the full accumulated text so far
/// (not the delta). When the stream ends, `on_finish` receives the final
/// text exactly once. A read failure is returned to the caller as-is; no
/// retry, no partial-result recovery, and `on_finish` never fires for it.
pub async fn consume_stream<S, B, E, F, G>(
    stream: S,
    mut on_chunk: F,
    on_finish: G,
) -> Result<(), E>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    F: FnMut(&str),
    G: FnOnce(&str),
{
    pin_mut!(stream);
    let mut decoder = Utf8StreamDecoder::default();
    let mut content = String::new();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        content.push_str(&decoder.decode(bytes.as_ref()));
        on_chunk(&content);
    }
    content.push_str(&decoder.finish());
    on_finish(&content);
    Ok(())
}

/// Consume an HTTP response body. A response with no readable body (declared
/// content length of zero) is a no-op: neither callback fires.
pub async fn consume_response<F, G>(
    response: reqwest::Response,
    on_chunk: F,
    on_finish: G,
) -> Result<(), reqwest::Error>
where
    F: FnMut(&str),
    G: FnOnce(&str),
{
    if response.content_length() == Some(0) {
        return Ok(());
    }
    consume_stream(response.bytes_stream(), on_chunk, on_finish).await
}
