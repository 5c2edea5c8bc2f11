//! SSE (Server-Sent Events) stream reconstruction.
//!
//! The backend streams chat replies as line-oriented SSE over a chunked
//! HTTP response body. Chunk boundaries are arbitrary, so reconstruction
//! is layered:
//!
//! - `line` - classifies one raw line into a typed field
//! - `assembler` - groups field lines into logical messages
//! - `payload` - interprets a message's `data` as an application payload
//! - `utf8` - streaming-safe byte-to-text decoding
//! - `processor` - stateful chunk-to-payload pipeline over the above

mod assembler;
mod line;
mod payload;
mod processor;
mod utf8;

pub use assembler::{Assembler, SseMessage};
pub use line::{parse_line, SseField, SseLine};
pub use payload::{classify, ParsedPayload};
pub use processor::StreamProcessor;
pub use utf8::Utf8Decoder;
