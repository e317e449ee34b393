//! Progress streams from long-running dashboard operations
//!
//! Handles `text/event-stream` responses from submit, result retrieval and
//! setup: bytes are decoded, framed into `event:`/`data:` pairs, and folded
//! into a single [`StreamState`].

mod consumer;
mod decoder;
mod events;
mod frame;
mod request;
mod session;
mod transport;

pub use consumer::{SessionId, StreamConsumer};
pub use decoder::{LineBuffer, Utf8Decoder};
pub use events::{EventKind, MalformedEvent, ProgressEvent, StreamEvent, UNSPECIFIED_STREAM_ERROR};
pub use frame::{EventFramer, FrameDecoder, SseFrame};
pub use request::{FormPart, StreamBody, StreamRequest};
pub use session::{Applied, StreamSession, StreamState};
pub use transport::{ByteStream, Transport};
