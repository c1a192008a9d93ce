//! Frame and error types shared by the read path.
//!
//! - **Queue frames** ([`frame`]): what the transport enqueues for a stream
//!   - [`Frame`]: either a [`DataFrame`] or a [`HeadersFrame`]
//!   - [`FrameKind`]: the shape of a frame, used in error reports
//!
//! - **Application frames** ([`stream_frame`]): what `read()` hands out
//!   - [`StreamFrame`]: either a [`DataChunk`] or the trailers
//!
//! - **Payload** ([`payload`]): [`Payload`], the zero-copy composite buffer
//!   a coalesced data chunk owns
//!
//! - **Errors** ([`error`]): [`StreamError`] and [`QueueError`]

mod frame;
pub use frame::DataFrame;
pub use frame::Frame;
pub use frame::FrameKind;
pub use frame::HeadersFrame;

mod stream_frame;
pub use stream_frame::DataChunk;
pub use stream_frame::StreamFrame;

mod payload;
pub use payload::Payload;

mod error;
pub use error::BoxError;
pub use error::FailureCause;
pub use error::QueueError;
pub use error::StreamError;
