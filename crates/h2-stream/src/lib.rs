//! The read side of an HTTP/2 stream
//!
//! This crate turns the ordered frames a transport queued for one HTTP/2
//! stream (DATA chunks and the trailing HEADERS block) into the frames an
//! application reads, while it
//!
//! - tracks the stream lifecycle with race-safe transitions
//! - coalesces buffered DATA frames into one chunk when a backlog builds up
//! - hands flow-control credit back upstream once a chunk is consumed
//!
//! Frame decoding, connection multiplexing and the WINDOW_UPDATE exchange
//! live elsewhere; this crate consumes a frame queue and a release hook.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use micro_h2_stream::flow_control::make_releaser;
//! use micro_h2_stream::protocol::{BoxError, Frame, StreamFrame};
//! use micro_h2_stream::queue::FrameQueue;
//! use micro_h2_stream::stream::{DataStream, StreamConfig};
//! use tracing::info;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BoxError> {
//!     let queue = FrameQueue::new();
//!
//!     // the connection task pushes decoded frames for this stream
//!     queue.push(Frame::data("hello ", false))?;
//!     queue.push(Frame::data("world", true))?;
//!
//!     let releaser = make_releaser(|weight| async move {
//!         info!(weight, "send WINDOW_UPDATE");
//!         Ok::<(), BoxError>(())
//!     });
//!
//!     let config = StreamConfig::new().with_min_accum_frames(2);
//!     let stream = DataStream::with_config(queue, Arc::new(releaser), config);
//!
//!     loop {
//!         match stream.read().await? {
//!             StreamFrame::Data(chunk) => {
//!                 let end_of_stream = chunk.is_end_of_stream();
//!                 info!(bytes = chunk.payload().len(), "receive data");
//!                 chunk.release().await?;
//!                 if end_of_stream {
//!                     break;
//!                 }
//!             }
//!             StreamFrame::Trailers(trailers) => {
//!                 info!(?trailers, "receive trailers");
//!                 break;
//!             }
//!         }
//!     }
//!
//!     stream.on_end().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: queue frames, application frames, the composite payload and errors
//! - [`queue`]: the [`queue::FrameSource`] seam and the in-memory [`queue::FrameQueue`]
//! - [`flow_control`]: the [`flow_control::Releaser`] hook and per-chunk [`flow_control::Credit`]
//! - [`metrics`]: pluggable observability hooks, no-op by default
//! - [`stream`]: [`stream::DataStream`], its state machine and accumulation, and the
//!   `http_body::Body` adapter
//!
//! # Error Handling
//!
//! [`protocol::StreamError`] separates the expected terminal conditions
//! (`Closed`, `Failed`) from contract violations (`InvalidState`,
//! `EmptyAccumulation`) and protocol errors (`UnexpectedFrame`). Nothing is
//! retried internally.

pub mod flow_control;
pub mod metrics;
pub mod protocol;
pub mod queue;
pub mod stream;

mod utils;
pub(crate) use utils::ensure;
