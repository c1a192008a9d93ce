use http::HeaderMap;

use crate::flow_control::Credit;
use crate::protocol::{BoxError, Payload};

/// A frame handed to the application by [`DataStream::read`](crate::stream::DataStream::read).
#[derive(Debug)]
pub enum StreamFrame {
    /// One or more DATA frames, coalesced into a single payload.
    Data(DataChunk),
    /// The trailer block which terminates the stream.
    Trailers(HeaderMap),
}

/// Payload of one or more DATA frames together with the flow-control credit
/// they consumed.
#[derive(Debug)]
pub struct DataChunk {
    payload: Payload,
    end_of_stream: bool,
    credit: Credit,
}

impl DataChunk {
    pub(crate) fn new(payload: Payload, end_of_stream: bool, credit: Credit) -> Self {
        Self { payload, end_of_stream, credit }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// Flow-controlled weight of this chunk: payload plus padding of every folded frame.
    pub fn weight(&self) -> usize {
        self.credit.weight()
    }

    /// Splits the chunk, so the payload can be kept after the credit is released.
    pub fn into_parts(self) -> (Payload, Credit) {
        (self.payload, self.credit)
    }

    /// Releases the chunk's payload and returns its credit upstream.
    pub async fn release(self) -> Result<(), BoxError> {
        let (payload, credit) = self.into_parts();
        drop(payload);
        credit.release().await
    }
}

impl StreamFrame {
    pub fn is_data(&self) -> bool {
        matches!(self, StreamFrame::Data(_))
    }

    pub fn is_trailers(&self) -> bool {
        matches!(self, StreamFrame::Trailers(_))
    }

    /// True when no frame follows this one: trailers, or data carrying end-of-stream.
    pub fn is_end_of_stream(&self) -> bool {
        match self {
            StreamFrame::Data(chunk) => chunk.is_end_of_stream(),
            StreamFrame::Trailers(_) => true,
        }
    }

    pub fn into_data(self) -> Result<DataChunk, Self> {
        match self {
            StreamFrame::Data(chunk) => Ok(chunk),
            other => Err(other),
        }
    }

    pub fn into_trailers(self) -> Result<HeaderMap, Self> {
        match self {
            StreamFrame::Trailers(trailers) => Ok(trailers),
            other => Err(other),
        }
    }
}
