use std::fmt;

use bytes::Bytes;
use http::HeaderMap;

/// A frame as the transport enqueues it for a single stream.
///
/// Only the two frame types which carry stream content reach the read path:
/// DATA and HEADERS. A HEADERS frame carrying end-of-stream is the trailer
/// block of the stream.
#[derive(Debug, Clone)]
pub enum Frame {
    Data(DataFrame),
    Headers(HeadersFrame),
}

/// The shape of a [`Frame`], used when reporting a frame in the wrong position.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameKind {
    Data,
    Headers,
    Trailers,
}

/// A DATA frame: a payload slice, the padding the peer added to it and the
/// end-of-stream flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    payload: Bytes,
    padding: usize,
    end_of_stream: bool,
}

/// A HEADERS frame; with end-of-stream set it carries trailers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadersFrame {
    headers: HeaderMap,
    end_of_stream: bool,
}

impl DataFrame {
    pub fn new(payload: impl Into<Bytes>, end_of_stream: bool) -> Self {
        Self { payload: payload.into(), padding: 0, end_of_stream }
    }

    #[must_use]
    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// The number of bytes this frame consumed from the flow-control window.
    ///
    /// Padding counts against the window, so it is returned along with the payload
    /// once the application has consumed the frame.
    #[inline]
    pub fn flow_controlled_len(&self) -> usize {
        self.payload.len() + self.padding
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

impl HeadersFrame {
    pub fn new(headers: HeaderMap, end_of_stream: bool) -> Self {
        Self { headers, end_of_stream }
    }

    pub fn trailers(headers: HeaderMap) -> Self {
        Self::new(headers, true)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    #[inline]
    pub fn is_trailers(&self) -> bool {
        self.end_of_stream
    }

    pub fn into_headers(self) -> HeaderMap {
        self.headers
    }
}

impl Frame {
    /// Shortcut for a [`DataFrame`] without padding.
    pub fn data(payload: impl Into<Bytes>, end_of_stream: bool) -> Self {
        Self::Data(DataFrame::new(payload, end_of_stream))
    }

    /// Shortcut for a [`HeadersFrame`] carrying trailers.
    pub fn trailers(headers: HeaderMap) -> Self {
        Self::Headers(HeadersFrame::trailers(headers))
    }

    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Data(_) => FrameKind::Data,
            Frame::Headers(headers) if headers.is_trailers() => FrameKind::Trailers,
            Frame::Headers(_) => FrameKind::Headers,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        match self {
            Frame::Data(data) => data.is_end_of_stream(),
            Frame::Headers(headers) => headers.is_end_of_stream(),
        }
    }

    /// Flow-controlled length of the frame, zero for HEADERS.
    pub fn flow_controlled_len(&self) -> usize {
        match self {
            Frame::Data(data) => data.flow_controlled_len(),
            Frame::Headers(_) => 0,
        }
    }
}

impl From<DataFrame> for Frame {
    fn from(data: DataFrame) -> Self {
        Self::Data(data)
    }
}

impl From<HeadersFrame> for Frame {
    fn from(headers: HeadersFrame) -> Self {
        Self::Headers(headers)
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameKind::Data => "data",
            FrameKind::Headers => "headers",
            FrameKind::Trailers => "trailers",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn flow_controlled_len_counts_padding() {
        let frame = DataFrame::new(Bytes::from_static(b"hello"), false).with_padding(7);

        assert_eq!(frame.payload().len(), 5);
        assert_eq!(frame.flow_controlled_len(), 12);
        assert_eq!(Frame::from(frame).flow_controlled_len(), 12);
    }

    #[test]
    fn headers_with_end_of_stream_are_trailers() {
        let mut headers = HeaderMap::new();
        headers.insert("grpc-status", HeaderValue::from_static("0"));

        let trailers = Frame::trailers(headers.clone());
        assert_eq!(trailers.kind(), FrameKind::Trailers);
        assert!(trailers.is_end_of_stream());
        assert_eq!(trailers.flow_controlled_len(), 0);

        let headers = Frame::Headers(HeadersFrame::new(headers, false));
        assert_eq!(headers.kind(), FrameKind::Headers);
        assert!(!headers.is_end_of_stream());
    }

    #[test]
    fn frame_kind_display() {
        assert_eq!(FrameKind::Data.to_string(), "data");
        assert_eq!(FrameKind::Headers.to_string(), "headers");
        assert_eq!(FrameKind::Trailers.to_string(), "trailers");
    }
}
