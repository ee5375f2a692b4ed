//! Response capture.
//!
//! # Responsibilities
//! - Record status, headers and every body byte forwarded to the client
//! - Compose a response summary for the traffic log
//!
//! # Design Decisions
//! - [`CaptureBody`] tees data frames: the client sees exactly the bytes the
//!   backend sent, in order; the record accumulates the same bytes
//! - The status defaults to 200 if never explicitly set
//! - The completion callback fires exactly once, at end of stream or when
//!   the body is dropped early (client disconnect), whichever comes first

use std::fmt::Write as _;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::http::{HeaderMap, StatusCode};
use bytes::{Bytes, BytesMut};
use http_body::{Body, Frame, SizeHint};

/// Transient per-request record of the outgoing response. Owned by the
/// request's capture body; never shared across requests.
#[derive(Debug)]
pub struct CaptureRecord {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl CaptureRecord {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    /// Record the status code forwarded to the client.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Snapshot the headers as they are forwarded to the client.
    pub fn set_headers(&mut self, headers: &HeaderMap) {
        self.headers = headers.clone();
    }

    /// Append a forwarded body chunk.
    pub fn record(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Composed block of headers, status and accumulated body, consumed
    /// only by the traffic log.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "status: {}", self.status);
        for (name, value) in &self.headers {
            let _ = writeln!(out, "{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
        }
        out.push('\n');
        out.push_str(&String::from_utf8_lossy(&self.body));
        out
    }
}

impl Default for CaptureRecord {
    fn default() -> Self {
        Self::new()
    }
}

type OnComplete = Box<dyn FnOnce(&CaptureRecord) + Send + 'static>;

/// Body wrapper that mirrors every forwarded data frame into a
/// [`CaptureRecord`] without altering what the client receives.
pub struct CaptureBody<B> {
    inner: B,
    record: CaptureRecord,
    on_complete: Option<OnComplete>,
}

impl<B> CaptureBody<B> {
    pub fn new(
        inner: B,
        record: CaptureRecord,
        on_complete: impl FnOnce(&CaptureRecord) + Send + 'static,
    ) -> Self {
        Self {
            inner,
            record,
            on_complete: Some(Box::new(on_complete)),
        }
    }

    fn finish(&mut self) {
        if let Some(f) = self.on_complete.take() {
            f(&self.record);
        }
    }
}

impl<B> Body for CaptureBody<B>
where
    B: Body<Data = Bytes> + Unpin,
    Self: Unpin,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.record.record(data);
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.finish();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B> Drop for CaptureBody<B> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    use axum::http::header;
    use http_body_util::BodyExt;

    use super::*;

    /// Test body yielding a fixed sequence of chunks.
    struct ChunkedBody {
        chunks: VecDeque<Bytes>,
    }

    impl ChunkedBody {
        fn new(chunks: &[&'static [u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| Bytes::from_static(c)).collect(),
            }
        }
    }

    impl Body for ChunkedBody {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
            Poll::Ready(self.get_mut().chunks.pop_front().map(|c| Ok(Frame::data(c))))
        }
    }

    #[tokio::test]
    async fn forwarded_bytes_equal_captured_bytes() {
        let captured: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));
        let sink = captured.clone();

        let inner = ChunkedBody::new(&[b"hello", b" ", b"world"]);
        let mut body = CaptureBody::new(inner, CaptureRecord::new(), move |record| {
            *sink.lock().unwrap() = Some(record.body().to_vec());
        });

        let mut forwarded = Vec::new();
        while let Some(frame) = body.frame().await {
            if let Ok(data) = frame.unwrap().into_data() {
                forwarded.extend_from_slice(&data);
            }
        }

        assert_eq!(forwarded, b"hello world");
        assert_eq!(captured.lock().unwrap().as_deref(), Some(b"hello world".as_slice()));
    }

    #[tokio::test]
    async fn completion_fires_once() {
        let count = Arc::new(Mutex::new(0u32));
        let sink = count.clone();

        let inner = ChunkedBody::new(&[b"x"]);
        let mut body = CaptureBody::new(inner, CaptureRecord::new(), move |_| {
            *sink.lock().unwrap() += 1;
        });

        while body.frame().await.is_some() {}
        drop(body);

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn drop_before_end_of_stream_still_completes() {
        let captured: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));
        let sink = captured.clone();

        let inner = ChunkedBody::new(&[b"partial", b"never read"]);
        let mut body = CaptureBody::new(inner, CaptureRecord::new(), move |record| {
            *sink.lock().unwrap() = Some(record.body().to_vec());
        });

        let _ = body.frame().await;
        drop(body);

        assert_eq!(captured.lock().unwrap().as_deref(), Some(b"partial".as_slice()));
    }

    #[test]
    fn status_defaults_to_200() {
        let record = CaptureRecord::new();
        assert_eq!(record.status(), StatusCode::OK);
        assert!(record.summary().contains("status: 200 OK"));
    }

    #[test]
    fn summary_contains_headers_status_and_body() {
        let mut record = CaptureRecord::new();
        record.set_status(StatusCode::NOT_FOUND);
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        record.set_headers(&headers);
        record.record(b"no such thing");

        let summary = record.summary();
        assert!(summary.contains("status: 404 Not Found"));
        assert!(summary.contains("content-type: text/plain"));
        assert!(summary.contains("no such thing"));
    }
}
