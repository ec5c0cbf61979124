use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use http_body::{Body as HttpBody, Frame, SizeHint};
use pin_project::pin_project;

/// Response body of [`PrerenderService`](crate::PrerenderService).
///
/// Either the snapshot, held in memory, or the untouched body of the wrapped
/// service.
#[pin_project(project = PrerenderBodyProj)]
#[derive(Debug)]
pub enum PrerenderBody<B> {
    /// Snapshot body.
    ///
    /// The `Option` yields the data once, then `None` on subsequent polls.
    Snapshot(Option<Bytes>),

    /// Body of the wrapped service, forwarded as is.
    Passthrough(#[pin] B),
}

impl<B> PrerenderBody<B> {
    /// Creates a snapshot body.
    pub fn snapshot(body: impl Into<Bytes>) -> Self {
        let bytes = body.into();
        if bytes.is_empty() {
            PrerenderBody::Snapshot(None)
        } else {
            PrerenderBody::Snapshot(Some(bytes))
        }
    }

    /// Wraps the body of the inner service.
    pub fn passthrough(body: B) -> Self {
        PrerenderBody::Passthrough(body)
    }

    /// Returns `true` if this body holds a snapshot.
    pub fn is_snapshot(&self) -> bool {
        matches!(self, PrerenderBody::Snapshot(_))
    }
}

impl<B> HttpBody for PrerenderBody<B>
where
    B: HttpBody,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            PrerenderBodyProj::Snapshot(data) => {
                Poll::Ready(data.take().map(|bytes| Ok(Frame::data(bytes))))
            }
            PrerenderBodyProj::Passthrough(body) => match body.poll_frame(cx) {
                Poll::Ready(Some(Ok(frame))) => {
                    let frame = frame.map_data(|mut data| data.copy_to_bytes(data.remaining()));
                    Poll::Ready(Some(Ok(frame)))
                }
                Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            },
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            PrerenderBody::Snapshot(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            PrerenderBody::Snapshot(None) => SizeHint::with_exact(0),
            PrerenderBody::Passthrough(body) => body.size_hint(),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            PrerenderBody::Snapshot(data) => data.is_none(),
            PrerenderBody::Passthrough(body) => body.is_end_stream(),
        }
    }
}
