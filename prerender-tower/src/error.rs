use prerender::RenderError;
use thiserror::Error;

/// Error returned by [`PrerenderService`](crate::PrerenderService).
#[derive(Debug, Error)]
pub enum PrerenderServiceError<E> {
    /// The wrapped service failed.
    #[error(transparent)]
    Inner(E),

    /// A snapshot was due but could not be delivered.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl<E> PrerenderServiceError<E> {
    /// Returns the error of the wrapped service, if that is what failed.
    pub fn into_inner(self) -> Option<E> {
        match self {
            PrerenderServiceError::Inner(e) => Some(e),
            PrerenderServiceError::Render(_) => None,
        }
    }
}
