use crate::{MappingError, Result, stream::Stream};
use async_stream::stream;
use std::future::Future;
pub use tokio_util::sync::CancellationToken;

/// The three operations an [`AsyncEnumerator`] drives.
pub trait EnumeratorSource: Send {
    type Item: Send;

    /// One time initialization, run by the first advance (open, execute).
    fn init(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Next item, `None` once exhausted.
    fn fetch(&mut self) -> impl Future<Output = Result<Option<Self::Item>>> + Send;

    /// Release everything the source holds, called exactly once.
    fn dispose(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Synchronous [`EnumeratorSource::dispose`], run in its place when an enumerator is
    /// dropped before being disposed.
    ///
    /// The default drives `dispose` to completion on the current thread, sources whose
    /// cleanup waits on the runtime must override it.
    fn release(&mut self) -> Result<()> {
        futures::executor::block_on(self.dispose())
    }
}

/// Factory of enumerators, each one owns a fresh source.
pub trait AsyncEnumerable {
    type Source: EnumeratorSource;

    fn source(&self) -> Self::Source;

    fn enumerator(&self) -> AsyncEnumerator<Self::Source> {
        AsyncEnumerator::new(self.source())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumeratorState {
    NotStarted,
    Started,
    Exhausted,
    Disposed,
}

/// Pull based asynchronous iteration over an [`EnumeratorSource`].
///
/// `NotStarted -> Started -> Exhausted`, and `Disposed` from any of them. Only one
/// advance may be in flight, which `&mut self` enforces.
///
/// Cancellation is checked before initialization and before each fetch, when observed
/// there the enumerator becomes exhausted and [`AsyncEnumerator::advance`] returns
/// `false`. A cancellation arriving while init or fetch is pending aborts it and the
/// advance fails with [`MappingError::Cancelled`].
pub struct AsyncEnumerator<S: EnumeratorSource> {
    source: S,
    state: EnumeratorState,
    current: Option<S::Item>,
}

impl<S: EnumeratorSource> AsyncEnumerator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: EnumeratorState::NotStarted,
            current: None,
        }
    }

    pub fn state(&self) -> EnumeratorState {
        self.state
    }

    /// Item produced by the last successful advance.
    pub fn current(&self) -> Option<&S::Item> {
        self.current.as_ref()
    }

    pub fn take_current(&mut self) -> Option<S::Item> {
        self.current.take()
    }

    fn finish(&mut self) {
        self.current = None;
        if self.state != EnumeratorState::Disposed {
            self.state = EnumeratorState::Exhausted;
        }
    }

    /// Move to the next item, `false` when there is none.
    pub async fn advance(&mut self, cancel: &CancellationToken) -> Result<bool> {
        match self.state {
            EnumeratorState::Exhausted | EnumeratorState::Disposed => return Ok(false),
            EnumeratorState::NotStarted => {
                if cancel.is_cancelled() {
                    log::debug!("Enumeration cancelled before initialization");
                    self.finish();
                    return Ok(false);
                }
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    result = self.source.init() => Some(result),
                };
                self.state = EnumeratorState::Started;
                match outcome {
                    None => {
                        self.finish();
                        return Err(MappingError::Cancelled.into());
                    }
                    Some(Err(e)) => {
                        self.finish();
                        return Err(e);
                    }
                    Some(Ok(())) => {}
                }
            }
            EnumeratorState::Started => {}
        }
        if cancel.is_cancelled() {
            log::debug!("Enumeration cancelled before fetching");
            self.finish();
            return Ok(false);
        }
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.source.fetch() => Some(result),
        };
        match outcome {
            Some(Ok(Some(item))) => {
                self.current = Some(item);
                Ok(true)
            }
            Some(Ok(None)) => {
                self.finish();
                Ok(false)
            }
            Some(Err(e)) => {
                self.finish();
                Err(e)
            }
            None => {
                self.finish();
                Err(MappingError::Cancelled.into())
            }
        }
    }

    /// Run the source cleanup, later calls do nothing.
    pub async fn dispose(&mut self) -> Result<()> {
        if self.state == EnumeratorState::Disposed {
            return Ok(());
        }
        self.state = EnumeratorState::Disposed;
        self.current = None;
        self.source.dispose().await
    }

    /// Stream of every remaining item, the enumerator is disposed when the stream ends
    /// and released if the stream is dropped before that.
    pub fn into_stream(
        mut self,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<S::Item>> + Send
    where
        S: 'static,
    {
        stream! {
            loop {
                match self.advance(&cancel).await {
                    Ok(true) => {
                        if let Some(item) = self.take_current() {
                            yield Ok(item);
                        }
                    }
                    Ok(false) => break,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
            if let Err(e) = self.dispose().await {
                log::error!("{:#}", e);
                yield Err(e);
            }
        }
    }
}

impl<S: EnumeratorSource> Drop for AsyncEnumerator<S> {
    fn drop(&mut self) {
        if self.state == EnumeratorState::Disposed {
            return;
        }
        self.state = EnumeratorState::Disposed;
        self.current = None;
        log::debug!("Enumerator dropped before being disposed, releasing its source");
        if let Err(e) = self.source.release() {
            log::error!("{:#}", e);
        }
    }
}
