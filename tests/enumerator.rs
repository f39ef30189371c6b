mod common;

#[cfg(test)]
mod tests {
    use crate::common::init_logs;
    use ferry::{
        AsyncEnumerable, AsyncEnumerator, CancellationToken, EnumeratorSource, EnumeratorState,
        Error, MappingError, Result,
        stream::{StreamExt, TryStreamExt},
    };
    use std::{
        collections::VecDeque,
        future::{self, Future},
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    #[derive(Default)]
    struct Counters {
        init: AtomicUsize,
        fetch: AtomicUsize,
        dispose: AtomicUsize,
    }

    impl Counters {
        fn get(&self) -> (usize, usize, usize) {
            (
                self.init.load(Ordering::SeqCst),
                self.fetch.load(Ordering::SeqCst),
                self.dispose.load(Ordering::SeqCst),
            )
        }
    }

    enum Behavior {
        Items,
        FailAt(usize),
        HangAt(usize),
    }

    struct Numbers {
        items: VecDeque<i32>,
        behavior: Behavior,
        counters: Arc<Counters>,
    }

    impl Numbers {
        fn new(items: impl IntoIterator<Item = i32>, behavior: Behavior) -> (Self, Arc<Counters>) {
            let counters = Arc::new(Counters::default());
            (
                Self {
                    items: items.into_iter().collect(),
                    behavior,
                    counters: counters.clone(),
                },
                counters,
            )
        }
    }

    impl EnumeratorSource for Numbers {
        type Item = i32;

        fn init(&mut self) -> impl Future<Output = Result<()>> + Send {
            self.counters.init.fetch_add(1, Ordering::SeqCst);
            future::ready(Ok(()))
        }

        fn fetch(&mut self) -> impl Future<Output = Result<Option<i32>>> + Send {
            async move {
                let count = self.counters.fetch.fetch_add(1, Ordering::SeqCst);
                match self.behavior {
                    Behavior::FailAt(at) if at == count => {
                        return Err(Error::msg("The source failed"));
                    }
                    Behavior::HangAt(at) if at == count => {
                        future::pending::<()>().await;
                    }
                    _ => {}
                }
                Ok(self.items.pop_front())
            }
        }

        fn dispose(&mut self) -> impl Future<Output = Result<()>> + Send {
            self.counters.dispose.fetch_add(1, Ordering::SeqCst);
            future::ready(Ok(()))
        }
    }

    struct Range(i32);

    impl AsyncEnumerable for Range {
        type Source = Numbers;
        fn source(&self) -> Numbers {
            Numbers::new(0..self.0, Behavior::Items).0
        }
    }

    #[tokio::test]
    async fn enumerator_advance() {
        init_logs();
        let (source, counters) = Numbers::new([1, 2, 3], Behavior::Items);
        let mut enumerator = AsyncEnumerator::new(source);
        let cancel = CancellationToken::new();
        assert_eq!(enumerator.state(), EnumeratorState::NotStarted);
        assert_eq!(counters.get(), (0, 0, 0));

        let mut items = Vec::new();
        while enumerator.advance(&cancel).await.unwrap() {
            assert_eq!(enumerator.state(), EnumeratorState::Started);
            items.push(*enumerator.current().unwrap());
        }
        assert_eq!(items, [1, 2, 3]);
        assert_eq!(enumerator.state(), EnumeratorState::Exhausted);
        assert!(enumerator.current().is_none());
        assert!(!enumerator.advance(&cancel).await.unwrap());
        assert_eq!(counters.get(), (1, 4, 0));

        enumerator.dispose().await.unwrap();
        enumerator.dispose().await.unwrap();
        assert_eq!(enumerator.state(), EnumeratorState::Disposed);
        assert!(!enumerator.advance(&cancel).await.unwrap());
        assert_eq!(counters.get(), (1, 4, 1));
    }

    #[tokio::test]
    async fn enumerator_cancelled_before_start() {
        let (source, counters) = Numbers::new([1, 2, 3], Behavior::Items);
        let mut enumerator = AsyncEnumerator::new(source);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(cancel.is_cancelled());
        assert!(!enumerator.advance(&cancel).await.unwrap());
        assert_eq!(enumerator.state(), EnumeratorState::Exhausted);
        assert_eq!(counters.get(), (0, 0, 0));
        enumerator.dispose().await.unwrap();
        enumerator.dispose().await.unwrap();
        assert_eq!(counters.get(), (0, 0, 1));
    }

    #[tokio::test]
    async fn enumerator_cancelled_between_items() {
        let (source, counters) = Numbers::new([1, 2, 3], Behavior::Items);
        let mut enumerator = AsyncEnumerator::new(source);
        let cancel = CancellationToken::new();
        assert!(enumerator.advance(&cancel).await.unwrap());
        cancel.cancel();
        assert!(!enumerator.advance(&cancel).await.unwrap());
        assert_eq!(enumerator.state(), EnumeratorState::Exhausted);
        enumerator.dispose().await.unwrap();
        assert_eq!(counters.get(), (1, 1, 1));
    }

    #[tokio::test]
    async fn enumerator_cancelled_while_pending() {
        let (source, counters) = Numbers::new([1, 2, 3], Behavior::HangAt(1));
        let mut enumerator = AsyncEnumerator::new(source);
        let cancel = CancellationToken::new();
        assert!(enumerator.advance(&cancel).await.unwrap());
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let error = enumerator.advance(&cancel).await.unwrap_err();
        assert_eq!(
            error.downcast_ref::<MappingError>(),
            Some(&MappingError::Cancelled)
        );
        assert_eq!(enumerator.state(), EnumeratorState::Exhausted);
        enumerator.dispose().await.unwrap();
        assert_eq!(counters.get(), (1, 2, 1));
    }

    #[tokio::test]
    async fn enumerator_failure() {
        let (source, counters) = Numbers::new([1, 2, 3], Behavior::FailAt(1));
        let mut enumerator = AsyncEnumerator::new(source);
        let cancel = CancellationToken::new();
        assert!(enumerator.advance(&cancel).await.unwrap());
        let error = enumerator.advance(&cancel).await.unwrap_err();
        assert_eq!(error.to_string(), "The source failed");
        assert_eq!(enumerator.state(), EnumeratorState::Exhausted);
        assert!(!enumerator.advance(&cancel).await.unwrap());
        enumerator.dispose().await.unwrap();
        assert_eq!(counters.get(), (1, 2, 1));
    }

    #[tokio::test]
    async fn enumerator_stream() {
        let (source, counters) = Numbers::new([4, 5, 6], Behavior::Items);
        let items = AsyncEnumerator::new(source)
            .into_stream(CancellationToken::new())
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(items, [4, 5, 6]);
        assert_eq!(counters.get(), (1, 4, 1));

        let (source, counters) = Numbers::new([4, 5, 6], Behavior::FailAt(2));
        let results = AsyncEnumerator::new(source)
            .into_stream(CancellationToken::new())
            .collect::<Vec<_>>()
            .await;
        assert_eq!(results.len(), 3);
        assert!(results[..2].iter().all(Result::is_ok));
        assert!(results[2].is_err());
        assert_eq!(counters.get(), (1, 3, 1));
    }

    #[tokio::test]
    async fn enumerator_stream_dropped_early() {
        let (source, counters) = Numbers::new([4, 5, 6], Behavior::Items);
        let items = AsyncEnumerator::new(source)
            .into_stream(CancellationToken::new())
            .take(2)
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(items, [4, 5]);
        assert_eq!(counters.get(), (1, 2, 1));
    }

    #[tokio::test]
    async fn enumerator_dropped_without_dispose() {
        let (source, counters) = Numbers::new([1, 2, 3], Behavior::Items);
        let mut enumerator = AsyncEnumerator::new(source);
        assert!(enumerator.advance(&CancellationToken::new()).await.unwrap());
        drop(enumerator);
        assert_eq!(counters.get(), (1, 1, 1));

        // Never started, the source is released all the same
        let (source, counters) = Numbers::new([1], Behavior::Items);
        drop(AsyncEnumerator::new(source));
        assert_eq!(counters.get(), (0, 0, 1));

        // Disposed sources are not released twice
        let (source, counters) = Numbers::new([1], Behavior::Items);
        let mut enumerator = AsyncEnumerator::new(source);
        enumerator.dispose().await.unwrap();
        drop(enumerator);
        assert_eq!(counters.get(), (0, 0, 1));
    }

    #[tokio::test]
    async fn enumerable_restarts() {
        let range = Range(3);
        for _ in 0..2 {
            let mut enumerator = range.enumerator();
            let cancel = CancellationToken::new();
            let mut items = Vec::new();
            while enumerator.advance(&cancel).await.unwrap() {
                items.push(enumerator.take_current().unwrap());
            }
            enumerator.dispose().await.unwrap();
            assert_eq!(items, [0, 1, 2]);
        }
    }

    #[tokio::test]
    async fn cancellation_token_wakes_waiters() {
        let cancel = CancellationToken::new();
        let waiter = tokio::spawn({
            let cancel = cancel.clone();
            async move { cancel.cancelled().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("The waiter was not woken up")
            .unwrap();
        // Already cancelled, completes immediately
        cancel.cancelled().await;
    }
}
