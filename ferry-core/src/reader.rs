use crate::{
    Catalog, Cursor, MappingError, Record, Result, Value, check_ordinal,
    stream::{Stream, StreamExt},
};
use std::{fmt, future::Future, pin::Pin, sync::Arc};

enum Source<T> {
    Sync(Box<dyn Iterator<Item = T> + Send>),
    Async(Pin<Box<dyn Stream<Item = Result<T>> + Send>>),
}

impl<T> Source<T> {
    fn has_rows(&self) -> Option<bool> {
        let hint = match self {
            Source::Sync(iter) => iter.size_hint(),
            Source::Async(stream) => stream.size_hint(),
        };
        match hint {
            (_, Some(0)) => Some(false),
            (lower, _) if lower > 0 => Some(true),
            _ => None,
        }
    }
}

/// Exposes a sequence of records as a forward only [`Cursor`].
///
/// One column per catalog field, cells are produced by the field getters on the current
/// record. Only the current record is held, nothing is buffered.
///
/// [`Cursor::look_ahead`] pulls one record in advance when the source size is unknown,
/// so that [`Cursor::has_rows`] is exact afterwards.
///
/// Reading a cell before the first successful [`Cursor::read`] fails with
/// [`MappingError::NoCurrentRow`], after [`Cursor::close`] with
/// [`MappingError::ReaderClosed`]. Advancing a closed or exhausted reader returns `false`.
pub struct RecordReader<T: 'static> {
    catalog: Arc<Catalog<T>>,
    source: Option<Source<T>>,
    ahead: Option<T>,
    current: Option<T>,
    closed: bool,
}

impl<T: Send + 'static> RecordReader<T> {
    pub fn new<I>(items: I, catalog: Arc<Catalog<T>>) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self {
            catalog,
            source: Some(Source::Sync(Box::new(items.into_iter()))),
            ahead: None,
            current: None,
            closed: false,
        }
    }

    pub fn from_stream(
        items: impl Stream<Item = T> + Send + 'static,
        catalog: Arc<Catalog<T>>,
    ) -> Self {
        Self::from_try_stream(items.map(Ok), catalog)
    }

    /// Like [`RecordReader::from_stream`], an error item fails the advance that reaches it.
    pub fn from_try_stream(
        items: impl Stream<Item = Result<T>> + Send + 'static,
        catalog: Arc<Catalog<T>>,
    ) -> Self {
        Self {
            catalog,
            source: Some(Source::Async(Box::pin(items))),
            ahead: None,
            current: None,
            closed: false,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog<T>> {
        &self.catalog
    }

    /// Record reached by the last successful advance.
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    fn advanced(&mut self, item: Option<Result<T>>) -> Result<bool> {
        match item {
            Some(Ok(item)) => {
                self.current = Some(item);
                Ok(true)
            }
            Some(Err(e)) => {
                self.current = None;
                Err(e)
            }
            None => {
                self.current = None;
                self.source = None;
                Ok(false)
            }
        }
    }

    fn needs_look_ahead(&self) -> bool {
        !self.closed
            && self.ahead.is_none()
            && self.source.as_ref().is_some_and(|v| v.has_rows().is_none())
    }

    fn looked_ahead(&mut self, item: Option<Result<T>>) -> Result<()> {
        match item {
            Some(Ok(item)) => self.ahead = Some(item),
            Some(Err(e)) => return Err(e),
            None => self.source = None,
        }
        Ok(())
    }

    fn current_item(&self, ordinal: usize) -> Result<&T> {
        if self.closed {
            return Err(MappingError::ReaderClosed.into());
        }
        check_ordinal(ordinal, self.catalog.len())?;
        self.current
            .as_ref()
            .ok_or_else(|| MappingError::NoCurrentRow.into())
    }
}

impl<T: Record> RecordReader<T> {
    /// Reader over `items` using the default catalog of `T`.
    pub fn of<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::new(items, T::catalog(Default::default()))
    }
}

impl<T: Send + 'static> Cursor for RecordReader<T> {
    fn column_count(&self) -> usize {
        self.catalog.len()
    }

    fn column_name(&self, ordinal: usize) -> Result<&str> {
        check_ordinal(ordinal, self.catalog.len())?;
        Ok(self.catalog.fields()[ordinal].name())
    }

    fn column_type(&self, ordinal: usize) -> Result<Value> {
        check_ordinal(ordinal, self.catalog.len())?;
        Ok(self.catalog.fields()[ordinal].value.clone())
    }

    fn column_nullable(&self, ordinal: usize) -> Result<bool> {
        check_ordinal(ordinal, self.catalog.len())?;
        Ok(self.catalog.fields()[ordinal].nullable)
    }

    fn has_rows(&self) -> Option<bool> {
        if self.closed {
            return Some(false);
        }
        if self.current.is_some() || self.ahead.is_some() {
            return Some(true);
        }
        match &self.source {
            Some(source) => source.has_rows(),
            None => Some(false),
        }
    }

    fn look_ahead(&mut self) -> Result<()> {
        if !self.needs_look_ahead() {
            return Ok(());
        }
        let item = match &mut self.source {
            Some(Source::Sync(iter)) => iter.next().map(Ok),
            Some(Source::Async(stream)) => futures::executor::block_on(stream.next()),
            None => None,
        };
        self.looked_ahead(item)
    }

    fn look_ahead_async(&mut self) -> impl Future<Output = Result<()>> + Send {
        async move {
            if !self.needs_look_ahead() {
                return Ok(());
            }
            let item = match &mut self.source {
                Some(Source::Sync(iter)) => iter.next().map(Ok),
                Some(Source::Async(stream)) => stream.next().await,
                None => None,
            };
            self.looked_ahead(item)
        }
    }

    fn read(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        if let Some(item) = self.ahead.take() {
            return self.advanced(Some(Ok(item)));
        }
        let item = match &mut self.source {
            Some(Source::Sync(iter)) => iter.next().map(Ok),
            Some(Source::Async(stream)) => futures::executor::block_on(stream.next()),
            None => None,
        };
        self.advanced(item)
    }

    fn read_async(&mut self) -> impl Future<Output = Result<bool>> + Send {
        async move {
            if self.closed {
                return Ok(false);
            }
            if let Some(item) = self.ahead.take() {
                return self.advanced(Some(Ok(item)));
            }
            let item = match &mut self.source {
                Some(Source::Sync(iter)) => iter.next().map(Ok),
                Some(Source::Async(stream)) => stream.next().await,
                None => None,
            };
            self.advanced(item)
        }
    }

    fn is_null(&self, ordinal: usize) -> Result<bool> {
        let item = self.current_item(ordinal)?;
        Ok(self.catalog.fields()[ordinal].is_null(item))
    }

    fn get_value(&self, ordinal: usize) -> Result<Value> {
        let item = self.current_item(ordinal)?;
        let field = &self.catalog.fields()[ordinal];
        let value = field.get(item);
        if matches!(field.value, Value::Null) || value.same_type(&field.value) {
            return Ok(value);
        }
        value.coerce(&field.value)
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.source = None;
            self.ahead = None;
            self.current = None;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<T: 'static> fmt::Debug for RecordReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordReader")
            .field("catalog", &self.catalog)
            .field(
                "source",
                &match self.source {
                    Some(Source::Sync(..)) => "sync",
                    Some(Source::Async(..)) => "async",
                    None => "none",
                },
            )
            .field("ahead", &self.ahead.is_some())
            .field("current", &self.current.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}
