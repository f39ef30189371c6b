use crate::{
    AsyncEnumerable, AsyncEnumerator, CancellationToken, Cursor, Defaults, EffectiveMapping,
    EnumeratorSource, Executor, MappingError, MappingOptions, ProjectionPlan, Record, Result,
    stream::Stream,
};
use std::{
    future::{self, Future},
    marker::PhantomData,
};

/// Records projected from the rows of a cursor, the cursor is closed once exhausted.
///
/// The first error ends the iteration.
pub struct Records<T: 'static, C: Cursor> {
    cursor: C,
    plan: ProjectionPlan<T>,
    done: bool,
}

impl<T: 'static, C: Cursor> Records<T, C> {
    pub fn new(cursor: C, plan: ProjectionPlan<T>) -> Self {
        Self {
            cursor,
            plan,
            done: false,
        }
    }

    pub fn plan(&self) -> &ProjectionPlan<T> {
        &self.plan
    }

    fn finish(&mut self) {
        self.done = true;
        if let Err(e) = self.cursor.close() {
            log::error!("{:#}", e);
        }
    }
}

impl<T: Default + 'static, C: Cursor> Iterator for Records<T, C> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.cursor.read() {
            Ok(true) => self.plan.project(&self.cursor),
            Ok(false) => {
                self.finish();
                return None;
            }
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.finish();
        }
        Some(result)
    }
}

/// Run `sql` and project each row into `T`, `options` are resolved against `defaults`.
pub fn query_records<T, E>(
    executor: &mut E,
    sql: &str,
    options: &MappingOptions,
    defaults: &Defaults,
) -> Result<Records<T, E::Cursor>>
where
    T: Record + Default,
    E: Executor,
{
    let options = options.resolve(defaults);
    let mut cursor = executor.query(sql)?;
    match ProjectionPlan::for_cursor(&cursor, T::catalog(options.selection), &options) {
        Ok(plan) => Ok(Records::new(cursor, plan)),
        Err(e) => {
            cursor.close()?;
            Err(e)
        }
    }
}

/// [`EnumeratorSource`] running a query on an owned executor.
///
/// Init issues the query and compiles the plan, fetch advances the cursor and projects
/// the row, dispose (or release, on drop) closes the cursor and the executor.
pub struct QueryEnumeration<E: Executor, T: 'static> {
    executor: Option<E>,
    sql: String,
    options: EffectiveMapping,
    cursor: Option<E::Cursor>,
    plan: Option<ProjectionPlan<T>>,
}

impl<E: Executor, T: 'static> QueryEnumeration<E, T> {
    pub fn new(executor: E, sql: impl Into<String>, options: EffectiveMapping) -> Self {
        Self {
            executor: Some(executor),
            sql: sql.into(),
            options,
            cursor: None,
            plan: None,
        }
    }
}

impl<E, T> EnumeratorSource for QueryEnumeration<E, T>
where
    E: Executor,
    T: Record + Default,
{
    type Item = T;

    fn init(&mut self) -> impl Future<Output = Result<()>> + Send {
        async move {
            let Some(executor) = self.executor.as_mut() else {
                return Err(MappingError::ReaderClosed.into());
            };
            let cursor = executor.query_async(&self.sql).await?;
            self.plan = Some(ProjectionPlan::for_cursor(
                &cursor,
                T::catalog(self.options.selection),
                &self.options,
            )?);
            self.cursor = Some(cursor);
            Ok(())
        }
    }

    fn fetch(&mut self) -> impl Future<Output = Result<Option<T>>> + Send {
        async move {
            let (Some(cursor), Some(plan)) = (self.cursor.as_mut(), self.plan.as_ref()) else {
                return Ok(None);
            };
            if !cursor.read_async().await? {
                return Ok(None);
            }
            plan.project(cursor).map(Some)
        }
    }

    fn dispose(&mut self) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.release())
    }

    fn release(&mut self) -> Result<()> {
        let mut result = Ok(());
        if let Some(mut cursor) = self.cursor.take() {
            result = cursor.close();
        }
        if let Some(mut executor) = self.executor.take() {
            result = result.and(executor.close());
        }
        self.plan = None;
        result
    }
}

/// A query that can be enumerated many times, each enumeration on its own executor clone.
pub struct RecordQuery<E, T> {
    executor: E,
    sql: String,
    options: EffectiveMapping,
    _type: PhantomData<fn() -> T>,
}

impl<E: Executor + Clone, T: Record + Default> RecordQuery<E, T> {
    pub fn new(
        executor: E,
        sql: impl Into<String>,
        options: &MappingOptions,
        defaults: &Defaults,
    ) -> Self {
        Self {
            executor,
            sql: sql.into(),
            options: options.resolve(defaults),
            _type: PhantomData,
        }
    }
}

impl<E: Executor + Clone, T: Record + Default> AsyncEnumerable for RecordQuery<E, T> {
    type Source = QueryEnumeration<E, T>;

    fn source(&self) -> Self::Source {
        QueryEnumeration::new(self.executor.clone(), self.sql.clone(), self.options)
    }
}

/// Stream of the records produced by `sql`, the executor is closed when the stream ends
/// or is dropped.
pub fn stream_records<T, E>(
    executor: E,
    sql: impl Into<String>,
    options: &MappingOptions,
    defaults: &Defaults,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<T>> + Send
where
    T: Record + Default,
    E: Executor + 'static,
{
    AsyncEnumerator::new(QueryEnumeration::new(executor, sql, options.resolve(defaults)))
        .into_stream(cancel)
}
