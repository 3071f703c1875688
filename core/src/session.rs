//! Database session collaborators and reusable prepared queries.
//!
//! Drivers implement [`Session`] (blocking) or [`AsyncSession`]. A session
//! only runs rendered [`Query`]s; everything above that, including SQL
//! generation and row reassembly, happens in this crate.

use std::future::Future;

use compact_str::CompactString;
use relq_types::Dialect;

use crate::error::Result;
use crate::query::RawRow;
use crate::sql::Query;

/// Maps the raw rows of one execution into the query result.
pub type RowMapper<'s, T> = Box<dyn Fn(Vec<RawRow>) -> Result<T> + Send + Sync + 's>;

/// A blocking database session.
pub trait Session {
    /// Dialect the session speaks.
    fn dialect(&self) -> Dialect;

    /// Compiles or registers `query` with the driver.
    ///
    /// Drivers without server-side preparation can rely on the default.
    fn prepare(&self, query: &Query, name: Option<&str>) -> Result<()> {
        let _ = (query, name);
        Ok(())
    }

    /// Runs `query` and returns every row, one value per selected expression.
    fn all(&self, query: &Query) -> Result<Vec<RawRow>>;

    /// Runs a statement that returns no rows, yielding the affected row count.
    fn execute(&self, query: &Query) -> Result<u64>;

    /// Prepares `query` and wraps it with `mapper` into a reusable
    /// [`PreparedQuery`].
    fn prepare_query<'s, T>(
        &'s self,
        query: Query,
        name: Option<&str>,
        mapper: RowMapper<'s, T>,
    ) -> Result<PreparedQuery<'s, Self, T>>
    where
        Self: Sized,
    {
        crate::relq_trace_prepare!(name, &query.text);
        self.prepare(&query, name)?;
        Ok(PreparedQuery::new(self, query, name, mapper))
    }
}

/// An asynchronous database session.
pub trait AsyncSession {
    /// Dialect the session speaks.
    fn dialect(&self) -> Dialect;

    /// Compiles or registers `query` with the driver.
    fn prepare(
        &self,
        query: &Query,
        name: Option<&str>,
    ) -> impl Future<Output = Result<()>> + Send {
        let _ = (query, name);
        async { Ok(()) }
    }

    /// Runs `query` and returns every row.
    fn all(&self, query: &Query) -> impl Future<Output = Result<Vec<RawRow>>> + Send;

    /// Runs a statement that returns no rows.
    fn execute(&self, query: &Query) -> impl Future<Output = Result<u64>> + Send;

    /// Prepares `query` and wraps it with `mapper` into a reusable
    /// [`PreparedQuery`].
    fn prepare_query<'s, T>(
        &'s self,
        query: Query,
        name: Option<&str>,
        mapper: RowMapper<'s, T>,
    ) -> impl Future<Output = Result<PreparedQuery<'s, Self, T>>> + Send
    where
        Self: Sized + Sync,
    {
        let name = name.map(CompactString::from);
        async move {
            crate::relq_trace_prepare!(name.as_deref(), &query.text);
            self.prepare(&query, name.as_deref()).await?;
            Ok(PreparedQuery::new(self, query, name.as_deref(), mapper))
        }
    }
}

/// A compiled query bound to its session.
///
/// Executing never recompiles: the stored text and parameters are sent as-is
/// and the mapper runs once per execution.
pub struct PreparedQuery<'s, S: ?Sized, T> {
    session: &'s S,
    query: Query,
    name: Option<CompactString>,
    mapper: RowMapper<'s, T>,
}

impl<S: ?Sized, T> core::fmt::Debug for PreparedQuery<'_, S, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PreparedQuery")
            .field("name", &self.name)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl<'s, S: ?Sized, T> PreparedQuery<'s, S, T> {
    pub fn new(session: &'s S, query: Query, name: Option<&str>, mapper: RowMapper<'s, T>) -> Self {
        Self {
            session,
            query,
            name: name.map(CompactString::from),
            mapper,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The compiled statement.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Maps rows fetched elsewhere, e.g. from a batch.
    pub fn map_rows(&self, rows: Vec<RawRow>) -> Result<T> {
        (self.mapper)(rows)
    }
}

impl<S: Session + ?Sized, T> PreparedQuery<'_, S, T> {
    /// Runs the prepared statement.
    pub fn execute(&self) -> Result<T> {
        crate::relq_trace_query!(&self.query.text, self.query.params.len());
        let rows = self.session.all(&self.query)?;
        (self.mapper)(rows)
    }
}

impl<S: AsyncSession + ?Sized, T> PreparedQuery<'_, S, T> {
    /// Runs the prepared statement.
    pub async fn execute_async(&self) -> Result<T> {
        crate::relq_trace_query!(&self.query.text, self.query.params.len());
        let rows = self.session.all(&self.query).await?;
        (self.mapper)(rows)
    }
}
