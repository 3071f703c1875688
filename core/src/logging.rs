//! Tracing utilities for query observability.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site.

/// Emit a debug-level tracing event with the SQL text and parameter count.
///
/// ```ignore
/// relq_trace_query!(&query.text, query.params.len());
/// ```
#[macro_export]
macro_rules! relq_trace_query {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %$sql, params = $param_count, "relq.query");
    };
}

/// Emit a debug-level tracing event when a statement is compiled for reuse.
///
/// ```ignore
/// relq_trace_prepare!(name.as_deref(), &query.text);
/// ```
#[macro_export]
macro_rules! relq_trace_prepare {
    ($name:expr, $sql:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(name = ?$name, sql = %$sql, "relq.prepare");
    };
}
