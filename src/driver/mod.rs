//! Session adapters for concrete database drivers.

#[cfg(feature = "rusqlite")]
pub mod rusqlite;
