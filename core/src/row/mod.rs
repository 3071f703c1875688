//! Driver-specific conversions between driver values and [`Value`](crate::value::Value).

#[cfg(feature = "rusqlite")]
mod rusqlite;

#[cfg(feature = "rusqlite")]
pub use self::rusqlite::raw_row;
