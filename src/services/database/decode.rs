//! Lenient column readers for MySQL administrative statements.
//!
//! `DESCRIBE`, `SHOW INDEX` and `EXPLAIN` report slightly different column
//! sets and encodings across server versions (binary strings instead of text,
//! unsigned instead of signed counters, columns added over time). These helpers
//! read a column whichever way it arrives and map a missing column to `None`.

use anyhow::Result;
use sqlx::mysql::MySqlRow;
use sqlx::{ColumnIndex, Row};
use std::str::FromStr;

fn is_missing(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::ColumnNotFound(_) | sqlx::Error::ColumnIndexOutOfBounds { .. }
    )
}

pub(crate) fn text<I>(row: &MySqlRow, index: I) -> Result<Option<String>>
where
    I: ColumnIndex<MySqlRow> + Copy,
{
    match row.try_get::<Option<String>, _>(index) {
        Ok(value) => Ok(value),
        Err(e) if is_missing(&e) => Ok(None),
        Err(_) => {
            let bytes: Option<Vec<u8>> = row.try_get(index)?;
            Ok(bytes.map(|b| String::from_utf8_lossy(&b).into_owned()))
        }
    }
}

/// Like [`text`] but NULL and missing both become an empty string.
pub(crate) fn text_or_empty<I>(row: &MySqlRow, index: I) -> Result<String>
where
    I: ColumnIndex<MySqlRow> + Copy,
{
    Ok(text(row, index)?.unwrap_or_default())
}

pub(crate) fn integer<I>(row: &MySqlRow, index: I) -> Result<Option<i64>>
where
    I: ColumnIndex<MySqlRow> + Copy,
{
    match row.try_get::<Option<i64>, _>(index) {
        Ok(value) => return Ok(value),
        Err(e) if is_missing(&e) => return Ok(None),
        Err(_) => {}
    }

    if let Ok(value) = row.try_get::<Option<u64>, _>(index) {
        return Ok(value.map(saturating_i64));
    }

    Ok(parse_trimmed(text(row, index)?))
}

pub(crate) fn float<I>(row: &MySqlRow, index: I) -> Result<Option<f64>>
where
    I: ColumnIndex<MySqlRow> + Copy,
{
    match row.try_get::<Option<f64>, _>(index) {
        Ok(value) => return Ok(value),
        Err(e) if is_missing(&e) => return Ok(None),
        Err(_) => {}
    }

    if let Ok(value) = row.try_get::<Option<f32>, _>(index) {
        return Ok(value.map(f64::from));
    }

    Ok(parse_trimmed(text(row, index)?))
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Numbers sent as text; unparsable values read as `None`.
fn parse_trimmed<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|s| s.trim().parse().ok())
}

/// `DESCRIBE`'s `Null` column: `YES` in any case means nullable.
pub(crate) fn yes_no(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("YES")
}

/// `SHOW INDEX`'s `Non_unique`: only an explicit 0 marks a unique index.
pub(crate) fn unique_flag(non_unique: Option<i64>) -> bool {
    non_unique == Some(0)
}

/// `SHOW INDEX`'s `Seq_in_index`, 1-based; absent means first.
pub(crate) fn sequence_number(seq_in_index: Option<i64>) -> u32 {
    match seq_in_index {
        None => 1,
        Some(n) if n < 0 => 0,
        Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
    }
}
