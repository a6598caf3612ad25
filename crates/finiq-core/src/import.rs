//! CSV import for bank statements (income) and expense transactions
//!
//! Rows that fail to parse are rejected here with the offending raw value, so
//! the estimator and evaluator only ever see well-formed values.

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{IncomeObservation, NewExpense};

/// Header names accepted for the transaction date column
const DATE_HEADERS: &[&str] = &["txn date", "transaction date", "date", "value date"];
/// Header names accepted for the income (credit) column
const CREDIT_HEADERS: &[&str] = &["credit", "deposit", "amount"];
const AMOUNT_HEADERS: &[&str] = &["amount"];
const DESCRIPTION_HEADERS: &[&str] = &["description", "narration", "details"];
const CATEGORY_HEADERS: &[&str] = &["category"];

/// Find a column index by any of the accepted (case-insensitive) header names
fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

/// Parse an income statement into dated observations
///
/// Requires a date column (`Txn Date`, `Date`, ...) and a credit column
/// (`Credit`, `Amount`, ...). A blank credit cell counts as zero, which the
/// estimator then ignores, so debit-only rows pass through harmlessly.
pub fn parse_income_csv<R: Read>(reader: R) -> Result<Vec<IncomeObservation>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let (date_col, credit_col) = match (
        find_column(&headers, DATE_HEADERS),
        find_column(&headers, CREDIT_HEADERS),
    ) {
        (Some(d), Some(c)) => (d, c),
        _ => {
            return Err(Error::Import(
                "CSV must contain at least 'Txn Date' and 'Credit' columns".into(),
            ))
        }
    };

    let mut observations = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        let row = idx + 1;

        let date_str = record.get(date_col).unwrap_or("");
        let date = parse_date(date_str).ok_or_else(|| Error::MalformedRecord {
            row,
            field: "date",
            value: date_str.to_string(),
        })?;

        let credit_str = record.get(credit_col).unwrap_or("");
        let amount = parse_optional_amount(credit_str).ok_or_else(|| Error::MalformedRecord {
            row,
            field: "amount",
            value: credit_str.to_string(),
        })?;

        observations.push(IncomeObservation::new(date, amount));
    }

    debug!("Parsed {} statement rows", observations.len());
    Ok(observations)
}

/// Parse an expense file: `date,amount,description,category`
///
/// Dates may carry a time of day; bare dates are placed at midnight.
/// Amounts keep their sign (negative = money out).
pub fn parse_expense_csv<R: Read>(reader: R) -> Result<Vec<NewExpense>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let (date_col, amount_col) = match (
        find_column(&headers, DATE_HEADERS),
        find_column(&headers, AMOUNT_HEADERS),
    ) {
        (Some(d), Some(a)) => (d, a),
        _ => {
            return Err(Error::Import(
                "CSV must contain at least 'date' and 'amount' columns".into(),
            ))
        }
    };
    let description_col = find_column(&headers, DESCRIPTION_HEADERS);
    let category_col = find_column(&headers, CATEGORY_HEADERS);

    let mut expenses = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        let row = idx + 1;

        let date_str = record.get(date_col).unwrap_or("");
        let date = parse_datetime(date_str).ok_or_else(|| Error::MalformedRecord {
            row,
            field: "date",
            value: date_str.to_string(),
        })?;

        let amount_str = record.get(amount_col).unwrap_or("");
        let amount = parse_amount(amount_str).ok_or_else(|| Error::MalformedRecord {
            row,
            field: "amount",
            value: amount_str.to_string(),
        })?;

        let description = description_col
            .and_then(|c| record.get(c))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let category = category_col
            .and_then(|c| record.get(c))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        expenses.push(NewExpense {
            date,
            amount,
            description,
            category,
        });
    }

    debug!("Parsed {} expense rows", expenses.len());
    Ok(expenses)
}

/// Parse a statement date: `2024-11-01`, `01-11-2024` or `01-Nov-2024`
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-11-01
        "%d-%m-%Y", // 01-11-2024
        "%d-%b-%Y", // 01-Nov-2024
    ];

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse a transaction timestamp, falling back to a bare date at midnight
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%d-%m-%Y %H:%M:%S",
    ];

    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Parse an amount, handling currency symbols, separators and `(x)` negatives
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .replace("Rs.", "")
        .replace("INR", "")
        .replace(['₹', '$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Like `parse_amount`, but a blank cell means zero
fn parse_optional_amount(s: &str) -> Option<f64> {
    if s.trim().is_empty() {
        return Some(0.0);
    }
    parse_amount(s)
}
