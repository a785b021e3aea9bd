//! Fund ledger writes and reconciliation.
//!
//! A write is `begin -> insert ledger row -> total = total + delta -> commit`.
//! Any error returns early and drops the open transaction, which rolls
//! back both steps.

use crate::errors::ScError;
use crate::models::{FundEntry, FundEntryType, FundScope, NewFundEntry};
use crate::observability::metrics::record_fund_entry;
use crate::repositories::FundLedger;
use chrono::NaiveDate;
use serde::Serialize;
use std::str::FromStr;
use tracing::{error, info, instrument, warn};

pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Result of a committed ledger write.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedEntry {
    pub entry: FundEntry,
    pub fund_total_cents: i64,
}

/// Ledger sum versus cached total for one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub ledger_sum_cents: i64,
    pub cached_total_cents: i64,
    pub consistent: bool,
}

fn scope_label(scope: FundScope) -> &'static str {
    match scope {
        FundScope::Society(_) => "society",
        FundScope::Building(_) => "building",
    }
}

/// Parse a decimal amount ("1250", "1250.5", "1250.50") into minor units.
///
/// At most two fractional digits; the result must be positive.
pub fn parse_amount_cents(raw: &str) -> Result<i64, ScError> {
    let invalid = || ScError::Validation("Amount must be a positive number".to_string());

    let raw = raw.trim();
    let (whole, fraction) = match raw.split_once('.') {
        Some((_, "")) => return Err(invalid()),
        Some((whole, fraction)) => (whole, fraction),
        None => (raw, ""),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ScError::Validation(
            "Amount may have at most two decimal places".to_string(),
        ));
    }

    let whole: i64 = whole.parse().map_err(|_| invalid())?;
    let fraction_cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse::<i64>().map_err(|_| invalid())?,
    };

    let cents = whole
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction_cents))
        .ok_or_else(invalid)?;

    if cents <= 0 {
        return Err(invalid());
    }
    Ok(cents)
}

/// Validate raw form input into a [`NewFundEntry`]. A missing date means `today`.
pub fn build_entry(
    amount: &str,
    entry_type: &str,
    description: Option<&str>,
    entry_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<NewFundEntry, ScError> {
    let amount_cents = parse_amount_cents(amount)?;
    let entry_type = FundEntryType::from_str(entry_type.trim()).map_err(ScError::Validation)?;

    let description = description.map(str::trim).unwrap_or_default();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ScError::Validation(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }

    Ok(NewFundEntry {
        amount_cents,
        entry_type,
        description: description.to_string(),
        entry_date: entry_date.unwrap_or(today),
    })
}

/// Write one ledger entry and move the cached total by its signed amount.
#[instrument(skip_all, fields(scope = scope_label(scope), entry_type = entry.entry_type.as_str()))]
pub async fn record_entry(
    ledger: &dyn FundLedger,
    scope: FundScope,
    entry: &NewFundEntry,
    created_by: i64,
) -> Result<RecordedEntry, ScError> {
    let result = write_entry(ledger, scope, entry, created_by).await;

    match &result {
        Ok(recorded) => {
            record_fund_entry(scope_label(scope), "committed");
            info!(
                target: "sc.funds",
                entry_id = recorded.entry.id,
                user_id = created_by,
                fund_total_cents = recorded.fund_total_cents,
                "Fund entry recorded"
            );
        }
        Err(e) => {
            record_fund_entry(scope_label(scope), "rolled_back");
            error!(target: "sc.funds", user_id = created_by, error = %e, "Fund entry rolled back");
        }
    }

    result
}

async fn write_entry(
    ledger: &dyn FundLedger,
    scope: FundScope,
    entry: &NewFundEntry,
    created_by: i64,
) -> Result<RecordedEntry, ScError> {
    let mut tx = ledger.begin().await?;
    let row = tx.insert_entry(scope, entry, created_by).await?;
    let fund_total_cents = tx
        .apply_delta(scope, entry.entry_type.delta(entry.amount_cents))
        .await?;
    tx.commit().await?;

    Ok(RecordedEntry {
        entry: row,
        fund_total_cents,
    })
}

/// Compare the ledger sum against the cached total.
pub async fn reconcile(ledger: &dyn FundLedger, scope: FundScope) -> Result<Reconciliation, ScError> {
    let ledger_sum_cents = ledger.ledger_sum(scope).await?;
    let cached_total_cents = ledger.cached_total(scope).await?;
    let consistent = ledger_sum_cents == cached_total_cents;

    if !consistent {
        warn!(
            target: "sc.funds",
            scope = scope_label(scope),
            ledger_sum_cents,
            cached_total_cents,
            "Fund total drifted from ledger"
        );
    }

    Ok(Reconciliation {
        ledger_sum_cents,
        cached_total_cents,
        consistent,
    })
}
