//! Double-entry balance validation.
//!
//! Every path that accepts journal lines (the draft reducer, request data and
//! the offline `check` command) judges them here, so there is exactly one
//! definition of a postable entry.

use std::collections::BTreeMap;

use thiserror::Error;

use super::{
    currency::{Currency, CurrencyAmount},
    journal_entries::EntryLine,
};

/// The minimum number of valid lines a postable entry must contain.
pub const MIN_VALID_LINES: usize = 2;

/// The largest amount, in minor units, a single line may carry on either
/// side.
pub const MAX_LINE_AMOUNT: u64 = 999_999_999_999_999;

/// Debit and credit sums for a single currency.
///
/// Lines carry at most `u64::MAX` minor units on a side, so no slice of
/// lines is long enough to overflow an `i128` sum.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CurrencyTotals {
    currency: Currency,
    debits: i128,
    credits: i128,
}

impl CurrencyTotals {
    pub fn new(currency: Currency, debits: i128, credits: i128) -> Self {
        Self {
            currency,
            debits,
            credits,
        }
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn debits(&self) -> i128 {
        self.debits
    }

    pub fn credits(&self) -> i128 {
        self.credits
    }

    /// Debits minus credits, in minor units.
    pub fn net(&self) -> i128 {
        self.debits - self.credits
    }

    /// The absolute difference between debits and credits, in minor units.
    pub fn difference(&self) -> i128 {
        self.net().abs()
    }

    /// Amounts are integers of minor units, so a difference smaller than one
    /// minor unit is exactly zero.
    pub fn is_balanced(&self) -> bool {
        self.debits == self.credits
    }

    pub fn formatted_difference(&self) -> String {
        self.currency.format_with_symbol(self.difference())
    }
}

/// The result of judging a set of journal lines.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BalanceJudgment {
    totals: Vec<CurrencyTotals>,
    valid_line_count: usize,
}

impl BalanceJudgment {
    /// Per-currency sums, ordered by currency code.
    pub fn totals(&self) -> &[CurrencyTotals] {
        &self.totals
    }

    pub fn valid_line_count(&self) -> usize {
        self.valid_line_count
    }

    pub fn is_balanced(&self) -> bool {
        self.totals.iter().all(CurrencyTotals::is_balanced)
    }

    pub fn has_enough_lines(&self) -> bool {
        self.valid_line_count >= MIN_VALID_LINES
    }

    pub fn is_postable(&self) -> bool {
        self.ensure_postable().is_ok()
    }

    /// The difference for a single currency. Currencies that no line carries
    /// an amount in have no difference.
    pub fn difference_in(&self, currency_code: &str) -> i128 {
        self.totals
            .iter()
            .find(|totals| totals.currency().code() == currency_code)
            .map(CurrencyTotals::difference)
            .unwrap_or(0)
    }

    /// The signed outstanding balance (debits minus credits) of every
    /// currency that does not balance.
    pub fn imbalances(&self) -> Vec<CurrencyAmount> {
        self.totals
            .iter()
            .filter(|totals| !totals.is_balanced())
            .map(|totals| CurrencyAmount::from_minor(totals.currency().clone(), totals.net()))
            .collect()
    }

    /// Decide whether the judged lines may be posted.
    ///
    /// The line count is checked first: a single line is rejected for having
    /// too few lines even though it is also unbalanced.
    pub fn ensure_postable(&self) -> Result<(), NotPostable> {
        if !self.has_enough_lines() {
            return Err(NotPostable::InsufficientLines {
                found: self.valid_line_count,
            });
        }

        let unbalanced: Vec<CurrencyTotals> = self
            .totals
            .iter()
            .filter(|totals| !totals.is_balanced())
            .cloned()
            .collect();

        if unbalanced.is_empty() {
            Ok(())
        } else {
            Err(NotPostable::Unbalanced(unbalanced))
        }
    }
}

/// The reason a set of lines cannot be posted.
///
/// This is never fatal; the lines may be edited and judged again.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum NotPostable {
    #[error("at least two lines are required")]
    InsufficientLines { found: usize },

    #[error("unbalanced, difference {}", format_differences(.0))]
    Unbalanced(Vec<CurrencyTotals>),
}

fn format_differences(totals: &[CurrencyTotals]) -> String {
    totals
        .iter()
        .map(CurrencyTotals::formatted_difference)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Judge a set of journal lines.
///
/// Debits and credits are summed per currency across every line, including
/// lines without an account. Lines count as valid when they name an account
/// and carry a positive amount on either side.
pub fn judge(lines: &[EntryLine]) -> BalanceJudgment {
    let mut sums: BTreeMap<&str, CurrencyTotals> = BTreeMap::new();
    let mut valid_line_count = 0;

    for line in lines {
        if line.is_valid() {
            valid_line_count += 1;
        }

        if line.debit() == 0 && line.credit() == 0 {
            continue;
        }

        let totals = sums
            .entry(line.currency().code())
            .or_insert_with(|| CurrencyTotals::new(line.currency().clone(), 0, 0));

        totals.debits += i128::from(line.debit());
        totals.credits += i128::from(line.credit());
    }

    BalanceJudgment {
        totals: sums.into_values().collect(),
        valid_line_count,
    }
}
