use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{
    balance::{self, BalanceJudgment, NotPostable},
    currency::Currency,
};

pub mod new_journal_entry_data;
pub mod new_journal_line_data;

pub use new_journal_entry_data::NewJournalEntryData;
pub use new_journal_line_data::{NewJournalLineData, RawAmount};

/// One debit-or-credit movement against an account.
///
/// Amounts are non-negative integers in the currency's minor units. A line
/// never carries a positive debit and a positive credit at the same time:
/// setting one side to a positive amount zeroes the other.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntryLine {
    account: String,
    debit: u64,
    credit: u64,
    currency: Currency,
    memo: Option<String>,
}

impl EntryLine {
    /// Create a line with no amounts.
    pub fn new<S: Into<String>>(account: S, currency: Currency) -> Self {
        Self {
            account: account.into(),
            debit: 0,
            credit: 0,
            currency,
            memo: None,
        }
    }

    /// Create a line with no account and no amounts, as a freshly added form
    /// row would be.
    pub fn empty(currency: Currency) -> Self {
        Self::new("", currency)
    }

    pub fn with_debit(mut self, value: u64) -> Self {
        self.set_debit(value);
        self
    }

    pub fn with_credit(mut self, value: u64) -> Self {
        self.set_credit(value);
        self
    }

    pub fn with_memo<S: Into<String>>(mut self, memo: S) -> Self {
        self.set_memo(Some(memo.into()));
        self
    }

    pub fn set_account<S: Into<String>>(&mut self, account: S) {
        self.account = account.into();
    }

    pub fn set_debit(&mut self, value: u64) {
        self.debit = value;

        if value > 0 {
            self.credit = 0;
        }
    }

    pub fn set_credit(&mut self, value: u64) {
        self.credit = value;

        if value > 0 {
            self.debit = 0;
        }
    }

    pub fn set_currency(&mut self, currency: Currency) {
        self.currency = currency;
    }

    pub fn set_memo(&mut self, memo: Option<String>) {
        self.memo = memo.filter(|memo| !memo.trim().is_empty());
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn debit(&self) -> u64 {
        self.debit
    }

    pub fn credit(&self) -> u64 {
        self.credit
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref()
    }

    pub fn has_account(&self) -> bool {
        !self.account.trim().is_empty()
    }

    pub fn has_amount(&self) -> bool {
        self.debit > 0 || self.credit > 0
    }

    /// A line is valid when it names an account and moves a positive amount.
    pub fn is_valid(&self) -> bool {
        self.has_account() && self.has_amount()
    }
}

/// A journal entry that has passed validation but has not been stored yet.
///
/// This may only be constructed by calling [`Self::new()`], which prevents
/// construction of entries that are unbalanced or have too few lines.
#[derive(Clone, Debug, PartialEq)]
pub struct NewJournalEntry {
    tenant_id: Uuid,
    date: NaiveDate,
    description: String,
    reference: Option<String>,
    lines: Vec<EntryLine>,
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum NewJournalEntryError {
    #[error("a description is required")]
    MissingDescription,

    /// A line moves an amount without naming the account it moves it to or
    /// from. The value is the zero-based line index.
    #[error("line {} has an amount but no account", .line + 1)]
    MissingAccount { line: usize },

    #[error(transparent)]
    NotPostable(#[from] NotPostable),
}

impl NewJournalEntry {
    /// Construct a new journal entry.
    ///
    /// # Arguments
    /// * `tenant_id` - The tenant whose ledger the entry belongs to.
    /// * `date` - The date the entry takes effect.
    /// * `description` - A description of the transaction.
    /// * `reference` - An optional external reference, eg an invoice number.
    /// * `lines` - The lines as entered. Lines that carry no amount are
    ///   discarded once the entry is accepted.
    pub fn new(
        tenant_id: Uuid,
        date: NaiveDate,
        description: String,
        reference: Option<String>,
        lines: Vec<EntryLine>,
    ) -> Result<Self, NewJournalEntryError> {
        if description.trim().is_empty() {
            return Err(NewJournalEntryError::MissingDescription);
        }

        balance::judge(&lines).ensure_postable()?;

        if let Some(line) = lines
            .iter()
            .position(|line| line.has_amount() && !line.has_account())
        {
            return Err(NewJournalEntryError::MissingAccount { line });
        }

        Ok(Self {
            tenant_id,
            date,
            description,
            reference: reference.filter(|reference| !reference.trim().is_empty()),
            lines: lines.into_iter().filter(EntryLine::has_amount).collect(),
        })
    }

    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn lines(&self) -> &[EntryLine] {
        &self.lines
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Draft,
    Posted,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => f.write_str("draft"),
            Self::Posted => f.write_str("posted"),
        }
    }
}

/// A journal entry that has been stored and assigned an identity.
#[derive(Clone, Debug, PartialEq)]
pub struct JournalEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub entry_number: String,
    pub date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub status: EntryStatus,
    pub lines: Vec<EntryLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn judgment(&self) -> BalanceJudgment {
        balance::judge(&self.lines)
    }

    pub fn is_posted(&self) -> bool {
        self.status == EntryStatus::Posted
    }

    /// Whether any line of the entry moves money through the given account.
    pub fn touches_account(&self, account_code: &str) -> bool {
        self.lines.iter().any(|line| line.account() == account_code)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn usd() -> Currency {
        Currency::new("USD", "$", 2)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn positive_debit_zeroes_credit() {
        let mut line = EntryLine::new("1000", usd()).with_credit(500);

        line.set_debit(700);

        assert_eq!(700, line.debit());
        assert_eq!(0, line.credit());
    }

    #[test]
    fn positive_credit_zeroes_debit() {
        let mut line = EntryLine::new("1000", usd()).with_debit(500);

        line.set_credit(700);

        assert_eq!(0, line.debit());
        assert_eq!(700, line.credit());
    }

    #[test]
    fn zero_debit_keeps_credit() {
        let mut line = EntryLine::new("1000", usd()).with_credit(500);

        line.set_debit(0);

        assert_eq!(0, line.debit());
        assert_eq!(500, line.credit());
    }

    #[test]
    fn new_entry_discards_blank_lines() {
        let lines = vec![
            EntryLine::new("1000", usd()).with_debit(10000),
            EntryLine::empty(usd()),
            EntryLine::new("4000", usd()).with_credit(10000),
            EntryLine::new("2000", usd()),
        ];

        let entry = NewJournalEntry::new(
            Uuid::new_v4(),
            date(),
            "Cash sale".to_owned(),
            Some("".to_owned()),
            lines,
        )
        .expect("entry should be valid");

        let want_lines = vec![
            EntryLine::new("1000", usd()).with_debit(10000),
            EntryLine::new("4000", usd()).with_credit(10000),
        ];

        assert_eq!(want_lines, entry.lines());
        assert_eq!(None, entry.reference());
    }

    #[test]
    fn new_entry_unbalanced() {
        let lines = vec![
            EntryLine::new("1000", usd()).with_debit(10000),
            EntryLine::new("4000", usd()).with_credit(5000),
        ];

        let error = NewJournalEntry::new(
            Uuid::new_v4(),
            date(),
            "Cash sale".to_owned(),
            None,
            lines,
        )
        .expect_err("unbalanced entry should error");

        assert_eq!(
            "unbalanced, difference $50.00",
            error.to_string(),
            "Unexpected error {:?}",
            error
        );
    }

    #[test]
    fn new_entry_amount_without_account() {
        let lines = vec![
            EntryLine::new("1000", usd()).with_debit(10000),
            EntryLine::new("4000", usd()).with_credit(5000),
            EntryLine::empty(usd()).with_credit(5000),
        ];

        let error = NewJournalEntry::new(
            Uuid::new_v4(),
            date(),
            "Cash sale".to_owned(),
            None,
            lines,
        )
        .expect_err("line without account should error");

        assert_eq!(NewJournalEntryError::MissingAccount { line: 2 }, error);
    }

    #[test]
    fn new_entry_missing_description() {
        let lines = vec![
            EntryLine::new("1000", usd()).with_debit(10000),
            EntryLine::new("4000", usd()).with_credit(10000),
        ];

        let error = NewJournalEntry::new(Uuid::new_v4(), date(), "  ".to_owned(), None, lines)
            .expect_err("blank description should error");

        assert_eq!(NewJournalEntryError::MissingDescription, error);
    }
}
