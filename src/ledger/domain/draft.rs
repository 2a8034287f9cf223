//! Explicit state for a journal entry that is still being edited.
//!
//! A [`JournalDraft`] is owned by whoever drives the form and changes only
//! through [`JournalDraft::apply()`]. The balance is recomputed from the lines
//! whenever it is asked for, so there is no cached judgment to go stale.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use super::{
    balance::{self, BalanceJudgment, MIN_VALID_LINES},
    currency::Currency,
    journal_entries::{EntryLine, NewJournalEntry, NewJournalEntryError},
};

#[derive(Clone, Debug, PartialEq)]
pub struct JournalDraft {
    date: NaiveDate,
    description: String,
    reference: Option<String>,
    currency: Currency,
    lines: Vec<EntryLine>,
}

/// An edit made to a draft.
#[derive(Clone, Debug, PartialEq)]
pub enum DraftAction {
    SetDate(NaiveDate),
    SetDescription(String),
    SetReference(Option<String>),
    /// Change the currency used for lines added from now on.
    SetCurrency(Currency),
    AddLine,
    RemoveLine(usize),
    SetAccount { line: usize, account: String },
    SetDebit { line: usize, value: u64 },
    SetCredit { line: usize, value: u64 },
    SetMemo { line: usize, memo: Option<String> },
    /// Discard every edit and start over with two empty lines.
    Reset,
}

#[derive(Debug, Eq, Error, PartialEq)]
pub enum DraftError {
    #[error("there is no line {}", .0 + 1)]
    NoSuchLine(usize),

    #[error("a journal entry needs at least {} lines", MIN_VALID_LINES)]
    TooFewLines,
}

impl JournalDraft {
    /// Start a new draft with two empty lines.
    pub fn new(date: NaiveDate, currency: Currency) -> Self {
        Self {
            date,
            description: String::new(),
            reference: None,
            lines: vec![EntryLine::empty(currency.clone()); MIN_VALID_LINES],
            currency,
        }
    }

    /// Apply an edit to the draft. A refused edit leaves the draft unchanged.
    pub fn apply(&mut self, action: DraftAction) -> Result<(), DraftError> {
        match action {
            DraftAction::SetDate(date) => self.date = date,
            DraftAction::SetDescription(description) => self.description = description,
            DraftAction::SetReference(reference) => self.reference = reference,
            DraftAction::SetCurrency(currency) => self.currency = currency,
            DraftAction::AddLine => self.lines.push(EntryLine::empty(self.currency.clone())),
            DraftAction::RemoveLine(line) => {
                self.line_mut(line)?;

                if self.lines.len() <= MIN_VALID_LINES {
                    return Err(DraftError::TooFewLines);
                }

                self.lines.remove(line);
            }
            DraftAction::SetAccount { line, account } => self.line_mut(line)?.set_account(account),
            DraftAction::SetDebit { line, value } => self.line_mut(line)?.set_debit(value),
            DraftAction::SetCredit { line, value } => self.line_mut(line)?.set_credit(value),
            DraftAction::SetMemo { line, memo } => self.line_mut(line)?.set_memo(memo),
            DraftAction::Reset => *self = Self::new(self.date, self.currency.clone()),
        };

        Ok(())
    }

    fn line_mut(&mut self, line: usize) -> Result<&mut EntryLine, DraftError> {
        self.lines.get_mut(line).ok_or(DraftError::NoSuchLine(line))
    }

    pub fn judgment(&self) -> BalanceJudgment {
        balance::judge(&self.lines)
    }

    /// Turn the draft into a new journal entry for a tenant. The draft itself
    /// is left untouched so that a rejected submission can keep being edited.
    pub fn submit(&self, tenant_id: Uuid) -> Result<NewJournalEntry, NewJournalEntryError> {
        NewJournalEntry::new(
            tenant_id,
            self.date,
            self.description.clone(),
            self.reference.clone(),
            self.lines.clone(),
        )
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

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn lines(&self) -> &[EntryLine] {
        &self.lines
    }
}
