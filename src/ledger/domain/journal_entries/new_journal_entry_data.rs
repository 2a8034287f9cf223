use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::ledger::domain::{
    accounts::ChartOfAccounts,
    balance::{self, BalanceJudgment, NotPostable},
    currency::Currency,
};

use super::{new_journal_line_data::NewJournalLineData, EntryLine, NewJournalEntry, NewJournalEntryError};

/// Data for a new journal entry provided by a user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewJournalEntryData {
    /// The date that the entry takes effect.
    #[serde(alias = "entryDate")]
    pub date: NaiveDate,

    /// A description of the transaction.
    #[validate(length(min = 1))]
    pub description: String,

    /// An optional external reference, such as an invoice number.
    #[serde(default)]
    pub reference: Option<String>,

    /// The lines of the entry in the order they were entered, including any
    /// rows the user left blank.
    #[validate]
    pub lines: Vec<NewJournalLineData>,
}

/// The reasons a new journal entry may be refused.
#[derive(Debug, Error)]
pub enum JournalEntryRejection {
    /// One or more fields could not be understood.
    #[error("invalid journal entry data")]
    Invalid(#[from] ValidationErrors),

    /// The lines were understood but do not form a postable entry. The
    /// judgment of the lines is included so the caller can show the totals.
    #[error("{reason}")]
    NotPostable {
        reason: NotPostable,
        judgment: BalanceJudgment,
    },

    /// The fields were understood but the entry is incomplete.
    #[error(transparent)]
    Rejected(#[from] NewJournalEntryError),
}

impl NewJournalEntryData {
    /// Validate the data and convert each raw line into an [`EntryLine`].
    ///
    /// Errors for individual lines are reported as a list under the `lines`
    /// key, indexed by the position of the line.
    pub fn parse_lines(
        &self,
        currencies: &HashMap<String, Currency>,
    ) -> Result<Vec<EntryLine>, ValidationErrors> {
        if let Err(validation_error) = self.validate() {
            debug!(?validation_error, "New journal entry failed validation.");

            return Err(validation_error);
        }

        let mut lines = Vec::with_capacity(self.lines.len());
        let mut line_errors: BTreeMap<usize, Box<ValidationErrors>> = BTreeMap::new();

        for (index, line_data) in self.lines.iter().enumerate() {
            match line_data.to_line(currencies) {
                Ok(line) => lines.push(line),
                Err(errors) => {
                    line_errors.insert(index, Box::new(errors));
                }
            }
        }

        if line_errors.is_empty() {
            Ok(lines)
        } else {
            debug!(?line_errors, "New journal entry has invalid lines.");

            let mut errors = ValidationErrors::new();
            errors
                .errors_mut()
                .insert("lines", ValidationErrorsKind::List(line_errors));

            Err(errors)
        }
    }

    /// Construct a new journal entry from the data.
    ///
    /// # Arguments
    /// * `tenant_id` - The tenant the entry belongs to.
    /// * `currencies` - The known currencies, keyed by code.
    /// * `chart` - The tenant's accounts. Every line must use one of them.
    pub fn into_new_entry(
        self,
        tenant_id: Uuid,
        currencies: &HashMap<String, Currency>,
        chart: &ChartOfAccounts,
    ) -> Result<NewJournalEntry, JournalEntryRejection> {
        let lines = self.parse_lines(currencies)?;
        chart.validate_lines(&lines)?;

        let judgment = balance::judge(&lines);

        NewJournalEntry::new(
            tenant_id,
            self.date,
            self.description,
            self.reference,
            lines,
        )
        .map_err(|error| match error {
            NewJournalEntryError::NotPostable(reason) => {
                JournalEntryRejection::NotPostable { reason, judgment }
            }
            other => other.into(),
        })
    }
}
