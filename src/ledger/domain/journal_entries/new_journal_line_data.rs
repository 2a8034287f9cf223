use std::{borrow::Cow, collections::HashMap};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::ledger::domain::{
    balance::MAX_LINE_AMOUNT,
    currency::{Currency, CurrencyParseError},
};

use super::EntryLine;

/// A line of a new journal entry, as provided by a user.
#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewJournalLineData {
    /// The code of the account that money is moved to or from. Blank for
    /// lines the user has not filled in yet.
    #[serde(default, alias = "accountCode")]
    pub account: String,

    /// The debit amount. Missing or blank amounts are zero.
    #[serde(default, alias = "debitAmount")]
    pub debit: Option<RawAmount>,

    /// The credit amount. Missing or blank amounts are zero.
    #[serde(default, alias = "creditAmount")]
    pub credit: Option<RawAmount>,

    /// The unique currency code.
    #[serde(default = "default_currency_code")]
    #[validate(length(equal = 3))]
    pub currency: String,

    #[serde(default)]
    pub memo: Option<String>,
}

/// An amount exactly as it was entered, either as a JSON number or as text.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

impl RawAmount {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Number(number) => Cow::from(number.to_string()),
            Self::Text(text) => Cow::from(text.as_str()),
        }
    }
}

fn default_currency_code() -> String {
    "USD".to_owned()
}

impl NewJournalLineData {
    /// Convert the line into an [`EntryLine`] using the line's currency.
    ///
    /// # Arguments
    /// * `currencies` - The known currencies, keyed by code.
    ///
    /// # Returns
    ///
    /// The parsed line, or the field errors that prevented parsing.
    pub fn to_line(
        &self,
        currencies: &HashMap<String, Currency>,
    ) -> Result<EntryLine, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let currency = match currencies.get(&self.currency) {
            Some(currency) => currency,
            None => {
                let mut error = ValidationError::new("unknown_currency");
                error.add_param(Cow::from("value"), &self.currency);
                errors.add("currency", error);

                return Err(errors);
            }
        };

        let debit = match parse_amount(currency, self.debit.as_ref()) {
            Ok(value) => value,
            Err(error) => {
                errors.add("debit", error);
                0
            }
        };

        let credit = match parse_amount(currency, self.credit.as_ref()) {
            Ok(value) => value,
            Err(error) => {
                errors.add("credit", error);
                0
            }
        };

        if debit > 0 && credit > 0 {
            errors.add("credit", ValidationError::new("both_sides"));
        }

        if (debit > 0 || credit > 0) && self.account.trim().is_empty() {
            errors.add("account", ValidationError::new("required"));
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        let mut line = EntryLine::new(self.account.trim(), currency.clone());
        line.set_debit(debit);
        line.set_credit(credit);
        line.set_memo(self.memo.clone());

        Ok(line)
    }
}

fn parse_amount(currency: &Currency, raw: Option<&RawAmount>) -> Result<u64, ValidationError> {
    let raw = match raw {
        Some(raw) => raw.as_text(),
        None => return Ok(0),
    };

    match currency.parse_amount(&raw) {
        Ok(value) => {
            let value = u64::try_from(value).map_err(|_| ValidationError::new("negative"))?;

            if value > MAX_LINE_AMOUNT {
                let mut error = ValidationError::new("too_large");
                error.add_param(Cow::from("max"), &currency.format_value(MAX_LINE_AMOUNT));

                return Err(error);
            }

            Ok(value)
        }
        Err(CurrencyParseError::InvalidNumber(_)) => Err(ValidationError::new("invalid_number")),
        Err(CurrencyParseError::TooManyDecimals(currency, places)) => {
            let mut error = ValidationError::new("too_many_decimals");
            error.add_param(Cow::from("max"), &currency.minor_units());
            error.add_param(Cow::from("found"), &places);

            Err(error)
        }
    }
}
