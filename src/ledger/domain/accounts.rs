use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use super::journal_entries::EntryLine;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    /// Assets and expenses grow with debits. Every other type grows with
    /// credits.
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, Self::Asset | Self::Expense)
    }

    /// The balance of an account of this type, signed so that a positive
    /// value is on the account's normal side.
    pub fn normal_balance(&self, debits: i128, credits: i128) -> i128 {
        if self.is_debit_normal() {
            debits - credits
        } else {
            credits - debits
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
#[error("unknown account type: {0}")]
pub struct UnknownAccountType(String);

impl FromStr for AccountType {
    type Err = UnknownAccountType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" | "income" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            _ => Err(UnknownAccountType(s.to_owned())),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Account {
    code: String,
    name: String,
    account_type: AccountType,
}

impl Account {
    pub fn new<C: Into<String>, N: Into<String>>(
        code: C,
        name: N,
        account_type: AccountType,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }
}

/// Data for a new account provided by a user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAccountData {
    #[validate(length(min = 1, max = 20))]
    pub code: String,

    #[validate(length(min = 1, max = 100))]
    pub name: String,

    pub account_type: AccountType,
}

impl NewAccountData {
    pub fn into_account(self) -> Result<Account, ValidationErrors> {
        self.validate()?;

        Ok(Account::new(self.code.trim(), self.name.trim(), self.account_type))
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
#[error("an account with the code {0} already exists")]
pub struct DuplicateAccount(pub String);

/// The accounts of a single tenant, ordered by code.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartOfAccounts {
    accounts: BTreeMap<String, Account>,
}

impl ChartOfAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<&Account> {
        self.accounts.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.accounts.contains_key(code)
    }

    pub fn insert(&mut self, account: Account) -> Result<(), DuplicateAccount> {
        if self.contains(account.code()) {
            return Err(DuplicateAccount(account.code().to_owned()));
        }

        self.accounts.insert(account.code().to_owned(), account);

        Ok(())
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Check that every line naming an account names one in this chart.
    ///
    /// Errors are reported the same way as other line errors: a list under
    /// the `lines` key, indexed by the position of the line.
    pub fn validate_lines(&self, lines: &[EntryLine]) -> Result<(), ValidationErrors> {
        let mut line_errors: BTreeMap<usize, Box<ValidationErrors>> = BTreeMap::new();

        for (index, line) in lines.iter().enumerate() {
            if !line.has_account() || self.contains(line.account()) {
                continue;
            }

            let mut error = ValidationError::new("unknown_account");
            error.add_param(Cow::from("value"), &line.account());

            let mut errors = ValidationErrors::new();
            errors.add("account", error);
            line_errors.insert(index, Box::new(errors));
        }

        if line_errors.is_empty() {
            return Ok(());
        }

        let mut errors = ValidationErrors::new();
        errors
            .errors_mut()
            .insert("lines", ValidationErrorsKind::List(line_errors));

        Err(errors)
    }

    /// Group the accounts by type.
    pub fn by_type(&self) -> HashMap<AccountType, Vec<&Account>> {
        let mut grouped: HashMap<AccountType, Vec<&Account>> = HashMap::new();

        for account in self.accounts() {
            grouped.entry(account.account_type()).or_default().push(account);
        }

        grouped
    }
}

impl FromIterator<Account> for ChartOfAccounts {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        Self {
            accounts: iter
                .into_iter()
                .map(|account| (account.code().to_owned(), account))
                .collect(),
        }
    }
}

/// The chart every new tenant starts with.
pub fn default_chart() -> ChartOfAccounts {
    use AccountType::*;

    [
        ("1000", "Cash", Asset),
        ("1100", "Accounts Receivable", Asset),
        ("1500", "Equipment", Asset),
        ("2000", "Accounts Payable", Liability),
        ("2100", "Accrued Expenses", Liability),
        ("3000", "Owner's Equity", Equity),
        ("4000", "Sales Revenue", Revenue),
        ("4100", "Service Revenue", Revenue),
        ("6000", "Office Rent", Expense),
        ("6100", "Salaries", Expense),
        ("6200", "Utilities", Expense),
    ]
    .into_iter()
    .map(|(code, name, account_type)| Account::new(code, name, account_type))
    .collect()
}
