//! Financial reports computed from posted journal entries.
//!
//! Every report covers a single currency. Lines in other currencies and
//! entries that are still drafts are ignored.

use std::{collections::BTreeMap, io};

use chrono::NaiveDate;
use serde::Serialize;

use super::{
    accounts::{Account, AccountType, ChartOfAccounts},
    currency::Currency,
    journal_entries::JournalEntry,
};

/// Debit and credit sums for one account.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct Activity {
    debits: i128,
    credits: i128,
}

impl Activity {
    fn net_debit(&self) -> i128 {
        self.debits - self.credits
    }
}

/// Sum the activity of every account over the posted entries whose date
/// satisfies `in_period`.
fn account_activity<'a, I, F>(
    entries: I,
    currency: &Currency,
    in_period: F,
) -> BTreeMap<&'a str, Activity>
where
    I: IntoIterator<Item = &'a JournalEntry>,
    F: Fn(NaiveDate) -> bool,
{
    let mut activity: BTreeMap<&'a str, Activity> = BTreeMap::new();

    for entry in entries {
        if !entry.is_posted() || !in_period(entry.date) {
            continue;
        }

        for line in entry.lines.iter().filter(|line| line.currency() == currency) {
            let sums = activity.entry(line.account()).or_default();

            sums.debits += i128::from(line.debit());
            sums.credits += i128::from(line.credit());
        }
    }

    activity
}

/// A single account's amount within a report section. The amount is signed
/// so that a positive value is on the account's normal side.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportItem {
    pub account_code: String,
    pub account_name: String,
    pub amount: i128,
}

impl ReportItem {
    fn new(account: &Account, amount: i128) -> Self {
        Self {
            account_code: account.code().to_owned(),
            account_name: account.name().to_owned(),
            amount,
        }
    }
}

fn section(
    chart: &ChartOfAccounts,
    activity: &BTreeMap<&str, Activity>,
    account_type: AccountType,
) -> Vec<ReportItem> {
    chart
        .accounts()
        .filter(|account| account.account_type() == account_type)
        .filter_map(|account| {
            activity.get(account.code()).map(|sums| {
                ReportItem::new(
                    account,
                    account_type.normal_balance(sums.debits, sums.credits),
                )
            })
        })
        .collect()
}

fn total(items: &[ReportItem]) -> i128 {
    items
        .iter()
        .map(|item| item.amount)
        .sum()
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceLine {
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub debit_balance: i128,
    pub credit_balance: i128,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrialBalance {
    pub as_of: NaiveDate,
    pub currency: Currency,
    pub lines: Vec<TrialBalanceLine>,
}

impl TrialBalance {
    /// Compute the trial balance as of the end of a date.
    ///
    /// Each account with posted activity appears once, with its net balance
    /// on the debit or the credit side.
    pub fn compute<'a, I>(
        chart: &ChartOfAccounts,
        currency: &Currency,
        as_of: NaiveDate,
        entries: I,
    ) -> Self
    where
        I: IntoIterator<Item = &'a JournalEntry>,
    {
        let activity = account_activity(entries, currency, |date| date <= as_of);

        let lines = chart
            .accounts()
            .filter_map(|account| {
                activity.get(account.code()).map(|sums| {
                    let net = sums.net_debit();

                    TrialBalanceLine {
                        account_code: account.code().to_owned(),
                        account_name: account.name().to_owned(),
                        account_type: account.account_type(),
                        debit_balance: net.max(0),
                        credit_balance: -net.min(0),
                    }
                })
            })
            .collect();

        Self {
            as_of,
            currency: currency.clone(),
            lines,
        }
    }

    pub fn total_debits(&self) -> i128 {
        self.lines
            .iter()
            .map(|line| line.debit_balance)
            .sum()
    }

    pub fn total_credits(&self) -> i128 {
        self.lines
            .iter()
            .map(|line| line.credit_balance)
            .sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }

    /// Write the trial balance as CSV with a header row and a closing totals
    /// row. Amounts are formatted in the report's currency.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);

        writer.write_record([
            "Account Code",
            "Account Name",
            "Account Type",
            "Debit",
            "Credit",
        ])?;

        for line in &self.lines {
            writer.write_record([
                line.account_code.clone(),
                line.account_name.clone(),
                line.account_type.to_string(),
                self.currency.format_value(line.debit_balance),
                self.currency.format_value(line.credit_balance),
            ])?;
        }

        writer.write_record([
            String::new(),
            "Total".to_owned(),
            String::new(),
            self.currency.format_value(self.total_debits()),
            self.currency.format_value(self.total_credits()),
        ])?;

        writer.flush()?;

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProfitAndLoss {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub currency: Currency,
    pub revenue: Vec<ReportItem>,
    pub expenses: Vec<ReportItem>,
}

impl ProfitAndLoss {
    /// Compute revenue and expenses for the period from `from` to `to`,
    /// both inclusive.
    pub fn compute<'a, I>(
        chart: &ChartOfAccounts,
        currency: &Currency,
        from: NaiveDate,
        to: NaiveDate,
        entries: I,
    ) -> Self
    where
        I: IntoIterator<Item = &'a JournalEntry>,
    {
        let activity = account_activity(entries, currency, |date| from <= date && date <= to);

        Self {
            from,
            to,
            currency: currency.clone(),
            revenue: section(chart, &activity, AccountType::Revenue),
            expenses: section(chart, &activity, AccountType::Expense),
        }
    }

    pub fn total_revenue(&self) -> i128 {
        total(&self.revenue)
    }

    pub fn total_expenses(&self) -> i128 {
        total(&self.expenses)
    }

    pub fn net_income(&self) -> i128 {
        self.total_revenue() - self.total_expenses()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub currency: Currency,
    pub assets: Vec<ReportItem>,
    pub liabilities: Vec<ReportItem>,
    pub equity: Vec<ReportItem>,
    /// Revenue minus expenses for everything posted up to the report date
    /// that has not been closed into an equity account.
    pub current_earnings: i128,
}

impl BalanceSheet {
    pub fn compute<'a, I>(
        chart: &ChartOfAccounts,
        currency: &Currency,
        as_of: NaiveDate,
        entries: I,
    ) -> Self
    where
        I: IntoIterator<Item = &'a JournalEntry>,
    {
        let activity = account_activity(entries, currency, |date| date <= as_of);

        let revenue = total(&section(chart, &activity, AccountType::Revenue));
        let expenses = total(&section(chart, &activity, AccountType::Expense));

        Self {
            as_of,
            currency: currency.clone(),
            assets: section(chart, &activity, AccountType::Asset),
            liabilities: section(chart, &activity, AccountType::Liability),
            equity: section(chart, &activity, AccountType::Equity),
            current_earnings: revenue - expenses,
        }
    }

    pub fn total_assets(&self) -> i128 {
        total(&self.assets)
    }

    pub fn total_liabilities(&self) -> i128 {
        total(&self.liabilities)
    }

    pub fn total_equity(&self) -> i128 {
        total(&self.equity)
    }

    /// Assets must equal liabilities plus equity plus current earnings.
    pub fn is_balanced(&self) -> bool {
        self.total_assets()
            == self.total_liabilities() + self.total_equity() + self.current_earnings
    }
}
