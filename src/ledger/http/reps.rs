use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::ledger::domain::{
    self,
    accounts::AccountType,
    currency::Currency,
    journal_entries::EntryStatus,
    reports::{ReportItem, TrialBalanceLine},
};

#[derive(Serialize)]
pub struct ResourceCollection<T: Serialize> {
    pub items: Vec<T>,
}

#[derive(Clone, Serialize)]
pub struct CurrencyAmount {
    pub currency: String,
    pub value: String,
}

impl From<&domain::currency::CurrencyAmount> for CurrencyAmount {
    fn from(amount: &domain::currency::CurrencyAmount) -> Self {
        Self {
            currency: amount.currency().code().to_owned(),
            value: amount.format_value(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
}

impl From<&domain::accounts::Account> for Account {
    fn from(account: &domain::accounts::Account) -> Self {
        Self {
            code: account.code().to_owned(),
            name: account.name().to_owned(),
            account_type: account.account_type(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotals {
    pub currency: String,
    pub debits: String,
    pub credits: String,
    pub difference: String,
    pub balanced: bool,
}

impl From<&domain::balance::CurrencyTotals> for CurrencyTotals {
    fn from(totals: &domain::balance::CurrencyTotals) -> Self {
        let currency = totals.currency();

        Self {
            currency: currency.code().to_owned(),
            debits: currency.format_value(totals.debits()),
            credits: currency.format_value(totals.credits()),
            difference: currency.format_value(totals.difference()),
            balanced: totals.is_balanced(),
        }
    }
}

/// The judgment of a set of lines, as shown next to an entry form.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceJudgment {
    pub balanced: bool,
    /// The difference when every amount is in one currency. Lines in
    /// several currencies only have a difference per currency in `totals`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<String>,
    pub valid_line_count: usize,
    pub has_enough_lines: bool,
    pub postable: bool,
    /// Why the lines cannot be posted, if they cannot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub totals: Vec<CurrencyTotals>,
    /// Signed debits minus credits for each currency that does not balance.
    pub imbalances: Vec<CurrencyAmount>,
}

impl From<&domain::balance::BalanceJudgment> for BalanceJudgment {
    fn from(judgment: &domain::balance::BalanceJudgment) -> Self {
        let difference = match judgment.totals() {
            [] => Some("0.00".to_owned()),
            [totals] => Some(totals.currency().format_value(totals.difference())),
            _ => None,
        };

        Self {
            balanced: judgment.is_balanced(),
            difference,
            valid_line_count: judgment.valid_line_count(),
            has_enough_lines: judgment.has_enough_lines(),
            postable: judgment.is_postable(),
            reason: judgment.ensure_postable().err().map(|reason| reason.to_string()),
            totals: judgment.totals().iter().map(CurrencyTotals::from).collect(),
            imbalances: judgment
                .imbalances()
                .iter()
                .map(CurrencyAmount::from)
                .collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryLine {
    pub account: String,
    pub debit: String,
    pub credit: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl From<&domain::journal_entries::EntryLine> for EntryLine {
    fn from(line: &domain::journal_entries::EntryLine) -> Self {
        let currency = line.currency();

        Self {
            account: line.account().to_owned(),
            debit: currency.format_value(line.debit()),
            credit: currency.format_value(line.credit()),
            currency: currency.code().to_owned(),
            memo: line.memo().map(String::from),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: Uuid,
    pub entry_number: String,
    pub date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub status: EntryStatus,
    pub lines: Vec<EntryLine>,
    pub totals: Vec<CurrencyTotals>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&domain::journal_entries::JournalEntry> for JournalEntry {
    fn from(entry: &domain::journal_entries::JournalEntry) -> Self {
        Self {
            id: entry.id,
            entry_number: entry.entry_number.clone(),
            date: entry.date,
            description: entry.description.clone(),
            reference: entry.reference.clone(),
            status: entry.status,
            lines: entry.lines.iter().map(EntryLine::from).collect(),
            totals: entry
                .judgment()
                .totals()
                .iter()
                .map(CurrencyTotals::from)
                .collect(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLine {
    pub account_code: String,
    pub account_name: String,
    pub amount: String,
}

fn report_lines(currency: &Currency, items: &[ReportItem]) -> Vec<ReportLine> {
    items
        .iter()
        .map(|item| ReportLine {
            account_code: item.account_code.clone(),
            account_name: item.account_name.clone(),
            amount: currency.format_value(item.amount),
        })
        .collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceRow {
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub debit_balance: String,
    pub credit_balance: String,
}

impl TrialBalanceRow {
    fn new(currency: &Currency, line: &TrialBalanceLine) -> Self {
        Self {
            account_code: line.account_code.clone(),
            account_name: line.account_name.clone(),
            account_type: line.account_type,
            debit_balance: currency.format_value(line.debit_balance),
            credit_balance: currency.format_value(line.credit_balance),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalance {
    pub as_of: NaiveDate,
    pub currency: String,
    pub lines: Vec<TrialBalanceRow>,
    pub total_debits: String,
    pub total_credits: String,
    pub is_balanced: bool,
}

impl From<&domain::reports::TrialBalance> for TrialBalance {
    fn from(report: &domain::reports::TrialBalance) -> Self {
        let currency = &report.currency;

        Self {
            as_of: report.as_of,
            currency: currency.code().to_owned(),
            lines: report
                .lines
                .iter()
                .map(|line| TrialBalanceRow::new(currency, line))
                .collect(),
            total_debits: currency.format_value(report.total_debits()),
            total_credits: currency.format_value(report.total_credits()),
            is_balanced: report.is_balanced(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAndLoss {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub currency: String,
    pub revenue_items: Vec<ReportLine>,
    pub expense_items: Vec<ReportLine>,
    pub total_revenue: String,
    pub total_expenses: String,
    pub net_income: String,
}

impl From<&domain::reports::ProfitAndLoss> for ProfitAndLoss {
    fn from(report: &domain::reports::ProfitAndLoss) -> Self {
        let currency = &report.currency;

        Self {
            from: report.from,
            to: report.to,
            currency: currency.code().to_owned(),
            revenue_items: report_lines(currency, &report.revenue),
            expense_items: report_lines(currency, &report.expenses),
            total_revenue: currency.format_value(report.total_revenue()),
            total_expenses: currency.format_value(report.total_expenses()),
            net_income: currency.format_value(report.net_income()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub currency: String,
    pub assets: Vec<ReportLine>,
    pub liabilities: Vec<ReportLine>,
    pub equity: Vec<ReportLine>,
    pub current_earnings: String,
    pub total_assets: String,
    pub total_liabilities: String,
    pub total_equity: String,
    pub is_balanced: bool,
}

impl From<&domain::reports::BalanceSheet> for BalanceSheet {
    fn from(report: &domain::reports::BalanceSheet) -> Self {
        let currency = &report.currency;

        Self {
            as_of: report.as_of,
            currency: currency.code().to_owned(),
            assets: report_lines(currency, &report.assets),
            liabilities: report_lines(currency, &report.liabilities),
            equity: report_lines(currency, &report.equity),
            current_earnings: currency.format_value(report.current_earnings),
            total_assets: currency.format_value(report.total_assets()),
            total_liabilities: currency.format_value(report.total_liabilities()),
            total_equity: currency.format_value(report.total_equity()),
            is_balanced: report.is_balanced(),
        }
    }
}
