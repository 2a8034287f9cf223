use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::{
    repos::{
        AccountPersistenceError, DynAccountRepo, DynJournalEntryRepo, DynTenantRepo,
        JournalEntryQuery, PostEntryError,
    },
    tenants::domain::tenants::Tenant,
};

use super::domain::{
    accounts::{Account, ChartOfAccounts, NewAccountData},
    balance::{self, BalanceJudgment},
    currency::Currency,
    journal_entries::{
        new_journal_entry_data::JournalEntryRejection, EntryStatus, JournalEntry,
        NewJournalEntryData,
    },
    reports::{BalanceSheet, ProfitAndLoss, TrialBalance},
};

pub type Currencies = Arc<HashMap<String, Currency>>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("tenant not found")]
    TenantNotFound,

    #[error("tenant is inactive")]
    TenantInactive,

    #[error("journal entry not found")]
    EntryNotFound,

    #[error("journal entry {0} has already been posted")]
    AlreadyPosted(String),

    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("the period ends on {to} before it starts on {from}")]
    InvalidPeriod { from: NaiveDate, to: NaiveDate },

    #[error("an account with the code {0} already exists")]
    DuplicateAccount(String),

    #[error("invalid account data")]
    InvalidAccount(ValidationErrors),

    #[error(transparent)]
    Entry(#[from] JournalEntryRejection),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A service object providing the ledger of every tenant: accounts, journal
/// entries and the reports computed from them.
#[derive(Clone)]
pub struct LedgerService {
    account_repo: DynAccountRepo,
    currencies: Currencies,
    journal_entry_repo: DynJournalEntryRepo,
    tenant_repo: DynTenantRepo,
}

impl LedgerService {
    /// Create a new ledger service.
    ///
    /// # Arguments
    ///
    /// * `account_repo` - The repository holding each tenant's chart of
    ///   accounts.
    /// * `currencies` - The known currencies, keyed by code.
    /// * `journal_entry_repo` - The repository used to persist and query
    ///   journal entries.
    /// * `tenant_repo` - The repository used to look up tenants.
    pub fn new(
        account_repo: DynAccountRepo,
        currencies: Currencies,
        journal_entry_repo: DynJournalEntryRepo,
        tenant_repo: DynTenantRepo,
    ) -> Self {
        Self {
            account_repo,
            currencies,
            journal_entry_repo,
            tenant_repo,
        }
    }

    async fn tenant(&self, tenant_id: Uuid) -> Result<Tenant, LedgerError> {
        self.tenant_repo
            .get_tenant(tenant_id)
            .await?
            .ok_or(LedgerError::TenantNotFound)
    }

    /// Look up a tenant whose ledger may be changed.
    async fn active_tenant(&self, tenant_id: Uuid) -> Result<Tenant, LedgerError> {
        let tenant = self.tenant(tenant_id).await?;

        if tenant.is_active {
            Ok(tenant)
        } else {
            Err(LedgerError::TenantInactive)
        }
    }

    pub async fn list_accounts(&self, tenant_id: Uuid) -> Result<ChartOfAccounts, LedgerError> {
        self.account_repo
            .get_chart(tenant_id)
            .await?
            .ok_or(LedgerError::TenantNotFound)
    }

    pub async fn add_account(
        &self,
        tenant_id: Uuid,
        data: NewAccountData,
    ) -> Result<Account, LedgerError> {
        self.active_tenant(tenant_id).await?;
        let account = data.into_account().map_err(LedgerError::InvalidAccount)?;

        let saved = self
            .account_repo
            .persist_account(tenant_id, account)
            .await
            .map_err(|error| match error {
                AccountPersistenceError::TenantNotFound(_) => LedgerError::TenantNotFound,
                AccountPersistenceError::DuplicateCode(code) => LedgerError::DuplicateAccount(code),
                AccountPersistenceError::Other(error) => error.into(),
            })?;

        info!(%tenant_id, code = saved.code(), "Added account.");

        Ok(saved)
    }

    /// Judge the lines of an entry without saving anything.
    ///
    /// Unbalanced entries and entries with too few lines are not errors here;
    /// the judgment describes them. Only data that cannot be understood is
    /// rejected.
    pub async fn check_entry(
        &self,
        tenant_id: Uuid,
        data: &NewJournalEntryData,
    ) -> Result<BalanceJudgment, LedgerError> {
        let chart = self.list_accounts(tenant_id).await?;

        let lines = data
            .parse_lines(&self.currencies)
            .map_err(JournalEntryRejection::from)?;
        chart
            .validate_lines(&lines)
            .map_err(JournalEntryRejection::from)?;

        Ok(balance::judge(&lines))
    }

    /// Validate and store a new journal entry as a draft.
    pub async fn create_entry(
        &self,
        tenant_id: Uuid,
        data: NewJournalEntryData,
    ) -> Result<JournalEntry, LedgerError> {
        self.active_tenant(tenant_id).await?;
        let chart = self.list_accounts(tenant_id).await?;

        let new_entry = match data.into_new_entry(tenant_id, &self.currencies, &chart) {
            Ok(new_entry) => new_entry,
            Err(rejection) => {
                debug!(%tenant_id, %rejection, "Rejected new journal entry.");

                return Err(rejection.into());
            }
        };

        let saved = self.journal_entry_repo.persist_entry(new_entry).await?;

        info!(
            %tenant_id,
            entry_id = %saved.id,
            entry_number = %saved.entry_number,
            "Created journal entry."
        );

        Ok(saved)
    }

    pub async fn get_entry(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
    ) -> Result<JournalEntry, LedgerError> {
        self.journal_entry_repo
            .get_entry(tenant_id, entry_id)
            .await?
            .ok_or(LedgerError::EntryNotFound)
    }

    pub async fn list_entries(
        &self,
        query: JournalEntryQuery,
    ) -> Result<Vec<JournalEntry>, LedgerError> {
        self.tenant(query.tenant_id).await?;

        Ok(self.journal_entry_repo.list_entries(query).await?)
    }

    /// Post a draft entry so that it is included in reports.
    pub async fn post_entry(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
    ) -> Result<JournalEntry, LedgerError> {
        self.active_tenant(tenant_id).await?;

        let posted = self
            .journal_entry_repo
            .mark_posted(tenant_id, entry_id)
            .await
            .map_err(|error| match error {
                PostEntryError::NotFound => LedgerError::EntryNotFound,
                PostEntryError::AlreadyPosted(number) => LedgerError::AlreadyPosted(number),
                PostEntryError::Other(error) => error.into(),
            })?;

        info!(%tenant_id, %entry_id, entry_number = %posted.entry_number, "Posted journal entry.");

        Ok(posted)
    }

    /// Gather what every report needs: the tenant's chart, the currency to
    /// report in and the posted entries up to a date.
    async fn report_inputs(
        &self,
        tenant_id: Uuid,
        currency_code: Option<&str>,
        to: NaiveDate,
    ) -> Result<(ChartOfAccounts, Currency, Vec<JournalEntry>), LedgerError> {
        let tenant = self.tenant(tenant_id).await?;
        let chart = self.list_accounts(tenant_id).await?;

        let code = currency_code.unwrap_or(&tenant.currency_code);
        let currency = self
            .currencies
            .get(code)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownCurrency(code.to_owned()))?;

        let query = JournalEntryQuery {
            to: Some(to),
            status: Some(EntryStatus::Posted),
            ..JournalEntryQuery::for_tenant(tenant_id)
        };
        let entries = self.journal_entry_repo.list_entries(query).await?;

        Ok((chart, currency, entries))
    }

    pub async fn trial_balance(
        &self,
        tenant_id: Uuid,
        as_of: NaiveDate,
        currency_code: Option<&str>,
    ) -> Result<TrialBalance, LedgerError> {
        let (chart, currency, entries) =
            self.report_inputs(tenant_id, currency_code, as_of).await?;

        Ok(TrialBalance::compute(&chart, &currency, as_of, &entries))
    }

    pub async fn profit_and_loss(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        currency_code: Option<&str>,
    ) -> Result<ProfitAndLoss, LedgerError> {
        if to < from {
            return Err(LedgerError::InvalidPeriod { from, to });
        }

        let (chart, currency, entries) = self.report_inputs(tenant_id, currency_code, to).await?;

        Ok(ProfitAndLoss::compute(
            &chart, &currency, from, to, &entries,
        ))
    }

    pub async fn balance_sheet(
        &self,
        tenant_id: Uuid,
        as_of: NaiveDate,
        currency_code: Option<&str>,
    ) -> Result<BalanceSheet, LedgerError> {
        let (chart, currency, entries) =
            self.report_inputs(tenant_id, currency_code, as_of).await?;

        Ok(BalanceSheet::compute(&chart, &currency, as_of, &entries))
    }
}

#[cfg(test)]
mod test {
    use semval::ValidatedFrom;

    use crate::{
        database::MemoryDatabase,
        ledger::domain::{
            accounts::{default_chart, AccountType},
            balance::NotPostable,
            currency::default_currencies,
        },
        repos::TenantRepo,
        tenants::domain::tenants::{NewTenant, NewTenantData},
    };

    use super::*;

    async fn service_with_tenant() -> (LedgerService, Uuid) {
        let (_, service, tenant_id) = service_with_db().await;

        (service, tenant_id)
    }

    async fn service_with_db() -> (MemoryDatabase, LedgerService, Uuid) {
        let db = MemoryDatabase::new();
        let new_tenant = NewTenant::validated_from(NewTenantData {
            name: "Universal Accounting Demo".to_owned(),
            business_type: None,
            currency_code: "USD".to_owned(),
        })
        .expect("tenant should be valid");
        let tenant = db
            .persist_new_tenant(&new_tenant, default_chart())
            .await
            .expect("tenant should persist");

        let service = LedgerService::new(
            Arc::new(db.clone()),
            Arc::new(default_currencies()),
            Arc::new(db.clone()),
            Arc::new(db.clone()),
        );

        (db, service, tenant.id)
    }

    fn entry_data(
        date: &str,
        debit_account: &str,
        credit_account: &str,
        amount: &str,
    ) -> NewJournalEntryData {
        serde_json::from_value(serde_json::json!({
            "date": date,
            "description": "Test entry",
            "lines": [
                {"account": debit_account, "debit": amount},
                {"account": credit_account, "credit": amount}
            ]
        }))
        .expect("valid entry data")
    }

    #[tokio::test]
    async fn check_entry_reports_difference() {
        let (service, tenant_id) = service_with_tenant().await;
        let mut data = entry_data("2024-01-01", "1000", "4000", "100");
        data.lines[1].credit = Some(serde_json::from_str("50").expect("number"));

        let judgment = service
            .check_entry(tenant_id, &data)
            .await
            .expect("check should succeed");

        assert!(!judgment.is_balanced());
        assert_eq!(5000, judgment.difference_in("USD"));
    }

    #[tokio::test]
    async fn create_entry_unknown_tenant() {
        let (service, _) = service_with_tenant().await;

        let error = service
            .create_entry(Uuid::new_v4(), entry_data("2024-01-01", "1000", "4000", "100"))
            .await
            .expect_err("tenant does not exist");

        assert!(matches!(error, LedgerError::TenantNotFound));
    }

    #[tokio::test]
    async fn create_entry_single_line() {
        let (service, tenant_id) = service_with_tenant().await;
        let mut data = entry_data("2024-01-01", "1000", "4000", "100");
        data.lines.pop();

        let error = service
            .create_entry(tenant_id, data)
            .await
            .expect_err("one line is not enough");

        assert!(
            matches!(
                error,
                LedgerError::Entry(JournalEntryRejection::NotPostable {
                    reason: NotPostable::InsufficientLines { found: 1 },
                    ..
                })
            ),
            "Received unexpected error: {:?}",
            error
        );
    }

    #[tokio::test]
    async fn post_entry_then_report() {
        let (service, tenant_id) = service_with_tenant().await;

        let investment = service
            .create_entry(tenant_id, entry_data("2024-01-01", "1000", "3000", "10000"))
            .await
            .expect("entry should be created");
        let sale = service
            .create_entry(tenant_id, entry_data("2024-01-15", "1000", "4000", "2500"))
            .await
            .expect("entry should be created");
        service
            .create_entry(tenant_id, entry_data("2024-01-20", "6000", "1000", "800"))
            .await
            .expect("entry should be created");

        for entry in [&investment, &sale] {
            service
                .post_entry(tenant_id, entry.id)
                .await
                .expect("draft should post");
        }

        let as_of = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let trial_balance = service
            .trial_balance(tenant_id, as_of, None)
            .await
            .expect("report should compute");

        assert_eq!(1_250_000, trial_balance.total_debits());
        assert!(trial_balance.is_balanced());

        let balance_sheet = service
            .balance_sheet(tenant_id, as_of, Some("USD"))
            .await
            .expect("report should compute");

        assert_eq!(250_000, balance_sheet.current_earnings);
        assert!(balance_sheet.is_balanced());
    }

    #[tokio::test]
    async fn post_entry_twice() {
        let (service, tenant_id) = service_with_tenant().await;
        let entry = service
            .create_entry(tenant_id, entry_data("2024-01-01", "1000", "3000", "10"))
            .await
            .expect("entry should be created");

        service
            .post_entry(tenant_id, entry.id)
            .await
            .expect("draft should post");
        let error = service
            .post_entry(tenant_id, entry.id)
            .await
            .expect_err("entry is already posted");

        assert!(matches!(error, LedgerError::AlreadyPosted(ref number) if number == "JE-000001"));
    }

    #[tokio::test]
    async fn report_unknown_currency() {
        let (service, tenant_id) = service_with_tenant().await;

        let error = service
            .trial_balance(
                tenant_id,
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                Some("XYZ"),
            )
            .await
            .expect_err("currency is unknown");

        assert!(matches!(error, LedgerError::UnknownCurrency(ref code) if code == "XYZ"));
    }

    #[tokio::test]
    async fn profit_and_loss_backwards_period() {
        let (service, tenant_id) = service_with_tenant().await;

        let error = service
            .profit_and_loss(
                tenant_id,
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                None,
            )
            .await
            .expect_err("period is backwards");

        assert!(matches!(error, LedgerError::InvalidPeriod { .. }));
    }

    #[tokio::test]
    async fn add_account_duplicate_code() {
        let (service, tenant_id) = service_with_tenant().await;

        let error = service
            .add_account(
                tenant_id,
                NewAccountData {
                    code: "1000".to_owned(),
                    name: "Petty Cash".to_owned(),
                    account_type: AccountType::Asset,
                },
            )
            .await
            .expect_err("code is taken");

        assert!(matches!(error, LedgerError::DuplicateAccount(ref code) if code == "1000"));
    }

    #[tokio::test]
    async fn inactive_tenant_is_read_only() {
        let (db, service, tenant_id) = service_with_db().await;
        let draft = service
            .create_entry(tenant_id, entry_data("2024-01-01", "1000", "4000", "100"))
            .await
            .expect("entry should be created");
        db.deactivate_tenant(tenant_id)
            .await
            .expect("query should succeed")
            .expect("tenant exists");

        let error = service
            .create_entry(tenant_id, entry_data("2024-01-02", "1000", "4000", "100"))
            .await
            .expect_err("inactive tenants take no new entries");
        assert!(matches!(error, LedgerError::TenantInactive));

        let error = service
            .post_entry(tenant_id, draft.id)
            .await
            .expect_err("inactive tenants post nothing");
        assert!(matches!(error, LedgerError::TenantInactive));

        let entries = service
            .list_entries(JournalEntryQuery::for_tenant(tenant_id))
            .await
            .expect("entries can still be read");
        assert_eq!(1, entries.len());
    }
}
