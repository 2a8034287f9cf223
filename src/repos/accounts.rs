use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    database::MemoryDatabase,
    ledger::domain::accounts::{Account, ChartOfAccounts},
};

#[derive(Debug, Error)]
pub enum AccountPersistenceError {
    #[error("no tenant with the ID {0}")]
    TenantNotFound(Uuid),

    #[error("duplicate account code: {0}")]
    DuplicateCode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DynAccountRepo = Arc<dyn AccountRepo + Send + Sync>;

#[async_trait]
pub trait AccountRepo {
    /// Get the chart of accounts for a tenant, or `None` if the tenant does
    /// not exist.
    async fn get_chart(&self, tenant_id: Uuid) -> anyhow::Result<Option<ChartOfAccounts>>;

    async fn persist_account(
        &self,
        tenant_id: Uuid,
        account: Account,
    ) -> Result<Account, AccountPersistenceError>;
}

#[async_trait]
impl AccountRepo for MemoryDatabase {
    async fn get_chart(&self, tenant_id: Uuid) -> anyhow::Result<Option<ChartOfAccounts>> {
        Ok(self.read().await.charts.get(&tenant_id).cloned())
    }

    async fn persist_account(
        &self,
        tenant_id: Uuid,
        account: Account,
    ) -> Result<Account, AccountPersistenceError> {
        let mut store = self.write().await;

        let chart = store
            .charts
            .get_mut(&tenant_id)
            .ok_or(AccountPersistenceError::TenantNotFound(tenant_id))?;

        chart
            .insert(account.clone())
            .map_err(|duplicate| AccountPersistenceError::DuplicateCode(duplicate.0))?;

        Ok(account)
    }
}
