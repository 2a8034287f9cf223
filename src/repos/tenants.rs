use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    database::MemoryDatabase,
    ledger::domain::accounts::ChartOfAccounts,
    tenants::domain::tenants::{NewTenant, Tenant},
};

#[derive(Debug, Error)]
pub enum TenantPersistenceError {
    #[error("duplicate tenant name: {0}")]
    DuplicateName(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DynTenantRepo = Arc<dyn TenantRepo + Send + Sync>;

#[async_trait]
pub trait TenantRepo {
    /// Persist a new tenant together with its initial chart of accounts.
    ///
    /// # Arguments
    ///
    /// * `tenant` - The validated tenant to store.
    /// * `chart` - The accounts the tenant starts with.
    ///
    /// # Returns
    ///
    /// The stored tenant, or [`TenantPersistenceError::DuplicateName`] if a
    /// tenant with the same name already exists.
    async fn persist_new_tenant(
        &self,
        tenant: &NewTenant,
        chart: ChartOfAccounts,
    ) -> Result<Tenant, TenantPersistenceError>;

    async fn get_tenant(&self, tenant_id: Uuid) -> anyhow::Result<Option<Tenant>>;

    /// Replace the details of an existing tenant.
    ///
    /// # Arguments
    ///
    /// * `tenant_id` - The ID of the tenant to change.
    /// * `details` - The validated details. Only the name, business type and
    ///   currency code are used.
    /// * `is_active` - Whether the tenant accepts changes to its ledger.
    ///
    /// # Returns
    ///
    /// The updated tenant, `None` if there is no such tenant, or
    /// [`TenantPersistenceError::DuplicateName`] if another tenant already
    /// has the name.
    async fn update_tenant(
        &self,
        tenant_id: Uuid,
        details: &NewTenant,
        is_active: bool,
    ) -> Result<Option<Tenant>, TenantPersistenceError>;

    /// Mark a tenant as inactive, keeping its ledger.
    async fn deactivate_tenant(&self, tenant_id: Uuid) -> anyhow::Result<Option<Tenant>>;

    async fn find_tenant_by_name(&self, name: &str) -> anyhow::Result<Option<Tenant>>;

    /// List every tenant in the order they were created.
    async fn list_tenants(&self) -> anyhow::Result<Vec<Tenant>>;
}

#[async_trait]
impl TenantRepo for MemoryDatabase {
    async fn persist_new_tenant(
        &self,
        tenant: &NewTenant,
        chart: ChartOfAccounts,
    ) -> Result<Tenant, TenantPersistenceError> {
        let mut store = self.write().await;

        if store
            .tenants
            .iter()
            .any(|existing| tenant.name().matches(&existing.name))
        {
            return Err(TenantPersistenceError::DuplicateName(
                tenant.name().as_str().to_owned(),
            ));
        }

        let now = Utc::now();
        let saved = Tenant {
            id: tenant.id(),
            name: tenant.name().as_str().to_owned(),
            business_type: tenant.business_type().map(String::from),
            currency_code: tenant.currency_code().as_str().to_owned(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        store.charts.insert(saved.id, chart);
        store.journal_entries.insert(saved.id, Vec::new());
        store.tenants.push(saved.clone());

        Ok(saved)
    }

    async fn get_tenant(&self, tenant_id: Uuid) -> anyhow::Result<Option<Tenant>> {
        let store = self.read().await;

        Ok(store
            .tenants
            .iter()
            .find(|tenant| tenant.id == tenant_id)
            .cloned())
    }

    async fn update_tenant(
        &self,
        tenant_id: Uuid,
        details: &NewTenant,
        is_active: bool,
    ) -> Result<Option<Tenant>, TenantPersistenceError> {
        let mut store = self.write().await;

        if store
            .tenants
            .iter()
            .any(|existing| existing.id != tenant_id && details.name().matches(&existing.name))
        {
            return Err(TenantPersistenceError::DuplicateName(
                details.name().as_str().to_owned(),
            ));
        }

        let tenant = match store.tenants.iter_mut().find(|tenant| tenant.id == tenant_id) {
            Some(tenant) => tenant,
            None => return Ok(None),
        };

        tenant.name = details.name().as_str().to_owned();
        tenant.business_type = details.business_type().map(String::from);
        tenant.currency_code = details.currency_code().as_str().to_owned();
        tenant.is_active = is_active;
        tenant.updated_at = Utc::now();

        Ok(Some(tenant.clone()))
    }

    async fn deactivate_tenant(&self, tenant_id: Uuid) -> anyhow::Result<Option<Tenant>> {
        let mut store = self.write().await;

        Ok(store
            .tenants
            .iter_mut()
            .find(|tenant| tenant.id == tenant_id)
            .map(|tenant| {
                if tenant.is_active {
                    tenant.is_active = false;
                    tenant.updated_at = Utc::now();
                }

                tenant.clone()
            }))
    }

    async fn find_tenant_by_name(&self, name: &str) -> anyhow::Result<Option<Tenant>> {
        let store = self.read().await;
        let name = name.trim().to_lowercase();

        Ok(store
            .tenants
            .iter()
            .find(|tenant| tenant.name.to_lowercase() == name)
            .cloned())
    }

    async fn list_tenants(&self) -> anyhow::Result<Vec<Tenant>> {
        Ok(self.read().await.tenants.clone())
    }
}
