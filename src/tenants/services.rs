use semval::ValidatedFrom;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    ledger::{domain::accounts::default_chart, services::Currencies},
    repos::{DynTenantRepo, TenantPersistenceError},
};

use super::domain::tenants::{
    NewTenant, NewTenantData, NewTenantInvalidity, Tenant, TenantUpdateData,
};

pub const DEMO_TENANT_NAME: &str = "Universal Accounting Demo";

#[derive(Debug, Error)]
pub enum TenantError {
    /// The provided tenant data is invalid.
    #[error("invalid tenant data: {0:?}")]
    InvalidTenant(semval::context::Context<NewTenantInvalidity>),

    /// The currency code is well formed but not one we know about.
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("a tenant named {0} already exists")]
    DuplicateName(String),

    #[error("tenant not found")]
    NotFound,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A service object providing functionality relating to tenants.
#[derive(Clone)]
pub struct TenantService {
    currencies: Currencies,
    tenant_repo: DynTenantRepo,
}

impl TenantService {
    pub fn new(currencies: Currencies, tenant_repo: DynTenantRepo) -> Self {
        Self {
            currencies,
            tenant_repo,
        }
    }

    /// Onboard a new tenant. The tenant starts with the default chart of
    /// accounts and an empty ledger.
    ///
    /// # Arguments
    ///
    /// * `new_tenant_data` - The new tenant's information.
    pub async fn create_tenant(
        &self,
        new_tenant_data: NewTenantData,
    ) -> Result<Tenant, TenantError> {
        let new_tenant = self.validate(new_tenant_data)?;

        match self
            .tenant_repo
            .persist_new_tenant(&new_tenant, default_chart())
            .await
        {
            Ok(tenant) => {
                info!(tenant_id = %tenant.id, name = %tenant.name, "Created tenant.");

                Ok(tenant)
            }
            Err(TenantPersistenceError::DuplicateName(name)) => {
                Err(TenantError::DuplicateName(name))
            }
            Err(error) => {
                error!(?error, "Failed to persist new tenant.");

                Err(anyhow::Error::from(error).into())
            }
        }
    }

    /// Change the details of a tenant. The merged details are validated the
    /// same way as a new tenant's, and the name must stay unique.
    ///
    /// # Arguments
    ///
    /// * `tenant_id` - The ID of the tenant to change.
    /// * `update` - The fields to change. Missing fields are kept.
    pub async fn update_tenant(
        &self,
        tenant_id: Uuid,
        update: TenantUpdateData,
    ) -> Result<Tenant, TenantError> {
        let existing = self
            .tenant_repo
            .get_tenant(tenant_id)
            .await?
            .ok_or(TenantError::NotFound)?;

        let is_active = update.is_active.unwrap_or(existing.is_active);
        let details = self.validate(update.merged_with(&existing))?;

        match self
            .tenant_repo
            .update_tenant(tenant_id, &details, is_active)
            .await
        {
            Ok(Some(tenant)) => {
                info!(%tenant_id, name = %tenant.name, is_active, "Updated tenant.");

                Ok(tenant)
            }
            Ok(None) => Err(TenantError::NotFound),
            Err(TenantPersistenceError::DuplicateName(name)) => {
                Err(TenantError::DuplicateName(name))
            }
            Err(error) => {
                error!(?error, "Failed to update tenant.");

                Err(anyhow::Error::from(error).into())
            }
        }
    }

    /// Deactivate a tenant. The tenant and its ledger are kept.
    pub async fn deactivate_tenant(&self, tenant_id: Uuid) -> Result<Tenant, TenantError> {
        let tenant = self
            .tenant_repo
            .deactivate_tenant(tenant_id)
            .await?
            .ok_or(TenantError::NotFound)?;

        info!(%tenant_id, "Deactivated tenant.");

        Ok(tenant)
    }

    fn validate(&self, data: NewTenantData) -> Result<NewTenant, TenantError> {
        let new_tenant = NewTenant::validated_from(data)
            .map_err(|(_, context)| TenantError::InvalidTenant(context))?;

        let currency_code = new_tenant.currency_code().as_str();
        if !self.currencies.contains_key(currency_code) {
            return Err(TenantError::UnknownCurrency(currency_code.to_owned()));
        }

        Ok(new_tenant)
    }

    pub async fn get_tenant(&self, tenant_id: Uuid) -> anyhow::Result<Option<Tenant>> {
        self.tenant_repo.get_tenant(tenant_id).await
    }

    pub async fn list_tenants(&self) -> anyhow::Result<Vec<Tenant>> {
        self.tenant_repo.list_tenants().await
    }

    /// Create the demo tenant unless it already exists.
    ///
    /// # Returns
    ///
    /// The demo tenant and whether it was created by this call.
    pub async fn ensure_demo_tenant(&self) -> anyhow::Result<(Tenant, bool)> {
        if let Some(existing) = self.tenant_repo.find_tenant_by_name(DEMO_TENANT_NAME).await? {
            return Ok((existing, false));
        }

        let data = NewTenantData {
            name: DEMO_TENANT_NAME.to_owned(),
            business_type: Some("GENERAL".to_owned()),
            currency_code: "USD".to_owned(),
        };

        match self.create_tenant(data).await {
            Ok(tenant) => Ok((tenant, true)),
            Err(TenantError::Other(error)) => Err(error),
            Err(error) => Err(anyhow::anyhow!("Failed to create demo tenant: {}", error)),
        }
    }
}
