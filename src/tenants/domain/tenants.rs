use chrono::{DateTime, Utc};
use semval::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use super::{
    currency_code::{CurrencyCode, CurrencyCodeInvalidity},
    tenant_name::{TenantName, TenantNameInvalidity},
};

const MAX_BUSINESS_TYPE_LENGTH: usize = 50;

/// A tenant that has passed validation but has not been stored yet.
#[derive(Debug)]
pub struct NewTenant {
    id: Uuid,
    name: TenantName,
    business_type: Option<String>,
    currency_code: CurrencyCode,
}

impl NewTenant {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &TenantName {
        &self.name
    }

    pub fn business_type(&self) -> Option<&str> {
        self.business_type.as_deref()
    }

    pub fn currency_code(&self) -> &CurrencyCode {
        &self.currency_code
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NewTenantInvalidity {
    Name(TenantNameInvalidity),
    CurrencyCode(CurrencyCodeInvalidity),
    /// The business type has more characters than the contained maximum.
    BusinessTypeMaxLength(usize),
}

impl Validate for NewTenant {
    type Invalidity = NewTenantInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        let business_type_too_long = self
            .business_type
            .as_ref()
            .map(|business_type| business_type.chars().count() > MAX_BUSINESS_TYPE_LENGTH)
            .unwrap_or(false);

        ValidationContext::new()
            .validate_with(&self.name, NewTenantInvalidity::Name)
            .validate_with(&self.currency_code, NewTenantInvalidity::CurrencyCode)
            .invalidate_if(
                business_type_too_long,
                NewTenantInvalidity::BusinessTypeMaxLength(MAX_BUSINESS_TYPE_LENGTH),
            )
            .into()
    }
}

fn default_currency_code() -> String {
    "USD".to_owned()
}

/// Onboarding data for a new tenant provided by a user.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTenantData {
    pub name: String,

    #[serde(default)]
    pub business_type: Option<String>,

    #[serde(default = "default_currency_code", alias = "currency")]
    pub currency_code: String,
}

impl ValidatedFrom<NewTenantData> for NewTenant {
    fn validated_from(from: NewTenantData) -> ValidatedResult<Self> {
        let into = NewTenant {
            id: Uuid::new_v4(),
            name: TenantName::unvalidated(&from.name),
            business_type: from
                .business_type
                .map(|business_type| business_type.trim().to_owned())
                .filter(|business_type| !business_type.is_empty()),
            currency_code: CurrencyCode::unvalidated(&from.currency_code),
        };

        match into.validate() {
            Ok(()) => Ok(into),
            Err(context) => Err((into, context)),
        }
    }
}

/// Changes to an existing tenant provided by a user. Missing fields are left
/// as they are.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantUpdateData {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub business_type: Option<String>,

    #[serde(default, alias = "currency")]
    pub currency_code: Option<String>,

    #[serde(default)]
    pub is_active: Option<bool>,
}

impl TenantUpdateData {
    /// Merge the changes over a stored tenant, producing data that is
    /// validated the same way as onboarding data.
    pub fn merged_with(self, tenant: &Tenant) -> NewTenantData {
        NewTenantData {
            name: self.name.unwrap_or_else(|| tenant.name.clone()),
            business_type: self.business_type.or_else(|| tenant.business_type.clone()),
            currency_code: self
                .currency_code
                .unwrap_or_else(|| tenant.currency_code.clone()),
        }
    }
}

/// A tenant that has been stored.
///
/// Inactive tenants keep their ledger and can still be read, but no longer
/// accept new accounts or journal entries.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub business_type: Option<String>,
    pub currency_code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
