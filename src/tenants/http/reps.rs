use chrono::{DateTime, Utc};
use semval::context::Context as ValidationContext;
use serde::Serialize;
use uuid::Uuid;

use crate::tenants::domain::{
    self, currency_code::CurrencyCodeInvalidity, tenant_name::TenantNameInvalidity,
    tenants::NewTenantInvalidity,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    pub currency_code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&domain::tenants::Tenant> for Tenant {
    fn from(tenant: &domain::tenants::Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name.clone(),
            business_type: tenant.business_type.clone(),
            currency_code: tenant.currency_code.clone(),
            is_active: tenant.is_active,
            created_at: tenant.created_at,
            updated_at: tenant.updated_at,
        }
    }
}

#[derive(Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTenantValidationError {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    name: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    business_type: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    currency_code: Vec<String>,
}

impl NewTenantValidationError {
    pub fn unknown_currency(code: &str) -> Self {
        Self {
            currency_code: vec![format!("The currency '{}' is not supported.", code)],
            ..Self::default()
        }
    }
}

impl From<ValidationContext<NewTenantInvalidity>> for NewTenantValidationError {
    fn from(validation: ValidationContext<NewTenantInvalidity>) -> Self {
        let mut response = NewTenantValidationError::default();

        for invalidity in validation.into_iter() {
            match invalidity {
                NewTenantInvalidity::Name(name_invalidity) => match name_invalidity {
                    TenantNameInvalidity::Empty => {
                        response.name.push("Business name is required.".to_owned())
                    }
                    TenantNameInvalidity::MaxLength(max) => response.name.push(format!(
                        "Business names may not contain more than {} characters.",
                        max
                    )),
                },
                NewTenantInvalidity::CurrencyCode(CurrencyCodeInvalidity::Format) => response
                    .currency_code
                    .push("Currency codes must be three uppercase letters.".to_owned()),
                NewTenantInvalidity::BusinessTypeMaxLength(max) => {
                    response.business_type.push(format!(
                        "Business types may not contain more than {} characters.",
                        max
                    ))
                }
            }
        }

        response
    }
}

#[cfg(test)]
mod test {
    use semval::ValidatedFrom;

    use crate::tenants::domain::tenants::{NewTenant, NewTenantData};

    use super::*;

    #[test]
    fn validation_error_lists_messages_per_field() {
        let data = NewTenantData {
            name: "".to_owned(),
            business_type: None,
            currency_code: "usd".to_owned(),
        };
        let (_, context) = NewTenant::validated_from(data).expect_err("data is invalid");

        let want = serde_json::json!({
            "name": ["Business name is required."],
            "currencyCode": ["Currency codes must be three uppercase letters."]
        });
        let got = serde_json::to_value(NewTenantValidationError::from(context))
            .expect("rep should serialize");

        assert_eq!(want, got);
    }
}
