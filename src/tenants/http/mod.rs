use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{
    http_err::{ApiError, ApiResponse, ErrorRep},
    ledger::http::reps::ResourceCollection,
    server::AppState,
};

use super::{
    domain::tenants::{NewTenantData, TenantUpdateData},
    services::{TenantError, TenantService},
};

pub mod reps;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tenants", get(get_tenants).post(create_tenant))
        .route(
            "/tenants/:tenant_id",
            get(get_tenant).put(update_tenant).delete(deactivate_tenant),
        )
}

impl From<TenantError> for ApiError {
    fn from(error: TenantError) -> Self {
        match error {
            TenantError::InvalidTenant(context) => ApiError::BadRequest(
                ErrorRep::new("Invalid tenant.")
                    .with_errors(&reps::NewTenantValidationError::from(context)),
            ),
            TenantError::UnknownCurrency(code) => ApiError::BadRequest(
                ErrorRep::new("Invalid tenant.")
                    .with_errors(&reps::NewTenantValidationError::unknown_currency(&code)),
            ),
            TenantError::DuplicateName(name) => {
                ApiError::conflict(format!("A tenant named '{}' already exists.", name))
            }
            TenantError::NotFound => ApiError::not_found("Tenant not found."),
            TenantError::Other(error) => error.into(),
        }
    }
}

async fn create_tenant(
    State(tenant_service): State<TenantService>,
    payload: Result<Json<NewTenantData>, JsonRejection>,
) -> ApiResponse<(StatusCode, Json<reps::Tenant>)> {
    let Json(new_tenant_data) = payload?;
    let tenant = tenant_service.create_tenant(new_tenant_data).await?;

    Ok((StatusCode::CREATED, Json(reps::Tenant::from(&tenant))))
}

async fn get_tenants(
    State(tenant_service): State<TenantService>,
) -> ApiResponse<Json<ResourceCollection<reps::Tenant>>> {
    let tenants = tenant_service.list_tenants().await?;

    Ok(Json(ResourceCollection {
        items: tenants.iter().map(reps::Tenant::from).collect(),
    }))
}

async fn get_tenant(
    State(tenant_service): State<TenantService>,
    Path(tenant_id): Path<Uuid>,
) -> ApiResponse<Json<reps::Tenant>> {
    match tenant_service.get_tenant(tenant_id).await? {
        Some(tenant) => Ok(Json(reps::Tenant::from(&tenant))),
        None => Err(ApiError::not_found("Tenant not found.")),
    }
}

async fn update_tenant(
    State(tenant_service): State<TenantService>,
    Path(tenant_id): Path<Uuid>,
    payload: Result<Json<TenantUpdateData>, JsonRejection>,
) -> ApiResponse<Json<reps::Tenant>> {
    let Json(update) = payload?;
    let tenant = tenant_service.update_tenant(tenant_id, update).await?;

    Ok(Json(reps::Tenant::from(&tenant)))
}

async fn deactivate_tenant(
    State(tenant_service): State<TenantService>,
    Path(tenant_id): Path<Uuid>,
) -> ApiResponse<StatusCode> {
    tenant_service.deactivate_tenant(tenant_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
