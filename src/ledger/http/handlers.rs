use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::{
    http_err::{ApiError, ApiResponse, ErrorRep},
    ledger::{
        domain::{
            accounts::NewAccountData,
            journal_entries::{
                new_journal_entry_data::JournalEntryRejection, EntryStatus, NewJournalEntryData,
            },
        },
        services::{LedgerError, LedgerService},
    },
    repos::JournalEntryQuery,
    server::AppState,
};

use super::reps;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tenants/:tenant_id/accounts",
            get(get_accounts).post(create_account),
        )
        .route(
            "/tenants/:tenant_id/journal-entries",
            get(get_journal_entries).post(create_journal_entry),
        )
        .route(
            "/tenants/:tenant_id/journal-entries/check",
            post(check_journal_entry),
        )
        .route(
            "/tenants/:tenant_id/journal-entries/:entry_id",
            get(get_journal_entry),
        )
        .route(
            "/tenants/:tenant_id/journal-entries/:entry_id/post",
            post(post_journal_entry),
        )
        .route(
            "/tenants/:tenant_id/reports/trial-balance",
            get(get_trial_balance),
        )
        .route(
            "/tenants/:tenant_id/reports/profit-and-loss",
            get(get_profit_and_loss),
        )
        .route(
            "/tenants/:tenant_id/reports/balance-sheet",
            get(get_balance_sheet),
        )
}

impl From<LedgerError> for ApiError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::TenantNotFound => ApiError::not_found("Tenant not found."),
            LedgerError::TenantInactive => ApiError::conflict("Tenant is inactive."),
            LedgerError::EntryNotFound => ApiError::not_found("Journal entry not found."),
            LedgerError::AlreadyPosted(number) => ApiError::conflict(format!(
                "Journal entry {} has already been posted.",
                number
            )),
            LedgerError::UnknownCurrency(code) => {
                ApiError::bad_request(format!("Unknown currency '{}'.", code))
            }
            error @ LedgerError::InvalidPeriod { .. } => ApiError::bad_request(error.to_string()),
            LedgerError::DuplicateAccount(code) => ApiError::conflict(format!(
                "An account with the code {} already exists.",
                code
            )),
            LedgerError::InvalidAccount(errors) => {
                ApiError::BadRequest(ErrorRep::new("Invalid account.").with_errors(&errors))
            }
            LedgerError::Entry(JournalEntryRejection::Invalid(errors)) => {
                ApiError::BadRequest(ErrorRep::new("Invalid journal entry.").with_errors(&errors))
            }
            LedgerError::Entry(JournalEntryRejection::NotPostable { reason, judgment }) => {
                ApiError::UnprocessableEntity(
                    ErrorRep::new(reason.to_string())
                        .with_details(&reps::BalanceJudgment::from(&judgment)),
                )
            }
            LedgerError::Entry(JournalEntryRejection::Rejected(error)) => {
                ApiError::bad_request(error.to_string())
            }
            LedgerError::Other(error) => error.into(),
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn get_accounts(
    State(ledger_service): State<LedgerService>,
    Path(tenant_id): Path<Uuid>,
) -> ApiResponse<Json<reps::ResourceCollection<reps::Account>>> {
    let chart = ledger_service.list_accounts(tenant_id).await?;

    Ok(Json(reps::ResourceCollection {
        items: chart.accounts().map(reps::Account::from).collect(),
    }))
}

async fn create_account(
    State(ledger_service): State<LedgerService>,
    Path(tenant_id): Path<Uuid>,
    payload: Result<Json<NewAccountData>, JsonRejection>,
) -> ApiResponse<(StatusCode, Json<reps::Account>)> {
    let Json(new_account_data) = payload?;
    let account = ledger_service
        .add_account(tenant_id, new_account_data)
        .await?;

    Ok((StatusCode::CREATED, Json(reps::Account::from(&account))))
}

async fn check_journal_entry(
    State(ledger_service): State<LedgerService>,
    Path(tenant_id): Path<Uuid>,
    payload: Result<Json<NewJournalEntryData>, JsonRejection>,
) -> ApiResponse<Json<reps::BalanceJudgment>> {
    let Json(entry_data) = payload?;
    let judgment = ledger_service.check_entry(tenant_id, &entry_data).await?;

    debug!(%tenant_id, ?judgment, "Checked journal entry.");

    Ok(Json(reps::BalanceJudgment::from(&judgment)))
}

#[derive(Deserialize)]
struct GetJournalEntriesParams {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    account: Option<String>,
    status: Option<EntryStatus>,
}

async fn get_journal_entries(
    State(ledger_service): State<LedgerService>,
    Path(tenant_id): Path<Uuid>,
    Query(GetJournalEntriesParams {
        from,
        to,
        account,
        status,
    }): Query<GetJournalEntriesParams>,
) -> ApiResponse<Json<reps::ResourceCollection<reps::JournalEntry>>> {
    let query = JournalEntryQuery {
        tenant_id,
        from,
        to,
        account,
        status,
    };
    let entries = ledger_service.list_entries(query).await?;

    Ok(Json(reps::ResourceCollection {
        items: entries.iter().map(reps::JournalEntry::from).collect(),
    }))
}

async fn create_journal_entry(
    State(ledger_service): State<LedgerService>,
    Path(tenant_id): Path<Uuid>,
    payload: Result<Json<NewJournalEntryData>, JsonRejection>,
) -> ApiResponse<(StatusCode, Json<reps::JournalEntry>)> {
    let Json(entry_data) = payload?;
    let saved_entry = ledger_service.create_entry(tenant_id, entry_data).await?;

    Ok((
        StatusCode::CREATED,
        Json(reps::JournalEntry::from(&saved_entry)),
    ))
}

async fn get_journal_entry(
    State(ledger_service): State<LedgerService>,
    Path((tenant_id, entry_id)): Path<(Uuid, Uuid)>,
) -> ApiResponse<Json<reps::JournalEntry>> {
    let entry = ledger_service.get_entry(tenant_id, entry_id).await?;

    Ok(Json(reps::JournalEntry::from(&entry)))
}

async fn post_journal_entry(
    State(ledger_service): State<LedgerService>,
    Path((tenant_id, entry_id)): Path<(Uuid, Uuid)>,
) -> ApiResponse<Json<reps::JournalEntry>> {
    let entry = ledger_service.post_entry(tenant_id, entry_id).await?;

    Ok(Json(reps::JournalEntry::from(&entry)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrialBalanceParams {
    as_of: Option<NaiveDate>,
    currency: Option<String>,
    format: Option<String>,
}

async fn get_trial_balance(
    State(ledger_service): State<LedgerService>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<TrialBalanceParams>,
) -> ApiResponse<Response> {
    let as_of = params.as_of.unwrap_or_else(today);

    debug!(%tenant_id, %as_of, format = ?params.format, "Generating trial balance.");

    let report = ledger_service
        .trial_balance(tenant_id, as_of, params.currency.as_deref())
        .await?;

    match params.format.as_deref() {
        None | Some("json") => Ok(Json(reps::TrialBalance::from(&report)).into_response()),
        Some("csv") => {
            let mut buffer = Vec::new();
            report
                .write_csv(&mut buffer)
                .context("Failed to write trial balance as CSV.")?;

            let headers = [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"trial-balance-{}.csv\"", as_of),
                ),
            ];

            Ok((headers, buffer).into_response())
        }
        Some(_) => Err(ApiError::bad_request(
            "Valid formats are 'json' or 'csv'.",
        )),
    }
}

#[derive(Deserialize)]
struct ProfitAndLossParams {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    currency: Option<String>,
}

async fn get_profit_and_loss(
    State(ledger_service): State<LedgerService>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<ProfitAndLossParams>,
) -> ApiResponse<Json<reps::ProfitAndLoss>> {
    let to = params.to.unwrap_or_else(today);
    // The period defaults to the start of the year the report ends in.
    let from = params
        .from
        .or_else(|| NaiveDate::from_ymd_opt(to.year(), 1, 1))
        .unwrap_or(to);

    debug!(%tenant_id, %from, %to, "Generating profit and loss report.");

    let report = ledger_service
        .profit_and_loss(tenant_id, from, to, params.currency.as_deref())
        .await?;

    Ok(Json(reps::ProfitAndLoss::from(&report)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceSheetParams {
    as_of: Option<NaiveDate>,
    currency: Option<String>,
}

async fn get_balance_sheet(
    State(ledger_service): State<LedgerService>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<BalanceSheetParams>,
) -> ApiResponse<Json<reps::BalanceSheet>> {
    let as_of = params.as_of.unwrap_or_else(today);

    debug!(%tenant_id, %as_of, "Generating balance sheet.");

    let report = ledger_service
        .balance_sheet(tenant_id, as_of, params.currency.as_deref())
        .await?;

    Ok(Json(reps::BalanceSheet::from(&report)))
}
