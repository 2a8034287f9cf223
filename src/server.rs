use std::{net::SocketAddr, sync::Arc};

use axum::{extract::FromRef, Router};
use chrono::Utc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    cors::cors_layer,
    database::MemoryDatabase,
    ledger::{
        domain::{
            currency::default_currencies,
            journal_entries::{NewJournalEntryData, NewJournalLineData, RawAmount},
        },
        services::{Currencies, LedgerService},
    },
    tenants::services::TenantService,
};

pub struct Options {
    pub allowed_origins: Vec<String>,
    pub listen_address: SocketAddr,
    pub seed_demo_tenant: bool,
}

#[derive(Clone)]
pub struct AppState {
    ledger_service: LedgerService,
    tenant_service: TenantService,
}

impl AppState {
    /// Build the services of the application on top of a single store.
    pub fn new(db: &MemoryDatabase, currencies: Currencies) -> Self {
        let ledger_service = LedgerService::new(
            Arc::new(db.clone()),
            currencies.clone(),
            Arc::new(db.clone()),
            Arc::new(db.clone()),
        );
        let tenant_service = TenantService::new(currencies, Arc::new(db.clone()));

        Self {
            ledger_service,
            tenant_service,
        }
    }
}

impl FromRef<AppState> for LedgerService {
    fn from_ref(state: &AppState) -> Self {
        state.ledger_service.clone()
    }
}

impl FromRef<AppState> for TenantService {
    fn from_ref(state: &AppState) -> Self {
        state.tenant_service.clone()
    }
}

pub fn app(state: AppState, allowed_origins: &[String]) -> anyhow::Result<Router> {
    Ok(Router::new()
        .merge(crate::tenants::http::routes())
        .merge(crate::ledger::http::routes())
        .layer(cors_layer(allowed_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Create the demo tenant with an opening entry so that a fresh server has
/// something to report on.
async fn seed_demo_tenant(state: &AppState) -> anyhow::Result<()> {
    let (tenant, created) = state.tenant_service.ensure_demo_tenant().await?;
    if !created {
        return Ok(());
    }

    let opening_entry = NewJournalEntryData {
        date: Utc::now().date_naive(),
        description: "Owner investment".to_owned(),
        reference: Some("OPENING".to_owned()),
        lines: vec![
            NewJournalLineData {
                account: "1000".to_owned(),
                debit: Some(RawAmount::Text("10000.00".to_owned())),
                credit: None,
                currency: tenant.currency_code.clone(),
                memo: None,
            },
            NewJournalLineData {
                account: "3000".to_owned(),
                debit: None,
                credit: Some(RawAmount::Text("10000.00".to_owned())),
                currency: tenant.currency_code.clone(),
                memo: None,
            },
        ],
    };

    let entry = state
        .ledger_service
        .create_entry(tenant.id, opening_entry)
        .await?;
    state.ledger_service.post_entry(tenant.id, entry.id).await?;

    info!(tenant_id = %tenant.id, "Seeded demo tenant.");

    Ok(())
}

pub async fn serve(opts: Options) -> anyhow::Result<()> {
    let db = MemoryDatabase::new();
    let state = AppState::new(&db, Arc::new(default_currencies()));

    if opts.seed_demo_tenant {
        seed_demo_tenant(&state).await?;
    }

    let app = app(state, &opts.allowed_origins)?;

    info!(address = %opts.listen_address, "Starting server.");

    axum::Server::bind(&opts.listen_address)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

#[cfg(test)]
mod test {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    fn test_app() -> Router {
        let state = AppState::new(&MemoryDatabase::new(), Arc::new(default_currencies()));

        app(state, &[]).expect("app should build")
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.map_or_else(Body::empty, |body| Body::from(body.to_string())))
            .expect("request should build");

        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .expect("body should be readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };

        (status, body)
    }

    async fn create_tenant(app: &Router, name: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/tenants",
            Some(json!({"name": name, "businessType": "RESTAURANT", "currencyCode": "USD"})),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status, "{}", body);

        body["id"].as_str().expect("tenant has an ID").to_owned()
    }

    fn entry(debit: &str, credit: &str) -> Value {
        json!({
            "date": "2024-01-15",
            "description": "Catering for a private event",
            "reference": "INV-001",
            "lines": [
                {"accountCode": "1100", "debit": debit, "credit": ""},
                {"accountCode": "4000", "debit": "", "credit": credit},
                {"accountCode": "", "debit": "", "credit": ""}
            ]
        })
    }

    #[tokio::test]
    async fn tenant_onboarding() {
        let app = test_app();
        let tenant_id = create_tenant(&app, "Bella Vista Restaurant").await;

        let (status, body) = send(&app, Method::GET, &format!("/tenants/{}", tenant_id), None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("Bella Vista Restaurant", body["name"]);
        assert_eq!("RESTAURANT", body["businessType"]);

        let (status, body) = send(&app, Method::GET, "/tenants", None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(1, body["items"].as_array().expect("items").len());

        let (status, _) = send(
            &app,
            Method::POST,
            "/tenants",
            Some(json!({"name": "bella vista restaurant"})),
        )
        .await;
        assert_eq!(StatusCode::CONFLICT, status);
    }

    #[tokio::test]
    async fn tenant_onboarding_invalid() {
        let app = test_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/tenants",
            Some(json!({"name": "  ", "currencyCode": "usd"})),
        )
        .await;

        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!(
            json!({
                "name": ["Business name is required."],
                "currencyCode": ["Currency codes must be three uppercase letters."]
            }),
            body["errors"]
        );
    }

    #[tokio::test]
    async fn unknown_tenant_is_not_found() {
        let app = test_app();
        let uri = format!("/tenants/{}/journal-entries", uuid::Uuid::new_v4());

        let (status, body) = send(&app, Method::GET, &uri, None).await;

        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!("Tenant not found.", body["message"]);
    }

    #[tokio::test]
    async fn check_unbalanced_entry() {
        let app = test_app();
        let tenant_id = create_tenant(&app, "TechMart Electronics").await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/tenants/{}/journal-entries/check", tenant_id),
            Some(entry("100.00", "50")),
        )
        .await;

        assert_eq!(StatusCode::OK, status);
        assert_eq!(false, body["balanced"]);
        assert_eq!("50.00", body["difference"]);
        assert_eq!(2, body["validLineCount"]);
        assert_eq!("unbalanced, difference $50.00", body["reason"]);
    }

    #[tokio::test]
    async fn create_unbalanced_entry_is_unprocessable() {
        let app = test_app();
        let tenant_id = create_tenant(&app, "TechMart Electronics").await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/tenants/{}/journal-entries", tenant_id),
            Some(entry("100.00", "50")),
        )
        .await;

        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, status);
        assert_eq!("unbalanced, difference $50.00", body["message"]);
        assert_eq!("50.00", body["details"]["totals"][0]["difference"]);
    }

    #[tokio::test]
    async fn create_entry_with_bad_amount() {
        let app = test_app();
        let tenant_id = create_tenant(&app, "TechMart Electronics").await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/tenants/{}/journal-entries", tenant_id),
            Some(entry("1.005", "1.005")),
        )
        .await;

        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("Invalid journal entry.", body["message"]);
        assert!(body["errors"]["lines"].is_object(), "{}", body);
    }

    #[tokio::test]
    async fn malformed_entry_body_is_bad_request() {
        let app = test_app();
        let tenant_id = create_tenant(&app, "TechMart Electronics").await;
        let mut body = entry("100.00", "100.00");
        body["date"] = json!("2024-13-45");

        let (status, response) = send(
            &app,
            Method::POST,
            &format!("/tenants/{}/journal-entries", tenant_id),
            Some(body),
        )
        .await;

        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("Invalid request body.", response["message"]);
        assert!(response["errors"]["body"][0].is_string(), "{}", response);

        let mut body = entry("100.00", "100.00");
        body["lines"][0]["accountCode"] = json!(1100);

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/tenants/{}/journal-entries/check", tenant_id),
            Some(body),
        )
        .await;

        assert_eq!(StatusCode::BAD_REQUEST, status);
    }

    #[tokio::test]
    async fn huge_amounts_are_rejected() {
        let app = test_app();
        let tenant_id = create_tenant(&app, "TechMart Electronics").await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/tenants/{}/journal-entries", tenant_id),
            Some(json!({
                "date": "2024-01-15",
                "description": "Huge",
                "lines": [
                    {"accountCode": "1100", "debit": "92233720368547758.07"},
                    {"accountCode": "1100", "debit": "92233720368547758.07"},
                    {"accountCode": "1100", "debit": "0.05"},
                    {"accountCode": "4000", "credit": "92233720368547758.07"},
                    {"accountCode": "4000", "credit": "92233720368547758.07"},
                    {"accountCode": "4000", "credit": "0.02"}
                ]
            })),
        )
        .await;

        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("Invalid journal entry.", body["message"]);
    }

    #[tokio::test]
    async fn tenant_update_and_deactivation() {
        let app = test_app();
        let tenant_id = create_tenant(&app, "Bella Vista Restaurant").await;
        create_tenant(&app, "TechMart Electronics").await;
        let tenant_uri = format!("/tenants/{}", tenant_id);

        let (status, body) = send(
            &app,
            Method::PUT,
            &tenant_uri,
            Some(json!({"name": "Bella Vista Bistro", "currencyCode": "EUR"})),
        )
        .await;
        assert_eq!(StatusCode::OK, status, "{}", body);
        assert_eq!("Bella Vista Bistro", body["name"]);
        assert_eq!("RESTAURANT", body["businessType"]);
        assert_eq!("EUR", body["currencyCode"]);

        let (status, _) = send(
            &app,
            Method::PUT,
            &tenant_uri,
            Some(json!({"name": "techmart electronics"})),
        )
        .await;
        assert_eq!(StatusCode::CONFLICT, status);

        let (status, body) = send(&app, Method::PUT, &tenant_uri, Some(json!({"name": ""}))).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!(json!({"name": ["Business name is required."]}), body["errors"]);

        let (status, body) = send(&app, Method::DELETE, &tenant_uri, None).await;
        assert_eq!(StatusCode::NO_CONTENT, status);
        assert_eq!(Value::Null, body);

        let (status, body) = send(&app, Method::GET, &tenant_uri, None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(false, body["isActive"]);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/tenants/{}/journal-entries", tenant_id),
            Some(entry("100.00", "100.00")),
        )
        .await;
        assert_eq!(StatusCode::CONFLICT, status);
        assert_eq!("Tenant is inactive.", body["message"]);

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/tenants/{}/reports/trial-balance", tenant_id),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, status);

        let (status, body) =
            send(&app, Method::PUT, &tenant_uri, Some(json!({"isActive": true}))).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(true, body["isActive"]);

        let missing_uri = format!("/tenants/{}", uuid::Uuid::new_v4());
        let (status, _) = send(&app, Method::DELETE, &missing_uri, None).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
    }

    #[tokio::test]
    async fn entry_lifecycle_and_reports() {
        let app = test_app();
        let tenant_id = create_tenant(&app, "Bella Vista Restaurant").await;
        let entries_uri = format!("/tenants/{}/journal-entries", tenant_id);

        let (status, created) =
            send(&app, Method::POST, &entries_uri, Some(entry("1,500.00", "1500"))).await;
        assert_eq!(StatusCode::CREATED, status, "{}", created);
        assert_eq!("JE-000001", created["entryNumber"]);
        assert_eq!("draft", created["status"]);
        assert_eq!(2, created["lines"].as_array().expect("lines").len());

        let post_uri = format!("{}/{}/post", entries_uri, created["id"].as_str().expect("id"));
        let (status, posted) = send(&app, Method::POST, &post_uri, None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("posted", posted["status"]);

        let (status, _) = send(&app, Method::POST, &post_uri, None).await;
        assert_eq!(StatusCode::CONFLICT, status);

        let (status, listed) = send(
            &app,
            Method::GET,
            &format!("{}?status=posted&account=4000", entries_uri),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(1, listed["items"].as_array().expect("items").len());

        let (status, trial_balance) = send(
            &app,
            Method::GET,
            &format!(
                "/tenants/{}/reports/trial-balance?asOf=2024-12-31",
                tenant_id
            ),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(true, trial_balance["isBalanced"]);
        assert_eq!("1500.00", trial_balance["totalDebits"]);
        assert_eq!("1500.00", trial_balance["totalCredits"]);

        let (status, profit_and_loss) = send(
            &app,
            Method::GET,
            &format!(
                "/tenants/{}/reports/profit-and-loss?from=2024-01-01&to=2024-12-31",
                tenant_id
            ),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("1500.00", profit_and_loss["netIncome"]);

        let (status, balance_sheet) = send(
            &app,
            Method::GET,
            &format!("/tenants/{}/reports/balance-sheet?asOf=2024-12-31", tenant_id),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(true, balance_sheet["isBalanced"]);
        assert_eq!("1500.00", balance_sheet["currentEarnings"]);
    }

    #[tokio::test]
    async fn trial_balance_csv() {
        let app = test_app();
        let tenant_id = create_tenant(&app, "Bella Vista Restaurant").await;

        let request = Request::builder()
            .uri(format!(
                "/tenants/{}/reports/trial-balance?asOf=2024-12-31&format=csv",
                tenant_id
            ))
            .body(Body::empty())
            .expect("request should build");
        let response = app.oneshot(request).await.expect("router is infallible");

        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );

        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .expect("body should be readable");
        let csv = String::from_utf8(bytes.to_vec()).expect("CSV is UTF-8");

        assert!(csv.starts_with("Account Code,Account Name,Account Type,Debit,Credit\n"));
        assert!(csv.ends_with(",Total,,0.00,0.00\n"), "{}", csv);
    }

    #[tokio::test]
    async fn cors_mirrors_request_origin() {
        let app = test_app();

        let request = Request::builder()
            .uri("/tenants")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .expect("request should build");
        let response = app.oneshot(request).await.expect("router is infallible");

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn seeding_demo_tenant_posts_opening_entry() {
        let state = AppState::new(&MemoryDatabase::new(), Arc::new(default_currencies()));

        seed_demo_tenant(&state).await.expect("seeding should succeed");
        seed_demo_tenant(&state).await.expect("seeding is repeatable");

        let tenants = state.tenant_service.list_tenants().await.expect("list");
        assert_eq!(1, tenants.len());

        let report = state
            .ledger_service
            .trial_balance(tenants[0].id, Utc::now().date_naive(), None)
            .await
            .expect("report should compute");
        assert_eq!(1_000_000, report.total_debits());
        assert!(report.is_balanced());
    }
}
