use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use bienestar_engine::config::AppConfig;
use bienestar_engine::error::AppError;
use bienestar_engine::telemetry;
use bienestar_engine::wellness::{
    alerts::detect_alerts, distinct_sites, filter::filter_records, ingest, kpi::compute_kpis,
    report, Alert, AlertPolicy, KpiSnapshot, RecordFilter, Role, ShiftRecord, UserIdentity,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
    config: Arc<AppConfig>,
}

#[derive(Parser, Debug)]
#[command(
    name = "bienestar-engine",
    about = "Run the shift wellness analytics service or render reports from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Render a wellness report artifact from a record store file
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct ScopeArgs {
    /// Record store file (.json store dump or .csv export)
    #[arg(long, default_value = "data.json")]
    data: PathBuf,
    /// Keep only records on this exact date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,
    /// Keep only records for this site ("Todas"/"All" means every site)
    #[arg(long)]
    site: Option<String>,
    /// Directory the artifact is written into
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Pdf,
    Csv,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Filtered records listing with a KPI summary
    Records {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long, value_enum, default_value_t = ExportFormat::Pdf)]
        format: ExportFormat,
    },
    /// Detected alerts listing
    Alerts {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// KPI summary with weekly trend and state distribution charts
    Charts {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// One site's records, or a "no data" document for unknown sites
    Site {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Site the report is scoped to
        #[arg(long)]
        site_name: String,
        #[arg(long, value_enum, default_value_t = ExportFormat::Pdf)]
        format: ExportFormat,
    },
    /// One per-site report for every site present in the store
    Sites {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// One employee's records, most recent first
    Personal {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Username to resolve against the users file
        #[arg(long)]
        username: String,
        /// User identity file
        #[arg(long, default_value = "users.json")]
        users: PathBuf,
    },
    /// Print the KPI snapshot as JSON instead of rendering a document
    Kpis {
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[derive(Debug, Deserialize)]
struct WellnessReportRequest {
    /// Inline raw record rows; the configured store file is read when
    /// absent.
    #[serde(default)]
    records: Option<Vec<Value>>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    site: Option<String>,
}

#[derive(Debug, Serialize)]
struct WellnessReportResponse {
    record_count: usize,
    kpis: KpiSnapshot,
    alerts: Vec<Alert>,
}

#[derive(Debug, Deserialize)]
struct WellnessExportRequest {
    #[serde(flatten)]
    scope: WellnessReportRequest,
    #[serde(default)]
    document: DocumentKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DocumentKind {
    #[default]
    Records,
    Alerts,
    Charts,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Report { command } => run_report(command),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let addr = config.server.socket_addr()?;
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/wellness/report", post(wellness_report_endpoint))
        .route("/api/v1/wellness/export/csv", post(csv_export_endpoint))
        .route("/api/v1/wellness/export/pdf", post(pdf_export_endpoint))
        .layer(prometheus_layer)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(%addr, "wellness analytics service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_report(command: ReportCommand) -> Result<(), AppError> {
    let policy = AlertPolicy::default();

    match command {
        ReportCommand::Records { scope, format } => {
            let records = load_scoped_records(&scope)?;
            let artifact = match format {
                ExportFormat::Pdf => {
                    let kpis = compute_kpis(&records, &policy);
                    let document = report::records_report(&records, &kpis);
                    write_document(&scope.out_dir, &document)?
                }
                ExportFormat::Csv => {
                    let bytes = report::records_csv(&records).map_err(AppError::Report)?;
                    let name = report::csv_file_name(scope.site.as_deref());
                    write_artifact(&scope.out_dir, &name, &bytes)?
                }
            };
            println!("{} records -> {}", records.len(), artifact.display());
        }
        ReportCommand::Alerts { scope } => {
            let records = load_scoped_records(&scope)?;
            let alerts = detect_alerts(&records, &policy);
            let document = report::alerts_report(&alerts);
            let artifact = write_document(&scope.out_dir, &document)?;
            println!(
                "{} alerts across {} records -> {}",
                alerts.len(),
                records.len(),
                artifact.display()
            );
        }
        ReportCommand::Charts { scope } => {
            let records = load_scoped_records(&scope)?;
            let kpis = compute_kpis(&records, &policy);
            let document = report::charts_report(&records, &kpis);
            let artifact = write_document(&scope.out_dir, &document)?;
            println!(
                "mean stress {:.1}, adequate rest {:.1}% -> {}",
                kpis.mean_stress,
                kpis.pct_adequate_rest,
                artifact.display()
            );
        }
        ReportCommand::Site {
            scope,
            site_name,
            format,
        } => {
            let records = load_scoped_records(&scope)?;
            let artifact = match format {
                ExportFormat::Pdf => {
                    let document = report::site_report(&records, &site_name, &policy);
                    write_document(&scope.out_dir, &document)?
                }
                ExportFormat::Csv => {
                    let scoped =
                        filter_records(&records, &RecordFilter::by_site(site_name.clone()));
                    let bytes = report::records_csv(&scoped).map_err(AppError::Report)?;
                    let name = report::csv_file_name(Some(&site_name));
                    write_artifact(&scope.out_dir, &name, &bytes)?
                }
            };
            println!("site {site_name} -> {}", artifact.display());
        }
        ReportCommand::Sites { scope } => {
            let records = load_scoped_records(&scope)?;
            let sites = distinct_sites(&records);
            if sites.is_empty() {
                println!("no sites recorded");
            }
            for site in sites {
                let document = report::site_report(&records, &site, &policy);
                let artifact = write_document(&scope.out_dir, &document)?;
                println!("site {site} -> {}", artifact.display());
            }
        }
        ReportCommand::Personal {
            scope,
            username,
            users,
        } => {
            let records = load_scoped_records(&scope)?;
            let user = resolve_identity(&users, &username)?;
            let document = report::personal_report(&records, &user);
            let artifact = write_document(&scope.out_dir, &document)?;
            println!(
                "records for {} -> {}",
                user.record_name(),
                artifact.display()
            );
        }
        ReportCommand::Kpis { scope } => {
            let records = load_scoped_records(&scope)?;
            let kpis = compute_kpis(&records, &policy);
            let rendered =
                serde_json::to_string_pretty(&kpis).map_err(|err| AppError::Io(err.into()))?;
            println!("{rendered}");
        }
    }

    Ok(())
}

fn load_scoped_records(scope: &ScopeArgs) -> Result<Vec<ShiftRecord>, AppError> {
    let records = ingest::records_from_path(&scope.data)?;
    let filter = RecordFilter {
        date: scope.date.clone(),
        site: scope.site.clone(),
    };
    Ok(filter_records(&records, &filter))
}

/// Resolves a username against the users file, falling back to a bare
/// employee identity so the personal report still renders when the file
/// lacks the user.
fn resolve_identity(users_path: &Path, username: &str) -> Result<UserIdentity, AppError> {
    let users = ingest::users_from_path(users_path)?;
    Ok(ingest::find_user(&users, username)
        .cloned()
        .unwrap_or_else(|| UserIdentity {
            username: username.to_string(),
            display_name: username.to_string(),
            site: String::new(),
            role: Role::Employee,
        }))
}

fn write_document(out_dir: &Path, document: &report::ReportDocument) -> Result<PathBuf, AppError> {
    let bytes = report::render_pdf(document).map_err(AppError::Report)?;
    write_artifact(out_dir, &document.file_name, &bytes)
}

fn write_artifact(out_dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(file_name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn wellness_report_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<WellnessReportRequest>,
) -> Result<Json<WellnessReportResponse>, AppError> {
    let policy = AlertPolicy::default();
    let records = resolve_records(&state, &payload)?;

    Ok(Json(WellnessReportResponse {
        record_count: records.len(),
        kpis: compute_kpis(&records, &policy),
        alerts: detect_alerts(&records, &policy),
    }))
}

async fn csv_export_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<WellnessReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let site = payload.site.clone();
    let records = resolve_records(&state, &payload)?;
    let bytes = report::records_csv(&records).map_err(AppError::Report)?;
    let file_name = report::csv_file_name(site.as_deref());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    ))
}

async fn pdf_export_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<WellnessExportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let policy = AlertPolicy::default();
    let records = resolve_records(&state, &payload.scope)?;

    let document = match payload.document {
        DocumentKind::Records => {
            let kpis = compute_kpis(&records, &policy);
            report::records_report(&records, &kpis)
        }
        DocumentKind::Alerts => report::alerts_report(&detect_alerts(&records, &policy)),
        DocumentKind::Charts => {
            let kpis = compute_kpis(&records, &policy);
            report::charts_report(&records, &kpis)
        }
    };

    let bytes = report::render_pdf(&document).map_err(AppError::Report)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.file_name),
            ),
        ],
        bytes,
    ))
}

/// Inline rows win; otherwise the configured record store is read. The
/// date/site scope applies either way.
fn resolve_records(
    state: &AppState,
    request: &WellnessReportRequest,
) -> Result<Vec<ShiftRecord>, AppError> {
    let records = match &request.records {
        Some(rows) => ingest::records_from_values(rows),
        None => ingest::records_from_path(&state.config.store.data_path)?,
    };

    let filter = RecordFilter {
        date: request.date.clone(),
        site: request.site.clone(),
    };
    Ok(filter_records(&records, &filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bienestar_engine::config::{
        AppEnvironment, ServerConfig, StoreConfig, TelemetryConfig,
    };

    // `PrometheusMetricLayer::pair()` installs a process-global metrics
    // recorder, which can only be set once per process. Memoize the handle so
    // that multiple tests (run concurrently) share a single recorder instead
    // of panicking on the second install.
    fn test_metrics_handle() -> PrometheusHandle {
        use std::sync::OnceLock;
        static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
        HANDLE
            .get_or_init(|| {
                let (_, handle) = PrometheusMetricLayer::pair();
                handle
            })
            .clone()
    }

    fn test_state() -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: test_metrics_handle(),
            config: Arc::new(AppConfig {
                environment: AppEnvironment::Test,
                server: ServerConfig {
                    host: "127.0.0.1".to_string(),
                    port: 0,
                },
                telemetry: TelemetryConfig {
                    log_level: "info".to_string(),
                },
                store: StoreConfig {
                    data_path: PathBuf::from("./does-not-exist.json"),
                    users_path: PathBuf::from("./does-not-exist.json"),
                },
            }),
        }
    }

    fn inline_rows() -> Vec<Value> {
        serde_json::from_str(
            r#"[
                {"sede": "Centro", "fecha": "2024-01-05", "nombre": "Ana",
                 "descanso": 20, "estres": 9, "estado": "Estresado"},
                {"site": "Centro", "date": "2024-01-05", "employee_name": "Luis",
                 "rest_minutes": 60, "stress_level": 3, "emotional_state": "Calm"}
            ]"#,
        )
        .expect("valid inline rows")
    }

    #[tokio::test]
    async fn report_endpoint_computes_kpis_over_inline_rows() {
        let request = WellnessReportRequest {
            records: Some(inline_rows()),
            date: None,
            site: None,
        };

        let Json(body) = wellness_report_endpoint(State(test_state()), Json(request))
            .await
            .expect("report builds");

        assert_eq!(body.record_count, 2);
        assert_eq!(body.kpis.mean_stress, 6.0);
        assert_eq!(body.alerts.len(), 1);
        assert_eq!(body.alerts[0].employee_name, "Ana");
    }

    #[tokio::test]
    async fn report_endpoint_applies_the_site_filter() {
        let request = WellnessReportRequest {
            records: Some(inline_rows()),
            date: None,
            site: Some("Norte".to_string()),
        };

        let Json(body) = wellness_report_endpoint(State(test_state()), Json(request))
            .await
            .expect("report builds");

        assert_eq!(body.record_count, 0);
        assert_eq!(body.kpis.alert_count, 0);
    }

    #[tokio::test]
    async fn missing_store_surfaces_as_ingest_error() {
        let request = WellnessReportRequest {
            records: None,
            date: None,
            site: None,
        };

        let error = wellness_report_endpoint(State(test_state()), Json(request))
            .await
            .expect_err("store file is missing");
        assert!(matches!(error, AppError::Ingest(_)));
    }

    #[test]
    fn document_kind_defaults_to_records() {
        let request: WellnessExportRequest =
            serde_json::from_str(r#"{"records": []}"#).expect("request parses");
        assert_eq!(request.document, DocumentKind::Records);
    }

    #[tokio::test]
    async fn health_route_responds_ok() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let app = Router::new()
            .route("/health", get(healthcheck))
            .route("/ready", get(readiness_endpoint))
            .with_state(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
