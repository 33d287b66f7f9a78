use crate::domain::error::AppError;
use crate::infrastructure::llm_clients::ProbeResult;
use crate::interfaces::state::AppState;
use actix_cors::Cors;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Deserialize)]
pub struct CommandRequest {
    pub command: String,
    pub table: String,
}

#[derive(Serialize)]
struct HealthAttempt {
    host: String,
    port: u16,
    probe: ProbeResult,
    reply: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    model: String,
    /// Address of the first host that answered, if any.
    responding: Option<String>,
    attempts: Vec<HealthAttempt>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(err: &AppError) -> HttpResponse {
    let body = ErrorBody {
        error: err.to_string(),
    };
    match err {
        AppError::NotFound(_) | AppError::CacheNotFound(_) => HttpResponse::NotFound().json(body),
        AppError::ValidationError(_) | AppError::InvalidColumnType(_) => {
            HttpResponse::BadRequest().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

#[post("/translate")]
async fn translate(data: web::Data<HttpState>, req: web::Json<CommandRequest>) -> impl Responder {
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Translating for table {}: {}", req.table, req.command),
    );

    let state = &data.app_state;
    match state
        .run_command
        .translate(&req.command, &req.table, &state.config.connection)
        .await
    {
        Ok(translation) => HttpResponse::Ok().json(translation),
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Translation failed: {}", e),
            );
            error_response(&e)
        }
    }
}

#[post("/run")]
async fn run_command(data: web::Data<HttpState>, req: web::Json<CommandRequest>) -> impl Responder {
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Running for table {}: {}", req.table, req.command),
    );

    let state = &data.app_state;
    match state
        .run_command
        .execute(&req.command, &req.table, &state.config.connection)
        .await
    {
        Ok(run) => {
            add_log(
                &data.logs,
                "INFO",
                "HttpApi",
                &format!("{} -> {}", run.translation.sql, run.result.summary()),
            );
            HttpResponse::Ok().json(run)
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Command failed: {}", e),
            );
            error_response(&e)
        }
    }
}

#[get("/commands")]
async fn list_commands(data: web::Data<HttpState>) -> impl Responder {
    match data.app_state.cache.entries().await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => error_response(&e),
    }
}

#[get("/health")]
async fn health(data: web::Data<HttpState>) -> impl Responder {
    let state = &data.app_state;
    let target = &state.config.connection;

    let mut candidates = vec![target.clone()];
    candidates.extend(target.fallback());

    let mut attempts = Vec::new();
    let mut responding = None;
    for candidate in &candidates {
        let probe = state.prober.probe(&candidate.host, candidate.port).await;
        let (reply, error) = if probe.reachable {
            match state.llm_client.health_check(candidate).await {
                Ok(reply) => (Some(reply.trim().to_string()), None),
                Err(e) => (None, Some(e.to_string())),
            }
        } else {
            (None, probe.as_error().map(|e| e.to_string()))
        };

        let answered = reply.is_some();
        attempts.push(HealthAttempt {
            host: candidate.host.clone(),
            port: candidate.port,
            probe,
            reply,
            error,
        });
        if answered {
            responding = Some(candidate.address());
            break;
        }
    }

    HttpResponse::Ok().json(HealthResponse {
        model: target.model.clone(),
        responding,
        attempts,
    })
}

#[get("/translations")]
async fn get_translation_log(data: web::Data<HttpState>) -> impl Responder {
    match data.app_state.audit.read_all().await {
        Ok(content) => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(content),
        Err(e) => error_response(&e),
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = match data.logs.lock() {
        Ok(logs) => logs.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    HttpResponse::Ok().json(logs)
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = match logs.lock() {
        Ok(logs) => logs,
        Err(poisoned) => poisoned.into_inner(),
    };
    logs.push(entry);
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(translate)
            .service(run_command)
            .service(list_commands)
            .service(health)
            .service(get_translation_log)
            .service(get_logs),
    );
}

pub fn start_server(
    app_state: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
) -> std::io::Result<Server> {
    let port = app_state.config.api_port;
    let state = web::Data::new(HttpState { app_state, logs });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(("127.0.0.1", port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::audit_service::AuditService;
    use crate::application::{NlToSqlUseCase, RunCommandUseCase};
    use crate::domain::llm_config::{ConnectionTarget, LlmTimeouts};
    use crate::infrastructure::command_cache::CommandCache;
    use crate::infrastructure::config::AppConfig;
    use crate::infrastructure::db::sqlite::SqliteRepository;
    use crate::infrastructure::db::SqlExecutor;
    use crate::infrastructure::llm_clients::{HttpProber, OllamaClient};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use tempfile::TempDir;

    /// State whose model host is a closed local port, so every command falls
    /// back to pattern matching.
    async fn offline_state(dir: &TempDir) -> web::Data<HttpState> {
        let port = closed_port();
        offline_state_for(dir, ConnectionTarget::new("127.0.0.1", port, "m")).await
    }

    fn closed_port() -> u16 {
        let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = closed.local_addr().unwrap().port();
        drop(closed);
        port
    }

    async fn offline_state_for(dir: &TempDir, connection: ConnectionTarget) -> web::Data<HttpState> {

        let commands_file = dir.path().join("commands.txt");
        std::fs::write(&commands_file, "show all rows\n[SELECT * FROM \"people\"]\ncount people\n")
            .unwrap();
        let llm_log_file = dir.path().join("llm_log.txt");

        let config = AppConfig {
            connection,
            database_url: "sqlite::memory:".to_string(),
            commands_file: commands_file.clone(),
            llm_log_file: llm_log_file.clone(),
            api_port: 0,
        };

        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.execute_sql("CREATE TABLE \"people\" (\"name\" TEXT, \"age\" INTEGER)")
            .await
            .unwrap();
        repo.execute_sql("INSERT INTO \"people\" VALUES ('ann', 31)")
            .await
            .unwrap();

        let timeouts = LlmTimeouts::default();
        let llm_client: Arc<OllamaClient> = Arc::new(OllamaClient::new());
        let prober = Arc::new(HttpProber::new(timeouts.probe));
        let cache = Arc::new(CommandCache::new(commands_file));
        let audit = Arc::new(AuditService::new(llm_log_file));
        let translator = Arc::new(NlToSqlUseCase::new(
            llm_client.clone(),
            prober.clone(),
            cache.clone(),
            audit.clone(),
        ));

        let app_state = AppState {
            config,
            run_command: RunCommandUseCase::new(translator, Arc::new(repo), cache.clone()),
            cache,
            audit,
            llm_client,
            prober,
        };

        web::Data::new(HttpState {
            app_state: Arc::new(app_state),
            logs: Arc::new(Mutex::new(Vec::new())),
        })
    }

    #[actix_web::test]
    async fn test_translate_falls_back_offline() {
        let dir = TempDir::new().unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(offline_state(&dir).await)
                .configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/translate")
            .set_json(serde_json::json!({"command": "how many people, count them", "table": "people"}))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["sql"], "SELECT COUNT(*) FROM \"people\"");
        assert_eq!(body["source"]["kind"], "pattern_match");
    }

    #[actix_web::test]
    async fn test_run_uses_cache_and_lists_commands() {
        let dir = TempDir::new().unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(offline_state(&dir).await)
                .configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/run")
            .set_json(serde_json::json!({"command": "show all rows", "table": "people"}))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["translation"]["source"]["kind"], "cache");
        assert_eq!(body["result"]["type"], "select");
        assert_eq!(body["result"]["row_count"], 1);

        let req = actix_test::TestRequest::post()
            .uri("/api/run")
            .set_json(serde_json::json!({"command": "count people", "table": "people"}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = actix_test::TestRequest::get().uri("/api/commands").to_request();
        let entries: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(entries[1]["command"], "count people");
        assert_eq!(entries[1]["sql"], "SELECT COUNT(*) FROM \"people\"");
    }

    #[actix_web::test]
    async fn test_unknown_table_is_not_found() {
        let dir = TempDir::new().unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(offline_state(&dir).await)
                .configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/translate")
            .set_json(serde_json::json!({"command": "show all", "table": "ghosts"}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_health_tries_loopback_for_default_host() {
        let dir = TempDir::new().unwrap();
        let target = ConnectionTarget {
            port: closed_port(),
            model: "m".to_string(),
            ..ConnectionTarget::default()
        };
        let app = actix_test::init_service(
            App::new()
                .app_data(offline_state_for(&dir, target).await)
                .configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["model"], "m");
        assert!(body["responding"].is_null());
        let attempts = body["attempts"].as_array().unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0]["host"], "localhost");
        assert_eq!(attempts[1]["host"], "127.0.0.1");
        assert_eq!(attempts[1]["probe"]["reachable"], false);
        assert!(attempts[1]["error"].is_string());
    }

    #[actix_web::test]
    async fn test_health_explicit_host_has_single_attempt() {
        let dir = TempDir::new().unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(offline_state(&dir).await)
                .configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["attempts"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_translation_log_is_served() {
        let dir = TempDir::new().unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(offline_state(&dir).await)
                .configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/translate")
            .set_json(serde_json::json!({"command": "get all", "table": "people"}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = actix_test::TestRequest::get().uri("/api/translations").to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("ERROR:"));
        assert!(text.contains("FALLBACK:"));
    }

    #[test]
    fn test_log_ring_is_bounded() {
        let logs = Mutex::new(Vec::new());
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            add_log(&logs, "INFO", "Test", &format!("entry {}", i));
        }
        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs[0].message, "entry 5");
    }
}
