use std::collections::HashSet;
use std::sync::Mutex;

use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::attendance::AttendanceBook;
use crate::export::{
    attendance_csv, horizontal_csv, load_schedule_json, save_schedule_json, schedule_csv,
};
use crate::display::{absence_memo_text, duty_sheet_text};
use crate::roster::{load_roster, read_roster, Supervisor};
use crate::schedule::{exam_dates, generate_schedule, BlockConfig, DayBlocks, Schedule, Session};

const ROSTER_PATH: &str = "staff_uploaded.csv";
const SCHEDULE_STATE_PATH: &str = "schedule_state.json";
const ATTENDANCE_STATE_PATH: &str = "attendance_state.json";

/// In-memory storage for the roster, schedule, and attendance marks.
/// Generated artifacts are also persisted to disk so a restart does not
/// lose them.
pub struct AppState {
    pub roster: Mutex<Option<Vec<Supervisor>>>,
    pub schedule: Mutex<Option<Schedule>>,
    pub attendance: Mutex<AttendanceBook>,
}

/// A weekday override row: applies to every week unless `week` is given.
#[derive(Debug, Deserialize)]
pub struct DayBlocksSpec {
    pub day: String,
    #[serde(default)]
    pub week: Option<u32>,
    pub morning: u32,
    pub evening: u32,
}

/// A per-date override applying to both sessions.
#[derive(Debug, Deserialize)]
pub struct DateBlocksSpec {
    pub date: NaiveDate,
    pub blocks: u32,
}

/// A per-date per-session override (highest priority).
#[derive(Debug, Deserialize)]
pub struct DateSessionBlocksSpec {
    pub date: NaiveDate,
    pub session: Session,
    pub blocks: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_skip_sundays")]
    pub skip_sundays: bool,
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    #[serde(default = "default_blocks")]
    pub default_blocks: u32,
    #[serde(default)]
    pub morning_default: Option<u32>,
    #[serde(default)]
    pub evening_default: Option<u32>,
    #[serde(default)]
    pub day_blocks: Vec<DayBlocksSpec>,
    #[serde(default)]
    pub date_blocks: Vec<DateBlocksSpec>,
    #[serde(default)]
    pub date_session_blocks: Vec<DateSessionBlocksSpec>,
}

fn default_skip_sundays() -> bool {
    true
}

fn default_blocks() -> u32 {
    2
}

/// Turns a generate request into the layered block configuration. Every
/// provided block count must be positive, whether or not any exam date ends
/// up using it.
fn build_config(req: &GenerateRequest) -> std::result::Result<BlockConfig, String> {
    let positive = |value: u32, what: &str| -> std::result::Result<u32, String> {
        if value == 0 {
            Err(format!("{} must be a positive integer", what))
        } else {
            Ok(value)
        }
    };

    let mut config = BlockConfig::with_default(positive(req.default_blocks, "default_blocks")?);
    config.session_defaults = DayBlocks {
        morning: req
            .morning_default
            .map(|v| positive(v, "morning_default"))
            .transpose()?,
        evening: req
            .evening_default
            .map(|v| positive(v, "evening_default"))
            .transpose()?,
    };

    for spec in &req.day_blocks {
        let weekday: chrono::Weekday = spec
            .day
            .parse()
            .map_err(|_| format!("unknown day name '{}'", spec.day))?;
        let blocks = DayBlocks::both(
            positive(spec.morning, "morning blocks")?,
            positive(spec.evening, "evening blocks")?,
        );
        match spec.week {
            Some(week) => {
                config.week_weekday_blocks.insert((week, weekday), blocks);
            }
            None => {
                config.weekday_blocks.insert(weekday, blocks);
            }
        }
    }

    for spec in &req.date_blocks {
        config
            .date_blocks
            .insert(spec.date, positive(spec.blocks, "date blocks")?);
    }
    for spec in &req.date_session_blocks {
        config
            .date_session_blocks
            .insert((spec.date, spec.session), positive(spec.blocks, "session blocks")?);
    }

    Ok(config)
}

// Roster CSV upload: the raw file is persisted so it survives restarts,
// then parsed into the in-memory roster.
async fn upload_roster(body: web::Bytes, state: web::Data<AppState>) -> Result<HttpResponse> {
    if let Err(e) = std::fs::write(ROSTER_PATH, &body) {
        warn!("unable to persist uploaded roster: {}", e);
    }

    match read_roster(csv::Reader::from_reader(body.as_ref())) {
        Ok(roster) if !roster.is_empty() => {
            info!("roster uploaded: {} supervisors", roster.len());
            let count = roster.len();
            *state.roster.lock().unwrap() = Some(roster);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "supervisors": count
            })))
        }
        Ok(_) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "No supervisors found in the uploaded CSV"
        }))),
        Err(e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to parse staff CSV: {}", e)
        }))),
    }
}

async fn get_roster(state: web::Data<AppState>) -> Result<HttpResponse> {
    let roster = state.roster.lock().unwrap();
    match roster.as_ref() {
        Some(roster) => Ok(HttpResponse::Ok().json(roster)),
        None => Ok(HttpResponse::NotFound()
            .json(serde_json::json!({"error": "No roster uploaded"}))),
    }
}

async fn generate(
    req: web::Json<GenerateRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let names: Vec<String> = {
        let roster = state.roster.lock().unwrap();
        match roster.as_ref() {
            Some(roster) => roster.iter().map(|s| s.name.clone()).collect(),
            None => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "success": false,
                    "error": "Upload a staff roster before generating a schedule"
                })))
            }
        }
    };

    let config = match build_config(&req) {
        Ok(config) => config,
        Err(e) => {
            return Ok(HttpResponse::BadRequest()
                .json(serde_json::json!({"success": false, "error": e})))
        }
    };

    let holidays: HashSet<NaiveDate> = req.holidays.iter().copied().collect();
    let dates = exam_dates(req.start_date, req.end_date, req.skip_sundays, &holidays);

    match generate_schedule(&dates, &config, &names) {
        Ok(schedule) => {
            info!(
                "schedule generated: {} dates, {} entries",
                dates.len(),
                schedule.entries.len()
            );
            if let Err(e) = save_schedule_json(&schedule, SCHEDULE_STATE_PATH) {
                warn!("unable to persist schedule state: {}", e);
            }
            let entries = schedule.entries.len();
            *state.schedule.lock().unwrap() = Some(schedule);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "exam_days": dates.len(),
                "entries": entries
            })))
        }
        Err(e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": e.to_string()
        }))),
    }
}

async fn get_schedule(state: web::Data<AppState>) -> Result<HttpResponse> {
    let schedule = state.schedule.lock().unwrap();
    match schedule.as_ref() {
        Some(schedule) => Ok(HttpResponse::Ok().json(schedule)),
        None => Ok(HttpResponse::NotFound()
            .json(serde_json::json!({"error": "Schedule not generated yet"}))),
    }
}

async fn download_schedule_csv(state: web::Data<AppState>) -> Result<HttpResponse> {
    let schedule = state.schedule.lock().unwrap();
    match schedule.as_ref() {
        Some(schedule) => {
            let bytes = schedule_csv(schedule)
                .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
            Ok(HttpResponse::Ok().content_type("text/csv").body(bytes))
        }
        None => Ok(HttpResponse::NotFound()
            .json(serde_json::json!({"error": "Schedule not generated yet"}))),
    }
}

async fn download_horizontal_csv(state: web::Data<AppState>) -> Result<HttpResponse> {
    let schedule = state.schedule.lock().unwrap();
    match schedule.as_ref() {
        Some(schedule) => {
            let bytes = horizontal_csv(schedule)
                .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
            Ok(HttpResponse::Ok().content_type("text/csv").body(bytes))
        }
        None => Ok(HttpResponse::NotFound()
            .json(serde_json::json!({"error": "Schedule not generated yet"}))),
    }
}

async fn duty_table(
    name: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let schedule = state.schedule.lock().unwrap();
    match schedule.as_ref() {
        Some(schedule) => {
            let rows = schedule.duty_rows(&name);
            if rows.is_empty() {
                Ok(HttpResponse::NotFound().json(serde_json::json!({
                    "error": format!("No duties assigned to '{}'", name)
                })))
            } else {
                Ok(HttpResponse::Ok().json(rows))
            }
        }
        None => Ok(HttpResponse::NotFound()
            .json(serde_json::json!({"error": "Schedule not generated yet"}))),
    }
}

async fn duty_sheet(name: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let schedule = state.schedule.lock().unwrap();
    match schedule.as_ref() {
        Some(schedule) => Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(duty_sheet_text(schedule, &name))),
        None => Ok(HttpResponse::NotFound()
            .json(serde_json::json!({"error": "Schedule not generated yet"}))),
    }
}

async fn workload(state: web::Data<AppState>) -> Result<HttpResponse> {
    let schedule = state.schedule.lock().unwrap();
    match schedule.as_ref() {
        Some(schedule) => Ok(HttpResponse::Ok().json(schedule.workload())),
        None => Ok(HttpResponse::NotFound()
            .json(serde_json::json!({"error": "Schedule not generated yet"}))),
    }
}

#[derive(Debug, Deserialize)]
pub struct AttendanceRequest {
    pub date: NaiveDate,
    pub session: Session,
    pub present: Vec<String>,
}

async fn mark_attendance(
    req: web::Json<AttendanceRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mut book = state.attendance.lock().unwrap();
    let req = req.into_inner();
    book.mark(req.date, req.session, req.present);

    match serde_json::to_string(&*book) {
        Ok(json) => {
            if let Err(e) = std::fs::write(ATTENDANCE_STATE_PATH, json) {
                warn!("unable to persist attendance state: {}", e);
            }
        }
        Err(e) => warn!("unable to serialize attendance state: {}", e),
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn download_attendance_csv(state: web::Data<AppState>) -> Result<HttpResponse> {
    let schedule = state.schedule.lock().unwrap();
    let book = state.attendance.lock().unwrap();
    match schedule.as_ref() {
        Some(schedule) => {
            let bytes = attendance_csv(schedule, &book)
                .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
            Ok(HttpResponse::Ok().content_type("text/csv").body(bytes))
        }
        None => Ok(HttpResponse::NotFound()
            .json(serde_json::json!({"error": "Schedule not generated yet"}))),
    }
}

async fn absentees(state: web::Data<AppState>) -> Result<HttpResponse> {
    let schedule = state.schedule.lock().unwrap();
    let book = state.attendance.lock().unwrap();
    match schedule.as_ref() {
        Some(schedule) => Ok(HttpResponse::Ok().json(book.absentees(schedule))),
        None => Ok(HttpResponse::NotFound()
            .json(serde_json::json!({"error": "Schedule not generated yet"}))),
    }
}

async fn absence_memo(
    name: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let schedule = state.schedule.lock().unwrap();
    let book = state.attendance.lock().unwrap();
    match schedule.as_ref() {
        Some(schedule) => {
            let absentee_map = book.absentees(schedule);
            match absentee_map.get(name.as_str()) {
                Some(absences) => Ok(HttpResponse::Ok()
                    .content_type("text/plain; charset=utf-8")
                    .body(absence_memo_text(&name, absences))),
                None => Ok(HttpResponse::NotFound().json(serde_json::json!({
                    "error": format!("'{}' has no recorded absences", name)
                }))),
            }
        }
        None => Ok(HttpResponse::NotFound()
            .json(serde_json::json!({"error": "Schedule not generated yet"}))),
    }
}

async fn index() -> Result<HttpResponse> {
    let html = include_str!("../templates/index.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

/// Route table, shared by the server and the handler tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/api/roster", web::post().to(upload_roster))
        .route("/api/roster", web::get().to(get_roster))
        .route("/api/generate", web::post().to(generate))
        .route("/api/schedule", web::get().to(get_schedule))
        .route("/api/schedule/csv", web::get().to(download_schedule_csv))
        .route("/api/schedule/horizontal.csv", web::get().to(download_horizontal_csv))
        .route("/api/duty/{name}", web::get().to(duty_table))
        .route("/api/duty/{name}/sheet", web::get().to(duty_sheet))
        .route("/api/workload", web::get().to(workload))
        .route("/api/attendance", web::post().to(mark_attendance))
        .route("/api/attendance/csv", web::get().to(download_attendance_csv))
        .route("/api/absentees", web::get().to(absentees))
        .route("/api/memo/{name}", web::get().to(absence_memo));
}

/// Restores persisted state from a previous run, best effort.
fn restore_state() -> AppState {
    let roster = match load_roster(ROSTER_PATH) {
        Ok(roster) if !roster.is_empty() => {
            info!("restored roster: {} supervisors", roster.len());
            Some(roster)
        }
        _ => None,
    };

    let schedule = load_schedule_json(SCHEDULE_STATE_PATH);
    if schedule.is_some() {
        info!("restored schedule from {}", SCHEDULE_STATE_PATH);
    }

    let attendance = std::fs::read_to_string(ATTENDANCE_STATE_PATH)
        .ok()
        .and_then(|data| serde_json::from_str(&data).ok())
        .unwrap_or_default();

    AppState {
        roster: Mutex::new(roster),
        schedule: Mutex::new(schedule),
        attendance: Mutex::new(attendance),
    }
}

pub async fn start_server(port: u16) -> std::io::Result<()> {
    let app_state = web::Data::new(restore_state());

    info!("listening on http://0.0.0.0:{}", port);
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
