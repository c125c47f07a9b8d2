mod attendance;
mod display;
mod export;
mod roster;
mod schedule;
mod web;

use std::collections::HashSet;

use chrono::NaiveDate;

use display::{print_schedule, write_schedule_to_file};
use roster::{load_roster, parse_date_blocks, parse_date_session_blocks, parse_holidays};
use schedule::{exam_dates, generate_schedule, BlockConfig};

fn init_logging() {
    // Route actix's request log (emitted via the `log` crate) into tracing.
    let _ = tracing_log::LogTracer::init();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  duty-allotment web [port]");
    eprintln!("  duty-allotment <roster.csv> <start> <end> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --blocks N                 default blocks per session (default 2)");
    eprintln!("  --holidays d1,d2,..        dates excluded from the exam period");
    eprintln!("  --include-sundays          do not skip Sundays");
    eprintln!("  --date-blocks SPEC         per-date overrides, e.g. '2026-01-22:3;2026-01-23:1'");
    eprintln!("  --session-blocks SPEC      per-date-per-session overrides, e.g. '2026-01-22:Morning:3,Evening:2'");
    eprintln!();
    eprintln!("Dates are YYYY-MM-DD; SPEC entries are separated by ';'.");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "web" {
        let port = args
            .get(2)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);
        println!("Starting web server on port {}...", port);
        println!("Access the site at http://localhost:{}", port);
        web::start_server(port).await?;
        return Ok(());
    }

    // CLI mode: roster path, date range, optional flags.
    if args.len() < 4 {
        usage();
    }
    let roster_path = &args[1];
    let start: NaiveDate = args[2].parse().map_err(|_| format!("invalid start date '{}'", args[2]))?;
    let end: NaiveDate = args[3].parse().map_err(|_| format!("invalid end date '{}'", args[3]))?;

    let mut default_blocks = 2u32;
    let mut holidays = HashSet::new();
    let mut skip_sundays = true;
    let mut config = BlockConfig::default();
    let mut rest = args[4..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--blocks" => {
                let value = rest.next().unwrap_or_else(|| usage());
                default_blocks = value.parse().map_err(|_| format!("invalid block count '{}'", value))?;
            }
            "--holidays" => {
                let value = rest.next().unwrap_or_else(|| usage());
                holidays = parse_holidays(value)?;
            }
            "--include-sundays" => skip_sundays = false,
            "--date-blocks" => {
                let value = rest.next().unwrap_or_else(|| usage());
                config.date_blocks = parse_date_blocks(&value.replace(';', "\n"))?;
            }
            "--session-blocks" => {
                let value = rest.next().unwrap_or_else(|| usage());
                config.date_session_blocks = parse_date_session_blocks(&value.replace(';', "\n"))?;
            }
            _ => usage(),
        }
    }
    config.default_blocks = default_blocks;

    println!("Loading staff roster from {}...", roster_path);
    let staff = load_roster(roster_path)?;
    let names: Vec<String> = staff.iter().map(|s| s.name.clone()).collect();
    println!("Loaded {} supervisors", names.len());

    let dates = exam_dates(start, end, skip_sundays, &holidays);
    println!("Exam period {} to {}: {} active exam days", start, end, dates.len());

    let schedule = generate_schedule(&dates, &config, &names)?;

    print_schedule(&schedule);

    write_schedule_to_file(&schedule, "schedule.txt")?;
    std::fs::write("schedule.csv", export::schedule_csv(&schedule)?)?;
    println!("\nSchedule saved to schedule.txt and schedule.csv");

    Ok(())
}
