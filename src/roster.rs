use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::Reader;
use serde::{Deserialize, Serialize};

use crate::schedule::Session;

/// One row of the staff list: a display name and an optional mail address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supervisor {
    pub name: String,
    pub email: Option<String>,
}

fn looks_like_email(value: &str) -> bool {
    value.contains('@') && value.contains('.')
}

/// Loads the supervisor roster from a staff CSV file.
pub fn load_roster<P: AsRef<Path>>(csv_path: P) -> Result<Vec<Supervisor>, Box<dyn std::error::Error>> {
    let reader = Reader::from_path(csv_path)?;
    read_roster(reader)
}

/// Parses a staff CSV from any reader.
///
/// Columns are discovered from the header: the name column is the one
/// mentioning "name" (falling back to the second column, the classic staff
/// list layout of Sr. No. / Name of Supervisor / Mail Id), the mail column
/// the one mentioning "mail" or "email". Rows without a name are skipped;
/// when the mail column holds nothing email-shaped the rest of the row is
/// scanned for one.
pub fn read_roster<R: Read>(reader: Reader<R>) -> Result<Vec<Supervisor>, Box<dyn std::error::Error>> {
    let mut reader = reader;
    let headers = reader.headers()?;

    let name_col = headers
        .iter()
        .position(|h| h.to_lowercase().contains("name"))
        .unwrap_or(1);
    let email_col = headers
        .iter()
        .position(|h| h.to_lowercase().contains("mail"));

    let mut roster = Vec::new();
    for result in reader.records() {
        let record = result?;

        let name = record.get(name_col).unwrap_or("").trim().to_string();
        if name.is_empty() {
            continue;
        }

        let mut email = email_col
            .and_then(|col| record.get(col))
            .map(str::trim)
            .filter(|v| looks_like_email(v))
            .map(str::to_string);
        if email.is_none() {
            email = record
                .iter()
                .map(str::trim)
                .find(|v| looks_like_email(v))
                .map(str::to_string);
        }

        roster.push(Supervisor { name, email });
    }

    Ok(roster)
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", value.trim()))
}

fn parse_blocks(value: &str) -> Result<u32, String> {
    let blocks: u32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid block count '{}', expected a positive integer", value.trim()))?;
    if blocks == 0 {
        return Err("block count must be at least 1".to_string());
    }
    Ok(blocks)
}

/// Parses a comma-separated holiday list, e.g. "2026-01-26, 2026-03-10".
/// Empty input yields an empty set; a malformed date is an error.
pub fn parse_holidays(text: &str) -> Result<HashSet<NaiveDate>, String> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_date)
        .collect()
}

/// Parses per-date overrides applying to both sessions, one per line in the
/// form "YYYY-MM-DD:blocks".
pub fn parse_date_blocks(text: &str) -> Result<HashMap<NaiveDate, u32>, String> {
    let mut map = HashMap::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (date_part, blocks_part) = line
            .split_once(':')
            .ok_or_else(|| format!("invalid override '{}', expected YYYY-MM-DD:blocks", line))?;
        map.insert(parse_date(date_part)?, parse_blocks(blocks_part)?);
    }
    Ok(map)
}

/// Parses per-date per-session overrides, one per line in the form
/// "YYYY-MM-DD:Morning:3,Evening:2". Either session may be omitted.
pub fn parse_date_session_blocks(
    text: &str,
) -> Result<HashMap<(NaiveDate, Session), u32>, String> {
    let mut map = HashMap::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (date_part, rest) = line.split_once(':').ok_or_else(|| {
            format!("invalid override '{}', expected YYYY-MM-DD:Session:blocks", line)
        })?;
        let date = parse_date(date_part)?;

        let mut any = false;
        for pair in rest.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (session_part, blocks_part) = pair
                .split_once(':')
                .ok_or_else(|| format!("invalid session override '{}', expected Session:blocks", pair))?;
            let session: Session = session_part.parse()?;
            map.insert((date, session), parse_blocks(blocks_part)?);
            any = true;
        }
        if !any {
            return Err(format!("override '{}' names no session", line));
        }
    }
    Ok(map)
}
