//! Turn raw MODIS NDVI yearly means into a storybook.
//!
//! Three input shapes are accepted:
//! - `{ "records": [{ "countryCode", "countryName", "year", "mean" }, ...] }`
//! - `{ "countries": [{ "code", "name", "years": [{ "year", "mean" }] }] }`
//! - a bare array of records
//!
//! `AverageNDVI` is accepted in place of `mean`.

use std::collections::HashMap;

use serde_json::Value;

use super::{BookData, Country, StoryPage, YearLabel};

pub const TITLE: &str = "Terra at 25 — Stories from Space";
pub const SUBTITLE: &str = "How Earth looks from the Terra satellite (2000–2024)";
pub const SOURCE: &str = "Terra MODIS NDVI (MOD13Q1 v061)";

/// Countries the book covers, in order.
const COUNTRIES: [(&str, &str); 5] = [
    ("ARG", "Argentina"),
    ("BGD", "Bangladesh"),
    ("JPN", "Japan"),
    ("KEN", "Kenya"),
    ("USA", "United States"),
];

const CAPTIONS: [&str; 5] = [
    "NDVI = plant greenness",
    "Greener = more plants",
    "Rains make places greener",
    "Seasons change the colors",
    "Maps tell plant stories",
];

const FIRST_YEAR: i64 = 2000;
const LAST_YEAR: i64 = 2024;
const DEFAULT_MEAN: f64 = 0.48;

/// One year of one country.
#[derive(Debug, Clone, PartialEq)]
struct Record {
    code: String,
    year: i64,
    mean: Option<f64>,
}

/// Describe a mean NDVI in words.
pub fn band(mean: f64) -> &'static str {
    if mean >= 0.55 {
        "super green in many places"
    } else if mean >= 0.50 {
        "green and growing well"
    } else if mean >= 0.45 {
        "mixed — some green, some pale"
    } else if mean >= 0.40 {
        "a bit dry in places"
    } else {
        "quite dry in many areas"
    }
}

fn flavour(code: &str) -> Option<&'static str> {
    Some(match code {
        "ARG" => "The Pampas farms were often green and busy. Far south in Patagonia, it can be pale because it's windy and dry.",
        "BGD" => "Monsoon months turn fields bright green. Forests in the northeast glow, while some coastal spots can look pale from salty water.",
        "JPN" => "Forests stayed very green, and rice fields brighten in summer. Big cities like Tokyo can look lighter because roads don't grow leaves.",
        "KEN" => "When the long and short rains arrive, the land greens fast. Northern drylands stay lighter, so herders watch the seasons closely.",
        "USA" => "Forests in the Northwest and Northeast glow. The middle grows lots of food. Deserts in the Southwest look pale because there's little rain.",
        _ => return None,
    })
}

pub fn story(code: &str, year: i64, mean: f64) -> String {
    let common = format!(
        "In {year}, plants looked {}. Remember: greener means more leaves and healthy crops!",
        band(mean)
    );
    match flavour(code) {
        Some(extra) => format!("{common} {extra}"),
        None => common,
    }
}

/// Build the book from a parsed master file. Unknown shapes yield a book
/// whose countries have no year pages.
pub fn build_book(master: &Value) -> BookData {
    let mut by_code: HashMap<String, Vec<Record>> = HashMap::new();
    for record in records(master) {
        by_code.entry(record.code.clone()).or_default().push(record);
    }

    let countries = COUNTRIES
        .iter()
        .map(|&(code, name)| {
            let mut rows = by_code.remove(code).unwrap_or_default();
            rows.retain(|r| (FIRST_YEAR..=LAST_YEAR).contains(&r.year));
            rows.sort_by_key(|r| r.year);
            let pages = rows
                .iter()
                .enumerate()
                .map(|(i, r)| StoryPage {
                    year: YearLabel::Number(r.year),
                    caption: Some(CAPTIONS[i % CAPTIONS.len()].to_string()),
                    story: Some(story(code, r.year, r.mean.unwrap_or(DEFAULT_MEAN))),
                })
                .collect();
            Country { code: code.to_string(), name: name.to_string(), pages }
        })
        .collect();

    BookData {
        title: TITLE.to_string(),
        subtitle: Some(SUBTITLE.to_string()),
        source: Some(SOURCE.to_string()),
        countries,
    }
}

fn records(master: &Value) -> Vec<Record> {
    if let Some(rows) = master.get("records").and_then(Value::as_array) {
        return rows.iter().filter_map(flat_record).collect();
    }
    if let Some(countries) = master.get("countries").and_then(Value::as_array) {
        return countries
            .iter()
            .flat_map(|c| {
                let code = c.get("code").and_then(Value::as_str).unwrap_or_default();
                c.get("years")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(move |y| {
                        Some(Record { code: code.to_string(), year: number(y.get("year")?)? as i64, mean: mean(y) })
                    })
            })
            .filter(|r| !r.code.is_empty())
            .collect();
    }
    if let Some(rows) = master.as_array() {
        return rows.iter().filter_map(flat_record).collect();
    }
    Vec::new()
}

fn flat_record(row: &Value) -> Option<Record> {
    let code = ["countryCode", "code", "CountryCode", "country", "Country"]
        .iter()
        .find_map(|key| row.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()))?;
    let year = number(row.get("year")?)? as i64;
    Some(Record { code: code.to_string(), year, mean: mean(row) })
}

fn mean(row: &Value) -> Option<f64> {
    row.get("mean")
        .and_then(number)
        .or_else(|| row.get("AverageNDVI").and_then(number))
}

/// Numbers may arrive as JSON numbers or numeric strings.
fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
