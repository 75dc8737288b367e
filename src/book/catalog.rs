//! Where storybooks come from.
//!
//! A book for country `XYZ` is looked up in this order:
//! 1. `<stories_dir>/xyz.json`
//! 2. the bundled book for that country
//! 3. that country's chapter of the overview book, built from
//!    `<stories_dir>/ndvi.json` when present, else `<stories_dir>/terra.json`,
//!    else the bundled overview
//!
//! The code `TERRA` names the whole overview book.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::{ndvi, BookData};

pub const OVERVIEW_CODE: &str = "TERRA";

const NDVI_FILE: &str = "ndvi.json";

const BUNDLED: [(&str, &str); 6] = [
    ("AUS", include_str!("../../stories/aus.json")),
    ("BRA", include_str!("../../stories/bra.json")),
    ("CHL", include_str!("../../stories/chl.json")),
    ("GBR", include_str!("../../stories/gbr.json")),
    ("JPN", include_str!("../../stories/jpn.json")),
    ("USA", include_str!("../../stories/usa.json")),
];

const BUNDLED_OVERVIEW: &str = include_str!("../../stories/terra.json");

/// ISO 3166 alpha-3 code for the country part of a location name.
pub fn country_code(country: &str) -> Option<&'static str> {
    Some(match country {
        "USA" | "United States" => "USA",
        "Canada" => "CAN",
        "UK" | "United Kingdom" => "GBR",
        "Germany" => "DEU",
        "France" => "FRA",
        "Japan" => "JPN",
        "China" => "CHN",
        "Bangladesh" => "BGD",
        "Russia" => "RUS",
        "Australia" => "AUS",
        "New Zealand" => "NZL",
        "Brazil" => "BRA",
        "Argentina" => "ARG",
        "Chile" => "CHL",
        "Egypt" => "EGY",
        "Kenya" => "KEN",
        _ => return None,
    })
}

fn parse_book(mut bytes: Vec<u8>) -> Result<BookData> {
    simd_json::serde::from_slice(&mut bytes).context("parsing storybook JSON")
}

fn read_book(path: &Path) -> Result<BookData> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_book(bytes)
}

/// Read `path` if it exists; parse failures are logged and treated as absent.
fn try_file(path: &Path) -> Option<BookData> {
    if !path.exists() {
        return None;
    }
    match read_book(path) {
        Ok(book) => Some(book),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "ignoring unreadable storybook");
            None
        }
    }
}

fn bundled(code: &str) -> Option<BookData> {
    let (_, json) = BUNDLED.iter().find(|(c, _)| *c == code)?;
    match parse_book(json.as_bytes().to_vec()) {
        Ok(book) => Some(book),
        Err(e) => {
            warn!(code, error = %e, "bundled storybook is invalid");
            None
        }
    }
}

/// The all-countries book: NDVI data if supplied, else the written overview.
pub fn overview(stories_dir: &Path) -> Option<BookData> {
    let ndvi_path = stories_dir.join(NDVI_FILE);
    if ndvi_path.exists() {
        let parsed = fs::read(&ndvi_path)
            .context("reading NDVI data")
            .and_then(|mut bytes| {
                simd_json::serde::from_slice::<serde_json::Value>(&mut bytes).context("parsing NDVI data")
            });
        match parsed {
            Ok(master) => return Some(ndvi::build_book(&master)),
            Err(e) => warn!(file = %ndvi_path.display(), error = %e, "ignoring NDVI data"),
        }
    }

    try_file(&stories_dir.join("terra.json"))
        .or_else(|| parse_book(BUNDLED_OVERVIEW.as_bytes().to_vec()).ok())
}

/// Resolve the book for `code`, or `None` if there is nothing to show.
pub fn load_book(stories_dir: &Path, code: &str) -> Option<BookData> {
    let code = code.to_uppercase();
    if code == OVERVIEW_CODE {
        return overview(stories_dir);
    }

    let file = stories_dir.join(format!("{}.json", code.to_lowercase()));
    if let Some(book) = try_file(&file).or_else(|| bundled(&code)) {
        return Some(book);
    }

    let mut book = overview(stories_dir)?;
    let chapter = book
        .countries
        .drain(..)
        .find(|c| c.code.eq_ignore_ascii_case(&code) && !c.pages.is_empty())?;
    book.countries = vec![chapter];
    Some(book)
}

/// Load progress for one country.
#[derive(Debug, Clone)]
pub enum BookState {
    Loading,
    Ready(Arc<BookData>),
    Missing,
}

/// Loads books on demand on background threads and caches the outcome.
pub struct StoryCatalog {
    stories_dir: PathBuf,
    states: HashMap<String, BookState>,
    tx: Sender<(String, Option<BookData>)>,
    rx: Receiver<(String, Option<BookData>)>,
}

impl StoryCatalog {
    pub fn new(stories_dir: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            stories_dir: stories_dir.into(),
            states: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Start loading `code` unless it is already loading or loaded.
    pub fn request(&mut self, code: &str) -> &BookState {
        let code = code.to_uppercase();
        if !self.states.contains_key(&code) {
            debug!(code = %code, "loading storybook");
            let tx = self.tx.clone();
            let dir = self.stories_dir.clone();
            let job_code = code.clone();
            thread::spawn(move || {
                let book = load_book(&dir, &job_code);
                let _ = tx.send((job_code, book));
            });
        }
        self.states.entry(code).or_insert(BookState::Loading)
    }

    pub fn get(&self, code: &str) -> Option<&BookState> {
        self.states.get(&code.to_uppercase())
    }

    /// Apply finished loads. Returns the codes that changed.
    pub fn poll(&mut self) -> Vec<String> {
        let mut done = Vec::new();
        while let Ok((code, book)) = self.rx.try_recv() {
            let state = match book {
                Some(book) => BookState::Ready(Arc::new(book)),
                None => {
                    debug!(code = %code, "no storybook available");
                    BookState::Missing
                }
            };
            self.states.insert(code.clone(), state);
            done.push(code);
        }
        done
    }
}
