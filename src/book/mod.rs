//! Storybook flipbook: page layout, page turning and narration.

pub mod catalog;
pub mod confetti;
pub mod ndvi;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::{Capabilities, Cue};
use confetti::Confetti;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookData {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub countries: Vec<Country>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub pages: Vec<StoryPage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryPage {
    pub year: YearLabel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
}

/// Year pages are usually numbered, but hand-written books use chapter
/// titles instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YearLabel {
    Number(i64),
    Text(String),
}

impl fmt::Display for YearLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearLabel::Number(n) => write!(f, "{n}"),
            YearLabel::Text(s) => f.write_str(s),
        }
    }
}

/// One leaf of the book. Indices point into `BookData::countries` and
/// each country's `pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Cover,
    CountryIntro { country: usize },
    Year { country: usize, page: usize },
    Back,
    Blank,
}

/// Cover, then each country's intro and year pages, then the back cover,
/// padded to an even count.
pub fn build_pages(book: &BookData) -> Vec<Page> {
    let mut pages = vec![Page::Cover];
    for (ci, country) in book.countries.iter().enumerate() {
        pages.push(Page::CountryIntro { country: ci });
        pages.extend((0..country.pages.len()).map(|pi| Page::Year { country: ci, page: pi }));
    }
    pages.push(Page::Back);
    if pages.len() % 2 != 0 {
        pages.push(Page::Blank);
    }
    pages
}

pub fn intro_lead(name: &str) -> String {
    format!("Let's fly over {name} with Terra. The greener it is, the better plants are doing.")
}

/// What gets read aloud when `page` comes into view.
pub fn narration(book: &BookData, page: Page) -> Vec<String> {
    match page {
        Page::Cover => std::iter::once(book.title.clone())
            .chain(book.subtitle.clone())
            .collect(),
        Page::CountryIntro { country } => match book.countries.get(country) {
            Some(c) => vec![c.name.clone(), intro_lead(&c.name)],
            None => Vec::new(),
        },
        Page::Year { country, page } => {
            let Some(c) = book.countries.get(country) else {
                return Vec::new();
            };
            let Some(p) = c.pages.get(page) else {
                return Vec::new();
            };
            std::iter::once(format!("{} Year {}", c.name, p.year))
                .chain(p.story.clone())
                .collect()
        }
        Page::Back | Page::Blank => Vec::new(),
    }
}

/// An open book: which spread is showing and the celebration state.
///
/// The cover and the back cover show alone; everything between is shown
/// as two facing pages.
pub struct BookView {
    book: Arc<BookData>,
    pages: Vec<Page>,
    current: usize,
    confetti: Option<Confetti>,
    flips: u64,
}

impl BookView {
    /// Open at the cover and narrate it.
    pub fn open(book: Arc<BookData>, caps: &Capabilities) -> Self {
        let pages = build_pages(&book);
        let view = Self { book, pages, current: 0, confetti: None, flips: 0 };
        view.narrate_visible(caps);
        view
    }

    pub fn book(&self) -> &BookData {
        &self.book
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Pages currently facing the reader, left to right.
    pub fn visible(&self) -> Vec<(usize, Page)> {
        let last = self.pages.len() - 1;
        let range = if self.current == 0 || self.current == last {
            self.current..self.current + 1
        } else {
            self.current..(self.current + 2).min(self.pages.len())
        };
        range.map(|i| (i, self.pages[i])).collect()
    }

    pub fn next(&mut self, caps: &Capabilities, now: Instant) -> bool {
        let last = self.pages.len() - 1;
        let target = if self.current == 0 { 1 } else { self.current + 2 };
        self.turn_to(target.min(last), caps, now)
    }

    pub fn prev(&mut self, caps: &Capabilities, now: Instant) -> bool {
        let target = if self.current <= 1 { 0 } else { self.current - 2 };
        self.turn_to(target, caps, now)
    }

    /// Flip to the spread starting at `index`. Returns false if nothing moved.
    fn turn_to(&mut self, index: usize, caps: &Capabilities, now: Instant) -> bool {
        if index == self.current {
            return false;
        }
        self.current = index;
        self.flips += 1;
        caps.play(Cue::PageFlip);

        let total = self.pages.len();
        if total - self.current <= 2 {
            debug!(page = self.current, total, "reached the end of the book");
            caps.play(Cue::Chime);
            self.confetti = Some(Confetti::launch(self.flips, now));
        }

        self.narrate_visible(caps);
        true
    }

    fn narrate_visible(&self, caps: &Capabilities) {
        for (_, page) in self.visible() {
            for text in narration(&self.book, page) {
                caps.narrate(&text);
            }
        }
    }

    pub fn confetti(&self) -> Option<&Confetti> {
        self.confetti.as_ref()
    }

    /// Drop finished confetti.
    pub fn tick(&mut self, now: Instant) {
        if self.confetti.as_ref().is_some_and(|c| c.is_done(now)) {
            self.confetti = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::testing::Recorder;

    fn book_with(years: &[usize]) -> BookData {
        BookData {
            title: "Stories".to_string(),
            subtitle: Some("From space".to_string()),
            source: None,
            countries: years
                .iter()
                .enumerate()
                .map(|(i, &n)| Country {
                    code: format!("C{i}"),
                    name: format!("Country {i}"),
                    pages: (0..n)
                        .map(|y| StoryPage {
                            year: YearLabel::Number(2000 + y as i64),
                            caption: None,
                            story: Some(format!("story {y}")),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_page_count_even() {
        // 2 + (1+0) + (1+1) + (1+3) = 9, padded to 10
        let pages = build_pages(&book_with(&[0, 1, 3]));
        assert_eq!(pages.len(), 10);
        assert_eq!(pages[0], Page::Cover);
        assert_eq!(pages[1], Page::CountryIntro { country: 0 });
        assert_eq!(pages[2], Page::CountryIntro { country: 1 });
        assert_eq!(pages[3], Page::Year { country: 1, page: 0 });
        assert_eq!(pages[8], Page::Back);
        assert_eq!(pages[9], Page::Blank);

        let cases: [&[usize]; 4] = [&[], &[2], &[1, 1], &[4, 0, 2, 5]];
        for years in cases {
            assert_eq!(build_pages(&book_with(years)).len() % 2, 0);
        }
    }

    #[test]
    fn test_narration_texts() {
        let book = book_with(&[1]);
        assert_eq!(narration(&book, Page::Cover), ["Stories", "From space"]);
        assert_eq!(
            narration(&book, Page::CountryIntro { country: 0 }),
            ["Country 0".to_string(), intro_lead("Country 0")]
        );
        assert_eq!(
            narration(&book, Page::Year { country: 0, page: 0 }),
            ["Country 0 Year 2000", "story 0"]
        );
        assert!(narration(&book, Page::Back).is_empty());
        assert!(narration(&book, Page::Year { country: 3, page: 0 }).is_empty());
    }

    #[test]
    fn test_text_year_labels_parse() {
        let json = r#"{"title":"T","countries":[{"code":"USA","name":"United States",
            "pages":[{"year":"Page 1 — The Quiet Morning","story":"s"},{"year":2001}]}]}"#;
        let book: BookData = serde_json::from_str(json).expect("valid");
        assert_eq!(
            book.countries[0].pages[0].year,
            YearLabel::Text("Page 1 — The Quiet Morning".to_string())
        );
        assert_eq!(book.countries[0].pages[1].year.to_string(), "2001");
    }

    #[test]
    fn test_every_flip_plays_sound_and_end_celebrates() {
        let rec = Recorder::default();
        let caps = rec.capabilities(true);
        let now = Instant::now();
        // 10 pages: 0 | 1,2 | 3,4 | 5,6 | 7,8 | 9
        let mut view = BookView::open(Arc::new(book_with(&[0, 1, 3])), &caps);
        assert_eq!(rec.spoken.borrow()[0], "Stories");

        for _ in 0..4 {
            assert!(view.next(&caps, now));
        }
        assert_eq!(view.current(), 7);
        assert!(view.confetti().is_none());
        assert!(!rec.cues.borrow().contains(&Cue::Chime));

        assert!(view.next(&caps, now));
        assert_eq!(view.current(), 9);
        assert_eq!(view.visible(), [(9, Page::Blank)]);
        assert!(!view.next(&caps, now));

        let cues = rec.cues.borrow();
        assert_eq!(cues.iter().filter(|c| **c == Cue::PageFlip).count(), 5);
        assert_eq!(cues.iter().filter(|c| **c == Cue::Chime).count(), 1);
        let confetti = view.confetti().expect("celebrating");
        assert_eq!(confetti.len(), confetti::CONFETTI_PARTICLES);
    }

    #[test]
    fn test_chime_when_two_pages_remain() {
        let rec = Recorder::default();
        let caps = rec.capabilities(false);
        let now = Instant::now();
        // 4 pages: cover, intro, back, blank
        let mut view = BookView::open(Arc::new(book_with(&[0])), &caps);
        view.next(&caps, now);
        assert_eq!(view.current(), 1);
        assert!(view.confetti().is_none());
        view.next(&caps, now);
        assert_eq!(view.current(), 3);
        assert!(view.confetti().is_some());

        view.prev(&caps, now);
        assert_eq!(view.current(), 1);
        view.prev(&caps, now);
        assert_eq!(view.current(), 0);
        assert!(!view.prev(&caps, now));
    }

    #[test]
    fn test_flip_narrates_visible_spread() {
        let rec = Recorder::default();
        let caps = rec.capabilities(true);
        let mut view = BookView::open(Arc::new(book_with(&[1])), &caps);
        rec.spoken.borrow_mut().clear();

        view.next(&caps, Instant::now());
        assert_eq!(
            *rec.spoken.borrow(),
            ["Country 0".to_string(), intro_lead("Country 0"), "Country 0 Year 2000".to_string(), "story 0".to_string()]
        );
    }
}
