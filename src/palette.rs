//! Fuzzy-find palette over location names, with a fixed row of quick
//! actions underneath.

/// Results shown at most.
pub const MAX_RESULTS: usize = 10;

/// One ranked match. `index` points back into the searched items.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub text: String,
    pub score: f64,
    pub index: usize,
}

/// Ranks an item against a trimmed, lowercased query. Lower is better;
/// `None` means the item does not match.
pub trait Scorer {
    fn score(&self, query: &str, item: &str) -> Option<f64>;
}

/// Prefix matches first, then earlier substring positions.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringScorer;

impl Scorer for SubstringScorer {
    fn score(&self, query: &str, item: &str) -> Option<f64> {
        let item = item.to_lowercase();
        let prefix_penalty = if item.starts_with(query) { 0.0 } else { 0.5 };
        // Positions in chars, so accented names rank like ASCII ones
        let position = match item.find(query) {
            Some(idx) => item[..idx].chars().count() as f64 / item.chars().count().max(1) as f64,
            None => 1.0,
        };
        let score = prefix_penalty + position;
        (score < 1.0).then_some(score)
    }
}

/// Filter `items` with the default scorer.
pub fn filter<S: AsRef<str>>(query: &str, items: &[S]) -> Vec<Scored> {
    filter_with(&SubstringScorer, query, items)
}

pub fn filter_with<S: AsRef<str>>(scorer: &impl Scorer, query: &str, items: &[S]) -> Vec<Scored> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return items
            .iter()
            .take(MAX_RESULTS)
            .enumerate()
            .map(|(index, s)| Scored { text: s.as_ref().to_string(), score: 0.0, index })
            .collect();
    }

    let mut results: Vec<Scored> = items
        .iter()
        .enumerate()
        .filter_map(|(index, s)| {
            let text = s.as_ref();
            scorer
                .score(&q, text)
                .map(|score| Scored { text: text.to_string(), score, index })
        })
        .collect();
    // sort_by is stable, so equal scores keep input order
    results.sort_by(|a, b| a.score.total_cmp(&b.score));
    results.truncate(MAX_RESULTS);
    results
}

/// Commands always offered below the results, whatever the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    ToggleRotate,
    ClearSelection,
    OpenContact,
    OpenStorybook,
}

impl QuickAction {
    pub const ALL: [QuickAction; 4] = [
        QuickAction::ToggleRotate,
        QuickAction::ClearSelection,
        QuickAction::OpenContact,
        QuickAction::OpenStorybook,
    ];

    pub fn label(self) -> &'static str {
        match self {
            QuickAction::ToggleRotate => "Toggle auto-rotate",
            QuickAction::ClearSelection => "Clear selection",
            QuickAction::OpenContact => "Contact us",
            QuickAction::OpenStorybook => "Open storybook",
        }
    }
}

/// What Enter picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteChoice {
    /// Index into the location registry
    Location(usize),
    Action(QuickAction),
}

/// Focus handoff: opening asks for focus, the next drawn frame grants it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Pending,
    Focused,
}

/// Palette overlay state. Closed when `focus` is `None`.
pub struct PaletteState {
    items: Vec<String>,
    query: String,
    results: Vec<Scored>,
    active: usize,
    /// Cursor in the action row; `None` while the result list has it
    action: Option<usize>,
    focus: Option<Focus>,
}

impl PaletteState {
    /// Search over `locations`.
    pub fn new(locations: &[&str]) -> Self {
        let mut state = Self {
            items: locations.iter().map(|s| s.to_string()).collect(),
            query: String::new(),
            results: Vec::new(),
            active: 0,
            action: None,
            focus: None,
        };
        state.refresh();
        state
    }

    pub fn is_open(&self) -> bool {
        self.focus.is_some()
    }

    /// Open with an empty query; input focus arrives after the next draw.
    pub fn open(&mut self) {
        self.query.clear();
        self.active = 0;
        self.action = None;
        self.refresh();
        self.focus = Some(Focus::Pending);
    }

    pub fn close(&mut self) {
        self.focus = None;
    }

    /// Ctrl+K
    pub fn toggle(&mut self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    /// Called once a frame has been painted with the palette visible.
    pub fn on_frame_drawn(&mut self) {
        if self.focus == Some(Focus::Pending) {
            self.focus = Some(Focus::Focused);
        }
    }

    pub fn has_focus(&self) -> bool {
        self.focus == Some(Focus::Focused)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[Scored] {
        &self.results
    }

    pub fn active(&self) -> usize {
        self.active
    }

    /// The quick actions, shown regardless of the query.
    pub fn actions(&self) -> &'static [QuickAction] {
        &QuickAction::ALL
    }

    /// Highlighted quick action, when the action row has the cursor.
    pub fn active_action(&self) -> Option<QuickAction> {
        self.action.map(|i| QuickAction::ALL[i])
    }

    /// Typing always returns the cursor to the results.
    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.action = None;
        self.refresh();
    }

    pub fn backspace(&mut self) {
        self.query.pop();
        self.action = None;
        self.refresh();
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.action = None;
        self.refresh();
    }

    pub fn move_down(&mut self) {
        if self.action.is_none() && !self.results.is_empty() {
            self.active = (self.active + 1).min(self.results.len() - 1);
        }
    }

    pub fn move_up(&mut self) {
        if self.action.is_none() {
            self.active = self.active.saturating_sub(1);
        }
    }

    /// Tab: move the cursor between the result list and the action row.
    pub fn switch_section(&mut self) {
        self.action = match self.action {
            Some(_) => None,
            None => Some(0),
        };
    }

    /// Left/Right inside the action row, wrapping.
    pub fn next_action(&mut self) {
        let n = QuickAction::ALL.len();
        if let Some(i) = self.action.as_mut() {
            *i = (*i + 1) % n;
        }
    }

    pub fn prev_action(&mut self) {
        let n = QuickAction::ALL.len();
        if let Some(i) = self.action.as_mut() {
            *i = (*i + n - 1) % n;
        }
    }

    /// Enter: the highlighted action or result, closing the palette.
    pub fn choose(&mut self) -> Option<PaletteChoice> {
        let choice = match self.active_action() {
            Some(action) => PaletteChoice::Action(action),
            None => PaletteChoice::Location(self.results.get(self.active)?.index),
        };
        self.close();
        Some(choice)
    }

    fn refresh(&mut self) {
        self.results = filter(&self.query, &self.items);
        self.active = self.active.min(self.results.len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::locations::{names, registry};

    #[test]
    fn test_never_more_than_ten() {
        let items: Vec<String> = (0..40).map(|i| format!("Station {i}")).collect();
        assert_eq!(filter("", &items).len(), 10);
        assert_eq!(filter("st", &items).len(), 10);
        assert_eq!(filter("   ", &items).len(), 10);
    }

    #[test]
    fn test_excludes_non_matches_case_insensitively() {
        let items = ["Tokyo, Japan", "Paris, France", "TOKELAU"];
        let results = filter("TOK", &items);
        let texts: Vec<_> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["Tokyo, Japan", "TOKELAU"]);
    }

    #[test]
    fn test_prefix_before_substring() {
        let items = ["Bangkok", "Kolkata", "Tokyo", "Kobe"];
        let results = filter("ko", &items);
        let texts: Vec<_> = results.iter().map(|r| r.text.as_str()).collect();
        // "bangkok" matches too late in the string to count
        assert_eq!(texts, ["Kolkata", "Kobe", "Tokyo"]);
        assert!(results[1].score < 0.5);
        assert!(results[2].score >= 0.5);
    }

    #[test]
    fn test_empty_query_keeps_order_with_zero_score() {
        let items = ["b", "a", "c"];
        let results = filter("", &items);
        assert_eq!(results.iter().map(|r| r.index).collect::<Vec<_>>(), [0, 1, 2]);
        assert!(results.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let items = ["ab", "ab", "ab"];
        let results = filter("a", &items);
        assert_eq!(results.iter().map(|r| r.index).collect::<Vec<_>>(), [0, 1, 2]);
    }

    #[test]
    fn test_open_resets_query_and_active() {
        let mut palette = PaletteState::new(&names(registry()));
        palette.open();
        palette.move_down();
        palette.move_down();
        assert_eq!(palette.active(), 2);
        palette.push_char('a');
        palette.close();

        palette.open();
        assert_eq!(palette.query(), "");
        assert_eq!(palette.active(), 0);
        assert!(!palette.has_focus());
        palette.on_frame_drawn();
        assert!(palette.has_focus());
    }

    #[test]
    fn test_navigation_clamps() {
        let mut palette = PaletteState::new(&names(registry()));
        palette.open();
        palette.move_up();
        assert_eq!(palette.active(), 0);
        for _ in 0..50 {
            palette.move_down();
        }
        assert_eq!(palette.active(), palette.results().len() - 1);
    }

    #[test]
    fn test_choose_location_and_action() {
        let mut palette = PaletteState::new(&names(registry()));
        palette.open();
        palette.set_query("tokyo");
        assert_eq!(palette.choose(), Some(PaletteChoice::Location(5)));
        assert!(!palette.is_open());

        palette.open();
        palette.switch_section();
        palette.next_action();
        palette.next_action();
        assert_eq!(palette.active_action(), Some(QuickAction::OpenContact));
        assert_eq!(palette.choose(), Some(PaletteChoice::Action(QuickAction::OpenContact)));
    }

    #[test]
    fn test_results_hold_only_location_names() {
        let locations = names(registry());
        let mut palette = PaletteState::new(&locations);
        palette.open();
        for query in ["", "c", "a", "contact", "clear", "rot"] {
            palette.set_query(query);
            for r in palette.results() {
                assert!(locations.contains(&r.text.as_str()), "{query:?} gave {}", r.text);
            }
            // Actions stay on offer whatever was typed
            assert_eq!(palette.actions(), &QuickAction::ALL);
        }
        palette.set_query("c");
        assert!(palette.results().iter().any(|r| r.text == "Cairo, Egypt"));
    }

    #[test]
    fn test_action_row_cursor() {
        let mut palette = PaletteState::new(&names(registry()));
        palette.open();
        assert_eq!(palette.active_action(), None);
        palette.prev_action();
        assert_eq!(palette.active_action(), None);

        palette.switch_section();
        assert_eq!(palette.active_action(), Some(QuickAction::ToggleRotate));
        palette.prev_action();
        assert_eq!(palette.active_action(), Some(QuickAction::OpenStorybook));
        // Up/Down belong to the result list
        palette.move_down();
        assert_eq!(palette.active(), 0);

        palette.push_char('l');
        assert_eq!(palette.active_action(), None);
        palette.switch_section();
        palette.switch_section();
        assert_eq!(palette.active_action(), None);
    }

    #[test]
    fn test_accented_names_score_by_char() {
        let results = filter("paulo", &["São Paulo, Brazil"]);
        assert_eq!(results.len(), 1);
        let expected = 0.5 + 4.0 / 17.0;
        assert!((results[0].score - expected).abs() < 1e-9, "score {}", results[0].score);
    }

    #[test]
    fn test_choose_with_no_results() {
        let mut palette = PaletteState::new(&names(registry()));
        palette.open();
        palette.set_query("zzzz");
        assert_eq!(palette.choose(), None);
        assert!(palette.is_open());
    }
}
