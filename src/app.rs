use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tracing::{debug, info};

use crate::book::catalog::{country_code, BookState, StoryCatalog, OVERVIEW_CODE};
use crate::book::BookView;
use crate::capability::Capabilities;
use crate::config::ViewArgs;
use crate::contact::form::{ContactForm, SubmitOutcome, FAILED_MESSAGE, SENT_MESSAGE};
use crate::data::locations::{names, registry, Location};
use crate::data::stars::generate_stars;
use crate::data::Coastlines;
use crate::deeplink::{self, LinkTarget};
use crate::explorer::{Explorer, Panel, MARKER_ALTITUDE};
use crate::globe::projection::DEFAULT_ALTITUDE;
use crate::globe::{DisplaySettings, GlobeLayer};
use crate::overlay::{ToastKind, ToastSlot};
use crate::palette::{PaletteChoice, PaletteState, QuickAction};

/// Scroll zoom step.
const ZOOM_STEP: f64 = 1.25;

/// The storybook panel: which book was asked for and, once loaded, the
/// open view.
pub struct BookPanel {
    pub code: String,
    pub view: Option<BookView>,
}

/// Application state
pub struct App {
    pub layer: GlobeLayer,
    pub coastlines: Coastlines,
    pub settings: DisplaySettings,
    pub palette: PaletteState,
    pub toasts: ToastSlot,
    /// Location shown in the details modal
    pub modal: Option<usize>,
    pub book: Option<BookPanel>,
    pub form: ContactForm,
    pub contact_open: bool,
    /// Country data explorer, when open
    pub explorer: Option<Explorer>,
    pub should_quit: bool,
    /// Current mouse position for the cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Globe drawing area inside the border, in characters
    globe_cols: u16,
    globe_rows: u16,
    catalog: StoryCatalog,
    caps: Capabilities,
    endpoint: String,
    seed: u64,
    submit_tx: Sender<SubmitOutcome>,
    submit_rx: Receiver<SubmitOutcome>,
}

impl App {
    pub fn new(view: &ViewArgs, coastlines: Coastlines, caps: Capabilities, now: Instant) -> Self {
        let locations = registry();
        let (submit_tx, submit_rx) = mpsc::channel();
        let mut app = Self {
            layer: GlobeLayer::new(locations, generate_stars(view.stars, view.seed), now),
            coastlines,
            settings: DisplaySettings::default(),
            palette: PaletteState::new(&names(locations)),
            toasts: ToastSlot::default(),
            modal: None,
            book: None,
            form: ContactForm::new(),
            contact_open: false,
            explorer: None,
            should_quit: false,
            mouse_pos: None,
            globe_cols: 0,
            globe_rows: 0,
            catalog: StoryCatalog::new(&view.stories_dir),
            caps,
            endpoint: view.endpoint.clone(),
            seed: view.seed,
            submit_tx,
            submit_rx,
        };

        if let Some(link) = &view.link {
            app.follow_link(link, now);
        }
        app
    }

    /// Open whatever a `#loc=` link points at.
    pub fn follow_link(&mut self, link: &str, now: Instant) {
        match deeplink::resolve(link, self.layer.locations()) {
            LinkTarget::Found(index, loc) => {
                info!(location = loc.name, "opening deep link");
                self.select(index, now);
            }
            LinkTarget::Unknown(name) => {
                self.toasts.show(ToastKind::Info, format!("Location not found: {name}"), now);
            }
            LinkTarget::Absent => {}
        }
    }

    /// Size the globe to the terminal. Border takes 2 columns and 2 rows,
    /// the status bar one more row.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.globe_cols = width.saturating_sub(2);
        self.globe_rows = height.saturating_sub(3);
        if self.globe_cols == 0 || self.globe_rows == 0 {
            self.layer.unmount();
        } else {
            let fresh = !self.layer.is_mounted();
            // Braille gives 2x4 resolution per character
            self.layer.mount(self.globe_cols as usize * 2, self.globe_rows as usize * 4);
            // A selection made before the scene existed (deep link) still
            // needs its fly-to
            if let Some(index) = self.layer.selected().filter(|_| fresh) {
                self.layer.select(index, Instant::now());
            }
        }
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn selected_location(&self) -> Option<&'static Location> {
        self.layer.selected_location()
    }

    pub fn modal_location(&self) -> Option<&'static Location> {
        self.modal.and_then(|i| self.layer.locations().get(i))
    }

    /// Select a location and show its details.
    fn select(&mut self, index: usize, now: Instant) {
        if self.layer.select(index, now).is_some() {
            self.modal = Some(index);
        }
    }

    // ---- storybook ----

    /// Open the book for `code`, loading it in the background if needed.
    pub fn open_book(&mut self, code: &str, now: Instant) {
        let code = code.to_uppercase();
        let view = match self.catalog.request(&code) {
            BookState::Ready(book) => Some(BookView::open(book.clone(), &self.caps)),
            BookState::Loading | BookState::Missing => None,
        };
        debug!(code = %code, loaded = view.is_some(), "opening storybook");
        self.book = Some(BookPanel { code, view });
        self.layer.note_interaction(now);
    }

    /// `b`: the book of the selected location's country, or the overview
    /// when nothing is selected.
    pub fn open_book_for_selection(&mut self, now: Instant) {
        let Some(loc) = self.modal_location().or_else(|| self.selected_location()) else {
            self.open_book(OVERVIEW_CODE, now);
            return;
        };
        match country_code(loc.country()) {
            Some(code) => self.open_book(code, now),
            None => self.toasts.show(
                ToastKind::Info,
                format!("No storybook for {} yet", loc.country()),
                now,
            ),
        }
    }

    pub fn book_state(&self) -> Option<&BookState> {
        self.book.as_ref().and_then(|panel| self.catalog.get(&panel.code))
    }

    fn close_book(&mut self) {
        self.book = None;
    }

    // ---- explorer ----

    /// Open the explorer. It starts playing, so the globe spins.
    pub fn open_explorer(&mut self) {
        let explorer = Explorer::new(self.seed);
        self.layer.set_auto_rotate(explorer.is_playing());
        self.explorer = Some(explorer);
        debug!("explorer opened");
    }

    fn close_explorer(&mut self) {
        self.explorer = None;
    }

    /// Select a country marker and fly to it.
    fn pick_marker(&mut self, index: usize, now: Instant) {
        let Some(explorer) = self.explorer.as_mut() else {
            return;
        };
        if let Some(country) = explorer.select(index) {
            let (lat, lng) = (country.lat, country.lng);
            self.layer.fly_to(lat, lng, MARKER_ALTITUDE, now);
        }
    }

    fn explorer_key(&mut self, key: KeyEvent, now: Instant) {
        let Some(explorer) = self.explorer.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc if explorer.selected().is_some() => explorer.deselect(),
            KeyCode::Esc | KeyCode::Char('g') => self.close_explorer(),
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char(' ') | KeyCode::Char('p') => {
                let playing = explorer.toggle_play();
                self.layer.set_auto_rotate(playing);
            }
            KeyCode::Left | KeyCode::Char('-') => explorer.step_year(false),
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => explorer.step_year(true),
            KeyCode::Home => explorer.set_year_index(0),
            KeyCode::End => explorer.set_year_index(usize::MAX),
            KeyCode::Tab => explorer.next_panel(),
            KeyCode::BackTab => explorer.prev_panel(),
            KeyCode::Char('t') => explorer.set_panel(Panel::Climate),
            KeyCode::Char('d') => explorer.set_panel(Panel::Disasters),
            KeyCode::Char('u') => explorer.set_panel(Panel::Urbanization),
            KeyCode::Up | KeyCode::Down => {
                if let Some(country) = explorer.select_step(key.code == KeyCode::Down) {
                    let (lat, lng) = (country.lat, country.lng);
                    self.layer.fly_to(lat, lng, MARKER_ALTITUDE, now);
                }
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.pick_marker(index, now);
            }
            KeyCode::Char('r') => {
                explorer.reset();
                // Pull back to the world view where the camera is
                if let Some((lat, lng)) = self.layer.viewport().map(|vp| vp.center()) {
                    self.layer.fly_to(lat, lng, DEFAULT_ALTITUDE, now);
                }
            }
            KeyCode::Char('i') => explorer.toggle_info(),
            KeyCode::Char('c') => self.contact_open = true,
            _ => {}
        }
    }

    // ---- contact form ----

    fn submit_form(&mut self, now: Instant) {
        if self.form.is_loading() {
            return;
        }
        if !self.form.is_valid() {
            self.toasts.show(ToastKind::Warning, "Please fix the highlighted fields", now);
            return;
        }
        let tx = self.submit_tx.clone();
        if self.form.submit(&self.endpoint, tx) {
            self.toasts.show(ToastKind::Info, "Sending…", now);
        }
    }

    fn finish_submission(&mut self, outcome: SubmitOutcome, now: Instant) {
        self.form.finish(&outcome);
        match outcome {
            SubmitOutcome::Sent => {
                self.toasts.show(ToastKind::Success, SENT_MESSAGE, now);
                self.contact_open = false;
            }
            SubmitOutcome::Rejected(error) | SubmitOutcome::Failed(error) => {
                debug!(%error, "contact submission did not go through");
                self.toasts.show(ToastKind::Danger, FAILED_MESSAGE, now);
            }
        }
    }

    // ---- palette ----

    fn apply_choice(&mut self, choice: PaletteChoice, now: Instant) {
        match choice {
            PaletteChoice::Location(index) => self.select(index, now),
            PaletteChoice::Action(QuickAction::ToggleRotate) => {
                self.layer.toggle_auto_rotate();
                let state = if self.layer.auto_rotate_enabled() { "on" } else { "off" };
                self.toasts.show(ToastKind::Info, format!("Auto-rotate {state}"), now);
            }
            PaletteChoice::Action(QuickAction::ClearSelection) => {
                self.layer.clear_selection();
                self.modal = None;
            }
            PaletteChoice::Action(QuickAction::OpenContact) => self.contact_open = true,
            PaletteChoice::Action(QuickAction::OpenStorybook) => self.open_book_for_selection(now),
        }
    }

    // ---- input ----

    /// Route a key press to whichever surface is on top: palette, contact
    /// form, storybook, modal, explorer, then the globe. Every key counts as
    /// activity for the idle timer.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        self.layer.note_interaction(now);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('k') | KeyCode::Char('K')) {
            self.palette.toggle();
            return;
        }
        if ctrl && key.code == KeyCode::Char('c') {
            self.quit();
            return;
        }

        if self.palette.is_open() {
            self.palette_key(key, now);
        } else if self.contact_open {
            self.contact_key(key, now);
        } else if self.book.is_some() {
            self.book_key(key, now);
        } else if self.modal.is_some() {
            self.modal_key(key, now);
        } else if self.explorer.is_some() {
            self.explorer_key(key, now);
        } else {
            self.globe_key(key, now);
        }
    }

    fn palette_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Esc => self.palette.close(),
            KeyCode::Up => self.palette.move_up(),
            KeyCode::Down => self.palette.move_down(),
            KeyCode::Tab | KeyCode::BackTab => self.palette.switch_section(),
            KeyCode::Right => self.palette.next_action(),
            KeyCode::Left => self.palette.prev_action(),
            KeyCode::Enter => {
                if let Some(choice) = self.palette.choose() {
                    self.apply_choice(choice, now);
                }
            }
            // Input only counts once the palette has been painted
            KeyCode::Backspace if self.palette.has_focus() => self.palette.backspace(),
            KeyCode::Char(c) if self.palette.has_focus() => self.palette.push_char(c),
            _ => {}
        }
    }

    fn contact_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Esc => self.contact_open = false,
            KeyCode::Tab | KeyCode::Down => self.form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus_prev(),
            KeyCode::Enter => self.submit_form(now),
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Char(c) => self.form.push_char(c),
            _ => {}
        }
    }

    fn book_key(&mut self, key: KeyEvent, now: Instant) {
        let Some(panel) = self.book.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') => self.close_book(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') | KeyCode::PageDown => {
                if let Some(view) = panel.view.as_mut() {
                    view.next(&self.caps, now);
                }
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => {
                if let Some(view) = panel.view.as_mut() {
                    view.prev(&self.caps, now);
                }
            }
            _ => {}
        }
    }

    fn modal_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.modal = None,
            KeyCode::Char('b') => self.open_book_for_selection(now),
            KeyCode::Char('c') => self.contact_open = true,
            KeyCode::Char('q') => self.quit(),
            // Cycling keeps the modal open on the new location
            KeyCode::Left | KeyCode::Right => self.globe_key(key, now),
            _ => {}
        }
    }

    fn globe_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('/') => self.palette.open(),
            KeyCode::Right => {
                self.layer.select_next(now);
                self.sync_modal();
            }
            KeyCode::Left => {
                self.layer.select_prev(now);
                self.sync_modal();
            }
            KeyCode::Enter => self.layer.recenter(now),
            KeyCode::Char(' ') => self.layer.toggle_auto_rotate(),
            KeyCode::Esc => {
                self.layer.clear_selection();
                self.modal = None;
            }
            KeyCode::Char('b') => self.open_book_for_selection(now),
            KeyCode::Char('c') => self.contact_open = true,
            KeyCode::Char('g') => self.open_explorer(),

            // Zoom
            KeyCode::Char('+') | KeyCode::Char('=') => self.layer.zoom_by(ZOOM_STEP, now),
            KeyCode::Char('-') | KeyCode::Char('_') => self.layer.zoom_by(1.0 / ZOOM_STEP, now),

            // Layer toggles
            KeyCode::Char('a') => self.settings.show_arcs = !self.settings.show_arcs,
            KeyCode::Char('r') => self.settings.show_rings = !self.settings.show_rings,
            KeyCode::Char('l') => self.settings.show_labels = !self.settings.show_labels,
            KeyCode::Char('s') => self.settings.show_stars = !self.settings.show_stars,
            _ => {}
        }
    }

    /// Keep an open modal on the current selection.
    fn sync_modal(&mut self) {
        if self.modal.is_some() {
            self.modal = self.layer.selected();
        }
    }

    /// Pointer input only reaches the globe when no panel covers it.
    pub fn pointer_blocked(&self) -> bool {
        self.palette.is_open() || self.contact_open || self.book.is_some()
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Mouse input: hover, drag to rotate, click, scroll to zoom. Any
    /// mouse event counts as activity, even under a panel.
    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        // Always track mouse position for cursor marker
        self.set_mouse_pos(mouse.column, mouse.row);
        self.layer.note_interaction(now);
        if self.pointer_blocked() {
            return;
        }

        match mouse.kind {
            MouseEventKind::Moved => self.pointer_move(mouse.column, mouse.row, now),
            // Scroll wheel for zooming
            MouseEventKind::ScrollUp => self.zoom_in(now),
            MouseEventKind::ScrollDown => self.zoom_out(now),
            // Click a location, or drag to rotate
            MouseEventKind::Down(MouseButton::Left) => self.pointer_down(mouse.column, mouse.row, now),
            MouseEventKind::Drag(MouseButton::Left) => self.pointer_drag(mouse.column, mouse.row, now),
            MouseEventKind::Up(MouseButton::Left) => self.pointer_up(mouse.column, mouse.row, now),
            _ => {}
        }
    }

    /// Terminal cell to braille pixel inside the globe area. Account for
    /// border (1 cell offset).
    fn to_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        if col == 0 || row == 0 || col > self.globe_cols || row > self.globe_rows {
            return None;
        }
        Some(((col - 1) as i32 * 2, (row - 1) as i32 * 4))
    }

    pub fn pointer_move(&mut self, col: u16, row: u16, now: Instant) {
        match self.to_pixel(col, row) {
            Some((px, py)) => self.layer.pointer_move(px, py, now),
            None => self.layer.pointer_leave(),
        }
    }

    pub fn pointer_down(&mut self, col: u16, row: u16, now: Instant) {
        if let Some((px, py)) = self.to_pixel(col, row) {
            self.layer.pointer_down(px, py, now);
        }
    }

    pub fn pointer_drag(&mut self, col: u16, row: u16, now: Instant) {
        if let Some((px, py)) = self.to_pixel(col, row) {
            self.layer.pointer_drag(px, py, now);
        }
    }

    /// A click on an explorer marker picks that country; a click on a
    /// location selects it and opens the modal.
    pub fn pointer_up(&mut self, col: u16, row: u16, now: Instant) {
        let Some((px, py)) = self.to_pixel(col, row) else {
            return;
        };
        let marker = match (&self.explorer, self.layer.viewport()) {
            (Some(explorer), Some(vp)) => explorer.marker_at(vp, px, py),
            _ => None,
        };
        if let Some(index) = marker {
            if self.layer.take_click(now) {
                self.pick_marker(index, now);
            }
            return;
        }
        if let Some(index) = self.layer.pointer_up(px, py, now) {
            self.modal = Some(index);
        }
    }

    pub fn zoom_in(&mut self, now: Instant) {
        self.layer.zoom_by(ZOOM_STEP, now);
    }

    pub fn zoom_out(&mut self, now: Instant) {
        self.layer.zoom_by(1.0 / ZOOM_STEP, now);
    }

    // ---- per frame ----

    /// Advance animations and apply background results.
    pub fn tick(&mut self, now: Instant) {
        self.layer.tick(now);
        self.toasts.tick(now);

        for code in self.catalog.poll() {
            let Some(panel) = self.book.as_mut() else {
                continue;
            };
            if panel.code != code || panel.view.is_some() {
                continue;
            }
            if let Some(BookState::Ready(book)) = self.catalog.get(&code) {
                panel.view = Some(BookView::open(book.clone(), &self.caps));
            }
        }

        while let Ok(outcome) = self.submit_rx.try_recv() {
            self.finish_submission(outcome, now);
        }

        if let Some(view) = self.book.as_mut().and_then(|p| p.view.as_mut()) {
            view.tick(now);
        }
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        match self.layer.viewport() {
            Some(vp) => format!("{:.1}x", vp.zoom),
            None => "-".to_string(),
        }
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        match self.layer.viewport().map(|vp| vp.center()) {
            Some((lat, lng)) => format_coords(lat, lng),
            None => String::new(),
        }
    }

    /// Surface point under the mouse, if it is over the globe.
    pub fn pointer_coords(&self) -> Option<String> {
        let (col, row) = self.mouse_pos?;
        let (px, py) = self.to_pixel(col, row)?;
        let (lat, lng) = self.layer.viewport()?.unproject(px, py)?;
        Some(format_coords(lat, lng))
    }
}

fn format_coords(lat: f64, lng: f64) -> String {
    format!(
        "{:.1}°{}, {:.1}°{}",
        lat.abs(),
        if lat >= 0.0 { "N" } else { "S" },
        lng.abs(),
        if lng >= 0.0 { "E" } else { "W" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::testing::Recorder;
    use crate::config::Cli;
    use crate::data::builtin_world;
    use clap::Parser;
    use std::thread;
    use std::time::Duration;

    fn view_args(extra: &[&str]) -> ViewArgs {
        let args = ["terra-globe", "--stars", "50"].into_iter().chain(extra.iter().copied());
        Cli::try_parse_from(args).expect("parses").view
    }

    fn app_with(extra: &[&str]) -> (App, Recorder) {
        let rec = Recorder::default();
        let mut app = App::new(&view_args(extra), builtin_world(), rec.capabilities(true), Instant::now());
        app.resize(82, 27);
        (app, rec)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::from(code), Instant::now());
    }

    fn ctrl(app: &mut App, c: char) {
        app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL), Instant::now());
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_resize_mounts_and_unmounts() {
        let (mut app, _) = app_with(&[]);
        assert!(app.layer.is_mounted());
        let vp = app.layer.viewport().expect("mounted");
        assert_eq!((vp.width, vp.height), (160, 96));

        app.resize(2, 2);
        assert!(!app.layer.is_mounted());
    }

    #[test]
    fn test_deep_link_opens_modal() {
        let (app, _) = app_with(&["--link", "#loc=tokyo%2C%20japan"]);
        assert_eq!(app.modal_location().map(|l| l.name), Some("Tokyo, Japan"));
        assert_eq!(app.layer.selected(), app.modal);
    }

    #[test]
    fn test_unknown_deep_link_shows_toast() {
        let (app, _) = app_with(&["--link", "#loc=Atlantis"]);
        assert!(app.modal.is_none());
        let toast = app.toasts.current().expect("toast");
        assert_eq!(toast.kind, ToastKind::Info);
        assert!(toast.message.contains("Atlantis"));
    }

    #[test]
    fn test_palette_search_selects_location() {
        let (mut app, _) = app_with(&[]);
        ctrl(&mut app, 'k');
        assert!(app.palette.is_open());

        // Not painted yet: typing is dropped
        type_str(&mut app, "x");
        assert_eq!(app.palette.query(), "");

        app.palette.on_frame_drawn();
        type_str(&mut app, "lond");
        press(&mut app, KeyCode::Enter);
        assert!(!app.palette.is_open());
        assert_eq!(app.modal_location().map(|l| l.name), Some("London, UK"));
    }

    #[test]
    fn test_palette_quick_action() {
        let (mut app, _) = app_with(&[]);
        assert!(app.layer.auto_rotate_enabled());
        press(&mut app, KeyCode::Char('/'));
        app.palette.on_frame_drawn();
        // A query narrows the locations but the action row stays
        type_str(&mut app, "zzz");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);
        assert!(!app.layer.auto_rotate_enabled());
        assert_eq!(app.toasts.current().map(|t| t.message.as_str()), Some("Auto-rotate off"));

        ctrl(&mut app, 'k');
        app.palette.on_frame_drawn();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Enter);
        assert!(app.contact_open);
    }

    #[test]
    fn test_overlay_keys_count_as_activity() {
        let (mut app, _) = app_with(&[]);
        assert!(app.layer.is_rotating());
        ctrl(&mut app, 'k');
        assert!(!app.layer.is_rotating());

        // Rotation comes back 5 s after the last key, not the first
        let start = Instant::now();
        app.palette.on_frame_drawn();
        for (i, c) in "tok".chars().enumerate() {
            app.handle_key(KeyEvent::from(KeyCode::Char(c)), start + Duration::from_secs(2 * i as u64));
        }
        app.handle_key(KeyEvent::from(KeyCode::Down), start + Duration::from_secs(6));
        app.tick(start + Duration::from_secs(10));
        assert!(!app.layer.is_rotating());
        app.tick(start + Duration::from_secs(12));
        assert!(app.layer.is_rotating());
    }

    #[test]
    fn test_mouse_under_panel_counts_as_activity() {
        let (mut app, _) = app_with(&[]);
        app.contact_open = true;
        let now = Instant::now();
        let event = MouseEvent {
            kind: MouseEventKind::Moved,
            column: 10,
            row: 10,
            modifiers: KeyModifiers::NONE,
        };
        app.handle_mouse(event, now);
        assert!(!app.layer.is_rotating());
        assert_eq!(app.mouse_pos, Some((10, 10)));
        // The panel still keeps the pointer off the globe
        assert!(app.layer.hovered().is_none());
    }

    #[test]
    fn test_explorer_keys() {
        let (mut app, _) = app_with(&[]);
        app.layer.toggle_auto_rotate();
        press(&mut app, KeyCode::Char('g'));
        let explorer = app.explorer.as_ref().expect("open");
        assert!(explorer.is_playing() && explorer.show_info());
        // Playing drives the globe's auto-rotate
        assert!(app.layer.auto_rotate_enabled());

        press(&mut app, KeyCode::Char(' '));
        assert!(!app.layer.auto_rotate_enabled());

        press(&mut app, KeyCode::Char('2'));
        assert!(app.layer.is_flying());
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Tab);
        let explorer = app.explorer.as_ref().expect("open");
        assert_eq!(explorer.selected_country().map(|c| c.name), Some("Bangladesh"));
        assert_eq!(explorer.year(), 2002);
        assert_eq!(explorer.panel(), Panel::Disasters);

        press(&mut app, KeyCode::Char('r'));
        let explorer = app.explorer.as_ref().expect("open");
        assert_eq!((explorer.selected(), explorer.year()), (None, 2000));

        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Esc);
        assert!(app.explorer.as_ref().is_some_and(|e| e.selected().is_none()));
        press(&mut app, KeyCode::Esc);
        assert!(app.explorer.is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_click_picks_explorer_marker() {
        let (mut app, _) = app_with(&["--stars", "0"]);
        app.open_explorer();
        app.layer.set_auto_rotate(false);
        let now = Instant::now();
        let vp = app.layer.viewport().expect("mounted").clone();
        let explorer = app.explorer.as_ref().expect("open");
        let hit = (0..explorer.countries().len()).find_map(|i| {
            let c = &explorer.countries()[i];
            let (px, py) = vp.project(c.lat, c.lng)?;
            // Only cells whose corner pixel still hits the marker
            let (col, row) = ((px / 2 + 1) as u16, (py / 4 + 1) as u16);
            let corner = ((col as i32 - 1) * 2, (row as i32 - 1) * 4);
            (explorer.marker_at(&vp, corner.0, corner.1) == Some(i)).then_some((i, col, row))
        });
        let Some((index, col, row)) = hit else {
            return;
        };

        app.pointer_down(col, row, now);
        app.pointer_up(col, row, now);
        assert_eq!(app.explorer.as_ref().and_then(|e| e.selected()), Some(index));
        assert!(app.modal.is_none());
    }

    #[test]
    fn test_arrows_cycle_and_escape_layers() {
        let (mut app, _) = app_with(&[]);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.layer.selected(), Some(0));
        press(&mut app, KeyCode::Left);
        assert_eq!(app.layer.selected(), Some(registry().len() - 1));

        app.select(2, Instant::now());
        press(&mut app, KeyCode::Right);
        // Modal follows the selection
        assert_eq!(app.modal, Some(3));

        press(&mut app, KeyCode::Esc);
        assert!(app.modal.is_none());
        assert_eq!(app.layer.selected(), Some(3));
        press(&mut app, KeyCode::Esc);
        assert!(app.layer.selected().is_none());
    }

    #[test]
    fn test_contact_form_captures_typing() {
        let (mut app, _) = app_with(&[]);
        press(&mut app, KeyCode::Char('c'));
        assert!(app.contact_open);
        type_str(&mut app, "qa");
        assert_eq!(app.form.name, "qa");
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.toasts.current().map(|t| t.kind), Some(ToastKind::Warning));
        assert!(!app.form.is_loading());

        press(&mut app, KeyCode::Esc);
        assert!(!app.contact_open);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_book_opens_after_background_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dir_arg = dir.path().to_string_lossy().into_owned();
        let (mut app, rec) = app_with(&["--stories-dir", &dir_arg]);

        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.book.as_ref().map(|p| p.code.as_str()), Some(OVERVIEW_CODE));

        let deadline = Instant::now() + Duration::from_secs(5);
        while app.book.as_ref().is_some_and(|p| p.view.is_none()) && Instant::now() < deadline {
            app.tick(Instant::now());
            thread::sleep(Duration::from_millis(10));
        }
        let view = app.book.as_ref().and_then(|p| p.view.as_ref()).expect("book loaded");
        assert_eq!(view.current(), 0);
        assert!(!rec.spoken.borrow().is_empty());

        press(&mut app, KeyCode::Right);
        let view = app.book.as_ref().and_then(|p| p.view.as_ref()).expect("still open");
        assert_eq!(view.current(), 1);

        press(&mut app, KeyCode::Esc);
        assert!(app.book.is_none());
    }

    #[test]
    fn test_click_selects_location() {
        let (mut app, _) = app_with(&["--stars", "0"]);
        app.layer.toggle_auto_rotate();
        let now = Instant::now();
        let vp = app.layer.viewport().expect("mounted").clone();
        let (index, (px, py)) = app
            .layer
            .locations()
            .iter()
            .enumerate()
            .find_map(|(i, l)| vp.project(l.lat, l.lng).map(|p| (i, p)))
            .expect("a visible location");
        let (col, row) = ((px / 2 + 1) as u16, (py / 4 + 1) as u16);

        app.pointer_down(col, row, now);
        app.pointer_up(col, row, now);
        // Cell rounding may land on a neighbour; any hit opens the modal
        if app.layer.hit_test((col as i32 - 1) * 2, (row as i32 - 1) * 4).is_some() {
            assert!(app.modal.is_some());
            assert_eq!(app.modal, app.layer.selected());
        } else {
            assert!(app.modal.is_none(), "miss must not select {index}");
        }
    }
}
