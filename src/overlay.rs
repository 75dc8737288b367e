use std::time::{Duration, Instant};

use ratatui::style::Color;

use crate::data::locations::Location;

/// How long a toast stays up.
pub const TOAST_LIFETIME: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
    Warning,
    Danger,
}

impl ToastKind {
    pub fn color(self) -> Color {
        match self {
            ToastKind::Success => Color::Green,
            ToastKind::Info => Color::Cyan,
            ToastKind::Warning => Color::Yellow,
            ToastKind::Danger => Color::Red,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ToastKind::Success => "Success",
            ToastKind::Info => "Info",
            ToastKind::Warning => "Warning",
            ToastKind::Danger => "Error",
        }
    }
}

/// A transient notification that dismisses itself.
#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    shown: Instant,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>, now: Instant) -> Self {
        Self { kind, message: message.into(), shown: now }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown) >= TOAST_LIFETIME
    }
}

/// Holds at most one toast; a newer one replaces the older.
#[derive(Debug, Default)]
pub struct ToastSlot {
    current: Option<Toast>,
}

impl ToastSlot {
    pub fn show(&mut self, kind: ToastKind, message: impl Into<String>, now: Instant) {
        self.current = Some(Toast::new(kind, message, now));
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// Drop the toast once its time is up.
    pub fn tick(&mut self, now: Instant) {
        if self.current.as_ref().is_some_and(|t| t.is_expired(now)) {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref()
    }
}

/// Rows of the location details modal, as (label, value).
pub fn modal_rows(loc: &Location) -> Vec<(&'static str, String)> {
    let or = |value: &str, fallback: &str| {
        if value.is_empty() { fallback.to_string() } else { value.to_string() }
    };
    vec![
        ("Latitude", format!("{:.4}°", loc.lat)),
        ("Longitude", format!("{:.4}°", loc.lng)),
        ("Description", or(loc.description, "Monitoring climate and vegetation change.")),
        ("Timezone", or(loc.timezone, "UTC+0")),
        ("Status", "Active".to_string()),
        ("Region", or(loc.region, "Global")),
    ]
}

/// Compact hover card text: name and coordinates.
pub fn hover_card(loc: &Location) -> (String, String) {
    let ns = if loc.lat >= 0.0 { "N" } else { "S" };
    let ew = if loc.lng >= 0.0 { "E" } else { "W" };
    (
        loc.name.to_string(),
        format!("{:.2}°{ns}, {:.2}°{ew}", loc.lat.abs(), loc.lng.abs()),
    )
}
