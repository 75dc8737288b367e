//! Terra Earth explorer: five country markers, each carrying 25 years of
//! climate, disaster and urbanisation series, browsed with a year cursor.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::globe::layer::HIT_TOLERANCE;
use crate::globe::GlobeViewport;

pub const FIRST_YEAR: u16 = 2000;
pub const YEARS: usize = 25;
/// Camera altitude when a marker is picked.
pub const MARKER_ALTITUDE: f64 = 2.2;

/// How one yearly value is drawn.
#[derive(Debug, Clone, Copy)]
enum Draw {
    /// `base + uniform[0, span)`
    Uniform(f64, f64),
    /// `floor(uniform[0, n))`
    Count(u32),
    Fixed(f64),
}

impl Draw {
    fn sample(self, rng: &mut StdRng) -> f64 {
        match self {
            Draw::Uniform(base, span) => base + rng.random::<f64>() * span,
            Draw::Count(n) => (rng.random::<f64>() * n as f64).floor(),
            Draw::Fixed(v) => v,
        }
    }
}

struct CountrySpec {
    name: &'static str,
    lat: f64,
    lng: f64,
    temperature: Draw,
    co2: Draw,
    earthquakes: Draw,
    floods: Draw,
    urban: Draw,
}

const COUNTRIES: [CountrySpec; 5] = [
    CountrySpec {
        name: "United Kingdom",
        lat: 55.3781,
        lng: -3.436,
        temperature: Draw::Uniform(10.0, 5.0),
        co2: Draw::Uniform(500.0, 50.0),
        earthquakes: Draw::Count(5),
        floods: Draw::Count(3),
        urban: Draw::Uniform(80.0, 5.0),
    },
    CountrySpec {
        name: "Bangladesh",
        lat: 23.685,
        lng: 90.3563,
        temperature: Draw::Uniform(25.0, 3.0),
        co2: Draw::Uniform(100.0, 30.0),
        earthquakes: Draw::Count(2),
        floods: Draw::Count(10),
        urban: Draw::Uniform(35.0, 5.0),
    },
    CountrySpec {
        name: "Australia",
        lat: -25.2744,
        lng: 133.7751,
        temperature: Draw::Uniform(22.0, 5.0),
        co2: Draw::Uniform(300.0, 50.0),
        earthquakes: Draw::Count(3),
        floods: Draw::Count(2),
        urban: Draw::Uniform(85.0, 5.0),
    },
    CountrySpec {
        name: "Brazil",
        lat: -14.235,
        lng: -51.9253,
        temperature: Draw::Uniform(27.0, 3.0),
        co2: Draw::Uniform(400.0, 50.0),
        earthquakes: Draw::Fixed(0.0),
        floods: Draw::Count(5),
        urban: Draw::Uniform(90.0, 5.0),
    },
    CountrySpec {
        name: "Canada",
        lat: 56.1304,
        lng: -106.3468,
        temperature: Draw::Uniform(-5.0, 5.0),
        co2: Draw::Uniform(600.0, 50.0),
        earthquakes: Draw::Fixed(1.0),
        floods: Draw::Count(3),
        urban: Draw::Uniform(70.0, 5.0),
    },
];

/// One labelled yearly series.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: &'static str,
    pub values: Vec<f64>,
}

impl Series {
    fn generate(label: &'static str, draw: Draw, rng: &mut StdRng) -> Self {
        Self { label, values: (0..YEARS).map(|_| draw.sample(rng)).collect() }
    }

    pub fn value(&self, year_index: usize) -> f64 {
        self.values.get(year_index).copied().unwrap_or(0.0)
    }

    /// `|value|` against the largest `|value|` in the series, in [0, 1].
    /// An all-zero series reads as empty.
    pub fn ratio(&self, year_index: usize) -> f64 {
        let max = self.values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if max == 0.0 {
            return 0.0;
        }
        (self.value(year_index).abs() / max).min(1.0)
    }

    /// `(year, value)` pairs for charting.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| ((FIRST_YEAR as usize + i) as f64, *v))
            .collect()
    }

    pub fn bounds(&self) -> (f64, f64) {
        self.values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Climate,
    Disasters,
    Urbanization,
}

impl Panel {
    pub const ALL: [Panel; 3] = [Panel::Climate, Panel::Disasters, Panel::Urbanization];

    pub fn title(self) -> &'static str {
        match self {
            Panel::Climate => "Climate",
            Panel::Disasters => "Disasters",
            Panel::Urbanization => "Urbanization",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Panel::Climate => 0,
            Panel::Disasters => 1,
            Panel::Urbanization => 2,
        }
    }

    fn next(self) -> Panel {
        Panel::ALL[(self.index() + 1) % Panel::ALL.len()]
    }

    fn prev(self) -> Panel {
        Panel::ALL[(self.index() + Panel::ALL.len() - 1) % Panel::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Country {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub temperature: Series,
    pub co2: Series,
    pub earthquakes: Series,
    pub floods: Series,
    pub urban_population: Series,
}

impl Country {
    pub fn series(&self, panel: Panel) -> Vec<&Series> {
        match panel {
            Panel::Climate => vec![&self.temperature, &self.co2],
            Panel::Disasters => vec![&self.earthquakes, &self.floods],
            Panel::Urbanization => vec![&self.urban_population],
        }
    }
}

/// Generate every country's series from `seed`.
pub fn generate_countries(seed: u64) -> Vec<Country> {
    let mut rng = StdRng::seed_from_u64(seed);
    COUNTRIES
        .iter()
        .map(|spec| Country {
            name: spec.name,
            lat: spec.lat,
            lng: spec.lng,
            temperature: Series::generate("Temperature (°C)", spec.temperature, &mut rng),
            co2: Series::generate("CO₂ Emissions (Mt)", spec.co2, &mut rng),
            earthquakes: Series::generate("Earthquakes", spec.earthquakes, &mut rng),
            floods: Series::generate("Floods", spec.floods, &mut rng),
            urban_population: Series::generate("Urban Population (%)", spec.urban, &mut rng),
        })
        .collect()
}

/// Explorer view state. The globe side effects (fly-to, auto-rotate) are
/// applied by the caller from the values these methods return.
pub struct Explorer {
    countries: Vec<Country>,
    selected: Option<usize>,
    panel: Panel,
    year_index: usize,
    playing: bool,
    show_info: bool,
}

impl Explorer {
    /// Starts playing with the info box up and nothing selected.
    pub fn new(seed: u64) -> Self {
        Self {
            countries: generate_countries(seed),
            selected: None,
            panel: Panel::default(),
            year_index: 0,
            playing: true,
            show_info: true,
        }
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_country(&self) -> Option<&Country> {
        self.selected.and_then(|i| self.countries.get(i))
    }

    pub fn select(&mut self, index: usize) -> Option<&Country> {
        let country = self.countries.get(index)?;
        self.selected = Some(index);
        Some(country)
    }

    /// Up/Down: neighbouring marker, wrapping.
    pub fn select_step(&mut self, forward: bool) -> Option<&Country> {
        let n = self.countries.len();
        if n == 0 {
            return None;
        }
        let next = match (self.selected, forward) {
            (None, true) => 0,
            (None, false) => n - 1,
            (Some(i), true) => (i + 1) % n,
            (Some(i), false) => (i + n - 1) % n,
        };
        self.select(next)
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn set_panel(&mut self, panel: Panel) {
        self.panel = panel;
    }

    pub fn next_panel(&mut self) {
        self.panel = self.panel.next();
    }

    pub fn prev_panel(&mut self) {
        self.panel = self.panel.prev();
    }

    pub fn year_index(&self) -> usize {
        self.year_index
    }

    pub fn year(&self) -> u16 {
        FIRST_YEAR + self.year_index as u16
    }

    pub fn set_year_index(&mut self, index: usize) {
        self.year_index = index.min(YEARS - 1);
    }

    /// Step the year cursor, stopping at either end.
    pub fn step_year(&mut self, forward: bool) {
        self.year_index = if forward {
            (self.year_index + 1).min(YEARS - 1)
        } else {
            self.year_index.saturating_sub(1)
        };
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Play/pause; returns the new state.
    pub fn toggle_play(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    /// Back to the first year with nothing selected.
    pub fn reset(&mut self) {
        self.year_index = 0;
        self.selected = None;
    }

    pub fn show_info(&self) -> bool {
        self.show_info
    }

    pub fn toggle_info(&mut self) {
        self.show_info = !self.show_info;
    }

    /// Marker under a braille pixel, nearest first.
    pub fn marker_at(&self, vp: &GlobeViewport, px: i32, py: i32) -> Option<usize> {
        let tol2 = HIT_TOLERANCE * HIT_TOLERANCE;
        self.countries
            .iter()
            .enumerate()
            .filter_map(|(i, c)| {
                let (x, y) = vp.project(c.lat, c.lng)?;
                let d2 = (x - px).pow(2) + (y - py).pow(2);
                (d2 <= tol2).then_some((d2, i))
            })
            .min()
            .map(|(_, i)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_ranges_follow_each_country() {
        let countries = generate_countries(7);
        assert_eq!(countries.len(), 5);
        for c in &countries {
            for s in [&c.temperature, &c.co2, &c.earthquakes, &c.floods, &c.urban_population] {
                assert_eq!(s.values.len(), YEARS, "{} {}", c.name, s.label);
            }
        }

        let uk = &countries[0];
        assert!(uk.temperature.values.iter().all(|v| (10.0..15.0).contains(v)));
        assert!(uk.earthquakes.values.iter().all(|v| v.fract() == 0.0 && (0.0..5.0).contains(v)));

        let bangladesh = &countries[1];
        assert!(bangladesh.floods.values.iter().all(|v| (0.0..10.0).contains(v)));

        let brazil = &countries[3];
        assert!(brazil.earthquakes.values.iter().all(|v| *v == 0.0));
        let canada = &countries[4];
        assert!(canada.earthquakes.values.iter().all(|v| *v == 1.0));
        assert!(canada.temperature.values.iter().all(|v| (-5.0..0.0).contains(v)));
    }

    #[test]
    fn test_seed_is_reproducible() {
        assert_eq!(generate_countries(3), generate_countries(3));
        assert_ne!(generate_countries(3)[0].co2, generate_countries(4)[0].co2);
    }

    #[test]
    fn test_ratio_handles_negative_and_zero_series() {
        let series = Series { label: "t", values: vec![-4.0, 2.0, -1.0] };
        assert_eq!(series.ratio(0), 1.0);
        assert_eq!(series.ratio(1), 0.5);
        assert_eq!(series.ratio(9), 0.0);
        assert_eq!(series.bounds(), (-4.0, 2.0));

        let flat = Series { label: "quakes", values: vec![0.0; 3] };
        assert_eq!(flat.ratio(1), 0.0);
    }

    #[test]
    fn test_points_are_keyed_by_year() {
        let c = &generate_countries(1)[2];
        let points = c.urban_population.points();
        assert_eq!(points.len(), YEARS);
        assert_eq!(points[0].0, 2000.0);
        assert_eq!(points[YEARS - 1].0, 2024.0);
    }

    #[test]
    fn test_panels_pick_their_series() {
        let c = &generate_countries(1)[0];
        let labels = |p| c.series(p).iter().map(|s| s.label).collect::<Vec<_>>();
        assert_eq!(labels(Panel::Climate), ["Temperature (°C)", "CO₂ Emissions (Mt)"]);
        assert_eq!(labels(Panel::Disasters), ["Earthquakes", "Floods"]);
        assert_eq!(labels(Panel::Urbanization), ["Urban Population (%)"]);
    }

    #[test]
    fn test_year_cursor_clamps() {
        let mut explorer = Explorer::new(1);
        assert_eq!(explorer.year(), 2000);
        explorer.step_year(false);
        assert_eq!(explorer.year_index(), 0);
        for _ in 0..40 {
            explorer.step_year(true);
        }
        assert_eq!(explorer.year(), 2024);
        explorer.set_year_index(99);
        assert_eq!(explorer.year_index(), YEARS - 1);
    }

    #[test]
    fn test_panel_cycle_and_reset() {
        let mut explorer = Explorer::new(1);
        explorer.prev_panel();
        assert_eq!(explorer.panel(), Panel::Urbanization);
        explorer.next_panel();
        explorer.next_panel();
        assert_eq!(explorer.panel(), Panel::Disasters);

        explorer.select(4);
        explorer.set_year_index(12);
        explorer.reset();
        assert_eq!((explorer.selected(), explorer.year_index()), (None, 0));
        // The panel tab survives a reset
        assert_eq!(explorer.panel(), Panel::Disasters);
    }

    #[test]
    fn test_selection_wraps() {
        let mut explorer = Explorer::new(1);
        assert_eq!(explorer.select_step(false).map(|c| c.name), Some("Canada"));
        assert_eq!(explorer.select_step(true).map(|c| c.name), Some("United Kingdom"));
        assert!(explorer.select(5).is_none());
        assert_eq!(explorer.selected(), Some(0));
    }

    #[test]
    fn test_marker_hit_test() {
        let explorer = Explorer::new(1);
        let brazil = &explorer.countries()[3];
        let vp = GlobeViewport::new(brazil.lat, brazil.lng, 1.0, 200, 100);
        let (x, y) = vp.project(brazil.lat, brazil.lng).expect("facing");
        assert_eq!(explorer.marker_at(&vp, x + 1, y - 1), Some(3));
        assert_eq!(explorer.marker_at(&vp, x + 40, y), None);
    }
}
