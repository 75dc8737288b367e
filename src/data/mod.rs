pub mod locations;
pub mod stars;

use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// A geographic polyline as (lng, lat) pairs, GeoJSON axis order.
pub type LineString = Vec<(f64, f64)>;

/// Coastline files tried in order; the first that loads wins.
const COASTLINE_FILES: [&str; 3] = [
    "ne_110m_coastline.json",
    "ne_50m_coastline.json",
    "natural-earth.json",
];

/// Land outlines drawn under the globe overlays.
#[derive(Default)]
pub struct Coastlines {
    pub lines: Vec<LineString>,
    /// Where the outlines came from, for the status bar
    pub source: String,
}

impl Coastlines {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Load the first available coastline file from `data_dir`, falling back to
/// the built-in outline. Never fails: bad files are logged and skipped.
pub fn load_coastlines(data_dir: &Path) -> Coastlines {
    for filename in COASTLINE_FILES {
        let path = data_dir.join(filename);
        if !path.exists() {
            continue;
        }
        match read_geojson_lines(&path) {
            Ok(lines) if !lines.is_empty() => {
                debug!(file = filename, count = lines.len(), "loaded coastlines");
                return Coastlines { lines, source: filename.to_string() };
            }
            Ok(_) => warn!(file = filename, "coastline file has no line geometry"),
            Err(e) => warn!(file = filename, error = %e, "failed to load coastlines"),
        }
    }

    builtin_world()
}

fn read_geojson_lines(path: &Path) -> Result<Vec<LineString>> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content.parse()?;
    let mut lines = Vec::new();
    collect_lines(&geojson, &mut |line| lines.push(line));
    Ok(lines)
}

/// Walk any GeoJSON document and emit every line-like ring
fn collect_lines(geojson: &GeoJson, emit: &mut impl FnMut(LineString)) {
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                geometry_lines(geometry, emit);
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                geometry_lines(geometry, emit);
            }
        }
        GeoJson::Geometry(geometry) => geometry_lines(geometry, emit),
    }
}

fn geometry_lines(geometry: &Geometry, emit: &mut impl FnMut(LineString)) {
    let to_line = |coords: &Vec<Vec<f64>>| -> LineString {
        coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
    };

    match &geometry.value {
        Value::LineString(coords) => emit(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|l| emit(to_line(l))),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                emit(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for exterior in polygons.iter().filter_map(|rings| rings.first()) {
                emit(to_line(exterior));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                geometry_lines(g, emit);
            }
        }
        _ => {}
    }
}

/// Very coarse continent outlines so the globe is recognisable without data files.
pub fn builtin_world() -> Coastlines {
    let outlines: [&[(f64, f64)]; 7] = [
        // North America
        &[
            (-165.0, 64.0), (-150.0, 59.0), (-136.0, 58.0), (-124.0, 47.0),
            (-118.0, 33.0), (-106.0, 22.0), (-97.0, 26.0), (-84.0, 29.0),
            (-81.0, 25.0), (-76.0, 36.0), (-70.0, 42.0), (-60.0, 46.0),
            (-56.0, 52.0), (-64.0, 59.0), (-80.0, 62.0), (-100.0, 67.0),
            (-128.0, 70.0), (-156.0, 71.0), (-165.0, 64.0),
        ],
        // South America
        &[
            (-78.0, 8.0), (-62.0, 10.0), (-50.0, 0.0), (-35.0, -6.0),
            (-40.0, -22.0), (-53.0, -34.0), (-65.0, -45.0), (-70.0, -54.0),
            (-74.0, -46.0), (-71.0, -28.0), (-76.0, -14.0), (-81.0, -4.0),
            (-78.0, 8.0),
        ],
        // Europe
        &[
            (-9.0, 37.0), (3.0, 43.0), (12.0, 44.0), (18.0, 40.0),
            (26.0, 38.0), (29.0, 45.0), (40.0, 47.0), (40.0, 60.0),
            (30.0, 70.0), (15.0, 69.0), (5.0, 60.0), (8.0, 54.0),
            (-2.0, 48.0), (-9.0, 43.0), (-9.0, 37.0),
        ],
        // Africa
        &[
            (-17.0, 21.0), (-6.0, 35.0), (11.0, 37.0), (32.0, 31.0),
            (43.0, 12.0), (51.0, 11.0), (40.0, -5.0), (35.0, -24.0),
            (20.0, -35.0), (12.0, -17.0), (9.0, 4.0), (-8.0, 4.0),
            (-17.0, 14.0), (-17.0, 21.0),
        ],
        // Asia
        &[
            (40.0, 47.0), (52.0, 37.0), (57.0, 25.0), (67.0, 24.0),
            (77.0, 8.0), (88.0, 22.0), (98.0, 16.0), (104.0, 9.0),
            (109.0, 21.0), (121.0, 30.0), (122.0, 40.0), (131.0, 43.0),
            (141.0, 53.0), (160.0, 60.0), (180.0, 68.0), (130.0, 73.0),
            (90.0, 76.0), (60.0, 70.0), (40.0, 60.0), (40.0, 47.0),
        ],
        // Australia
        &[
            (114.0, -22.0), (129.0, -14.0), (136.0, -12.0), (142.0, -11.0),
            (153.0, -26.0), (150.0, -37.0), (141.0, -38.0), (131.0, -31.0),
            (115.0, -34.0), (114.0, -22.0),
        ],
        // Japan
        &[(130.0, 31.0), (135.0, 34.0), (140.0, 36.0), (142.0, 40.0), (141.0, 45.0)],
    ];

    Coastlines {
        lines: outlines.iter().map(|o| o.to_vec()).collect(),
        source: "built-in".to_string(),
    }
}
