use ratatui::style::Color;

/// A named point of interest on the globe.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: u32,
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub timezone: &'static str,
    pub region: &'static str,
    pub description: &'static str,
}

impl Location {
    /// Country part of the name ("Tokyo, Japan" -> "Japan").
    pub fn country(&self) -> &'static str {
        self.name.rsplit(", ").next().unwrap_or(self.name)
    }
}

/// Directed decorative connection between two registry entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    /// Index of the start location in the registry
    pub start: usize,
    /// Index of the end location in the registry
    pub end: usize,
    pub start_lat: f64,
    pub start_lng: f64,
    pub end_lat: f64,
    pub end_lng: f64,
    pub color: Color,
}

/// Arc/point palette, in assignment order.
pub const COLORS: [Color; 10] = [
    Color::Rgb(0xff, 0x45, 0x00), // orange red
    Color::Rgb(0x00, 0xff, 0x88), // spring green
    Color::Rgb(0x00, 0x88, 0xff), // deep sky blue
    Color::Rgb(0xff, 0x00, 0x88), // deep pink
    Color::Rgb(0x88, 0xff, 0x00), // chartreuse
    Color::Rgb(0x88, 0x00, 0xff), // blue violet
    Color::Rgb(0xff, 0xff, 0x00), // yellow
    Color::Rgb(0xff, 0x88, 0x00), // dark orange
    Color::Rgb(0x00, 0xff, 0xff), // cyan
    Color::Rgb(0xff, 0x00, 0x00), // red
];

pub static LOCATIONS: [Location; 15] = [
    Location {
        id: 1,
        name: "Washington, D.C., USA",
        lat: 38.9072,
        lng: -77.0369,
        timezone: "UTC-5",
        region: "North America",
        description: "Capital of the United States, a hub for politics and global diplomacy.",
    },
    Location {
        id: 2,
        name: "Ottawa, Canada",
        lat: 45.4215,
        lng: -75.6972,
        timezone: "UTC-5",
        region: "North America",
        description: "Canada's capital, known for tech growth and government institutions.",
    },
    Location {
        id: 3,
        name: "London, UK",
        lat: 51.5074,
        lng: -0.1278,
        timezone: "UTC+0",
        region: "Europe",
        description: "Financial technology capital, leading in blockchain and digital banking.",
    },
    Location {
        id: 4,
        name: "Berlin, Germany",
        lat: 52.52,
        lng: 13.405,
        timezone: "UTC+1",
        region: "Europe",
        description: "European startup capital, strong in AI, mobility, and clean technology.",
    },
    Location {
        id: 5,
        name: "Paris, France",
        lat: 48.8566,
        lng: 2.3522,
        timezone: "UTC+1",
        region: "Europe",
        description: "Cultural and technological hub, leading in fashion-tech and green innovation.",
    },
    Location {
        id: 6,
        name: "Tokyo, Japan",
        lat: 35.6762,
        lng: 139.6503,
        timezone: "UTC+9",
        region: "Asia",
        description: "Global technology leader, pioneering robotics and advanced manufacturing.",
    },
    Location {
        id: 7,
        name: "Beijing, China",
        lat: 39.9042,
        lng: 116.4074,
        timezone: "UTC+8",
        region: "Asia",
        description: "China's capital, a powerhouse of tech, finance, and global trade.",
    },
    Location {
        id: 8,
        name: "Chittagong, Bangladesh",
        lat: 22.3569,
        lng: 91.7832,
        timezone: "UTC+6",
        region: "South Asia",
        description: "Major port city and commercial hub, gateway to South Asian markets.",
    },
    Location {
        id: 9,
        name: "Moscow, Russia",
        lat: 55.7558,
        lng: 37.6173,
        timezone: "UTC+3",
        region: "Europe/Asia",
        description: "Russia's capital, rich in science, aerospace, and energy industries.",
    },
    Location {
        id: 10,
        name: "Canberra, Australia",
        lat: -35.2809,
        lng: 149.13,
        timezone: "UTC+10",
        region: "Oceania",
        description: "Australia's capital, with a growing defense, space, and tech ecosystem.",
    },
    Location {
        id: 11,
        name: "Wellington, New Zealand",
        lat: -41.2865,
        lng: 174.7762,
        timezone: "UTC+12",
        region: "Oceania",
        description: "New Zealand's capital, strong in film-tech, innovation, and sustainability.",
    },
    Location {
        id: 12,
        name: "Brasília, Brazil",
        lat: -15.8267,
        lng: -47.9218,
        timezone: "UTC-3",
        region: "South America",
        description: "Brazil's planned capital, growing in government tech and fintech sectors.",
    },
    Location {
        id: 13,
        name: "Buenos Aires, Argentina",
        lat: -34.6037,
        lng: -58.3816,
        timezone: "UTC-3",
        region: "South America",
        description: "Argentina's capital, vibrant startup culture and creative industries.",
    },
    Location {
        id: 14,
        name: "Cairo, Egypt",
        lat: 30.0444,
        lng: 31.2357,
        timezone: "UTC+2",
        region: "Africa",
        description: "Africa's largest city, a major hub for finance, culture, and innovation.",
    },
    Location {
        id: 15,
        name: "Nairobi, Kenya",
        lat: -1.2921,
        lng: 36.8219,
        timezone: "UTC+3",
        region: "Africa",
        description: "East Africa's tech capital, home to growing innovation and fintech hubs.",
    },
];

/// The static location table, in display order.
pub fn registry() -> &'static [Location] {
    &LOCATIONS
}

/// Every location name, in registry order (palette input).
pub fn names(locations: &[Location]) -> Vec<&'static str> {
    locations.iter().map(|l| l.name).collect()
}

/// Case-insensitive exact name lookup.
pub fn find_by_name<'a>(locations: &'a [Location], name: &str) -> Option<(usize, &'a Location)> {
    let wanted = name.trim().to_lowercase();
    locations
        .iter()
        .enumerate()
        .find(|(_, l)| l.name.to_lowercase() == wanted)
}

/// Complete directed graph over the locations: n·(n-1) arcs, colours
/// assigned round-robin in generation order.
pub fn generate_arcs(locations: &[Location]) -> Vec<Arc> {
    let n = locations.len();
    let mut arcs = Vec::with_capacity(n * n.saturating_sub(1));

    for (i, start) in locations.iter().enumerate() {
        for (j, end) in locations.iter().enumerate() {
            if i == j {
                continue;
            }
            let color = COLORS[arcs.len() % COLORS.len()];
            arcs.push(Arc {
                start: i,
                end: j,
                start_lat: start.lat,
                start_lng: start.lng,
                end_lat: end.lat,
                end_lng: end.lng,
                color,
            });
        }
    }

    arcs
}
