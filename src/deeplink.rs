//! `#loc=<name>` links that open straight onto a location.

use crate::data::locations::{find_by_name, Location};

/// Outcome of resolving a link against the registry.
#[derive(Debug, PartialEq)]
pub enum LinkTarget<'a> {
    Found(usize, &'a Location),
    /// The link named something the registry does not have
    Unknown(String),
    /// No `loc=` parameter at all
    Absent,
}

/// Pull the decoded location name out of `#loc=...` (or bare `loc=...`).
/// Other `&`-separated parameters are ignored.
pub fn parse_fragment(link: &str) -> Option<String> {
    let fragment = link.rsplit_once('#').map_or(link, |(_, f)| f);
    fragment
        .split('&')
        .find_map(|pair| pair.strip_prefix("loc="))
        .map(percent_decode)
        .filter(|name| !name.trim().is_empty())
}

pub fn resolve<'a>(link: &str, locations: &'a [Location]) -> LinkTarget<'a> {
    match parse_fragment(link) {
        None => LinkTarget::Absent,
        Some(name) => match find_by_name(locations, &name) {
            Some((index, loc)) => LinkTarget::Found(index, loc),
            None => LinkTarget::Unknown(name),
        },
    }
}

/// Percent-decode, treating `+` as a space. Malformed escapes pass through.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                match (hex_value(bytes.get(i + 1)), hex_value(bytes.get(i + 2))) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                        continue;
                    }
                    _ => out.push(b'%'),
                }
            }
            b'+' => out.push(b' '),
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: Option<&u8>) -> Option<u8> {
    let c = *byte?;
    (c as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::locations::registry;

    #[test]
    fn test_parse_hash_and_bare() {
        assert_eq!(parse_fragment("#loc=Tokyo%2C%20Japan").as_deref(), Some("Tokyo, Japan"));
        assert_eq!(parse_fragment("loc=Cairo,+Egypt").as_deref(), Some("Cairo, Egypt"));
        assert_eq!(
            parse_fragment("https://example.org/#view=1&loc=London%2C%20UK").as_deref(),
            Some("London, UK")
        );
        assert_eq!(parse_fragment("#view=1"), None);
        assert_eq!(parse_fragment("#loc="), None);
    }

    #[test]
    fn test_utf8_and_malformed_escapes() {
        assert_eq!(
            parse_fragment("#loc=Bras%C3%ADlia%2C%20Brazil").as_deref(),
            Some("Brasília, Brazil")
        );
        assert_eq!(parse_fragment("#loc=100%25").as_deref(), Some("100%"));
        assert_eq!(parse_fragment("#loc=50%").as_deref(), Some("50%"));
        assert_eq!(parse_fragment("#loc=%zz").as_deref(), Some("%zz"));
    }

    #[test]
    fn test_resolve_case_insensitive() {
        match resolve("#loc=tokyo%2C%20japan", registry()) {
            LinkTarget::Found(index, loc) => {
                assert_eq!(index, 5);
                assert_eq!(loc.name, "Tokyo, Japan");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            resolve("#loc=Atlantis", registry()),
            LinkTarget::Unknown("Atlantis".to_string())
        );
        assert_eq!(resolve("", registry()), LinkTarget::Absent);
    }
}
