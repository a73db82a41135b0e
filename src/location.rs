use regex::Regex;
use std::sync::OnceLock;

/// US state and territory codes with their full names.
const STATES: &[(&str, &str)] = &[
    ("AL", "alabama"),
    ("AK", "alaska"),
    ("AZ", "arizona"),
    ("AR", "arkansas"),
    ("CA", "california"),
    ("CO", "colorado"),
    ("CT", "connecticut"),
    ("DE", "delaware"),
    ("DC", "district of columbia"),
    ("FL", "florida"),
    ("GA", "georgia"),
    ("HI", "hawaii"),
    ("ID", "idaho"),
    ("IL", "illinois"),
    ("IN", "indiana"),
    ("IA", "iowa"),
    ("KS", "kansas"),
    ("KY", "kentucky"),
    ("LA", "louisiana"),
    ("ME", "maine"),
    ("MD", "maryland"),
    ("MA", "massachusetts"),
    ("MI", "michigan"),
    ("MN", "minnesota"),
    ("MS", "mississippi"),
    ("MO", "missouri"),
    ("MT", "montana"),
    ("NE", "nebraska"),
    ("NV", "nevada"),
    ("NH", "new hampshire"),
    ("NJ", "new jersey"),
    ("NM", "new mexico"),
    ("NY", "new york"),
    ("NC", "north carolina"),
    ("ND", "north dakota"),
    ("OH", "ohio"),
    ("OK", "oklahoma"),
    ("OR", "oregon"),
    ("PA", "pennsylvania"),
    ("RI", "rhode island"),
    ("SC", "south carolina"),
    ("SD", "south dakota"),
    ("TN", "tennessee"),
    ("TX", "texas"),
    ("UT", "utah"),
    ("VT", "vermont"),
    ("VA", "virginia"),
    ("WA", "washington"),
    ("WV", "west virginia"),
    ("WI", "wisconsin"),
    ("WY", "wyoming"),
    ("AS", "american samoa"),
    ("GU", "guam"),
    ("MP", "northern mariana islands"),
    ("PR", "puerto rico"),
    ("VI", "virgin islands"),
];

/// Canonical two-letter code for a code or full state name, case-insensitive.
pub fn state_code(token: &str) -> Option<&'static str> {
    let token = token.trim();
    if token.len() == 2 {
        let upper = token.to_ascii_uppercase();
        if let Some((code, _)) = STATES.iter().find(|(code, _)| *code == upper) {
            return Some(code);
        }
    }
    let lower = token.to_lowercase();
    STATES
        .iter()
        .find(|(_, name)| *name == lower)
        .map(|(code, _)| *code)
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

/// Split a free-text location into `(city, state_code)`. The first token is
/// the city; the first later token naming a state becomes the state.
pub fn parse_city_state(location: &str) -> (String, String) {
    let normalized = whitespace_re().replace_all(location.trim(), " ");
    if normalized.is_empty() {
        return (String::new(), String::new());
    }

    let tokens: Vec<&str> = normalized
        .split([',', '-', '/', ';', '|'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let Some((first, rest)) = tokens.split_first() else {
        return (normalized.into_owned(), String::new());
    };

    let state = rest
        .iter()
        .find_map(|t| state_code(t))
        .unwrap_or_default()
        .to_string();
    (first.to_string(), state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> (String, String) {
        parse_city_state(s)
    }

    #[test]
    fn city_and_code() {
        assert_eq!(parse("Phoenix, AZ"), ("Phoenix".into(), "AZ".into()));
    }

    #[test]
    fn city_and_full_name() {
        assert_eq!(parse("Denver, Colorado"), ("Denver".into(), "CO".into()));
        assert_eq!(parse("Santa Fe / new   MEXICO"), ("Santa Fe".into(), "NM".into()));
    }

    #[test]
    fn empty_and_single_word() {
        assert_eq!(parse(""), (String::new(), String::new()));
        assert_eq!(parse("   "), (String::new(), String::new()));
        assert_eq!(parse("Remote"), ("Remote".into(), String::new()));
    }

    #[test]
    fn lowercase_code_is_canonicalized() {
        assert_eq!(parse("tucson; az"), ("tucson".into(), "AZ".into()));
    }

    #[test]
    fn first_matching_token_wins() {
        assert_eq!(
            parse("Portland | Hybrid | OR | WA"),
            ("Portland".into(), "OR".into())
        );
    }

    #[test]
    fn unknown_state_is_empty() {
        assert_eq!(parse("Toronto, ON"), ("Toronto".into(), String::new()));
    }

    #[test]
    fn only_delimiters_keeps_whole_string() {
        assert_eq!(parse(" , - "), (", -".into(), String::new()));
    }
}
