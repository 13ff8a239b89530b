//! Canonical Australian locations.
//!
//! Boards spell the same place a dozen ways ("Sydney NSW", "Greater Sydney",
//! "Sydney, Australia"). [`normalize_location`] folds them onto one name so
//! results group cleanly. It is idempotent.

/// Canonical city and the spellings that map onto it. Checked in order.
const CITY_VARIANTS: &[(&str, &[&str])] = &[
    (
        "sydney",
        &[
            "sydney",
            "sydney nsw",
            "nsw sydney",
            "sydney, nsw",
            "sydney australia",
            "greater sydney",
        ],
    ),
    (
        "melbourne",
        &[
            "melbourne",
            "melbourne vic",
            "vic melbourne",
            "melbourne, vic",
            "melbourne australia",
            "greater melbourne",
        ],
    ),
    (
        "brisbane",
        &[
            "brisbane",
            "brisbane qld",
            "qld brisbane",
            "brisbane, qld",
            "brisbane australia",
            "greater brisbane",
        ],
    ),
    ("perth", &["perth", "perth wa", "wa perth", "perth, wa", "perth australia", "greater perth"]),
    (
        "adelaide",
        &[
            "adelaide",
            "adelaide sa",
            "sa adelaide",
            "adelaide, sa",
            "adelaide australia",
            "greater adelaide",
        ],
    ),
    (
        "canberra",
        &[
            "canberra",
            "canberra act",
            "act canberra",
            "canberra, act",
            "canberra australia",
            "australian capital territory",
        ],
    ),
    ("hobart", &["hobart", "hobart tas", "tas hobart", "hobart, tas", "hobart australia"]),
    ("darwin", &["darwin", "darwin nt", "nt darwin", "darwin, nt", "darwin australia"]),
    ("gold coast", &["gold coast", "gold coast qld", "qld gold coast", "gold coast, qld"]),
    ("newcastle", &["newcastle", "newcastle nsw", "nsw newcastle", "newcastle, nsw"]),
    ("wollongong", &["wollongong", "wollongong nsw", "nsw wollongong", "wollongong, nsw"]),
];

const STATES: &[(&str, &str)] = &[
    ("nsw", "new south wales"),
    ("vic", "victoria"),
    ("qld", "queensland"),
    ("wa", "western australia"),
    ("sa", "south australia"),
    ("tas", "tasmania"),
    ("act", "australian capital territory"),
    ("nt", "northern territory"),
];

const DELIMITERS: &[char] = &[',', '|', ';', '/'];

/// Maps free-text location to a canonical name. Blank input gives `None`.
///
/// Order of checks: city table (substring either way), bare state
/// abbreviation or name, first normalizable part of a delimited list,
/// trailing state abbreviations stripped, and finally the input title-cased.
pub fn normalize_location(raw: &str) -> Option<String> {
    let loc = raw.trim().to_lowercase();
    if loc.is_empty() {
        return None;
    }

    for (city, variants) in CITY_VARIANTS {
        if variants
            .iter()
            .any(|variant| loc.contains(variant) || variant.contains(loc.as_str()))
        {
            return Some(title_case(city));
        }
    }

    for (abbr, name) in STATES {
        if loc == *abbr || loc == *name {
            return Some(title_case(name));
        }
    }

    if loc.contains(DELIMITERS) {
        if let Some(part) = loc.split(DELIMITERS).find_map(normalize_location) {
            return Some(part);
        }
    }

    if let Some(rest) = strip_state_suffix(&loc) {
        return normalize_location(&rest);
    }

    Some(title_case(&loc))
}

/// "parramatta nsw" -> "parramatta". `None` if nothing was stripped or
/// nothing would remain.
fn strip_state_suffix(loc: &str) -> Option<String> {
    let mut tokens: Vec<&str> = loc.split_whitespace().collect();
    let before = tokens.len();
    while tokens
        .last()
        .is_some_and(|last| STATES.iter().any(|(abbr, _)| abbr == last))
    {
        tokens.pop();
    }
    if tokens.len() == before || tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

/// Upper-cases the first letter of every word. Letters whose upper case is
/// not a single character that lowercases back are left alone.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() && !prev_alpha {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) if u.to_lowercase().eq(c.to_lowercase()) => out.push(u),
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
        prev_alpha = c.is_alphabetic();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_variants() {
        assert_eq!(normalize_location("Sydney, NSW").as_deref(), Some("Sydney"));
        assert_eq!(normalize_location("sydney nsw").as_deref(), Some("Sydney"));
        assert_eq!(normalize_location("Greater Melbourne").as_deref(), Some("Melbourne"));
        assert_eq!(normalize_location("  GOLD COAST, QLD ").as_deref(), Some("Gold Coast"));
        assert_eq!(normalize_location("Australian Capital Territory").as_deref(), Some("Canberra"));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(normalize_location("Victoria").as_deref(), Some("Victoria"));
        assert_eq!(normalize_location("queensland").as_deref(), Some("Queensland"));
        assert_eq!(normalize_location("Northern Territory").as_deref(), Some("Northern Territory"));
    }

    #[test]
    fn test_delimited_lists_take_first_part() {
        assert_eq!(normalize_location("Parramatta | Remote").as_deref(), Some("Parramatta"));
        assert_eq!(normalize_location(", Geelong; Ballarat").as_deref(), Some("Geelong"));
    }

    #[test]
    fn test_state_suffix_is_stripped() {
        assert_eq!(normalize_location("Parramatta NSW").as_deref(), Some("Parramatta"));
        assert_eq!(normalize_location("box hill vic").as_deref(), Some("Box Hill"));
        // only a trailing token counts, not any " wa" substring
        assert_eq!(normalize_location("Wagga Wagga").as_deref(), Some("Wagga Wagga"));
    }

    #[test]
    fn test_unknown_is_title_cased() {
        assert_eq!(normalize_location("remote").as_deref(), Some("Remote"));
        assert_eq!(normalize_location("st. kilda east").as_deref(), Some("St. Kilda East"));
    }

    #[test]
    fn test_blank_is_none() {
        assert_eq!(normalize_location(""), None);
        assert_eq!(normalize_location("   "), None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Sydney, NSW",
            "sydney nsw",
            "Melbourne VIC 3000",
            "Perth WA",
            "NSW",
            "act",
            "New South Wales",
            "South Australia",
            "Parramatta NSW",
            "Foo NT NT",
            "syd nsw",
            "Remote, Anywhere",
            "Brisbane | Sydney",
            "Wagga Wagga",
            "st. kilda",
            ",,,",
            "o'connor act",
            "Straße",
            "Regional Victoria / Tasmania",
            "Hybrid - Darwin",
        ];
        for sample in samples {
            let once = normalize_location(sample).unwrap();
            let twice = normalize_location(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }
}
