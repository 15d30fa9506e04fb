//! Canonical NBA team name resolution.
//!
//! Every feed historically carried its own alias table, and disagreements
//! between them were a recurring source of silent lookup misses. This module
//! is the single authority: all components resolve names through it.

use std::fmt;

/// Static record for one of the 30 NBA teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team {
    pub id: u32,
    pub full_name: &'static str,
    pub nickname: &'static str,
    pub abbreviation: &'static str,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.full_name, self.abbreviation)
    }
}

pub const TEAM_COUNT: usize = 30;

/// The fixed 30-team enumeration. IDs follow the league's stats API.
pub const TEAMS: [Team; TEAM_COUNT] = [
    Team { id: 1610612737, full_name: "Atlanta Hawks", nickname: "Hawks", abbreviation: "ATL" },
    Team { id: 1610612738, full_name: "Boston Celtics", nickname: "Celtics", abbreviation: "BOS" },
    Team { id: 1610612739, full_name: "Cleveland Cavaliers", nickname: "Cavaliers", abbreviation: "CLE" },
    Team { id: 1610612740, full_name: "New Orleans Pelicans", nickname: "Pelicans", abbreviation: "NOP" },
    Team { id: 1610612741, full_name: "Chicago Bulls", nickname: "Bulls", abbreviation: "CHI" },
    Team { id: 1610612742, full_name: "Dallas Mavericks", nickname: "Mavericks", abbreviation: "DAL" },
    Team { id: 1610612743, full_name: "Denver Nuggets", nickname: "Nuggets", abbreviation: "DEN" },
    Team { id: 1610612744, full_name: "Golden State Warriors", nickname: "Warriors", abbreviation: "GSW" },
    Team { id: 1610612745, full_name: "Houston Rockets", nickname: "Rockets", abbreviation: "HOU" },
    Team { id: 1610612746, full_name: "Los Angeles Clippers", nickname: "Clippers", abbreviation: "LAC" },
    Team { id: 1610612747, full_name: "Los Angeles Lakers", nickname: "Lakers", abbreviation: "LAL" },
    Team { id: 1610612748, full_name: "Miami Heat", nickname: "Heat", abbreviation: "MIA" },
    Team { id: 1610612749, full_name: "Milwaukee Bucks", nickname: "Bucks", abbreviation: "MIL" },
    Team { id: 1610612750, full_name: "Minnesota Timberwolves", nickname: "Timberwolves", abbreviation: "MIN" },
    Team { id: 1610612751, full_name: "Brooklyn Nets", nickname: "Nets", abbreviation: "BKN" },
    Team { id: 1610612752, full_name: "New York Knicks", nickname: "Knicks", abbreviation: "NYK" },
    Team { id: 1610612753, full_name: "Orlando Magic", nickname: "Magic", abbreviation: "ORL" },
    Team { id: 1610612754, full_name: "Indiana Pacers", nickname: "Pacers", abbreviation: "IND" },
    Team { id: 1610612755, full_name: "Philadelphia 76ers", nickname: "76ers", abbreviation: "PHI" },
    Team { id: 1610612756, full_name: "Phoenix Suns", nickname: "Suns", abbreviation: "PHX" },
    Team { id: 1610612757, full_name: "Portland Trail Blazers", nickname: "Trail Blazers", abbreviation: "POR" },
    Team { id: 1610612758, full_name: "Sacramento Kings", nickname: "Kings", abbreviation: "SAC" },
    Team { id: 1610612759, full_name: "San Antonio Spurs", nickname: "Spurs", abbreviation: "SAS" },
    Team { id: 1610612760, full_name: "Oklahoma City Thunder", nickname: "Thunder", abbreviation: "OKC" },
    Team { id: 1610612761, full_name: "Toronto Raptors", nickname: "Raptors", abbreviation: "TOR" },
    Team { id: 1610612762, full_name: "Utah Jazz", nickname: "Jazz", abbreviation: "UTA" },
    Team { id: 1610612763, full_name: "Memphis Grizzlies", nickname: "Grizzlies", abbreviation: "MEM" },
    Team { id: 1610612764, full_name: "Washington Wizards", nickname: "Wizards", abbreviation: "WAS" },
    Team { id: 1610612765, full_name: "Detroit Pistons", nickname: "Pistons", abbreviation: "DET" },
    Team { id: 1610612766, full_name: "Charlotte Hornets", nickname: "Hornets", abbreviation: "CHA" },
];

/// Full-name spellings some sources use that differ from the canonical set.
const FULL_NAME_ALIASES: &[(&str, &str)] = &[
    ("LA Clippers", "Los Angeles Clippers"),
    ("Philly 76ers", "Philadelphia 76ers"),
    ("Portland Trailblazers", "Portland Trail Blazers"),
];

/// Nickname shorthands that don't match a canonical nickname exactly.
const NICKNAME_ALIASES: &[(&str, &str)] = &[
    ("Blazers", "Trail Blazers"),
    ("Sixers", "76ers"),
    ("Wolves", "Timberwolves"),
];

/// Look up a team by its stats-API id.
pub fn by_id(id: u32) -> Option<&'static Team> {
    TEAMS.iter().find(|t| t.id == id)
}

/// Look up a team by exact canonical full name.
pub fn by_full_name(name: &str) -> Option<&'static Team> {
    TEAMS.iter().find(|t| t.full_name == name)
}

/// Whether a name is already in canonical form.
pub fn is_canonical(name: &str) -> bool {
    by_full_name(name).is_some()
}

/// Normalize a full name that may use an alternate spelling
/// (e.g. "LA Clippers"). Unknown names are returned unchanged so callers
/// can report them rather than lose them.
pub fn canonicalize(name: &str) -> String {
    let name = name.trim();
    if is_canonical(name) {
        return name.to_string();
    }
    for (alias, canonical) in FULL_NAME_ALIASES {
        if alias.eq_ignore_ascii_case(name) {
            return canonical.to_string();
        }
    }
    name.to_string()
}

/// Fuzzy finder: accepts full name, alternate spelling, nickname,
/// abbreviation, or nickname alias. Case-insensitive.
pub fn resolve(name: &str) -> Option<&'static Team> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let canonical = canonicalize(name);
    if let Some(t) = TEAMS.iter().find(|t| t.full_name.eq_ignore_ascii_case(&canonical)) {
        return Some(t);
    }
    if let Some(t) = TEAMS.iter().find(|t| t.nickname.eq_ignore_ascii_case(name)) {
        return Some(t);
    }
    if let Some(t) = TEAMS.iter().find(|t| t.abbreviation.eq_ignore_ascii_case(name)) {
        return Some(t);
    }
    for (alias, nickname) in NICKNAME_ALIASES {
        if alias.eq_ignore_ascii_case(name) {
            return TEAMS.iter().find(|t| t.nickname == *nickname);
        }
    }
    None
}

/// The canonical full-name set, for cardinality and membership checks.
pub fn canonical_names() -> Vec<&'static str> {
    TEAMS.iter().map(|t| t.full_name).collect()
}

/// Internal consistency: 30 unique ids, full names, and abbreviations.
/// Exposed so the pipeline audit section can verify the table itself.
pub fn table_is_consistent() -> bool {
    use std::collections::HashSet;
    let ids: HashSet<_> = TEAMS.iter().map(|t| t.id).collect();
    let names: HashSet<_> = TEAMS.iter().map(|t| t.full_name).collect();
    let abbrevs: HashSet<_> = TEAMS.iter().map(|t| t.abbreviation).collect();
    ids.len() == TEAM_COUNT && names.len() == TEAM_COUNT && abbrevs.len() == TEAM_COUNT
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
