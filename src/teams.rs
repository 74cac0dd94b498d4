use once_cell::sync::Lazy;

/// NBA franchises and the names people use for them in questions:
/// `(abbreviation, full name, aliases)`.
///
/// City names shared by two franchises ("los angeles") and abbreviations that double as
/// English words ("was", "min") are not aliases.
pub static TEAM_DIRECTORY: &[(&str, &str, &[&str])] = &[
    ("ATL", "Atlanta Hawks", &["hawks", "atlanta", "atl"]),
    ("BOS", "Boston Celtics", &["celtics", "celts", "boston", "bos"]),
    ("BKN", "Brooklyn Nets", &["nets", "brooklyn", "bkn"]),
    ("CHA", "Charlotte Hornets", &["hornets", "charlotte", "cha"]),
    ("CHI", "Chicago Bulls", &["bulls", "chicago", "chi"]),
    ("CLE", "Cleveland Cavaliers", &["cavaliers", "cavs", "cleveland", "cle"]),
    ("DAL", "Dallas Mavericks", &["mavericks", "mavs", "dallas", "dal"]),
    ("DEN", "Denver Nuggets", &["nuggets", "denver", "den"]),
    ("DET", "Detroit Pistons", &["pistons", "detroit", "det"]),
    ("GSW", "Golden State Warriors", &["warriors", "dubs", "golden state", "gsw"]),
    ("HOU", "Houston Rockets", &["rockets", "houston", "hou"]),
    ("IND", "Indiana Pacers", &["pacers", "indiana", "ind"]),
    ("LAC", "LA Clippers", &["clippers", "clips", "lac"]),
    ("LAL", "Los Angeles Lakers", &["lakers", "lal"]),
    ("MEM", "Memphis Grizzlies", &["grizzlies", "grizz", "memphis", "mem"]),
    ("MIA", "Miami Heat", &["heat", "miami", "mia"]),
    ("MIL", "Milwaukee Bucks", &["bucks", "milwaukee", "mil"]),
    ("MIN", "Minnesota Timberwolves", &["timberwolves", "wolves", "minnesota"]),
    ("NOP", "New Orleans Pelicans", &["pelicans", "pels", "new orleans", "nop"]),
    ("NYK", "New York Knicks", &["knicks", "new york", "nyk"]),
    ("OKC", "Oklahoma City Thunder", &["thunder", "oklahoma city", "okc"]),
    ("ORL", "Orlando Magic", &["magic", "orlando", "orl"]),
    ("PHI", "Philadelphia 76ers", &["76ers", "sixers", "philadelphia", "philly", "phi"]),
    ("PHX", "Phoenix Suns", &["suns", "phoenix", "phx"]),
    ("POR", "Portland Trail Blazers", &["trail blazers", "blazers", "portland", "por"]),
    ("SAC", "Sacramento Kings", &["kings", "sacramento", "sac"]),
    ("SAS", "San Antonio Spurs", &["spurs", "san antonio", "sas"]),
    ("TOR", "Toronto Raptors", &["raptors", "toronto", "tor"]),
    ("UTA", "Utah Jazz", &["jazz", "utah", "uta"]),
    ("WAS", "Washington Wizards", &["wizards", "washington"]),
];

/// Alias phrases split into tokens, longest phrase first.
pub static TEAM_PHRASES: Lazy<Vec<(Vec<&'static str>, &'static str)>> = Lazy::new(|| {
    let mut out: Vec<(Vec<&'static str>, &'static str)> = TEAM_DIRECTORY
        .iter()
        .flat_map(|(abbreviation, _, aliases)| {
            aliases
                .iter()
                .map(move |alias| (alias.split(' ').collect::<Vec<_>>(), *abbreviation))
        })
        .collect();
    out.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    out
});

pub fn full_name(abbreviation: &str) -> Option<&'static str> {
    TEAM_DIRECTORY
        .iter()
        .find(|(abbr, _, _)| abbr.eq_ignore_ascii_case(abbreviation))
        .map(|(_, name, _)| *name)
}
