//! Team logo lookup for ESPN+ events.

use std::sync::LazyLock;

use regex::Regex;

const LOGO_BASE: &str = "https://a.espncdn.com/i/teamlogos";

const NHL_TEAMS: &[(&str, &str)] = &[
    ("anaheim ducks", "ana"), ("arizona coyotes", "ari"), ("boston bruins", "bos"),
    ("buffalo sabres", "buf"), ("calgary flames", "cgy"), ("carolina hurricanes", "car"),
    ("chicago blackhawks", "chi"), ("colorado avalanche", "col"), ("columbus blue jackets", "cbj"),
    ("dallas stars", "dal"), ("detroit red wings", "det"), ("edmonton oilers", "edm"),
    ("florida panthers", "fla"), ("los angeles kings", "la"), ("minnesota wild", "min"),
    ("montreal canadiens", "mtl"), ("nashville predators", "nsh"), ("new jersey devils", "njd"),
    ("new york islanders", "nyi"), ("new york rangers", "nyr"), ("ottawa senators", "ott"),
    ("philadelphia flyers", "phi"), ("pittsburgh penguins", "pit"), ("san jose sharks", "sj"),
    ("seattle kraken", "sea"), ("st. louis blues", "stl"), ("tampa bay lightning", "tb"),
    ("toronto maple leafs", "tor"), ("utah hockey club", "uta"), ("vancouver canucks", "van"),
    ("vegas golden knights", "vgk"), ("washington capitals", "wsh"), ("winnipeg jets", "wpg"),
];

const NBA_TEAMS: &[(&str, &str)] = &[
    ("atlanta hawks", "atl"), ("boston celtics", "bos"), ("brooklyn nets", "bkn"),
    ("charlotte hornets", "cha"), ("chicago bulls", "chi"), ("cleveland cavaliers", "cle"),
    ("dallas mavericks", "dal"), ("denver nuggets", "den"), ("detroit pistons", "det"),
    ("golden state warriors", "gs"), ("houston rockets", "hou"), ("indiana pacers", "ind"),
    ("los angeles clippers", "lac"), ("los angeles lakers", "lal"), ("la clippers", "lac"),
    ("la lakers", "lal"), ("memphis grizzlies", "mem"), ("miami heat", "mia"),
    ("milwaukee bucks", "mil"), ("minnesota timberwolves", "min"), ("new orleans pelicans", "no"),
    ("new york knicks", "ny"), ("oklahoma city thunder", "okc"), ("orlando magic", "orl"),
    ("philadelphia 76ers", "phi"), ("phoenix suns", "phx"), ("portland trail blazers", "por"),
    ("sacramento kings", "sac"), ("san antonio spurs", "sa"), ("toronto raptors", "tor"),
    ("utah jazz", "uta"), ("washington wizards", "wsh"),
];

const NFL_TEAMS: &[(&str, &str)] = &[
    ("arizona cardinals", "ari"), ("atlanta falcons", "atl"), ("baltimore ravens", "bal"),
    ("buffalo bills", "buf"), ("carolina panthers", "car"), ("chicago bears", "chi"),
    ("cincinnati bengals", "cin"), ("cleveland browns", "cle"), ("dallas cowboys", "dal"),
    ("denver broncos", "den"), ("detroit lions", "det"), ("green bay packers", "gb"),
    ("houston texans", "hou"), ("indianapolis colts", "ind"), ("jacksonville jaguars", "jax"),
    ("kansas city chiefs", "kc"), ("las vegas raiders", "lv"), ("los angeles chargers", "lac"),
    ("los angeles rams", "lar"), ("miami dolphins", "mia"), ("minnesota vikings", "min"),
    ("new england patriots", "ne"), ("new orleans saints", "no"), ("new york giants", "nyg"),
    ("new york jets", "nyj"), ("philadelphia eagles", "phi"), ("pittsburgh steelers", "pit"),
    ("san francisco 49ers", "sf"), ("seattle seahawks", "sea"), ("tampa bay buccaneers", "tb"),
    ("tennessee titans", "ten"), ("washington commanders", "wsh"),
];

const MLB_TEAMS: &[(&str, &str)] = &[
    ("arizona diamondbacks", "ari"), ("atlanta braves", "atl"), ("baltimore orioles", "bal"),
    ("boston red sox", "bos"), ("chicago cubs", "chc"), ("chicago white sox", "chw"),
    ("cincinnati reds", "cin"), ("cleveland guardians", "cle"), ("colorado rockies", "col"),
    ("detroit tigers", "det"), ("houston astros", "hou"), ("kansas city royals", "kc"),
    ("los angeles angels", "laa"), ("los angeles dodgers", "lad"), ("miami marlins", "mia"),
    ("milwaukee brewers", "mil"), ("minnesota twins", "min"), ("new york mets", "nym"),
    ("new york yankees", "nyy"), ("oakland athletics", "oak"), ("philadelphia phillies", "phi"),
    ("pittsburgh pirates", "pit"), ("san diego padres", "sd"), ("san francisco giants", "sf"),
    ("seattle mariners", "sea"), ("st. louis cardinals", "stl"), ("tampa bay rays", "tb"),
    ("texas rangers", "tex"), ("toronto blue jays", "tor"), ("washington nationals", "wsh"),
];

const MLS_TEAMS: &[(&str, &str)] = &[
    ("atlanta united", "atl"), ("austin fc", "atx"), ("cf montreal", "mtl"),
    ("charlotte fc", "clt"), ("chicago fire", "chi"), ("colorado rapids", "col"),
    ("columbus crew", "clb"), ("dc united", "dc"), ("fc cincinnati", "cin"), ("fc dallas", "dal"),
    ("houston dynamo", "hou"), ("inter miami", "mia"), ("la galaxy", "la"), ("lafc", "lafc"),
    ("minnesota united", "min"), ("nashville sc", "nsh"), ("new england revolution", "ne"),
    ("new york city fc", "nyc"), ("new york red bulls", "nyrb"), ("orlando city", "orl"),
    ("philadelphia union", "phi"), ("portland timbers", "por"), ("real salt lake", "rsl"),
    ("san jose earthquakes", "sj"), ("seattle sounders", "sea"), ("sporting kansas city", "skc"),
    ("st. louis city sc", "stl"), ("toronto fc", "tor"), ("vancouver whitecaps", "van"),
];

/// League tables with their CDN path segment and the keywords that hint at them.
const LEAGUES: &[(&[(&str, &str)], &str, &[&str])] = &[
    (NHL_TEAMS, "nhl", &["nhl", "hockey"]),
    (NBA_TEAMS, "nba", &["nba", "basketball"]),
    (NFL_TEAMS, "nfl", &["nfl", "football"]),
    (MLB_TEAMS, "mlb", &["mlb", "baseball"]),
    (MLS_TEAMS, "soccer", &["mls", "soccer"]),
];

const TEAM_SUFFIXES: &[&str] = &[" (home)", " (away)", " broadcast", " (national broadcast)"];

static BROADCAST_NOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*\([^)]*broadcast[^)]*\)").expect("static broadcast regex")
});

static MATCHUP_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?i)^(.+?)\s+vs\.?\s+(.+?)$", r"(?i)^(.+?)\s+@\s+(.+?)$", r"(?i)^(.+?)\s+at\s+(.+?)$"]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("static matchup regex"))
        .collect()
});

fn lookup(table: &[(&'static str, &'static str)], team: &str) -> Option<&'static str> {
    table.iter().find(|(name, _)| *name == team).map(|(_, abbr)| *abbr)
}

/// ESPN CDN logo for a team name, preferring the league the event names.
pub fn team_logo_url(team_name: &str, league: &str) -> Option<String> {
    let mut team = team_name.trim().to_lowercase();
    for suffix in TEAM_SUFFIXES {
        team = team.replace(suffix, "");
    }
    let league = league.to_lowercase();

    let hinted = LEAGUES
        .iter()
        .filter(|(_, _, hints)| hints.iter().any(|hint| league.contains(*hint)));
    let unhinted = LEAGUES.iter();

    hinted.chain(unhinted).find_map(|(table, sport, _)| {
        lookup(table, &team).map(|abbr| format!("{}/{}/500/{}.png", LOGO_BASE, sport, abbr))
    })
}

/// Split "Team A vs. Team B" style titles into the two teams.
pub fn extract_teams(title: &str) -> Option<(String, String)> {
    let clean = BROADCAST_NOTE_RE.replace_all(title, "");
    MATCHUP_RES.iter().find_map(|re| {
        let caps = re.captures(&clean)?;
        Some((caps[1].trim().to_string(), caps[2].trim().to_string()))
    })
}
