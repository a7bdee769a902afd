//! Event extraction from the ESPN+ schedule page.
//!
//! The page markup changes often, so several independent strategies are
//! tried and their results pooled: article elements, event-like cards,
//! watch links with their surrounding context, and sport sections.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::events::{RawEvent, dedupe};

const DEFAULT_LEAGUE: &str = "Sports";
const WATCH_LINK_DEPTH: usize = 5;
const SECTION_TIME_DEPTH: usize = 3;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static pattern")
}

static ARTICLE: LazyLock<Selector> = LazyLock::new(|| selector("article"));
static DIV: LazyLock<Selector> = LazyLock::new(|| selector("div"));
static ANY: LazyLock<Selector> = LazyLock::new(|| selector("*"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3, h4"));
static SECTION_HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3"));
static TITLE_TAGS: LazyLock<Vec<Selector>> =
    LazyLock::new(|| ["h1", "h2", "h3", "h4", "span", "a"].into_iter().map(selector).collect());

static CARD_CLASSES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["(?i)event", "(?i)card", "(?i)schedule.*item", "(?i)watch.*card"]
        .into_iter()
        .map(pattern)
        .collect()
});
static TITLE_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern("(?i)title"));
static LEAGUE_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern("(?i)league|sport"));
static TIME_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern("(?i)time|date"));
static CLOCK: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\d{1,2}:\d{2}\s*(am|pm)"));
static WATCH_HREF: LazyLock<Regex> = LazyLock::new(|| pattern("/watch/"));
static SECTION_HREF: LazyLock<Regex> = LazyLock::new(|| pattern("/watch/|/espnplus/"));
static SPORT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        "(?i)Basketball|Football|Hockey|Soccer|Baseball|Tennis|Golf|MMA|UFC|Boxing|Cricket|Rugby|\
         NCAA|NBA|NFL|NHL|MLB|MLS|Premier League|La Liga|Champions League",
    )
});

/// Pull candidate events out of the schedule HTML, first-seen order, no
/// duplicates. Candidates still need `is_valid_event` filtering.
pub fn extract_events(html: &str) -> Vec<RawEvent> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut events = Vec::new();

    events.extend(root.select(&ARTICLE).filter_map(parse_event_element));

    for class in CARD_CLASSES.iter() {
        events.extend(
            root.select(&DIV)
                .filter(|div| has_class(div, class))
                .filter_map(parse_event_element),
        );
    }

    events.extend(watch_link_events(root));
    events.extend(sport_section_events(root));

    dedupe(events)
}

/// Visible text with whitespace trimmed from each text node.
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).filter(|t| !t.is_empty()).collect()
}

fn has_class(element: &ElementRef<'_>, re: &Regex) -> bool {
    element.value().attr("class").is_some_and(|class| re.is_match(class))
}

fn first_with_class<'a>(element: ElementRef<'a>, re: &Regex) -> Option<ElementRef<'a>> {
    element.select(&ANY).find(|child| has_class(child, re))
}

fn image_of(element: ElementRef<'_>) -> Option<String> {
    let img = element.select(&IMG).next()?;
    img.value()
        .attr("src")
        .filter(|src| !src.is_empty())
        .or_else(|| img.value().attr("data-src"))
        .map(str::to_string)
}

fn ancestors(element: ElementRef<'_>, depth: usize) -> impl Iterator<Item = ElementRef<'_>> {
    element.ancestors().filter_map(ElementRef::wrap).take(depth)
}

fn parse_event_element(element: ElementRef<'_>) -> Option<RawEvent> {
    let mut title = TITLE_TAGS
        .iter()
        .find_map(|tag| element.select(tag).find(|t| has_class(t, &TITLE_CLASS)))
        .map(stripped_text)
        .unwrap_or_default();

    if title.is_empty() {
        let text = stripped_text(element);
        let len = text.chars().count();
        if len > 5 && len < 200 {
            title = text;
        }
    }
    if title.is_empty() {
        return None;
    }

    let league = first_with_class(element, &LEAGUE_CLASS)
        .map(stripped_text)
        .unwrap_or_else(|| DEFAULT_LEAGUE.to_string());

    let start_time = match first_with_class(element, &TIME_CLASS) {
        Some(time) => Some(stripped_text(time)),
        None => {
            let text: String = element.text().collect();
            CLOCK.find(&text).map(|m| m.as_str().to_string())
        }
    };

    Some(RawEvent { title, league, start_time, url: None, image: image_of(element) })
}

/// Watch links inherit the nearest time and heading found while walking
/// up their ancestors; both carry over to later links on the page.
fn watch_link_events(root: ElementRef<'_>) -> Vec<RawEvent> {
    let mut events = Vec::new();
    let mut current_sport = DEFAULT_LEAGUE.to_string();
    let mut current_time: Option<String> = None;

    for link in root.select(&LINK) {
        let Some(href) = link.value().attr("href") else { continue };
        if !WATCH_HREF.is_match(href) {
            continue;
        }

        for parent in ancestors(link, WATCH_LINK_DEPTH) {
            if let Some(time) = parent.text().find(|t| CLOCK.is_match(t)) {
                current_time = Some(time.trim().to_string());
            }
            if let Some(heading) = parent
                .select(&HEADING)
                .map(stripped_text)
                .find(|text| !text.is_empty())
            {
                current_sport = heading;
            }
        }

        let title = stripped_text(link);
        if title.chars().count() > 3 {
            events.push(RawEvent {
                title,
                league: current_sport.clone(),
                start_time: current_time.clone(),
                url: Some(href.to_string()),
                image: image_of(link),
            });
        }
    }

    events
}

fn sport_section_events(root: ElementRef<'_>) -> Vec<RawEvent> {
    let mut events = Vec::new();

    for heading in root.select(&SECTION_HEADING) {
        let sport = stripped_text(heading);
        if !SPORT_NAME.is_match(&sport) {
            continue;
        }
        let Some(container) = heading.parent().and_then(ElementRef::wrap) else { continue };

        for link in container.select(&LINK) {
            let Some(href) = link.value().attr("href") else { continue };
            if !SECTION_HREF.is_match(href) {
                continue;
            }
            let title = stripped_text(link);
            if title.chars().count() < 5 || title.eq_ignore_ascii_case(&sport) {
                continue;
            }

            let start_time = ancestors(link, SECTION_TIME_DEPTH).find_map(|parent| {
                let text: String = parent.text().collect();
                CLOCK.find(&text).map(|m| m.as_str().to_string())
            });

            events.push(RawEvent {
                title,
                league: sport.clone(),
                start_time,
                url: Some(href.to_string()),
                image: None,
            });
        }
    }

    events
}
