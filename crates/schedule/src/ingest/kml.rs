//! KML parsing for the street-cleaning open data.
//!
//! Each `Placemark` carries its schedule as an HTML attribute table in the
//! description (`<span class="atr-name">KEY</span> … <span class="atr-value">VALUE</span>`),
//! sometimes duplicated in `ExtendedData`. Records that cannot be normalized
//! are skipped; a document that yields nothing usable is rejected outright.

use std::collections::HashMap;

use chrono::NaiveTime;
use geo::{Coord, LineString};
use roxmltree::{Document, Node};
use tracing::{debug, info, warn};

use crate::identifiers::{SectionName, StreetName};
use crate::ingest::kmz;
use crate::models::calendar::{DayParity, DaySet, MonthWeeks, Recurrence};
use crate::models::types::{DayCode, Result, ScheduleError};
use crate::models::zone::{CleaningZone, TimeWindow};

const NAME_OPEN: &str = "<span class=\"atr-name\">";
const VALUE_OPEN: &str = "<span class=\"atr-value\">";
const SPAN_CLOSE: &str = "</span>";

const WEEK_FIELDS: [(&str, u8); 5] = [
    ("prima_settimana", 1),
    ("seconda_settimana", 2),
    ("terza_settimana", 3),
    ("quarta_settimana", 4),
    ("quinta_settimana", 5),
];

/// Outcome of parsing one schedule document
#[derive(Debug)]
pub struct ParsedSchedule {
    pub zones: Vec<CleaningZone>,
    pub skipped: usize,
}

/// Parse a raw payload, unwrapping KMZ archives first.
pub fn parse_document(payload: &[u8]) -> Result<ParsedSchedule> {
    if kmz::is_kmz(payload) {
        debug!("Payload is a KMZ archive");
        parse_kml(&kmz::extract_kml(payload)?)
    } else {
        parse_kml(&String::from_utf8_lossy(payload))
    }
}

pub fn parse_kml(xml: &str) -> Result<ParsedSchedule> {
    let doc = Document::parse(xml)
        .map_err(|e| ScheduleError::ParseFatal(format!("malformed XML: {e}")))?;

    let root = doc.root_element();
    if !root.has_tag_name("kml") {
        return Err(ScheduleError::ParseFatal(format!(
            "expected <kml> root element, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut zones = Vec::new();
    let mut skipped = 0;
    let mut seen = 0;

    for placemark in root.descendants().filter(|n| n.has_tag_name("Placemark")) {
        seen += 1;
        match parse_placemark(placemark) {
            Ok(zone) => zones.push(zone),
            Err(e) => {
                skipped += 1;
                warn!(placemark = seen, error = %e, "Skipping malformed cleaning record");
            }
        }
    }

    if seen == 0 {
        return Err(ScheduleError::ParseFatal("document contains no placemarks".into()));
    }
    if zones.is_empty() {
        return Err(ScheduleError::ParseFatal(format!(
            "none of {seen} placemarks could be parsed"
        )));
    }

    info!(loaded = zones.len(), skipped, "Parsed cleaning schedule");
    Ok(ParsedSchedule { zones, skipped })
}

fn parse_placemark(node: Node) -> Result<CleaningZone> {
    let label = child_text(node, "name").map(str::trim).filter(|s| !s.is_empty());

    let mut attributes = extended_data(node);
    if let Some(description) = child_text(node, "description") {
        attributes.extend(description_attributes(description));
    }

    let street = attributes
        .get("indirizzo")
        .and_then(|raw| StreetName::normalized(raw))
        .or_else(|| label.and_then(StreetName::normalized))
        .ok_or_else(|| ScheduleError::Parse("placemark has no street name".into()))?;

    let days = match attributes.get("giorno_settimana") {
        Some(raw) => parse_days(raw).map_err(|e| ScheduleError::Parse(format!("{street}: {e}")))?,
        None => {
            return Err(ScheduleError::Parse(format!("{street}: missing giorno_settimana")));
        }
    };

    let section = attributes
        .get("tratto_strada")
        .and_then(|raw| SectionName::optional(raw));

    let window = parse_window(
        attributes.get("ora_inizio").map(String::as_str),
        attributes.get("ora_fine").map(String::as_str),
    );

    let geometry = placemark_geometry(node)
        .map_err(|e| ScheduleError::Parse(format!("{street}: {e}")))?;

    let placemark_name = label.unwrap_or(street.as_str()).to_string();

    Ok(CleaningZone::new(street, section, days, geometry)?
        .with_time_window(window)
        .with_recurrence(parse_recurrence(&attributes))
        .with_placemark_name(placemark_name))
}

fn child_text<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.text())
}

/// Attribute table from the description HTML, keys lowercased
fn description_attributes(html: &str) -> HashMap<String, String> {
    html.split(NAME_OPEN)
        .skip(1)
        .filter_map(|chunk| {
            let (name, rest) = chunk.split_once(SPAN_CLOSE)?;
            let (_, value) = rest.split_once(VALUE_OPEN)?;
            let (value, _) = value.split_once(SPAN_CLOSE)?;
            Some((name.trim().to_lowercase(), unescape(value.trim())))
        })
        .collect()
}

/// `ExtendedData` as `SimpleData name=…` or `Data name=…><value>`
fn extended_data(node: Node) -> HashMap<String, String> {
    node.descendants()
        .filter(|n| n.has_tag_name("SimpleData") || n.has_tag_name("Data"))
        .filter_map(|n| {
            let key = n.attribute("name")?.to_lowercase();
            let value = if n.has_tag_name("Data") {
                child_text(n, "value")?
            } else {
                n.text()?
            };
            Some((key, unescape(value.trim())))
        })
        .collect()
}

fn unescape(value: &str) -> String {
    value
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn parse_days(raw: &str) -> Result<DaySet> {
    let mut days = DaySet::new();
    for token in raw.split(|c: char| !c.is_alphabetic()).filter(|t| !t.is_empty()) {
        days.insert(token.parse::<DayCode>()?);
    }

    if days.is_empty() {
        return Err(ScheduleError::Parse(format!("no day code in {raw:?}")));
    }
    Ok(days)
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    ["%H:%M:%S", "%H:%M", "%H.%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

fn parse_window(start: Option<&str>, end: Option<&str>) -> Option<TimeWindow> {
    let (start_raw, end_raw) = (start?, end?);
    match (parse_time(start_raw), parse_time(end_raw)) {
        (Some(start), Some(end)) => Some(TimeWindow { start, end }),
        _ => {
            debug!(start = start_raw, end = end_raw, "Unrecognized cleaning time window");
            None
        }
    }
}

fn parse_recurrence(attributes: &HashMap<String, String>) -> Recurrence {
    let flag = |key: &str| attributes.get(key).is_some_and(|v| v.trim() == "1");

    let mut weeks = MonthWeeks::new();
    for (field, week) in WEEK_FIELDS {
        if flag(field) {
            weeks.set(week);
        }
    }

    let parity = match (flag("pari"), flag("dispari")) {
        (true, false) => DayParity::Even,
        (false, true) => DayParity::Odd,
        _ => DayParity::Any,
    };

    Recurrence {
        weekly: flag("settimanale"),
        weeks,
        parity,
    }
}

/// First LineString, else the outer ring of the first Polygon
fn placemark_geometry(node: Node) -> Result<LineString<f64>> {
    let find = |tag: &str| node.descendants().find(|n| n.has_tag_name(tag));

    let coordinates = find("LineString")
        .or_else(|| find("outerBoundaryIs"))
        .or_else(|| find("Polygon"))
        .and_then(|geometry| geometry.descendants().find(|n| n.has_tag_name("coordinates")))
        .and_then(|n| n.text())
        .ok_or_else(|| ScheduleError::Parse("no LineString or Polygon geometry".into()))?;

    parse_coordinates(coordinates)
}

/// KML tuples are `lon,lat[,alt]` separated by whitespace
fn parse_coordinates(text: &str) -> Result<LineString<f64>> {
    let mut coords = Vec::new();

    for tuple in text.split_whitespace() {
        let mut parts = tuple.split(',');
        let lon = parts.next().and_then(|v| v.trim().parse::<f64>().ok());
        let lat = parts.next().and_then(|v| v.trim().parse::<f64>().ok());

        match (lon, lat) {
            (Some(x), Some(y)) if x.abs() <= 180.0 && y.abs() <= 90.0 => coords.push(Coord { x, y }),
            _ => {
                return Err(ScheduleError::Parse(format!("invalid coordinate tuple {tuple:?}")));
            }
        }
    }

    Ok(LineString::from(coords))
}
