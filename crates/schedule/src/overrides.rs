//! Manual exclusions for known errors in the open data.
//!
//! A rule names a street exactly and optionally narrows to one section and
//! one day code. Rules remove day occurrences from matching entries; an entry
//! left with no days is dropped. Matching is case-sensitive.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::identifiers::{SectionName, StreetName};
use crate::models::calendar::DaySet;
use crate::models::types::{DayCode, Result, ScheduleError};
use crate::models::zone::CleaningZone;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverrideRule {
    pub street: StreetName,
    /// `None` matches any section
    pub section: Option<SectionName>,
    /// `None` matches every day
    pub day: Option<DayCode>,
    pub reason: Option<String>,
}

impl OverrideRule {
    pub fn new(street: impl Into<StreetName>) -> Self {
        Self {
            street: street.into(),
            section: None,
            day: None,
            reason: None,
        }
    }

    pub fn section(mut self, section: impl Into<SectionName>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn day(mut self, day: DayCode) -> Self {
        self.day = Some(day);
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Days of `zone` this rule removes (empty when it does not apply)
    pub fn excluded_days(&self, zone: &CleaningZone) -> DaySet {
        if self.street != zone.street {
            return DaySet::new();
        }
        if let Some(section) = &self.section {
            if zone.section.as_ref() != Some(section) {
                return DaySet::new();
            }
        }

        match self.day {
            Some(day) if zone.days.contains(day) => DaySet::single(day),
            Some(_) => DaySet::new(),
            None => zone.days,
        }
    }
}

/// Override rules compiled for lookup by street
#[derive(Clone, Debug, Default)]
pub struct OverrideSet {
    rules: Vec<OverrideRule>,
    by_street: HashMap<StreetName, Vec<usize>>,
}

/// Result of filtering a freshly parsed schedule
#[derive(Debug)]
pub struct FilterOutcome {
    pub zones: Vec<CleaningZone>,
    /// Entries dropped entirely
    pub excluded: usize,
}

impl OverrideSet {
    pub fn new(rules: Vec<OverrideRule>) -> Self {
        let mut by_street: HashMap<StreetName, Vec<usize>> = HashMap::new();
        for (i, rule) in rules.iter().enumerate() {
            by_street.entry(rule.street.clone()).or_default().push(i);
        }
        Self { rules, by_street }
    }

    pub fn rules(&self) -> &[OverrideRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Load `exclude_entries` from a YAML file.
    ///
    /// A missing file is an empty set. Malformed rules are skipped with a
    /// warning; the rest still apply.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Overrides file not found, no exclusions applied");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        #[derive(Deserialize, Default)]
        struct OverridesFile {
            #[serde(default)]
            exclude_entries: Vec<serde_yaml::Value>,
        }

        let file: Option<OverridesFile> = serde_yaml::from_str(text)
            .map_err(|e| ScheduleError::Config(format!("unreadable overrides file: {e}")))?;
        let entries = file.unwrap_or_default().exclude_entries;

        let mut rules = Vec::new();
        for (i, entry) in entries.into_iter().enumerate() {
            match rule_from_value(entry) {
                Ok(rule) => {
                    info!(
                        street = %rule.street,
                        section = rule.section.as_ref().map(|s| s.as_str()).unwrap_or("*"),
                        day = rule.day.map(DayCode::as_str).unwrap_or("*"),
                        reason = rule.reason.as_deref().unwrap_or("no reason given"),
                        "Loaded exclusion rule"
                    );
                    rules.push(rule);
                }
                Err(e) => warn!(rule = i, error = %e, "Skipping invalid override rule"),
            }
        }

        Ok(Self::new(rules))
    }

    /// Remove excluded day occurrences, dropping entries left with none.
    ///
    /// Entries matching no rule pass through unchanged; the result does not
    /// depend on rule order.
    pub fn apply(&self, zones: Vec<CleaningZone>) -> FilterOutcome {
        if self.rules.is_empty() {
            return FilterOutcome { zones, excluded: 0 };
        }

        let original = zones.len();
        let zones: Vec<CleaningZone> = zones
            .into_iter()
            .filter_map(|mut zone| {
                let Some(indices) = self.by_street.get(&zone.street) else {
                    return Some(zone);
                };

                let mut removed = DaySet::new();
                for &i in indices {
                    let rule = &self.rules[i];
                    let days = rule.excluded_days(&zone);
                    if !days.is_empty() {
                        info!(
                            zone = %zone.key(),
                            reason = rule.reason.as_deref().unwrap_or("matched exclusion rule"),
                            "Excluding cleaning entry"
                        );
                    }
                    removed = removed.union(&days);
                }

                zone.days = zone.days.difference(&removed);
                (!zone.days.is_empty()).then_some(zone)
            })
            .collect();

        let excluded = original - zones.len();
        if excluded > 0 {
            info!(excluded, "Filtered entries by override rules");
        }

        FilterOutcome { zones, excluded }
    }
}

/// Filter `entries` through `rules`.
pub fn apply(rules: &[OverrideRule], entries: Vec<CleaningZone>) -> Vec<CleaningZone> {
    OverrideSet::new(rules.to_vec()).apply(entries).zones
}

fn rule_from_value(value: serde_yaml::Value) -> Result<OverrideRule> {
    #[derive(Deserialize)]
    struct RawRule {
        street_name: Option<String>,
        section: Option<String>,
        day_code: Option<String>,
        reason: Option<String>,
    }

    let raw: RawRule = serde_yaml::from_value(value)
        .map_err(|e| ScheduleError::Config(format!("malformed rule: {e}")))?;

    let street = raw
        .street_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ScheduleError::Config("rule has no street_name".into()))?;

    let day = match raw.day_code.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(code) => Some(
            DayCode::from_source(code)
                .ok_or_else(|| ScheduleError::Config(format!("unknown day_code {code:?}")))?,
        ),
        None => None,
    };

    Ok(OverrideRule {
        street: StreetName::new(street),
        section: raw.section.as_deref().and_then(SectionName::optional),
        day,
        reason: raw.reason,
    })
}
