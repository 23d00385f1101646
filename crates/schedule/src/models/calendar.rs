//! Cleaning calendar: which days a zone is swept.
//!
//! The base rule is weekly on one or more weekdays. The source data can
//! further restrict a zone to certain weeks of the month and to even or odd
//! days of the month.

use std::fmt;

use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::types::DayCode;

/// How far ahead a restricted recurrence is searched before giving up.
const SEARCH_HORIZON_DAYS: i64 = 366;

/// Soonest date on or after `from` falling on `day`.
///
/// If `from` is already that weekday the occurrence is today, not next week.
pub fn next_occurrence(day: DayCode, from: NaiveDate) -> NaiveDate {
    let target = day.weekday().num_days_from_monday() as i64;
    let current = from.weekday().num_days_from_monday() as i64;
    from + TimeDelta::days((target - current).rem_euclid(7))
}

// ============================================================================
// Day sets
// ============================================================================

/// Compact set of day codes a zone is cleaned on
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DaySet {
    pub(crate) flags: u8,
}

impl DaySet {
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    pub fn single(day: DayCode) -> Self {
        let mut set = Self::new();
        set.insert(day);
        set
    }

    pub fn insert(&mut self, day: DayCode) {
        self.flags |= 1 << day.weekday().num_days_from_monday();
    }

    pub fn remove(&mut self, day: DayCode) {
        self.flags &= !(1 << day.weekday().num_days_from_monday());
    }

    pub fn contains(&self, day: DayCode) -> bool {
        (self.flags & (1 << day.weekday().num_days_from_monday())) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.flags == 0
    }

    pub fn len(&self) -> usize {
        self.flags.count_ones() as usize
    }

    /// Days in Monday-first order
    pub fn iter(&self) -> impl Iterator<Item = DayCode> + '_ {
        DayCode::ALL.into_iter().filter(|day| self.contains(*day))
    }

    pub fn union(&self, other: &DaySet) -> DaySet {
        DaySet {
            flags: self.flags | other.flags,
        }
    }

    pub fn difference(&self, other: &DaySet) -> DaySet {
        DaySet {
            flags: self.flags & !other.flags,
        }
    }
}

impl FromIterator<DayCode> for DaySet {
    fn from_iter<I: IntoIterator<Item = DayCode>>(iter: I) -> Self {
        let mut set = Self::new();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Debug for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.iter().map(DayCode::as_str).collect();
        f.write_str(&codes.join(","))
    }
}

impl Serialize for DaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for DaySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<DayCode>::deserialize(deserializer).map(DaySet::from_iter)
    }
}

// ============================================================================
// Recurrence restrictions
// ============================================================================

/// Weeks of the month (1..=5) a zone is restricted to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MonthWeeks {
    pub(crate) flags: u8,
}

impl MonthWeeks {
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    /// Ignores week numbers outside 1..=5.
    pub fn set(&mut self, week: u8) {
        if (1..=5).contains(&week) {
            self.flags |= 1 << week;
        }
    }

    pub fn contains(&self, week: u8) -> bool {
        (1..=5).contains(&week) && (self.flags & (1 << week)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.flags == 0
    }

    /// Week of the month for `date`, counting the n-th occurrence of its weekday
    pub fn week_of(date: NaiveDate) -> u8 {
        ((date.day() - 1) / 7 + 1) as u8
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DayParity {
    #[default]
    Any,
    Even,
    Odd,
}

impl DayParity {
    pub fn allows(self, date: NaiveDate) -> bool {
        match self {
            Self::Any => true,
            Self::Even => date.day() % 2 == 0,
            Self::Odd => date.day() % 2 == 1,
        }
    }
}

/// Restrictions layered on top of the weekly day codes.
///
/// A zone flagged `weekly`, or with no week restriction, is swept every week.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Recurrence {
    pub weekly: bool,
    pub weeks: MonthWeeks,
    pub parity: DayParity,
}

impl Default for Recurrence {
    fn default() -> Self {
        Self::every_week()
    }
}

impl Recurrence {
    pub fn every_week() -> Self {
        Self {
            weekly: true,
            weeks: MonthWeeks::new(),
            parity: DayParity::Any,
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        (self.weekly || self.weeks.is_empty()) && self.parity == DayParity::Any
    }

    pub fn allows(&self, date: NaiveDate) -> bool {
        let week_ok = self.weekly
            || self.weeks.is_empty()
            || self.weeks.contains(MonthWeeks::week_of(date));
        week_ok && self.parity.allows(date)
    }

    /// Next cleaning date on or after `from` for any of `days`.
    ///
    /// Unrestricted recurrences reduce to the earliest `next_occurrence`
    /// over the day codes.
    pub fn next_date(&self, days: DaySet, from: NaiveDate) -> Option<NaiveDate> {
        if days.is_empty() {
            return None;
        }

        if self.is_unrestricted() {
            return days.iter().map(|day| next_occurrence(day, from)).min();
        }

        (0..=SEARCH_HORIZON_DAYS)
            .map(|offset| from + TimeDelta::days(offset))
            .find(|date| days.contains(DayCode::from_weekday(date.weekday())) && self.allows(*date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_set() {
        let mut days = DaySet::new();
        days.insert(DayCode::Mon);
        days.insert(DayCode::Wed);
        days.insert(DayCode::Fri);

        assert!(days.contains(DayCode::Mon));
        assert!(!days.contains(DayCode::Tue));
        assert_eq!(days.len(), 3);

        days.remove(DayCode::Wed);
        assert!(!days.contains(DayCode::Wed));
        assert_eq!(days.to_string(), "MON,FRI");
    }

    #[test]
    fn test_next_occurrence_today_counts() {
        // 2024-05-15 is a Wednesday
        let wednesday = date(2024, 5, 15);
        assert_eq!(next_occurrence(DayCode::Wed, wednesday), wednesday);
    }

    #[test]
    fn test_next_occurrence_within_week() {
        let from = date(2024, 5, 15); // Wednesday
        for day in DayCode::ALL {
            let next = next_occurrence(day, from);
            assert!(next >= from);
            assert!(next <= from + TimeDelta::days(6));
            assert_eq!(next.weekday(), day.weekday());
            assert_eq!(next == from, day == DayCode::Wed);
        }
        assert_eq!(next_occurrence(DayCode::Tue, from), date(2024, 5, 21));
        assert_eq!(next_occurrence(DayCode::Thu, from), date(2024, 5, 16));
    }

    #[test]
    fn test_unrestricted_takes_earliest_day() {
        let from = date(2024, 5, 15); // Wednesday
        let days = DaySet::from_iter([DayCode::Mon, DayCode::Fri]);
        assert_eq!(
            Recurrence::every_week().next_date(days, from),
            Some(date(2024, 5, 17))
        );
        assert_eq!(Recurrence::every_week().next_date(DaySet::new(), from), None);
    }

    #[test]
    fn test_week_of_month_restriction() {
        let mut weeks = MonthWeeks::new();
        weeks.set(1);
        weeks.set(3);
        let recurrence = Recurrence {
            weekly: false,
            weeks,
            parity: DayParity::Any,
        };

        // Tuesdays of May 2024: 7, 14, 21, 28. First is week 1, 21st is week 3.
        let days = DaySet::single(DayCode::Tue);
        assert_eq!(recurrence.next_date(days, date(2024, 5, 1)), Some(date(2024, 5, 7)));
        assert_eq!(recurrence.next_date(days, date(2024, 5, 8)), Some(date(2024, 5, 21)));
        // After the third week, rolls into June's first Tuesday
        assert_eq!(recurrence.next_date(days, date(2024, 5, 22)), Some(date(2024, 6, 4)));
    }

    #[test]
    fn test_parity_restriction() {
        let recurrence = Recurrence {
            weekly: true,
            weeks: MonthWeeks::new(),
            parity: DayParity::Even,
        };
        // Thursdays from 2024-05-01: 2 (even)
        let days = DaySet::single(DayCode::Thu);
        assert_eq!(recurrence.next_date(days, date(2024, 5, 1)), Some(date(2024, 5, 2)));
        // Next Thursday 9 is odd, 16 is even
        assert_eq!(recurrence.next_date(days, date(2024, 5, 3)), Some(date(2024, 5, 16)));
    }

    #[test]
    fn test_month_week_bounds() {
        let mut weeks = MonthWeeks::new();
        weeks.set(0);
        weeks.set(6);
        assert!(weeks.is_empty());
        assert_eq!(MonthWeeks::week_of(date(2024, 5, 29)), 5);
        assert_eq!(MonthWeeks::week_of(date(2024, 5, 7)), 1);
    }

    #[test]
    fn test_day_set_serde() {
        let days = DaySet::from_iter([DayCode::Fri, DayCode::Mon]);
        let yaml = serde_yaml::to_string(&days).unwrap();
        let back: DaySet = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, days);
        assert!(yaml.contains("MON"));
    }
}
