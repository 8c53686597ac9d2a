//! Calendar adapter: turns the corrected birth instant into sexagenary pillars
//! and lunar facts through the calendar oracles.
//!
//! Pillars come from one of two sources tried in [`PILLAR_SOURCES`] order.
//! The precise source derives them from the instant and the sectional terms
//! (节) around it, so month and year boundaries fall on the exact term
//! moment. The nominal source reads the star oracle's `chineseDate` string.

use crate::core::lexicon;
use crate::domain::ganzhi::{Branch, StemBranch};
use crate::domain::model::{CalendarVariant, DayRollover, FourPillars, LunarDate, MonthWindow};
use crate::domain::ports::{LunarDay, LunarOracle, SolarTerm, SolarTermOracle};
use crate::utils::error::{ChartError, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

pub const PILLAR_SOURCES: [CalendarVariant; 2] = [CalendarVariant::Precise, CalendarVariant::Nominal];

/// chrono's day 1 (0001-01-01) is Julian day 1721426.
const JULIAN_DAY_OFFSET: i64 = 1_721_425;

#[derive(Debug, Clone)]
pub struct ResolvedPillars {
    pub pillars: FourPillars,
    pub variant: CalendarVariant,
    pub degradations: Vec<String>,
}

pub struct CalendarAdapter<'a, T: SolarTermOracle + ?Sized> {
    terms: &'a T,
    rollover: DayRollover,
    retry_limit: usize,
}

impl<'a, T: SolarTermOracle + ?Sized> CalendarAdapter<'a, T> {
    pub fn new(terms: &'a T, rollover: DayRollover, retry_limit: usize) -> Self {
        Self {
            terms,
            rollover,
            retry_limit,
        }
    }

    /// Tries each pillar source in order. Only when every source fails is the
    /// chart unbuildable.
    pub fn pillars(
        &self,
        corrected: NaiveDateTime,
        time_index: usize,
        chinese_date: &str,
    ) -> Result<ResolvedPillars> {
        let mut degradations = Vec::new();
        let mut last_error = None;

        for variant in PILLAR_SOURCES {
            let attempt = match variant {
                CalendarVariant::Precise => self.precise_pillars(corrected, time_index),
                CalendarVariant::Nominal => nominal_pillars(chinese_date),
            };
            match attempt {
                Ok(pillars) => {
                    tracing::debug!("Pillars resolved via {:?} source", variant);
                    return Ok(ResolvedPillars {
                        pillars,
                        variant,
                        degradations,
                    });
                }
                Err(e) => {
                    tracing::warn!("{:?} pillar source unavailable, falling back: {}", variant, e);
                    degradations.push(format!("{:?} pillar source unavailable: {}", variant, e));
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ChartError::provider("calendar", "no pillar source configured")))
    }

    /// Year and month from the governing 节, day from the Julian day number,
    /// hour from the corrected branch slot.
    pub fn precise_pillars(&self, corrected: NaiveDateTime, time_index: usize) -> Result<FourPillars> {
        let jie = self.prev_jie(corrected, true)?.ok_or_else(|| {
            ChartError::provider("calendar", format!("no sectional term found before {}", corrected))
        })?;
        let jie_index = jie
            .jie_index()
            .ok_or_else(|| ChartError::provider("calendar", format!("{} is not a sectional term", jie.name)))?;

        // 小寒 is the only 节 that opens a month before 立春 of its civil year
        let governing_year = if jie_index == 11 {
            jie.at.year() - 1
        } else {
            jie.at.year()
        };
        let year = year_pair(governing_year);
        let month = lexicon::month_pair(year.stem, Branch::Yin.offset(jie_index as i32));
        let day = day_pair(corrected, self.rollover);
        let hour = lexicon::hour_pair(day.stem, Branch::from_index(time_index));

        Ok(FourPillars {
            year,
            month,
            day,
            hour,
        })
    }

    /// Nearest 节 at or before `at`. A mid-point term (气) sends the search one
    /// day further back, at most `retry_limit` times.
    pub fn prev_jie(&self, at: NaiveDateTime, inclusive: bool) -> Result<Option<SolarTerm>> {
        let mut term = self.terms.prev_term(at, inclusive)?;
        let mut attempts = 0;
        while !term.is_jie() && attempts < self.retry_limit {
            term = self.terms.prev_term(term.at - Duration::days(1), true)?;
            attempts += 1;
        }
        Ok(self.accept_jie(term, "previous"))
    }

    pub fn next_jie(&self, at: NaiveDateTime, inclusive: bool) -> Result<Option<SolarTerm>> {
        let mut term = self.terms.next_term(at, inclusive)?;
        let mut attempts = 0;
        while !term.is_jie() && attempts < self.retry_limit {
            term = self.terms.next_term(term.at + Duration::days(1), true)?;
            attempts += 1;
        }
        Ok(self.accept_jie(term, "next"))
    }

    fn accept_jie(&self, term: SolarTerm, direction: &str) -> Option<SolarTerm> {
        if term.is_jie() {
            Some(term)
        } else {
            tracing::warn!(
                "Gave up looking for the {} sectional term after {} retries (stopped at {})",
                direction,
                self.retry_limit,
                term.name
            );
            None
        }
    }

    /// The 节-bounded month enclosing `focus`. Lookup failures degrade to
    /// `None`.
    pub fn month_window(&self, focus: NaiveDate) -> Option<MonthWindow> {
        let at = focus.and_hms_opt(0, 0, 0)?;
        let bounds = self
            .prev_jie(at, true)
            .and_then(|start| Ok((start, self.next_jie(at, false)?)));

        match bounds {
            Ok((Some(start), Some(end))) => Some(MonthWindow {
                start: start.at,
                end: end.at,
                start_name: start.name,
                end_name: end.name,
            }),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Solar term calculation failed for {}: {}", focus, e);
                None
            }
        }
    }
}

/// 1984 was 甲子.
pub fn year_pair(governing_year: i32) -> StemBranch {
    StemBranch::from_cycle_index(governing_year as i64 - 4)
}

pub fn julian_day_number(date: NaiveDate) -> i64 {
    date.num_days_from_ce() as i64 + JULIAN_DAY_OFFSET
}

/// Day pillar, advancing at 23:00 under [`DayRollover::EarlyZi`].
pub fn day_pair(instant: NaiveDateTime, rollover: DayRollover) -> StemBranch {
    let mut date = instant.date();
    if rollover == DayRollover::EarlyZi && instant.hour() >= 23 {
        date += Duration::days(1);
    }
    StemBranch::from_cycle_index(julian_day_number(date) + 49)
}

/// Reads `己巳 丙子 丙寅 甲午` (unit suffixes such as `年` are tolerated).
pub fn nominal_pillars(chinese_date: &str) -> Result<FourPillars> {
    let tokens: Vec<&str> = chinese_date.split_whitespace().collect();
    let parse = |i: usize| {
        tokens.get(i).and_then(|t| StemBranch::parse(t)).ok_or_else(|| {
            ChartError::provider("calendar", format!("unreadable chinese date '{}'", chinese_date))
        })
    };

    Ok(FourPillars {
        year: parse(0)?,
        month: parse(1)?,
        day: parse(2)?,
        hour: parse(3)?,
    })
}

/// 農曆輸入：閏月旗標必須對得上該年的閏月，日數不可超過當月天數。
pub fn validate_lunar_input<L: LunarOracle + ?Sized>(oracle: &L, date: &LunarDate) -> Result<()> {
    if date.is_leap {
        let leap = oracle.leap_month(date.year)?;
        if leap != Some(date.month) {
            return Err(ChartError::invalid(
                "lunar_month",
                date.month,
                match leap {
                    Some(m) => format!("{} has its leap month at {}", date.year, m),
                    None => format!("{} has no leap month", date.year),
                },
            ));
        }
    }

    let days = oracle.month_days(date.year, date.month, date.is_leap)?;
    if date.day > days {
        return Err(ChartError::invalid(
            "lunar_day",
            date.day,
            format!("lunar month {} of {} has {} days", date.month, date.year, days),
        ));
    }
    Ok(())
}

pub fn resolve_lunar_input<L: LunarOracle + ?Sized>(oracle: &L, date: &LunarDate) -> Result<NaiveDate> {
    validate_lunar_input(oracle, date)?;
    oracle.lunar_to_solar(date)
}

/// Lunar description for the header. A provider failure degrades to `None`.
pub fn lunar_facts<L: LunarOracle + ?Sized>(oracle: &L, date: NaiveDate) -> Option<LunarDay> {
    match oracle.solar_to_lunar(date) {
        Ok(day) => Some(day),
        Err(e) => {
            tracing::warn!("Lunar conversion failed for {}: {}", date, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    struct Terms {
        terms: Vec<SolarTerm>,
    }

    impl Terms {
        fn new(list: &[(&str, NaiveDateTime)]) -> Self {
            Self {
                terms: list
                    .iter()
                    .map(|(name, at)| SolarTerm {
                        name: name.to_string(),
                        at: *at,
                    })
                    .collect(),
            }
        }

        fn winter() -> Self {
            Self::new(&[
                ("立冬", dt(1989, 11, 7, 19, 34)),
                ("小雪", dt(1989, 11, 22, 17, 5)),
                ("大雪", dt(1989, 12, 7, 11, 21)),
                ("冬至", dt(1989, 12, 22, 5, 22)),
                ("小寒", dt(1990, 1, 5, 22, 33)),
                ("大寒", dt(1990, 1, 20, 15, 2)),
                ("立春", dt(1990, 2, 4, 10, 14)),
                ("雨水", dt(1990, 2, 19, 6, 14)),
                ("惊蛰", dt(1990, 3, 6, 4, 19)),
            ])
        }
    }

    impl SolarTermOracle for Terms {
        fn prev_term(&self, at: NaiveDateTime, inclusive: bool) -> Result<SolarTerm> {
            self.terms
                .iter()
                .rev()
                .find(|t| t.at < at || (inclusive && t.at == at))
                .cloned()
                .ok_or_else(|| ChartError::provider("test", "out of range"))
        }

        fn next_term(&self, at: NaiveDateTime, inclusive: bool) -> Result<SolarTerm> {
            self.terms
                .iter()
                .find(|t| t.at > at || (inclusive && t.at == at))
                .cloned()
                .ok_or_else(|| ChartError::provider("test", "out of range"))
        }
    }

    #[test]
    fn test_julian_day_and_day_pillar() {
        let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        assert_eq!(julian_day_number(date), 2_447_893);
        assert_eq!(day_pair(dt(1990, 1, 1, 12, 0), DayRollover::EarlyZi).to_string(), "丙寅");
        assert_eq!(day_pair(dt(2000, 1, 1, 0, 0), DayRollover::Midnight).to_string(), "戊午");
    }

    #[test]
    fn test_early_zi_rolls_the_day() {
        let late = dt(1990, 1, 1, 23, 30);
        assert_eq!(day_pair(late, DayRollover::EarlyZi).to_string(), "丁卯");
        assert_eq!(day_pair(late, DayRollover::Midnight).to_string(), "丙寅");
    }

    #[test]
    fn test_precise_pillars_for_1990_new_year() {
        let terms = Terms::winter();
        let adapter = CalendarAdapter::new(&terms, DayRollover::EarlyZi, 5);
        let pillars = adapter.precise_pillars(dt(1990, 1, 1, 12, 0), 6).unwrap();
        assert_eq!(pillars.year.to_string(), "己巳");
        assert_eq!(pillars.month.to_string(), "丙子");
        assert_eq!(pillars.day.to_string(), "丙寅");
        assert_eq!(pillars.hour.to_string(), "甲午");
    }

    #[test]
    fn test_year_turns_at_li_chun_not_new_year() {
        let terms = Terms::winter();
        let adapter = CalendarAdapter::new(&terms, DayRollover::EarlyZi, 5);

        let before = adapter.precise_pillars(dt(1990, 2, 4, 10, 0), 5).unwrap();
        assert_eq!(before.year.to_string(), "己巳");
        assert_eq!(before.month.to_string(), "丁丑");

        let after = adapter.precise_pillars(dt(1990, 2, 4, 10, 30), 5).unwrap();
        assert_eq!(after.year.to_string(), "庚午");
        assert_eq!(after.month.to_string(), "戊寅");
    }

    #[test]
    fn test_jie_search_skips_qi() {
        let terms = Terms::winter();
        let adapter = CalendarAdapter::new(&terms, DayRollover::EarlyZi, 5);
        let prev = adapter.prev_jie(dt(1990, 1, 1, 0, 0), true).unwrap().unwrap();
        assert_eq!(prev.name, "大雪");
        let next = adapter.next_jie(dt(1990, 1, 10, 0, 0), false).unwrap().unwrap();
        assert_eq!(next.name, "立春");
    }

    #[test]
    fn test_jie_search_gives_up_after_retry_limit() {
        let terms = Terms::winter();
        let adapter = CalendarAdapter::new(&terms, DayRollover::EarlyZi, 0);
        assert!(adapter.prev_jie(dt(1990, 1, 1, 0, 0), true).unwrap().is_none());
        assert!(adapter.month_window(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()).is_none());
    }

    #[test]
    fn test_month_window() {
        let terms = Terms::winter();
        let adapter = CalendarAdapter::new(&terms, DayRollover::EarlyZi, 5);
        let window = adapter
            .month_window(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap())
            .unwrap();
        assert_eq!(window.start_name, "大雪");
        assert_eq!(window.end_name, "小寒");
        assert_eq!(window.start, dt(1989, 12, 7, 11, 21));
        assert_eq!(window.end, dt(1990, 1, 5, 22, 33));
    }

    #[test]
    fn test_falls_back_to_nominal_when_terms_missing() {
        let terms = Terms::new(&[]);
        let adapter = CalendarAdapter::new(&terms, DayRollover::EarlyZi, 5);
        let resolved = adapter
            .pillars(dt(1990, 1, 1, 12, 0), 6, "己巳 丙子 丙寅 甲午")
            .unwrap();
        assert_eq!(resolved.variant, CalendarVariant::Nominal);
        assert_eq!(resolved.degradations.len(), 1);
        assert_eq!(resolved.pillars.hour.to_string(), "甲午");

        assert!(adapter.pillars(dt(1990, 1, 1, 12, 0), 6, "garbage").is_err());
    }

    #[test]
    fn test_nominal_tolerates_unit_suffixes() {
        let pillars = nominal_pillars("己巳年 丙子月 丙寅日 甲午时").unwrap();
        assert_eq!(pillars.day.to_string(), "丙寅");
        assert!(nominal_pillars("己巳 丙子 丙寅").is_err());
    }
}
