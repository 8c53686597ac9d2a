//! 以預先錄製的 JSON 快照提供節氣、農曆與紫微星曜資料。
//!
//! A snapshot is what an external calendar/astrology engine produced for a
//! set of birth inputs: a table of solar terms, the lunar months covering the
//! dates of interest, and one recorded chart (with its flow layers) per
//! birth date, time slot and gender.

use crate::domain::model::{Gender, LunarDate};
use crate::domain::ports::{LunarDay, LunarOracle, SolarTerm, SolarTermOracle, StarOracle};
use crate::domain::raw::{RawAstrolabe, RawHoroscope};
use crate::utils::error::{ChartError, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;

const PROVIDER: &str = "snapshot";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LunarMonthEntry {
    pub year: i32,
    pub month: u32,
    #[serde(default)]
    pub is_leap: bool,
    pub first_day: NaiveDate,
    pub days: u32,
}

impl LunarMonthEntry {
    fn contains(&self, date: NaiveDate) -> bool {
        let offset = (date - self.first_day).num_days();
        offset >= 0 && offset < self.days as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedHoroscope {
    pub focus: NaiveDate,
    #[serde(flatten)]
    pub layers: RawHoroscope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedChart {
    pub solar_date: NaiveDate,
    pub time_index: usize,
    pub gender: Gender,
    pub astrolabe: RawAstrolabe,
    #[serde(default)]
    pub horoscopes: Vec<RecordedHoroscope>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    pub source: String,
    #[serde(default)]
    pub solar_terms: Vec<SolarTerm>,
    #[serde(default)]
    pub lunar_months: Vec<LunarMonthEntry>,
    #[serde(default)]
    pub charts: Vec<RecordedChart>,
}

#[derive(Debug, Clone)]
pub struct SnapshotOracle {
    document: SnapshotDocument,
}

impl SnapshotOracle {
    pub fn new(mut document: SnapshotDocument) -> Self {
        document.solar_terms.sort_by_key(|t| t.at);
        document.lunar_months.sort_by_key(|m| m.first_day);
        tracing::debug!(
            "Loaded snapshot '{}': {} terms, {} lunar months, {} charts",
            document.source,
            document.solar_terms.len(),
            document.lunar_months.len(),
            document.charts.len()
        );
        Self { document }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: SnapshotDocument = serde_json::from_str(content)?;
        Ok(Self::new(document))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        tracing::info!("📂 Reading chart snapshot {}", path.as_ref().display());
        Self::from_json_str(&content)
    }

    pub fn document(&self) -> &SnapshotDocument {
        &self.document
    }

    fn month(&self, year: i32, month: u32, is_leap: bool) -> Result<&LunarMonthEntry> {
        self.document
            .lunar_months
            .iter()
            .find(|m| m.year == year && m.month == month && m.is_leap == is_leap)
            .ok_or_else(|| {
                ChartError::provider(
                    PROVIDER,
                    format!(
                        "lunar month {}{} of {} not recorded",
                        if is_leap { "闰" } else { "" },
                        month,
                        year
                    ),
                )
            })
    }

    fn chart(&self, date: NaiveDate, time_index: usize, gender: Gender) -> Result<&RecordedChart> {
        self.document
            .charts
            .iter()
            .find(|c| c.solar_date == date && c.time_index == time_index && c.gender == gender)
            .ok_or_else(|| {
                ChartError::provider(
                    PROVIDER,
                    format!(
                        "no chart recorded for {} slot {} ({})",
                        date,
                        time_index,
                        gender.english()
                    ),
                )
            })
    }
}

impl SolarTermOracle for SnapshotOracle {
    fn prev_term(&self, at: NaiveDateTime, inclusive: bool) -> Result<SolarTerm> {
        self.document
            .solar_terms
            .iter()
            .rev()
            .find(|t| if inclusive { t.at <= at } else { t.at < at })
            .cloned()
            .ok_or_else(|| ChartError::provider(PROVIDER, format!("no solar term before {}", at)))
    }

    fn next_term(&self, at: NaiveDateTime, inclusive: bool) -> Result<SolarTerm> {
        self.document
            .solar_terms
            .iter()
            .find(|t| if inclusive { t.at >= at } else { t.at > at })
            .cloned()
            .ok_or_else(|| ChartError::provider(PROVIDER, format!("no solar term after {}", at)))
    }
}

impl LunarOracle for SnapshotOracle {
    fn solar_to_lunar(&self, date: NaiveDate) -> Result<LunarDay> {
        let entry = self
            .document
            .lunar_months
            .iter()
            .find(|m| m.contains(date))
            .ok_or_else(|| {
                ChartError::provider(PROVIDER, format!("{} is outside the recorded lunar months", date))
            })?;

        let lunar = LunarDate {
            year: entry.year,
            month: entry.month,
            day: (date - entry.first_day).num_days() as u32 + 1,
            is_leap: entry.is_leap,
        };
        Ok(LunarDay {
            date: lunar,
            description: describe_lunar(&lunar),
        })
    }

    fn lunar_to_solar(&self, date: &LunarDate) -> Result<NaiveDate> {
        let entry = self.month(date.year, date.month, date.is_leap)?;
        if date.day == 0 || date.day > entry.days {
            return Err(ChartError::provider(
                PROVIDER,
                format!("day {} outside lunar month of {} days", date.day, entry.days),
            ));
        }
        Ok(entry.first_day + Duration::days(date.day as i64 - 1))
    }

    fn leap_month(&self, lunar_year: i32) -> Result<Option<u32>> {
        let mut months = self
            .document
            .lunar_months
            .iter()
            .filter(|m| m.year == lunar_year)
            .peekable();
        if months.peek().is_none() {
            return Err(ChartError::provider(
                PROVIDER,
                format!("lunar year {} not recorded", lunar_year),
            ));
        }
        Ok(months.find(|m| m.is_leap).map(|m| m.month))
    }

    fn month_days(&self, lunar_year: i32, month: u32, is_leap: bool) -> Result<u32> {
        Ok(self.month(lunar_year, month, is_leap)?.days)
    }
}

impl StarOracle for SnapshotOracle {
    fn source_name(&self) -> &str {
        &self.document.source
    }

    fn by_solar(
        &self,
        date: NaiveDate,
        time_index: usize,
        gender: Gender,
        _fix_leap: bool,
    ) -> Result<RawAstrolabe> {
        Ok(self.chart(date, time_index, gender)?.astrolabe.clone())
    }

    fn by_lunar(
        &self,
        date: &LunarDate,
        time_index: usize,
        gender: Gender,
        fix_leap: bool,
    ) -> Result<RawAstrolabe> {
        let solar = self.lunar_to_solar(date)?;
        self.by_solar(solar, time_index, gender, fix_leap)
    }

    fn horoscope(&self, natal: &RawAstrolabe, focus: NaiveDate) -> Result<RawHoroscope> {
        let chart = self
            .document
            .charts
            .iter()
            .find(|c| c.astrolabe == *natal)
            .ok_or_else(|| ChartError::provider(PROVIDER, "natal chart not part of this snapshot"))?;

        chart
            .horoscopes
            .iter()
            .find(|h| h.focus == focus)
            .map(|h| h.layers.clone())
            .ok_or_else(|| {
                ChartError::provider(PROVIDER, format!("no flow layers recorded for {}", focus))
            })
    }
}

const DIGITS: [char; 10] = ['〇', '一', '二', '三', '四', '五', '六', '七', '八', '九'];
const MONTHS: [&str; 12] = [
    "正", "二", "三", "四", "五", "六", "七", "八", "九", "十", "冬", "腊",
];

fn lunar_day_name(day: u32) -> String {
    let ones = |n: u32| DIGITS[(n % 10) as usize];
    match day {
        1..=10 => format!("初{}", if day == 10 { '十' } else { ones(day) }),
        11..=19 => format!("十{}", ones(day)),
        20 => "二十".to_string(),
        21..=29 => format!("廿{}", ones(day)),
        30 => "三十".to_string(),
        _ => day.to_string(),
    }
}

/// 一九八九年腊月初五
pub fn describe_lunar(date: &LunarDate) -> String {
    let year: String = date
        .year
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10).map(|d| DIGITS[d as usize]))
        .collect();
    let month = MONTHS
        .get(date.month.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("?");
    format!(
        "{}年{}{}月{}",
        year,
        if date.is_leap { "闰" } else { "" },
        month,
        lunar_day_name(date.day)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn oracle() -> SnapshotOracle {
        SnapshotOracle::new(SnapshotDocument {
            source: "test".to_string(),
            solar_terms: vec![
                SolarTerm {
                    name: "小寒".to_string(),
                    at: d(1990, 1, 5).and_hms_opt(22, 33, 0).unwrap(),
                },
                SolarTerm {
                    name: "大雪".to_string(),
                    at: d(1989, 12, 7).and_hms_opt(11, 21, 0).unwrap(),
                },
                SolarTerm {
                    name: "冬至".to_string(),
                    at: d(1989, 12, 22).and_hms_opt(5, 22, 0).unwrap(),
                },
            ],
            lunar_months: vec![
                LunarMonthEntry {
                    year: 1989,
                    month: 12,
                    is_leap: false,
                    first_day: d(1989, 12, 28),
                    days: 30,
                },
                LunarMonthEntry {
                    year: 1990,
                    month: 5,
                    is_leap: true,
                    first_day: d(1990, 6, 23),
                    days: 29,
                },
            ],
            charts: Vec::new(),
        })
    }

    #[test]
    fn test_term_lookup_respects_inclusive_flag() {
        let oracle = oracle();
        let at = d(1989, 12, 22).and_hms_opt(5, 22, 0).unwrap();
        assert_eq!(oracle.prev_term(at, true).unwrap().name, "冬至");
        assert_eq!(oracle.prev_term(at, false).unwrap().name, "大雪");
        assert_eq!(oracle.next_term(at, true).unwrap().name, "冬至");
        assert_eq!(oracle.next_term(at, false).unwrap().name, "小寒");
        assert!(oracle.prev_term(d(1989, 1, 1).and_hms_opt(0, 0, 0).unwrap(), true).is_err());
    }

    #[test]
    fn test_solar_to_lunar() {
        let day = oracle().solar_to_lunar(d(1990, 1, 1)).unwrap();
        assert_eq!(
            day.date,
            LunarDate {
                year: 1989,
                month: 12,
                day: 5,
                is_leap: false
            }
        );
        assert_eq!(day.description, "一九八九年腊月初五");
        assert!(oracle().solar_to_lunar(d(1991, 1, 1)).is_err());
    }

    #[test]
    fn test_lunar_to_solar_and_leap() {
        let oracle = oracle();
        let leap = LunarDate {
            year: 1990,
            month: 5,
            day: 1,
            is_leap: true,
        };
        assert_eq!(oracle.lunar_to_solar(&leap).unwrap(), d(1990, 6, 23));
        assert_eq!(oracle.leap_month(1990).unwrap(), Some(5));
        assert_eq!(oracle.leap_month(1989).unwrap(), None);
        assert!(oracle.leap_month(2000).is_err());
        assert_eq!(oracle.month_days(1990, 5, true).unwrap(), 29);
        assert!(oracle.lunar_to_solar(&LunarDate { day: 30, ..leap }).is_err());
    }

    #[test]
    fn test_day_names() {
        assert_eq!(lunar_day_name(1), "初一");
        assert_eq!(lunar_day_name(10), "初十");
        assert_eq!(lunar_day_name(15), "十五");
        assert_eq!(lunar_day_name(20), "二十");
        assert_eq!(lunar_day_name(23), "廿三");
        assert_eq!(lunar_day_name(30), "三十");
        let leap = LunarDate {
            year: 2020,
            month: 4,
            day: 21,
            is_leap: true,
        };
        assert_eq!(describe_lunar(&leap), "二〇二〇年闰四月廿一");
    }

    #[test]
    fn test_missing_chart_is_provider_error() {
        let err = oracle()
            .by_solar(d(1990, 1, 1), 6, Gender::Male, true)
            .unwrap_err();
        assert!(matches!(err, ChartError::Provider { .. }));
    }
}
