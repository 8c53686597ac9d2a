use crate::domain::model::{Gender, LunarDate};
use crate::domain::raw::{RawAstrolabe, RawHoroscope};
use crate::utils::error::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Sectional terms (节) in month order, 立春 opening the 寅 month.
pub const JIE_NAMES: [&str; 12] = [
    "立春", "惊蛰", "清明", "立夏", "芒种", "小暑", "立秋", "白露", "寒露", "立冬", "大雪", "小寒",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolarTerm {
    pub name: String,
    /// Beijing time (UTC+8).
    pub at: NaiveDateTime,
}

impl SolarTerm {
    /// Position in `JIE_NAMES`, `None` for a mid-point term (气).
    pub fn jie_index(&self) -> Option<usize> {
        JIE_NAMES.iter().position(|name| *name == self.name)
    }

    pub fn is_jie(&self) -> bool {
        self.jie_index().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LunarDay {
    pub date: LunarDate,
    /// e.g. 一九八九年腊月初五
    pub description: String,
}

/// Solar-term timing (节气) provider.
pub trait SolarTermOracle: Send + Sync {
    /// Latest term at or before (`inclusive`) / strictly before `at`.
    fn prev_term(&self, at: NaiveDateTime, inclusive: bool) -> Result<SolarTerm>;
    /// Earliest term at or after (`inclusive`) / strictly after `at`.
    fn next_term(&self, at: NaiveDateTime, inclusive: bool) -> Result<SolarTerm>;
}

/// Solar ↔ lunar conversion provider.
pub trait LunarOracle: Send + Sync {
    fn solar_to_lunar(&self, date: NaiveDate) -> Result<LunarDay>;
    fn lunar_to_solar(&self, date: &LunarDate) -> Result<NaiveDate>;
    fn leap_month(&self, lunar_year: i32) -> Result<Option<u32>>;
    fn month_days(&self, lunar_year: i32, month: u32, is_leap: bool) -> Result<u32>;
}

/// ZWDS star-placement provider.
pub trait StarOracle: Send + Sync {
    fn source_name(&self) -> &str;

    fn by_solar(
        &self,
        date: NaiveDate,
        time_index: usize,
        gender: Gender,
        fix_leap: bool,
    ) -> Result<RawAstrolabe>;

    fn by_lunar(
        &self,
        date: &LunarDate,
        time_index: usize,
        gender: Gender,
        fix_leap: bool,
    ) -> Result<RawAstrolabe>;

    /// Yearly and monthly flow layers of `natal` at `focus`.
    fn horoscope(&self, natal: &RawAstrolabe, focus: NaiveDate) -> Result<RawHoroscope>;
}

impl<T: SolarTermOracle + ?Sized> SolarTermOracle for Arc<T> {
    fn prev_term(&self, at: NaiveDateTime, inclusive: bool) -> Result<SolarTerm> {
        (**self).prev_term(at, inclusive)
    }

    fn next_term(&self, at: NaiveDateTime, inclusive: bool) -> Result<SolarTerm> {
        (**self).next_term(at, inclusive)
    }
}

impl<T: LunarOracle + ?Sized> LunarOracle for Arc<T> {
    fn solar_to_lunar(&self, date: NaiveDate) -> Result<LunarDay> {
        (**self).solar_to_lunar(date)
    }

    fn lunar_to_solar(&self, date: &LunarDate) -> Result<NaiveDate> {
        (**self).lunar_to_solar(date)
    }

    fn leap_month(&self, lunar_year: i32) -> Result<Option<u32>> {
        (**self).leap_month(lunar_year)
    }

    fn month_days(&self, lunar_year: i32, month: u32, is_leap: bool) -> Result<u32> {
        (**self).month_days(lunar_year, month, is_leap)
    }
}

impl<T: StarOracle + ?Sized> StarOracle for Arc<T> {
    fn source_name(&self) -> &str {
        (**self).source_name()
    }

    fn by_solar(
        &self,
        date: NaiveDate,
        time_index: usize,
        gender: Gender,
        fix_leap: bool,
    ) -> Result<RawAstrolabe> {
        (**self).by_solar(date, time_index, gender, fix_leap)
    }

    fn by_lunar(
        &self,
        date: &LunarDate,
        time_index: usize,
        gender: Gender,
        fix_leap: bool,
    ) -> Result<RawAstrolabe> {
        (**self).by_lunar(date, time_index, gender, fix_leap)
    }

    fn horoscope(&self, natal: &RawAstrolabe, focus: NaiveDate) -> Result<RawHoroscope> {
        (**self).horoscope(natal, focus)
    }
}
