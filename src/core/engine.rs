//! 排盤引擎：把出生資料經由各個 oracle 與推導模組組成完整命盤。

use crate::core::bazi::{self, STRENGTH_METHOD};
use crate::core::calendar::{self, CalendarAdapter};
use crate::core::decade::{self, ChildLimitStrategy, DecadeContext, DecadeLuckStrategy, YunStrategy};
use crate::core::horoscope;
use crate::core::mutagen;
use crate::core::palace;
use crate::core::solar_time::{self, REFERENCE_MERIDIAN};
use crate::domain::ganzhi::{Stem, StemBranch};
use crate::domain::model::{
    Astrolabe, BirthDate, BirthSpec, ChartMetadata, DayRollover, FourPillars, Horoscope,
    LunarDate, Palace, RuleSet,
};
use crate::domain::ports::{LunarOracle, SolarTermOracle, StarOracle};
use crate::domain::raw::RawAstrolabe;
use crate::utils::error::{ChartError, Result};
use crate::utils::validation::Validate;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const HOROSCOPE_NOTE: &str = "horoscope";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub reference_meridian: f64,
    pub max_decades: usize,
    pub max_decade_start_age: u32,
    pub solar_term_retry_limit: usize,
    pub day_rollover: DayRollover,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            reference_meridian: REFERENCE_MERIDIAN,
            max_decades: 10,
            max_decade_start_age: 110,
            solar_term_retry_limit: 5,
            day_rollover: DayRollover::EarlyZi,
        }
    }
}

pub struct ChartEngine<T, L, S> {
    terms: T,
    lunar: L,
    stars: S,
    options: EngineOptions,
}

impl<T, L, S> ChartEngine<T, L, S>
where
    T: SolarTermOracle,
    L: LunarOracle,
    S: StarOracle,
{
    pub fn new(terms: T, lunar: L, stars: S) -> Self {
        Self {
            terms,
            lunar,
            stars,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn calendar(&self) -> CalendarAdapter<'_, T> {
        CalendarAdapter::new(
            &self.terms,
            self.options.day_rollover,
            self.options.solar_term_retry_limit,
        )
    }

    /// 計算完整命盤。輸入錯誤直接回傳；外部來源的局部失敗只會降級並記錄於
    /// `metadata.degradations`。
    pub fn compute_chart(&self, spec: &BirthSpec, focus: Option<NaiveDate>) -> Result<Astrolabe> {
        spec.validate()?;
        let mut degradations = Vec::new();

        let civil_date = match &spec.date {
            BirthDate::Solar { date } => *date,
            BirthDate::Lunar { date } => calendar::resolve_lunar_input(&self.lunar, date)?,
        };

        let instant = solar_time::correct_instant(
            civil_date,
            spec.hour,
            spec.minute,
            spec.longitude,
            self.options.reference_meridian,
        )
        .ok_or_else(|| ChartError::invalid("hour", spec.hour, "not a valid clock time"))?;
        tracing::debug!(
            "Corrected {} to {} (slot {})",
            instant.civil,
            instant.corrected,
            instant.time_index
        );

        let raw = match &spec.date {
            BirthDate::Solar { date } => {
                self.stars
                    .by_solar(*date, instant.time_index, spec.gender, true)?
            }
            BirthDate::Lunar { date } => {
                self.stars
                    .by_lunar(date, instant.time_index, spec.gender, true)?
            }
        };
        let palaces = palace::normalize_palaces(&raw.palaces)?;

        let adapter = self.calendar();
        let resolved = adapter.pillars(instant.corrected, instant.time_index, &raw.chinese_date)?;
        degradations.extend(resolved.degradations);
        let pillars = resolved.pillars;

        let lunar_day = calendar::lunar_facts(&self.lunar, civil_date);
        let raw_dates = match (&spec.date, &lunar_day) {
            (BirthDate::Lunar { date }, _) => *date,
            (BirthDate::Solar { .. }, Some(day)) => day.date,
            (BirthDate::Solar { .. }, None) => {
                degradations.push(format!("lunar date unavailable for {}", civil_date));
                LunarDate {
                    year: 0,
                    month: 0,
                    day: 0,
                    is_leap: false,
                }
            }
        };
        let lunar_date = if raw.lunar_date.trim().is_empty() {
            lunar_day.map(|d| d.description).unwrap_or_default()
        } else {
            raw.lunar_date.clone()
        };

        let jie_bounds = |label: &str, found: Result<Option<_>>, notes: &mut Vec<String>| match found {
            Ok(Some(term)) => Some(term),
            Ok(None) => {
                notes.push(format!("{} sectional term not found", label));
                None
            }
            Err(e) => {
                tracing::warn!("Solar term lookup failed: {}", e);
                notes.push(format!("{} sectional term lookup failed: {}", label, e));
                None
            }
        };
        let prev_jie = jie_bounds(
            "previous",
            adapter.prev_jie(instant.corrected, true),
            &mut degradations,
        );
        let next_jie = jie_bounds(
            "next",
            adapter.next_jie(instant.corrected, false),
            &mut degradations,
        );

        let context = DecadeContext {
            birth: instant.corrected,
            gender: spec.gender,
            pillars,
            prev_jie,
            next_jie,
            max_decades: self.options.max_decades,
            max_start_age: self.options.max_decade_start_age,
        };
        let strategies: [&dyn DecadeLuckStrategy; 2] = [&ChildLimitStrategy, &YunStrategy];
        let decades = decade::resolve_schedule(&strategies, &context);
        degradations.extend(decades.degradations);
        let schedule = decades.schedule;
        let decade_strategy = schedule.strategy.clone();

        let bazi = bazi::build_chart(
            &pillars,
            schedule.pillars,
            schedule.start_age,
            schedule.start_date,
        );

        let natal_mutagens = mutagen::mutagen_map(natal_stem(&raw, &pillars), &palaces);
        let decade_mutagens = mutagen::decade_mutagens(
            &bazi.da_yun,
            &palaces,
            focus.and_then(|f| virtual_age(instant.corrected.date(), f)),
        );

        let horoscope = focus.and_then(|f| self.horoscope(&raw, &palaces, f, &mut degradations));

        let metadata = ChartMetadata {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            rules: self.rule_set(),
            calendar_variant: resolved.variant,
            decade_strategy,
            star_source: self.stars.source_name().to_string(),
            degradations,
        };

        if !metadata.degradations.is_empty() {
            tracing::warn!(
                "Chart computed with {} degraded field(s)",
                metadata.degradations.len()
            );
        }

        Ok(Astrolabe {
            palaces,
            solar_date: if raw.solar_date.trim().is_empty() {
                civil_date.format("%Y-%m-%d").to_string()
            } else {
                raw.solar_date.clone()
            },
            lunar_date,
            chinese_date: raw.chinese_date.clone(),
            raw_dates,
            four_pillars: pillars,
            bazi,
            time: solar_time::time_label(instant.time_index).to_string(),
            time_range: solar_time::time_range(instant.time_index).to_string(),
            sign: raw.sign.clone(),
            zodiac: raw.zodiac.clone(),
            soul: raw.soul.clone(),
            body: raw.body.clone(),
            five_elements_class: raw.five_elements_class.clone(),
            gender: spec.gender,
            original_gender: spec.gender.classical().to_string(),
            natal_mutagens,
            decade_mutagens,
            horoscope,
            longitude: spec.longitude,
            latitude: spec.latitude,
            birth_hour: spec.hour,
            birth_minute: spec.minute,
            instant,
            metadata,
            raw,
        })
    }

    /// 以新的觀察日重算流運，本命部分沿用。
    pub fn refocus(&self, natal: &Astrolabe, focus: NaiveDate) -> Astrolabe {
        let mut chart = natal.clone();
        chart
            .metadata
            .degradations
            .retain(|note| !note.starts_with(HOROSCOPE_NOTE));

        let birth = natal.instant.corrected.date();
        chart.decade_mutagens = mutagen::decade_mutagens(
            &chart.bazi.da_yun,
            &chart.palaces,
            virtual_age(birth, focus),
        );
        chart.horoscope = self.horoscope(
            &natal.raw,
            &natal.palaces,
            focus,
            &mut chart.metadata.degradations,
        );
        chart
    }

    fn horoscope(
        &self,
        raw: &RawAstrolabe,
        palaces: &[Palace],
        focus: NaiveDate,
        notes: &mut Vec<String>,
    ) -> Option<Horoscope> {
        let window = self.calendar().month_window(focus);
        if window.is_none() {
            notes.push(format!("{}: month window unavailable for {}", HOROSCOPE_NOTE, focus));
        }

        let built = self
            .stars
            .horoscope(raw, focus)
            .and_then(|flow| horoscope::build_horoscope(&flow, focus, palaces, window));
        match built {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::warn!("Failed to generate horoscope data for {}: {}", focus, e);
                notes.push(format!("{}: unavailable for {}: {}", HOROSCOPE_NOTE, focus, e));
                None
            }
        }
    }

    fn rule_set(&self) -> RuleSet {
        RuleSet {
            year_boundary: "立春".to_string(),
            month_boundary: "节 (Jie)".to_string(),
            day_rollover: self.options.day_rollover,
            reference_meridian: self.options.reference_meridian,
            strength_method: STRENGTH_METHOD.to_string(),
        }
    }
}

/// 虛歲，以校正後的出生年起算，與大運起始年同一基準。
fn virtual_age(birth: NaiveDate, focus: NaiveDate) -> Option<u32> {
    u32::try_from(focus.year() - birth.year() + 1).ok()
}

/// The oracle's own year stem when it reports one, else the pillar's.
fn natal_stem(raw: &RawAstrolabe, pillars: &FourPillars) -> Stem {
    raw.chinese_date
        .split_whitespace()
        .next()
        .and_then(StemBranch::parse)
        .map(|pair| pair.stem)
        .unwrap_or(pillars.year.stem)
}

impl Validate for EngineOptions {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::{validate_positive_number, validate_range};
        validate_range("engine.reference_meridian", self.reference_meridian, -180.0, 180.0)?;
        validate_positive_number("engine.max_decades", self.max_decades, 1)?;
        validate_range("engine.max_decade_start_age", self.max_decade_start_age, 1, 150)?;
        validate_range("engine.solar_term_retry_limit", self.solar_term_retry_limit, 0, 30)?;
        Ok(())
    }
}
