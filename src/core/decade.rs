//! 大運排序：起運歲數的兩種算法與大運柱序列。
//!
//! Both strategies measure the distance from the birth instant to the 节
//! the luck runs toward (next 节 when running forward, previous otherwise)
//! and convert it with the classical "three days make a year" ratio. They
//! differ in resolution, which may shift the onset date by a few days but
//! leaves the start age and the pillar sequence unchanged in practice.

use crate::core::bazi;
use crate::domain::ganzhi::Polarity;
use crate::domain::model::{DecadeLuckPillar, FourPillars, Gender};
use crate::domain::ports::SolarTerm;
use crate::utils::error::{ChartError, Result};
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, Timelike};

pub const CHILD_LIMIT: &str = "child-limit";
pub const YUN: &str = "yun";

/// Seconds of life before onset that count as one year, one month, one day
/// and one hour (3 days, 6 hours, 12 minutes, 30 seconds).
const SECONDS_PER_YEAR: i64 = 259_200;
const SECONDS_PER_MONTH: i64 = 21_600;
const SECONDS_PER_DAY: i64 = 720;
const SECONDS_PER_HOUR: i64 = 30;

/// Everything a strategy needs, resolved once by the engine.
#[derive(Debug, Clone)]
pub struct DecadeContext {
    /// Corrected birth instant.
    pub birth: NaiveDateTime,
    pub gender: Gender,
    pub pillars: FourPillars,
    pub prev_jie: Option<SolarTerm>,
    pub next_jie: Option<SolarTerm>,
    pub max_decades: usize,
    pub max_start_age: u32,
}

impl DecadeContext {
    /// 陽男陰女順行，陰男陽女逆行。
    pub fn is_forward(&self) -> bool {
        matches!(
            (self.pillars.year.stem.polarity(), self.gender),
            (Polarity::Yang, Gender::Male) | (Polarity::Yin, Gender::Female)
        )
    }

    fn target_jie(&self, strategy: &str) -> Result<&SolarTerm> {
        let term = if self.is_forward() {
            self.next_jie.as_ref()
        } else {
            self.prev_jie.as_ref()
        };
        term.ok_or_else(|| {
            ChartError::provider(strategy, "no sectional term around the birth instant")
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecadeSchedule {
    pub strategy: Option<String>,
    pub start_age: u32,
    pub start_date: Option<NaiveDate>,
    pub pillars: Vec<DecadeLuckPillar>,
}

impl DecadeSchedule {
    pub fn empty() -> Self {
        Self {
            strategy: None,
            start_age: 0,
            start_date: None,
            pillars: Vec::new(),
        }
    }
}

pub trait DecadeLuckStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn schedule(&self, ctx: &DecadeContext) -> Result<DecadeSchedule>;
}

/// Second-resolution onset: the remainder below one "hour" is kept as
/// minutes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChildLimitStrategy;

impl ChildLimitStrategy {
    pub fn onset(&self, ctx: &DecadeContext) -> Result<NaiveDateTime> {
        let jie = ctx.target_jie(CHILD_LIMIT)?;
        let mut seconds = (jie.at - ctx.birth).num_seconds().abs();

        let years = seconds / SECONDS_PER_YEAR;
        seconds %= SECONDS_PER_YEAR;
        let months = seconds / SECONDS_PER_MONTH;
        seconds %= SECONDS_PER_MONTH;
        let days = seconds / SECONDS_PER_DAY;
        seconds %= SECONDS_PER_DAY;
        let hours = seconds / SECONDS_PER_HOUR;
        seconds %= SECONDS_PER_HOUR;
        let minutes = seconds * 2;

        advance(ctx.birth, years * 12 + months, days, hours, minutes, CHILD_LIMIT)
    }
}

impl DecadeLuckStrategy for ChildLimitStrategy {
    fn name(&self) -> &'static str {
        CHILD_LIMIT
    }

    fn schedule(&self, ctx: &DecadeContext) -> Result<DecadeSchedule> {
        let onset = self.onset(ctx)?;
        let start_age = virtual_age(ctx.birth.year(), onset.year(), CHILD_LIMIT)?;
        Ok(build_schedule(ctx, CHILD_LIMIT, start_age, onset.date()))
    }
}

/// Day and double-hour resolution onset: whole days between the two dates
/// plus the difference of their branch slots.
#[derive(Debug, Default, Clone, Copy)]
pub struct YunStrategy;

impl YunStrategy {
    pub fn onset(&self, ctx: &DecadeContext) -> Result<NaiveDate> {
        let jie = ctx.target_jie(YUN)?;
        let (start, end) = if ctx.is_forward() {
            (ctx.birth, jie.at)
        } else {
            (jie.at, ctx.birth)
        };

        let mut day_diff = (end.date() - start.date()).num_days();
        let mut hour_diff = slot_of(&end) - slot_of(&start);
        if hour_diff < 0 {
            hour_diff += 12;
            day_diff -= 1;
        }

        let month_diff = hour_diff * 10 / 30;
        let total_months = day_diff * 4 + month_diff;
        let days = hour_diff * 10 - month_diff * 30;

        let onset = advance(ctx.birth, total_months, days, 0, 0, YUN)?;
        Ok(onset.date())
    }
}

impl DecadeLuckStrategy for YunStrategy {
    fn name(&self) -> &'static str {
        YUN
    }

    fn schedule(&self, ctx: &DecadeContext) -> Result<DecadeSchedule> {
        let onset = self.onset(ctx)?;
        let start_age = virtual_age(ctx.birth.year(), onset.year(), YUN)?;
        Ok(build_schedule(ctx, YUN, start_age, onset))
    }
}

/// Branch slot as the yun reckoning counts it: 23:00 stays in the last slot.
fn slot_of(instant: &NaiveDateTime) -> i64 {
    match instant.hour() {
        23 => 11,
        0 => 0,
        h => ((h + 1) / 2) as i64,
    }
}

/// Months move the civil month, then the day count is added to the birth
/// day and any overflow rolls through the following months one month length
/// at a time. Hours and minutes carry into the day first.
fn advance(
    instant: NaiveDateTime,
    months: i64,
    days: i64,
    hours: i64,
    minutes: i64,
    strategy: &str,
) -> Result<NaiveDateTime> {
    let out_of_range =
        || ChartError::provider(strategy, format!("onset offset of {} months out of range", months));

    let mut minute = i64::from(instant.minute()) + minutes;
    let mut hour = i64::from(instant.hour()) + hours + minute.div_euclid(60);
    minute = minute.rem_euclid(60);
    let mut day = i64::from(instant.day()) + days + hour.div_euclid(24);
    hour = hour.rem_euclid(24);

    let mut month_index = i64::from(instant.year()) * 12 + i64::from(instant.month0()) + months;
    let mut length = days_in_month(month_index).ok_or_else(out_of_range)?;
    while day > length {
        day -= length;
        month_index += 1;
        length = days_in_month(month_index).ok_or_else(out_of_range)?;
    }

    let (year, month) = split_month_index(month_index).ok_or_else(out_of_range)?;
    u32::try_from(day)
        .ok()
        .and_then(|d| NaiveDate::from_ymd_opt(year, month, d))
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, instant.second()))
        .ok_or_else(out_of_range)
}

fn split_month_index(index: i64) -> Option<(i32, u32)> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    Some((year, index.rem_euclid(12) as u32 + 1))
}

fn days_in_month(index: i64) -> Option<i64> {
    let (year, month) = split_month_index(index)?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some((next - first).num_days())
}

fn virtual_age(birth_year: i32, onset_year: i32, strategy: &str) -> Result<u32> {
    u32::try_from(onset_year - birth_year + 1)
        .map_err(|_| ChartError::provider(strategy, "onset precedes birth"))
}

/// Pillars step from the month pillar, one per decade, until the start age
/// passes the cap or enough decades exist.
fn build_schedule(
    ctx: &DecadeContext,
    strategy: &str,
    start_age: u32,
    start_date: NaiveDate,
) -> DecadeSchedule {
    let step: i64 = if ctx.is_forward() { 1 } else { -1 };
    let day_master = ctx.pillars.day.stem;

    let pillars = (0..ctx.max_decades)
        .map(|i| (i, start_age + 10 * i as u32))
        .take_while(|&(_, age)| age <= ctx.max_start_age)
        .map(|(i, age)| {
            let pair = ctx.pillars.month.next(step * (i as i64 + 1));
            let start_year = ctx.birth.year() + age as i32 - 1;
            bazi::build_decade_pillar(day_master, pair, age, start_year)
        })
        .collect();

    DecadeSchedule {
        strategy: Some(strategy.to_string()),
        start_age,
        start_date: Some(start_date),
        pillars,
    }
}

/// Result of running the strategies in order.
#[derive(Debug, Clone)]
pub struct DecadeResolution {
    pub schedule: DecadeSchedule,
    pub degradations: Vec<String>,
}

/// 先用主算法，失敗或無結果再換備援；全部失敗則回傳空序列。
pub fn resolve_schedule(
    strategies: &[&dyn DecadeLuckStrategy],
    ctx: &DecadeContext,
) -> DecadeResolution {
    let mut degradations = Vec::new();

    for strategy in strategies {
        match strategy.schedule(ctx) {
            Ok(schedule) if !schedule.pillars.is_empty() => {
                tracing::debug!(
                    "Decade luck from {} strategy, onset age {}",
                    strategy.name(),
                    schedule.start_age
                );
                return DecadeResolution {
                    schedule,
                    degradations,
                };
            }
            Ok(_) => {
                tracing::warn!("{} strategy produced no decades, trying next", strategy.name());
                degradations.push(format!("{} strategy produced no decades", strategy.name()));
            }
            Err(e) => {
                tracing::warn!("{} strategy failed, trying next: {}", strategy.name(), e);
                degradations.push(format!("{} strategy failed: {}", strategy.name(), e));
            }
        }
    }

    tracing::warn!("No decade luck strategy succeeded, leaving the sequence empty");
    DecadeResolution {
        schedule: DecadeSchedule::empty(),
        degradations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ganzhi::StemBranch;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn term(name: &str, at: NaiveDateTime) -> SolarTerm {
        SolarTerm {
            name: name.to_string(),
            at,
        }
    }

    fn context(gender: Gender) -> DecadeContext {
        DecadeContext {
            birth: dt(1990, 1, 1, 12, 0),
            gender,
            pillars: FourPillars {
                year: StemBranch::parse("己巳").unwrap(),
                month: StemBranch::parse("丙子").unwrap(),
                day: StemBranch::parse("丙寅").unwrap(),
                hour: StemBranch::parse("甲午").unwrap(),
            },
            prev_jie: Some(term("大雪", dt(1989, 12, 7, 11, 21))),
            next_jie: Some(term("小寒", dt(1990, 1, 5, 22, 33))),
            max_decades: 10,
            max_start_age: 110,
        }
    }

    struct Failing;

    impl DecadeLuckStrategy for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn schedule(&self, _ctx: &DecadeContext) -> Result<DecadeSchedule> {
            Err(ChartError::provider("failing", "boom"))
        }
    }

    #[test]
    fn test_direction_follows_year_polarity_and_gender() {
        assert!(!context(Gender::Male).is_forward());
        assert!(context(Gender::Female).is_forward());
    }

    #[test]
    fn test_child_limit_onset() {
        let onset = ChildLimitStrategy.onset(&context(Gender::Male)).unwrap();
        assert_eq!(onset, dt(1998, 5, 4, 18, 0));
    }

    #[test]
    fn test_child_limit_onset_rolls_day_overflow_into_next_month() {
        let mut ctx = context(Gender::Female);
        ctx.birth = dt(1990, 1, 31, 12, 0);
        ctx.next_jie = Some(term("立春", dt(1990, 2, 4, 10, 14)));
        // 1y 3m 21d 4h: April has 30 days, so day 52 rolls to May 22
        let onset = ChildLimitStrategy.onset(&ctx).unwrap();
        assert_eq!(onset, dt(1991, 5, 22, 16, 0));
    }

    #[test]
    fn test_advance_carries_hours_into_day() {
        let end = advance(dt(1990, 2, 27, 20, 50), 0, 1, 3, 20, CHILD_LIMIT).unwrap();
        assert_eq!(end, dt(1990, 3, 1, 0, 10));
        let end = advance(dt(1990, 1, 31, 0, 0), 1, 0, 0, 0, YUN).unwrap();
        assert_eq!(end, dt(1990, 3, 3, 0, 0));
    }

    #[test]
    fn test_yun_onset() {
        let onset = YunStrategy.onset(&context(Gender::Male)).unwrap();
        assert_eq!(onset, NaiveDate::from_ymd_opt(1998, 5, 1).unwrap());
    }

    #[test]
    fn test_strategies_agree_on_sequence() {
        for gender in [Gender::Male, Gender::Female] {
            let ctx = context(gender);
            let primary = ChildLimitStrategy.schedule(&ctx).unwrap();
            let fallback = YunStrategy.schedule(&ctx).unwrap();
            assert_eq!(primary.start_age, fallback.start_age);
            assert_eq!(primary.pillars, fallback.pillars);
        }
    }

    #[test]
    fn test_backward_sequence_for_male() {
        let schedule = ChildLimitStrategy.schedule(&context(Gender::Male)).unwrap();
        assert_eq!(schedule.start_age, 9);
        assert_eq!(schedule.pillars.len(), 10);
        assert_eq!(schedule.pillars[0].pair.to_string(), "乙亥");
        assert_eq!(schedule.pillars[0].start_year, 1998);
        assert_eq!(schedule.pillars[1].pair.to_string(), "甲戌");
        assert!(schedule
            .pillars
            .windows(2)
            .all(|w| w[0].start_age < w[1].start_age));
    }

    #[test]
    fn test_forward_sequence_for_female() {
        let schedule = ChildLimitStrategy.schedule(&context(Gender::Female)).unwrap();
        // 4 days 10h33m to 小寒
        assert_eq!(schedule.start_age, 2);
        assert_eq!(schedule.pillars[0].pair.to_string(), "丁丑");
    }

    #[test]
    fn test_age_cap_truncates_sequence() {
        let mut ctx = context(Gender::Male);
        ctx.max_start_age = 40;
        let schedule = YunStrategy.schedule(&ctx).unwrap();
        let ages: Vec<u32> = schedule.pillars.iter().map(|p| p.start_age).collect();
        assert_eq!(ages, vec![9, 19, 29, 39]);
    }

    #[test]
    fn test_falls_back_then_degrades_to_empty() {
        let ctx = context(Gender::Male);
        let strategies: [&dyn DecadeLuckStrategy; 2] = [&Failing, &YunStrategy];
        let resolved = resolve_schedule(&strategies, &ctx);
        assert_eq!(resolved.schedule.strategy.as_deref(), Some(YUN));
        assert_eq!(resolved.degradations.len(), 1);

        let mut missing = ctx.clone();
        missing.prev_jie = None;
        let strategies: [&dyn DecadeLuckStrategy; 2] = [&ChildLimitStrategy, &YunStrategy];
        let resolved = resolve_schedule(&strategies, &missing);
        assert!(resolved.schedule.pillars.is_empty());
        assert!(resolved.schedule.strategy.is_none());
        assert_eq!(resolved.degradations.len(), 2);
    }
}
