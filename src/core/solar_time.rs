//! True solar time: civil clock time shifted by the longitude offset from the
//! reference meridian, and the two-hour branch slot it falls into.

use crate::domain::model::CorrectedInstant;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// 120°E, the meridian of UTC+8.
pub const REFERENCE_MERIDIAN: f64 = 120.0;

const MINUTES_PER_DAY: f64 = 1440.0;

const TIME_LABELS: [&str; 12] = [
    "子 (Zi)", "丑 (Chou)", "寅 (Yin)", "卯 (Mao)", "辰 (Chen)", "巳 (Si)",
    "午 (Wu)", "未 (Wei)", "申 (Shen)", "酉 (You)", "戌 (Xu)", "亥 (Hai)",
];

const TIME_RANGES: [&str; 12] = [
    "23:00~01:00", "01:00~03:00", "03:00~05:00", "05:00~07:00", "07:00~09:00", "09:00~11:00",
    "11:00~13:00", "13:00~15:00", "15:00~17:00", "17:00~19:00", "19:00~21:00", "21:00~23:00",
];

/// Four minutes of clock time per degree away from the meridian.
pub fn offset_minutes(longitude: f64, meridian: f64) -> f64 {
    (longitude - meridian) * 4.0
}

/// Branch slot (0 = 子 … 11 = 亥) of the true solar time at `hour:minute`.
pub fn calculate_time_index(hour: u32, minute: u32, longitude: f64) -> usize {
    time_index_with_meridian(hour, minute, longitude, REFERENCE_MERIDIAN)
}

pub fn time_index_with_meridian(hour: u32, minute: u32, longitude: f64, meridian: f64) -> usize {
    let total = (hour * 60 + minute) as f64 + offset_minutes(longitude, meridian);
    let total = total.rem_euclid(MINUTES_PER_DAY);
    branch_of_hour(total / 60.0)
}

fn branch_of_hour(true_hour: f64) -> usize {
    if !(1.0..23.0).contains(&true_hour) {
        return 0;
    }
    if true_hour < 3.0 {
        return 1;
    }
    (((true_hour + 1.0) / 2.0).floor() as usize).min(11)
}

pub fn time_label(index: usize) -> &'static str {
    TIME_LABELS.get(index).copied().unwrap_or("")
}

pub fn time_range(index: usize) -> &'static str {
    TIME_RANGES.get(index).copied().unwrap_or("")
}

/// Shifts the civil birth instant to true solar time. The shift is applied
/// to the full datetime so day and month rollovers carry into the pillars.
pub fn correct_instant(
    date: NaiveDate,
    hour: u32,
    minute: u32,
    longitude: f64,
    meridian: f64,
) -> Option<CorrectedInstant> {
    let civil = date.and_hms_opt(hour, minute, 0)?;
    let offset = offset_minutes(longitude, meridian);
    let corrected = civil + Duration::seconds((offset * 60.0).round() as i64);
    Some(CorrectedInstant {
        civil,
        corrected,
        offset_minutes: offset,
        time_index: time_index_with_meridian(hour, minute, longitude, meridian),
    })
}

/// Branch slot of an already corrected clock reading.
pub fn branch_index_of(instant: &NaiveDateTime) -> usize {
    use chrono::Timelike;
    let minutes = instant.hour() * 60 + instant.minute();
    branch_of_hour(minutes as f64 / 60.0)
}
