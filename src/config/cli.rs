use crate::domain::model::{BirthDate, BirthSpec, Gender, LunarDate};
use crate::utils::error::{ChartError, Result};
use crate::utils::validation::{parse_date, validate_range, Validate};
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "ziwei-bazi")]
#[command(about = "Zi Wei Dou Shu and BaZi chart calculator")]
pub struct CliConfig {
    /// Birth date, YYYY-MM-DD (lunar year-month-day with --lunar)
    #[arg(long)]
    pub date: String,

    #[arg(long, default_value = "12")]
    pub hour: u32,

    #[arg(long, default_value = "0")]
    pub minute: u32,

    #[arg(long, default_value = "120.0", allow_negative_numbers = true)]
    pub longitude: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// male / female (男 / 女)
    #[arg(long, default_value = "male")]
    pub gender: String,

    #[arg(long, help = "Interpret --date as a lunar date")]
    pub lunar: bool,

    #[arg(long, help = "The lunar month is a leap month (requires --lunar)")]
    pub leap: bool,

    /// Focus date for the yearly/monthly overlays, YYYY-MM-DD
    #[arg(long)]
    pub focus_date: Option<String>,

    #[arg(long, help = "Chart snapshot (JSON); overrides [oracle].snapshot")]
    pub snapshot: Option<String>,

    #[arg(long, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Request an AI narrative analysis of the chart")]
    pub analyze: bool,

    #[arg(long, help = "Print the chart as JSON instead of the text report")]
    pub json: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

pub fn parse_gender(value: &str) -> Result<Gender> {
    match value.trim().to_lowercase().as_str() {
        "male" | "m" | "男" => Ok(Gender::Male),
        "female" | "f" | "女" => Ok(Gender::Female),
        other => Err(ChartError::invalid("gender", other, "Expected male or female")),
    }
}

/// `1989-12-5`
fn parse_lunar(value: &str, is_leap: bool) -> Result<LunarDate> {
    let parts: Vec<&str> = value.trim().split('-').collect();
    let number = |i: usize| -> Result<i64> {
        parts
            .get(i)
            .and_then(|p| p.parse::<i64>().ok())
            .ok_or_else(|| ChartError::invalid("date", value, "Expected lunar YYYY-MM-DD"))
    };
    if parts.len() != 3 {
        return Err(ChartError::invalid("date", value, "Expected lunar YYYY-MM-DD"));
    }

    let year = i32::try_from(number(0)?)
        .map_err(|_| ChartError::invalid("lunar_year", parts[0], "Year is out of range"))?;
    let month = number(1)?;
    let day = number(2)?;
    validate_range("lunar_month", month, 1, 12)?;
    validate_range("lunar_day", day, 1, 30)?;
    Ok(LunarDate {
        year,
        month: month as u32,
        day: day as u32,
        is_leap,
    })
}

impl CliConfig {
    pub fn birth_spec(&self) -> Result<BirthSpec> {
        let date = if self.lunar {
            BirthDate::Lunar {
                date: parse_lunar(&self.date, self.leap)?,
            }
        } else {
            BirthDate::Solar {
                date: parse_date("date", &self.date)?,
            }
        };

        let spec = BirthSpec {
            date,
            hour: self.hour,
            minute: self.minute,
            longitude: self.longitude,
            latitude: self.latitude,
            gender: parse_gender(&self.gender)?,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn focus(&self) -> Result<Option<NaiveDate>> {
        self.focus_date
            .as_deref()
            .map(|d| parse_date("focus_date", d))
            .transpose()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.leap && !self.lunar {
            return Err(ChartError::invalid("leap", true, "--leap requires --lunar"));
        }
        self.birth_spec()?;
        self.focus()?;
        Ok(())
    }
}
