pub mod bazi;
pub mod calendar;
pub mod decade;
pub mod engine;
pub mod horoscope;
pub mod lexicon;
pub mod mutagen;
pub mod palace;
pub mod relations;
pub mod report;
pub mod solar_time;

pub use crate::domain::model::Astrolabe;
pub use crate::domain::ports::{LunarOracle, SolarTermOracle, StarOracle};
pub use crate::utils::error::Result;
pub use engine::{ChartEngine, EngineOptions};
