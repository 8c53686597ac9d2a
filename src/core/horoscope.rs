//! 流年、流月投影：流運命宮定位、十二宮重新命名、流曜與四化。

use crate::core::mutagen;
use crate::domain::ganzhi::{Branch, Stem};
use crate::domain::model::{FlowLayer, Horoscope, MonthWindow, Palace, StarTier};
use crate::domain::raw::{RawFlowLayer, RawHoroscope};
use crate::utils::error::{ChartError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const PALACE_NAMES: [&str; 12] = [
    "命宫", "兄弟", "夫妻", "子女", "财帛", "疾厄", "迁移", "仆役", "官禄", "田宅", "福德", "父母",
];

const LIFE_MARKER: char = '命';

fn governing(layer: &RawFlowLayer, scope: &str) -> Result<(Stem, Branch)> {
    let stem = layer.heavenly_stem.trim().chars().next().and_then(Stem::from_char);
    let branch = layer.earthly_branch.trim().chars().next().and_then(Branch::from_char);
    match (stem, branch) {
        (Some(stem), Some(branch)) => Ok((stem, branch)),
        _ => Err(ChartError::provider(
            "star oracle",
            format!(
                "{} layer has no governing pair ('{}{}')",
                scope, layer.heavenly_stem, layer.earthly_branch
            ),
        )),
    }
}

/// Names the oracle gave, then the fixed sequence counted backwards from
/// the layer's life palace for every index still unnamed.
pub fn relabel(life_index: usize, supplied: &BTreeMap<usize, String>) -> BTreeMap<usize, String> {
    let mut names = supplied.clone();
    for (seq, name) in PALACE_NAMES.iter().enumerate() {
        let target = (life_index + 12 - seq) % 12;
        names.entry(target).or_insert_with(|| name.to_string());
    }
    names
}

pub fn project_layer(layer: &RawFlowLayer, scope: &str) -> Result<FlowLayer> {
    let (heavenly_stem, earthly_branch) = governing(layer, scope)?;

    let mut supplied = BTreeMap::new();
    let mut stars = BTreeMap::new();
    let mut life_index = None;

    for palace in &layer.palaces {
        if let Some(name) = palace.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            if name.contains(LIFE_MARKER) {
                life_index = Some(palace.index);
            }
            supplied.insert(palace.index, name.to_string());
        }
        stars.insert(
            palace.index,
            palace
                .stars
                .iter()
                .map(|s| crate::core::palace::convert_star(s, StarTier::Flow))
                .collect(),
        );
    }

    let index = life_index.or(layer.index).filter(|&i| i < 12);
    let palace_names = match index {
        Some(life) => relabel(life, &supplied),
        None => {
            tracing::warn!("{} layer has no life palace; keeping oracle names only", scope);
            supplied
        }
    };

    Ok(FlowLayer {
        index,
        heavenly_stem,
        earthly_branch,
        palace_names,
        stars,
    })
}

/// Assembles the yearly and monthly overlays with their 四化.
pub fn build_horoscope(
    raw: &RawHoroscope,
    focus: NaiveDate,
    palaces: &[Palace],
    month_window: Option<MonthWindow>,
) -> Result<Horoscope> {
    let year = project_layer(&raw.yearly, "yearly")?;
    let month = project_layer(&raw.monthly, "monthly")?;

    Ok(Horoscope {
        focus_date: focus,
        lunar_date: raw.lunar_date.clone(),
        year_mutagens: mutagen::mutagen_map(year.heavenly_stem, palaces),
        month_mutagens: mutagen::mutagen_map(month.heavenly_stem, palaces),
        year,
        month,
        month_window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::raw::{RawFlowPalace, RawStar};

    fn layer(stem: &str, branch: &str, index: Option<usize>, named: &[(usize, &str)]) -> RawFlowLayer {
        RawFlowLayer {
            index,
            heavenly_stem: stem.to_string(),
            earthly_branch: branch.to_string(),
            palaces: (0..12)
                .map(|i| RawFlowPalace {
                    index: i,
                    name: named
                        .iter()
                        .find(|(idx, _)| *idx == i)
                        .map(|(_, n)| n.to_string()),
                    stars: if i == 1 {
                        vec![RawStar {
                            name: "流禄".to_string(),
                            ..RawStar::default()
                        }]
                    } else {
                        Vec::new()
                    },
                })
                .collect(),
        }
    }

    #[test]
    fn test_life_palace_found_by_name() {
        let projected = project_layer(&layer("己", "巳", Some(9), &[(3, "流年命宫")]), "yearly").unwrap();
        assert_eq!(projected.index, Some(3));
        assert_eq!(projected.palace_names.len(), 12);
        assert_eq!(projected.palace_names[&3], "流年命宫");
        assert_eq!(projected.palace_names[&2], "兄弟");
        assert_eq!(projected.palace_names[&4], "父母");
        assert_eq!(projected.palace_names[&9], "迁移");
        assert_eq!(projected.stars[&1][0].name, "流禄");
        assert_eq!(projected.stars[&1][0].tier, StarTier::Flow);
    }

    #[test]
    fn test_falls_back_to_reported_index() {
        let projected = project_layer(&layer("丁", "丑", Some(7), &[]), "monthly").unwrap();
        assert_eq!(projected.index, Some(7));
        assert_eq!(projected.palace_names[&7], "命宫");
        assert_eq!(projected.palace_names[&6], "兄弟");
        assert_eq!(projected.palace_names[&8], "父母");
    }

    #[test]
    fn test_oracle_names_are_kept() {
        let projected =
            project_layer(&layer("丁", "丑", Some(7), &[(0, "流月财帛")]), "monthly").unwrap();
        assert_eq!(projected.palace_names[&0], "流月财帛");
        assert_eq!(projected.palace_names.len(), 12);
    }

    #[test]
    fn test_no_life_palace_keeps_supplied_names() {
        let projected = project_layer(&layer("丁", "丑", None, &[(0, "财帛")]), "monthly").unwrap();
        assert_eq!(projected.index, None);
        assert_eq!(projected.palace_names.len(), 1);
    }

    #[test]
    fn test_missing_governing_pair_is_an_error() {
        assert!(project_layer(&layer("", "", Some(1), &[]), "yearly").is_err());
    }

    #[test]
    fn test_horoscope_mutagens_follow_layer_stems() {
        let raw = RawHoroscope {
            lunar_date: "一九八九年冬月初五".to_string(),
            yearly: layer("己", "巳", None, &[(3, "命宫")]),
            monthly: layer("丁", "丑", Some(7), &[]),
        };
        let focus = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let horoscope = build_horoscope(&raw, focus, &[], None).unwrap();
        assert_eq!(horoscope.year_mutagens.prosperity.star, "武曲");
        assert_eq!(horoscope.month_mutagens.adversity.star, "巨门");
        assert!(horoscope.month_window.is_none());
    }
}
