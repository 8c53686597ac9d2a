//! 四化：天干對應的化祿、化權、化科、化忌星，以及各星目前所在宮位。

use crate::domain::ganzhi::Stem;
use crate::domain::model::{DecadeLuckPillar, DecadeMutagen, Mutagen, MutagenMap, MutagenSlot, Palace};

/// 祿、權、科、忌 per heavenly stem.
const SI_HUA: [[&str; 4]; 10] = [
    ["廉贞", "破军", "武曲", "太阳"], // 甲
    ["天机", "天梁", "紫微", "太阴"], // 乙
    ["天同", "天机", "文昌", "廉贞"], // 丙
    ["太阴", "天同", "天机", "巨门"], // 丁
    ["贪狼", "太阴", "右弼", "天机"], // 戊
    ["武曲", "贪狼", "天梁", "文曲"], // 己
    ["太阳", "武曲", "太阴", "天同"], // 庚
    ["巨门", "太阳", "文曲", "文昌"], // 辛
    ["天梁", "紫微", "左辅", "武曲"], // 壬
    ["破军", "巨门", "太阴", "贪狼"], // 癸
];

pub fn transformed_stars(stem: Stem) -> [&'static str; 4] {
    SI_HUA[stem.index()]
}

pub fn transformed_star(stem: Stem, mutagen: Mutagen) -> &'static str {
    SI_HUA[stem.index()][mutagen as usize]
}

/// Every palace holding `star` in any tier, tough stars included.
pub fn palaces_holding(star: &str, palaces: &[Palace]) -> Vec<usize> {
    palaces
        .iter()
        .filter(|p| p.has_star(star))
        .map(|p| p.index)
        .collect()
}

pub fn mutagen_map(stem: Stem, palaces: &[Palace]) -> MutagenMap {
    let slot = |mutagen: Mutagen| {
        let star = transformed_star(stem, mutagen);
        MutagenSlot {
            mutagen,
            star: star.to_string(),
            palaces: palaces_holding(star, palaces),
        }
    };

    MutagenMap {
        stem,
        prosperity: slot(Mutagen::Prosperity),
        authority: slot(Mutagen::Authority),
        merit: slot(Mutagen::Merit),
        adversity: slot(Mutagen::Adversity),
    }
}

/// One map per decade, keyed by its age range. `current_age` is the virtual
/// age at the focus date.
pub fn decade_mutagens(
    da_yun: &[DecadeLuckPillar],
    palaces: &[Palace],
    current_age: Option<u32>,
) -> Vec<DecadeMutagen> {
    da_yun
        .iter()
        .map(|decade| DecadeMutagen {
            range: decade.range_label(),
            start_age: decade.start_age,
            end_age: decade.end_age,
            is_current: current_age
                .map(|age| (decade.start_age..=decade.end_age).contains(&age))
                .unwrap_or(false),
            map: mutagen_map(decade.pair.stem, palaces),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bazi;
    use crate::core::palace::normalize_palaces;
    use crate::domain::ganzhi::StemBranch;
    use crate::domain::raw::{RawPalace, RawStar};

    fn chart() -> Vec<Palace> {
        let majors: [&[&str]; 12] = [
            &["紫微", "天府"],
            &["太阴"],
            &["贪狼"],
            &["巨门"],
            &["廉贞", "天相"],
            &["天梁"],
            &["七杀"],
            &["天同"],
            &["武曲"],
            &["太阳"],
            &["破军"],
            &["天机"],
        ];
        let raw: Vec<RawPalace> = majors
            .iter()
            .enumerate()
            .map(|(i, names)| RawPalace {
                index: i,
                name: format!("宫{}", i),
                heavenly_stem: "甲".to_string(),
                earthly_branch: "子".to_string(),
                major_stars: names
                    .iter()
                    .map(|n| RawStar {
                        name: n.to_string(),
                        ..RawStar::default()
                    })
                    .collect(),
                minor_stars: if i == 2 {
                    vec![RawStar {
                        name: "文昌".to_string(),
                        ..RawStar::default()
                    }]
                } else {
                    Vec::new()
                },
                ..RawPalace::default()
            })
            .collect();
        normalize_palaces(&raw).unwrap()
    }

    #[test]
    fn test_table_lookups() {
        assert_eq!(transformed_star(Stem::Jia, Mutagen::Prosperity), "廉贞");
        assert_eq!(transformed_star(Stem::Jia, Mutagen::Adversity), "太阳");
        assert_eq!(transformed_star(Stem::Yi, Mutagen::Prosperity), "天机");
        assert_eq!(transformed_star(Stem::Yi, Mutagen::Adversity), "太阴");
    }

    #[test]
    fn test_every_stem_names_four_distinct_stars() {
        for stem in Stem::ALL {
            let mut stars = transformed_stars(stem).to_vec();
            stars.sort();
            stars.dedup();
            assert_eq!(stars.len(), 4, "stem {}", stem);
        }
    }

    #[test]
    fn test_map_locates_palaces() {
        let palaces = chart();
        let map = mutagen_map(Stem::Jia, &palaces);
        assert_eq!(map.prosperity.star, "廉贞");
        assert_eq!(map.prosperity.palaces, vec![4]);
        assert_eq!(map.adversity.palaces, vec![9]);
        assert_eq!(map.mutagen_of("破军"), Some(Mutagen::Authority));

        let bing = mutagen_map(Stem::Bing, &palaces);
        // 文昌 sits among the minor stars
        assert_eq!(bing.merit.palaces, vec![2]);
    }

    #[test]
    fn test_missing_star_yields_no_palace() {
        let map = mutagen_map(Stem::Wu, &chart());
        assert_eq!(map.merit.star, "右弼");
        assert!(map.merit.palaces.is_empty());
    }

    #[test]
    fn test_decade_maps_flag_current_range() {
        let palaces = chart();
        let da_yun = vec![
            bazi::build_decade_pillar(Stem::Bing, StemBranch::parse("乙亥").unwrap(), 9, 1998),
            bazi::build_decade_pillar(Stem::Bing, StemBranch::parse("甲戌").unwrap(), 19, 2008),
        ];
        let maps = decade_mutagens(&da_yun, &palaces, Some(20));
        assert_eq!(maps[0].range, "9-18");
        assert!(!maps[0].is_current);
        assert!(maps[1].is_current);
        assert_eq!(maps[1].map.stem, Stem::Jia);

        assert!(decade_mutagens(&da_yun, &palaces, None)
            .iter()
            .all(|m| !m.is_current));
    }
}
