//! 本命十二宮正規化：把星盤來源的原始宮位轉成領域模型，並補上煞星、
//! 四化、空宮借星與三方四正。

use crate::domain::ganzhi::{Branch, Stem};
use crate::domain::model::{
    BorrowedStars, DecadalRange, Mutagen, Palace, Star, StarMutagen, StarTier, Surroundings,
    TwelveStages,
};
use crate::domain::raw::{RawPalace, RawStar};
use crate::utils::error::{ChartError, Result};

pub const PALACE_COUNT: usize = 12;

/// 六煞
pub const TOUGH_STARS: [&str; 6] = ["擎羊", "陀罗", "火星", "铃星", "地空", "地劫"];

pub const BORROW_RULE: &str = "借对宫";

pub fn opposite(index: usize) -> usize {
    (index + 6) % PALACE_COUNT
}

pub fn trines(index: usize) -> [usize; 2] {
    [(index + 4) % PALACE_COUNT, (index + 8) % PALACE_COUNT]
}

/// Self, opposite, then both trines.
pub fn four_rectification(index: usize) -> [usize; 4] {
    let [a, b] = trines(index);
    [index, opposite(index), a, b]
}

pub fn is_tough_star(name: &str) -> bool {
    TOUGH_STARS.contains(&name)
}

fn non_empty(text: &Option<String>) -> Option<String> {
    text.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn convert_star(raw: &RawStar, tier: StarTier) -> Star {
    Star {
        name: raw.name.trim().to_string(),
        tier,
        brightness: non_empty(&raw.brightness),
        mutagen: raw.mutagen.as_deref().and_then(Mutagen::parse),
        scope: non_empty(&raw.scope),
    }
}

fn convert_stars(raw: &[RawStar], tier: StarTier) -> Vec<Star> {
    raw.iter().map(|s| convert_star(s, tier)).collect()
}

fn parse_stem(field: &str, text: &str) -> Result<Stem> {
    text.trim()
        .chars()
        .next()
        .and_then(Stem::from_char)
        .ok_or_else(|| ChartError::provider("star oracle", format!("{} '{}' is not a heavenly stem", field, text)))
}

fn parse_branch(field: &str, text: &str) -> Result<Branch> {
    text.trim()
        .chars()
        .next()
        .and_then(Branch::from_char)
        .ok_or_else(|| ChartError::provider("star oracle", format!("{} '{}' is not an earthly branch", field, text)))
}

/// The raw set must hold exactly one palace per index 0..12.
fn check_indices(raw: &[RawPalace]) -> Result<()> {
    let mut seen = [false; PALACE_COUNT];
    for palace in raw {
        match seen.get_mut(palace.index) {
            Some(slot) if !*slot => *slot = true,
            Some(_) => {
                return Err(ChartError::provider(
                    "star oracle",
                    format!("palace index {} appears more than once", palace.index),
                ))
            }
            None => {
                return Err(ChartError::provider(
                    "star oracle",
                    format!("palace index {} is outside 0-11", palace.index),
                ))
            }
        }
    }
    if raw.len() != PALACE_COUNT {
        return Err(ChartError::provider(
            "star oracle",
            format!("expected {} palaces, got {}", PALACE_COUNT, raw.len()),
        ));
    }
    Ok(())
}

fn base_palace(raw: &RawPalace) -> Result<Palace> {
    let major_stars = convert_stars(&raw.major_stars, StarTier::Major);
    let minor_stars = convert_stars(&raw.minor_stars, StarTier::Minor);
    let adjective_stars = convert_stars(&raw.adjective_stars, StarTier::Adjective);

    let tough_stars: Vec<Star> = major_stars
        .iter()
        .chain(&minor_stars)
        .chain(&adjective_stars)
        .filter(|s| is_tough_star(&s.name))
        .cloned()
        .collect();

    let mutagens = major_stars
        .iter()
        .chain(&minor_stars)
        .chain(&adjective_stars)
        .filter_map(|s| {
            s.mutagen.map(|mutagen| StarMutagen {
                star: s.name.clone(),
                mutagen,
            })
        })
        .collect();

    let [start_age, end_age] = raw.decadal.range;
    let name = raw.name.trim().to_string();

    Ok(Palace {
        index: raw.index,
        is_life_palace: name.contains('命'),
        name,
        heavenly_stem: parse_stem("heavenlyStem", &raw.heavenly_stem)?,
        earthly_branch: parse_branch("earthlyBranch", &raw.earthly_branch)?,
        is_empty: major_stars.is_empty(),
        major_stars,
        minor_stars,
        adjective_stars,
        tough_stars,
        mutagens,
        decadal: DecadalRange {
            start_age,
            end_age,
            range: format!("{}-{}", start_age, end_age),
            heavenly_stem: raw.decadal.heavenly_stem.chars().next().and_then(Stem::from_char),
            earthly_branch: raw.decadal.earthly_branch.chars().next().and_then(Branch::from_char),
        },
        is_body_palace: raw.is_body_palace,
        is_original_palace: raw.is_original_palace,
        stages: TwelveStages {
            changsheng: raw.changsheng12.clone(),
            boshi: raw.boshi12.clone(),
            suiqian: raw.suiqian12.clone(),
            jiangqian: raw.jiangqian12.clone(),
        },
        ages: raw.ages.clone(),
        borrowed: None,
        surroundings: Surroundings {
            target: raw.index,
            opposite: opposite(raw.index),
            trines: trines(raw.index),
            four_rectification: four_rectification(raw.index),
            major_stars: Vec::new(),
            mutagens: Vec::new(),
        },
    })
}

fn surroundings(index: usize, palaces: &[Palace]) -> Surroundings {
    let members = four_rectification(index);
    let mut major_stars: Vec<String> = Vec::new();
    let mut mutagens: Vec<StarMutagen> = Vec::new();

    for &member in &members {
        let palace = &palaces[member];
        for star in &palace.major_stars {
            if !major_stars.contains(&star.name) {
                major_stars.push(star.name.clone());
            }
        }
        for tagged in &palace.mutagens {
            if !mutagens.contains(tagged) {
                mutagens.push(tagged.clone());
            }
        }
    }

    Surroundings {
        target: index,
        opposite: opposite(index),
        trines: trines(index),
        four_rectification: members,
        major_stars,
        mutagens,
    }
}

/// Normalizes the oracle's twelve palaces. The output is ordered by index
/// and depends only on the set of raw palaces, so input order and repeated
/// runs do not change it.
pub fn normalize_palaces(raw: &[RawPalace]) -> Result<Vec<Palace>> {
    check_indices(raw)?;

    let mut sorted: Vec<&RawPalace> = raw.iter().collect();
    sorted.sort_by_key(|p| p.index);

    let base = sorted
        .into_iter()
        .map(base_palace)
        .collect::<Result<Vec<Palace>>>()?;

    let palaces = base
        .iter()
        .map(|palace| {
            let mut palace = palace.clone();
            if palace.is_empty {
                let from = opposite(palace.index);
                palace.borrowed = Some(BorrowedStars {
                    from_index: from,
                    rule: BORROW_RULE.to_string(),
                    stars: base[from].major_stars.clone(),
                });
            }
            palace.surroundings = surroundings(palace.index, &base);
            palace
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        "Normalized {} palaces ({} empty)",
        palaces.len(),
        palaces.iter().filter(|p| p.is_empty).count()
    );
    Ok(palaces)
}
