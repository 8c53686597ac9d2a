//! 八字排盤：四柱、五行統計、日主強弱與大運柱的組裝。

use crate::core::lexicon::{self, ShenShaQuery};
use crate::core::relations;
use crate::domain::ganzhi::{Branch, Element, Stem, StemBranch};
use crate::domain::model::{
    BaziChart, BranchInfo, DayMasterStrength, DecadeLuckPillar, ElementCount, FiveElementTally,
    FourPillars, HiddenStem, Pillar, PillarLabel, StemInfo, StrengthLevel,
};

/// Label carried by every strength verdict this module produces.
pub const STRENGTH_METHOD: &str = "简化平衡估算 (simplified balance heuristic)";

const STRENGTH_MARGIN: i64 = 2;

pub fn stem_info(day_master: Stem, stem: Stem, is_day_master: bool) -> StemInfo {
    StemInfo {
        stem,
        element: lexicon::stem_element(stem),
        ten_god: (!is_day_master).then(|| lexicon::ten_god(day_master, stem)),
        is_day_master,
    }
}

pub fn branch_info(day_master: Stem, branch: Branch) -> BranchInfo {
    BranchInfo {
        branch,
        element: lexicon::branch_element(branch),
        hidden: lexicon::hidden_stems(branch)
            .iter()
            .map(|&stem| HiddenStem {
                stem,
                element: lexicon::stem_element(stem),
                ten_god: lexicon::ten_god(day_master, stem),
            })
            .collect(),
    }
}

/// 組裝單一柱。十神一律以日干為參照，日柱天干本身即日主。
pub fn build_pillar(label: PillarLabel, pillars: &FourPillars) -> Pillar {
    let pair = pillars.get(label);
    let day_master = pillars.day.stem;

    let query = ShenShaQuery {
        day_stem: day_master,
        day_branch: pillars.day.branch,
        year_branch: pillars.year.branch,
        target: pair.branch,
    };

    Pillar {
        label,
        pair,
        stem: stem_info(day_master, pair.stem, label == PillarLabel::Day),
        branch: branch_info(day_master, pair.branch),
        na_yin: lexicon::na_yin(pair).to_string(),
        xun: lexicon::xun_label(pair),
        kong_wang: lexicon::kong_wang_label(pair),
        life_stage: lexicon::life_stage(day_master, pair.branch),
        shen_sha: lexicon::shen_sha(&query),
    }
}

/// 統計天干、地支、藏干的五行數量，total 為三者合計。
pub fn tally_elements(pillars: &FourPillars) -> FiveElementTally {
    let mut tally = FiveElementTally::default();

    for label in PillarLabel::ALL {
        let pair = pillars.get(label);
        tally.stems.add(lexicon::stem_element(pair.stem));
        tally.branches.add(lexicon::branch_element(pair.branch));
        for &hidden in lexicon::hidden_stems(pair.branch) {
            tally.hidden.add(lexicon::stem_element(hidden));
        }
    }

    tally.total = tally.stems.merged(&tally.branches).merged(&tally.hidden);
    tally
}

/// 日主強弱的簡化估算：生扶（比劫 + 印）對比耗洩剋（食傷 + 官殺）。
/// 用神與格局不在此判斷，保持為 None。
pub fn assess_strength(day_master: Element, counts: &ElementCount) -> DayMasterStrength {
    let supportive = counts.get(day_master) + counts.get(day_master.generated_by());
    let opposing = counts.get(day_master.generates()) + counts.get(day_master.controlled_by());
    let diff = supportive as i64 - opposing as i64;

    let level = if diff >= STRENGTH_MARGIN {
        StrengthLevel::Strong
    } else if diff <= -STRENGTH_MARGIN {
        StrengthLevel::Weak
    } else {
        StrengthLevel::Balanced
    };

    let draining = vec![day_master.generates(), day_master.controlled_by()];
    let supporting = vec![day_master, day_master.generated_by()];
    let (favorable, unfavorable) = match level {
        StrengthLevel::Strong => (draining, supporting),
        StrengthLevel::Weak => (supporting, draining),
        StrengthLevel::Balanced => (Vec::new(), Vec::new()),
    };

    DayMasterStrength {
        level,
        supportive,
        opposing,
        favorable,
        unfavorable,
        method: STRENGTH_METHOD.to_string(),
        useful_god: None,
        pattern: None,
    }
}

/// 大運柱，與四柱相同的十神與藏干標註。
pub fn build_decade_pillar(
    day_master: Stem,
    pair: StemBranch,
    start_age: u32,
    start_year: i32,
) -> DecadeLuckPillar {
    DecadeLuckPillar {
        start_age,
        end_age: start_age + 9,
        start_year,
        end_year: start_year + 9,
        pair,
        stem: stem_info(day_master, pair.stem, false),
        branch: branch_info(day_master, pair.branch),
    }
}

pub fn build_chart(
    pillars: &FourPillars,
    da_yun: Vec<DecadeLuckPillar>,
    start_yun_age: u32,
    start_yun_date: Option<chrono::NaiveDate>,
) -> BaziChart {
    let day_master = pillars.day.stem;
    let day_master_element = lexicon::stem_element(day_master);
    let tally = tally_elements(pillars);

    BaziChart {
        pillars: PillarLabel::ALL
            .iter()
            .map(|&label| build_pillar(label, pillars))
            .collect(),
        day_master,
        day_master_element,
        strength: assess_strength(day_master_element, &tally.total),
        tally,
        relations: relations::pillar_relations(pillars),
        da_yun,
        start_yun_age,
        start_yun_date,
    }
}
