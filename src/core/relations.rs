//! Combinations, clashes, harms and punishments between the four pillars.

use crate::domain::ganzhi::{Branch, Element, Stem};
use crate::domain::model::{FourPillars, PillarLabel, PillarRelation, RelationKind};

/// 甲己土 乙庚金 丙辛水 丁壬木 戊癸火, keyed by the lower stem index.
const STEM_COMBINATION_ELEMENT: [Element; 5] = [
    Element::Earth,
    Element::Metal,
    Element::Water,
    Element::Wood,
    Element::Fire,
];

/// 子丑土 寅亥木 卯戌火 辰酉金 巳申水 午未土, keyed by the lower branch index.
fn six_combination_element(a: Branch, b: Branch) -> Element {
    match a.index().min(b.index()) {
        0 | 6 => Element::Earth,
        2 => Element::Wood,
        3 => Element::Fire,
        4 => Element::Metal,
        _ => Element::Water,
    }
}

// Indexed by branch % 4, same grouping as the trine-keyed shen-sha tables.
const HARMONY_ELEMENT: [Element; 4] = [Element::Water, Element::Metal, Element::Fire, Element::Wood];
const HARMONY_CENTER: [Branch; 4] = [Branch::Zi, Branch::You, Branch::Wu, Branch::Mao];

const SELF_PUNISHING: [Branch; 4] = [Branch::Chen, Branch::Wu, Branch::You, Branch::Hai];

fn is_punishment(a: Branch, b: Branch) -> bool {
    use Branch::*;
    matches!(
        (a, b),
        (Zi, Mao)
            | (Mao, Zi)
            | (Yin, Si)
            | (Si, Shen)
            | (Shen, Yin)
            | (Si, Yin)
            | (Shen, Si)
            | (Yin, Shen)
            | (Chou, Xu)
            | (Xu, Wei)
            | (Wei, Chou)
            | (Xu, Chou)
            | (Wei, Xu)
            | (Chou, Wei)
    )
}

fn stem_relation(a: Stem, b: Stem) -> Option<(RelationKind, Option<Element>)> {
    let (lo, hi) = (a.index().min(b.index()), a.index().max(b.index()));
    match hi - lo {
        5 => Some((
            RelationKind::StemCombination,
            Some(STEM_COMBINATION_ELEMENT[lo]),
        )),
        // 戊己 sit in the centre and clash with nothing
        6 => Some((RelationKind::StemClash, None)),
        _ => None,
    }
}

fn branch_relations(a: Branch, b: Branch) -> Vec<(RelationKind, Option<Element>)> {
    let (x, y) = (a.index(), b.index());
    let mut found = Vec::new();
    if (x + y) % 12 == 1 {
        found.push((RelationKind::SixCombination, Some(six_combination_element(a, b))));
    }
    if (x + 12 - y) % 12 == 6 {
        found.push((RelationKind::SixClash, None));
    }
    if (x + y) % 12 == 7 {
        found.push((RelationKind::SixHarm, None));
    }
    if a == b && SELF_PUNISHING.contains(&a) {
        found.push((RelationKind::SelfPunishment, None));
    } else if is_punishment(a, b) {
        found.push((RelationKind::Punishment, None));
    }
    found
}

/// Pairwise stem and branch relations plus three-harmony groups, ordered by
/// pillar position.
pub fn pillar_relations(pillars: &FourPillars) -> Vec<PillarRelation> {
    let mut relations = Vec::new();

    for (i, &first) in PillarLabel::ALL.iter().enumerate() {
        for &second in &PillarLabel::ALL[i + 1..] {
            let (p, q) = (pillars.get(first), pillars.get(second));

            if let Some((kind, element)) = stem_relation(p.stem, q.stem) {
                relations.push(PillarRelation {
                    kind,
                    pillars: vec![first, second],
                    chars: format!("{}{}", p.stem, q.stem),
                    element,
                });
            }
            for (kind, element) in branch_relations(p.branch, q.branch) {
                relations.push(PillarRelation {
                    kind,
                    pillars: vec![first, second],
                    chars: format!("{}{}", p.branch, q.branch),
                    element,
                });
            }
        }
    }

    for group in 0..4 {
        let members: Vec<PillarLabel> = PillarLabel::ALL
            .iter()
            .copied()
            .filter(|&label| pillars.get(label).branch.index() % 4 == group)
            .collect();
        let mut distinct: Vec<Branch> = members.iter().map(|&l| pillars.get(l).branch).collect();
        distinct.sort();
        distinct.dedup();

        let kind = match distinct.len() {
            3 => RelationKind::ThreeHarmony,
            2 if distinct.contains(&HARMONY_CENTER[group]) => RelationKind::HalfHarmony,
            _ => continue,
        };
        relations.push(PillarRelation {
            kind,
            pillars: members,
            chars: distinct.iter().map(|b| b.as_char()).collect(),
            element: Some(HARMONY_ELEMENT[group]),
        });
    }

    relations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ganzhi::StemBranch;

    fn pillars(y: &str, m: &str, d: &str, h: &str) -> FourPillars {
        FourPillars {
            year: StemBranch::parse(y).unwrap(),
            month: StemBranch::parse(m).unwrap(),
            day: StemBranch::parse(d).unwrap(),
            hour: StemBranch::parse(h).unwrap(),
        }
    }

    #[test]
    fn test_relations_of_1990_new_year_chart() {
        let found = pillar_relations(&pillars("己巳", "丙子", "丙寅", "甲午"));
        let has = |kind: RelationKind, chars: &str| {
            found.iter().any(|r| r.kind == kind && r.chars == chars)
        };
        // 甲己 combine into earth across year and hour
        assert!(has(RelationKind::StemCombination, "己甲"));
        assert!(has(RelationKind::SixClash, "子午"));
        assert!(has(RelationKind::SixHarm, "巳寅"));
        assert!(has(RelationKind::Punishment, "巳寅"));
        // 寅午 without 戌 forms a half harmony around 午
        assert!(has(RelationKind::HalfHarmony, "寅午"));

        let earth = found
            .iter()
            .find(|r| r.kind == RelationKind::StemCombination)
            .unwrap();
        assert_eq!(earth.element, Some(Element::Earth));
        assert_eq!(earth.pillars, vec![PillarLabel::Year, PillarLabel::Hour]);
    }

    #[test]
    fn test_complete_three_harmony_and_self_punishment() {
        let found = pillar_relations(&pillars("甲申", "丙子", "戊辰", "壬辰"));
        let water = found
            .iter()
            .find(|r| r.kind == RelationKind::ThreeHarmony)
            .unwrap();
        assert_eq!(water.element, Some(Element::Water));
        assert_eq!(water.pillars.len(), 4);
        assert!(found
            .iter()
            .any(|r| r.kind == RelationKind::SelfPunishment && r.chars == "辰辰"));
    }

    #[test]
    fn test_earth_stems_do_not_clash() {
        assert!(stem_relation(Stem::Wu, Stem::Jia).is_none());
        assert_eq!(
            stem_relation(Stem::Jia, Stem::Geng).map(|r| r.0),
            Some(RelationKind::StemClash)
        );
    }
}
