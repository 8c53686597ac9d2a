//! Sexagenary vocabulary: heavenly stems, earthly branches, the sixty pairs
//! they form, and the five elements behind both.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    #[serde(rename = "木")]
    Wood,
    #[serde(rename = "火")]
    Fire,
    #[serde(rename = "土")]
    Earth,
    #[serde(rename = "金")]
    Metal,
    #[serde(rename = "水")]
    Water,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Wood,
        Element::Fire,
        Element::Earth,
        Element::Metal,
        Element::Water,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// 生: wood → fire → earth → metal → water → wood
    pub fn generates(self) -> Element {
        Self::ALL[(self.index() + 1) % 5]
    }

    /// 克: wood → earth → water → fire → metal → wood
    pub fn controls(self) -> Element {
        Self::ALL[(self.index() + 2) % 5]
    }

    pub fn generated_by(self) -> Element {
        Self::ALL[(self.index() + 4) % 5]
    }

    pub fn controlled_by(self) -> Element {
        Self::ALL[(self.index() + 3) % 5]
    }

    pub fn as_char(self) -> char {
        match self {
            Element::Wood => '木',
            Element::Fire => '火',
            Element::Earth => '土',
            Element::Metal => '金',
            Element::Water => '水',
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Yang,
    Yin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stem {
    #[serde(rename = "甲")]
    Jia,
    #[serde(rename = "乙")]
    Yi,
    #[serde(rename = "丙")]
    Bing,
    #[serde(rename = "丁")]
    Ding,
    #[serde(rename = "戊")]
    Wu,
    #[serde(rename = "己")]
    Ji,
    #[serde(rename = "庚")]
    Geng,
    #[serde(rename = "辛")]
    Xin,
    #[serde(rename = "壬")]
    Ren,
    #[serde(rename = "癸")]
    Gui,
}

const STEM_CHARS: [char; 10] = ['甲', '乙', '丙', '丁', '戊', '己', '庚', '辛', '壬', '癸'];

impl Stem {
    pub const ALL: [Stem; 10] = [
        Stem::Jia,
        Stem::Yi,
        Stem::Bing,
        Stem::Ding,
        Stem::Wu,
        Stem::Ji,
        Stem::Geng,
        Stem::Xin,
        Stem::Ren,
        Stem::Gui,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Stem {
        Self::ALL[index % 10]
    }

    pub fn from_char(c: char) -> Option<Stem> {
        STEM_CHARS.iter().position(|&s| s == c).map(Stem::from_index)
    }

    pub fn as_char(self) -> char {
        STEM_CHARS[self.index()]
    }

    pub fn polarity(self) -> Polarity {
        if self.index() % 2 == 0 {
            Polarity::Yang
        } else {
            Polarity::Yin
        }
    }

    pub fn offset(self, steps: i32) -> Stem {
        Stem::from_index((self.index() as i32 + steps).rem_euclid(10) as usize)
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Branch {
    #[serde(rename = "子")]
    Zi,
    #[serde(rename = "丑")]
    Chou,
    #[serde(rename = "寅")]
    Yin,
    #[serde(rename = "卯")]
    Mao,
    #[serde(rename = "辰")]
    Chen,
    #[serde(rename = "巳")]
    Si,
    #[serde(rename = "午")]
    Wu,
    #[serde(rename = "未")]
    Wei,
    #[serde(rename = "申")]
    Shen,
    #[serde(rename = "酉")]
    You,
    #[serde(rename = "戌")]
    Xu,
    #[serde(rename = "亥")]
    Hai,
}

const BRANCH_CHARS: [char; 12] = [
    '子', '丑', '寅', '卯', '辰', '巳', '午', '未', '申', '酉', '戌', '亥',
];

impl Branch {
    pub const ALL: [Branch; 12] = [
        Branch::Zi,
        Branch::Chou,
        Branch::Yin,
        Branch::Mao,
        Branch::Chen,
        Branch::Si,
        Branch::Wu,
        Branch::Wei,
        Branch::Shen,
        Branch::You,
        Branch::Xu,
        Branch::Hai,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Branch {
        Self::ALL[index % 12]
    }

    pub fn from_char(c: char) -> Option<Branch> {
        BRANCH_CHARS.iter().position(|&b| b == c).map(Branch::from_index)
    }

    pub fn as_char(self) -> char {
        BRANCH_CHARS[self.index()]
    }

    pub fn polarity(self) -> Polarity {
        if self.index() % 2 == 0 {
            Polarity::Yang
        } else {
            Polarity::Yin
        }
    }

    pub fn offset(self, steps: i32) -> Branch {
        Branch::from_index((self.index() as i32 + steps).rem_euclid(12) as usize)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A governing (stem, branch) pair. Only the sixty combinations of matching
/// polarity exist, so construction goes through the cycle index or a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StemBranch {
    pub stem: Stem,
    pub branch: Branch,
}

impl StemBranch {
    /// 0 = 甲子, 59 = 癸亥
    pub fn from_cycle_index(index: i64) -> StemBranch {
        let i = index.rem_euclid(60) as usize;
        StemBranch {
            stem: Stem::from_index(i % 10),
            branch: Branch::from_index(i % 12),
        }
    }

    pub fn new(stem: Stem, branch: Branch) -> Option<StemBranch> {
        if stem.polarity() == branch.polarity() {
            Some(StemBranch { stem, branch })
        } else {
            None
        }
    }

    pub fn cycle_index(self) -> usize {
        let s = self.stem.index() as i64;
        let b = self.branch.index() as i64;
        // i ≡ s (mod 10), i ≡ b (mod 12)
        (6 * s - 5 * b).rem_euclid(60) as usize
    }

    pub fn next(self, steps: i64) -> StemBranch {
        StemBranch::from_cycle_index(self.cycle_index() as i64 + steps)
    }

    /// Reads the first two characters of tokens like `己巳` or `己巳年`.
    pub fn parse(text: &str) -> Option<StemBranch> {
        let mut chars = text.trim().chars();
        let stem = Stem::from_char(chars.next()?)?;
        let branch = Branch::from_char(chars.next()?)?;
        StemBranch::new(stem, branch)
    }

    /// The stem opening the ten-day segment (旬) this pair belongs to.
    pub fn xun_head(self) -> StemBranch {
        let i = self.cycle_index();
        StemBranch::from_cycle_index((i - i % 10) as i64)
    }
}

impl fmt::Display for StemBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stem, self.branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_index_round_trips_known_pairs() {
        assert_eq!(StemBranch::parse("甲子").unwrap().cycle_index(), 0);
        assert_eq!(StemBranch::parse("戊午").unwrap().cycle_index(), 54);
        assert_eq!(StemBranch::parse("癸亥").unwrap().cycle_index(), 59);
        assert_eq!(StemBranch::from_cycle_index(5).to_string(), "己巳");
    }

    #[test]
    fn test_parse_rejects_mismatched_polarity() {
        assert!(StemBranch::parse("甲丑").is_none());
        assert!(StemBranch::parse("乙").is_none());
        assert_eq!(StemBranch::parse("丙寅日").unwrap().to_string(), "丙寅");
    }

    #[test]
    fn test_next_wraps_both_directions() {
        let jia_zi = StemBranch::from_cycle_index(0);
        assert_eq!(jia_zi.next(-1).to_string(), "癸亥");
        assert_eq!(jia_zi.next(61).to_string(), "乙丑");
    }

    #[test]
    fn test_element_cycles() {
        assert_eq!(Element::Wood.generates(), Element::Fire);
        assert_eq!(Element::Wood.controls(), Element::Earth);
        assert_eq!(Element::Wood.generated_by(), Element::Water);
        assert_eq!(Element::Wood.controlled_by(), Element::Metal);
    }

    #[test]
    fn test_xun_head() {
        let bing_yin = StemBranch::parse("丙寅").unwrap();
        assert_eq!(bing_yin.xun_head().to_string(), "甲子");
        let ji_si = StemBranch::parse("己巳").unwrap();
        assert_eq!(ji_si.xun_head().to_string(), "甲子");
        let geng_wu = StemBranch::parse("庚午").unwrap();
        assert_eq!(geng_wu.xun_head().to_string(), "甲子");
        let jia_xu = StemBranch::parse("甲戌").unwrap();
        assert_eq!(jia_xu.xun_head().to_string(), "甲戌");
    }
}
