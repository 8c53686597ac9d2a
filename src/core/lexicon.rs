//! Static five-element / ten-god tables and the small derivations built on
//! them. Everything here is pure lookup.

use crate::domain::ganzhi::{Branch, Element, Polarity, Stem, StemBranch};
use crate::domain::model::{LifeStage, ShenSha, TenGod};

const PA: TenGod = TenGod::Parallel;
const RW: TenGod = TenGod::RobWealth;
const EG: TenGod = TenGod::EatingGod;
const HO: TenGod = TenGod::HurtingOfficer;
const IW: TenGod = TenGod::IndirectWealth;
const DW: TenGod = TenGod::DirectWealth;
const SK: TenGod = TenGod::SevenKillings;
const DO: TenGod = TenGod::DirectOfficer;
const IR: TenGod = TenGod::IndirectResource;
const DR: TenGod = TenGod::DirectResource;

/// Row: day master, column: the other stem.
const TEN_GODS: [[TenGod; 10]; 10] = [
    [PA, RW, EG, HO, IW, DW, SK, DO, IR, DR], // 甲
    [RW, PA, HO, EG, DW, IW, DO, SK, DR, IR], // 乙
    [IR, DR, PA, RW, EG, HO, IW, DW, SK, DO], // 丙
    [DR, IR, RW, PA, HO, EG, DW, IW, DO, SK], // 丁
    [SK, DO, IR, DR, PA, RW, EG, HO, IW, DW], // 戊
    [DO, SK, DR, IR, RW, PA, HO, EG, DW, IW], // 己
    [IW, DW, SK, DO, IR, DR, PA, RW, EG, HO], // 庚
    [DW, IW, DO, SK, DR, IR, RW, PA, HO, EG], // 辛
    [EG, HO, IW, DW, SK, DO, IR, DR, PA, RW], // 壬
    [HO, EG, DW, IW, DO, SK, DR, IR, RW, PA], // 癸
];

const STEM_ELEMENTS: [Element; 10] = [
    Element::Wood,
    Element::Wood,
    Element::Fire,
    Element::Fire,
    Element::Earth,
    Element::Earth,
    Element::Metal,
    Element::Metal,
    Element::Water,
    Element::Water,
];

const BRANCH_ELEMENTS: [Element; 12] = [
    Element::Water, // 子
    Element::Earth, // 丑
    Element::Wood,  // 寅
    Element::Wood,  // 卯
    Element::Earth, // 辰
    Element::Fire,  // 巳
    Element::Fire,  // 午
    Element::Earth, // 未
    Element::Metal, // 申
    Element::Metal, // 酉
    Element::Earth, // 戌
    Element::Water, // 亥
];

use Stem::{Bing, Ding, Geng, Gui, Ji, Jia, Ren, Wu as WuStem, Xin, Yi};

/// 地支藏干, main qi first.
const HIDDEN_STEMS: [&[Stem]; 12] = [
    &[Gui],                // 子
    &[Ji, Gui, Xin],       // 丑
    &[Jia, Bing, WuStem],  // 寅
    &[Yi],                 // 卯
    &[WuStem, Yi, Gui],    // 辰
    &[Bing, Geng, WuStem], // 巳
    &[Ding, Ji],           // 午
    &[Ji, Ding, Yi],       // 未
    &[Geng, Ren, WuStem],  // 申
    &[Xin],                // 酉
    &[WuStem, Xin, Ding],  // 戌
    &[Ren, Jia],           // 亥
];

/// Branch where each stem's 长生 falls.
const LIFE_STAGE_ORIGIN: [Branch; 10] = [
    Branch::Hai,  // 甲
    Branch::Wu,   // 乙
    Branch::Yin,  // 丙
    Branch::You,  // 丁
    Branch::Yin,  // 戊
    Branch::You,  // 己
    Branch::Si,   // 庚
    Branch::Zi,   // 辛
    Branch::Shen, // 壬
    Branch::Mao,  // 癸
];

/// Indexed by cycle index / 2.
const NA_YIN: [&str; 30] = [
    "海中金", "炉中火", "大林木", "路旁土", "剑锋金", "山头火",
    "涧下水", "城头土", "白蜡金", "杨柳木", "泉中水", "屋上土",
    "霹雳火", "松柏木", "长流水", "沙中金", "山下火", "平地木",
    "壁上土", "金箔金", "覆灯火", "天河水", "大驿土", "钗钏金",
    "桑柘木", "大溪水", "沙中土", "天上火", "石榴木", "大海水",
];

/// 天乙贵人 by day stem: 甲戊庚牛羊, 乙己鼠猴乡, 丙丁猪鸡位, 壬癸兔蛇藏, 六辛逢马虎.
const HEAVENLY_NOBLE: [[Branch; 2]; 10] = [
    [Branch::Chou, Branch::Wei],
    [Branch::Zi, Branch::Shen],
    [Branch::Hai, Branch::You],
    [Branch::Hai, Branch::You],
    [Branch::Chou, Branch::Wei],
    [Branch::Zi, Branch::Shen],
    [Branch::Chou, Branch::Wei],
    [Branch::Yin, Branch::Wu],
    [Branch::Mao, Branch::Si],
    [Branch::Mao, Branch::Si],
];

const ACADEMIC: [Branch; 10] = [
    Branch::Si,
    Branch::Wu,
    Branch::Shen,
    Branch::You,
    Branch::Shen,
    Branch::You,
    Branch::Hai,
    Branch::Zi,
    Branch::Yin,
    Branch::Mao,
];

/// 禄神 by day stem.
const PROSPERITY: [Branch; 10] = [
    Branch::Yin,
    Branch::Mao,
    Branch::Si,
    Branch::Wu,
    Branch::Si,
    Branch::Wu,
    Branch::Shen,
    Branch::You,
    Branch::Hai,
    Branch::Zi,
];

/// 羊刃 by day stem.
const BLADE: [Branch; 10] = [
    Branch::Mao,
    Branch::Chen,
    Branch::Wu,
    Branch::Wei,
    Branch::Wu,
    Branch::Wei,
    Branch::You,
    Branch::Xu,
    Branch::Zi,
    Branch::Chou,
];

// Trine-keyed tables, indexed by branch % 4:
// 0 申子辰, 1 巳酉丑, 2 寅午戌, 3 亥卯未
const TRAVEL: [Branch; 4] = [Branch::Yin, Branch::Hai, Branch::Shen, Branch::Si];
const ROMANCE: [Branch; 4] = [Branch::You, Branch::Wu, Branch::Mao, Branch::Zi];
const CANOPY: [Branch; 4] = [Branch::Chen, Branch::Chou, Branch::Xu, Branch::Wei];

pub fn stem_element(stem: Stem) -> Element {
    STEM_ELEMENTS[stem.index()]
}

pub fn branch_element(branch: Branch) -> Element {
    BRANCH_ELEMENTS[branch.index()]
}

pub fn ten_god(day_master: Stem, other: Stem) -> TenGod {
    TEN_GODS[day_master.index()][other.index()]
}

pub fn hidden_stems(branch: Branch) -> &'static [Stem] {
    HIDDEN_STEMS[branch.index()]
}

/// 十二长生 of `stem` at `branch`. Yang stems walk forward from their origin,
/// yin stems backward.
pub fn life_stage(stem: Stem, branch: Branch) -> LifeStage {
    let origin = LIFE_STAGE_ORIGIN[stem.index()].index() as i32;
    let target = branch.index() as i32;
    let steps = match stem.polarity() {
        Polarity::Yang => target - origin,
        Polarity::Yin => origin - target,
    };
    LifeStage::CYCLE[steps.rem_euclid(12) as usize]
}

pub fn na_yin(pair: StemBranch) -> &'static str {
    NA_YIN[pair.cycle_index() / 2]
}

/// e.g. `甲子旬`
pub fn xun_label(pair: StemBranch) -> String {
    format!("{}旬", pair.xun_head())
}

/// The two branches left without a stem in this pair's ten-day segment.
pub fn kong_wang(pair: StemBranch) -> [Branch; 2] {
    let head = pair.xun_head().branch;
    [head.offset(10), head.offset(11)]
}

pub fn kong_wang_label(pair: StemBranch) -> String {
    let [a, b] = kong_wang(pair);
    format!("{}{}", a, b)
}

/// 五虎遁: stem of the 寅 month in a year governed by `year_stem`.
pub fn first_month_stem(year_stem: Stem) -> Stem {
    Stem::from_index((year_stem.index() % 5) * 2 + 2)
}

/// 五鼠遁: stem of the 子 hour on a day governed by `day_stem`.
pub fn first_hour_stem(day_stem: Stem) -> Stem {
    Stem::from_index((day_stem.index() % 5) * 2)
}

pub fn month_pair(year_stem: Stem, month_branch: Branch) -> StemBranch {
    let steps = (month_branch.index() as i32 - Branch::Yin.index() as i32).rem_euclid(12);
    StemBranch {
        stem: first_month_stem(year_stem).offset(steps),
        branch: month_branch,
    }
}

pub fn hour_pair(day_stem: Stem, hour_branch: Branch) -> StemBranch {
    StemBranch {
        stem: first_hour_stem(day_stem).offset(hour_branch.index() as i32),
        branch: hour_branch,
    }
}

pub fn heavenly_noble(day_stem: Stem) -> [Branch; 2] {
    HEAVENLY_NOBLE[day_stem.index()]
}

pub fn academic_star(day_stem: Stem) -> Branch {
    ACADEMIC[day_stem.index()]
}

pub fn prosperity_branch(day_stem: Stem) -> Branch {
    PROSPERITY[day_stem.index()]
}

pub fn blade_branch(day_stem: Stem) -> Branch {
    BLADE[day_stem.index()]
}

pub fn travel_star(branch: Branch) -> Branch {
    TRAVEL[branch.index() % 4]
}

pub fn romance_star(branch: Branch) -> Branch {
    ROMANCE[branch.index() % 4]
}

pub fn canopy_star(branch: Branch) -> Branch {
    CANOPY[branch.index() % 4]
}

#[derive(Debug, Clone, Copy)]
pub struct ShenShaQuery {
    pub day_stem: Stem,
    pub day_branch: Branch,
    pub year_branch: Branch,
    pub target: Branch,
}

/// Every marker whose condition holds for `query.target`, in a fixed order.
pub fn shen_sha(query: &ShenShaQuery) -> Vec<ShenSha> {
    let ShenShaQuery {
        day_stem,
        day_branch,
        year_branch,
        target,
    } = *query;
    let by_branch = |f: fn(Branch) -> Branch| f(day_branch) == target || f(year_branch) == target;

    let mut found = Vec::new();
    if heavenly_noble(day_stem).contains(&target) {
        found.push(ShenSha::HeavenlyNoble);
    }
    if academic_star(day_stem) == target {
        found.push(ShenSha::Academic);
    }
    if by_branch(travel_star) {
        found.push(ShenSha::TravelHorse);
    }
    if by_branch(romance_star) {
        found.push(ShenSha::PeachBlossom);
    }
    if prosperity_branch(day_stem) == target {
        found.push(ShenSha::Prosperity);
    }
    if blade_branch(day_stem) == target {
        found.push(ShenSha::Blade);
    }
    if by_branch(canopy_star) {
        found.push(ShenSha::Canopy);
    }
    found
}
