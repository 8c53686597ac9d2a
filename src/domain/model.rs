use crate::domain::ganzhi::{Branch, Element, Stem, StemBranch};
use crate::domain::raw::RawAstrolabe;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarSystem {
    Solar,
    Lunar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn english(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    /// 乾造 / 坤造
    pub fn classical(self) -> &'static str {
        match self {
            Gender::Male => "乾造",
            Gender::Female => "坤造",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LunarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub is_leap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "calendar", rename_all = "lowercase")]
pub enum BirthDate {
    Solar { date: NaiveDate },
    Lunar { date: LunarDate },
}

impl BirthDate {
    pub fn calendar(&self) -> CalendarSystem {
        match self {
            BirthDate::Solar { .. } => CalendarSystem::Solar,
            BirthDate::Lunar { .. } => CalendarSystem::Lunar,
        }
    }
}

/// Immutable chart request input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthSpec {
    pub date: BirthDate,
    pub hour: u32,
    pub minute: u32,
    pub longitude: f64,
    pub latitude: Option<f64>,
    pub gender: Gender,
}

/// Birth instant after true-solar-time correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedInstant {
    pub civil: NaiveDateTime,
    pub corrected: NaiveDateTime,
    pub offset_minutes: f64,
    /// Two-hour branch slot, always in 0..=11.
    pub time_index: usize,
}

// ---------------------------------------------------------------------------
// BaZi
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenGod {
    #[serde(rename = "比肩")]
    Parallel,
    #[serde(rename = "劫财")]
    RobWealth,
    #[serde(rename = "食神")]
    EatingGod,
    #[serde(rename = "伤官")]
    HurtingOfficer,
    #[serde(rename = "偏财")]
    IndirectWealth,
    #[serde(rename = "正财")]
    DirectWealth,
    #[serde(rename = "七杀")]
    SevenKillings,
    #[serde(rename = "正官")]
    DirectOfficer,
    #[serde(rename = "偏印")]
    IndirectResource,
    #[serde(rename = "正印")]
    DirectResource,
}

impl TenGod {
    pub fn label(self) -> &'static str {
        match self {
            TenGod::Parallel => "比肩",
            TenGod::RobWealth => "劫财",
            TenGod::EatingGod => "食神",
            TenGod::HurtingOfficer => "伤官",
            TenGod::IndirectWealth => "偏财",
            TenGod::DirectWealth => "正财",
            TenGod::SevenKillings => "七杀",
            TenGod::DirectOfficer => "正官",
            TenGod::IndirectResource => "偏印",
            TenGod::DirectResource => "正印",
        }
    }
}

impl fmt::Display for TenGod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifeStage {
    #[serde(rename = "长生")]
    Birth,
    #[serde(rename = "沐浴")]
    Bath,
    #[serde(rename = "冠带")]
    Crown,
    #[serde(rename = "临官")]
    Office,
    #[serde(rename = "帝旺")]
    Peak,
    #[serde(rename = "衰")]
    Decline,
    #[serde(rename = "病")]
    Sickness,
    #[serde(rename = "死")]
    Death,
    #[serde(rename = "墓")]
    Tomb,
    #[serde(rename = "绝")]
    Extinction,
    #[serde(rename = "胎")]
    Conception,
    #[serde(rename = "养")]
    Nurture,
}

impl LifeStage {
    pub const CYCLE: [LifeStage; 12] = [
        LifeStage::Birth,
        LifeStage::Bath,
        LifeStage::Crown,
        LifeStage::Office,
        LifeStage::Peak,
        LifeStage::Decline,
        LifeStage::Sickness,
        LifeStage::Death,
        LifeStage::Tomb,
        LifeStage::Extinction,
        LifeStage::Conception,
        LifeStage::Nurture,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LifeStage::Birth => "长生",
            LifeStage::Bath => "沐浴",
            LifeStage::Crown => "冠带",
            LifeStage::Office => "临官",
            LifeStage::Peak => "帝旺",
            LifeStage::Decline => "衰",
            LifeStage::Sickness => "病",
            LifeStage::Death => "死",
            LifeStage::Tomb => "墓",
            LifeStage::Extinction => "绝",
            LifeStage::Conception => "胎",
            LifeStage::Nurture => "养",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShenSha {
    #[serde(rename = "天乙贵人")]
    HeavenlyNoble,
    #[serde(rename = "文昌贵人")]
    Academic,
    #[serde(rename = "驿马")]
    TravelHorse,
    #[serde(rename = "桃花")]
    PeachBlossom,
    #[serde(rename = "禄神")]
    Prosperity,
    #[serde(rename = "羊刃")]
    Blade,
    #[serde(rename = "华盖")]
    Canopy,
}

impl ShenSha {
    pub fn label(self) -> &'static str {
        match self {
            ShenSha::HeavenlyNoble => "天乙贵人",
            ShenSha::Academic => "文昌贵人",
            ShenSha::TravelHorse => "驿马",
            ShenSha::PeachBlossom => "桃花",
            ShenSha::Prosperity => "禄神",
            ShenSha::Blade => "羊刃",
            ShenSha::Canopy => "华盖",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PillarLabel {
    Year,
    Month,
    Day,
    Hour,
}

impl PillarLabel {
    pub const ALL: [PillarLabel; 4] = [
        PillarLabel::Year,
        PillarLabel::Month,
        PillarLabel::Day,
        PillarLabel::Hour,
    ];

    pub fn chinese(self) -> &'static str {
        match self {
            PillarLabel::Year => "年柱",
            PillarLabel::Month => "月柱",
            PillarLabel::Day => "日柱",
            PillarLabel::Hour => "时柱",
        }
    }
}

/// Stem of a pillar. The day pillar's stem is the day master and carries no
/// ten-god label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StemInfo {
    pub stem: Stem,
    pub element: Element,
    pub ten_god: Option<TenGod>,
    pub is_day_master: bool,
}

impl StemInfo {
    pub fn label(&self) -> &'static str {
        match (self.is_day_master, self.ten_god) {
            (true, _) => "日主",
            (false, Some(god)) => god.label(),
            (false, None) => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenStem {
    pub stem: Stem,
    pub element: Element,
    pub ten_god: TenGod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub branch: Branch,
    pub element: Element,
    pub hidden: Vec<HiddenStem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pillar {
    pub label: PillarLabel,
    pub pair: StemBranch,
    pub stem: StemInfo,
    pub branch: BranchInfo,
    pub na_yin: String,
    pub xun: String,
    pub kong_wang: String,
    pub life_stage: LifeStage,
    pub shen_sha: Vec<ShenSha>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FourPillars {
    pub year: StemBranch,
    pub month: StemBranch,
    pub day: StemBranch,
    pub hour: StemBranch,
}

impl FourPillars {
    pub fn get(&self, label: PillarLabel) -> StemBranch {
        match label {
            PillarLabel::Year => self.year,
            PillarLabel::Month => self.month,
            PillarLabel::Day => self.day,
            PillarLabel::Hour => self.hour,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementCount {
    pub wood: u32,
    pub fire: u32,
    pub earth: u32,
    pub metal: u32,
    pub water: u32,
}

impl ElementCount {
    pub fn get(&self, element: Element) -> u32 {
        match element {
            Element::Wood => self.wood,
            Element::Fire => self.fire,
            Element::Earth => self.earth,
            Element::Metal => self.metal,
            Element::Water => self.water,
        }
    }

    pub fn add(&mut self, element: Element) {
        match element {
            Element::Wood => self.wood += 1,
            Element::Fire => self.fire += 1,
            Element::Earth => self.earth += 1,
            Element::Metal => self.metal += 1,
            Element::Water => self.water += 1,
        }
    }

    pub fn merged(&self, other: &ElementCount) -> ElementCount {
        ElementCount {
            wood: self.wood + other.wood,
            fire: self.fire + other.fire,
            earth: self.earth + other.earth,
            metal: self.metal + other.metal,
            water: self.water + other.water,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiveElementTally {
    pub stems: ElementCount,
    pub branches: ElementCount,
    pub hidden: ElementCount,
    pub total: ElementCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthLevel {
    Strong,
    Weak,
    Balanced,
}

impl StrengthLevel {
    pub fn chinese(self) -> &'static str {
        match self {
            StrengthLevel::Strong => "身强",
            StrengthLevel::Weak => "身弱",
            StrengthLevel::Balanced => "中和",
        }
    }
}

/// Provisional balance-score verdict. `useful_god` and `pattern` stay unset:
/// the classical determination is not attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMasterStrength {
    pub level: StrengthLevel,
    pub supportive: u32,
    pub opposing: u32,
    pub favorable: Vec<Element>,
    pub unfavorable: Vec<Element>,
    pub method: String,
    pub useful_god: Option<Element>,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    #[serde(rename = "天干五合")]
    StemCombination,
    #[serde(rename = "天干相冲")]
    StemClash,
    #[serde(rename = "六合")]
    SixCombination,
    #[serde(rename = "六冲")]
    SixClash,
    #[serde(rename = "六害")]
    SixHarm,
    #[serde(rename = "相刑")]
    Punishment,
    #[serde(rename = "自刑")]
    SelfPunishment,
    #[serde(rename = "三合")]
    ThreeHarmony,
    #[serde(rename = "半合")]
    HalfHarmony,
}

impl RelationKind {
    pub fn label(self) -> &'static str {
        match self {
            RelationKind::StemCombination => "天干五合",
            RelationKind::StemClash => "天干相冲",
            RelationKind::SixCombination => "六合",
            RelationKind::SixClash => "六冲",
            RelationKind::SixHarm => "六害",
            RelationKind::Punishment => "相刑",
            RelationKind::SelfPunishment => "自刑",
            RelationKind::ThreeHarmony => "三合",
            RelationKind::HalfHarmony => "半合",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarRelation {
    pub kind: RelationKind,
    pub pillars: Vec<PillarLabel>,
    pub chars: String,
    pub element: Option<Element>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecadeLuckPillar {
    pub start_age: u32,
    pub end_age: u32,
    pub start_year: i32,
    pub end_year: i32,
    pub pair: StemBranch,
    pub stem: StemInfo,
    pub branch: BranchInfo,
}

impl DecadeLuckPillar {
    pub fn range_label(&self) -> String {
        format!("{}-{}", self.start_age, self.end_age)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaziChart {
    /// Year, month, day, hour.
    pub pillars: Vec<Pillar>,
    pub day_master: Stem,
    pub day_master_element: Element,
    pub tally: FiveElementTally,
    pub strength: DayMasterStrength,
    pub relations: Vec<PillarRelation>,
    pub da_yun: Vec<DecadeLuckPillar>,
    pub start_yun_age: u32,
    pub start_yun_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Zi Wei Dou Shu
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StarTier {
    Major,
    Minor,
    Adjective,
    Flow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mutagen {
    #[serde(rename = "禄")]
    Prosperity,
    #[serde(rename = "权")]
    Authority,
    #[serde(rename = "科")]
    Merit,
    #[serde(rename = "忌")]
    Adversity,
}

impl Mutagen {
    pub const ALL: [Mutagen; 4] = [
        Mutagen::Prosperity,
        Mutagen::Authority,
        Mutagen::Merit,
        Mutagen::Adversity,
    ];

    pub fn parse(text: &str) -> Option<Mutagen> {
        match text.trim() {
            "禄" | "化禄" => Some(Mutagen::Prosperity),
            "权" | "化权" => Some(Mutagen::Authority),
            "科" | "化科" => Some(Mutagen::Merit),
            "忌" | "化忌" => Some(Mutagen::Adversity),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Mutagen::Prosperity => '禄',
            Mutagen::Authority => '权',
            Mutagen::Merit => '科',
            Mutagen::Adversity => '忌',
        }
    }
}

impl fmt::Display for Mutagen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Star {
    pub name: String,
    pub tier: StarTier,
    pub brightness: Option<String>,
    pub mutagen: Option<Mutagen>,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StarMutagen {
    pub star: String,
    pub mutagen: Mutagen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowedStars {
    pub from_index: usize,
    pub rule: String,
    pub stars: Vec<Star>,
}

/// 三方四正 of one palace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surroundings {
    pub target: usize,
    pub opposite: usize,
    pub trines: [usize; 2],
    pub four_rectification: [usize; 4],
    pub major_stars: Vec<String>,
    pub mutagens: Vec<StarMutagen>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadalRange {
    pub start_age: u32,
    pub end_age: u32,
    pub range: String,
    pub heavenly_stem: Option<Stem>,
    pub earthly_branch: Option<Branch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwelveStages {
    pub changsheng: String,
    pub boshi: String,
    pub suiqian: String,
    pub jiangqian: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palace {
    pub index: usize,
    pub name: String,
    pub heavenly_stem: Stem,
    pub earthly_branch: Branch,
    pub major_stars: Vec<Star>,
    pub minor_stars: Vec<Star>,
    pub adjective_stars: Vec<Star>,
    pub tough_stars: Vec<Star>,
    pub mutagens: Vec<StarMutagen>,
    pub decadal: DecadalRange,
    pub is_body_palace: bool,
    pub is_life_palace: bool,
    /// The star oracle's 来因 flag, kept as reported.
    pub is_original_palace: bool,
    pub stages: TwelveStages,
    pub ages: Vec<u32>,
    pub is_empty: bool,
    pub borrowed: Option<BorrowedStars>,
    pub surroundings: Surroundings,
}

impl Palace {
    /// Major, minor, then adjective stars.
    pub fn all_stars(&self) -> impl Iterator<Item = &Star> {
        self.major_stars
            .iter()
            .chain(self.minor_stars.iter())
            .chain(self.adjective_stars.iter())
    }

    pub fn has_star(&self, name: &str) -> bool {
        self.all_stars()
            .chain(self.tough_stars.iter())
            .any(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutagenSlot {
    pub mutagen: Mutagen,
    pub star: String,
    pub palaces: Vec<usize>,
}

/// The four transformed stars for one governing stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutagenMap {
    pub stem: Stem,
    pub prosperity: MutagenSlot,
    pub authority: MutagenSlot,
    pub merit: MutagenSlot,
    pub adversity: MutagenSlot,
}

impl MutagenMap {
    pub fn slots(&self) -> [&MutagenSlot; 4] {
        [&self.prosperity, &self.authority, &self.merit, &self.adversity]
    }

    pub fn mutagen_of(&self, star: &str) -> Option<Mutagen> {
        self.slots()
            .into_iter()
            .find(|slot| slot.star == star)
            .map(|slot| slot.mutagen)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadeMutagen {
    pub range: String,
    pub start_age: u32,
    pub end_age: u32,
    pub is_current: bool,
    pub map: MutagenMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowLayer {
    /// Palace index holding this layer's life palace.
    pub index: Option<usize>,
    pub heavenly_stem: Stem,
    pub earthly_branch: Branch,
    pub palace_names: BTreeMap<usize, String>,
    pub stars: BTreeMap<usize, Vec<Star>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub start_name: String,
    pub end_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horoscope {
    pub focus_date: NaiveDate,
    pub lunar_date: String,
    pub year: FlowLayer,
    pub month: FlowLayer,
    pub year_mutagens: MutagenMap,
    pub month_mutagens: MutagenMap,
    pub month_window: Option<MonthWindow>,
}

// ---------------------------------------------------------------------------
// Aggregate root
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayRollover {
    /// Day pillar advances at 23:00 (早子时).
    EarlyZi,
    Midnight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarVariant {
    Precise,
    Nominal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub year_boundary: String,
    pub month_boundary: String,
    pub day_rollover: DayRollover,
    pub reference_meridian: f64,
    pub strength_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartMetadata {
    pub engine_version: String,
    pub rules: RuleSet,
    pub calendar_variant: CalendarVariant,
    pub decade_strategy: Option<String>,
    pub star_source: String,
    pub degradations: Vec<String>,
}

/// The complete chart snapshot for one birth spec and focus date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Astrolabe {
    pub palaces: Vec<Palace>,
    pub solar_date: String,
    pub lunar_date: String,
    pub chinese_date: String,
    pub raw_dates: LunarDate,
    pub four_pillars: FourPillars,
    pub bazi: BaziChart,
    pub time: String,
    pub time_range: String,
    pub sign: String,
    pub zodiac: String,
    pub soul: String,
    pub body: String,
    pub five_elements_class: String,
    pub gender: Gender,
    pub original_gender: String,
    pub natal_mutagens: MutagenMap,
    pub decade_mutagens: Vec<DecadeMutagen>,
    pub horoscope: Option<Horoscope>,
    pub longitude: f64,
    pub latitude: Option<f64>,
    pub birth_hour: u32,
    pub birth_minute: u32,
    pub instant: CorrectedInstant,
    pub metadata: ChartMetadata,
    #[serde(skip)]
    pub(crate) raw: RawAstrolabe,
}

impl Astrolabe {
    pub fn palace(&self, index: usize) -> Option<&Palace> {
        self.palaces.iter().find(|p| p.index == index)
    }

    pub fn life_palace(&self) -> Option<&Palace> {
        self.palaces.iter().find(|p| p.is_life_palace)
    }
}
