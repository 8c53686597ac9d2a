#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use ziwei_bazi::adapters::snapshot::{
    LunarMonthEntry, RecordedChart, RecordedHoroscope, SnapshotDocument,
};
use ziwei_bazi::domain::ports::SolarTerm;
use ziwei_bazi::domain::raw::{
    RawAstrolabe, RawDecadal, RawFlowLayer, RawFlowPalace, RawHoroscope, RawPalace, RawStar,
};
use ziwei_bazi::{BirthDate, BirthSpec, ChartEngine, Gender, SnapshotOracle};

pub const SOURCE: &str = "fixture snapshot";

pub type FixtureEngine = ChartEngine<Arc<SnapshotOracle>, Arc<SnapshotOracle>, Arc<SnapshotOracle>>;

/// 寅 first, as the star oracle numbers its palaces.
const BRANCHES: [&str; 12] = ["寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥", "子", "丑"];
const STEMS: [&str; 12] = ["丙", "丁", "戊", "己", "庚", "辛", "壬", "癸", "甲", "乙", "丙", "丁"];
const NAMES: [&str; 12] = [
    "命宫", "兄弟", "夫妻", "子女", "财帛", "疾厄", "迁移", "仆役", "官禄", "田宅", "福德", "父母",
];
const CHANGSHENG: [&str; 12] = [
    "长生", "沐浴", "冠带", "临官", "帝旺", "衰", "病", "死", "墓", "绝", "胎", "养",
];
const BOSHI: [&str; 12] = [
    "博士", "力士", "青龙", "小耗", "将军", "奏书", "飞廉", "喜神", "病符", "大耗", "伏兵", "官府",
];
const SUIQIAN: [&str; 12] = [
    "岁建", "晦气", "丧门", "贯索", "官符", "小耗", "大耗", "龙德", "白虎", "天德", "吊客", "病符",
];
const JIANGQIAN: [&str; 12] = [
    "将星", "攀鞍", "岁驿", "息神", "华盖", "劫煞", "灾煞", "天煞", "指背", "咸池", "月煞", "亡神",
];

/// Palace index of the natal life palace (未).
pub const LIFE_INDEX: usize = 5;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

fn term(name: &str, instant: NaiveDateTime) -> SolarTerm {
    SolarTerm {
        name: name.to_string(),
        at: instant,
    }
}

fn star(name: &str, brightness: &str, mutagen: &str) -> RawStar {
    RawStar {
        name: name.to_string(),
        brightness: Some(brightness.to_string()),
        mutagen: Some(mutagen.to_string()),
        scope: Some("origin".to_string()),
    }
}

fn stars(list: &[(&str, &str, &str)]) -> Vec<RawStar> {
    list.iter().map(|(n, b, m)| star(n, b, m)).collect()
}

pub fn solar_terms() -> Vec<SolarTerm> {
    vec![
        term("大雪", at(1989, 12, 7, 11, 21)),
        term("冬至", at(1989, 12, 22, 5, 22)),
        term("小寒", at(1990, 1, 5, 22, 33)),
        term("大寒", at(1990, 1, 20, 16, 2)),
        term("立春", at(1990, 2, 4, 10, 14)),
        term("立夏", at(2008, 5, 5, 10, 3)),
        term("小满", at(2008, 5, 20, 23, 1)),
        term("芒种", at(2008, 6, 5, 14, 12)),
    ]
}

pub fn lunar_months() -> Vec<LunarMonthEntry> {
    vec![
        LunarMonthEntry {
            year: 1989,
            month: 11,
            is_leap: false,
            first_day: date(1989, 11, 28),
            days: 30,
        },
        LunarMonthEntry {
            year: 1989,
            month: 12,
            is_leap: false,
            first_day: date(1989, 12, 28),
            days: 30,
        },
        LunarMonthEntry {
            year: 1990,
            month: 1,
            is_leap: false,
            first_day: date(1990, 1, 27),
            days: 29,
        },
    ]
}

pub fn natal_palaces() -> Vec<RawPalace> {
    let majors: [&[(&str, &str, &str)]; 12] = [
        &[("紫微", "旺", ""), ("天府", "庙", "")],
        &[("太阴", "陷", "")],
        &[("贪狼", "庙", "权")],
        &[("巨门", "旺", "")],
        &[("廉贞", "平", ""), ("天相", "庙", "")],
        &[("天梁", "旺", "科")],
        &[("七杀", "庙", "")],
        &[("天同", "平", "")],
        &[("武曲", "庙", "禄")],
        &[("太阳", "陷", "")],
        &[("破军", "庙", "")],
        &[("天机", "陷", "")],
    ];
    let minors: [&[(&str, &str, &str)]; 12] = [
        &[],
        &[("左辅", "", "")],
        &[("文昌", "利", ""), ("铃星", "利", "")],
        &[("陀罗", "陷", ""), ("地空", "", ""), ("地劫", "", "")],
        &[("禄存", "", "")],
        &[("擎羊", "庙", "")],
        &[("天钺", "", "")],
        &[("火星", "平", "")],
        &[("文曲", "得", "忌")],
        &[("右弼", "", ""), ("天马", "", "")],
        &[("天魁", "", "")],
        &[],
    ];

    (0..12)
        .map(|i| {
            let k = (LIFE_INDEX + 12 - i) % 12;
            let start = 5 + 10 * k as u32;
            let first_age = ((i + 12 - LIFE_INDEX) % 12) as u32 + 1;
            RawPalace {
                index: i,
                name: NAMES[k].to_string(),
                is_body_palace: i == LIFE_INDEX,
                is_original_palace: i == LIFE_INDEX,
                heavenly_stem: STEMS[i].to_string(),
                earthly_branch: BRANCHES[i].to_string(),
                major_stars: stars(majors[i]),
                minor_stars: stars(minors[i]),
                adjective_stars: if i == 11 {
                    vec![star("天喜", "", "")]
                } else {
                    Vec::new()
                },
                changsheng12: CHANGSHENG[(6 + 12 - i) % 12].to_string(),
                boshi12: BOSHI[(4 + 12 - i) % 12].to_string(),
                suiqian12: SUIQIAN[(i + 12 - 3) % 12].to_string(),
                jiangqian12: JIANGQIAN[(i + 12 - 7) % 12].to_string(),
                decadal: RawDecadal {
                    range: [start, start + 9],
                    heavenly_stem: STEMS[i].to_string(),
                    earthly_branch: BRANCHES[i].to_string(),
                },
                ages: (0..10).map(|n| first_age + 12 * n).collect(),
            }
        })
        .collect()
}

pub fn natal_astrolabe() -> RawAstrolabe {
    RawAstrolabe {
        solar_date: "1990-1-1".to_string(),
        lunar_date: "一九八九年腊月初五".to_string(),
        chinese_date: "己巳 丙子 丙寅 甲午".to_string(),
        time: "午时".to_string(),
        time_range: "11:00~13:00".to_string(),
        sign: "摩羯座".to_string(),
        zodiac: "蛇".to_string(),
        soul: "武曲".to_string(),
        body: "天机".to_string(),
        five_elements_class: "土五局".to_string(),
        palaces: natal_palaces(),
    }
}

fn flow_layer(
    stem: &str,
    branch: &str,
    index: Option<usize>,
    named: &[(usize, &str)],
    placed: &[(usize, &str)],
) -> RawFlowLayer {
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
                stars: placed
                    .iter()
                    .filter(|(idx, _)| *idx == i)
                    .map(|(_, n)| RawStar {
                        name: n.to_string(),
                        ..RawStar::default()
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn horoscopes() -> Vec<RecordedHoroscope> {
    vec![
        RecordedHoroscope {
            focus: date(1990, 1, 1),
            layers: RawHoroscope {
                lunar_date: "一九八九年腊月初五".to_string(),
                yearly: flow_layer(
                    "己",
                    "巳",
                    Some(3),
                    &[(3, "命宫")],
                    &[(4, "流禄"), (5, "流羊"), (3, "流陀"), (9, "流马")],
                ),
                monthly: flow_layer("丁", "丑", Some(11), &[], &[]),
            },
        },
        RecordedHoroscope {
            focus: date(2008, 6, 1),
            layers: RawHoroscope {
                lunar_date: "二〇〇八年四月廿八".to_string(),
                yearly: flow_layer("戊", "子", Some(10), &[], &[(3, "流禄")]),
                monthly: flow_layer("丁", "巳", Some(3), &[], &[]),
            },
        },
    ]
}

pub fn document() -> SnapshotDocument {
    SnapshotDocument {
        source: SOURCE.to_string(),
        solar_terms: solar_terms(),
        lunar_months: lunar_months(),
        charts: vec![RecordedChart {
            solar_date: date(1990, 1, 1),
            time_index: 6,
            gender: Gender::Male,
            astrolabe: natal_astrolabe(),
            horoscopes: horoscopes(),
        }],
    }
}

pub fn engine_for(document: SnapshotDocument) -> FixtureEngine {
    let oracle = Arc::new(SnapshotOracle::new(document));
    ChartEngine::new(oracle.clone(), oracle.clone(), oracle)
}

pub fn engine() -> FixtureEngine {
    engine_for(document())
}

/// 1990-01-01 12:00, longitude 120, latitude 30, male.
pub fn birth_spec() -> BirthSpec {
    BirthSpec {
        date: BirthDate::Solar {
            date: date(1990, 1, 1),
        },
        hour: 12,
        minute: 0,
        longitude: 120.0,
        latitude: Some(30.0),
        gender: Gender::Male,
    }
}
