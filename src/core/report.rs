//! 純文字命盤報告（可複製貼上），欄寬以全形字元計 2 格對齊。

use crate::domain::model::{Astrolabe, FlowLayer, Horoscope, MutagenMap, Palace, Pillar, Star};
use std::fmt::Write;

const RULE: &str = "------------------------------------------------";
const WIDE_RULE: &str = "--------------------------------------------------------";

/// Characters beyond Latin-1 take two columns.
pub fn display_width(text: &str) -> usize {
    text.chars().map(|c| if c as u32 > 255 { 2 } else { 1 }).sum()
}

pub fn pad_right(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(text));
    format!("{}{}", text, " ".repeat(pad))
}

fn or_dashes(text: String) -> String {
    if text.is_empty() {
        "--".to_string()
    } else {
        text
    }
}

fn palace_locator(astrolabe: &Astrolabe, index: Option<usize>) -> String {
    index
        .and_then(|i| astrolabe.palace(i))
        .map(|p| format!("{} [{}]", p.name, p.earthly_branch))
        .unwrap_or_else(|| "Unknown".to_string())
}

fn mutagen_summary(map: &MutagenMap) -> String {
    format!(
        "禄-{}, 权-{}, 科-{}, 忌-{}",
        map.prosperity.star, map.authority.star, map.merit.star, map.adversity.star
    )
}

fn strip_flow_prefix(name: &str) -> String {
    name.replace("流年", "").replace("流月", "").replace('宫', "")
}

fn names_life(layer: &FlowLayer, index: usize) -> bool {
    layer
        .palace_names
        .get(&index)
        .map(|n| n.contains('命'))
        .unwrap_or(false)
}

fn format_star(star: &Star, horoscope: Option<&Horoscope>) -> String {
    let mut text = star.name.clone();
    if let Some(mutagen) = star.mutagen {
        write!(text, "[{}]", mutagen).ok();
    }
    if let Some(brightness) = &star.brightness {
        write!(text, "({})", brightness).ok();
    }
    if let Some(h) = horoscope {
        let tags: Vec<String> = [("年", &h.year_mutagens), ("月", &h.month_mutagens)]
            .iter()
            .filter_map(|(scope, map)| map.mutagen_of(&star.name).map(|m| format!("{}{}", scope, m)))
            .collect();
        if !tags.is_empty() {
            write!(text, "{{{}}}", tags.join(",")).ok();
        }
    }
    text
}

fn write_header(out: &mut String, a: &Astrolabe) {
    writeln!(out, "【紫微斗数排盘 | Zi Wei Dou Shu Chart】").ok();
    writeln!(out, "{}", RULE).ok();
    writeln!(out, "性别 (Gender): {} ({})", a.original_gender, a.gender.english()).ok();
    writeln!(
        out,
        "阳历 (Solar):  {} {}:{:02} ({})",
        a.solar_date, a.birth_hour, a.birth_minute, a.time
    )
    .ok();
    writeln!(out, "农历 (Lunar):  {}", a.lunar_date).ok();
    let p = &a.four_pillars;
    writeln!(
        out,
        "八字 (BaZi):   {}年 {}月 {}日 {}时",
        p.year, p.month, p.day, p.hour
    )
    .ok();
    let mut location = format!("经度 {}°", a.longitude);
    if let Some(latitude) = a.latitude {
        write!(location, ", 纬度 {}°", latitude).ok();
    }
    writeln!(out, "地点 (Loc):    {} (真太阳时 True Solar Time)", location).ok();
}

fn write_flow(out: &mut String, a: &Astrolabe, h: &Horoscope) {
    writeln!(out, "\n【流运设定 (Flow Rules)】").ok();
    writeln!(out, "起法规则: 流年按立春交节(Solar Terms), 流月按节气(Solar Terms)").ok();
    writeln!(out, "{}", RULE).ok();

    writeln!(
        out,
        "流年 (Year): {}{}年 [命宫在 {}]",
        h.year.heavenly_stem,
        h.year.earthly_branch,
        palace_locator(a, h.year.index)
    )
    .ok();
    writeln!(out, "  流年四化: {}", mutagen_summary(&h.year_mutagens)).ok();
    writeln!(
        out,
        "流月 (Month): {}{}月 [命宫在 {}]",
        h.month.heavenly_stem,
        h.month.earthly_branch,
        palace_locator(a, h.month.index)
    )
    .ok();
    writeln!(out, "  流月四化: {}", mutagen_summary(&h.month_mutagens)).ok();

    match &h.month_window {
        Some(w) => {
            let fmt = "%Y-%m-%d %H:%M";
            writeln!(out, "  流月范围: 起于 {} ({})", w.start_name, w.start.format(fmt)).ok();
            writeln!(out, "            止于 {} ({})", w.end_name, w.end.format(fmt)).ok();
            writeln!(out, "            (注: 以上为北京时间 UTC+8 交节时刻)").ok();
        }
        None => {
            writeln!(out, "  流月范围: 请参考万年历节气交接日").ok();
        }
    }

    writeln!(out, "\n【流运对照表 (Flow Palace Cross-Reference)】").ok();
    writeln!(out, "{}", WIDE_RULE).ok();
    writeln!(out, "地支 (Branch)| 本命 (Original) | 流年 (Year) | 流月 (Month)").ok();
    writeln!(out, "{}", WIDE_RULE).ok();
    for p in &a.palaces {
        let flow_name = |layer: &FlowLayer| {
            layer
                .palace_names
                .get(&p.index)
                .map(|n| strip_flow_prefix(n))
                .unwrap_or_else(|| "--".to_string())
        };
        writeln!(
            out,
            "{}| {}| {}| {}",
            pad_right(&format!("[{}]", p.earthly_branch), 8),
            pad_right(&p.name, 10),
            pad_right(&flow_name(&h.year), 10),
            flow_name(&h.month)
        )
        .ok();
    }
    writeln!(out, "{}", WIDE_RULE).ok();
}

fn write_palace(out: &mut String, p: &Palace, horoscope: Option<&Horoscope>) {
    let mut labels = String::new();
    if p.is_original_palace && p.is_life_palace {
        labels.push_str("【本命】");
    }
    if p.is_body_palace {
        labels.push_str("【身宫】");
    }
    if let Some(h) = horoscope {
        if names_life(&h.year, p.index) {
            labels.push_str("<流年命宫>");
        }
        if names_life(&h.month, p.index) {
            labels.push_str("<流月命宫>");
        }
    }

    writeln!(out, "{} [{}{}] {}", p.name, p.heavenly_stem, p.earthly_branch, labels).ok();
    writeln!(out, "  大限 (Decadal): {} | 宫干: {}", p.decadal.range, p.heavenly_stem).ok();

    let tier = |stars: &[Star]| {
        or_dashes(
            stars
                .iter()
                .map(|s| format_star(s, horoscope))
                .collect::<Vec<_>>()
                .join("  "),
        )
    };
    writeln!(out, "  主星 (Major): {}", tier(&p.major_stars)).ok();
    if let Some(borrowed) = &p.borrowed {
        let names: Vec<&str> = borrowed.stars.iter().map(|s| s.name.as_str()).collect();
        writeln!(out, "  空宫 (Empty): {} {}", borrowed.rule, or_dashes(names.join(" "))).ok();
    }
    writeln!(out, "  辅星 (Minor): {}", tier(&p.minor_stars)).ok();
    writeln!(out, "  杂曜 (Mini):  {}", tier(&p.adjective_stars)).ok();

    if let Some(h) = horoscope {
        let flow: Vec<String> = h
            .month
            .stars
            .get(&p.index)
            .map(|stars| {
                stars
                    .iter()
                    .map(|s| match s.mutagen {
                        Some(m) => format!("{}[流{}]", s.name, m),
                        None => s.name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        if !flow.is_empty() {
            writeln!(out, "  流曜 (Flow):  {}", flow.join(" ")).ok();
        }
    }

    writeln!(out, "  长生12: {}", p.stages.changsheng).ok();
    writeln!(out, "  博士12: {}", p.stages.boshi).ok();
    writeln!(out, "  岁前12: {}", p.stages.suiqian).ok();
    writeln!(out, "  将前12: {}", p.stages.jiangqian).ok();
    out.push('\n');
}

fn write_pillar(out: &mut String, pillar: &Pillar) {
    let hidden: Vec<String> = pillar
        .branch
        .hidden
        .iter()
        .map(|h| format!("{}({})", h.stem, h.ten_god))
        .collect();
    let shen_sha: Vec<&str> = pillar.shen_sha.iter().map(|s| s.label()).collect();
    writeln!(
        out,
        "{} {}{} [{}] 藏干: {} | 纳音: {} | 旬空: {} | 长生: {} | 神煞: {}",
        pad_right(pillar.label.chinese(), 6),
        pillar.pair.stem,
        pillar.pair.branch,
        pillar.stem.label(),
        hidden.join(" "),
        pillar.na_yin,
        pillar.kong_wang,
        pillar.life_stage.label(),
        or_dashes(shen_sha.join(" "))
    )
    .ok();
}

fn write_bazi(out: &mut String, a: &Astrolabe) {
    let b = &a.bazi;
    writeln!(out, "【八字命盘 | BaZi Chart】").ok();
    writeln!(out, "{}", RULE).ok();
    for pillar in &b.pillars {
        write_pillar(out, pillar);
    }

    let t = &b.tally.total;
    writeln!(
        out,
        "五行 (Elements): 木{} 火{} 土{} 金{} 水{}",
        t.wood, t.fire, t.earth, t.metal, t.water
    )
    .ok();
    let s = &b.strength;
    let join = |elements: &[crate::domain::ganzhi::Element]| {
        or_dashes(elements.iter().map(|e| e.as_char()).collect())
    };
    writeln!(
        out,
        "日主 (Day Master): {}{} {} (扶 {} / 抑 {}) 喜: {} 忌: {}",
        b.day_master,
        b.day_master_element,
        s.level.chinese(),
        s.supportive,
        s.opposing,
        join(&s.favorable),
        join(&s.unfavorable)
    )
    .ok();
    writeln!(out, "  * {}", s.method).ok();

    if !b.relations.is_empty() {
        let relations: Vec<String> = b
            .relations
            .iter()
            .map(|r| format!("{}{}", r.chars, r.kind.label()))
            .collect();
        writeln!(out, "刑冲合会 (Relations): {}", relations.join(" ")).ok();
    }

    match b.start_yun_date {
        Some(date) => {
            writeln!(out, "起运 (Luck Onset): {}岁 ({})", b.start_yun_age, date).ok();
        }
        None => {
            writeln!(out, "起运 (Luck Onset): 未起大运").ok();
        }
    }
    for decade in &b.da_yun {
        writeln!(
            out,
            "  {} {}{} [{}] {}-{}",
            pad_right(&decade.range_label(), 7),
            decade.pair.stem,
            decade.pair.branch,
            decade.stem.label(),
            decade.start_year,
            decade.end_year
        )
        .ok();
    }
    writeln!(out, "{}", RULE).ok();
}

/// Bilingual fixed-width report of the whole chart.
pub fn format_as_plain_text(a: &Astrolabe) -> String {
    let mut out = String::new();
    write_header(&mut out, a);

    if let Some(h) = &a.horoscope {
        write_flow(&mut out, a, h);
    }

    writeln!(out).ok();
    writeln!(out, "五行局 (Element): {}", a.five_elements_class).ok();
    writeln!(out, "命主 (Ming Zhu):  {}", a.soul).ok();
    writeln!(out, "身主 (Shen Zhu):  {}", a.body).ok();
    writeln!(out, "{}\n", RULE).ok();

    for palace in &a.palaces {
        write_palace(&mut out, palace, a.horoscope.as_ref());
    }

    write_bazi(&mut out, a);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_width_counts_cjk_double() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("命宫"), 4);
        assert_eq!(display_width("[子]"), 4);
    }

    #[test]
    fn test_pad_right_aligns_mixed_text() {
        assert_eq!(pad_right("[子]", 8), "[子]    ");
        assert_eq!(display_width(&pad_right("兄弟", 10)), 10);
        assert_eq!(pad_right("toolongtext", 4), "toolongtext");
    }

    #[test]
    fn test_strip_flow_prefix() {
        assert_eq!(strip_flow_prefix("流年命宫"), "命");
        assert_eq!(strip_flow_prefix("兄弟"), "兄弟");
    }
}
