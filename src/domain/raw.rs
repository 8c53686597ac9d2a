// Wire shape of the star-placement oracle. Every field defaults so partial
// documents still load; the palace normalizer validates once at this seam.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStar {
    pub name: String,
    pub brightness: Option<String>,
    pub mutagen: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDecadal {
    pub range: [u32; 2],
    pub heavenly_stem: String,
    pub earthly_branch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPalace {
    pub index: usize,
    pub name: String,
    pub is_body_palace: bool,
    pub is_original_palace: bool,
    pub heavenly_stem: String,
    pub earthly_branch: String,
    pub major_stars: Vec<RawStar>,
    pub minor_stars: Vec<RawStar>,
    pub adjective_stars: Vec<RawStar>,
    pub changsheng12: String,
    pub boshi12: String,
    pub jiangqian12: String,
    pub suiqian12: String,
    pub decadal: RawDecadal,
    pub ages: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAstrolabe {
    pub solar_date: String,
    pub lunar_date: String,
    pub chinese_date: String,
    pub time: String,
    pub time_range: String,
    pub sign: String,
    pub zodiac: String,
    pub soul: String,
    pub body: String,
    pub five_elements_class: String,
    pub palaces: Vec<RawPalace>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFlowPalace {
    pub index: usize,
    pub name: Option<String>,
    pub stars: Vec<RawStar>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFlowLayer {
    pub index: Option<usize>,
    pub heavenly_stem: String,
    pub earthly_branch: String,
    pub palaces: Vec<RawFlowPalace>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawHoroscope {
    pub lunar_date: String,
    pub yearly: RawFlowLayer,
    pub monthly: RawFlowLayer,
}
