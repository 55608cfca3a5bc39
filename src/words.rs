use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DrillError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordGroup {
    #[serde(rename = "BE")]
    Be,
    #[serde(rename = "KET")]
    Ket,
    #[serde(rename = "Culture")]
    Culture,
}

impl WordGroup {
    pub const ALL: [WordGroup; 3] = [WordGroup::Be, WordGroup::Ket, WordGroup::Culture];
}

impl fmt::Display for WordGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordGroup::Be => write!(f, "BE"),
            WordGroup::Ket => write!(f, "KET"),
            WordGroup::Culture => write!(f, "Culture"),
        }
    }
}

impl FromStr for WordGroup {
    type Err = DrillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "be" => Ok(WordGroup::Be),
            "ket" => Ok(WordGroup::Ket),
            "culture" => Ok(WordGroup::Culture),
            other => Err(DrillError::InvalidInput(format!("unknown word group '{}'", other))),
        }
    }
}

/// One catalog entry: English word or phrase plus its Chinese gloss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub id: u32,
    pub group: WordGroup,
    pub en: String,
    pub cn: String,
}

pub const WORD_CATALOG: [(u32, WordGroup, &str, &str); 30] = [
    // BE
    (1,  WordGroup::Be, "get dressed",        "穿衣服"),
    (2,  WordGroup::Be, "eat breakfast",      "吃早饭"),
    (3,  WordGroup::Be, "brush my teeth",     "刷牙"),
    (4,  WordGroup::Be, "firefighter",        "消防员"),
    (5,  WordGroup::Be, "scientist",          "科学家"),
    (6,  WordGroup::Be, "police officer",     "警察"),
    (7,  WordGroup::Be, "cashier",            "收银员"),
    (8,  WordGroup::Be, "study for a test",   "备考"),
    (9,  WordGroup::Be, "practice the piano", "练钢琴"),
    (10, WordGroup::Be, "take out the trash", "倒垃圾"),
    // KET
    (11, WordGroup::Ket, "daughter", "女儿"),
    (12, WordGroup::Ket, "cousin",   "表/堂兄弟姐妹"),
    (13, WordGroup::Ket, "husband",  "丈夫"),
    (14, WordGroup::Ket, "garage",   "车库"),
    (15, WordGroup::Ket, "curtains", "窗帘"),
    (16, WordGroup::Ket, "carpet",   "地毯"),
    (17, WordGroup::Ket, "barbecue", "烧烤"),
    (18, WordGroup::Ket, "biscuit",  "饼干"),
    (19, WordGroup::Ket, "sandwich", "三明治"),
    (20, WordGroup::Ket, "cereal",   "麦片"),
    // Culture
    (21, WordGroup::Culture, "South America", "南美洲"),
    (22, WordGroup::Culture, "Brazil",        "巴西"),
    (23, WordGroup::Culture, "Colombia",      "哥伦比亚"),
    (24, WordGroup::Culture, "Peru",          "秘鲁"),
    (25, WordGroup::Culture, "Argentina",     "阿根廷"),
    (26, WordGroup::Culture, "Carnival",      "狂欢节"),
    (27, WordGroup::Culture, "Samba",         "桑巴"),
    (28, WordGroup::Culture, "culture",       "文化"),
    (29, WordGroup::Culture, "festival",      "节日"),
    (30, WordGroup::Culture, "costume",       "服装"),
];

pub fn load_word_entries() -> Vec<WordEntry> {
    WORD_CATALOG
        .iter()
        .map(|&(id, group, en, cn)| WordEntry {
            id,
            group,
            en: en.to_string(),
            cn: cn.to_string(),
        })
        .collect()
}

/// Keeps catalog order.
pub fn filter_by_groups(words: &[WordEntry], groups: &[WordGroup]) -> Vec<WordEntry> {
    words
        .iter()
        .filter(|w| groups.contains(&w.group))
        .cloned()
        .collect()
}
