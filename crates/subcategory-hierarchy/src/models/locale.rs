//! 多语言文本

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 支持的语言
///
/// `En` 为主语言，名称唯一性按主语言判断。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ar => "ar",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en_us" => Ok(Self::En),
            "ar" | "ar-sa" | "ar_sa" => Ok(Self::Ar),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// 按语言存储的文本
///
/// 主语言必填；次要语言缺省时取主语言的值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    pub ar: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, ar: Option<String>) -> Self {
        let en = en.into();
        let ar = ar
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| en.clone());
        Self { en, ar }
    }

    /// 从可空列还原：主语言为空时用次要语言顶上，两者都空则为 None
    pub fn from_columns(en: Option<String>, ar: Option<String>) -> Option<Self> {
        match (en, ar) {
            (Some(en), ar) => Some(Self::new(en, ar)),
            (None, Some(ar)) => Some(Self::new(ar, None)),
            (None, None) => None,
        }
    }

    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::En => &self.en,
            Locale::Ar => &self.ar,
        }
    }

    /// 主语言名称的规范化形式（去空白、小写），用于唯一性比较
    pub fn primary_key(&self) -> String {
        normalize_name(&self.en)
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
