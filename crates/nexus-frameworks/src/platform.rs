//! Mini-program hosting platforms

use std::fmt;

use serde::{Deserialize, Serialize};

/// A mini-program hosting platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPlatform {
    /// WeChat
    Weapp,
    /// Alipay
    Alipay,
    /// Baidu
    Swan,
    /// ByteDance
    Tt,
    /// QQ
    Qq,
    /// JD
    Jd,
}

impl TargetPlatform {
    pub const ALL: [TargetPlatform; 6] = [
        Self::Weapp,
        Self::Alipay,
        Self::Swan,
        Self::Tt,
        Self::Qq,
        Self::Jd,
    ];

    /// Name used in config files and by Taro's `--type`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weapp => "weapp",
            Self::Alipay => "alipay",
            Self::Swan => "swan",
            Self::Tt => "tt",
            Self::Qq => "qq",
            Self::Jd => "jd",
        }
    }

    /// Name used by uni-app's `--platform` and `UNI_PLATFORM`
    pub fn uni_name(&self) -> &'static str {
        match self {
            Self::Weapp => "mp-weixin",
            Self::Alipay => "mp-alipay",
            Self::Swan => "mp-baidu",
            Self::Tt => "mp-toutiao",
            Self::Qq => "mp-qq",
            Self::Jd => "mp-jd",
        }
    }

    /// Platform project file that may declare `miniprogramRoot`
    pub fn project_file(&self) -> &'static str {
        match self {
            Self::Alipay => "mini.project.json",
            Self::Swan => "project.swan.json",
            _ => "project.config.json",
        }
    }

    /// Accepts both spellings
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s || p.uni_name() == s)
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
