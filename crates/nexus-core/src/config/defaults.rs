//! Default configuration values

/// Config file names searched in the project root, first match wins
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "mp-nexus.config.json",
    "mp-nexus.config.toml",
    "mp-nexus.config.yaml",
    "mp-nexus.config.yml",
    "mp-nexus.config.js",
    "mp-nexus.config.cjs",
];

pub const DEFAULT_PLATFORM: &str = "weapp";

pub const DEFAULT_PRIVATE_KEY_PATH: &str = "private.key";

pub const DEFAULT_PROJECT_PATH: &str = ".";

pub const DEFAULT_OUTPUT_DIR: &str = "dist/weapp";

/// Platform names accepted in the `platform` field
pub const KNOWN_PLATFORMS: &[&str] = &["weapp", "alipay", "swan", "tt", "qq", "jd"];

/// uni-app spellings of [`KNOWN_PLATFORMS`], in the same order
pub const UNI_PLATFORM_NAMES: &[&str] = &[
    "mp-weixin",
    "mp-alipay",
    "mp-baidu",
    "mp-toutiao",
    "mp-qq",
    "mp-jd",
];

pub const ENV_APP_ID: &str = "MP_APP_ID";

pub const ENV_PRIVATE_KEY_PATH: &str = "MP_PRIVATE_KEY_PATH";

/// Set to `1` to skip the build stage
pub const ENV_SKIP_BUILD: &str = "NEXUS_SKIP_BUILD";

