//! Configuration validation

use tracing::debug;

use crate::error::{NexusError, Result};

use super::defaults::{KNOWN_PLATFORMS, UNI_PLATFORM_NAMES};
use super::types::{NexusConfig, ResolvedConfig};

/// Validate a config file's contents
pub fn validate_config(config: &NexusConfig) -> Result<()> {
    debug!("validating configuration");
    validate_platform(config)?;
    validate_paths(config)?;
    validate_ci_options(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_platform(config: &NexusConfig) -> Result<()> {
    if let Some(platform) = &config.platform {
        let name = platform.trim().to_lowercase();
        let known = KNOWN_PLATFORMS
            .iter()
            .chain(UNI_PLATFORM_NAMES)
            .any(|p| *p == name);
        if !known {
            return Err(NexusError::config_invalid(
                "platform",
                format!("must be one of: {}", KNOWN_PLATFORMS.join(", ")),
            ));
        }
    }
    Ok(())
}

fn validate_paths(config: &NexusConfig) -> Result<()> {
    for (field, value) in [
        ("projectPath", &config.project_path),
        ("outputDir", &config.output_dir),
        ("privateKeyPath", &config.private_key_path),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(NexusError::config_invalid(field, "cannot be empty"));
        }
    }
    Ok(())
}

fn validate_ci_options(config: &NexusConfig) -> Result<()> {
    match &config.ci_options {
        None | Some(serde_json::Value::Object(_)) => Ok(()),
        Some(_) => Err(NexusError::config_invalid("ciOptions", "must be a mapping")),
    }
}

/// Credentials must be present before any build or platform call
pub fn require_credentials(config: &ResolvedConfig) -> Result<()> {
    if config.app_id.trim().is_empty() {
        return Err(NexusError::invalid_app_id("not provided"));
    }
    if config.private_key_path.trim().is_empty() {
        return Err(NexusError::invalid_private_key("not provided"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&NexusConfig::default()).is_ok());
    }

    #[test]
    fn test_unknown_platform() {
        let config = NexusConfig {
            platform: Some("harmony".to_string()),
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.known_kind(), Some(ErrorKind::ConfigInvalid));
        assert!(err.to_string().contains("platform"));
    }

    #[test]
    fn test_uni_platform_spelling_accepted() {
        for platform in ["mp-weixin", "MP-ALIPAY", "weapp"] {
            let config = NexusConfig {
                platform: Some(platform.to_string()),
                ..Default::default()
            };
            assert!(validate_config(&config).is_ok(), "{}", platform);
        }
    }

    #[test]
    fn test_ci_options_must_be_mapping() {
        let config = NexusConfig {
            ci_options: Some(serde_json::json!(["es6"])),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_output_dir() {
        let config = NexusConfig {
            output_dir: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_require_credentials() {
        let mut config = ResolvedConfig::default();
        assert_eq!(
            require_credentials(&config).unwrap_err().known_kind(),
            Some(ErrorKind::InvalidAppId)
        );

        config.app_id = "wx1".to_string();
        assert!(require_credentials(&config).is_ok());

        config.private_key_path = String::new();
        assert_eq!(
            require_credentials(&config).unwrap_err().known_kind(),
            Some(ErrorKind::InvalidPrivateKey)
        );
    }
}
