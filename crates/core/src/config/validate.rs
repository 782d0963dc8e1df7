use super::{types::ResolverConfig, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Season-pack window and round count are not 0
/// - Resolution and codec caps, when set, are not 0
pub fn validate_config(config: &ResolverConfig) -> Result<(), ConfigError> {
    let packs = &config.season_packs;
    if packs.window_size == 0 {
        return Err(ConfigError::ValidationError(
            "season_packs.window_size cannot be 0".to_string(),
        ));
    }
    if packs.max_rounds == 0 {
        return Err(ConfigError::ValidationError(
            "season_packs.max_rounds cannot be 0".to_string(),
        ));
    }

    let caps = &config.quotas.resolution_caps;
    for (name, cap) in [
        ("2160p", caps.p2160),
        ("1080p", caps.p1080),
        ("720p", caps.p720),
        ("480p", caps.p480),
        ("other", caps.other),
    ] {
        if cap == Some(0) {
            return Err(ConfigError::ValidationError(format!(
                "quotas.resolution_caps.{} cannot be 0 (omit it to disable the cap)",
                name
            )));
        }
    }

    let codecs = &config.quotas.codec_caps;
    for (name, cap) in [
        ("h265", codecs.h265),
        ("h264", codecs.h264),
        ("unknown", codecs.unknown),
    ] {
        if cap == Some(0) {
            return Err(ConfigError::ValidationError(format!(
                "quotas.codec_caps.{} cannot be 0 (omit it to disable the cap)",
                name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&ResolverConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_window_fails() {
        let mut config = ResolverConfig::default();
        config.season_packs.window_size = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_rounds_fails() {
        let mut config = ResolverConfig::default();
        config.season_packs.max_rounds = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_caps_fail() {
        let mut config = ResolverConfig::default();
        config.quotas.resolution_caps.p720 = Some(0);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("720p"));

        let mut config = ResolverConfig::default();
        config.quotas.codec_caps.unknown = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_target_packs_is_allowed() {
        let mut config = ResolverConfig::default();
        config.season_packs.target_packs = 0;
        assert!(validate_config(&config).is_ok());
    }
}
