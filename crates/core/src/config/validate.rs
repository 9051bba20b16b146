use super::{types::Config, ConfigError};

/// Validate configuration.
///
/// Serde already enforces the presence of the `[telegram]` section; this
/// checks the values that would make the service unusable at runtime.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.telegram.bot_token.trim().is_empty() {
        return Err(invalid("telegram.bot_token cannot be empty"));
    }

    if config.telegram.chat_id.trim().is_empty() {
        return Err(invalid("telegram.chat_id cannot be empty"));
    }

    if config.pool.max_workers == 0 {
        return Err(invalid("pool.max_workers must be at least 1"));
    }

    if config.pool.queue_depth == 0 {
        return Err(invalid("pool.queue_depth must be at least 1"));
    }

    let profile = &config.transformer.profile;
    if profile.trim_secs < 0.0 {
        return Err(invalid("transformer.profile.trim_secs cannot be negative"));
    }
    if profile.speed <= 0.0 {
        return Err(invalid("transformer.profile.speed must be positive"));
    }
    if profile.pitch_factor <= 0.0 {
        return Err(invalid("transformer.profile.pitch_factor must be positive"));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
