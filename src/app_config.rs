//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use libros_core::{Backoff, HarvestConfig, Language, RetryPolicy};

/// Backoff strategy names accepted in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffSetting {
    Fixed,
    Exponential,
}

/// `key = value` file configuration for harvester defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// RDF handle document base URL.
    pub rdf_base: Option<String>,
    /// REST API base URL.
    pub rest_base: Option<String>,
    /// Handle prefix of the repository.
    pub handle_prefix: Option<String>,
    /// Bitstream prefix found in RDF documents.
    pub bitstream_prefix: Option<String>,
    /// Image-service prefix substituted for the bitstream prefix.
    pub image_service_prefix: Option<String>,
    /// Attempts per canvas (same range as CLI).
    pub max_attempts: Option<u32>,
    /// Backoff strategy between attempts.
    pub backoff: Option<BackoffSetting>,
    /// Fixed delay, or exponential base delay, in seconds.
    pub backoff_secs: Option<u64>,
    /// Exponential backoff cap in seconds.
    pub backoff_max_secs: Option<u64>,
    /// Batch deadline in seconds.
    pub timeout_secs: Option<u64>,
    /// Cap on concurrent canvas requests.
    pub max_in_flight: Option<usize>,
    /// Client connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Language that labels are recorded under.
    pub label_language: Option<Language>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(max_attempts) = self.max_attempts
            && !(1..=10).contains(&max_attempts)
        {
            bail!("Invalid config value for `max_attempts`: {max_attempts}. Expected range: 1..=10");
        }

        if let Some(backoff_secs) = self.backoff_secs
            && backoff_secs > 300
        {
            bail!("Invalid config value for `backoff_secs`: {backoff_secs}. Expected range: 0..=300");
        }

        if let Some(max_in_flight) = self.max_in_flight
            && !(1..=100).contains(&max_in_flight)
        {
            bail!(
                "Invalid config value for `max_in_flight`: {max_in_flight}. Expected range: 1..=100"
            );
        }

        validate_timeout_secs("backoff_max_secs", self.backoff_max_secs)?;
        validate_timeout_secs("timeout_secs", self.timeout_secs)?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("request_timeout_secs", self.request_timeout_secs)?;

        for (field, value) in [
            ("rdf_base", &self.rdf_base),
            ("rest_base", &self.rest_base),
            ("bitstream_prefix", &self.bitstream_prefix),
            ("image_service_prefix", &self.image_service_prefix),
        ] {
            if let Some(value) = value {
                url::Url::parse(value).with_context(|| {
                    format!("Invalid config value for `{field}`: '{value}' is not an absolute URL")
                })?;
            }
        }

        Ok(())
    }

    /// Overlays the values present in this file onto `config`.
    pub fn apply(&self, config: &mut HarvestConfig) {
        let repository = &mut config.repository;
        if let Some(value) = &self.rdf_base {
            repository.rdf_base.clone_from(value);
        }
        if let Some(value) = &self.rest_base {
            repository.rest_base.clone_from(value);
        }
        if let Some(value) = &self.handle_prefix {
            repository.handle_prefix.clone_from(value);
        }
        if let Some(value) = &self.bitstream_prefix {
            repository.bitstream_prefix.clone_from(value);
        }
        if let Some(value) = &self.image_service_prefix {
            repository.image_service_prefix.clone_from(value);
        }

        let current = &config.fetch.retry;
        let max_attempts = self.max_attempts.unwrap_or(current.max_attempts());
        let backoff = self.backoff_override(current.backoff());
        config.fetch.retry = RetryPolicy::new(max_attempts, backoff);

        if let Some(secs) = self.timeout_secs {
            config.fetch.total_timeout = Duration::from_secs(secs);
        }
        if let Some(cap) = self.max_in_flight {
            config.fetch.max_in_flight = Some(cap);
        }
        if let Some(secs) = self.connect_timeout_secs {
            config.http.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.request_timeout_secs {
            config.http.request_timeout = Duration::from_secs(secs);
        }
        if let Some(language) = self.label_language {
            config.default_language = language;
        }
    }

    fn backoff_override(&self, current: Backoff) -> Backoff {
        let current_base = match current {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, .. } => base,
        };
        let base = self.backoff_secs.map_or(current_base, Duration::from_secs);
        let kind = self.backoff.unwrap_or(match current {
            Backoff::Fixed(_) => BackoffSetting::Fixed,
            Backoff::Exponential { .. } => BackoffSetting::Exponential,
        });

        match kind {
            BackoffSetting::Fixed => Backoff::Fixed(base),
            BackoffSetting::Exponential => {
                let max = self
                    .backoff_max_secs
                    .map(Duration::from_secs)
                    .or(match current {
                        Backoff::Exponential { max, .. } => Some(max),
                        Backoff::Fixed(_) => None,
                    })
                    .unwrap_or(Duration::from_secs(60));
                Backoff::Exponential { base, max }
            }
        }
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/libros/config.toml`
/// 2. `$HOME/.config/libros/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("libros")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("libros")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the explicit config path, or the default path when present.
///
/// An explicit path must exist; a missing default file is not an error.
pub fn load_file_config(explicit: Option<&Path>) -> Result<Option<(PathBuf, FileConfig)>> {
    if let Some(path) = explicit {
        let config = read_file_config(path)?;
        return Ok(Some((path.to_path_buf(), config)));
    }

    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    let config = read_file_config(&path)?;
    Ok(Some((path, config)))
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "rdf_base" => cfg.rdf_base = Some(parse_string_literal(value).with_context(invalid)?),
            "rest_base" => cfg.rest_base = Some(parse_string_literal(value).with_context(invalid)?),
            "handle_prefix" => {
                cfg.handle_prefix = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "bitstream_prefix" => {
                cfg.bitstream_prefix = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "image_service_prefix" => {
                cfg.image_service_prefix = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "max_attempts" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                let n = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("max_attempts out of range for u32"))?;
                cfg.max_attempts = Some(n);
            }
            "backoff" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.backoff = Some(parse_backoff(&parsed).with_context(|| {
                    format!("Invalid `backoff` value '{parsed}' on line {line_no}")
                })?);
            }
            "backoff_secs" => cfg.backoff_secs = Some(parse_integer_u64(value).with_context(invalid)?),
            "backoff_max_secs" => {
                cfg.backoff_max_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "timeout_secs" => cfg.timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?),
            "max_in_flight" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                let n = usize::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("max_in_flight out of range for usize"))?;
                cfg.max_in_flight = Some(n);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "request_timeout_secs" => {
                cfg.request_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "label_language" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                let language = Language::from_code(&parsed).with_context(|| {
                    format!("Invalid `label_language` value '{parsed}' on line {line_no}: expected \"en\" or \"es\"")
                })?;
                cfg.label_language = Some(language);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_backoff(value: &str) -> Result<BackoffSetting> {
    match value {
        "fixed" => Ok(BackoffSetting::Fixed),
        "exponential" => Ok(BackoffSetting::Exponential),
        _ => bail!("Expected one of: fixed, exponential"),
    }
}
