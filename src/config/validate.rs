// src/config/validate.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::model::{ConfigFile, Profile, ProfileConfig, RawConfigFile};
use crate::errors::{OutprocError, Result};
use crate::exec::{StdinPolicy, TextEncoding};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::OutprocError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let defaults = parse_profile("defaults", &raw.defaults)?;
        let mut profiles = BTreeMap::new();
        for (name, cfg) in raw.profile.iter() {
            validate_profile_name(name)?;
            let section = format!("profile.{name}");
            profiles.insert(name.clone(), parse_profile(&section, cfg)?);
        }
        Ok(ConfigFile::new_unchecked(defaults, profiles))
    }
}

/// Validate a raw config without keeping the result.
pub fn validate_config(raw: &RawConfigFile) -> Result<()> {
    ConfigFile::try_from(raw.clone()).map(|_| ())
}

fn validate_profile_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(OutprocError::ConfigError(
            "profile names must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn parse_profile(section: &str, cfg: &ProfileConfig) -> Result<Profile> {
    let timeout = match cfg.timeout.as_deref() {
        Some(s) => Some(parse_timeout(s).map_err(|e| {
            OutprocError::ConfigError(format!("[{section}].timeout: {e}"))
        })?),
        None => None,
    };

    let stdin = match cfg.stdin.as_deref() {
        Some(s) => Some(s.parse::<StdinPolicy>().map_err(|e| {
            OutprocError::ConfigError(format!("[{section}].stdin: {e}"))
        })?),
        None => None,
    };

    let encoding = match cfg.encoding.as_deref() {
        Some(s) => Some(s.parse::<TextEncoding>().map_err(|e| {
            OutprocError::ConfigError(format!("[{section}].encoding: {e}"))
        })?),
        None => None,
    };

    for key in cfg.env.keys() {
        if key.is_empty() || key.contains('=') {
            return Err(OutprocError::ConfigError(format!(
                "[{section}].env: invalid variable name '{key}'"
            )));
        }
    }

    Ok(Profile {
        timeout,
        stdin,
        encoding,
        shell: cfg.shell,
        cwd: cfg.cwd.clone(),
        env: cfg.env.clone(),
    })
}

/// Parse a timeout; zero is rejected since it would fail every run.
pub fn parse_timeout(s: &str) -> std::result::Result<Duration, String> {
    let duration = parse_duration(s)?;
    if duration.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(duration)
}

/// Parse `<digits><unit>` with unit `ms`, `s`, `m` or `h`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: '{s}'"))
}
