// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{OutprocError, Result};
use crate::exec::{RunOptions, SpawnOptions, StdinPolicy, TextEncoding};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [defaults]
/// timeout = "30s"
/// stdin = "closed"
/// encoding = "utf8"
///
/// [profile.slow]
/// timeout = "5m"
/// cwd = "build"
/// env = { RUST_LOG = "debug" }
/// ```
///
/// All sections are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Settings every profile starts from.
    #[serde(default)]
    pub defaults: ProfileConfig,

    /// Named profiles from `[profile.<name>]`.
    #[serde(default)]
    pub profile: BTreeMap<String, ProfileConfig>,
}

/// One `[defaults]` or `[profile.<name>]` table, as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Duration string (`"500ms"`, `"30s"`, `"5m"`, `"1h"`).
    #[serde(default)]
    pub timeout: Option<String>,

    /// `"closed"`, `"inherit"`, or a file path.
    #[serde(default)]
    pub stdin: Option<String>,

    /// `"utf8"` or `"utf8-lossy"`.
    #[serde(default)]
    pub encoding: Option<String>,

    /// Run the command line through the platform shell.
    #[serde(default)]
    pub shell: Option<bool>,

    #[serde(default)]
    pub cwd: Option<PathBuf>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub defaults: Profile,
    pub profiles: BTreeMap<String, Profile>,
}

/// A parsed profile. `None` fields fall back to `[defaults]`, then to
/// [`RunOptions::default`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub timeout: Option<Duration>,
    pub stdin: Option<StdinPolicy>,
    pub encoding: Option<TextEncoding>,
    pub shell: Option<bool>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(defaults: Profile, profiles: BTreeMap<String, Profile>) -> Self {
        Self { defaults, profiles }
    }

    /// Resolve a profile layered over `[defaults]`. `None` selects the
    /// defaults alone.
    pub fn profile(&self, name: Option<&str>) -> Result<Profile> {
        match name {
            None => Ok(self.defaults.clone()),
            Some(name) => self
                .profiles
                .get(name)
                .map(|p| self.defaults.overlay(p))
                .ok_or_else(|| OutprocError::ProfileNotFound(name.to_string())),
        }
    }

    pub fn run_options(&self, name: Option<&str>) -> Result<RunOptions> {
        Ok(self.profile(name)?.to_run_options())
    }
}

impl Profile {
    /// Fields set on `over` win; env maps are merged.
    pub fn overlay(&self, over: &Profile) -> Profile {
        let mut env = self.env.clone();
        env.extend(over.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        Profile {
            timeout: over.timeout.or(self.timeout),
            stdin: over.stdin.clone().or_else(|| self.stdin.clone()),
            encoding: over.encoding.or(self.encoding),
            shell: over.shell.or(self.shell),
            cwd: over.cwd.clone().or_else(|| self.cwd.clone()),
            env,
        }
    }

    pub fn uses_shell(&self) -> bool {
        self.shell.unwrap_or(false)
    }

    pub fn to_run_options(&self) -> RunOptions {
        RunOptions {
            timeout: self.timeout,
            stdin: self.stdin.clone().unwrap_or_default(),
            encoding: self.encoding.unwrap_or_default(),
            spawn: SpawnOptions {
                current_dir: self.cwd.clone(),
                env: self.env.clone(),
                ..SpawnOptions::default()
            },
            ..RunOptions::default()
        }
    }
}
