#![allow(dead_code)]

use std::collections::BTreeMap;

use outproc::config::{ConfigFile, ProfileConfig, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                defaults: ProfileConfig::default(),
                profile: BTreeMap::new(),
            },
        }
    }

    pub fn with_defaults(mut self, defaults: ProfileConfig) -> Self {
        self.config.defaults = defaults;
        self
    }

    pub fn with_profile(mut self, name: &str, profile: ProfileConfig) -> Self {
        self.config.profile.insert(name.to_string(), profile);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a `[defaults]` / `[profile.<name>]` table.
#[derive(Default)]
pub struct ProfileConfigBuilder {
    profile: ProfileConfig,
}

impl ProfileConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.profile.timeout = Some(timeout.to_string());
        self
    }

    pub fn stdin(mut self, stdin: &str) -> Self {
        self.profile.stdin = Some(stdin.to_string());
        self
    }

    pub fn encoding(mut self, encoding: &str) -> Self {
        self.profile.encoding = Some(encoding.to_string());
        self
    }

    pub fn shell(mut self, shell: bool) -> Self {
        self.profile.shell = Some(shell);
        self
    }

    pub fn cwd(mut self, cwd: &str) -> Self {
        self.profile.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.profile.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> ProfileConfig {
        self.profile
    }
}
