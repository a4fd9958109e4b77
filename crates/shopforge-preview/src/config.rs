use std::time::Duration;

use crate::errors::ConfigError;

/// External program that executes a preview document.
///
/// The document is written to the program's stdin; boundary messages are read
/// back from its stdout, one JSON object per line.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunnerCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl RunnerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Splits a command line on whitespace: the first word is the program.
    pub fn parse(line: &str) -> Result<Self, ConfigError> {
        let mut words = line.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| ConfigError::invalid(RUNNER_ENV, "runner command must not be empty"))?;
        Ok(Self {
            program: program.to_string(),
            args: words.map(ToOwned::to_owned).collect(),
        })
    }
}

/// Script resources loaded by every preview document.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DocumentAssets {
    pub style_script_url: String,
    pub runtime_script_url: String,
    pub dom_script_url: String,
    pub transpiler_script_url: String,
}

impl Default for DocumentAssets {
    fn default() -> Self {
        Self {
            style_script_url: "https://cdn.tailwindcss.com".to_string(),
            runtime_script_url: "https://unpkg.com/react@18/umd/react.production.min.js"
                .to_string(),
            dom_script_url: "https://unpkg.com/react-dom@18/umd/react-dom.production.min.js"
                .to_string(),
            transpiler_script_url: "https://unpkg.com/@babel/standalone/babel.min.js".to_string(),
        }
    }
}

pub const SETTLE_DELAY_ENV: &str = "SHOPFORGE_SETTLE_DELAY_MS";
pub const RUNNER_ENV: &str = "SHOPFORGE_RUNNER";
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1_000;

/// Preview pipeline settings.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// How long a launched context must stay fault-free before it counts as
    /// `Ready`. There is no positive ready signal; this window stands in for one.
    pub settle_delay_ms: u64,
    pub assets: DocumentAssets,
    pub runner: Option<RunnerCommand>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            assets: DocumentAssets::default(),
            runner: None,
        }
    }
}

impl PreviewConfig {
    /// Builds a config from `SHOPFORGE_SETTLE_DELAY_MS` and `SHOPFORGE_RUNNER`,
    /// falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(SETTLE_DELAY_ENV).filter(|v| !v.trim().is_empty()) {
            config.settle_delay_ms = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid(SETTLE_DELAY_ENV, format!("{e}")))?;
        }
        if let Some(raw) = lookup(RUNNER_ENV).filter(|v| !v.trim().is_empty()) {
            config.runner = Some(RunnerCommand::parse(&raw)?);
        }
        Ok(config)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn settle_delay_ms(mut self, millis: u64) -> Self {
        self.settle_delay_ms = millis;
        self
    }

    pub fn runner(mut self, runner: RunnerCommand) -> Self {
        self.runner = Some(runner);
        self
    }
}
