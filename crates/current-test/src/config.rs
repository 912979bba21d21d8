//
// config.rs
//
// Runner configuration read from editor-style JSON settings
//

use std::path::Path;

use anyhow::Context;

use crate::test_blocks::DEFAULT_BLOCK_IDENTIFIERS;

/// Settings section holding the runner configuration
pub const SETTINGS_SECTION: &str = "runCurrentTest";

/// Which configured command template to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandKind {
    #[default]
    Run,
    RunAndUpdateSnapshots,
}

impl CommandKind {
    /// Settings key of the template for this command
    pub fn settings_key(self) -> &'static str {
        match self {
            CommandKind::Run => "run",
            CommandKind::RunAndUpdateSnapshots => "runAndUpdateSnapshots",
        }
    }
}

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Template for running the current test
    pub run: Option<String>,
    /// Template for running the current test and updating snapshots
    pub run_and_update_snapshots: Option<String>,
    /// Call names recognized as test/suite blocks
    pub test_block_identifiers: Vec<String>,
    /// Separator between names in `${fullTestName}`
    pub test_name_separator: String,
    /// Substituted for names that cannot be determined
    pub unknown_test_name_literal: String,
    /// Use `/` in path placeholders
    pub unix_paths: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            run: None,
            run_and_update_snapshots: None,
            test_block_identifiers: DEFAULT_BLOCK_IDENTIFIERS
                .iter()
                .map(|id| id.to_string())
                .collect(),
            test_name_separator: "\\s".to_string(),
            unknown_test_name_literal: ".*".to_string(),
            unix_paths: false,
        }
    }
}

impl RunnerConfig {
    pub fn command_template(&self, kind: CommandKind) -> Option<&str> {
        let template = match kind {
            CommandKind::Run => self.run.as_deref(),
            CommandKind::RunAndUpdateSnapshots => self.run_and_update_snapshots.as_deref(),
        };
        template.filter(|t| !t.is_empty())
    }

    pub fn set_command_template(&mut self, kind: CommandKind, template: String) {
        match kind {
            CommandKind::Run => self.run = Some(template),
            CommandKind::RunAndUpdateSnapshots => self.run_and_update_snapshots = Some(template),
        }
    }
}

/// Look up `key` in the settings section, accepting both a nested
/// `{"runCurrentTest": {"run": ...}}` object and flat `"runCurrentTest.run"` keys.
fn setting<'a>(settings: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    settings
        .get(SETTINGS_SECTION)
        .and_then(|section| section.get(key))
        .or_else(|| settings.get(format!("{}.{}", SETTINGS_SECTION, key)))
}

fn has_section(settings: &serde_json::Value) -> bool {
    if settings.get(SETTINGS_SECTION).is_some() {
        return true;
    }
    let prefix = format!("{}.", SETTINGS_SECTION);
    settings
        .as_object()
        .is_some_and(|map| map.keys().any(|k| k.starts_with(&prefix)))
}

/// Parse runner configuration from JSON settings.
///
/// Only fields present with the expected type are applied; everything else
/// keeps its value from `RunnerConfig::default()`.
///
/// # Returns
///
/// `Some(RunnerConfig)` when the settings contain a `runCurrentTest` section
/// (nested or as dotted keys), `None` otherwise.
pub fn parse_runner_config(settings: &serde_json::Value) -> Option<RunnerConfig> {
    if !has_section(settings) {
        return None;
    }

    let mut config = RunnerConfig::default();

    if let Some(v) = setting(settings, "run").and_then(|v| v.as_str()) {
        config.run = Some(v.to_string());
    }
    if let Some(v) = setting(settings, "runAndUpdateSnapshots").and_then(|v| v.as_str()) {
        config.run_and_update_snapshots = Some(v.to_string());
    }
    if let Some(v) = setting(settings, "testBlockIdentifiers").and_then(|v| v.as_array()) {
        let identifiers: Vec<String> = v
            .iter()
            .filter_map(|id| id.as_str())
            .map(|id| id.to_string())
            .collect();
        if identifiers.len() != v.len() {
            log::warn!("Ignoring non-string entries in {}.testBlockIdentifiers", SETTINGS_SECTION);
        }
        config.test_block_identifiers = identifiers;
    }
    if let Some(v) = setting(settings, "testNameSeparator").and_then(|v| v.as_str()) {
        config.test_name_separator = v.to_string();
    }
    if let Some(v) = setting(settings, "unknownTestNameLiteral").and_then(|v| v.as_str()) {
        config.unknown_test_name_literal = v.to_string();
    }
    if let Some(v) = setting(settings, "unixPaths").and_then(|v| v.as_bool()) {
        config.unix_paths = v;
    }

    Some(config)
}

/// Load runner configuration from a JSON settings file. A file without a
/// `runCurrentTest` section yields the defaults.
pub fn load_runner_config(path: &Path) -> anyhow::Result<RunnerConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let settings: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
    match parse_runner_config(&settings) {
        Some(config) => Ok(config),
        None => {
            log::debug!(
                "No {} section in {}, using defaults",
                SETTINGS_SECTION,
                path.display()
            );
            Ok(RunnerConfig::default())
        }
    }
}
