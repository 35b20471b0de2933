use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::extraction::ExtractionConfig;
use crate::file_utils::FileManager;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Glossary file location
    #[serde(default = "default_glossary_path")]
    pub glossary_path: PathBuf,

    /// Directory holding crawled chapter_NNNN.json files
    #[serde(default = "default_chapters_dir")]
    pub chapters_dir: PathBuf,

    /// Name extraction settings
    #[serde(default)]
    pub extraction: ExtractionSettings,

    /// Name proposer settings
    #[serde(default)]
    pub proposer: ProposerConfig,

    /// Chapter pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Name proposer provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProposerProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: Scripted mock, for dry runs
    Mock,
}

impl ProposerProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::Mock => "Mock",
        }
    }
}

impl std::fmt::Display for ProposerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

impl std::str::FromStr for ProposerProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Name proposer configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProposerConfig {
    /// Provider used to propose names
    #[serde(default)]
    pub provider: ProposerProvider,

    /// Model name (e.g., "qwen2.5:7b")
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Service endpoint URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Temperature parameter for name proposals (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-proposal timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProposerConfig {
    fn default() -> Self {
        Self {
            provider: ProposerProvider::default(),
            model: default_ollama_model(),
            endpoint: default_ollama_endpoint(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProposerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Name extraction configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractionSettings {
    /// Minimum occurrences across the corpus for seeding
    #[serde(default = "default_min_frequency")]
    pub min_frequency: usize,

    /// Whether to extract names following title words
    #[serde(default = "default_true")]
    pub extract_titled: bool,

    /// Additional surnames to recognize
    #[serde(default)]
    pub extra_surnames: Vec<char>,

    /// Words never treated as names
    #[serde(default)]
    pub exclude_words: Vec<String>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            min_frequency: default_min_frequency(),
            extract_titled: true,
            extra_surnames: Vec::new(),
            exclude_words: Vec::new(),
        }
    }
}

impl ExtractionSettings {
    pub fn to_extraction_config(&self) -> ExtractionConfig {
        ExtractionConfig {
            min_frequency: self.min_frequency,
            extract_titled: self.extract_titled,
            extra_surnames: self.extra_surnames.clone(),
            exclude_words: self.exclude_words.iter().cloned().collect::<HashSet<_>>(),
        }
    }
}

/// Chapter pipeline configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Maximum number of chapters processed concurrently
    #[serde(default = "default_concurrent_chapters")]
    pub concurrent_chapters: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrent_chapters: default_concurrent_chapters(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "zh".to_string()
}

fn default_target_language() -> String {
    "vi".to_string()
}

fn default_glossary_path() -> PathBuf {
    PathBuf::from("data").join("character_glossary.json")
}

fn default_chapters_dir() -> PathBuf {
    PathBuf::from("data").join("chinese_chapters")
}

fn default_min_frequency() -> usize {
    3
}

fn default_concurrent_chapters() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "qwen2.5:7b".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if crate::language_utils::language_codes_match(&self.source_language, &self.target_language) {
            return Err(anyhow!(
                "Source and target language are the same: {}",
                self.source_language
            ));
        }

        if self.glossary_path.as_os_str().is_empty() {
            return Err(anyhow!("Glossary path must not be empty"));
        }

        if self.pipeline.concurrent_chapters == 0 {
            return Err(anyhow!("pipeline.concurrent_chapters must be at least 1"));
        }

        if !(0.0..=2.0).contains(&self.proposer.temperature) {
            return Err(anyhow!(
                "proposer.temperature must be between 0.0 and 2.0, got {}",
                self.proposer.temperature
            ));
        }

        if self.proposer.timeout_secs == 0 {
            return Err(anyhow!("proposer.timeout_secs must be at least 1"));
        }

        if self.proposer.provider == ProposerProvider::Ollama && self.proposer.model.trim().is_empty() {
            return Err(anyhow!("A model name is required for the Ollama provider"));
        }

        Ok(())
    }

    /// Load the configuration at `path`, writing a default one if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if FileManager::file_exists(path) {
            let text = FileManager::read_to_string(path)?;
            let config: Config = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        FileManager::write_to_file(&path, &json)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            glossary_path: default_glossary_path(),
            chapters_dir: default_chapters_dir(),
            extraction: ExtractionSettings::default(),
            proposer: ProposerConfig::default(),
            pipeline: PipelineConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
