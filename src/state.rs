// SYNOID Runtime State
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use crate::agent::clip_features::MediaFeatureExtractor;
use crate::agent::ranking::{MatchingStrategy, RankingEngine};
use std::path::PathBuf;
use std::sync::Arc;

/// Process configuration, read from the environment (`.env` is loaded by
/// the binary before this runs).
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub whisper_cmd: Option<String>,
    pub whisper_model: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            whisper_cmd: None,
            whisper_model: None,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            ffmpeg: get("SYNOID_FFMPEG").unwrap_or(defaults.ffmpeg),
            ffprobe: get("SYNOID_FFPROBE").unwrap_or(defaults.ffprobe),
            whisper_cmd: get("SYNOID_WHISPER_CMD"),
            whisper_model: get("SYNOID_WHISPER_MODEL").map(PathBuf::from),
            output_dir: get("SYNOID_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        }
    }
}

/// Shared, read-only state of the HTTP server. Feature caches are not kept
/// here; each request builds its own.
pub struct RoughCutState {
    pub config: RuntimeConfig,
    pub engine: RankingEngine,
    pub extractor: MediaFeatureExtractor,
}

impl RoughCutState {
    pub fn new(config: RuntimeConfig, strategy: MatchingStrategy) -> Self {
        let extractor = MediaFeatureExtractor::from_config(&config);
        Self {
            config,
            engine: RankingEngine::new(strategy),
            extractor,
        }
    }
}

pub type AppState = Arc<RoughCutState>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_env() {
        let config = RuntimeConfig::from_lookup(|_| None);
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let env: HashMap<&str, &str> = [
            ("SYNOID_FFMPEG", "/opt/ffmpeg/bin/ffmpeg"),
            ("SYNOID_WHISPER_CMD", "whisper-cli"),
            ("SYNOID_WHISPER_MODEL", "models/ggml-base.en.bin"),
            ("SYNOID_OUTPUT_DIR", "   "),
        ]
        .into_iter()
        .collect();

        let config = RuntimeConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.ffmpeg, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.ffprobe, "ffprobe");
        assert_eq!(config.whisper_cmd.as_deref(), Some("whisper-cli"));
        assert_eq!(config.whisper_model, Some(PathBuf::from("models/ggml-base.en.bin")));
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }
}
