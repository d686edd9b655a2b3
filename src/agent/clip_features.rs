// SYNOID Clip Features
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Per-clip signals consumed by the ranking engine: transcript text, a
// colour-derived emotion label and basic visual statistics. Extraction is
// delegated to a `ClipFeatureExtractor`; results are held in a cache that
// lives for exactly one matching run.

use crate::agent::transcription::{dialogue_text, NullTranscriber, Transcriber, WhisperCliTranscriber};
use crate::agent::vision_tools::extract_visual_stats;
use crate::state::RuntimeConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
}

impl Emotion {
    /// Case-insensitive parse; unknown labels yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "neutral" => Some(Emotion::Neutral),
            "happy" => Some(Emotion::Happy),
            "sad" => Some(Emotion::Sad),
            "angry" => Some(Emotion::Angry),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurements of a decodable clip. `avg_color` is in BGR order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualStats {
    pub duration: f64,
    pub fps: f64,
    pub avg_color: [f64; 3],
}

impl VisualStats {
    pub fn brightness(&self) -> f64 {
        let [b, g, r] = self.avg_color;
        (b + g + r) / 3.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipFeatures {
    pub source_id: String,
    pub dialogue_text: String,
    pub emotion: Emotion,
    pub visual: Option<VisualStats>,
}

impl ClipFeatures {
    /// Features of a clip nothing could be learned about.
    pub fn neutral(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            dialogue_text: String::new(),
            emotion: Emotion::Neutral,
            visual: None,
        }
    }
}

/// Colour heuristic for emotion. Checks run happy, angry, sad, then
/// neutral; the first that holds wins.
pub fn classify_emotion(visual: Option<&VisualStats>) -> Emotion {
    let Some(stats) = visual else {
        return Emotion::Neutral;
    };
    let [b, g, r] = stats.avg_color;
    let brightness = stats.brightness();

    if brightness > 90.0 {
        return Emotion::Happy;
    }
    if brightness < 90.0 && r > g + 20.0 && r > b + 20.0 {
        return Emotion::Angry;
    }
    if brightness < 80.0 && b > r {
        return Emotion::Sad;
    }
    Emotion::Neutral
}

/// Boundary that turns a clip identifier into features.
///
/// Implementations never fail: undecodable clips come back with absent
/// visuals and empty dialogue.
pub trait ClipFeatureExtractor: Send + Sync {
    fn extract(&self, clip_id: &str) -> ClipFeatures;
}

/// Fixed feature table, mostly for tests and replaying stored analyses.
/// Unknown ids resolve to neutral features.
impl ClipFeatureExtractor for HashMap<String, ClipFeatures> {
    fn extract(&self, clip_id: &str) -> ClipFeatures {
        self.get(clip_id)
            .cloned()
            .unwrap_or_else(|| ClipFeatures::neutral(clip_id))
    }
}

/// Extracts features from clip files on disk via ffmpeg/ffprobe and the
/// configured transcriber.
pub struct MediaFeatureExtractor {
    ffmpeg: String,
    ffprobe: String,
    transcriber: Box<dyn Transcriber>,
}

impl MediaFeatureExtractor {
    pub fn new(ffmpeg: &str, ffprobe: &str, transcriber: Box<dyn Transcriber>) -> Self {
        Self {
            ffmpeg: ffmpeg.to_string(),
            ffprobe: ffprobe.to_string(),
            transcriber,
        }
    }

    /// Whisper transcription when `SYNOID_WHISPER_CMD` is set, silence
    /// otherwise.
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let transcriber: Box<dyn Transcriber> = match &config.whisper_cmd {
            Some(cmd) => Box::new(WhisperCliTranscriber::new(
                &config.ffmpeg,
                &config.ffprobe,
                cmd,
                config.whisper_model.clone(),
            )),
            None => Box::new(NullTranscriber),
        };
        Self::new(&config.ffmpeg, &config.ffprobe, transcriber)
    }
}

impl ClipFeatureExtractor for MediaFeatureExtractor {
    fn extract(&self, clip_id: &str) -> ClipFeatures {
        let path = Path::new(clip_id);
        let visual = extract_visual_stats(&self.ffmpeg, &self.ffprobe, path);
        ClipFeatures {
            source_id: clip_id.to_string(),
            dialogue_text: dialogue_text(self.transcriber.as_ref(), path),
            emotion: classify_emotion(visual.as_ref()),
            visual,
        }
    }
}

/// Features of every distinct clip in one matching run. Owned by a single
/// `RankingEngine::rank_and_assign` call.
#[derive(Debug, Default)]
pub(crate) struct FeatureCache {
    entries: HashMap<String, ClipFeatures>,
}

impl FeatureCache {
    /// Extract each distinct clip exactly once. Extraction runs in
    /// parallel; duplicates in `clip_ids` are ignored.
    pub(crate) fn build<E: ClipFeatureExtractor + ?Sized>(extractor: &E, clip_ids: &[String]) -> Self {
        let mut seen = HashSet::new();
        let distinct: Vec<&String> = clip_ids.iter().filter(|id| seen.insert(id.as_str())).collect();

        info!("[EYES] Extracting features from {} clips...", distinct.len());

        let entries: HashMap<String, ClipFeatures> = distinct
            .par_iter()
            .map(|id| {
                let features = extractor.extract(id);
                debug!(
                    "[EYES] {} -> emotion={} visual={} words={}",
                    id,
                    features.emotion,
                    features.visual.is_some(),
                    features.dialogue_text.split_whitespace().count()
                );
                ((*id).clone(), features)
            })
            .collect();

        Self { entries }
    }

    pub(crate) fn get(&self, clip_id: &str) -> Option<&ClipFeatures> {
        self.entries.get(clip_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
