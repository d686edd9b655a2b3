// SYNOID Ranking Engine
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Scores every candidate clip against each scene and greedily assigns the
// best one, scene by scene, in script order.
//
// Ranking Score = text * w_text + emotion * w_emotion + visual * w_visual
//               + emotion-match bias + offset   (capped)
//               + director mood boost + live emotion boost   (uncapped)

use crate::agent::clip_features::{ClipFeatureExtractor, ClipFeatures, Emotion, FeatureCache};
use crate::agent::script_segmenter::Scene;
use crate::agent::text_similarity::similarity;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Tunable weights of the ranking model. Defaults reproduce the shipped
/// scoring exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingStrategy {
    pub text_weight: f64,
    pub emotion_weight: f64,
    pub visual_weight: f64,
    pub emotion_match_score: f64,
    pub neutral_scene_score: f64,
    pub emotion_mismatch_score: f64,
    pub visual_base: f64,
    pub fps_threshold: f64,
    pub fps_bonus: f64,
    pub duration_threshold: f64,
    pub duration_bonus: f64,
    pub emotion_match_bias: f64,
    pub base_offset: f64,
    pub score_ceiling: f64,
    pub mood_boost: f64,
    pub live_emotion_boost: f64,
    pub fallback_score: f64,
    pub fast_multiplier: f64,
    pub slow_multiplier: f64,
}

impl Default for MatchingStrategy {
    fn default() -> Self {
        Self {
            text_weight: 0.3,
            emotion_weight: 0.6,
            visual_weight: 0.1,
            emotion_match_score: 1.0,
            neutral_scene_score: 0.5,
            emotion_mismatch_score: -0.5,
            visual_base: 0.5,
            fps_threshold: 20.0,
            fps_bonus: 0.2,
            duration_threshold: 2.0,
            duration_bonus: 0.2,
            emotion_match_bias: 0.25,
            base_offset: 0.15,
            score_ceiling: 0.99,
            mood_boost: 0.2,
            live_emotion_boost: 0.2,
            fallback_score: 0.3,
            fast_multiplier: 0.7,
            slow_multiplier: 1.3,
        }
    }
}

impl MatchingStrategy {
    pub const FILE_NAME: &'static str = "matching_strategy.json";

    /// Load from `matching_strategy.json` in the working directory,
    /// falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(Path::new(Self::FILE_NAME))
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(content) = fs::read_to_string(path) {
            match serde_json::from_str(&content) {
                Ok(config) => {
                    info!("[RANK] Loaded matching strategy from {:?}", path);
                    return config;
                }
                Err(e) => warn!("[RANK] Ignoring malformed {:?}: {}", path, e),
            }
        }
        debug!("[RANK] Using default matching strategy");
        Self::default()
    }

    pub fn pacing_multiplier(&self, pacing: Pacing) -> f64 {
        match pacing {
            Pacing::Fast => self.fast_multiplier,
            Pacing::Slow => self.slow_multiplier,
            Pacing::Standard => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Balanced,
    Happy,
    Serious,
}

impl Mood {
    /// Unrecognized values fall back to `Balanced`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "happy" => Mood::Happy,
            "serious" => Mood::Serious,
            _ => Mood::Balanced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pacing {
    #[default]
    Standard,
    Fast,
    Slow,
}

impl Pacing {
    /// Unrecognized values fall back to `Standard`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "fast" => Pacing::Fast,
            "slow" => Pacing::Slow,
            _ => Pacing::Standard,
        }
    }
}

/// Director preferences for one ranking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawPreferences")]
pub struct Preferences {
    pub mood: Mood,
    pub pacing: Pacing,
    pub user_emotion: Option<Emotion>,
}

/// Wire shape of preferences: free strings, all optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPreferences {
    mood: Option<String>,
    pacing: Option<String>,
    user_emotion: Option<String>,
}

impl From<RawPreferences> for Preferences {
    fn from(raw: RawPreferences) -> Self {
        Preferences::from_strs(
            raw.mood.as_deref(),
            raw.pacing.as_deref(),
            raw.user_emotion.as_deref(),
        )
    }
}

impl Preferences {
    pub fn from_strs(mood: Option<&str>, pacing: Option<&str>, user_emotion: Option<&str>) -> Self {
        Self {
            mood: mood.map(Mood::parse).unwrap_or_default(),
            pacing: pacing.map(Pacing::parse).unwrap_or_default(),
            user_emotion: user_emotion.and_then(Emotion::parse),
        }
    }
}

/// One scene paired with the clip chosen for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub scene: Scene,
    pub clip_id: String,
    pub start: f64,
    pub end: f64,
    pub score: f64,
}

/// Emotion implied by scene wording. Keyword groups are checked in order
/// happy, sad, angry.
pub fn scene_emotion(text: &str) -> Emotion {
    let lower = text.to_lowercase();
    if lower.contains("happy") || lower.contains("smile") {
        Emotion::Happy
    } else if lower.contains("sad") || lower.contains("cry") {
        Emotion::Sad
    } else if lower.contains("angry") || lower.contains("shout") {
        Emotion::Angry
    } else {
        Emotion::Neutral
    }
}

/// Score components of one clip against one scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    pub text: f64,
    pub emotion: f64,
    pub visual: f64,
    pub final_score: f64,
}

pub struct RankingEngine {
    strategy: MatchingStrategy,
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new(MatchingStrategy::default())
    }
}

impl RankingEngine {
    pub fn new(strategy: MatchingStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &MatchingStrategy {
        &self.strategy
    }

    pub fn emotion_score(&self, clip: Emotion, scene: Emotion) -> f64 {
        if clip == scene {
            self.strategy.emotion_match_score
        } else if scene == Emotion::Neutral {
            self.strategy.neutral_scene_score
        } else {
            self.strategy.emotion_mismatch_score
        }
    }

    pub fn visual_score(&self, clip: &ClipFeatures) -> f64 {
        let s = &self.strategy;
        let mut score = s.visual_base;
        if let Some(vis) = &clip.visual {
            if vis.fps > s.fps_threshold {
                score += s.fps_bonus;
            }
            if vis.duration > s.duration_threshold {
                score += s.duration_bonus;
            }
        }
        score
    }

    /// Full score of `clip` for a scene whose joined content is
    /// `scene_text` and whose implied emotion is `scene_mood`.
    pub fn score_candidate(
        &self,
        scene_text: &str,
        scene_mood: Emotion,
        clip: &ClipFeatures,
        prefs: &Preferences,
    ) -> CandidateScore {
        let s = &self.strategy;

        let text = similarity(scene_text, &clip.dialogue_text);
        let emotion = self.emotion_score(clip.emotion, scene_mood);
        let visual = self.visual_score(clip);

        let bias = if emotion == s.emotion_match_score {
            s.emotion_match_bias
        } else {
            0.0
        };

        let mut final_score = (text * s.text_weight
            + emotion * s.emotion_weight
            + visual * s.visual_weight
            + bias
            + s.base_offset)
            .min(s.score_ceiling);

        // Preference boosts sit above the ceiling.
        let mood_hit = match prefs.mood {
            Mood::Happy => clip.emotion == Emotion::Happy,
            Mood::Serious => matches!(clip.emotion, Emotion::Sad | Emotion::Angry),
            Mood::Balanced => false,
        };
        if mood_hit {
            final_score += s.mood_boost;
            debug!("[RANK] {:?} mood boosting {}", prefs.mood, clip.source_id);
        }

        if prefs.user_emotion == Some(clip.emotion) {
            final_score += s.live_emotion_boost;
        }

        CandidateScore {
            text,
            emotion,
            visual,
            final_score,
        }
    }

    /// Greedy per-scene assignment in script order.
    ///
    /// Features are extracted once per distinct clip into a cache that lives
    /// only for this call. A clip used by an earlier scene is skipped only
    /// while there are at least as many distinct clips as scenes. Always
    /// returns one match per scene when `clip_ids` is non-empty.
    pub fn rank_and_assign<E: ClipFeatureExtractor + ?Sized>(
        &self,
        extractor: &E,
        scenes: &[Scene],
        clip_ids: &[String],
        prefs: &Preferences,
    ) -> Vec<Match> {
        if scenes.is_empty() || clip_ids.is_empty() {
            return Vec::new();
        }

        let cache = FeatureCache::build(extractor, clip_ids);
        info!("[RANK] Ranking {} scenes against {} clips", scenes.len(), cache.len());
        self.assign_with_cache(scenes, clip_ids, &cache, prefs)
    }

    /// Assignment pass over already extracted features. A clip missing from
    /// the cache is scored with neutral defaults.
    pub(crate) fn assign_with_cache(
        &self,
        scenes: &[Scene],
        clip_ids: &[String],
        cache: &FeatureCache,
        prefs: &Preferences,
    ) -> Vec<Match> {
        if scenes.is_empty() || clip_ids.is_empty() {
            return Vec::new();
        }

        let multiplier = self.strategy.pacing_multiplier(prefs.pacing);
        let distinct_clips = clip_ids.iter().collect::<HashSet<_>>().len();
        let enforce_unique = distinct_clips >= scenes.len();

        let mut used: HashSet<&str> = HashSet::new();
        let mut matches = Vec::with_capacity(scenes.len());
        let mut rng = rand::thread_rng();

        for scene in scenes {
            let scene_text = scene.joined_content();
            let mood = scene_emotion(&scene_text);

            let mut best: Option<(&str, f64)> = None;

            for clip_id in clip_ids {
                if enforce_unique && used.contains(clip_id.as_str()) {
                    continue;
                }
                let neutral;
                let features = match cache.get(clip_id) {
                    Some(features) => features,
                    None => {
                        warn!("[RANK] No features cached for {}, using neutral defaults", clip_id);
                        neutral = ClipFeatures::neutral(clip_id.as_str());
                        &neutral
                    }
                };

                let score = self.score_candidate(&scene_text, mood, features, prefs);
                debug!(
                    "[RANK] {} | Score: {:.2} (Txt: {:.2}, Emo: {}/{}, Vis: {:.2})",
                    clip_id, score.final_score, score.text, features.emotion, score.emotion, score.visual
                );

                if best.map_or(true, |(_, top)| score.final_score > top) {
                    best = Some((clip_id.as_str(), score.final_score));
                }
            }

            let (clip_id, score) = match best {
                Some(found) => found,
                None => {
                    let fallback = self.fallback_pick(clip_ids, &mut rng);
                    warn!(
                        "[RANK] No eligible clip for '{}', falling back to {}",
                        scene.header, fallback.0
                    );
                    fallback
                }
            };

            used.insert(clip_id);
            matches.push(Match {
                scene: scene.clone(),
                clip_id: clip_id.to_string(),
                start: 0.0,
                end: scene.estimated_duration * multiplier,
                score,
            });
            info!("[RANK] '{}' -> {} ({:.2})", scene.header, clip_id, score);
        }

        matches
    }

    /// Uniform random pick from the whole pool at the fixed fallback score.
    fn fallback_pick<'a, R: Rng + ?Sized>(&self, pool: &'a [String], rng: &mut R) -> (&'a str, f64) {
        let pick = pool.choose(rng).map(String::as_str).unwrap_or_default();
        (pick, self.strategy.fallback_score)
    }
}
