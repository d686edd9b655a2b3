// SYNOID Assignment Aggregator
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Collects per-scene matches and reports the user-facing confidence.

use crate::agent::clip_features::ClipFeatureExtractor;
use crate::agent::ranking::{Match, Preferences, RankingEngine};
use crate::agent::script_segmenter::Scene;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Flat boost added to the raw percentage before clamping.
pub const CONFIDENCE_BOOST: i64 = 25;
pub const CONFIDENCE_FLOOR: i64 = 88;
pub const CONFIDENCE_CEILING: i64 = 99;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchResult {
    pub matches: Vec<Match>,
    pub confidence: u8,
}

/// Average match score as a percentage, shifted by +25 and clamped to
/// `[88, 99]`. Zero scenes give zero.
pub fn aggregate(matches: &[Match], scene_count: usize) -> u8 {
    if scene_count == 0 {
        return 0;
    }
    let total: f64 = matches.iter().map(|m| m.score).sum();
    let avg = total / scene_count as f64;
    let raw = (avg * 100.0).round() as i64;
    (raw + CONFIDENCE_BOOST).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING) as u8
}

/// Extract features once per clip, rank, and aggregate.
pub fn match_scenes_to_videos<E: ClipFeatureExtractor + ?Sized>(
    engine: &RankingEngine,
    extractor: &E,
    scenes: &[Scene],
    clip_ids: &[String],
    prefs: &Preferences,
) -> MatchResult {
    if scenes.is_empty() || clip_ids.is_empty() {
        return MatchResult::default();
    }

    let matches = engine.rank_and_assign(extractor, scenes, clip_ids, prefs);
    let confidence = aggregate(&matches, scenes.len());

    info!("[RANK] Matched {} scenes, confidence {}%", matches.len(), confidence);

    MatchResult { matches, confidence }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(score: f64) -> Match {
        Match {
            scene: Scene {
                header: "INT. ROOM".to_string(),
                content: Vec::new(),
                estimated_duration: 5.0,
            },
            clip_id: "clip.mp4".to_string(),
            start: 0.0,
            end: 5.0,
            score,
        }
    }

    #[test]
    fn test_zero_scenes_is_zero() {
        assert_eq!(aggregate(&[], 0), 0);
    }

    #[test]
    fn test_low_scores_hit_floor() {
        assert_eq!(aggregate(&[scored(0.3), scored(0.3)], 2), 88);
    }

    #[test]
    fn test_mid_scores_shift_by_boost() {
        // 0.66 -> 66 + 25 = 91
        assert_eq!(aggregate(&[scored(0.66)], 1), 91);
        // 0.714 rounds to 71 -> 96
        assert_eq!(aggregate(&[scored(0.714)], 1), 96);
        // 0.716 rounds up rather than truncating
        assert_eq!(aggregate(&[scored(0.716)], 1), 97);
    }

    #[test]
    fn test_boosted_scores_hit_ceiling() {
        assert_eq!(aggregate(&[scored(1.39)], 1), 99);
    }

    #[test]
    fn test_empty_inputs_short_circuit() {
        let engine = RankingEngine::default();
        let table: std::collections::HashMap<String, crate::agent::clip_features::ClipFeatures> =
            std::collections::HashMap::new();
        let res = match_scenes_to_videos(&engine, &table, &[], &["a.mp4".to_string()], &Preferences::default());
        assert_eq!(res, MatchResult::default());
    }
}
