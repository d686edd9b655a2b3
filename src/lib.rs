// SYNOID Rough Cut Library
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Script-to-footage assembly: scene segmentation, clip feature extraction,
// preference-weighted ranking and rough-cut rendering.

pub mod agent;
pub mod server;
pub mod state;

pub use agent::assignment::{aggregate, match_scenes_to_videos, MatchResult};
pub use agent::clip_features::{
    classify_emotion, ClipFeatureExtractor, ClipFeatures, Emotion, MediaFeatureExtractor, VisualStats,
};
pub use agent::ranking::{Match, MatchingStrategy, Mood, Pacing, Preferences, RankingEngine};
pub use agent::script_segmenter::{segment, Scene};
pub use agent::text_similarity::similarity;
