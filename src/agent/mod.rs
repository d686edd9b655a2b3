// SYNOID Agent Modules
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod assignment;
pub mod clip_features;
pub mod production_tools;
pub mod ranking;
pub mod script_segmenter;
pub mod source_tools;
pub mod text_similarity;
pub mod transcription;
pub mod vision_tools;
