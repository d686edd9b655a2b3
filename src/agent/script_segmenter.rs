// SYNOID Script Segmenter
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Turns free screenplay-like text into ordered scenes with an estimated
// on-screen duration. Headers are slug lines (INT./EXT.), "Scene N" or
// simple numbering ("1." / "1)").

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Base on-screen time of every scene, in seconds.
pub const BASE_SCENE_SECS: f64 = 5.0;
/// Additional seconds per word of scene content.
pub const SECS_PER_WORD: f64 = 0.5;

const AUTO_DETECTED_HEADER: &str = "Scene 1 (Auto-Detected)";
const DEFAULT_HEADER: &str = "Scene 1 (Default)";

/// A structured unit of the script: one header line plus its body lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub header: String,
    pub content: Vec<String>,
    #[serde(default = "default_duration")]
    pub estimated_duration: f64,
}

fn default_duration() -> f64 {
    BASE_SCENE_SECS
}

impl Scene {
    /// Body lines joined with single spaces, in script order.
    pub fn joined_content(&self) -> String {
        self.content.join(" ")
    }

    pub fn word_count(&self) -> usize {
        self.content
            .iter()
            .map(|line| line.split_whitespace().count())
            .sum()
    }
}

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"(?i)^(INT\.|EXT\.|Scene\s+\d+|\d+\.|\d+\))").expect("scene header pattern is valid")
    })
}

/// True when a trimmed line opens a new scene.
pub fn is_scene_header(line: &str) -> bool {
    header_regex().is_match(line)
}

/// Scene being accumulated before it is emitted.
#[derive(Debug)]
struct OpenScene {
    header: String,
    content: Vec<String>,
}

impl OpenScene {
    fn close(self) -> Scene {
        Scene {
            header: self.header,
            content: self.content,
            estimated_duration: 0.0,
        }
    }
}

#[derive(Debug)]
enum SegmenterState {
    NoSceneOpen,
    SceneOpen(OpenScene),
}

/// Line-driven segmentation state machine.
///
/// `header_seen` flips once, either on the first real header or when the
/// implicit first scene is synthesized for prose that precedes any header.
#[derive(Debug)]
pub struct ScriptSegmenter {
    state: SegmenterState,
    header_seen: bool,
    scenes: Vec<Scene>,
}

impl Default for ScriptSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptSegmenter {
    pub fn new() -> Self {
        Self {
            state: SegmenterState::NoSceneOpen,
            header_seen: false,
            scenes: Vec::new(),
        }
    }

    /// Whether a header (real or implicit) has been consumed.
    pub fn header_seen(&self) -> bool {
        self.header_seen
    }

    /// Whether a scene is currently accumulating content.
    pub fn has_open_scene(&self) -> bool {
        matches!(self.state, SegmenterState::SceneOpen(_))
    }

    /// Feed a single line. Blank lines are ignored.
    pub fn push_line(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() {
            return;
        }

        let state = std::mem::replace(&mut self.state, SegmenterState::NoSceneOpen);

        self.state = if is_scene_header(line) {
            self.header_seen = true;
            if let SegmenterState::SceneOpen(open) = state {
                self.scenes.push(open.close());
            }
            SegmenterState::SceneOpen(OpenScene {
                header: line.to_string(),
                content: Vec::new(),
            })
        } else {
            match state {
                SegmenterState::SceneOpen(mut open) => {
                    open.content.push(line.to_string());
                    SegmenterState::SceneOpen(open)
                }
                SegmenterState::NoSceneOpen if !self.header_seen => {
                    debug!("[SCRIPT] Prose before first header, opening implicit scene");
                    self.header_seen = true;
                    SegmenterState::SceneOpen(OpenScene {
                        header: AUTO_DETECTED_HEADER.to_string(),
                        content: vec![line.to_string()],
                    })
                }
                SegmenterState::NoSceneOpen => SegmenterState::NoSceneOpen,
            }
        };
    }

    /// Close the last open scene and return everything emitted so far,
    /// without duration estimates.
    pub fn finish(mut self) -> Vec<Scene> {
        if let SegmenterState::SceneOpen(open) = self.state {
            self.scenes.push(open.close());
        }
        self.scenes
    }
}

/// Fill in `estimated_duration` from the word count of each scene body.
pub fn estimate_durations(scenes: &mut [Scene]) {
    for scene in scenes.iter_mut() {
        scene.estimated_duration = BASE_SCENE_SECS + SECS_PER_WORD * scene.word_count() as f64;
    }
}

/// Segment raw script text into ordered scenes.
///
/// Empty or whitespace-only text yields no scenes.
pub fn segment(text: &str) -> Vec<Scene> {
    let mut segmenter = ScriptSegmenter::new();
    for line in text.split('\n') {
        segmenter.push_line(line);
    }
    let mut scenes = segmenter.finish();

    let trimmed = text.trim();
    if scenes.is_empty() && !trimmed.is_empty() {
        scenes.push(Scene {
            header: DEFAULT_HEADER.to_string(),
            content: vec![trimmed.to_string()],
            estimated_duration: 0.0,
        });
    }

    estimate_durations(&mut scenes);

    info!("[SCRIPT] Segmented script into {} scenes", scenes.len());
    scenes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_detection() {
        assert!(is_scene_header("INT. LAB - DAY"));
        assert!(is_scene_header("ext. beach"));
        assert!(is_scene_header("Scene 12: The park"));
        assert!(is_scene_header("scene  3"));
        assert!(is_scene_header("1. The park"));
        assert!(is_scene_header("2) Rooftop"));

        assert!(!is_scene_header("Scene one"));
        assert!(!is_scene_header("Interior of the lab"));
        assert!(!is_scene_header("She counts to 3."));
    }

    #[test]
    fn test_implicit_first_scene_state() {
        let mut seg = ScriptSegmenter::new();
        assert!(!seg.header_seen());
        assert!(!seg.has_open_scene());

        seg.push_line("The camera drifts over a city.");
        assert!(seg.header_seen());
        assert!(seg.has_open_scene());

        seg.push_line("INT. OFFICE - DAY");
        seg.push_line("Phones ring.");
        let scenes = seg.finish();

        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].header, "Scene 1 (Auto-Detected)");
        assert_eq!(scenes[0].content, vec!["The camera drifts over a city."]);
        assert_eq!(scenes[1].header, "INT. OFFICE - DAY");
    }

    #[test]
    fn test_blank_lines_ignored() {
        let mut seg = ScriptSegmenter::new();
        seg.push_line("   ");
        seg.push_line("");
        assert!(!seg.header_seen());
        assert!(seg.finish().is_empty());
    }

    #[test]
    fn test_duration_from_word_count() {
        let scenes = segment("INT. LAB - DAY\nComputer beeps loudly.\nA door opens.");
        assert_eq!(scenes.len(), 1);
        // 6 words
        assert_eq!(scenes[0].estimated_duration, 5.0 + 0.5 * 6.0);
    }

    #[test]
    fn test_header_only_scene_has_base_duration() {
        let scenes = segment("EXT. DESERT - NOON");
        assert_eq!(scenes.len(), 1);
        assert!(scenes[0].content.is_empty());
        assert_eq!(scenes[0].estimated_duration, 5.0);
    }
}
