use synoid_roughcut::agent::script_segmenter::{segment, ScriptSegmenter};

#[test]
fn test_two_slug_line_scenes() {
    let text = "INT. LAB - DAY\nComputer beeps.\n\nEXT. SPACE - NIGHT\nStars twinkle.";
    let scenes = segment(text);

    assert_eq!(scenes.len(), 2);
    assert_eq!(scenes[0].header, "INT. LAB - DAY");
    assert_eq!(scenes[0].content, vec!["Computer beeps."]);
    assert_eq!(scenes[1].header, "EXT. SPACE - NIGHT");
    assert_eq!(scenes[1].content, vec!["Stars twinkle."]);
    assert_eq!(scenes[0].estimated_duration, 6.0);
}

#[test]
fn test_empty_and_whitespace_scripts() {
    assert!(segment("").is_empty());
    assert!(segment("   ").is_empty());
    assert!(segment("\n\t\n  \n").is_empty());
}

#[test]
fn test_prose_before_first_header() {
    let text = "A quiet town at dawn.\nBirds sing.\nScene 2\nThe mayor smiles.";
    let scenes = segment(text);

    assert_eq!(scenes.len(), 2);
    assert_eq!(scenes[0].header, "Scene 1 (Auto-Detected)");
    assert_eq!(scenes[0].content, vec!["A quiet town at dawn.", "Birds sing."]);
    assert_eq!(scenes[1].header, "Scene 2");
}

#[test]
fn test_numbered_headers() {
    let text = "1. The park\nKids run around.\n2) Rooftop\nWind howls.\n  3. Kitchen  \nPans clatter.";
    let scenes = segment(text);
    let headers: Vec<&str> = scenes.iter().map(|s| s.header.as_str()).collect();
    assert_eq!(headers, vec!["1. The park", "2) Rooftop", "3. Kitchen"]);
}

#[test]
fn test_content_order_is_preserved() {
    let scenes = segment("EXT. FIELD\nfirst\nsecond\nthird");
    assert_eq!(scenes[0].content, vec!["first", "second", "third"]);
    assert_eq!(scenes[0].joined_content(), "first second third");
}

#[test]
fn test_durations_have_base_floor() {
    let text = "Opening prose.\nINT. A\nINT. B\nOne two three four.\nEXT. C\n";
    let scenes = segment(text);
    assert!(!scenes.is_empty());

    let total: f64 = scenes.iter().map(|s| s.estimated_duration).sum();
    assert!(total >= 5.0 * scenes.len() as f64);
    for scene in &scenes {
        assert_eq!(
            scene.estimated_duration,
            5.0 + 0.5 * scene.word_count() as f64
        );
    }
}

#[test]
fn test_segmenter_state_machine_directly() {
    let mut seg = ScriptSegmenter::new();
    seg.push_line("INT. HALLWAY");
    assert!(seg.header_seen());
    assert!(seg.has_open_scene());
    seg.push_line("Footsteps.");
    let scenes = seg.finish();
    assert_eq!(scenes.len(), 1);
    // durations are filled in by `segment`, not the state machine
    assert_eq!(scenes[0].estimated_duration, 0.0);
}
