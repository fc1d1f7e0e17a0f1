//! Rules for GDScript files.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::templates::InputAction;

/// Godot 4 GDScript expressions and their Godot 3 spelling.
/// Each entry is a regex and its replacement template.
const LEGACY_API: &[(&str, &str)] = &[
    (r"@onready\b", "onready"),
    (r"@export\b", "export"),
    (r"@tool\b", "tool"),
    (r"\bdeg_to_rad\(", "deg2rad("),
    (r"\brad_to_deg\(", "rad2deg("),
    (r"\brandf_range\(", "rand_range("),
    (r"\.instantiate\(\)", ".instance()"),
    (r"\bchange_scene_to_file\(", "change_scene("),
    (r"\bchange_scene_to_packed\(", "change_scene_to("),
    (r"\bTime\.get_ticks_msec\(\)", "OS.get_ticks_msec()"),
    (r"\bDisplayServer\.window_get_size\(\)", "OS.window_size"),
    (r"\bColor\.WHITE\b", "Color.white"),
    (r"\bColor\.BLACK\b", "Color.black"),
    (r"\bColor\.RED\b", "Color.red"),
    (r"\bColor\.GREEN\b", "Color.green"),
    (r"\bColor\.BLUE\b", "Color.blue"),
    (r"\bColor\.GRAY\b", "Color.gray"),
];

static LEGACY_API_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    LEGACY_API
        .iter()
        .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid regex"), *replacement))
        .collect()
});

/// Rewrites Godot 4-only annotations, helpers and constants.
pub fn remap_legacy_api(content: &str) -> String {
    let mut out = content.to_string();
    for (pattern, replacement) in LEGACY_API_PATTERNS.iter() {
        if pattern.is_match(&out) {
            out = pattern.replace_all(&out, *replacement).into_owned();
        }
    }
    out
}

/// Built-in action names the model likes to use, and the project action
/// each one stands for.
const DEFAULT_ACTIONS: &[(&str, InputAction)] = &[
    ("ui_up", InputAction::MoveForward),
    ("ui_down", InputAction::MoveBackward),
    ("ui_left", InputAction::MoveLeft),
    ("ui_right", InputAction::MoveRight),
    ("move_up", InputAction::MoveForward),
    ("move_down", InputAction::MoveBackward),
    ("ui_accept", InputAction::Interact),
];

static ACTION_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    let names = DEFAULT_ACTIONS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r#"(["'])({names})["']"#)).expect("valid regex")
});

/// Points quoted default input actions at the actions `project.godot` defines.
pub fn remap_input_actions(content: &str) -> String {
    ACTION_LITERAL
        .replace_all(content, |caps: &Captures| {
            let quote = &caps[1];
            let action = DEFAULT_ACTIONS
                .iter()
                .find(|(name, _)| *name == &caps[2])
                .map(|(_, action)| action.name())
                .unwrap_or_default();
            format!("{quote}{action}{quote}")
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotations_and_helpers() {
        let script = "@tool\nextends Spatial\n@export var speed := 5.0\n@onready var cam = $Camera\nfunc _ready():\n\tvar r = deg_to_rad(45)\n\tvar e = preload(\"res://enemy.tscn\").instantiate()\n";
        let out = remap_legacy_api(script);
        assert!(out.starts_with("tool\n"));
        assert!(out.contains("export var speed := 5.0"));
        assert!(out.contains("onready var cam = $Camera"));
        assert!(out.contains("deg2rad(45)"));
        assert!(out.contains(".instance()"));
        assert!(!out.contains('@'));
    }

    #[test]
    fn test_color_constants() {
        assert_eq!(remap_legacy_api("modulate = Color.GRAY"), "modulate = Color.gray");
        assert_eq!(remap_legacy_api("Color.GRAYISH"), "Color.GRAYISH");
    }

    #[test]
    fn test_legacy_api_is_idempotent() {
        let once = remap_legacy_api("@onready var t = Time.get_ticks_msec()");
        assert_eq!(once, "onready var t = OS.get_ticks_msec()");
        assert_eq!(remap_legacy_api(&once), once);
    }

    #[test]
    fn test_input_actions_remapped() {
        let script = "if Input.is_action_pressed(\"ui_up\"): dir.z -= 1\nif Input.is_action_pressed('ui_left'): dir.x -= 1\n";
        let out = remap_input_actions(script);
        assert!(out.contains("is_action_pressed(\"move_forward\")"));
        assert!(out.contains("is_action_pressed('move_left')"));
        assert_eq!(remap_input_actions(&out), out);
    }

    #[test]
    fn test_input_actions_blind_to_context() {
        // A plain string that happens to equal an action name is rewritten too.
        let out = remap_input_actions("var label = \"ui_down\"");
        assert_eq!(out, "var label = \"move_backward\"");
        // Partial names are left alone.
        assert_eq!(remap_input_actions("\"ui_up_fast\""), "\"ui_up_fast\"");
    }
}
