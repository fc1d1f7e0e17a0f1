//! Best-effort rewriting of model output for the Godot 3.5 / GLES2 target.
//!
//! Every fix is a named [`PatchRule`] over plain text, selected by the file's
//! [`FileKind`]. Rules match blindly over the whole file, not over a parse of
//! it, so a string literal that happens to contain `"ui_up"` or `Node3D` is
//! rewritten too.

mod scene;
mod script;

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Category of a project file, derived from its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// `.tscn` / `.tres` text resources.
    Scene,
    /// `.gd` scripts.
    Script,
    Other,
}

impl FileKind {
    pub fn of(path: &str) -> Self {
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "tscn" | "tres" => FileKind::Scene,
            "gd" => FileKind::Script,
            _ => FileKind::Other,
        }
    }
}

/// A single named text transformation.
#[derive(Clone, Copy)]
pub struct PatchRule {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

const COMMON_RULES: &[PatchRule] = &[PatchRule {
    name: "strip-code-fence",
    apply: strip_code_fence,
}];

const SCENE_RULES: &[PatchRule] = &[
    PatchRule {
        name: "scene-format-marker",
        apply: scene::normalize_format_marker,
    },
    PatchRule {
        name: "legacy-type-names",
        apply: remap_legacy_types,
    },
    PatchRule {
        name: "default-material-slot",
        apply: scene::link_default_material,
    },
];

const SCRIPT_RULES: &[PatchRule] = &[
    PatchRule {
        name: "legacy-type-names",
        apply: remap_legacy_types,
    },
    PatchRule {
        name: "legacy-script-api",
        apply: script::remap_legacy_api,
    },
    PatchRule {
        name: "input-action-names",
        apply: script::remap_input_actions,
    },
];

/// The rules that run for a file of the given kind, in order.
pub fn rules_for(kind: FileKind) -> impl Iterator<Item = &'static PatchRule> {
    let specific: &'static [PatchRule] = match kind {
        FileKind::Scene => SCENE_RULES,
        FileKind::Script => SCRIPT_RULES,
        FileKind::Other => &[],
    };
    COMMON_RULES.iter().chain(specific.iter())
}

/// Rewrites `raw` for the legacy target. Never fails.
pub fn patch(path: &str, raw: &str) -> String {
    patch_with_report(path, raw).0
}

/// Like [`patch`], also returning the names of the rules that changed something.
pub fn patch_with_report(path: &str, raw: &str) -> (String, Vec<&'static str>) {
    let mut content = raw.to_string();
    let mut applied = Vec::new();

    for rule in rules_for(FileKind::of(path)) {
        let next = (rule.apply)(&content);
        if next != content {
            applied.push(rule.name);
            content = next;
        }
    }

    if !applied.is_empty() {
        tracing::debug!(path, rules = ?applied, "patched generated file");
    }
    (content, applied)
}

static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[\w+#.-]*[ \t]*(\r?\n|$)").expect("valid regex"));
static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\r?\n)?```[ \t]*$").expect("valid regex"));

/// Removes a Markdown code fence wrapped around the whole file, with or
/// without a language tag. Nested wrappers are peeled until none remain.
pub fn strip_code_fence(content: &str) -> String {
    let mut current = content.trim();
    let mut stripped = false;

    loop {
        let mut next = current;
        if let Some(m) = OPENING_FENCE.find(next) {
            next = &next[m.end()..];
        }
        if let Some(m) = CLOSING_FENCE.find(next) {
            next = &next[..m.start()];
        }
        let next = next.trim();
        if next.len() == current.len() {
            break;
        }
        current = next;
        stripped = true;
    }

    if stripped {
        current.to_string()
    } else {
        content.to_string()
    }
}

/// Godot 4 class names and their Godot 3 equivalents.
pub const LEGACY_TYPE_NAMES: &[(&str, &str)] = &[
    ("Node3D", "Spatial"),
    ("CharacterBody3D", "KinematicBody"),
    ("CharacterBody2D", "KinematicBody2D"),
    ("StaticBody3D", "StaticBody"),
    ("RigidBody3D", "RigidBody"),
    ("Area3D", "Area"),
    ("CollisionShape3D", "CollisionShape"),
    ("MeshInstance3D", "MeshInstance"),
    ("Camera3D", "Camera"),
    ("DirectionalLight3D", "DirectionalLight"),
    ("OmniLight3D", "OmniLight"),
    ("SpotLight3D", "SpotLight"),
    ("StandardMaterial3D", "SpatialMaterial"),
    ("ORMMaterial3D", "SpatialMaterial"),
    ("BoxMesh", "CubeMesh"),
    ("BoxShape3D", "BoxShape"),
    ("CapsuleShape3D", "CapsuleShape"),
    ("SphereShape3D", "SphereShape"),
    ("CSGBox3D", "CSGBox"),
    ("CSGSphere3D", "CSGSphere"),
    ("CSGCylinder3D", "CSGCylinder"),
    ("Transform3D", "Transform"),
    ("Marker3D", "Position3D"),
    ("Marker2D", "Position2D"),
    ("Sprite2D", "Sprite"),
    ("AnimatedSprite2D", "AnimatedSprite"),
    ("Texture2D", "Texture"),
    ("PackedStringArray", "PoolStringArray"),
    ("PackedVector2Array", "PoolVector2Array"),
    ("PackedVector3Array", "PoolVector3Array"),
];

static LEGACY_TYPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = LEGACY_TYPE_NAMES
        .iter()
        .map(|(newer, _)| regex::escape(newer))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("valid regex")
});

/// Replaces whole-identifier occurrences of newer class names with legacy ones.
pub fn remap_legacy_types(content: &str) -> String {
    LEGACY_TYPE_PATTERN
        .replace_all(content, |caps: &Captures| {
            let found = &caps[0];
            LEGACY_TYPE_NAMES
                .iter()
                .find(|(newer, _)| *newer == found)
                .map(|(_, legacy)| (*legacy).to_string())
                .unwrap_or_else(|| found.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind() {
        assert_eq!(FileKind::of("main.tscn"), FileKind::Scene);
        assert_eq!(FileKind::of("ui/theme.TRES"), FileKind::Scene);
        assert_eq!(FileKind::of("scripts/player.gd"), FileKind::Script);
        assert_eq!(FileKind::of("project.godot"), FileKind::Other);
        assert_eq!(FileKind::of("README"), FileKind::Other);
    }

    #[test]
    fn test_strip_fence_with_language_tag() {
        assert_eq!(strip_code_fence("```gdscript\nvar x = 1\n```"), "var x = 1");
    }

    #[test]
    fn test_strip_fence_without_tag_and_crlf() {
        assert_eq!(strip_code_fence("```\r\nextends Node\r\n```\r\n"), "extends Node");
    }

    #[test]
    fn test_strip_fence_leaves_plain_content_alone() {
        let plain = "extends Node\n\nfunc _ready():\n\tpass\n";
        assert_eq!(strip_code_fence(plain), plain);
    }

    #[test]
    fn test_strip_fence_nested() {
        assert_eq!(strip_code_fence("```\n```gd\nvar y = 2\n```\n```"), "var y = 2");
    }

    #[test]
    fn test_strip_fence_is_idempotent() {
        let once = strip_code_fence("```tscn\n[gd_scene format=2]\n```");
        assert_eq!(strip_code_fence(&once), once);
    }

    #[test]
    fn test_legacy_types_whole_identifiers_only() {
        let input = "extends CharacterBody3D\nvar m: MeshInstance3D\nvar s = \"MyNode3DThing\"";
        let out = remap_legacy_types(input);
        assert!(out.contains("extends KinematicBody\n"));
        assert!(out.contains("var m: MeshInstance\n"));
        assert!(out.contains("MyNode3DThing"));
    }

    #[test]
    fn test_scene_type_remap() {
        let scene = "[gd_scene load_steps=1 format=3]\n\n[node name=\"Player\" type=\"CharacterBody3D\"]\n";
        let out = patch("main.tscn", scene);
        assert!(out.contains("type=\"KinematicBody\""));
        assert!(!out.contains("CharacterBody3D"));
    }

    #[test]
    fn test_fenced_script_patch() {
        assert_eq!(patch("scripts/a.gd", "```gdscript\nvar x = 1\n```"), "var x = 1");
    }

    #[test]
    fn test_other_files_only_lose_fences() {
        let cfg = "```ini\nconfig_version=4\nNode3D\n```";
        assert_eq!(patch("project.godot", cfg), "config_version=4\nNode3D");
    }

    #[test]
    fn test_patch_is_idempotent() {
        let scene = "```\n[gd_scene load_steps=3 format=3 uid=\"uid://main\"]\n\n[sub_resource type=\"BoxMesh\" id=\"1\"]\n\n[node name=\"World\" type=\"Node3D\"]\n\n[node name=\"Ground\" type=\"MeshInstance3D\" parent=\".\"]\nmesh = SubResource(\"1\")\n```";
        let script = "```gdscript\nextends CharacterBody3D\n@onready var cam = $Camera3D\nfunc _physics_process(d):\n\tif Input.is_action_pressed(\"ui_up\"):\n\t\tpass\n```";

        for (path, raw) in [("main.tscn", scene), ("scripts/player.gd", script)] {
            let once = patch(path, raw);
            assert_eq!(patch(path, &once), once, "{path} not idempotent");
        }
    }

    #[test]
    fn test_patch_report_names_rules() {
        let (_, applied) = patch_with_report("main.tscn", "[node name=\"W\" type=\"Node3D\"]");
        assert_eq!(applied, ["legacy-type-names"]);
    }
}
