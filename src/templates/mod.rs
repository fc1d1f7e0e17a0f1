pub mod prompts;

use crate::model::{Dimension, GeneratedFile};
use crate::registry::SingletonRegistry;

/// Path of the engine configuration file inside the archive.
pub const PROJECT_FILE: &str = "project.godot";
/// Path of the root scene inside the archive.
pub const MAIN_SCENE: &str = "main.tscn";

/// Input actions declared in `project.godot`. Generated scripts are told to
/// use exactly these names, and the patch engine maps defaults onto them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    Interact,
    Action,
    Inventory,
}

/// A physical input bound to an action.
enum Binding {
    Key(u32),
    MouseButton(u32),
}

// Godot 3 scancodes for the arrow keys.
const KEY_LEFT: u32 = 16_777_231;
const KEY_UP: u32 = 16_777_232;
const KEY_RIGHT: u32 = 16_777_233;
const KEY_DOWN: u32 = 16_777_234;

impl InputAction {
    pub const ALL: [InputAction; 7] = [
        InputAction::MoveForward,
        InputAction::MoveBackward,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Interact,
        InputAction::Action,
        InputAction::Inventory,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InputAction::MoveForward => "move_forward",
            InputAction::MoveBackward => "move_backward",
            InputAction::MoveLeft => "move_left",
            InputAction::MoveRight => "move_right",
            InputAction::Interact => "interact",
            InputAction::Action => "action",
            InputAction::Inventory => "inventory",
        }
    }

    fn bindings(self) -> &'static [Binding] {
        match self {
            InputAction::MoveForward => &[Binding::Key(87), Binding::Key(KEY_UP)],
            InputAction::MoveBackward => &[Binding::Key(83), Binding::Key(KEY_DOWN)],
            InputAction::MoveLeft => &[Binding::Key(65), Binding::Key(KEY_LEFT)],
            InputAction::MoveRight => &[Binding::Key(68), Binding::Key(KEY_RIGHT)],
            InputAction::Interact => &[Binding::Key(69)],
            InputAction::Action => &[Binding::MouseButton(1)],
            InputAction::Inventory => &[Binding::Key(73)],
        }
    }
}

fn render_binding(binding: &Binding) -> String {
    match binding {
        Binding::Key(scancode) => format!(
            r#"Object(InputEventKey,"resource_local_to_scene":false,"resource_name":"","device":0,"alt":false,"shift":false,"control":false,"meta":false,"command":false,"pressed":false,"scancode":{scancode},"physical_scancode":0,"unicode":0,"echo":false,"script":null)"#
        ),
        Binding::MouseButton(index) => format!(
            r#"Object(InputEventMouseButton,"resource_local_to_scene":false,"resource_name":"","device":0,"alt":false,"shift":false,"control":false,"meta":false,"command":false,"button_mask":0,"position":Vector2( 0, 0 ),"global_position":Vector2( 0, 0 ),"factor":1.0,"button_index":{index},"pressed":false,"doubleclick":false,"script":null)"#
        ),
    }
}

fn input_section() -> String {
    let mut out = String::from("[input]\n\n");
    for action in InputAction::ALL {
        let events = action
            .bindings()
            .iter()
            .map(render_binding)
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "{}={{\n\"deadzone\": 0.5,\n\"events\": [ {events} ]\n}}\n",
            action.name()
        ));
    }
    out
}

/// Returns the `project.godot` content for a Godot 3.5 GLES2 project.
pub fn project_godot(project_name: &str, registry: &SingletonRegistry) -> String {
    let autoloads: String = registry
        .autoloads()
        .map(|e| format!("{}=\"*{}\"\n", e.name, e.res_path()))
        .collect();

    format!(
        r#"; Engine configuration file.
; Generated by Godot Architect for Godot 3.5 (GLES2).

config_version=4

[application]

config/name="{project_name}"
run/main_scene="res://{MAIN_SCENE}"

[autoload]

{autoloads}
[display]

window/size/width=1280
window/size/height=720
window/size/resizable=true
window/stretch/mode="2d"
window/stretch/aspect="keep"

{input}
[rendering]

quality/driver/driver_name="GLES2"
quality/driver/fallback_to_gles2=true
vram_compression/import_etc=true
vram_compression/import_etc2=false
environment/default_clear_color=Color( 0.53, 0.81, 0.92, 1 )
"#,
        input = input_section(),
    )
}

/// Returns the root scene: lit ground plane with a player and camera in 3D,
/// or a player with a following camera in 2D.
pub fn main_scene(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::ThreeD => {
            r#"[gd_scene load_steps=3 format=2]

[sub_resource type="SpatialMaterial" id=1]
albedo_color = Color( 0.36, 0.55, 0.27, 1 )

[sub_resource type="Environment" id=2]
background_mode = 1
background_color = Color( 0.53, 0.81, 0.92, 1 )
ambient_light_color = Color( 0.8, 0.8, 0.8, 1 )
ambient_light_energy = 0.6

[node name="World" type="Spatial"]

[node name="WorldEnvironment" type="WorldEnvironment" parent="."]
environment = SubResource( 2 )

[node name="DirectionalLight" type="DirectionalLight" parent="."]
transform = Transform( 1, 0, 0, 0, 0.707107, 0.707107, 0, -0.707107, 0.707107, 0, 5, 0 )
shadow_enabled = true

[node name="Player" type="KinematicBody" parent="."]
transform = Transform( 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1, 0 )

[node name="Camera" type="Camera" parent="Player"]
transform = Transform( 1, 0, 0, 0, 0.5, 0.866025, 0, -0.866025, 0.5, 0, 10, 5 )
current = true

[node name="Ground" type="CSGBox" parent="."]
use_collision = true
width = 100.0
height = 0.1
depth = 100.0
material = SubResource( 1 )
"#
        }
        Dimension::TwoD => {
            r#"[gd_scene format=2]

[node name="World" type="Node2D"]

[node name="Player" type="KinematicBody2D" parent="."]
position = Vector2( 640, 360 )

[node name="Camera2D" type="Camera2D" parent="Player"]
current = true
smoothing_enabled = true
"#
        }
    }
}

/// The files that always ship with fixed content, whatever the model produced.
pub fn core_files(
    project_name: &str,
    dimension: Dimension,
    registry: &SingletonRegistry,
) -> Vec<GeneratedFile> {
    vec![
        GeneratedFile::new(PROJECT_FILE, project_godot(project_name, registry)),
        GeneratedFile::new(MAIN_SCENE, main_scene(dimension)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch;

    #[test]
    fn test_project_godot_lists_autoloads_and_actions() {
        let cfg = project_godot("MyRPG", &SingletonRegistry::default());
        assert!(cfg.contains("config/name=\"MyRPG\""));
        assert!(cfg.contains("SaveManager=\"*res://scripts/managers/save_manager.gd\"\n"));
        assert!(cfg.contains("InventoryManager=\"*res://scripts/managers/inventory_manager.gd\"\n"));
        assert!(!cfg.contains("VitalStats="));
        for action in InputAction::ALL {
            assert!(cfg.contains(&format!("\n{}={{", action.name())), "{action:?}");
        }
        assert!(cfg.contains("\"scancode\":87"));
        assert!(cfg.contains("\"button_index\":1"));
        assert!(cfg.contains("driver_name=\"GLES2\""));
    }

    #[test]
    fn test_core_files_order_and_paths() {
        let files = core_files("X", Dimension::TwoD, &SingletonRegistry::default());
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, [PROJECT_FILE, MAIN_SCENE]);
        assert!(files[1].content.contains("KinematicBody2D"));
    }

    #[test]
    fn test_core_scenes_already_legacy() {
        // The patch engine must find nothing to fix in the fixed templates.
        for dimension in [Dimension::TwoD, Dimension::ThreeD] {
            let scene = main_scene(dimension);
            assert_eq!(patch::patch(MAIN_SCENE, scene), scene, "{dimension}");
        }
    }
}
