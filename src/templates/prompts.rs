//! Natural-language specifications sent to the model, one per build stage.

use crate::model::Dimension;
use crate::orchestrator::StageId;
use crate::registry::{Access, SingletonRegistry};
use crate::templates::{InputAction, MAIN_SCENE, PROJECT_FILE};

/// Engine version every prompt pins the output to.
pub const TARGET_ENGINE: &str = "Godot 3.5.3";
/// Renderer every prompt pins the output to.
pub const TARGET_RENDERER: &str = "GLES2";

fn compatibility_rules(dimension: Dimension) -> String {
    let node_rules = match dimension {
        Dimension::ThreeD => {
            "- NO Node3D, NO StandardMaterial3D, NO CharacterBody3D, NO MeshInstance3D, NO Camera3D.\n\
             - USE Spatial, KinematicBody, SpatialMaterial, MeshInstance, Camera, scene format=2.\n\
             - EVERY MeshInstance MUST have a material linked to 'material/0' (blank white meshes otherwise).\n\
             - Lighting: one DirectionalLight plus a WorldEnvironment with ambient light.\n"
        }
        Dimension::TwoD => {
            "- NO CharacterBody2D, NO Sprite2D, NO Marker2D.\n\
             - USE KinematicBody2D, Sprite, Position2D, scene format=2.\n"
        }
    };
    let actions = InputAction::ALL
        .iter()
        .map(|a| a.name())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "TARGET COMPATIBILITY ({TARGET_ENGINE}, {TARGET_RENDERER}):\n\
         {node_rules}\
         - GDScript 1.0 syntax: 'onready var' and 'export var', never '@onready' or '@export'.\n\
         - Input actions defined in project.godot: {actions}. Never use ui_* actions for gameplay.\n\
         - Do NOT generate {PROJECT_FILE} or {MAIN_SCENE}; both are provided.\n"
    )
}

fn registry_section(stage: StageId, registry: &SingletonRegistry) -> String {
    let mut out = String::from("GLOBAL SCRIPTS (fixed paths and names, do not move or rename):\n");
    for entry in registry.entries() {
        let access = match entry.access {
            Access::Autoload => "autoload singleton, do NOT declare class_name",
            Access::ClassName => "declares class_name",
            Access::Scene => "scene",
        };
        let ownership = if entry.owner == stage {
            "CREATE IN THIS STEP"
        } else {
            "created in another step, reference by name only"
        };
        out.push_str(&format!(
            "- {} at {} ({access}; {ownership}): {}\n",
            entry.name,
            entry.path,
            entry.purpose
        ));
    }
    let owned: Vec<&str> = registry.owned_by(stage).map(|e| e.path).collect();
    if !owned.is_empty() {
        out.push_str(&format!("THIS STEP MUST RETURN: {}\n", owned.join(", ")));
    }
    out
}

fn stage_task(stage: StageId, dimension: Dimension) -> String {
    match stage {
        StageId::CoreManagers => "CORE MANAGERS: Create SaveManager and InventoryManager. \
             Include basic item data structures (id, name, type, quantity) and \
             save/load of the inventory through SaveManager."
            .to_string(),
        StageId::PlayerSystems => format!(
            "PLAYER & STATS: Create a complete {dimension} player controller that uses the \
             global InventoryManager and a VitalStats class (health, hunger, thirst). \
             WASD and arrow keys move through the move_* actions; 'interact' picks up items."
        ),
        StageId::UiInteraction => "UI & INTERACTION: Create an inventory UI that reads \
             InventoryManager, a HUD scene with vital stat bars, and a simple enemy AI \
             that roams and chases the player."
            .to_string(),
    }
}

/// Builds the full prompt for one stage.
pub fn stage_prompt(
    stage: StageId,
    project_name: &str,
    dimension: Dimension,
    registry: &SingletonRegistry,
) -> String {
    format!(
        "ACT AS: Senior {TARGET_ENGINE} ({TARGET_RENDERER}) game architect.\n\
         PROJECT: \"{project_name}\", a {dimension} survival RPG.\n\n\
         {rules}\n\
         {globals}\n\
         TASK: {task}\n\n\
         FILES: paths relative to the project root, no res:// prefix, '/' separators.\n\
         RETURN ONLY VALID JSON: {{\"files\": [{{\"path\": string, \"content\": string}}]}}\n",
        rules = compatibility_rules(dimension),
        globals = registry_section(stage, registry),
        task = stage_task(stage, dimension),
    )
}
