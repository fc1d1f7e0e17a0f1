//! Declared locations of the scripts that other generated scripts refer to by name.
//!
//! Every stage prompt lists the whole registry, so a later stage knows the
//! exact path and global name of what an earlier stage was told to create.
//! The autoload entries also drive the `[autoload]` section of `project.godot`.

use crate::orchestrator::StageId;

/// The job a globally referenced script does in the generated game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    SaveSystem,
    Inventory,
    VitalStats,
    PlayerController,
    InventoryUi,
    Hud,
    Enemy,
}

/// How other scripts reach the entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Registered under `[autoload]`; must not also declare `class_name`.
    Autoload,
    /// Declares `class_name` and is referenced as a type.
    ClassName,
    /// A scene instanced by path.
    Scene,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryEntry {
    pub role: Role,
    /// Autoload name or `class_name`.
    pub name: &'static str,
    /// Path relative to the project root.
    pub path: &'static str,
    pub access: Access,
    /// The stage whose prompt asks for this file.
    pub owner: StageId,
    pub purpose: &'static str,
}

impl RegistryEntry {
    pub fn res_path(&self) -> String {
        format!("res://{}", self.path)
    }
}

#[derive(Clone, Debug)]
pub struct SingletonRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for SingletonRegistry {
    fn default() -> Self {
        Self {
            entries: vec![
                RegistryEntry {
                    role: Role::SaveSystem,
                    name: "SaveManager",
                    path: "scripts/managers/save_manager.gd",
                    access: Access::Autoload,
                    owner: StageId::CoreManagers,
                    purpose: "saves and loads player progress to user://savegame.json",
                },
                RegistryEntry {
                    role: Role::Inventory,
                    name: "InventoryManager",
                    path: "scripts/managers/inventory_manager.gd",
                    access: Access::Autoload,
                    owner: StageId::CoreManagers,
                    purpose: "holds item stacks; emits inventory_changed when they change",
                },
                RegistryEntry {
                    role: Role::VitalStats,
                    name: "VitalStats",
                    path: "scripts/player/vital_stats.gd",
                    access: Access::ClassName,
                    owner: StageId::PlayerSystems,
                    purpose: "health, hunger and thirst values with change signals",
                },
                RegistryEntry {
                    role: Role::PlayerController,
                    name: "PlayerController",
                    path: "scripts/player/player.gd",
                    access: Access::ClassName,
                    owner: StageId::PlayerSystems,
                    purpose: "movement, camera control and interaction for the Player node",
                },
                RegistryEntry {
                    role: Role::InventoryUi,
                    name: "InventoryUI",
                    path: "ui/inventory_ui.gd",
                    access: Access::ClassName,
                    owner: StageId::UiInteraction,
                    purpose: "grid of item slots bound to InventoryManager",
                },
                RegistryEntry {
                    role: Role::Hud,
                    name: "Hud",
                    path: "ui/hud.tscn",
                    access: Access::Scene,
                    owner: StageId::UiInteraction,
                    purpose: "stat bars and the inventory panel",
                },
                RegistryEntry {
                    role: Role::Enemy,
                    name: "Enemy",
                    path: "scripts/enemies/enemy.gd",
                    access: Access::ClassName,
                    owner: StageId::UiInteraction,
                    purpose: "simple roaming and chasing enemy",
                },
            ],
        }
    }
}

impl SingletonRegistry {
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn autoloads(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter().filter(|e| e.access == Access::Autoload)
    }

    pub fn owned_by(&self, stage: StageId) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter().filter(move |e| e.owner == stage)
    }
}
