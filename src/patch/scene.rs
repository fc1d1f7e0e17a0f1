//! Rules for `.tscn` / `.tres` text scenes.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Scene file format understood by Godot 3.x.
pub const LEGACY_SCENE_FORMAT: u32 = 2;

/// `resource_name` given to the material injected by [`link_default_material`].
pub const DEFAULT_MATERIAL_NAME: &str = "ArchitectDefaultMaterial";

static FILE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\[(gd_scene|gd_resource)\b([^\]\n]*)\]").expect("valid regex")
});
static FORMAT_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bformat=\d+").expect("valid regex"));
static UID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[ \t]+uid="[^"]*""#).expect("valid regex"));
static SECTION_UID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^(\[ext_resource\b[^\]\n]*?)[ \t]+uid="[^"]*""#).expect("valid regex"));

/// Forces the file header to `format=2` and drops Godot 4 `uid="..."`
/// attributes from the header and from `ext_resource` lines.
pub fn normalize_format_marker(content: &str) -> String {
    let headers_fixed = FILE_HEADER.replace_all(content, |caps: &Captures| {
        let attrs = FORMAT_ATTR.replace_all(&caps[2], format!("format={LEGACY_SCENE_FORMAT}").as_str());
        let attrs = UID_ATTR.replace_all(&attrs, "");
        format!("[{}{}]", &caps[1], attrs)
    });
    SECTION_UID.replace_all(&headers_fixed, "$1").into_owned()
}

static MESH_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*mesh\s*=\s*SubResource\(\s*([^)]*?)\s*\)").expect("valid regex")
});
static MATERIAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*material\s*=\s*SubResource\(\s*([^)]*?)\s*\)").expect("valid regex")
});
static SLOT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*material/0\s*=").expect("valid regex"));
static ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bid=("[^"]*"|[^\s\]]+)"#).expect("valid regex"));
static TYPE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\btype="([^"]*)""#).expect("valid regex"));
static LOAD_STEPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bload_steps=(\d+)").expect("valid regex"));

/// One `[...]` block of a text scene: the header line plus its property lines.
struct Section {
    lines: Vec<String>,
}

impl Section {
    fn header(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or_default()
    }

    fn is(&self, tag: &str) -> bool {
        self.header()
            .strip_prefix('[')
            .is_some_and(|rest| rest.starts_with(tag) && rest[tag.len()..].starts_with([' ', ']']))
    }

    fn type_name(&self) -> Option<&str> {
        TYPE_ATTR
            .captures(self.header())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    fn id(&self) -> Option<String> {
        ID_ATTR
            .captures(self.header())
            .map(|c| normalize_ref(&c[1]))
    }

    fn property_ref(&self, pattern: &Regex) -> Option<String> {
        self.lines
            .iter()
            .skip(1)
            .find_map(|l| pattern.captures(l).map(|c| normalize_ref(&c[1])))
    }

    fn has_line(&self, pattern: &Regex) -> bool {
        self.lines.iter().skip(1).any(|l| pattern.is_match(l))
    }

    /// Inserts a property line after the last non-blank line of the section.
    fn push_property(&mut self, line: String) {
        let at = self
            .lines
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .map_or(self.lines.len(), |i| i + 1);
        self.lines.insert(at, line);
    }
}

/// `"1"`, `1` and ` 1 ` all name the same sub-resource.
fn normalize_ref(raw: &str) -> String {
    raw.trim().trim_matches('"').to_string()
}

/// Renders a reference the way the surrounding file writes ids.
fn render_ref(id: &str) -> String {
    if id.chars().all(|c| c.is_ascii_digit()) {
        format!("SubResource( {id} )")
    } else {
        format!("SubResource( \"{id}\" )")
    }
}

fn split_sections(content: &str) -> (Vec<String>, Vec<Section>) {
    let mut preamble = Vec::new();
    let mut sections: Vec<Section> = Vec::new();
    for line in content.split('\n') {
        if line.starts_with('[') {
            sections.push(Section {
                lines: vec![line.to_string()],
            });
        } else if let Some(current) = sections.last_mut() {
            current.lines.push(line.to_string());
        } else {
            preamble.push(line.to_string());
        }
    }
    (preamble, sections)
}

/// Every `MeshInstance` node with a mesh but no `material/0` gets one.
///
/// The slot links to the material the mesh sub-resource itself declares
/// (`material = SubResource(..)`); meshes without one share a single injected
/// flat-colored `SpatialMaterial`. GLES2 on older Intel GPUs renders
/// material-less meshes as blank white geometry.
pub fn link_default_material(content: &str) -> String {
    // Lines are split on '\n' only, so CRLF files keep a trailing '\r' on each.
    let cr = if content.contains("\r\n") { "\r" } else { "" };
    let (preamble, mut sections) = split_sections(content);

    let sub_resources: Vec<(String, Option<String>)> = sections
        .iter()
        .filter(|s| s.is("sub_resource"))
        .filter_map(|s| s.id().map(|id| (id, s.property_ref(&MATERIAL_LINE))))
        .collect();

    let existing_default = sections
        .iter()
        .find(|s| {
            s.is("sub_resource")
                && s.lines
                    .iter()
                    .any(|l| l.contains(&format!("\"{DEFAULT_MATERIAL_NAME}\"")))
        })
        .and_then(Section::id);

    let next_id = sub_resources
        .iter()
        .filter_map(|(id, _)| id.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1;
    let default_id = existing_default.clone().unwrap_or_else(|| next_id.to_string());

    let mut needs_default = false;
    for section in sections.iter_mut().filter(|s| s.is("node")) {
        if section.type_name() != Some("MeshInstance") || section.has_line(&SLOT_LINE) {
            continue;
        }
        let Some(mesh_ref) = section.property_ref(&MESH_LINE) else {
            continue;
        };
        let declared = sub_resources
            .iter()
            .find(|(id, _)| *id == mesh_ref)
            .and_then(|(_, material)| material.clone());
        let target = match declared {
            Some(material) => material,
            None => {
                needs_default = true;
                default_id.clone()
            }
        };
        section.push_property(format!("material/0 = {}{cr}", render_ref(&target)));
    }

    let inject = needs_default && existing_default.is_none();
    if inject {
        let at = sections
            .iter()
            .position(|s| s.is("node"))
            .unwrap_or(sections.len());
        sections.insert(
            at,
            Section {
                lines: vec![
                    format!("[sub_resource type=\"SpatialMaterial\" id={default_id}]{cr}"),
                    format!("resource_name = \"{DEFAULT_MATERIAL_NAME}\"{cr}"),
                    format!("albedo_color = Color( 0.55, 0.62, 0.48, 1 ){cr}"),
                    cr.to_string(),
                ],
            },
        );
        if let Some(header) = sections.iter_mut().find(|s| s.is("gd_scene")) {
            let bumped = LOAD_STEPS
                .replace(header.header(), |caps: &Captures| {
                    let steps: u64 = caps[1].parse().unwrap_or(1);
                    format!("load_steps={}", steps + 1)
                })
                .into_owned();
            header.lines[0] = bumped;
        }
    }

    preamble
        .into_iter()
        .chain(sections.into_iter().flat_map(|s| s.lines))
        .collect::<Vec<_>>()
        .join("\n")
}
