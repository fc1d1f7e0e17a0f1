//! Data types shared by every stage of a build.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One file of a generated project. `path` is the identity key within a file set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Files returned by a single generation call, in the order the provider sent them.
pub type BuildResult = Vec<GeneratedFile>;

/// The merged, path-unique file list that gets archived.
///
/// Only [`crate::merge::merge`] constructs one, which is what keeps paths unique.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProjectManifest {
    files: Vec<GeneratedFile>,
}

impl ProjectManifest {
    pub(crate) fn from_unique(files: Vec<GeneratedFile>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[GeneratedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }

    pub fn into_files(self) -> Vec<GeneratedFile> {
        self.files
    }
}

/// Whether the generated game is a 2D or 3D project.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "2D")]
    TwoD,
    #[default]
    #[serde(rename = "3D")]
    ThreeD,
}

impl Dimension {
    pub fn is_3d(self) -> bool {
        self == Dimension::ThreeD
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::TwoD => f.write_str("2D"),
            Dimension::ThreeD => f.write_str("3D"),
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "2d" => Ok(Dimension::TwoD),
            "3d" => Ok(Dimension::ThreeD),
            other => Err(format!("unknown dimension '{other}', expected 2d or 3d")),
        }
    }
}

/// A user-facing progress message from one of the build "agents".
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentLogEntry {
    pub source: String,
    pub message: String,
    pub timestamp: String,
}

/// Append-only agent log. Timestamps never go backwards, even if the wall
/// clock does.
#[derive(Debug, Default)]
pub struct AgentLog {
    entries: Vec<AgentLogEntry>,
    last: Option<DateTime<Utc>>,
}

impl AgentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry stamped with the current time and returns a copy of it.
    pub fn push(&mut self, source: &str, message: &str) -> AgentLogEntry {
        self.push_at(source, message, Utc::now())
    }

    fn push_at(&mut self, source: &str, message: &str, now: DateTime<Utc>) -> AgentLogEntry {
        let stamp = match self.last {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last = Some(stamp);

        let entry = AgentLogEntry {
            source: source.to_string(),
            message: message.to_string(),
            timestamp: stamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        self.entries.push(entry.clone());
        entry
    }

    pub fn entries(&self) -> &[AgentLogEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_dimension_parse() {
        assert_eq!("3d".parse::<Dimension>().unwrap(), Dimension::ThreeD);
        assert_eq!("2D".parse::<Dimension>().unwrap(), Dimension::TwoD);
        assert!("4d".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_agent_log_timestamps_never_decrease() {
        let mut log = AgentLog::new();
        let now = Utc::now();
        let first = log.push_at("Architect", "one", now);
        // Wall clock jumps backwards by a minute.
        let second = log.push_at("Programmer", "two", now - Duration::seconds(60));
        let third = log.push_at("Designer", "three", now + Duration::seconds(1));

        assert_eq!(first.timestamp, second.timestamp);
        assert!(third.timestamp > second.timestamp);
        assert_eq!(log.entries().len(), 3);
        assert_eq!(log.entries()[1].source, "Programmer");
    }

    #[test]
    fn test_manifest_lookup() {
        let manifest = ProjectManifest::from_unique(vec![
            GeneratedFile::new("project.godot", "Y"),
            GeneratedFile::new("a.gd", "X"),
        ]);
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.get("a.gd").map(|f| f.content.as_str()), Some("X"));
        assert!(manifest.get("missing.gd").is_none());
        assert_eq!(manifest.paths().collect::<Vec<_>>(), ["project.godot", "a.gd"]);
    }
}
