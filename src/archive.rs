//! Packs a manifest into a deflate-compressed zip.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ArchitectError, Result};
use crate::model::ProjectManifest;
use crate::util::normalize_project_path;

fn archive_err(e: impl std::fmt::Display) -> ArchitectError {
    ArchitectError::Archive(e.to_string())
}

/// Zips every manifest file in manifest order, entry name = path.
pub fn assemble(manifest: &ProjectManifest) -> Result<Vec<u8>> {
    if manifest.is_empty() {
        return Err(ArchitectError::Archive("No files to archive".into()));
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for file in manifest.files() {
        zip.start_file(file.path.as_str(), options)
            .map_err(archive_err)?;
        zip.write_all(file.content.as_bytes()).map_err(archive_err)?;
    }

    let cursor = zip.finish().map_err(archive_err)?;
    let bytes = cursor.into_inner();
    tracing::debug!(entries = manifest.len(), bytes = bytes.len(), "archive assembled");
    Ok(bytes)
}

pub fn archive_file_name(project_name: &str) -> String {
    format!("{project_name}_Godot_Complete.zip")
}

/// Writes the archive bytes into `dir`, creating it if needed.
pub fn write_archive(dir: &Path, project_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(archive_file_name(project_name));
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Writes the manifest out as a directory tree under `dir`.
pub fn extract_to_dir(manifest: &ProjectManifest, dir: &Path) -> Result<usize> {
    let mut written = 0;
    for file in manifest.files() {
        // Manifest paths are already normalized; re-check so nothing lands outside `dir`.
        let Some(rel) = normalize_project_path(&file.path) else {
            tracing::warn!(path = %file.path, "refusing to extract unsafe path");
            continue;
        };
        let target = dir.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &file.content)?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge;
    use crate::model::GeneratedFile;
    use std::io::Read;

    fn manifest(files: &[(&str, &str)]) -> ProjectManifest {
        let files = files
            .iter()
            .map(|(p, c)| GeneratedFile::new(*p, *c))
            .collect();
        merge(files, &[])
    }

    #[test]
    fn test_entries_in_manifest_order() {
        let m = manifest(&[
            ("project.godot", "config_version=4\n"),
            ("main.tscn", "[gd_scene format=2]\n"),
            ("scripts/managers/save_manager.gd", "extends Node\n"),
        ]);
        let bytes = assemble(&m).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            ["project.godot", "main.tscn", "scripts/managers/save_manager.gd"]
        );

        let mut entry = archive.by_name("scripts/managers/save_manager.gd").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "extends Node\n");
    }

    #[test]
    fn test_empty_manifest_is_error() {
        let err = assemble(&ProjectManifest::default()).unwrap_err();
        assert!(matches!(err, ArchitectError::Archive(_)));
    }

    #[test]
    fn test_archive_file_name() {
        assert_eq!(archive_file_name("MyRPG"), "MyRPG_Godot_Complete.zip");
    }

    #[test]
    fn test_write_and_extract() {
        let dir = tempfile::tempdir().unwrap();
        let m = manifest(&[("project.godot", "x"), ("ui/hud.tscn", "y")]);

        let path = write_archive(&dir.path().join("out"), "Game", &assemble(&m).unwrap()).unwrap();
        assert!(path.ends_with("Game_Godot_Complete.zip"));
        assert!(path.exists());

        let tree = dir.path().join("tree");
        assert_eq!(extract_to_dir(&m, &tree).unwrap(), 2);
        assert_eq!(fs::read_to_string(tree.join("ui/hud.tscn")).unwrap(), "y");
    }
}
