use crate::commands::config::{config_path, load_config, BuildEntry};

fn render_entry(entry: &BuildEntry) -> String {
    format!(
        "{}  {} ({}, {} files, {})\n    {}",
        entry.created_at,
        entry.project_name,
        entry.dimension,
        entry.files,
        entry.model,
        entry.archive_path
    )
}

pub fn run_history() -> anyhow::Result<()> {
    let Some(path) = config_path() else {
        anyhow::bail!("Cannot find home directory");
    };
    let config = load_config(&path);
    if config.builds.is_empty() {
        println!("No builds yet.");
        return Ok(());
    }
    for entry in &config.builds {
        let marker = if config.last_build.as_deref() == Some(entry.archive_path.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {}", render_entry(entry));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dimension;

    #[test]
    fn test_render_entry() {
        let entry = BuildEntry {
            project_name: "MyRPG".into(),
            dimension: Dimension::TwoD,
            archive_path: "/out/MyRPG_Godot_Complete.zip".into(),
            files: 12,
            model: "gemini-test".into(),
            created_at: "2026-01-01T00:00:00+00:00".into(),
        };
        assert_eq!(
            render_entry(&entry),
            "2026-01-01T00:00:00+00:00  MyRPG (2D, 12 files, gemini-test)\n    /out/MyRPG_Godot_Complete.zip"
        );
    }
}
