/// Expands a leading `~` in a path to the user's home directory.
/// Also normalizes path separators for the current OS.
pub fn expand_tilde(path: &str) -> String {
    let result = if path.starts_with("~/") || path == "~" {
        match dirs::home_dir() {
            Some(home) if path.len() > 2 => home.join(&path[2..]).to_string_lossy().to_string(),
            Some(home) => home.to_string_lossy().to_string(),
            None => path.to_string(),
        }
    } else {
        path.to_string()
    };
    if cfg!(windows) {
        result.replace('/', "\\")
    } else {
        result
    }
}

/// Default name used when the user clears the project name entirely.
pub const DEFAULT_PROJECT_NAME: &str = "WastelandRPG";

/// Keeps only ASCII letters and digits, the characters Godot accepts
/// everywhere the name ends up (config, archive file name).
pub fn sanitize_project_name(name: &str) -> String {
    let cleaned: String = name.chars().filter(char::is_ascii_alphanumeric).collect();
    if cleaned.is_empty() {
        DEFAULT_PROJECT_NAME.to_string()
    } else {
        cleaned
    }
}

/// Turns a model-supplied path into a manifest path: relative, `/`-separated,
/// without `res://`, leading `/` or `./`.
///
/// Returns `None` for paths that are empty after cleanup or that try to
/// escape the project root with `..`.
pub fn normalize_project_path(raw: &str) -> Option<String> {
    let mut path = raw.trim().replace('\\', "/");
    if let Some(stripped) = path.strip_prefix("res://") {
        path = stripped.to_string();
    }

    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    if segments.is_empty() || segments.iter().any(|s| *s == "..") {
        return None;
    }
    Some(segments.join("/"))
}
