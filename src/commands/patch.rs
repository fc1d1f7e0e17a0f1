use anyhow::Context;

use crate::cli::PatchArgs;
use crate::patch::patch_with_report;

/// Patches a local file and prints the result on stdout. Applied rules go to stderr.
pub fn run_patch(args: PatchArgs) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let path = args
        .as_path
        .unwrap_or_else(|| args.file.to_string_lossy().replace('\\', "/"));

    let (patched, applied) = patch_with_report(&path, &raw);
    if applied.is_empty() {
        eprintln!("{path}: no changes");
    } else {
        eprintln!("{path}: {}", applied.join(", "));
    }
    print!("{patched}");
    Ok(())
}
