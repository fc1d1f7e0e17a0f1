//! Path-keyed merge of generated files with caller-supplied overrides.

use std::collections::HashMap;

use crate::model::{GeneratedFile, ProjectManifest};

/// Merges `overrides` into `generated` and returns a path-unique manifest.
///
/// - An override whose path already exists replaces that entry's content in
///   place.
/// - Overrides with new paths go to the front, in the order supplied.
/// - Everything else keeps the order the model produced. When the model
///   emits the same path twice (e.g. from two stages), the first position
///   is kept with the last content.
pub fn merge(generated: Vec<GeneratedFile>, overrides: &[GeneratedFile]) -> ProjectManifest {
    let mut base: Vec<GeneratedFile> = Vec::with_capacity(generated.len() + overrides.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for file in generated {
        match index.get(&file.path) {
            Some(&i) => base[i].content = file.content,
            None => {
                index.insert(file.path.clone(), base.len());
                base.push(file);
            }
        }
    }

    let mut inserted: Vec<GeneratedFile> = Vec::new();
    let mut inserted_index: HashMap<&str, usize> = HashMap::new();

    for ov in overrides {
        if let Some(&i) = index.get(&ov.path) {
            base[i] = ov.clone();
        } else if let Some(&i) = inserted_index.get(ov.path.as_str()) {
            inserted[i] = ov.clone();
        } else {
            inserted_index.insert(ov.path.as_str(), inserted.len());
            inserted.push(ov.clone());
        }
    }

    inserted.extend(base);
    ProjectManifest::from_unique(inserted)
}
