use std::path::{Component, Path, PathBuf};

/// Split positional arguments into source patterns and the destination (always the last one).
pub fn split_inputs(inputs: &[String]) -> anyhow::Result<(&[String], &str)> {
    match inputs.split_last() {
        Some((destination, sources)) if !sources.is_empty() => Ok((sources, destination.as_str())),
        _ => Err(anyhow::anyhow!(
            "You must specify at least one source pattern and a destination!"
        )),
    }
}

/// Express `path` relative to `base`, walking up with `..` where needed.
///
/// Both paths are expected to be absolute and normalized. Identical paths yield an empty path.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_components = path.components().collect::<Vec<_>>();
    let base_components = base.components().collect::<Vec<_>>();
    let common = path_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut relative = PathBuf::new();
    for _ in &base_components[common..] {
        relative.push(Component::ParentDir);
    }
    for component in &path_components[common..] {
        relative.push(component);
    }
    relative
}
