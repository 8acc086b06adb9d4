//! Filesystem path helpers.

use std::path::{Component, Path, PathBuf};

/// Path of `target` relative to the directory `base`.
///
/// Both paths are compared component-wise as given; callers pass paths
/// sharing the same root (both absolute, or both relative to one directory).
///
/// # Examples
/// ```
/// use infra_mgmt::utils::paths::relative_path;
/// use std::path::Path;
///
/// let rel = relative_path(Path::new("/p/terraform/modules/iam"), Path::new("/p/terraform/.build/iam"));
/// assert_eq!(rel, Path::new("../../modules/iam"));
/// ```
pub fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target: Vec<Component> = target.components().filter(|c| *c != Component::CurDir).collect();
    let base: Vec<Component> = base.components().filter(|c| *c != Component::CurDir).collect();

    let common = target.iter().zip(&base).take_while(|(a, b)| a == b).count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for component in &target[common..] {
        rel.push(component.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}
