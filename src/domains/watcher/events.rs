//! Mapping of raw filesystem events to watcher actions.

use notify::event::{EventKind, ModifyKind};
use notify::Event;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// What the watcher should do about one event path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchAction {
    /// The registry document changed; schedule a debounced reload.
    ReloadRegistry,
    /// A tool source changed or disappeared; drop its cached copy now.
    InvalidateSource(PathBuf),
    /// A tool source appeared; the registry needs a manual regeneration.
    NewSource(PathBuf),
}

/// The paths the watcher cares about, resolved once at startup.
#[derive(Debug, Clone)]
pub struct WatchTargets {
    registry_dir: PathBuf,
    registry_file: OsString,
    tools_dir: PathBuf,
}

impl WatchTargets {
    /// Resolve targets. Existing directories are canonicalised so they
    /// compare equal to the absolute paths the OS reports.
    pub fn new(registry_path: &Path, tools_dir: &Path) -> Self {
        let registry_dir = match registry_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let registry_file = registry_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();

        Self {
            registry_dir: canonical_or_absolute(&registry_dir),
            registry_file,
            tools_dir: canonical_or_absolute(tools_dir),
        }
    }

    pub fn registry_dir(&self) -> &Path {
        &self.registry_dir
    }

    pub fn tools_dir(&self) -> &Path {
        &self.tools_dir
    }

    pub fn is_registry_file(&self, path: &Path) -> bool {
        path.file_name() == Some(self.registry_file.as_os_str())
            && path.parent() == Some(self.registry_dir.as_path())
    }

    /// Classify every path of an event. Access events never produce actions.
    pub fn classify(&self, event: &Event) -> Vec<WatchAction> {
        if matches!(event.kind, EventKind::Access(_)) {
            return Vec::new();
        }

        let mut actions = Vec::new();
        for path in &event.paths {
            if self.is_registry_file(path) {
                if !actions.contains(&WatchAction::ReloadRegistry) {
                    actions.push(WatchAction::ReloadRegistry);
                }
                continue;
            }

            // Only components below the tool directory decide whether a path is a test file.
            match path.strip_prefix(&self.tools_dir) {
                Ok(relative) if !is_test_file(relative) => {}
                _ => continue,
            }

            match event.kind {
                EventKind::Create(_) => {
                    if !path.is_dir() {
                        actions.push(WatchAction::NewSource(path.clone()));
                    }
                }
                EventKind::Modify(ModifyKind::Metadata(_)) => {}
                _ => actions.push(WatchAction::InvalidateSource(path.clone())),
            }
        }
        actions
    }
}

/// Test fixtures next to tool sources are never watched. `path` is taken
/// relative to the tool directory.
pub fn is_test_file(path: &Path) -> bool {
    let in_test_dir = path.components().any(|c| {
        let part = c.as_os_str();
        part == "tests" || part == "__tests__"
    });
    if in_test_dir {
        return true;
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.contains(".test.") || name.contains(".spec.") || name.contains("_test.")
}

fn canonical_or_absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use tempfile::TempDir;

    fn setup() -> (TempDir, WatchTargets) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("registry")).unwrap();
        std::fs::create_dir(dir.path().join("tools")).unwrap();
        let targets = WatchTargets::new(
            &dir.path().join("registry/mcp-registry.json"),
            &dir.path().join("tools"),
        );
        (dir, targets)
    }

    fn event(kind: EventKind, path: PathBuf) -> Event {
        Event::new(kind).add_path(path)
    }

    fn modify() -> EventKind {
        EventKind::Modify(ModifyKind::Data(DataChange::Content))
    }

    #[test]
    fn test_registry_change_requests_reload() {
        let (_dir, targets) = setup();
        let path = targets.registry_dir().join("mcp-registry.json");
        assert_eq!(
            targets.classify(&event(modify(), path.clone())),
            vec![WatchAction::ReloadRegistry]
        );
        assert_eq!(
            targets.classify(&event(EventKind::Create(CreateKind::File), path)),
            vec![WatchAction::ReloadRegistry]
        );
    }

    #[test]
    fn test_registry_temp_file_ignored() {
        let (_dir, targets) = setup();
        let path = targets.registry_dir().join(".mcp-registry.json.tmp");
        assert!(targets.classify(&event(modify(), path)).is_empty());
    }

    #[test]
    fn test_source_change_and_removal_invalidate() {
        let (_dir, targets) = setup();
        let path = targets.tools_dir().join("docusign/README.md");
        assert_eq!(
            targets.classify(&event(modify(), path.clone())),
            vec![WatchAction::InvalidateSource(path.clone())]
        );
        assert_eq!(
            targets.classify(&event(EventKind::Remove(RemoveKind::File), path.clone())),
            vec![WatchAction::InvalidateSource(path)]
        );
    }

    #[test]
    fn test_new_source_is_reported() {
        let (_dir, targets) = setup();
        let path = targets.tools_dir().join("stripe/README.md");
        assert_eq!(
            targets.classify(&event(EventKind::Create(CreateKind::File), path.clone())),
            vec![WatchAction::NewSource(path)]
        );
    }

    #[test]
    fn test_test_files_and_noise_ignored() {
        let (_dir, targets) = setup();
        let tools = targets.tools_dir().to_path_buf();
        assert!(targets.classify(&event(modify(), tools.join("shadcn/add.test.ts"))).is_empty());
        assert!(targets.classify(&event(modify(), tools.join("tests/fixture.json"))).is_empty());
        assert!(targets
            .classify(&event(EventKind::Access(AccessKind::Any), tools.join("shadcn/README.md")))
            .is_empty());
        assert!(targets
            .classify(&event(
                EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)),
                tools.join("shadcn/README.md")
            ))
            .is_empty());
        assert!(targets.classify(&event(modify(), PathBuf::from("/elsewhere/file.md"))).is_empty());
    }

    #[test]
    fn test_tests_directory_above_tools_is_not_a_filter() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("tests/project");
        std::fs::create_dir_all(root.join("registry")).unwrap();
        std::fs::create_dir_all(root.join("tools")).unwrap();
        let targets = WatchTargets::new(
            &root.join("registry/mcp-registry.json"),
            &root.join("tools"),
        );

        let readme = targets.tools_dir().join("shadcn/README.md");
        assert_eq!(
            targets.classify(&event(modify(), readme.clone())),
            vec![WatchAction::InvalidateSource(readme)]
        );
        let fixture = targets.tools_dir().join("shadcn/tests/fixture.json");
        assert!(targets.classify(&event(modify(), fixture)).is_empty());
    }

    #[test]
    fn test_is_test_file() {
        assert!(is_test_file(Path::new("tools/a/list.spec.ts")));
        assert!(is_test_file(Path::new("tools/a/list_test.rs")));
        assert!(is_test_file(Path::new("tools/__tests__/list.ts")));
        assert!(!is_test_file(Path::new("tools/a/list.ts")));
        assert!(!is_test_file(Path::new("tools/testing-guide.md")));
    }
}
