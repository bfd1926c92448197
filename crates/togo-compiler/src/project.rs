//! Project-level properties: the KVS tracking which packages have been
//! registered with `create`, read/written as the project's `properties`
//! file.

use std::fs;
use std::path::{Path, PathBuf};

use togo_kvs::{Kind, Kvs};

/// The project's registered-package roster, backed by a KVS document at
/// `<project_root>/properties`.
pub struct Project {
    root: PathBuf,
    packages: Vec<String>,
}

impl Project {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            packages: Vec::new(),
        }
    }

    fn properties_path(&self) -> PathBuf {
        self.root.join("properties")
    }

    /// Loads `<root>/properties`, if present; an absent file is an empty
    /// project, matching a freshly `create`d project before its first
    /// package.
    ///
    /// # Errors
    /// Propagates a KVS parse error if the file exists but is malformed.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, togo_kvs::Error> {
        let root = root.into();
        let path = root.join("properties");
        let packages = match fs::read_to_string(&path) {
            Ok(text) => {
                let root_node = togo_kvs::parse(&text)?;
                let list = root_node.get("packages");
                list.and_then(Kvs::children)
                    .map(|children| children.iter().filter_map(Kvs::as_str).map(str::to_string).collect())
                    .unwrap_or_default()
            }
            Err(_) => Vec::new(),
        };
        Ok(Self { root, packages })
    }

    /// Writes the current package roster back to `<root>/properties`.
    ///
    /// # Errors
    /// Propagates the underlying filesystem error.
    pub fn save(&self) -> std::io::Result<()> {
        let items = self
            .packages
            .iter()
            .map(|name| Kvs::unnamed(Kind::String(name.clone())))
            .collect();
        let root_node = Kvs::unnamed(Kind::Node(vec![Kvs::named("packages", Kind::Array(items))]));
        fs::write(self.properties_path(), togo_kvs::write(&root_node))
    }

    #[must_use]
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.packages.iter().any(|p| p == name)
    }

    /// Registers `name` (a no-op if already registered) and creates
    /// `package/<name>/` with an empty `.compiled/` directory.
    ///
    /// # Errors
    /// Propagates the underlying filesystem error.
    pub fn create_package(&mut self, name: &str) -> std::io::Result<PathBuf> {
        let package_dir = self.root.join("package").join(name);
        fs::create_dir_all(package_dir.join(".compiled"))?;
        if !self.is_registered(name) {
            self.packages.push(name.to_string());
        }
        Ok(package_dir)
    }

    #[must_use]
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.root.join("package").join(name)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_reload_round_trips_roster() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::new(dir.path());
        project.create_package("levels").unwrap();
        project.create_package("shaders").unwrap();
        project.save().unwrap();

        let reloaded = Project::load(dir.path()).unwrap();
        assert_eq!(reloaded.packages(), &["levels".to_string(), "shaders".to_string()]);
        assert!(dir.path().join("package/levels/.compiled").is_dir());
    }

    #[test]
    fn loading_a_fresh_project_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::load(dir.path()).unwrap();
        assert!(project.packages().is_empty());
    }
}
