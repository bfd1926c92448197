//! `ResourceManager`: the online side of the resource pipeline. Mounts
//! ordered [`ResourcePackage`]s (later mounts shadow earlier ones),
//! dispatches loads through a per-type [`ResourceHandler`] registry, and
//! keeps every active resource refcounted in a `name_hash` keyed table —
//! the same "hot lookup keyed by name hash" structure
//! [`togo_compiler::PackageCompiler`] uses for its manifest index, so it is
//! backed by the same [`togo_core::HashMap`].

use std::any::Any;
use std::collections::HashMap as StdHashMap;
use std::path::{Path, PathBuf};

use togo_core::HashMap as TogoHashMap;
use togo_resource::ResourceType;

use crate::error::{Error, Result};
use crate::handler::ResourceHandler;
use crate::package::ResourcePackage;

struct ActiveResource {
    value: Box<dyn Any>,
    type_hash: u32,
    refcount: u32,
}

pub struct ResourceManager {
    handlers: StdHashMap<u32, Box<dyn ResourceHandler>>,
    packages: Vec<ResourcePackage>,
    active: TogoHashMap<u64, ActiveResource>,
    base_path: PathBuf,
}

impl ResourceManager {
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            handlers: StdHashMap::new(),
            packages: Vec::new(),
            active: TogoHashMap::new(),
            base_path: base_path.into(),
        }
    }

    pub fn register_handler(&mut self, handler: Box<dyn ResourceHandler>) {
        let type_hash = handler.resource_type().raw();
        tracing::debug!(type_hash = format_args!("{type_hash:#x}"), "registered resource handler");
        self.handlers.insert(type_hash, handler);
    }

    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Mounts `<base_path>/<package_file>`. Packages mounted later shadow
    /// earlier ones on lookup, matching a patch-stack semantics.
    ///
    /// # Errors
    /// Returns [`Error::HandlerNotRegistered`] if the package claims a type
    /// with no registered handler, or propagates the underlying file-open
    /// error.
    pub fn mount(&mut self, package_file: &str) -> Result<()> {
        let path = self.base_path.join(package_file);
        let package = ResourcePackage::mount(&path, |type_hash| self.handlers.contains_key(&type_hash))?;
        tracing::info!(path = %path.display(), entries = package.manifest().len(), "mounted resource package");
        self.packages.push(package);
        Ok(())
    }

    /// Unmounts the most recently mounted package at `path` (matching
    /// `<base_path>/<package_file>`), undoing its shadowing: a subsequent
    /// `reference` call falls through to whatever package beneath it in the
    /// stack claims the same entry. Any resource currently active and backed
    /// by this package is evicted (unloaded via its handler) rather than
    /// left pinned to a package that no longer exists.
    ///
    /// # Errors
    /// Returns [`Error::PackageNotMounted`] if no mounted package matches
    /// `package_file`.
    pub fn unmount(&mut self, package_file: &str) -> Result<()> {
        let path = self.base_path.join(package_file);
        let position = self
            .packages
            .iter()
            .rposition(|package| package.path() == path.as_path())
            .ok_or_else(|| Error::PackageNotMounted(path.clone()))?;
        let package = self.packages.remove(position);

        let stale: Vec<(u32, u64)> = package
            .manifest()
            .iter()
            .filter(|entry| !entry.is_hole())
            .filter(|entry| self.active.get(&entry.name_hash).is_some())
            .map(|entry| (entry.type_hash, entry.name_hash))
            .collect();
        for (type_hash, name_hash) in stale {
            let active = self.active.remove(&name_hash).expect("checked above");
            if let Some(handler) = self.handlers.get(&type_hash) {
                handler.unload(active.value);
            }
        }

        tracing::info!(path = %path.display(), "unmounted resource package");
        Ok(())
    }

    /// Scans mounted packages from newest to oldest for the first manifest
    /// entry matching `resource_type`/`name_hash`.
    fn find(&self, resource_type: ResourceType, name_hash: u64) -> Option<(&ResourcePackage, usize)> {
        for package in self.packages.iter().rev() {
            if let Some(index) = package.find_by_name_hash(name_hash) {
                if package.manifest()[index].type_hash == resource_type.raw() {
                    return Some((package, index));
                }
            }
        }
        None
    }

    /// Loads (or returns the already-active) resource identified by
    /// `resource_type`/`name_hash`, incrementing its refcount.
    ///
    /// # Errors
    /// Returns [`Error::HandlerNotRegistered`] if no handler claims
    /// `resource_type`, [`Error::NotFound`] if no mounted package has the
    /// entry, or [`Error::TypeMismatch`] if `name_hash` is already active
    /// under a different type.
    pub fn reference(&mut self, resource_type: ResourceType, name_hash: u64) -> Result<&dyn Any> {
        if let Some(active) = self.active.get_mut(&name_hash) {
            if active.type_hash != resource_type.raw() {
                return Err(Error::TypeMismatch(name_hash));
            }
            active.refcount += 1;
            return Ok(self.active.get(&name_hash).unwrap().value.as_ref());
        }

        let handler = self
            .handlers
            .get(&resource_type.raw())
            .ok_or_else(|| Error::handler_not_registered(resource_type))?;

        let (package, index) = self
            .find(resource_type, name_hash)
            .ok_or(Error::NotFound { type_hash: resource_type.raw(), name: name_hash })?;

        let value = {
            let mut stream = package.open_resource_stream(index);
            handler.load(self, &mut stream).ok_or(Error::NotFound { type_hash: resource_type.raw(), name: name_hash })?
        };

        self.active.set(
            name_hash,
            ActiveResource {
                value,
                type_hash: resource_type.raw(),
                refcount: 1,
            },
        );
        Ok(self.active.get(&name_hash).unwrap().value.as_ref())
    }

    /// Decrements the refcount for an active resource, unloading it at
    /// zero.
    ///
    /// # Panics
    /// Panics if `name_hash` has no active reference (refcount underflow).
    pub fn unreference(&mut self, resource_type: ResourceType, name_hash: u64) {
        let refcount = {
            let active = self
                .active
                .get_mut(&name_hash)
                .unwrap_or_else(|| panic!("ResourceManager::unreference: no active reference for {name_hash:#x}"));
            active.refcount = active
                .refcount
                .checked_sub(1)
                .unwrap_or_else(|| panic!("ResourceManager::unreference: refcount underflow for {name_hash:#x}"));
            active.refcount
        };

        if refcount == 0 {
            let active = self.active.remove(&name_hash).expect("checked above");
            if let Some(handler) = self.handlers.get(&resource_type.raw()) {
                handler.unload(active.value);
            }
        }
    }

    #[must_use]
    pub fn is_active(&self, name_hash: u64) -> bool {
        self.active.get(&name_hash).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use togo_stream::Reader;

    struct EchoHandler;

    impl ResourceHandler for EchoHandler {
        fn resource_type(&self) -> ResourceType {
            ResourceType::of("test_resource")
        }

        fn expected_format_version(&self) -> u32 {
            1
        }

        fn load(&self, _manager: &ResourceManager, reader: &mut dyn Reader) -> Option<Box<dyn Any>> {
            let mut buf = [0u8; 64];
            let (n, _status) = reader.read(&mut buf);
            Some(Box::new(String::from_utf8_lossy(&buf[..n]).into_owned()))
        }
    }

    fn mount_single_resource_package(dir: &std::path::Path) -> u64 {
        use togo_core::hash;
        let name_hash = hash::calc64(b"hero");
        write_resource_package(dir, "demo.package", name_hash, b"payload");
        name_hash
    }

    fn write_resource_package(dir: &std::path::Path, file_name: &str, name_hash: u64, payload: &[u8]) {
        use togo_resource::{Archive, ResourceMetadata};
        use togo_stream::{FileMode, FileStream};

        let mut archive = Archive::new();
        archive.push(
            ResourceMetadata {
                name_hash,
                tag_glob_hash: 0,
                type_hash: ResourceType::of("test_resource").raw(),
                format_version: 1,
                data_offset: 0,
                data_size: 0,
            },
            payload.to_vec(),
        );
        let mut w = FileStream::open(dir.join(file_name), FileMode::WriteBinaryTruncate).unwrap();
        archive.write(&mut w);
    }

    #[test]
    fn reference_loads_then_shares_refcount_and_unreference_unloads() {
        let dir = tempfile::tempdir().unwrap();
        let name_hash = mount_single_resource_package(dir.path());

        let mut manager = ResourceManager::new(dir.path());
        manager.register_handler(Box::new(EchoHandler));
        manager.mount("demo.package").unwrap();

        let resource_type = ResourceType::of("test_resource");
        manager.reference(resource_type, name_hash).unwrap();
        assert!(manager.is_active(name_hash));

        manager.reference(resource_type, name_hash).unwrap();
        manager.unreference(resource_type, name_hash);
        assert!(manager.is_active(name_hash));

        manager.unreference(resource_type, name_hash);
        assert!(!manager.is_active(name_hash));
    }

    #[test]
    #[should_panic(expected = "no active reference")]
    fn unreference_without_a_prior_reference_panics() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = ResourceManager::new(dir.path());
        manager.unreference(ResourceType::of("test_resource"), 1234);
    }

    #[test]
    fn mount_rejects_a_package_claiming_an_unregistered_type() {
        let dir = tempfile::tempdir().unwrap();
        mount_single_resource_package(dir.path());

        let mut manager = ResourceManager::new(dir.path());
        let err = manager.mount("demo.package").unwrap_err();
        assert!(matches!(err, Error::HandlerNotRegistered(_)));
    }

    #[test]
    fn unmount_evicts_an_active_resource_and_falls_back_to_the_shadowed_package() {
        use togo_core::hash;
        let dir = tempfile::tempdir().unwrap();
        let name_hash = hash::calc64(b"hero");
        write_resource_package(dir.path(), "base.package", name_hash, b"base value");
        write_resource_package(dir.path(), "patch.package", name_hash, b"patch value");

        let mut manager = ResourceManager::new(dir.path());
        manager.register_handler(Box::new(EchoHandler));
        manager.mount("base.package").unwrap();
        manager.mount("patch.package").unwrap();

        let resource_type = ResourceType::of("test_resource");
        let value = manager.reference(resource_type, name_hash).unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "patch value");

        // unmounting while still active evicts the entry rather than leaving
        // it pinned to a package that no longer exists.
        manager.unmount("patch.package").unwrap();
        assert!(!manager.is_active(name_hash));

        let value = manager.reference(resource_type, name_hash).unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "base value");
    }

    #[test]
    fn unmount_of_an_unknown_package_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = ResourceManager::new(dir.path());
        assert!(matches!(manager.unmount("missing.package"), Err(Error::PackageNotMounted(_))));
    }
}
