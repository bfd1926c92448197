//! `CompilerManager`: the registry of per-type [`ResourceCompiler`]s plus
//! the ordered list of [`PackageCompiler`](crate::package_compiler::PackageCompiler)s
//! it drives.

use std::collections::HashMap;

use togo_resource::ResourceType;
use togo_stream::{Reader, Writer};

use crate::package_compiler::PackageCompiler;

/// Context passed to a [`ResourceCompiler::compile`] call: the identity of
/// the entry being compiled and the package it lives in.
pub struct CompilerContext<'a> {
    pub package_name: &'a str,
    pub name_hash: u64,
    pub manifest_id: u32,
}

/// A per-type compiler: source reader in, compiled blob writer out.
pub trait ResourceCompiler {
    fn resource_type(&self) -> ResourceType;
    fn format_version(&self) -> u32;

    /// Transforms the source data in `in_reader` into the compiled form
    /// written to `out_writer`. Returns `false` on a data error (the
    /// caller logs and aborts that entry, per spec's "data errors are
    /// reported up the call chain as boolean-plus-logged-message").
    fn compile(&self, ctx: &CompilerContext<'_>, in_reader: &mut dyn Reader, out_writer: &mut dyn Writer) -> bool;
}

/// Holds the type -> compiler registry and the ordered package list that
/// `togo-cli`'s commands operate against.
#[derive(Default)]
pub struct CompilerManager {
    compilers: HashMap<u32, Box<dyn ResourceCompiler>>,
    packages: Vec<PackageCompiler>,
}

impl CompilerManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, compiler: Box<dyn ResourceCompiler>) {
        let type_hash = compiler.resource_type().raw();
        tracing::debug!(type_hash = format_args!("{type_hash:#x}"), "registered resource compiler");
        self.compilers.insert(type_hash, compiler);
    }

    #[must_use]
    pub fn compiler_for(&self, resource_type: ResourceType) -> Option<&dyn ResourceCompiler> {
        self.compilers.get(&resource_type.raw()).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn packages(&self) -> &[PackageCompiler] {
        &self.packages
    }

    #[must_use]
    pub fn packages_mut(&mut self) -> &mut Vec<PackageCompiler> {
        &mut self.packages
    }

    #[must_use]
    pub fn package(&self, name: &str) -> Option<&PackageCompiler> {
        self.packages.iter().find(|p| p.name() == name)
    }

    #[must_use]
    pub fn package_mut(&mut self, name: &str) -> Option<&mut PackageCompiler> {
        self.packages.iter_mut().find(|p| p.name() == name)
    }
}
