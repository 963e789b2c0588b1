// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Loader boundary: turns PID definitions into a [`RootPidStore`].
//!
//! The text format of PID data files is owned by the caller. A source (or a
//! per-file parser) hands over [`PidStoreDefinition`]s; this module merges
//! them, applies local overrides, validates and builds the immutable store.
//! Loading is all-or-nothing.
//!
//! Directory layout handled by [`load_with_config`]:
//!
//! ```text
//! {data_dir}/
//! +-- pids.proto            (base definitions, loaded in file-name order)
//! +-- manufacturer_pids.proto
//! +-- overrides.proto       (applied last, replaces PIDs by value or name)
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::LoaderConfig;
use crate::descriptor::PidDescriptor;
use crate::error::{LoadError, PidStoreError};
use crate::root::RootPidStore;
use crate::store::PidStore;

/// Manufacturer id used by ESTA itself.
pub const ESTA_MANUFACTURER_ID: u16 = 0x0000;

/// PID values reserved for manufacturer-specific parameters (E1.20 Table A-2).
pub const MANUFACTURER_PID_RANGE: RangeInclusive<u16> = 0x8000..=0xFFDF;

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// The PIDs defined for one manufacturer.
pub struct ManufacturerDefinition<'m, M> {
    pub manufacturer_id: u16,
    pub name: String,
    pub pids: Vec<PidDescriptor<'m, M>>,
}

impl<M> Clone for ManufacturerDefinition<'_, M> {
    fn clone(&self) -> Self {
        ManufacturerDefinition {
            manufacturer_id: self.manufacturer_id,
            name: self.name.clone(),
            pids: self.pids.clone(),
        }
    }
}

/// Everything a source produces: the data version, ESTA PIDs and
/// manufacturer PIDs.
pub struct PidStoreDefinition<'m, M> {
    pub version: u64,
    pub esta_pids: Vec<PidDescriptor<'m, M>>,
    pub manufacturers: Vec<ManufacturerDefinition<'m, M>>,
}

impl<M> Clone for PidStoreDefinition<'_, M> {
    fn clone(&self) -> Self {
        PidStoreDefinition {
            version: self.version,
            esta_pids: self.esta_pids.clone(),
            manufacturers: self.manufacturers.clone(),
        }
    }
}

impl<M> Default for PidStoreDefinition<'_, M> {
    fn default() -> Self {
        PidStoreDefinition {
            version: 0,
            esta_pids: Vec::new(),
            manufacturers: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Something that can produce PID definitions, e.g. a parsed file.
///
/// `read` may be called more than once and must return the same data each
/// time while the underlying source is unchanged.
pub trait PidDataSource<'m, M> {
    /// Human readable name of the source, used in logs.
    fn describe(&self) -> String;

    fn read(&self) -> Result<PidStoreDefinition<'m, M>, LoadError>;
}

impl<'m, M: 'm> PidDataSource<'m, M> for PidStoreDefinition<'m, M> {
    fn describe(&self) -> String {
        format!("in-memory definition v{}", self.version)
    }

    fn read(&self) -> Result<PidStoreDefinition<'m, M>, LoadError> {
        Ok(self.clone())
    }
}

/// Parses one PID data file.
pub trait PidFileParser<'m, M> {
    fn parse(&self, path: &Path) -> Result<PidStoreDefinition<'m, M>, LoadError>;
}

impl<'m, M: 'm, F> PidFileParser<'m, M> for F
where
    F: Fn(&Path) -> Result<PidStoreDefinition<'m, M>, LoadError>,
{
    fn parse(&self, path: &Path) -> Result<PidStoreDefinition<'m, M>, LoadError> {
        self(path)
    }
}

/// A single file paired with the parser that understands it.
pub struct FileSource<'p, P> {
    path: PathBuf,
    parser: &'p P,
}

impl<'p, P> FileSource<'p, P> {
    pub fn new(path: impl Into<PathBuf>, parser: &'p P) -> Self {
        FileSource {
            path: path.into(),
            parser,
        }
    }
}

impl<'m, M: 'm, P> PidDataSource<'m, M> for FileSource<'_, P>
where
    P: PidFileParser<'m, M>,
{
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<PidStoreDefinition<'m, M>, LoadError> {
        self.parser.parse(&self.path)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Load a [`RootPidStore`] from a single source.
///
/// `validate` enables the semantic checks in [`validate_definition`];
/// duplicate values and names are always rejected.
pub fn load<'m, M: 'm, S>(
    source: &S,
    validate: bool,
) -> Result<RootPidStore<'m, M>, LoadError>
where
    S: PidDataSource<'m, M> + ?Sized,
{
    debug!("loading PID data from {}", source.describe());
    let mut merger = DefinitionMerger::new();
    merger.add_base(source.read()?)?;
    merger.build(validate)
}

/// Load a [`RootPidStore`] from a single file.
pub fn load_from_file<'m, M: 'm, P>(
    path: impl AsRef<Path>,
    parser: &P,
    validate: bool,
) -> Result<RootPidStore<'m, M>, LoadError>
where
    P: PidFileParser<'m, M>,
{
    load(&FileSource::new(path.as_ref(), parser), validate)
}

/// Load a [`RootPidStore`] from every data file in `directory`.
///
/// An empty `directory` means the installed [`data_location`](crate::data_location).
pub fn load_from_directory<'m, M: 'm, P>(
    directory: impl AsRef<Path>,
    parser: &P,
    validate: bool,
) -> Result<RootPidStore<'m, M>, LoadError>
where
    P: PidFileParser<'m, M>,
{
    let directory = directory.as_ref();
    let mut builder = LoaderConfig::builder().validate(validate);
    if !directory.as_os_str().is_empty() {
        builder = builder.data_dir(directory);
    }
    load_with_config(&builder.build(), parser)
}

/// Load a [`RootPidStore`] as described by `config`.
pub fn load_with_config<'m, M: 'm, P>(
    config: &LoaderConfig,
    parser: &P,
) -> Result<RootPidStore<'m, M>, LoadError>
where
    P: PidFileParser<'m, M>,
{
    config.check()?;
    let directory = config.data_dir();
    if !directory.is_dir() {
        return Err(LoadError::NotADirectory(directory.to_path_buf()));
    }

    let (files, overrides) = scan_directory(directory, config)?;
    let mut merger = DefinitionMerger::new();

    for path in &files {
        debug!("loading PID data file {}", path.display());
        merger.add_base(parser.parse(path)?)?;
    }
    if let Some(path) = overrides {
        debug!("applying PID overrides from {}", path.display());
        merger.add_override(parser.parse(&path)?)?;
    }

    let root = merger.build(config.validate)?;
    info!(
        "loaded {} PID data file(s) from {}",
        files.len(),
        directory.display()
    );
    Ok(root)
}

/// Data files (sorted by name) and the overrides file, if present.
fn scan_directory(
    directory: &Path,
    config: &LoaderConfig,
) -> Result<(Vec<PathBuf>, Option<PathBuf>), LoadError> {
    let entries = fs::read_dir(directory).map_err(|e| LoadError::io(directory, e))?;

    let mut files = Vec::new();
    let mut overrides = None;

    for entry in entries {
        let entry = entry.map_err(|e| LoadError::io(directory, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let fname = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };

        if fname == config.overrides_file {
            overrides = Some(path);
            continue;
        }

        let has_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == config.file_extension);
        if has_extension {
            files.push(path);
        }
    }

    files.sort();
    Ok((files, overrides))
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Accumulates definitions from several sources before the store is built.
struct DefinitionMerger<'m, M> {
    version: u64,
    esta_pids: Vec<PidDescriptor<'m, M>>,
    manufacturers: BTreeMap<u16, ManufacturerDefinition<'m, M>>,
}

impl<'m, M> DefinitionMerger<'m, M> {
    fn new() -> Self {
        DefinitionMerger {
            version: 0,
            esta_pids: Vec::new(),
            manufacturers: BTreeMap::new(),
        }
    }

    /// Add base definitions. Repeated PIDs are left for the store to reject.
    fn add_base(&mut self, def: PidStoreDefinition<'m, M>) -> Result<(), LoadError> {
        self.version = self.version.max(def.version);
        self.esta_pids.extend(def.esta_pids);

        let mut seen = HashSet::new();
        for manufacturer in def.manufacturers {
            if !seen.insert(manufacturer.manufacturer_id) {
                return Err(LoadError::DuplicateManufacturer(manufacturer.manufacturer_id));
            }
            match self.manufacturers.get_mut(&manufacturer.manufacturer_id) {
                Some(existing) => existing.pids.extend(manufacturer.pids),
                None => {
                    self.manufacturers
                        .insert(manufacturer.manufacturer_id, manufacturer);
                }
            }
        }
        Ok(())
    }

    /// Add override definitions, replacing PIDs that share a value or name.
    fn add_override(&mut self, def: PidStoreDefinition<'m, M>) -> Result<(), LoadError> {
        self.version = self.version.max(def.version);

        check_unique(&def.esta_pids)?;
        for pid in def.esta_pids {
            replace_pid(&mut self.esta_pids, pid);
        }

        let mut seen = HashSet::new();
        for manufacturer in def.manufacturers {
            let id = manufacturer.manufacturer_id;
            if !seen.insert(id) {
                return Err(LoadError::DuplicateManufacturer(id));
            }
            check_unique(&manufacturer.pids).map_err(|source| LoadError::ManufacturerStore {
                manufacturer_id: id,
                source,
            })?;

            let entry = self
                .manufacturers
                .entry(id)
                .or_insert_with(|| ManufacturerDefinition {
                    manufacturer_id: id,
                    name: manufacturer.name.clone(),
                    pids: Vec::new(),
                });
            for pid in manufacturer.pids {
                replace_pid(&mut entry.pids, pid);
            }
        }
        Ok(())
    }

    fn build(self, validate: bool) -> Result<RootPidStore<'m, M>, LoadError> {
        let definition = PidStoreDefinition {
            version: self.version,
            esta_pids: self.esta_pids,
            manufacturers: self.manufacturers.into_values().collect(),
        };
        if validate {
            validate_definition(&definition)?;
        }

        let esta_store = PidStore::new(definition.esta_pids)?;
        let mut manufacturer_stores = BTreeMap::new();
        for manufacturer in definition.manufacturers {
            let id = manufacturer.manufacturer_id;
            if manufacturer.pids.is_empty() {
                debug!("manufacturer 0x{:04x} has no PIDs, no store created", id);
                continue;
            }
            let store = PidStore::new(manufacturer.pids).map_err(|source| {
                LoadError::ManufacturerStore {
                    manufacturer_id: id,
                    source,
                }
            })?;
            manufacturer_stores.insert(id, store);
        }

        let root = RootPidStore::new(esta_store, manufacturer_stores, definition.version);
        info!(
            "built PID store v{}: {} ESTA PIDs, {} manufacturers, {} PIDs total",
            root.version(),
            root.esta_store().pid_count(),
            root.manufacturer_ids().count(),
            root.total_pid_count()
        );
        Ok(root)
    }
}

/// Remove any PID with the same value or name as `pid`, then append it.
fn replace_pid<'m, M>(pids: &mut Vec<PidDescriptor<'m, M>>, pid: PidDescriptor<'m, M>) {
    let before = pids.len();
    pids.retain(|p| p.value() != pid.value() && p.name() != pid.name());
    if pids.len() != before {
        debug!("override replaces {}", pid);
    }
    pids.push(pid);
}

fn check_unique<M>(pids: &[PidDescriptor<'_, M>]) -> Result<(), PidStoreError> {
    let mut values = HashSet::new();
    let mut names = HashSet::new();
    for pid in pids {
        if !values.insert(pid.value()) {
            return Err(PidStoreError::DuplicateValue { value: pid.value() });
        }
        if !names.insert(pid.name()) {
            return Err(PidStoreError::DuplicateName {
                name: pid.name().to_string(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Semantic checks run when loading with `validate` set.
///
/// ESTA PIDs must lie outside [`MANUFACTURER_PID_RANGE`] and manufacturer
/// PIDs inside it. Names must be non-empty and contain no whitespace.
pub fn validate_definition<M>(definition: &PidStoreDefinition<'_, M>) -> Result<(), LoadError> {
    for pid in &definition.esta_pids {
        check_name(pid)?;
        if MANUFACTURER_PID_RANGE.contains(&pid.value()) {
            return Err(LoadError::Validation(format!(
                "ESTA PID {} is in the manufacturer range",
                pid
            )));
        }
    }

    for manufacturer in &definition.manufacturers {
        let id = manufacturer.manufacturer_id;
        if id == ESTA_MANUFACTURER_ID {
            return Err(LoadError::Validation(
                "manufacturer id 0x0000 is reserved for ESTA".to_string(),
            ));
        }
        if manufacturer.name.trim().is_empty() {
            return Err(LoadError::Validation(format!(
                "manufacturer 0x{:04x} has no name",
                id
            )));
        }
        for pid in &manufacturer.pids {
            check_name(pid)?;
            if !MANUFACTURER_PID_RANGE.contains(&pid.value()) {
                return Err(LoadError::Validation(format!(
                    "manufacturer 0x{:04x} PID {} is outside the manufacturer range",
                    id, pid
                )));
            }
        }
    }
    Ok(())
}

fn check_name<M>(pid: &PidDescriptor<'_, M>) -> Result<(), LoadError> {
    if pid.name().is_empty() || pid.name().chars().any(char::is_whitespace) {
        return Err(LoadError::Validation(format!(
            "invalid PID name {:?} for 0x{:04x}",
            pid.name(),
            pid.value()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::SubDeviceRange;

    const MFR: u16 = 0x7a70;

    fn pid(name: &str, value: u16) -> PidDescriptor<'static, ()> {
        PidDescriptor::builder(name, value)
            .get_sub_device_range(SubDeviceRange::AnySubDevice)
            .set_sub_device_range(SubDeviceRange::NonBroadcastSubDevice)
            .build()
    }

    fn manufacturer(
        id: u16,
        pids: Vec<PidDescriptor<'static, ()>>,
    ) -> ManufacturerDefinition<'static, ()> {
        ManufacturerDefinition {
            manufacturer_id: id,
            name: "Open Lighting".to_string(),
            pids,
        }
    }

    fn base() -> PidStoreDefinition<'static, ()> {
        PidStoreDefinition {
            version: 1302986774,
            esta_pids: vec![pid("DEVICE_INFO", 0x0060), pid("IDENTIFY_DEVICE", 0x1000)],
            manufacturers: vec![manufacturer(MFR, vec![pid("SERIAL_NUMBER", 0x8000)])],
        }
    }

    #[test]
    fn load_builds_all_stores() {
        let root = load(&base(), true).unwrap();
        assert_eq!(root.version(), 1302986774);
        assert_eq!(root.esta_store().pid_count(), 2);
        assert_eq!(root.manufacturer_store(MFR).unwrap().pid_count(), 1);
    }

    #[test]
    fn duplicate_esta_value_fails_load() {
        let mut def = base();
        def.esta_pids.push(pid("OTHER", 0x0060));
        let err = load(&def, false).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Store(PidStoreError::DuplicateValue { value: 0x0060 })
        ));
    }

    #[test]
    fn duplicate_manufacturer_name_fails_load() {
        let mut def = base();
        def.manufacturers[0].pids.push(pid("SERIAL_NUMBER", 0x8001));
        let err = load(&def, false).unwrap_err();
        match err {
            LoadError::ManufacturerStore {
                manufacturer_id,
                source,
            } => {
                assert_eq!(manufacturer_id, MFR);
                assert_eq!(
                    source,
                    PidStoreError::DuplicateName {
                        name: "SERIAL_NUMBER".into()
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn manufacturer_listed_twice_fails_load() {
        let mut def = base();
        def.manufacturers.push(manufacturer(MFR, vec![pid("X", 0x8010)]));
        assert!(matches!(
            load(&def, false),
            Err(LoadError::DuplicateManufacturer(MFR))
        ));
    }

    #[test]
    fn validation_rejects_esta_pid_in_manufacturer_range() {
        let mut def = base();
        def.esta_pids.push(pid("NOT_ESTA", 0x8100));
        assert!(matches!(load(&def, true), Err(LoadError::Validation(_))));
        // Without validation the data is accepted as-is.
        let root = load(&def, false).unwrap();
        assert!(root.get_descriptor_by_value(0x8100).is_some());
    }

    #[test]
    fn validation_rejects_manufacturer_pid_outside_range() {
        let mut def = base();
        def.manufacturers[0].pids.push(pid("LOW", 0x0100));
        assert!(matches!(load(&def, true), Err(LoadError::Validation(_))));

        let mut def = base();
        def.manufacturers[0].pids.push(pid("RESERVED", 0xFFE0));
        assert!(matches!(load(&def, true), Err(LoadError::Validation(_))));
    }

    #[test]
    fn validation_rejects_bad_names_and_ids() {
        let mut def = base();
        def.esta_pids.push(pid("", 0x0200));
        assert!(matches!(load(&def, true), Err(LoadError::Validation(_))));

        let mut def = base();
        def.esta_pids.push(pid("HAS SPACE", 0x0200));
        assert!(matches!(load(&def, true), Err(LoadError::Validation(_))));

        let mut def = base();
        def.manufacturers.push(manufacturer(ESTA_MANUFACTURER_ID, vec![]));
        assert!(matches!(load(&def, true), Err(LoadError::Validation(_))));

        let mut def = base();
        def.manufacturers[0].name = " ".to_string();
        assert!(matches!(load(&def, true), Err(LoadError::Validation(_))));
    }

    #[test]
    fn base_definitions_merge_manufacturers() {
        let mut merger = DefinitionMerger::new();
        merger.add_base(base()).unwrap();
        merger
            .add_base(PidStoreDefinition {
                version: 7,
                esta_pids: vec![pid("SENSOR_VALUE", 0x0201)],
                manufacturers: vec![manufacturer(MFR, vec![pid("FAN_MODE", 0x8001)])],
            })
            .unwrap();
        let root = merger.build(true).unwrap();

        assert_eq!(root.version(), 1302986774);
        assert_eq!(root.esta_store().pid_count(), 3);
        assert_eq!(root.manufacturer_store(MFR).unwrap().pid_count(), 2);
    }

    #[test]
    fn overrides_replace_by_value_and_name() {
        let mut merger = DefinitionMerger::new();
        merger.add_base(base()).unwrap();
        merger
            .add_override(PidStoreDefinition {
                version: 1302986775,
                esta_pids: vec![
                    PidDescriptor::builder("DEVICE_INFO", 0x0060)
                        .get_sub_device_range(SubDeviceRange::RootDevice)
                        .build(),
                    pid("IDENTIFY_DEVICE", 0x1001),
                ],
                manufacturers: vec![manufacturer(0x00a1, vec![pid("DRAFT_PID", 0x8000)])],
            })
            .unwrap();
        let root = merger.build(true).unwrap();

        assert_eq!(root.version(), 1302986775);
        let info = root.get_descriptor_by_name("DEVICE_INFO").unwrap();
        assert_eq!(info.get_sub_device_range(), SubDeviceRange::RootDevice);
        assert!(root.get_descriptor_by_value(0x1000).is_none());
        assert_eq!(root.get_descriptor_by_name("IDENTIFY_DEVICE").unwrap().value(), 0x1001);
        assert!(root.manufacturer_store(0x00a1).is_some());
        assert!(root.manufacturer_store(MFR).is_some());
    }

    #[test]
    fn override_with_internal_duplicate_fails() {
        let mut merger = DefinitionMerger::new();
        merger.add_base(base()).unwrap();
        let err = merger
            .add_override(PidStoreDefinition {
                version: 0,
                esta_pids: vec![pid("A", 0x0300), pid("A", 0x0301)],
                manufacturers: vec![],
            })
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Store(PidStoreError::DuplicateName { .. })
        ));
    }

    #[test]
    fn closure_parser_and_file_source() {
        let parser = |path: &Path| -> Result<PidStoreDefinition<'static, ()>, LoadError> {
            if path.ends_with("pids.proto") {
                Ok(base())
            } else {
                Err(LoadError::Parse {
                    path: path.to_path_buf(),
                    message: "unknown file".into(),
                })
            }
        };

        let source = FileSource::new("/data/pids.proto", &parser);
        assert_eq!(source.describe(), "/data/pids.proto");
        let root: RootPidStore<'static, ()> = load(&source, true).unwrap();
        assert_eq!(root.esta_store().pid_count(), 2);

        let result: Result<RootPidStore<'static, ()>, LoadError> =
            load_from_file("/data/other.proto", &parser, true);
        assert!(matches!(result, Err(LoadError::Parse { .. })));

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pids.proto"), "").unwrap();
        let root: RootPidStore<'static, ()> =
            load_from_directory(dir.path(), &parser, true).unwrap();
        let serial = root.get_descriptor_by_value_for(0x8000, MFR).unwrap();
        assert_eq!(serial.name(), "SERIAL_NUMBER");
    }

    #[test]
    fn manufacturer_without_pids_has_no_store() {
        let mut def = base();
        def.manufacturers.push(manufacturer(0x00b2, vec![]));
        let root = load(&def, true).unwrap();

        assert!(root.manufacturer_store(0x00b2).is_none());
        assert!(root.manufacturer_store(MFR).is_some());
        assert_eq!(root.manufacturer_ids().collect::<Vec<_>>(), vec![MFR]);
        let info = root.get_descriptor_by_value_for(0x0060, 0x00b2).unwrap();
        assert_eq!(info.name(), "DEVICE_INFO");

        // An override that only names the manufacturer adds no store either.
        let mut merger = DefinitionMerger::new();
        merger.add_base(base()).unwrap();
        merger
            .add_override(PidStoreDefinition {
                version: 0,
                esta_pids: vec![],
                manufacturers: vec![manufacturer(0x00a1, vec![])],
            })
            .unwrap();
        let root = merger.build(true).unwrap();
        assert!(root.manufacturer_store(0x00a1).is_none());
    }
}
