use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};
use crate::frontend::bytecode::BytecodeClassSource;
use crate::frontend::module::DescriptorModuleSource;
use crate::frontend::module_info::decode_module_info;
use crate::language::JavaLanguage;
use crate::signature::{ClassType, IdentifierFactory, MODULE_INFO};
use crate::source::{AnalysisInputLocation, ClassLoadingOptions, ClassSource};

const CLASS_SUFFIX: &str = ".class";
/// Per-release overrides of multi-release archives.
const VERSIONED_PREFIX: &str = "META-INF/versions/";

/// Picks the location kind for a path: directories, `.jar` archives and single
/// `.class` files. Module descriptors are read when `language` uses modules.
pub fn location_for_path(
    path: &Path,
    language: &JavaLanguage,
) -> Option<Arc<dyn AnalysisInputLocation>> {
    let modules = language.use_java_modules();
    if path.is_dir() {
        return Some(Arc::new(
            DirectoryInputLocation::new(path).with_modules(modules),
        ));
    }
    if !path.is_file() {
        return None;
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("jar") => Some(Arc::new(JarInputLocation::new(path).with_modules(modules))),
        Some("class") => Some(Arc::new(ClassFileInputLocation::new(path))),
        _ => None,
    }
}

/// Class files under a root directory, laid out by package.
#[derive(Debug)]
pub struct DirectoryInputLocation {
    name: String,
    root: PathBuf,
    modules: bool,
}

impl DirectoryInputLocation {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            name: path_key(&root),
            root,
            modules: false,
        }
    }

    /// Also offer the root `module-info.class` as a module descriptor unit.
    pub fn with_modules(mut self, modules: bool) -> Self {
        self.modules = modules;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn decode(&self, path: &Path, options: &ClassLoadingOptions) -> Result<Arc<dyn ClassSource>> {
        let data = fs::read(path).map_err(|err| Error::io(path, err))?;
        let source = BytecodeClassSource::decode(&self.name, path, &data, options)?;
        Ok(Arc::new(source))
    }

    fn module_source(&self) -> Result<Option<Arc<dyn ClassSource>>> {
        let path = self.root.join(format!("{MODULE_INFO}{CLASS_SUFFIX}"));
        if !self.modules || !path.is_file() {
            return Ok(None);
        }
        let data = fs::read(&path).map_err(|err| Error::io(&path, err))?;
        module_source(&self.name, &path, &data).map(Some)
    }
}

impl AnalysisInputLocation for DirectoryInputLocation {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_source(
        &self,
        class_type: &ClassType,
        options: &ClassLoadingOptions,
    ) -> Result<Option<Arc<dyn ClassSource>>> {
        if class_type.is_module_info() {
            return Ok(self
                .module_source()?
                .filter(|source| source.class_type() == class_type));
        }
        let path = self
            .root
            .join(format!("{}{CLASS_SUFFIX}", class_type.internal_name()));
        if !path.is_file() {
            return Ok(None);
        }
        let source = self.decode(&path, options)?;
        expect_class_type(source, class_type, &path).map(Some)
    }

    fn class_sources(
        &self,
        _factory: &IdentifierFactory,
        options: &ClassLoadingOptions,
    ) -> Result<Vec<Arc<dyn ClassSource>>> {
        let mut files = Vec::new();
        collect_class_files(&self.root, &mut files)?;
        debug!(location = %self.name, classes = files.len(), "enumerating directory");
        let mut sources: Vec<Arc<dyn ClassSource>> = self.module_source()?.into_iter().collect();
        for path in &files {
            sources.push(self.decode(path, options)?);
        }
        Ok(sources)
    }
}

fn collect_class_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|err| Error::io(dir, err))? {
        let entry = entry.map_err(|err| Error::io(dir, err))?;
        entries.push(entry.path());
    }

    // Sorted listings keep enumeration order independent of the file system.
    entries.sort_by(|a, b| path_key(a).cmp(&path_key(b)));

    for entry in entries {
        if entry.is_dir() {
            collect_class_files(&entry, files)?;
        } else if is_class_entry(&path_key(&entry)) {
            files.push(entry);
        }
    }
    Ok(())
}

/// Class files inside a JAR (or any zip) archive.
#[derive(Debug)]
pub struct JarInputLocation {
    name: String,
    path: PathBuf,
    modules: bool,
}

impl JarInputLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path_key(&path),
            path,
            modules: false,
        }
    }

    /// Also offer the root `module-info.class` entry as a module descriptor unit.
    pub fn with_modules(mut self, modules: bool) -> Self {
        self.modules = modules;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<ZipArchive<fs::File>> {
        let file = fs::File::open(&self.path).map_err(|err| Error::io(&self.path, err))?;
        ZipArchive::new(file).map_err(|source| self.archive_error(source))
    }

    fn archive_error(&self, source: ZipError) -> Error {
        Error::Archive {
            path: self.path.clone(),
            source,
        }
    }

    fn read_bytes(
        &self,
        archive: &mut ZipArchive<fs::File>,
        entry_name: &str,
    ) -> Result<Option<Vec<u8>>> {
        let mut entry = match archive.by_name(entry_name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(source) => return Err(self.archive_error(source)),
        };
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|err| Error::io(&self.path, err))?;
        Ok(Some(data))
    }

    fn read_entry(
        &self,
        archive: &mut ZipArchive<fs::File>,
        entry_name: &str,
        options: &ClassLoadingOptions,
    ) -> Result<Option<Arc<dyn ClassSource>>> {
        let Some(data) = self.read_bytes(archive, entry_name)? else {
            return Ok(None);
        };
        let source_path = PathBuf::from(jar_entry_uri(&self.path, entry_name));
        let source = BytecodeClassSource::decode(&self.name, &source_path, &data, options)?;
        Ok(Some(Arc::new(source)))
    }

    fn module_entry(
        &self,
        archive: &mut ZipArchive<fs::File>,
    ) -> Result<Option<Arc<dyn ClassSource>>> {
        if !self.modules {
            return Ok(None);
        }
        let entry_name = format!("{MODULE_INFO}{CLASS_SUFFIX}");
        let Some(data) = self.read_bytes(archive, &entry_name)? else {
            return Ok(None);
        };
        let source_path = PathBuf::from(jar_entry_uri(&self.path, &entry_name));
        module_source(&self.name, &source_path, &data).map(Some)
    }
}

impl AnalysisInputLocation for JarInputLocation {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_source(
        &self,
        class_type: &ClassType,
        options: &ClassLoadingOptions,
    ) -> Result<Option<Arc<dyn ClassSource>>> {
        let mut archive = self.open()?;
        if class_type.is_module_info() {
            return Ok(self
                .module_entry(&mut archive)?
                .filter(|source| source.class_type() == class_type));
        }
        let entry_name = format!("{}{CLASS_SUFFIX}", class_type.internal_name());
        match self.read_entry(&mut archive, &entry_name, options)? {
            Some(source) => {
                let path = PathBuf::from(jar_entry_uri(&self.path, &entry_name));
                expect_class_type(source, class_type, &path).map(Some)
            }
            None => Ok(None),
        }
    }

    fn class_sources(
        &self,
        _factory: &IdentifierFactory,
        options: &ClassLoadingOptions,
    ) -> Result<Vec<Arc<dyn ClassSource>>> {
        let mut archive = self.open()?;

        let mut entry_names = Vec::new();
        for index in 0..archive.len() {
            let entry = archive
                .by_index(index)
                .map_err(|source| self.archive_error(source))?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            if is_class_entry(&name) && !name.starts_with(VERSIONED_PREFIX) {
                entry_names.push(name);
            }
        }

        entry_names.sort();
        debug!(location = %self.name, classes = entry_names.len(), "enumerating archive");

        let mut sources: Vec<Arc<dyn ClassSource>> =
            self.module_entry(&mut archive)?.into_iter().collect();
        for name in entry_names {
            if let Some(source) = self.read_entry(&mut archive, &name, options)? {
                sources.push(source);
            }
        }
        Ok(sources)
    }
}

/// A single class file given directly as input.
#[derive(Debug)]
pub struct ClassFileInputLocation {
    name: String,
    path: PathBuf,
}

impl ClassFileInputLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path_key(&path),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(&self, options: &ClassLoadingOptions) -> Result<Arc<dyn ClassSource>> {
        let data = fs::read(&self.path).map_err(|err| Error::io(&self.path, err))?;
        let source = BytecodeClassSource::decode(&self.name, &self.path, &data, options)?;
        Ok(Arc::new(source))
    }
}

impl AnalysisInputLocation for ClassFileInputLocation {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_source(
        &self,
        class_type: &ClassType,
        options: &ClassLoadingOptions,
    ) -> Result<Option<Arc<dyn ClassSource>>> {
        let file_stem = self.path.file_stem().and_then(|stem| stem.to_str());
        if class_type.is_module_info() || file_stem != Some(class_type.class_name()) {
            return Ok(None);
        }
        let source = self.decode(options)?;
        Ok((source.class_type() == class_type).then_some(source))
    }

    fn class_sources(
        &self,
        _factory: &IdentifierFactory,
        options: &ClassLoadingOptions,
    ) -> Result<Vec<Arc<dyn ClassSource>>> {
        Ok(vec![self.decode(options)?])
    }
}

/// Sources held in memory, keyed by identity in insertion order.
#[derive(Debug)]
pub struct MemoryInputLocation {
    name: String,
    sources: IndexMap<ClassType, Arc<dyn ClassSource>>,
}

impl MemoryInputLocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: IndexMap::new(),
        }
    }

    /// Adds or replaces the source for its class type.
    pub fn with_source(mut self, source: impl ClassSource + 'static) -> Self {
        self.insert(Arc::new(source));
        self
    }

    pub fn insert(&mut self, source: Arc<dyn ClassSource>) {
        self.sources.insert(source.class_type().clone(), source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl AnalysisInputLocation for MemoryInputLocation {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_source(
        &self,
        class_type: &ClassType,
        _options: &ClassLoadingOptions,
    ) -> Result<Option<Arc<dyn ClassSource>>> {
        Ok(self.sources.get(class_type).cloned())
    }

    fn class_sources(
        &self,
        _factory: &IdentifierFactory,
        _options: &ClassLoadingOptions,
    ) -> Result<Vec<Arc<dyn ClassSource>>> {
        Ok(self.sources.values().cloned().collect())
    }
}

fn module_source(location: &str, path: &Path, data: &[u8]) -> Result<Arc<dyn ClassSource>> {
    let descriptor = decode_module_info(data, &path.display().to_string())?;
    debug!(location = %location, module = %descriptor.name, "decoded module descriptor");
    Ok(Arc::new(
        DescriptorModuleSource::new(location, descriptor).with_source_path(path),
    ))
}

fn expect_class_type(
    source: Arc<dyn ClassSource>,
    class_type: &ClassType,
    path: &Path,
) -> Result<Arc<dyn ClassSource>> {
    if source.class_type() == class_type {
        Ok(source)
    } else {
        Err(Error::decode(
            path.display().to_string(),
            format!("declares {} instead of {class_type}", source.class_type()),
        ))
    }
}

fn is_class_entry(name: &str) -> bool {
    name.ends_with(CLASS_SUFFIX) && !name.ends_with(&format!("{MODULE_INFO}{CLASS_SUFFIX}"))
}

fn jar_entry_uri(jar_path: &Path, entry_name: &str) -> String {
    format!("jar:{}!/{}", jar_path.to_string_lossy(), entry_name)
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
