//! Memoizing class resolver over a project's input locations.
//!
//! Every unit is built at most once per view. The cache lock is held for the
//! whole lookup-or-build sequence, so concurrent first requests for the same
//! identity build once and all callers share the result.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::language;
use crate::model::{AbstractClass, SootClass, SootModuleInfo, build_class};
use crate::project::Project;
use crate::signature::{AnnotationType, ClassType, PACKAGE_INFO, PackageName};
use crate::source::{AnalysisInputLocation, ClassLoadingOptions, ClassSource, SourceType};
use crate::types::TypeHierarchy;

/// Picks loading options per location; `None` means the defaults.
pub type OptionsSpecifier =
    Box<dyn Fn(&dyn AnalysisInputLocation) -> Option<ClassLoadingOptions> + Send + Sync>;

/// Resolves and memoizes the classes of one [`Project`].
///
/// Point lookups consult every location and fail on ambiguity; full
/// enumeration walks the locations once and keeps the first unit seen for
/// each identity.
pub struct JavaView {
    project: Project,
    cache: Mutex<IndexMap<ClassType, AbstractClass>>,
    fully_resolved: AtomicBool,
    options_specifier: OptionsSpecifier,
}

impl fmt::Debug for JavaView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JavaView")
            .field("project", &self.project)
            .field("cached", &self.cached_class_count())
            .field("fully_resolved", &self.done_resolving())
            .finish()
    }
}

impl JavaView {
    /// View with default loading options for every location.
    pub fn new(project: Project) -> Self {
        Self::with_options_specifier(project, Box::new(|_: &dyn AnalysisInputLocation| None))
    }

    /// View that asks `options_specifier` for each location's loading options.
    pub fn with_options_specifier(project: Project, options_specifier: OptionsSpecifier) -> Self {
        Self {
            project,
            cache: Mutex::new(IndexMap::new()),
            fully_resolved: AtomicBool::new(false),
            options_specifier,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    fn options_for(&self, location: &dyn AnalysisInputLocation) -> ClassLoadingOptions {
        (self.options_specifier)(location).unwrap_or_default()
    }

    /// Standard class for `class_type`.
    pub fn get_class(&self, class_type: &ClassType) -> Result<Arc<SootClass>> {
        match self.get_abstract_class(class_type)? {
            AbstractClass::Class(class) => Ok(class),
            other => Err(type_mismatch(class_type, "class", &other)),
        }
    }

    /// Module descriptor for `class_type`, a `module-info` identity.
    pub fn get_module_info(&self, class_type: &ClassType) -> Result<Arc<SootModuleInfo>> {
        match self.get_abstract_class(class_type)? {
            AbstractClass::Module(module) => Ok(module),
            other => Err(type_mismatch(class_type, "module descriptor", &other)),
        }
    }

    /// Memoized unit for `class_type`, resolving it on first request.
    pub fn get_abstract_class(&self, class_type: &ClassType) -> Result<AbstractClass> {
        let mut cache = self.cache.lock();
        if let Some(cached) = cache.get(class_type) {
            trace!(class = %class_type, "class cache hit");
            return Ok(cached.clone());
        }

        debug!(class = %class_type, "class cache miss");
        let mut candidates: Vec<(String, SourceType, Arc<dyn ClassSource>)> = Vec::new();
        for (location, source_type) in self.project.tagged_locations() {
            let options = self.options_for(location.as_ref());
            if let Some(source) = location.class_source(class_type, &options)? {
                candidates.push((location.name().to_string(), source_type, source));
            }
        }

        match candidates.len() {
            0 => Err(Error::NotFound(class_type.clone())),
            1 => {
                let (location, source_type, source) = &candidates[0];
                debug!(class = %class_type, location = %location, "building class");
                let built = build_class(source.as_ref(), *source_type);
                cache.insert(class_type.clone(), built.clone());
                Ok(built)
            }
            _ => {
                let locations: Vec<String> = candidates
                    .into_iter()
                    .map(|(location, _, _)| location)
                    .collect();
                warn!(class = %class_type, ?locations, "ambiguous class resolution");
                Err(Error::AmbiguousResolution {
                    class_type: class_type.clone(),
                    locations,
                })
            }
        }
    }

    /// Every standard class of every location, in resolution order.
    pub fn get_classes(&self) -> Result<Vec<Arc<SootClass>>> {
        let mut cache = self.cache.lock();
        if !self.done_resolving() {
            self.resolve_all(&mut cache)?;
        }
        Ok(cache
            .values()
            .filter_map(|class| class.as_class().cloned())
            .collect())
    }

    pub fn get_classes_stream(&self) -> Result<std::vec::IntoIter<Arc<SootClass>>> {
        Ok(self.get_classes()?.into_iter())
    }

    /// On duplicate identities the first registered location wins.
    fn resolve_all(&self, cache: &mut IndexMap<ClassType, AbstractClass>) -> Result<()> {
        let factory = self.project.language().identifier_factory();
        for (location, source_type) in self.project.tagged_locations() {
            let options = self.options_for(location.as_ref());
            let sources = location.class_sources(&factory, &options)?;
            debug!(location = %location.name(), sources = sources.len(), "resolving location");
            for source in sources {
                if cache.contains_key(source.class_type()) {
                    trace!(class = %source.class_type(), "already resolved");
                    continue;
                }
                let built = build_class(source.as_ref(), source_type);
                cache.insert(source.class_type().clone(), built);
            }
        }
        self.fully_resolved.store(true, Ordering::Release);
        debug!(classes = cache.len(), "view fully resolved");
        Ok(())
    }

    /// Whether a full enumeration has completed.
    pub fn done_resolving(&self) -> bool {
        self.fully_resolved.load(Ordering::Acquire)
    }

    pub fn quoted_name_of(&self, name: &str) -> String {
        language::quoted_name_of(name)
    }

    /// Annotations declared on `package-info`; empty when the package has none.
    pub fn package_annotations(&self, package: &PackageName) -> Result<Vec<AnnotationType>> {
        let factory = self.project.language().identifier_factory();
        let class_type = factory.class_type(PACKAGE_INFO, package.as_str());
        match self.get_class(&class_type) {
            Ok(class) => Ok(class.annotations().to_vec()),
            Err(Error::NotFound(_)) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// Number of memoized units, classes and module descriptors alike.
    pub fn cached_class_count(&self) -> usize {
        self.cache.lock().len()
    }
}

impl TypeHierarchy for JavaView {
    fn direct_supertypes(&self, class_type: &ClassType) -> Vec<ClassType> {
        match self.get_class(class_type) {
            Ok(class) => class.direct_supertypes(),
            Err(err) => {
                trace!(class = %class_type, error = %err, "no supertypes");
                Vec::new()
            }
        }
    }
}

fn type_mismatch(class_type: &ClassType, expected: &'static str, found: &AbstractClass) -> Error {
    Error::TypeMismatch {
        class_type: class_type.clone(),
        expected,
        found: found.kind_name(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::frontend::fixtures::ClassFixture;
    use crate::frontend::{
        DeclaredClassSource, DescriptorModuleSource, DirectoryInputLocation, MemoryInputLocation,
        ModuleDescriptor,
    };
    use crate::language::JavaLanguage;
    use crate::signature::IdentifierFactory;
    use crate::types::Type;

    #[derive(Debug)]
    struct CountingLocation {
        inner: MemoryInputLocation,
        lookups: AtomicUsize,
        enumerations: AtomicUsize,
        failing: bool,
        seen_options: Mutex<Vec<ClassLoadingOptions>>,
    }

    impl CountingLocation {
        fn new(inner: MemoryInputLocation) -> Arc<Self> {
            Arc::new(Self {
                inner,
                lookups: AtomicUsize::new(0),
                enumerations: AtomicUsize::new(0),
                failing: false,
                seen_options: Mutex::new(Vec::new()),
            })
        }

        fn failing(name: &str) -> Arc<Self> {
            Arc::new(Self {
                inner: MemoryInputLocation::new(name),
                lookups: AtomicUsize::new(0),
                enumerations: AtomicUsize::new(0),
                failing: true,
                seen_options: Mutex::new(Vec::new()),
            })
        }

        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }

        fn enumerations(&self) -> usize {
            self.enumerations.load(Ordering::SeqCst)
        }
    }

    impl AnalysisInputLocation for CountingLocation {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn class_source(
            &self,
            class_type: &ClassType,
            options: &ClassLoadingOptions,
        ) -> Result<Option<Arc<dyn ClassSource>>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.seen_options.lock().push(options.clone());
            if self.failing {
                return Err(Error::decode(self.name(), "broken location"));
            }
            self.inner.class_source(class_type, options)
        }

        fn class_sources(
            &self,
            factory: &IdentifierFactory,
            options: &ClassLoadingOptions,
        ) -> Result<Vec<Arc<dyn ClassSource>>> {
            self.enumerations.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return Err(Error::decode(self.name(), "broken location"));
            }
            self.inner.class_sources(factory, options)
        }
    }

    /// Counts how often the view builds a class from this source.
    #[derive(Debug)]
    struct CountingSource {
        inner: DeclaredClassSource,
        builds: Arc<AtomicUsize>,
    }

    impl ClassSource for CountingSource {
        fn input_location(&self) -> &str {
            self.inner.input_location()
        }

        fn source_path(&self) -> &std::path::Path {
            self.inner.source_path()
        }

        fn class_type(&self) -> &ClassType {
            self.inner.class_type()
        }

        fn resolve_modifiers(&self) -> crate::modifier::Modifiers {
            self.builds.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve_modifiers()
        }

        fn resolve_position(&self) -> Option<crate::position::Position> {
            self.inner.resolve_position()
        }
    }

    fn class(name: &str) -> ClassType {
        IdentifierFactory.class_type_from_fqn(name)
    }

    fn memory(name: &str, classes: &[&str]) -> MemoryInputLocation {
        classes
            .iter()
            .fold(MemoryInputLocation::new(name), |location, class_name| {
                location.with_source(DeclaredClassSource::new(name, class(class_name)))
            })
    }

    fn view_of(locations: &[Arc<CountingLocation>]) -> JavaView {
        locations
            .iter()
            .fold(Project::builder(JavaLanguage::default()), |builder, location| {
                builder.add_input_location(location.clone())
            })
            .build()
            .create_view()
    }

    #[test]
    fn get_class_builds_once_and_memoizes() {
        let location = CountingLocation::new(memory("main", &["com.example.A"]));
        let view = view_of(&[location.clone()]);

        let first = view.get_class(&class("com.example.A")).expect("first lookup");
        let second = view.get_class(&class("com.example.A")).expect("second lookup");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(1, location.lookups());
        assert_eq!(1, view.cached_class_count());
    }

    #[test]
    fn get_class_reports_every_claiming_location() {
        let main = CountingLocation::new(memory("main", &["com.example.A"]));
        let lib = CountingLocation::new(memory("lib", &["com.example.B"]));
        let shadow = CountingLocation::new(memory("shadow", &["com.example.A"]));
        let view = view_of(&[main, lib, shadow]);

        let result = view.get_class(&class("com.example.A"));

        match result {
            Err(Error::AmbiguousResolution {
                class_type,
                locations,
            }) => {
                assert_eq!(class("com.example.A"), class_type);
                assert_eq!(vec!["main", "shadow"], locations);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
        assert_eq!(0, view.cached_class_count());
    }

    #[test]
    fn get_class_fails_when_no_location_has_the_class() {
        let location = CountingLocation::new(memory("main", &["com.example.A"]));
        let view = view_of(&[location]);

        let result = view.get_class(&class("com.example.Missing"));

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(0, view.cached_class_count());
    }

    #[test]
    fn failing_location_leaves_cache_unmodified() {
        let good = CountingLocation::new(memory("good", &["com.example.A"]));
        let broken = CountingLocation::failing("broken");
        let view = view_of(&[good, broken]);

        assert!(matches!(
            view.get_class(&class("com.example.A")),
            Err(Error::Decode { .. })
        ));
        assert_eq!(0, view.cached_class_count());
        assert!(view.get_classes().is_err());
        assert!(!view.done_resolving());
    }

    #[test]
    fn full_resolution_happens_once() {
        let main = CountingLocation::new(memory("main", &["com.example.B", "com.example.A"]));
        let lib = CountingLocation::new(memory("lib", &["org.lib.C"]));
        let view = view_of(&[main.clone(), lib.clone()]);
        assert!(!view.done_resolving());

        let first = view.get_classes().expect("first enumeration");
        let second = view.get_classes().expect("second enumeration");

        assert!(view.done_resolving());
        assert_eq!(1, main.enumerations());
        assert_eq!(1, lib.enumerations());
        let names: Vec<String> = first.iter().map(|c| c.class_type().to_string()).collect();
        assert_eq!(vec!["com.example.B", "com.example.A", "org.lib.C"], names);
        assert_eq!(first.len(), second.len());
        assert!(
            first
                .iter()
                .zip(second.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b))
        );
        assert_eq!(3, view.get_classes_stream().expect("stream").count());
    }

    #[test]
    fn full_resolution_keeps_classes_resolved_earlier() {
        let main = CountingLocation::new(memory("main", &["com.example.A", "com.example.B"]));
        let view = view_of(&[main]);
        let early = view.get_class(&class("com.example.B")).expect("lookup");

        let all = view.get_classes().expect("enumeration");

        assert_eq!(2, all.len());
        assert!(Arc::ptr_eq(&early, &all[0]));
    }

    #[test]
    fn get_class_after_full_resolution_reuses_the_built_class() {
        let builds = Arc::new(AtomicUsize::new(0));
        let location = CountingLocation::new(MemoryInputLocation::new("main").with_source(
            CountingSource {
                inner: DeclaredClassSource::new("main", class("com.example.A")),
                builds: builds.clone(),
            },
        ));
        let view = view_of(&[location.clone()]);

        let all = view.get_classes().expect("enumeration");
        let single = view.get_class(&class("com.example.A")).expect("lookup");

        assert_eq!(0, location.lookups());
        assert_eq!(1, builds.load(Ordering::SeqCst));
        assert!(Arc::ptr_eq(&all[0], &single));
    }

    #[test]
    fn classes_carry_the_source_type_of_their_location() {
        let main = CountingLocation::new(memory("main", &["com.example.A"]));
        let lib = CountingLocation::new(memory("lib", &["org.lib.B"]));
        let view = Project::builder(JavaLanguage::default())
            .add_input_location(main)
            .add_library_location(lib)
            .build()
            .create_view();

        let app = view.get_class(&class("com.example.A")).expect("application class");
        let all = view.get_classes().expect("enumeration");

        assert!(app.is_application_class());
        assert_eq!(SourceType::Library, all[1].source_type());
        assert!(all[1].is_library_class());
    }

    #[test]
    fn full_resolution_prefers_first_registered_location() {
        let main = CountingLocation::new(memory("main", &["com.example.A"]));
        let shadow = CountingLocation::new(memory("shadow", &["com.example.A"]));
        let view = view_of(&[main, shadow]);

        let classes = view.get_classes().expect("enumeration");

        assert_eq!(1, classes.len());
        assert_eq!("main", classes[0].input_location());
    }

    #[test]
    fn concurrent_first_requests_build_once() {
        let location = CountingLocation::new(memory("main", &["com.example.A"]));
        let view = view_of(&[location.clone()]);
        let target = class("com.example.A");
        let (view, target) = (&view, &target);

        let results: Vec<Arc<SootClass>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(move || view.get_class(target).expect("lookup")))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("thread"))
                .collect()
        });

        assert_eq!(1, location.lookups());
        assert!(results.iter().all(|class| Arc::ptr_eq(class, &results[0])));
    }

    #[test]
    fn module_units_only_resolve_as_module_info() {
        let mut location = memory("main", &["com.example.A"]);
        location.insert(Arc::new(DescriptorModuleSource::new(
            "main",
            ModuleDescriptor::new("com.example").with_requires("java.base", 0),
        )));
        let view = view_of(&[CountingLocation::new(location)]);
        let module_type = IdentifierFactory.module_info_type("com.example");

        assert!(matches!(
            view.get_class(&module_type),
            Err(Error::TypeMismatch {
                expected: "class",
                found: "module descriptor",
                ..
            })
        ));
        let module = view.get_module_info(&module_type).expect("module");
        assert_eq!("com.example", module.module_name());
        assert!(matches!(
            view.get_module_info(&class("com.example.A")),
            Err(Error::TypeMismatch { .. })
        ));
        assert_eq!(1, view.get_classes().expect("enumeration").len());
    }

    #[test]
    fn options_specifier_applies_per_location() {
        let main = CountingLocation::new(memory("main", &["com.example.A"]));
        let lib = CountingLocation::new(memory("lib", &[]));
        let project = Project::builder(JavaLanguage::default())
            .add_input_location(main.clone())
            .add_input_location(lib.clone())
            .build();
        let view = project.create_view_with_options(Box::new(
            |location: &dyn AnalysisInputLocation| {
                (location.name() == "lib").then(|| ClassLoadingOptions {
                    resolve_members: false,
                    include_synthetic: true,
                })
            },
        ));

        view.get_class(&class("com.example.A")).expect("lookup");

        assert!(main.seen_options.lock()[0].resolve_members);
        assert!(!lib.seen_options.lock()[0].resolve_members);
    }

    #[test]
    fn view_answers_subtyping_queries() {
        let location = MemoryInputLocation::new("main")
            .with_source(
                DeclaredClassSource::new("main", class("com.example.Base"))
                    .with_superclass(class("java.lang.Object")),
            )
            .with_source(
                DeclaredClassSource::new("main", class("com.example.Derived"))
                    .with_superclass(class("com.example.Base"))
                    .with_interface(class("java.lang.Runnable")),
            );
        let view = view_of(&[CountingLocation::new(location)]);
        let derived = Type::Class(class("com.example.Derived"));

        assert!(derived.is_assignable_to(&Type::Class(class("com.example.Base")), &view));
        assert!(derived.is_assignable_to(&Type::Class(class("java.lang.Runnable")), &view));
        assert!(!Type::Class(class("com.example.Base")).is_assignable_to(&derived, &view));
    }

    #[test]
    fn package_annotations_come_from_package_info() {
        let deprecated = AnnotationType::new(class("java.lang.Deprecated"));
        let location = MemoryInputLocation::new("main").with_source(
            DeclaredClassSource::new("main", class("com.example.package-info"))
                .with_annotation(deprecated.clone()),
        );
        let view = view_of(&[CountingLocation::new(location)]);
        let factory = IdentifierFactory;

        let annotated = view
            .package_annotations(&factory.package_name("com.example"))
            .expect("annotations");
        let plain = view
            .package_annotations(&factory.package_name("org.other"))
            .expect("annotations");

        assert_eq!(vec![deprecated], annotated);
        assert!(plain.is_empty());
    }

    #[test]
    fn package_annotations_are_read_from_class_files() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        ClassFixture::new("com/example/package-info")
            .flags(0x1600)
            .annotation("Ljava/lang/Deprecated;")
            .write_under(temp_dir.path());
        let view = Project::builder(JavaLanguage::default())
            .add_input_location(Arc::new(DirectoryInputLocation::new(temp_dir.path())))
            .build()
            .create_view();

        let annotations = view
            .package_annotations(&IdentifierFactory.package_name("com.example"))
            .expect("annotations");

        assert_eq!(
            vec![AnnotationType::new(class("java.lang.Deprecated"))],
            annotations
        );
    }

    #[test]
    fn module_info_resolves_from_a_class_file_directory() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let descriptor = ModuleDescriptor::new("com.example").with_requires("java.base", 0x8000);
        std::fs::write(
            temp_dir.path().join("module-info.class"),
            ClassFixture::module(&descriptor).build(),
        )
        .expect("write module-info");
        let language = JavaLanguage::new(11);
        let location = DirectoryInputLocation::new(temp_dir.path())
            .with_modules(language.use_java_modules());
        let view = Project::builder(language)
            .add_input_location(Arc::new(location))
            .build()
            .create_view();

        let module = view
            .get_module_info(&IdentifierFactory.module_info_type("com.example"))
            .expect("module");

        assert_eq!("com.example", module.module_name());
        assert_eq!(1, module.requires().len());
    }

    #[test]
    fn view_quotes_reserved_names() {
        let view = view_of(&[]);

        assert_eq!("'class'.'to'.'new'", view.quoted_name_of("class.to.new"));
        assert_eq!("plain.name", view.quoted_name_of("plain.name"));
    }
}
