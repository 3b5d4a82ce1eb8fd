use std::path::{Path, PathBuf};

use crate::modifier::{Modifiers, module_modifiers, package_reference_modifiers, requires_modifiers};
use crate::position::Position;
use crate::signature::{ClassType, IdentifierFactory};
use crate::source::{
    ClassSource, ModuleClassSource, ModuleReference, PackageReference, ServiceProvision,
};

/// `exports` or `opens` entry as stored in a module descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageDirective {
    /// Internal (`a/b`) or dotted package name.
    pub package: String,
    pub flags: u16,
    /// Module names the directive is qualified to.
    pub targets: Vec<String>,
}

/// Undecoded module descriptor: names as spelled in the `Module` attribute
/// plus raw access flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub name: String,
    pub flags: u16,
    pub requires: Vec<(String, u16)>,
    pub exports: Vec<PackageDirective>,
    pub opens: Vec<PackageDirective>,
    /// Service internal name with its provider internal names.
    pub provides: Vec<(String, Vec<String>)>,
    pub uses: Vec<String>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_requires(mut self, module: impl Into<String>, flags: u16) -> Self {
        self.requires.push((module.into(), flags));
        self
    }

    pub fn with_exports(
        mut self,
        package: impl Into<String>,
        flags: u16,
        targets: &[&str],
    ) -> Self {
        self.exports.push(package_directive(package, flags, targets));
        self
    }

    pub fn with_opens(mut self, package: impl Into<String>, flags: u16, targets: &[&str]) -> Self {
        self.opens.push(package_directive(package, flags, targets));
        self
    }

    pub fn with_provides(mut self, service: impl Into<String>, providers: &[&str]) -> Self {
        self.provides.push((
            service.into(),
            providers.iter().map(|provider| provider.to_string()).collect(),
        ));
        self
    }

    pub fn with_uses(mut self, service: impl Into<String>) -> Self {
        self.uses.push(service.into());
        self
    }
}

fn package_directive(package: impl Into<String>, flags: u16, targets: &[&str]) -> PackageDirective {
    PackageDirective {
        package: package.into(),
        flags,
        targets: targets.iter().map(|target| target.to_string()).collect(),
    }
}

/// Adapts a [`ModuleDescriptor`] to the module facet. References that do not
/// name a valid module, package or class are dropped.
#[derive(Debug)]
pub struct DescriptorModuleSource {
    input_location: String,
    source_path: PathBuf,
    class_type: ClassType,
    descriptor: ModuleDescriptor,
    factory: IdentifierFactory,
}

impl DescriptorModuleSource {
    pub fn new(input_location: impl Into<String>, descriptor: ModuleDescriptor) -> Self {
        let factory = IdentifierFactory;
        Self {
            input_location: input_location.into(),
            source_path: PathBuf::from("module-info.class"),
            class_type: factory.module_info_type(&descriptor.name),
            descriptor,
            factory,
        }
    }

    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = path.into();
        self
    }

    fn module_type(&self, name: &str) -> Option<ClassType> {
        self.factory
            .is_valid_module_name(name)
            .then(|| self.factory.module_info_type(name))
    }

    fn service_type(&self, internal: &str) -> Option<ClassType> {
        let fqn = internal.replace('/', ".");
        self.factory
            .is_valid_package_name(&fqn)
            .then(|| self.factory.class_type_from_fqn(&fqn))
    }

    fn package_references(&self, directives: &[PackageDirective]) -> Vec<PackageReference> {
        directives
            .iter()
            .filter_map(|directive| {
                let package = directive.package.replace('/', ".");
                if !self.factory.is_valid_package_name(&package) {
                    return None;
                }
                Some(PackageReference {
                    package: self.factory.package_name(&package),
                    modifiers: package_reference_modifiers(directive.flags),
                    targets: directive
                        .targets
                        .iter()
                        .filter_map(|target| self.module_type(target))
                        .collect(),
                })
            })
            .collect()
    }
}

impl ClassSource for DescriptorModuleSource {
    fn input_location(&self) -> &str {
        &self.input_location
    }

    fn source_path(&self) -> &Path {
        &self.source_path
    }

    fn class_type(&self) -> &ClassType {
        &self.class_type
    }

    fn resolve_modifiers(&self) -> Modifiers {
        module_modifiers(self.descriptor.flags)
    }

    fn resolve_position(&self) -> Option<Position> {
        None
    }

    fn module_facet(&self) -> Option<&dyn ModuleClassSource> {
        Some(self)
    }
}

impl ModuleClassSource for DescriptorModuleSource {
    fn module_name(&self) -> &str {
        &self.descriptor.name
    }

    fn requires(&self) -> Vec<ModuleReference> {
        self.descriptor
            .requires
            .iter()
            .filter_map(|(name, flags)| {
                self.module_type(name).map(|module| ModuleReference {
                    module,
                    modifiers: requires_modifiers(*flags),
                })
            })
            .collect()
    }

    fn exports(&self) -> Vec<PackageReference> {
        self.package_references(&self.descriptor.exports)
    }

    fn opens(&self) -> Vec<PackageReference> {
        self.package_references(&self.descriptor.opens)
    }

    fn provides(&self) -> Vec<ServiceProvision> {
        self.descriptor
            .provides
            .iter()
            .filter_map(|(service, providers)| {
                Some(ServiceProvision {
                    service: self.service_type(service)?,
                    providers: providers
                        .iter()
                        .filter_map(|provider| self.service_type(provider))
                        .collect(),
                })
            })
            .collect()
    }

    fn uses(&self) -> Vec<ClassType> {
        self.descriptor
            .uses
            .iter()
            .filter_map(|service| self.service_type(service))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::Modifier;

    fn app_descriptor() -> ModuleDescriptor {
        ModuleDescriptor::new("com.example.app")
            .with_flags(0x0020)
            .with_requires("java.base", 0x8000)
            .with_requires("com.example.lib", 0x0020)
            .with_requires("not a module", 0)
            .with_exports("com/example/api", 0, &[])
            .with_exports("com/example/internal", 0, &["com.example.friend", "bad name"])
            .with_exports("1bad/package", 0, &[])
            .with_opens("com/example/model", 0x1000, &["com.example.friend"])
            .with_provides(
                "com/example/spi/Plugin",
                &["com/example/impl/FirstPlugin", "com/example/impl/Second Plugin"],
            )
            .with_provides("not valid!", &["com/example/impl/Ignored"])
            .with_uses("com/example/spi/Plugin")
            .with_uses("")
    }

    #[test]
    fn identity_is_module_info_of_the_module() {
        let source = DescriptorModuleSource::new("memory", app_descriptor());

        assert!(source.class_type().is_module_info());
        assert_eq!("com.example.app.module-info", source.class_type().to_string());
        assert!(source.resolve_modifiers().contains(&Modifier::Open));
        assert!(source.module_facet().is_some());
    }

    #[test]
    fn requires_keeps_every_valid_module() {
        let source = DescriptorModuleSource::new("memory", app_descriptor());

        let requires = source.requires();

        let names: Vec<String> = requires
            .iter()
            .map(|reference| reference.module.package_name().to_string())
            .collect();
        assert_eq!(vec!["java.base", "com.example.lib"], names);
        assert!(requires[1].modifiers.contains(&Modifier::Transitive));
    }

    #[test]
    fn exports_drop_invalid_packages_and_targets() {
        let source = DescriptorModuleSource::new("memory", app_descriptor());

        let exports = source.exports();

        assert_eq!(2, exports.len());
        assert_eq!("com.example.api", exports[0].package.as_str());
        assert!(exports[0].targets.is_empty());
        assert_eq!(1, exports[1].targets.len());
        assert!(exports[1].targets[0].is_module_info());
        let opens = source.opens();
        assert!(opens[0].modifiers.contains(&Modifier::Synthetic));
    }

    #[test]
    fn provides_and_uses_keep_valid_types() {
        let source = DescriptorModuleSource::new("memory", app_descriptor());

        let provides = source.provides();
        assert_eq!(1, provides.len());
        assert_eq!("com.example.spi.Plugin", provides[0].service.to_string());
        assert_eq!(1, provides[0].providers.len());

        let uses = source.uses();
        assert_eq!(1, uses.len());
    }

    #[test]
    fn empty_descriptor_has_empty_relations() {
        let source = DescriptorModuleSource::new("memory", ModuleDescriptor::new("solo"));

        assert!(source.requires().is_empty());
        assert!(source.exports().is_empty());
        assert!(source.provides().is_empty());
        assert!(source.uses().is_empty());
    }
}
