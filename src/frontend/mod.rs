//! Input locations and the class sources they produce.

mod bytecode;
mod declared;
#[cfg(test)]
pub(crate) mod fixtures;
mod locations;
mod module;
mod module_info;

pub use bytecode::BytecodeClassSource;
pub use declared::DeclaredClassSource;
pub use locations::{
    ClassFileInputLocation, DirectoryInputLocation, JarInputLocation, MemoryInputLocation,
    location_for_path,
};
pub use module::{DescriptorModuleSource, ModuleDescriptor, PackageDirective};
pub use module_info::decode_module_info;
