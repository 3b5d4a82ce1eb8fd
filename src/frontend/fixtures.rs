//! Hand-assembled class files for tests.

use std::fs;
use std::path::Path;

use crate::frontend::module::ModuleDescriptor;

pub(crate) struct ClassFixture {
    name: String,
    super_name: Option<String>,
    flags: u16,
    interfaces: Vec<String>,
    fields: Vec<(String, String, u16)>,
    methods: Vec<(String, String, u16)>,
    annotations: Vec<String>,
    module: Option<ModuleDescriptor>,
}

impl ClassFixture {
    /// Public class `name` (internal form) extending `java/lang/Object`.
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            super_name: Some("java/lang/Object".to_string()),
            flags: 0x0021,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
            module: None,
        }
    }

    /// `module-info` class carrying `descriptor` as its `Module` attribute.
    pub(crate) fn module(descriptor: &ModuleDescriptor) -> Self {
        Self {
            module: Some(descriptor.clone()),
            ..Self::new("module-info").flags(0x8000).super_name(None)
        }
    }

    pub(crate) fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub(crate) fn super_name(mut self, super_name: Option<&str>) -> Self {
        self.super_name = super_name.map(str::to_string);
        self
    }

    pub(crate) fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub(crate) fn field(mut self, name: &str, descriptor: &str, flags: u16) -> Self {
        self.fields
            .push((name.to_string(), descriptor.to_string(), flags));
        self
    }

    /// Runtime-visible class annotation given by its type descriptor.
    pub(crate) fn annotation(mut self, descriptor: &str) -> Self {
        self.annotations.push(descriptor.to_string());
        self
    }

    /// Methods carry no `Code` attribute, so give them `abstract` or `native`.
    pub(crate) fn method(mut self, name: &str, descriptor: &str, flags: u16) -> Self {
        self.methods
            .push((name.to_string(), descriptor.to_string(), flags));
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut pool = ConstantPoolBuilder::default();
        let this_class = pool.class(&self.name);
        let super_class = self
            .super_name
            .as_deref()
            .map(|name| pool.class(name))
            .unwrap_or(0);
        let interfaces: Vec<u16> = self.interfaces.iter().map(|name| pool.class(name)).collect();
        let fields: Vec<(u16, u16, u16)> = self
            .fields
            .iter()
            .map(|(name, descriptor, flags)| (*flags, pool.utf8(name), pool.utf8(descriptor)))
            .collect();
        let methods: Vec<(u16, u16, u16)> = self
            .methods
            .iter()
            .map(|(name, descriptor, flags)| (*flags, pool.utf8(name), pool.utf8(descriptor)))
            .collect();
        let mut attributes: Vec<(u16, Vec<u8>)> = Vec::new();
        if !self.annotations.is_empty() {
            let mut body = Vec::new();
            push_u16(&mut body, self.annotations.len() as u16);
            for descriptor in &self.annotations {
                push_u16(&mut body, pool.utf8(descriptor));
                push_u16(&mut body, 0);
            }
            attributes.push((pool.utf8("RuntimeVisibleAnnotations"), body));
        }
        if let Some(module) = &self.module {
            let body = module_attribute(&mut pool, module);
            attributes.push((pool.utf8("Module"), body));
        }

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABE_u32.to_be_bytes());
        push_u16(&mut out, 0);
        push_u16(&mut out, 52);
        push_u16(&mut out, pool.entries.len() as u16 + 1);
        for entry in &pool.entries {
            out.extend_from_slice(entry);
        }
        push_u16(&mut out, self.flags);
        push_u16(&mut out, this_class);
        push_u16(&mut out, super_class);
        push_u16(&mut out, interfaces.len() as u16);
        for index in interfaces {
            push_u16(&mut out, index);
        }
        for members in [&fields, &methods] {
            push_u16(&mut out, members.len() as u16);
            for (flags, name, descriptor) in members {
                push_u16(&mut out, *flags);
                push_u16(&mut out, *name);
                push_u16(&mut out, *descriptor);
                push_u16(&mut out, 0);
            }
        }
        push_u16(&mut out, attributes.len() as u16);
        for (name, body) in attributes {
            push_u16(&mut out, name);
            out.extend_from_slice(&(body.len() as u32).to_be_bytes());
            out.extend_from_slice(&body);
        }
        out
    }

    /// Writes the class under `root` at its package path.
    pub(crate) fn write_under(&self, root: &Path) {
        let path = root.join(format!("{}.class", self.name));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create package directories");
        }
        fs::write(&path, self.build()).expect("write class file");
    }
}

#[derive(Default)]
struct ConstantPoolBuilder {
    entries: Vec<Vec<u8>>,
}

impl ConstantPoolBuilder {
    fn utf8(&mut self, value: &str) -> u16 {
        let mut entry = vec![1];
        push_u16(&mut entry, value.len() as u16);
        entry.extend_from_slice(value.as_bytes());
        self.push(entry)
    }

    fn class(&mut self, name: &str) -> u16 {
        self.named(7, name)
    }

    fn module(&mut self, name: &str) -> u16 {
        self.named(19, name)
    }

    fn package(&mut self, name: &str) -> u16 {
        self.named(20, name)
    }

    fn named(&mut self, tag: u8, name: &str) -> u16 {
        let name_index = self.utf8(name);
        let mut entry = vec![tag];
        push_u16(&mut entry, name_index);
        self.push(entry)
    }

    fn push(&mut self, entry: Vec<u8>) -> u16 {
        self.entries.push(entry);
        self.entries.len() as u16
    }
}

fn module_attribute(pool: &mut ConstantPoolBuilder, module: &ModuleDescriptor) -> Vec<u8> {
    let mut body = Vec::new();
    push_u16(&mut body, pool.module(&module.name));
    push_u16(&mut body, module.flags);
    push_u16(&mut body, 0);
    push_u16(&mut body, module.requires.len() as u16);
    for (name, flags) in &module.requires {
        push_u16(&mut body, pool.module(name));
        push_u16(&mut body, *flags);
        push_u16(&mut body, 0);
    }
    for directives in [&module.exports, &module.opens] {
        push_u16(&mut body, directives.len() as u16);
        for directive in directives {
            push_u16(&mut body, pool.package(&directive.package));
            push_u16(&mut body, directive.flags);
            push_u16(&mut body, directive.targets.len() as u16);
            for target in &directive.targets {
                push_u16(&mut body, pool.module(target));
            }
        }
    }
    push_u16(&mut body, module.uses.len() as u16);
    for service in &module.uses {
        push_u16(&mut body, pool.class(service));
    }
    push_u16(&mut body, module.provides.len() as u16);
    for (service, providers) in &module.provides {
        push_u16(&mut body, pool.class(service));
        push_u16(&mut body, providers.len() as u16);
        for provider in providers {
            push_u16(&mut body, pool.class(provider));
        }
    }
    body
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}
