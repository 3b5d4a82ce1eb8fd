//! Decodes the `Module` attribute of `module-info.class` files.
//!
//! Only the parts of the class file needed to reach the attribute are read;
//! fields, methods and other attributes are skipped by length.

use crate::error::{Error, Result};
use crate::frontend::module::{ModuleDescriptor, PackageDirective};

const MAGIC: u32 = 0xCAFE_BABE;
const ACC_MODULE: u16 = 0x8000;
const MODULE_ATTRIBUTE: &str = "Module";

const TAG_UTF8: u8 = 1;
const TAG_CLASS: u8 = 7;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

/// Parses a `module-info.class` file into its raw descriptor.
pub fn decode_module_info(data: &[u8], origin: &str) -> Result<ModuleDescriptor> {
    let mut reader = ClassReader::new(data, origin);
    if reader.read_u32()? != MAGIC {
        return Err(Error::decode(origin, "not a class file"));
    }
    // minor_version, major_version
    reader.skip(4)?;
    let pool = ConstantPool::read(&mut reader)?;

    let access_flags = reader.read_u16()?;
    if access_flags & ACC_MODULE == 0 {
        return Err(Error::decode(origin, "class file is not a module descriptor"));
    }
    // this_class, super_class
    reader.skip(4)?;
    let interfaces = reader.read_u16()? as usize;
    reader.skip(interfaces * 2)?;
    // fields, then methods
    for _ in 0..2 {
        let members = reader.read_u16()?;
        for _ in 0..members {
            reader.skip(6)?;
            skip_attributes(&mut reader)?;
        }
    }

    let attributes = reader.read_u16()?;
    for _ in 0..attributes {
        let name = pool.utf8(reader.read_u16()?)?;
        let length = reader.read_u32()? as usize;
        let body = reader.read_bytes(length)?;
        if name == MODULE_ATTRIBUTE {
            return read_module(&mut ClassReader::new(body, origin), &pool);
        }
    }
    Err(Error::decode(origin, "missing Module attribute"))
}

fn skip_attributes(reader: &mut ClassReader<'_>) -> Result<()> {
    let count = reader.read_u16()?;
    for _ in 0..count {
        reader.skip(2)?;
        let length = reader.read_u32()? as usize;
        reader.skip(length)?;
    }
    Ok(())
}

fn read_module(reader: &mut ClassReader<'_>, pool: &ConstantPool) -> Result<ModuleDescriptor> {
    let name = pool.named(reader.read_u16()?, TAG_MODULE)?;
    let flags = reader.read_u16()?;
    // module_version_index
    reader.skip(2)?;
    let mut descriptor = ModuleDescriptor::new(name).with_flags(flags);

    let requires = reader.read_u16()?;
    for _ in 0..requires {
        let module = pool.named(reader.read_u16()?, TAG_MODULE)?;
        let flags = reader.read_u16()?;
        reader.skip(2)?;
        descriptor.requires.push((module.to_string(), flags));
    }

    descriptor.exports = read_package_directives(reader, pool)?;
    descriptor.opens = read_package_directives(reader, pool)?;

    let uses = reader.read_u16()?;
    for _ in 0..uses {
        descriptor
            .uses
            .push(pool.named(reader.read_u16()?, TAG_CLASS)?.to_string());
    }

    let provides = reader.read_u16()?;
    for _ in 0..provides {
        let service = pool.named(reader.read_u16()?, TAG_CLASS)?.to_string();
        let count = reader.read_u16()?;
        let mut providers = Vec::with_capacity(count as usize);
        for _ in 0..count {
            providers.push(pool.named(reader.read_u16()?, TAG_CLASS)?.to_string());
        }
        descriptor.provides.push((service, providers));
    }
    Ok(descriptor)
}

fn read_package_directives(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<PackageDirective>> {
    let count = reader.read_u16()?;
    let mut directives = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let package = pool.named(reader.read_u16()?, TAG_PACKAGE)?.to_string();
        let flags = reader.read_u16()?;
        let target_count = reader.read_u16()?;
        let mut targets = Vec::with_capacity(target_count as usize);
        for _ in 0..target_count {
            targets.push(pool.named(reader.read_u16()?, TAG_MODULE)?.to_string());
        }
        directives.push(PackageDirective {
            package,
            flags,
            targets,
        });
    }
    Ok(directives)
}

enum PoolEntry {
    Utf8(String),
    /// `Class`, `Module` or `Package` constant pointing at its name.
    Named { tag: u8, name_index: u16 },
    Other,
}

struct ConstantPool<'a> {
    entries: Vec<PoolEntry>,
    origin: &'a str,
}

impl<'a> ConstantPool<'a> {
    fn read(reader: &mut ClassReader<'a>) -> Result<Self> {
        let count = reader.read_u16()? as usize;
        // Index 0 is unused.
        let mut entries = vec![PoolEntry::Other];
        while entries.len() < count {
            let tag = reader.read_u8()?;
            match tag {
                TAG_UTF8 => {
                    let length = reader.read_u16()? as usize;
                    let bytes = reader.read_bytes(length)?;
                    entries.push(PoolEntry::Utf8(String::from_utf8_lossy(bytes).into_owned()));
                }
                TAG_CLASS | TAG_MODULE | TAG_PACKAGE => {
                    let name_index = reader.read_u16()?;
                    entries.push(PoolEntry::Named { tag, name_index });
                }
                8 | 16 => {
                    reader.skip(2)?;
                    entries.push(PoolEntry::Other);
                }
                15 => {
                    reader.skip(3)?;
                    entries.push(PoolEntry::Other);
                }
                3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.skip(4)?;
                    entries.push(PoolEntry::Other);
                }
                // Long and double take two slots.
                5 | 6 => {
                    reader.skip(8)?;
                    entries.push(PoolEntry::Other);
                    entries.push(PoolEntry::Other);
                }
                _ => {
                    return Err(Error::decode(
                        reader.origin,
                        format!("unknown constant pool tag {tag}"),
                    ));
                }
            }
        }
        Ok(Self {
            entries,
            origin: reader.origin,
        })
    }

    fn utf8(&self, index: u16) -> Result<&str> {
        match self.entries.get(index as usize) {
            Some(PoolEntry::Utf8(value)) => Ok(value),
            _ => Err(Error::decode(
                self.origin,
                format!("expected UTF8 constant at index {index}"),
            )),
        }
    }

    fn named(&self, index: u16, expected: u8) -> Result<&str> {
        match self.entries.get(index as usize) {
            Some(PoolEntry::Named { tag, name_index }) if *tag == expected => {
                self.utf8(*name_index)
            }
            _ => Err(Error::decode(
                self.origin,
                format!("expected constant with tag {expected} at index {index}"),
            )),
        }
    }
}

/// Big-endian cursor over class-file bytes.
struct ClassReader<'a> {
    buf: &'a [u8],
    pos: usize,
    origin: &'a str,
}

impl<'a> ClassReader<'a> {
    fn new(buf: &'a [u8], origin: &'a str) -> Self {
        Self {
            buf,
            pos: 0,
            origin,
        }
    }

    fn require(&self, n: usize) -> Result<()> {
        match self.pos.checked_add(n) {
            Some(end) if end <= self.buf.len() => Ok(()),
            _ => Err(Error::decode(
                self.origin,
                format!(
                    "truncated class file: need {n} bytes at {}, have {}",
                    self.pos,
                    self.buf.len()
                ),
            )),
        }
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.require(n)?;
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
