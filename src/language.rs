use crate::signature::IdentifierFactory;

/// Words of the textual IR syntax and Java keywords. Name segments spelled
/// like one of these are quoted when printed.
pub const RESERVED_NAMES: &[&str] = &[
    "newarray",
    "newmultiarray",
    "nop",
    "ret",
    "specialinvoke",
    "staticinvoke",
    "tableswitch",
    "virtualinvoke",
    "null_type",
    "unknown",
    "cmp",
    "cmpg",
    "cmpl",
    "entermonitor",
    "exitmonitor",
    "interfaceinvoke",
    "lengthof",
    "lookupswitch",
    "neg",
    "if",
    "abstract",
    "annotation",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "enum",
    "final",
    "native",
    "public",
    "protected",
    "private",
    "static",
    "synchronized",
    "transient",
    "volatile",
    "interface",
    "void",
    "short",
    "int",
    "long",
    "float",
    "double",
    "extends",
    "implements",
    "breakpoint",
    "default",
    "goto",
    "instanceof",
    "new",
    "return",
    "throw",
    "throws",
    "null",
    "from",
    "to",
    "with",
    "cls",
    "dynamicinvoke",
    "strictfp",
];

const SPLIT_CHAR: char = '.';

pub fn is_reserved_name(segment: &str) -> bool {
    RESERVED_NAMES.contains(&segment)
}

/// Quotes each dotted segment of `name` that is a reserved word or starts
/// with `-`. Separators are kept.
pub fn quoted_name_of(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 16);
    for (index, part) in name.split(SPLIT_CHAR).enumerate() {
        if index > 0 {
            quoted.push(SPLIT_CHAR);
        }
        if part.starts_with('-') || is_reserved_name(part) {
            quoted.push('\'');
            quoted.push_str(part);
            quoted.push('\'');
        } else {
            quoted.push_str(part);
        }
    }
    quoted
}

/// Source language of the analyzed program; versions after 8 use modules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JavaLanguage {
    version: u32,
}

impl JavaLanguage {
    pub fn new(version: u32) -> Self {
        Self { version }
    }

    pub fn name(&self) -> &'static str {
        "Java"
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn use_java_modules(&self) -> bool {
        self.version > 8
    }

    pub fn identifier_factory(&self) -> IdentifierFactory {
        IdentifierFactory
    }
}

impl Default for JavaLanguage {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_every_reserved_segment() {
        assert_eq!("'class'.'to'.'new'", quoted_name_of("class.to.new"));
    }

    #[test]
    fn keeps_plain_names() {
        assert_eq!("plain.name", quoted_name_of("plain.name"));
        assert_eq!("java.lang.Object", quoted_name_of("java.lang.Object"));
    }

    #[test]
    fn quotes_segments_starting_with_dash() {
        assert_eq!("a.'-b'.c", quoted_name_of("a.-b.c"));
    }

    #[test]
    fn keeps_empty_segments() {
        assert_eq!("a..'int'", quoted_name_of("a..int"));
    }

    #[test]
    fn modules_start_after_java_8() {
        assert!(!JavaLanguage::new(8).use_java_modules());
        assert!(JavaLanguage::new(9).use_java_modules());
        assert_eq!("Java", JavaLanguage::default().name());
    }
}
