use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Declaration modifiers decoded from access flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Public,
    Private,
    Protected,
    Static,
    Final,
    Synchronized,
    Volatile,
    Transient,
    Native,
    Interface,
    Abstract,
    Strict,
    Synthetic,
    Annotation,
    Enum,
    Module,
    Open,
    Transitive,
    Mandated,
    Bridge,
    Varargs,
}

impl Modifier {
    pub fn keyword(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Private => "private",
            Modifier::Protected => "protected",
            Modifier::Static => "static",
            Modifier::Final => "final",
            Modifier::Synchronized => "synchronized",
            Modifier::Volatile => "volatile",
            Modifier::Transient => "transient",
            Modifier::Native => "native",
            Modifier::Interface => "interface",
            Modifier::Abstract => "abstract",
            Modifier::Strict => "strictfp",
            Modifier::Synthetic => "synthetic",
            Modifier::Annotation => "annotation",
            Modifier::Enum => "enum",
            Modifier::Module => "module",
            Modifier::Open => "open",
            Modifier::Transitive => "transitive",
            Modifier::Mandated => "mandated",
            Modifier::Bridge => "bridge",
            Modifier::Varargs => "varargs",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

pub type Modifiers = BTreeSet<Modifier>;

// Module attribute flags share bit positions across directive kinds, so each
// kind gets its own table. Class, field and method flags are decoded in
// `frontend::bytecode`.
const MODULE_FLAGS: &[(u16, Modifier)] = &[
    (0x0020, Modifier::Open),
    (0x1000, Modifier::Synthetic),
    (0x8000, Modifier::Mandated),
];

const REQUIRES_FLAGS: &[(u16, Modifier)] = &[
    (0x0020, Modifier::Transitive),
    (0x0040, Modifier::Static),
    (0x1000, Modifier::Synthetic),
    (0x8000, Modifier::Mandated),
];

const PACKAGE_REFERENCE_FLAGS: &[(u16, Modifier)] = &[
    (0x1000, Modifier::Synthetic),
    (0x8000, Modifier::Mandated),
];

fn decode(flags: u16, table: &[(u16, Modifier)]) -> Modifiers {
    table
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, modifier)| *modifier)
        .collect()
}

pub fn module_modifiers(flags: u16) -> Modifiers {
    decode(flags, MODULE_FLAGS)
}

pub fn requires_modifiers(flags: u16) -> Modifiers {
    decode(flags, REQUIRES_FLAGS)
}

/// Modifiers of `exports` and `opens` directives.
pub fn package_reference_modifiers(flags: u16) -> Modifiers {
    decode(flags, PACKAGE_REFERENCE_FLAGS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_bits_decode_per_directive_kind() {
        assert!(requires_modifiers(0x0020).contains(&Modifier::Transitive));
        assert!(module_modifiers(0x0020).contains(&Modifier::Open));
        assert!(package_reference_modifiers(0x0020).is_empty());
    }

    #[test]
    fn decodes_mandated_static_requires() {
        let modifiers = requires_modifiers(0x8040);

        assert_eq!(
            vec![Modifier::Static, Modifier::Mandated],
            modifiers.into_iter().collect::<Vec<_>>()
        );
    }
}
