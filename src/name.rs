use core::{cmp::Ordering, fmt, num::NonZeroU16, str::FromStr};

use alloc::{boxed::Box, string::String, vec::Vec};

use crate::error::CsError;

// Names are ordered canonically, component by component, with a proper
//  prefix sorting before every name it is a prefix of. All names under a
//  common prefix therefore occupy one contiguous range.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    pub fn from_components<I>(components: I) -> Self
    where
        I: IntoIterator<Item = NameComponent>,
    {
        Self {
            components: components.into_iter().collect(),
        }
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> impl DoubleEndedIterator<Item = &NameComponent> + '_ {
        self.components.iter()
    }

    pub fn last_component(&self) -> Option<&NameComponent> {
        self.components.last()
    }

    pub fn adding_component(&self, component: NameComponent) -> Self {
        let mut components = self.components.clone();
        components.push(component);
        Self { components }
    }

    pub fn dropping_last_component(&self) -> Option<Self> {
        let (_, rest) = self.components.split_last()?;
        Some(Self {
            components: rest.to_vec(),
        })
    }

    pub fn prefix(&self, component_count: usize) -> Self {
        let count = component_count.min(self.components.len());
        Self {
            components: self.components[..count].to_vec(),
        }
    }

    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a == b)
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.components.iter().zip(other.components.iter()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        self.components.len().cmp(&other.components.len())
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Name {
    type Err = CsError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let uri = uri.strip_prefix("ndn:").unwrap_or(uri);
        let path = uri
            .strip_prefix('/')
            .ok_or_else(|| CsError::InvalidName(String::from(uri)))?;

        let mut components = Vec::new();
        for segment in path.split('/') {
            if segment.is_empty() {
                // Empty segments come from the root name "/" and trailing slashes
                continue;
            }
            let component = segment
                .parse::<NameComponent>()
                .map_err(|_| CsError::InvalidName(String::from(uri)))?;
            components.push(component);
        }
        Ok(Self { components })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for component in self.components.iter() {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NameComponent {
    pub typ: NonZeroU16,
    pub bytes: Box<[u8]>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NameComponentType {
    Generic,
    ImplicitSha256Digest,
    ParameterSha256Digest,
    Other(NonZeroU16),
}

const NAME_COMPONENT_TYPE_GENERIC: u16 = 8;
const NAME_COMPONENT_TYPE_IMPLICIT_SHA256: u16 = 1;
const NAME_COMPONENT_TYPE_PARAMETER_SHA256: u16 = 2;

impl From<NonZeroU16> for NameComponentType {
    fn from(value: NonZeroU16) -> Self {
        match value.get() {
            NAME_COMPONENT_TYPE_GENERIC => NameComponentType::Generic,
            NAME_COMPONENT_TYPE_IMPLICIT_SHA256 => NameComponentType::ImplicitSha256Digest,
            NAME_COMPONENT_TYPE_PARAMETER_SHA256 => NameComponentType::ParameterSha256Digest,
            _ => NameComponentType::Other(value),
        }
    }
}

impl From<NameComponentType> for NonZeroU16 {
    fn from(value: NameComponentType) -> Self {
        let raw = match value {
            NameComponentType::Generic => NAME_COMPONENT_TYPE_GENERIC,
            NameComponentType::ImplicitSha256Digest => NAME_COMPONENT_TYPE_IMPLICIT_SHA256,
            NameComponentType::ParameterSha256Digest => NAME_COMPONENT_TYPE_PARAMETER_SHA256,
            NameComponentType::Other(v) => return v,
        };
        // All the named constants are non-zero
        NonZeroU16::new(raw).unwrap_or(NonZeroU16::MIN)
    }
}

impl NameComponent {
    pub fn new(typ: NameComponentType, bytes: &[u8]) -> Self {
        Self {
            typ: typ.into(),
            bytes: Box::from(bytes),
        }
    }

    pub fn generic(bytes: &[u8]) -> Self {
        Self::new(NameComponentType::Generic, bytes)
    }

    pub fn implicit_digest(digest: &[u8; 32]) -> Self {
        Self::new(NameComponentType::ImplicitSha256Digest, digest)
    }

    pub fn component_type(&self) -> NameComponentType {
        self.typ.into()
    }

    pub fn is_implicit_digest(&self) -> bool {
        self.typ.get() == NAME_COMPONENT_TYPE_IMPLICIT_SHA256 && self.bytes.len() == 32
    }
}

// Canonical order: type first, then length, then the bytes themselves
impl Ord for NameComponent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.typ
            .cmp(&other.typ)
            .then_with(|| self.bytes.len().cmp(&other.bytes.len()))
            .then_with(|| self.bytes.cmp(&other.bytes))
    }
}

impl PartialOrd for NameComponent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for NameComponent {
    type Err = CsError;

    fn from_str(segment: &str) -> Result<Self, Self::Err> {
        let invalid = || CsError::InvalidName(String::from(segment));

        if let Some(hex) = segment.strip_prefix("sha256digest=") {
            let bytes = decode_hex(hex).ok_or_else(invalid)?;
            if bytes.len() != 32 {
                return Err(invalid());
            }
            return Ok(Self::new(NameComponentType::ImplicitSha256Digest, &bytes));
        }

        let (typ, value) = match segment.split_once('=') {
            Some((typ, value)) if !typ.is_empty() && typ.bytes().all(|b| b.is_ascii_digit()) => {
                let typ = typ
                    .parse::<u16>()
                    .ok()
                    .and_then(NonZeroU16::new)
                    .ok_or_else(invalid)?;
                (typ, value)
            }
            _ => (NameComponentType::Generic.into(), segment),
        };

        // A value of only periods has three extra ones, so "..." is empty
        let bytes = if value.bytes().all(|b| b == b'.') {
            let periods = value.len().checked_sub(3).ok_or_else(invalid)?;
            alloc::vec![b'.'; periods]
        } else {
            decode_percent(value).ok_or_else(invalid)?
        };
        Ok(Self {
            typ,
            bytes: bytes.into_boxed_slice(),
        })
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.component_type() {
            NameComponentType::ImplicitSha256Digest => {
                f.write_str("sha256digest=")?;
                for b in self.bytes.iter() {
                    write!(f, "{:02x}", b)?;
                }
                return Ok(());
            }
            NameComponentType::Generic => {}
            _ => write!(f, "{}=", self.typ)?,
        }
        if self.bytes.iter().all(|&b| b == b'.') {
            f.write_str("...")?;
        }
        for &b in self.bytes.iter() {
            if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "%{:02X}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.as_bytes();
    if hex.len() % 2 != 0 {
        return None;
    }
    hex.chunks(2)
        .map(|pair| Some(hex_value(pair[0])? << 4 | hex_value(pair[1])?))
        .collect()
}

fn decode_percent(value: &str) -> Option<Vec<u8>> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = hex_value(*bytes.get(i + 1)?)?;
            let lo = hex_value(*bytes.get(i + 2)?)?;
            out.push(hi << 4 | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use alloc::{format, vec::Vec};
    use core::num::NonZeroU16;

    use super::{Name, NameComponent, NameComponentType};

    fn name(uri: &str) -> Name {
        uri.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let n = name("/a/b%20c/32=x");
        assert_eq!(n.component_count(), 3);
        assert_eq!(n.components().nth(1).unwrap().bytes.as_ref(), b"b c");
        assert_eq!(
            n.last_component().unwrap().component_type(),
            NameComponentType::Other(NonZeroU16::new(32).unwrap())
        );
        assert_eq!(format!("{}", n), "/a/b%20c/32=x");
        assert_eq!(format!("{}", name("/")), "/");
        assert!(name("ndn:/a").component_count() == 1);

        assert!("a/b".parse::<Name>().is_err());
        assert!("/a/%zz".parse::<Name>().is_err());
        assert!("/sha256digest=00".parse::<Name>().is_err());
    }

    #[test]
    fn test_period_only_components() {
        let n = Name::from_components([
            NameComponent::generic(b"a"),
            NameComponent::generic(b""),
            NameComponent::generic(b".."),
            NameComponent::new(NameComponentType::Other(NonZeroU16::new(32).unwrap()), b""),
        ]);
        assert_eq!(format!("{}", n), "/a/.../...../32=...");
        assert_eq!(name("/a/.../...../32=..."), n);

        assert_eq!(name("/...").last_component().unwrap().bytes.len(), 0);
        assert!("/a/./b".parse::<Name>().is_err());
        assert!("/a/..".parse::<Name>().is_err());
        assert_eq!(format!("{}", name("/a.b")), "/a.b");
    }

    #[test]
    fn test_digest_component() {
        let digest = [0xab; 32];
        let n = name("/a").adding_component(NameComponent::implicit_digest(&digest));
        assert!(n.last_component().unwrap().is_implicit_digest());
        let reparsed: Name = format!("{}", n).parse().unwrap();
        assert_eq!(reparsed, n);
    }

    #[test]
    fn test_canonical_order() {
        // Shorter components sort before longer ones regardless of bytes
        assert!(name("/z") < name("/aa"));
        // Prefixes sort before their extensions
        assert!(name("/a") < name("/a/b"));
        assert!(name("/a/b") < name("/a/c"));
        assert!(name("/a/zz") < name("/b"));
        // Implicit digests (type 1) sort before generic components (type 8)
        let digest = name("/a").adding_component(NameComponent::implicit_digest(&[0xff; 32]));
        assert!(digest < name("/a/b"));

        let mut names: Vec<Name> = ["/b", "/a/b", "/a", "/", "/a/b/c"]
            .iter()
            .map(|u| name(u))
            .collect();
        names.sort();
        let printed: Vec<_> = names.iter().map(|n| format!("{}", n)).collect();
        assert_eq!(printed, ["/", "/a", "/a/b", "/a/b/c", "/b"]);
    }

    #[test]
    fn test_prefixes() {
        assert!(name("/").is_prefix_of(&name("/a")));
        assert!(name("/a").is_prefix_of(&name("/a/b")));
        assert!(name("/a/b").is_prefix_of(&name("/a/b")));
        assert!(!name("/a/b").is_prefix_of(&name("/a")));
        assert!(!name("/a/c").is_prefix_of(&name("/a/b/c")));

        assert_eq!(name("/a/b").dropping_last_component(), Some(name("/a")));
        assert_eq!(name("/").dropping_last_component(), None);
        assert_eq!(name("/a/b/c").prefix(2), name("/a/b"));
    }
}
