//! Font registry: multi-key font lookup and family grouping.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::descriptor::{canonical_name, FontDescriptor, FontStyle, FontType};

/// Kind of a registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    /// Full font name (e.g., `Arial Bold`).
    Name,
    /// PostScript name (e.g., `Arial-BoldMT`).
    Postscript,
    /// Canonical `Family,Style` name.
    Canonical,
}

impl KeyKind {
    fn suffix(self) -> &'static str {
        match self {
            Self::Name => "",
            Self::Postscript => "-postscript",
            Self::Canonical => "-canonical",
        }
    }
}

fn registry_key(font_type: FontType, kind: KeyKind, name: &str) -> String {
    format!("[{}{}]{name}", font_type.as_str(), kind.suffix())
}

fn family_key(font_type: FontType, family: &str) -> String {
    format!("[{}]{family}", font_type.as_str())
}

/// Parameters of a font lookup. Unset fields are simply not probed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontQuery<'a> {
    /// Full font name.
    pub name: Option<&'a str>,
    /// PostScript name.
    pub postscript_name: Option<&'a str>,
    /// Family name.
    pub family: Option<&'a str>,
    /// Style within the family.
    pub style: FontStyle,
    /// Required font type; `None` matches any type.
    pub font_type: Option<FontType>,
}

impl FontQuery<'_> {
    fn canonical(&self) -> Option<String> {
        let family = self.family?;
        Some(canonical_name(family, self.style))
    }
}

/// Produces registry keys for a [`FontQuery`] in decreasing order of
/// specificity: full name, PostScript name, canonical name built from the
/// family and style, and finally a canonical name derived by splitting the full
/// name at the first `-` (so `Courier-Bold` probes `Courier,Bold`).
#[derive(Debug)]
pub struct NameResolver<'a> {
    query: &'a FontQuery<'a>,
}

impl<'a> NameResolver<'a> {
    /// Creates a resolver for the query.
    pub fn new(query: &'a FontQuery<'a>) -> Self {
        Self { query }
    }

    /// Gets the candidate registry keys in probe order.
    pub fn keys(&self) -> Vec<String> {
        let font_type = self.query.font_type.unwrap_or(FontType::Unknown);
        let mut keys = vec![];
        if let Some(name) = self.query.name {
            keys.push(registry_key(font_type, KeyKind::Name, name));
        }
        if let Some(postscript) = self.query.postscript_name {
            keys.push(registry_key(font_type, KeyKind::Postscript, postscript));
        }
        if let Some(canonical) = self.query.canonical() {
            keys.push(registry_key(font_type, KeyKind::Canonical, &canonical));
        }
        if let Some(name) = self.query.name {
            if let Some((family, style)) = name.split_once('-') {
                let canonical = canonical_name(family, FontStyle::from_name(Some(style)));
                keys.push(registry_key(font_type, KeyKind::Canonical, &canonical));
            }
        }
        keys
    }
}

/// Fonts registered under a single key. Multiple fonts can collide on a key
/// (e.g., same full name in different families); collisions are disambiguated
/// at lookup time.
#[derive(Debug, Clone)]
enum RegistryEntry {
    Single(Arc<FontDescriptor>),
    Multiple(Vec<Arc<FontDescriptor>>),
}

impl RegistryEntry {
    fn push(&mut self, descriptor: Arc<FontDescriptor>) {
        match self {
            Self::Single(existing) => {
                *self = Self::Multiple(vec![existing.clone(), descriptor]);
            }
            Self::Multiple(descriptors) => descriptors.push(descriptor),
        }
    }

    fn resolve(&self, query: &FontQuery<'_>) -> Option<&Arc<FontDescriptor>> {
        let candidates: Vec<_> = match self {
            Self::Single(descriptor) => vec![descriptor],
            Self::Multiple(descriptors) => descriptors.iter().collect(),
        };
        let mut compatible = candidates
            .into_iter()
            .filter(|descriptor| is_type_compatible(query.font_type, descriptor.font_type()));

        let first = compatible.next()?;
        let rest: Vec<_> = compatible.collect();
        if rest.is_empty() {
            return Some(first);
        }
        let all = || [first].into_iter().chain(rest.iter().copied());

        // Candidates are tried in registration order: first an exact canonical
        // match, then a candidate whose family name occurs in the queried
        // family. An ambiguous collision stays unresolved.
        if let Some(canonical) = query.canonical() {
            if let Some(found) =
                all().find(|descriptor| descriptor.canonical_name().as_deref() == Some(&*canonical))
            {
                return Some(found);
            }
        }
        if let Some(query_family) = query.family {
            if let Some(found) = all().find(|descriptor| {
                descriptor
                    .family_name()
                    .is_some_and(|family| query_family.contains(family))
            }) {
                return Some(found);
            }
        }
        None
    }
}

fn is_type_compatible(queried: Option<FontType>, actual: FontType) -> bool {
    match queried {
        None | Some(FontType::Unknown) => true,
        Some(queried) => actual == FontType::Unknown || actual == queried,
    }
}

/// Group of fonts sharing a family name, slotted by style.
#[derive(Debug, Clone)]
pub struct FontFamily {
    name: String,
    font_type: FontType,
    slots: [Option<Arc<FontDescriptor>>; 4],
}

impl FontFamily {
    fn new(name: &str, font_type: FontType) -> Self {
        Self {
            name: name.to_owned(),
            font_type,
            slots: [None, None, None, None],
        }
    }

    /// Gets the family name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the type of the most recently registered family member.
    pub fn font_type(&self) -> FontType {
        self.font_type
    }

    /// Gets the family member with the given style.
    pub fn font(&self, style: FontStyle) -> Option<&Arc<FontDescriptor>> {
        self.slots[style.index()].as_ref()
    }

    /// Iterates over the registered family members.
    pub fn fonts(&self) -> impl Iterator<Item = &Arc<FontDescriptor>> + '_ {
        self.slots.iter().filter_map(Option::as_ref)
    }
}

/// In-memory registry of parsed fonts.
///
/// Each font is registered under its full, PostScript and canonical names, both
/// for its actual type and for the `Any` pseudo-type, so that lookups may or
/// may not constrain the type. Fonts are additionally grouped into
/// [`FontFamily`]s by family name.
#[derive(Debug, Clone, Default)]
pub struct FontRegistry {
    fonts: HashMap<String, RegistryEntry>,
    families: HashMap<String, FontFamily>,
}

impl FontRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a font, returning the shared descriptor.
    pub fn register(&mut self, descriptor: FontDescriptor) -> Arc<FontDescriptor> {
        let descriptor = Arc::new(descriptor);
        let font_type = descriptor.font_type();
        let types: &[FontType] = if font_type == FontType::Unknown {
            &[FontType::Unknown]
        } else {
            &[font_type, FontType::Unknown]
        };

        for &ty in types {
            if let Some(name) = descriptor.font_name() {
                self.insert_font(registry_key(ty, KeyKind::Name, name), &descriptor);
            }
            if let Some(postscript) = descriptor.postscript_name() {
                self.insert_font(
                    registry_key(ty, KeyKind::Postscript, postscript),
                    &descriptor,
                );
            }
            if let Some(canonical) = descriptor.canonical_name() {
                self.insert_font(registry_key(ty, KeyKind::Canonical, &canonical), &descriptor);
            }
            if let Some(family) = descriptor.family_name() {
                self.families
                    .entry(family_key(ty, family))
                    .and_modify(|entry| entry.font_type = font_type)
                    .or_insert_with(|| FontFamily::new(family, font_type))
                    .slots[descriptor.style().index()] = Some(descriptor.clone());
            }
        }

        log::debug!(
            "registered font: name={:?}, postscript={:?}, family={:?}, style={}, type={}",
            descriptor.font_name(),
            descriptor.postscript_name(),
            descriptor.family_name(),
            descriptor.style(),
            font_type
        );
        descriptor
    }

    fn insert_font(&mut self, key: String, descriptor: &Arc<FontDescriptor>) {
        self.fonts
            .entry(key)
            .and_modify(|entry| entry.push(descriptor.clone()))
            .or_insert_with(|| RegistryEntry::Single(descriptor.clone()));
    }

    /// Looks up a font, probing the query names in [`NameResolver`] order.
    pub fn lookup(&self, query: &FontQuery<'_>) -> Option<Arc<FontDescriptor>> {
        for key in NameResolver::new(query).keys() {
            if let Some(entry) = self.fonts.get(&key) {
                if let Some(found) = entry.resolve(query) {
                    return Some(found.clone());
                }
            }
        }
        None
    }

    /// Gets a font family by name. `font_type == None` matches any type.
    pub fn family(&self, font_type: Option<FontType>, name: &str) -> Option<&FontFamily> {
        let font_type = font_type.unwrap_or(FontType::Unknown);
        self.families.get(&family_key(font_type, name))
    }

    /// Gets the number of distinct registry keys.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Checks whether no fonts are registered.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

impl fmt::Display for FontRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "FontRegistry ({} keys, {} families)",
            self.fonts.len(),
            self.families.len()
        )
    }
}
