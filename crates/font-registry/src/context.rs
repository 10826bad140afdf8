//! Font context: registry plus alias handling and explicit font mappings.

use std::{collections::HashMap, fs, io, path::Path, sync::Arc};

use crate::{
    descriptor::FontDescriptor,
    registry::{FontQuery, FontRegistry},
};

/// Raw font resource produced by a [`FontSource`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum FontResource {
    /// Complete sfnt font file.
    TrueType(Vec<u8>),
    /// Adobe Font Metrics for a Type 1 font.
    Type1Metrics(Vec<u8>),
    /// Alias definition text (`name=alias` lines).
    AliasDefinitions(String),
}

/// Provider of font resources (e.g., a system font directory).
pub trait FontSource {
    /// Enumerates the available resources.
    ///
    /// # Errors
    ///
    /// May fail on I/O errors; the context logs the failure and continues
    /// without the source's fonts.
    fn resources(&self) -> io::Result<Vec<FontResource>>;
}

/// [`FontRegistry`] wrapper adding name aliases, explicit font mappings, and
/// one-shot registration of system / user font sources.
#[derive(Debug, Default)]
pub struct FontContext {
    registry: FontRegistry,
    aliases: HashMap<String, String>,
    font_map: HashMap<String, Arc<FontDescriptor>>,
    system_fonts_registered: bool,
    user_fonts_registered: bool,
}

impl FontContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the underlying registry.
    pub fn registry(&self) -> &FontRegistry {
        &self.registry
    }

    /// Registers a single font.
    pub fn register_font(&mut self, descriptor: FontDescriptor) -> Arc<FontDescriptor> {
        self.registry.register(descriptor)
    }

    /// Registers all fonts from the system font source. Repeated calls are
    /// no-ops. Returns the number of fonts registered.
    pub fn register_system_fonts(&mut self, source: &dyn FontSource) -> usize {
        if self.system_fonts_registered {
            return 0;
        }
        self.system_fonts_registered = true;
        self.register_source(source)
    }

    /// Registers all fonts from the user font source. Repeated calls are
    /// no-ops. Returns the number of fonts registered.
    pub fn register_user_fonts(&mut self, source: &dyn FontSource) -> usize {
        if self.user_fonts_registered {
            return 0;
        }
        self.user_fonts_registered = true;
        self.register_source(source)
    }

    fn register_source(&mut self, source: &dyn FontSource) -> usize {
        let resources = match source.resources() {
            Ok(resources) => resources,
            Err(err) => {
                log::warn!("failed enumerating font source: {err}");
                return 0;
            }
        };

        let mut registered = 0;
        for resource in resources {
            match resource {
                FontResource::TrueType(bytes) => match FontDescriptor::from_sfnt_bytes(bytes) {
                    Ok(descriptor) => {
                        self.registry.register(descriptor);
                        registered += 1;
                    }
                    Err(err) => log::warn!("skipping unparseable font: {err}"),
                },
                FontResource::Type1Metrics(bytes) => {
                    let parsed = std::str::from_utf8(&bytes)
                        .ok()
                        .map(FontDescriptor::from_afm);
                    match parsed {
                        Some(Ok(descriptor)) => {
                            self.registry.register(descriptor);
                            registered += 1;
                        }
                        Some(Err(err)) => log::warn!("skipping unparseable font metrics: {err}"),
                        None => log::warn!("skipping non-UTF-8 font metrics"),
                    }
                }
                FontResource::AliasDefinitions(text) => self.parse_alias_definitions(&text),
            }
        }
        registered
    }

    /// Parses `name=alias` definitions, one per line. Empty lines and `#`
    /// comments are ignored; malformed lines are skipped with a warning.
    pub fn parse_alias_definitions(&mut self, text: &str) {
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((name, alias)) = line.split_once('=') else {
                log::warn!("malformed alias definition: {line}");
                continue;
            };
            let (name, alias) = (name.trim(), alias.trim());
            if name.is_empty() || alias.is_empty() {
                log::warn!("malformed alias definition: {line}");
                continue;
            }
            self.aliases.insert(name.to_owned(), alias.to_owned());
        }
    }

    /// Loads alias definitions from a file.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors; the file contents are parsed leniently.
    pub fn load_alias_file(&mut self, path: impl AsRef<Path>) -> io::Result<()> {
        let text = fs::read_to_string(path)?;
        self.parse_alias_definitions(&text);
        Ok(())
    }

    /// Gets the alias target of a font name, if one is defined.
    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// Maps a name directly to a font, bypassing registry resolution.
    pub fn map_font(&mut self, name: &str, descriptor: Arc<FontDescriptor>) {
        self.font_map.insert(name.to_owned(), descriptor);
    }

    /// Looks up a font: first in the registry, then by re-querying under the
    /// name's alias, and finally in the explicit font map.
    pub fn lookup_font_or_map(&self, query: &FontQuery<'_>) -> Option<Arc<FontDescriptor>> {
        if let Some(found) = self.registry.lookup(query) {
            return Some(found);
        }
        if let Some(alias) = query.name.and_then(|name| self.alias(name)) {
            let aliased = FontQuery {
                name: Some(alias),
                ..*query
            };
            if let Some(found) = self.registry.lookup(&aliased) {
                return Some(found);
            }
        }
        query
            .name
            .and_then(|name| self.font_map.get(name))
            .cloned()
    }
}
