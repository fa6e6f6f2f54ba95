//! raster::metadata
//!
//! Free-form multi-domain key/value metadata.
//!
//! Bands carry arbitrary name/value metadata partitioned into named
//! domains (the default domain has the empty name). Document order is
//! preserved within a domain. Serialized as one `Metadata` element per
//! non-empty domain with `MDI` item children.

use crate::xml::XmlElement;

/// Serialized tag of a metadata subtree.
pub const METADATA_TAG: &str = "Metadata";

/// Multi-domain key/value metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataDomains {
    domains: Vec<(String, Vec<(String, String)>)>,
}

impl MetadataDomains {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no domain holds any item.
    pub fn is_empty(&self) -> bool {
        self.domains.iter().all(|(_, items)| items.is_empty())
    }

    /// Names of the domains present, in insertion order.
    pub fn domain_names(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(|(name, _)| name.as_str())
    }

    /// Items of a domain in document order. Missing domains are empty.
    pub fn items(&self, domain: &str) -> &[(String, String)] {
        self.find(domain).map(|(_, items)| items.as_slice()).unwrap_or(&[])
    }

    /// Value of `key` in `domain` (key lookup is case-insensitive).
    pub fn item(&self, domain: &str, key: &str) -> Option<&str> {
        self.items(domain)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Set one item, replacing an existing key in place.
    pub fn set_item(&mut self, domain: &str, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let items = self.domain_mut(domain);
        match items.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some((_, v)) => *v = value,
            None => items.push((key, value)),
        }
    }

    /// Replace a domain wholesale. An empty item list clears the domain.
    pub fn set_domain(&mut self, domain: &str, items: Vec<(String, String)>) {
        if items.is_empty() {
            self.domains.retain(|(name, _)| !name.eq_ignore_ascii_case(domain));
            return;
        }
        *self.domain_mut(domain) = items;
    }

    fn find(&self, domain: &str) -> Option<&(String, Vec<(String, String)>)> {
        self.domains.iter().find(|(name, _)| name.eq_ignore_ascii_case(domain))
    }

    fn domain_mut(&mut self, domain: &str) -> &mut Vec<(String, String)> {
        let pos = match self
            .domains
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(domain))
        {
            Some(pos) => pos,
            None => {
                self.domains.push((domain.to_string(), Vec::new()));
                self.domains.len() - 1
            }
        };
        &mut self.domains[pos].1
    }

    /// Serialize each non-empty domain as a [`METADATA_TAG`] element. The
    /// default domain is written without a `domain` attribute.
    pub fn to_xml(&self) -> Vec<XmlElement> {
        let mut nodes = Vec::new();
        for (name, items) in &self.domains {
            if items.is_empty() {
                continue;
            }
            let mut node = XmlElement::new(METADATA_TAG);
            if !name.is_empty() {
                node.set_attr("domain", name.clone());
            }
            for (key, value) in items {
                let mut item = XmlElement::with_text("MDI", value.clone());
                item.set_attr("key", key.clone());
                node.add_child(item);
            }
            nodes.push(node);
        }
        nodes
    }

    /// Merge every [`METADATA_TAG`] child of `parent` into the store.
    /// Existing keys are replaced in place; other items are untouched.
    pub fn merge_from_xml(&mut self, parent: &XmlElement) {
        for node in parent.elements().filter(|el| el.tag_is(METADATA_TAG)) {
            let domain = node.attr("domain").unwrap_or("").to_string();
            for item in node.elements().filter(|el| el.tag_is("MDI")) {
                if let Some(key) = item.attr("key") {
                    let key = key.to_string();
                    self.set_item(&domain, key, item.text().unwrap_or("").to_string());
                }
            }
        }
    }
}
