//! Transform pipeline.
//!
//! Plugins are registered in a fixed order. Consecutive plugins of the same
//! kind form one group, and a group is applied with a single walk over the
//! document: per-item plugins see every node top-down, reverse per-item
//! plugins see every node bottom-up, full plugins receive the whole
//! document. Activation flags live in the pipeline and persist between
//! sessions until reconfigured.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::constants::DEFAULT_FLOAT_PRECISION;
use crate::error::{Error, Result};
use crate::node::{XmlDocument, XmlNode};

/// How a plugin is applied to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    /// Called for each node, parents before children.
    PerItem,
    /// Called for each node, children before parents.
    PerItemReverse,
    /// Called once with the whole document.
    Full,
}

/// Parameters shared by every plugin during one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginParams {
    pub float_precision: u32,
}

impl Default for PluginParams {
    fn default() -> Self {
        PluginParams {
            float_precision: DEFAULT_FLOAT_PRECISION,
        }
    }
}

/// A single optimization pass.
pub trait Plugin: Send {
    /// Name used to enable or disable the plugin from settings.
    fn name(&self) -> &str;

    fn kind(&self) -> PluginKind;

    fn active_by_default(&self) -> bool {
        true
    }

    /// Per-item hook. Returning `false` removes the node from its parent.
    fn visit(&self, _node: &mut XmlNode, _params: &PluginParams) -> Result<bool> {
        Ok(true)
    }

    /// Whole-document hook for `PluginKind::Full`.
    fn transform(&self, _document: &mut XmlDocument, _params: &PluginParams) -> Result<()> {
        Ok(())
    }
}

struct Entry {
    plugin: Box<dyn Plugin>,
    active: bool,
}

/// Ordered plugin registry.
#[derive(Default)]
pub struct Pipeline {
    entries: Vec<Entry>,
    index: FxHashMap<String, usize>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin after all previously registered ones. A plugin
    /// registered under an existing name replaces it in place.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        let active = plugin.active_by_default();
        let entry = Entry { plugin, active };
        if let Some(&i) = self.index.get(entry.plugin.name()) {
            self.entries[i] = entry;
            return;
        }
        self.index
            .insert(entry.plugin.name().to_string(), self.entries.len());
        self.entries.push(entry);
    }

    /// Builder form of `register`.
    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.register(Box::new(plugin));
        self
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns whether the named plugin is active.
    pub fn is_active(&self, name: &str) -> Option<bool> {
        self.index.get(name).map(|&i| self.entries[i].active)
    }

    /// Names of the active plugins in application order.
    pub fn active_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.active)
            .map(|e| e.plugin.name())
            .collect()
    }

    /// Sets activation flags by plugin name. Plugins not named keep their
    /// current state. All names are checked before any flag changes.
    pub fn configure(&mut self, plugins: &BTreeMap<String, bool>) -> Result<()> {
        if let Some(unknown) = plugins.keys().find(|name| !self.index.contains_key(*name)) {
            return Err(Error::UnknownPlugin(unknown.clone()));
        }
        for (name, &active) in plugins {
            if let Some(&i) = self.index.get(name) {
                self.entries[i].active = active;
            }
        }
        Ok(())
    }

    /// Applies every active plugin to the document, group by group.
    pub fn apply(&self, document: &mut XmlDocument, params: &PluginParams) -> Result<()> {
        for group in self.entries.chunk_by(|a, b| a.plugin.kind() == b.plugin.kind()) {
            let active: Vec<&dyn Plugin> = group
                .iter()
                .filter(|e| e.active)
                .map(|e| e.plugin.as_ref())
                .collect();
            if active.is_empty() {
                continue;
            }
            let kind = active[0].kind();
            trace!(?kind, plugins = active.len(), "applying plugin group");
            match kind {
                PluginKind::PerItem => {
                    visit_items(document.children_mut(), &active, params, false)?
                }
                PluginKind::PerItemReverse => {
                    visit_items(document.children_mut(), &active, params, true)?
                }
                PluginKind::Full => {
                    for plugin in &active {
                        plugin.transform(document, params)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|e| (e.plugin.name(), e.active)))
            .finish()
    }
}

/// Walks `items`, dropping every node some plugin rejects. In forward order
/// a node's children are still walked after it has been rejected.
fn visit_items(
    items: &mut Vec<XmlNode>,
    plugins: &[&dyn Plugin],
    params: &PluginParams,
    reverse: bool,
) -> Result<()> {
    let mut kept = Vec::with_capacity(items.len());
    for mut item in items.drain(..) {
        if reverse {
            if let Some(element) = item.as_element_mut() {
                visit_items(element.children_mut(), plugins, params, reverse)?;
            }
        }

        let mut keep = true;
        for plugin in plugins {
            if !plugin.visit(&mut item, params)? {
                keep = false;
                break;
            }
        }

        if !reverse {
            if let Some(element) = item.as_element_mut() {
                visit_items(element.children_mut(), plugins, params, reverse)?;
            }
        }

        if keep {
            kept.push(item);
        }
    }
    *items = kept;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_plugins::*;
    use super::*;
    use crate::xml::{parse_str, print_to_string};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_per_item_removes_nodes() {
        let mut document = parse_str("<svg><!--a--><g><!--b--><rect/></g></svg>").unwrap();
        let pipeline = Pipeline::new().with_plugin(RemoveComments);
        pipeline.apply(&mut document, &PluginParams::default()).unwrap();
        assert_eq!(print_to_string(&document), "<svg><g><rect/></g></svg>");
    }

    #[test]
    fn test_reverse_walk_sees_children_first() {
        let mut document = parse_str("<svg><g><g/></g><rect/></svg>").unwrap();
        let pipeline = Pipeline::new().with_plugin(RemoveEmptyGroups);
        pipeline.apply(&mut document, &PluginParams::default()).unwrap();
        assert_eq!(print_to_string(&document), "<svg><rect/></svg>");
    }

    #[test]
    fn test_forward_walk_sees_parents_first() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new().with_plugin(OrderRecorder {
            label: "fwd",
            kind: PluginKind::PerItem,
            seen: seen.clone(),
        });
        let mut document = parse_str("<svg><g><rect/></g></svg>").unwrap();
        pipeline.apply(&mut document, &PluginParams::default()).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["fwd:svg", "fwd:g", "fwd:rect"]
        );
    }

    #[test]
    fn test_consecutive_same_kind_plugins_share_a_walk() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = |label, kind| OrderRecorder {
            label,
            kind,
            seen: seen.clone(),
        };
        let pipeline = Pipeline::new()
            .with_plugin(recorder("a", PluginKind::PerItem))
            .with_plugin(recorder("b", PluginKind::PerItem))
            .with_plugin(recorder("c", PluginKind::Full))
            .with_plugin(recorder("d", PluginKind::PerItem));
        let mut document = parse_str("<svg><g/></svg>").unwrap();
        pipeline.apply(&mut document, &PluginParams::default()).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "a:svg", "b:svg", "a:g", "b:g", "c:document", "d:svg", "d:g"
            ]
        );
    }

    #[test]
    fn test_inactive_plugins_are_skipped() {
        let mut pipeline = Pipeline::new().with_plugin(RemoveComments);
        let mut settings = BTreeMap::new();
        settings.insert("removeComments".to_string(), false);
        pipeline.configure(&settings).unwrap();
        assert_eq!(pipeline.is_active("removeComments"), Some(false));

        let mut document = parse_str("<svg><!--keep--></svg>").unwrap();
        pipeline.apply(&mut document, &PluginParams::default()).unwrap();
        assert_eq!(print_to_string(&document), "<svg><!--keep--></svg>");
    }

    #[test]
    fn test_configure_rejects_unknown_names_without_changes() {
        let mut pipeline = Pipeline::new().with_plugin(RemoveComments);
        let mut settings = BTreeMap::new();
        settings.insert("removeComments".to_string(), false);
        settings.insert("noSuchPlugin".to_string(), true);
        let err = pipeline.configure(&settings).unwrap_err();
        assert!(matches!(err, Error::UnknownPlugin(name) if name == "noSuchPlugin"));
        assert_eq!(pipeline.is_active("removeComments"), Some(true));
    }

    #[test]
    fn test_plugin_error_propagates() {
        let mut pipeline = Pipeline::new().with_plugin(Failing);
        assert_eq!(pipeline.active_names(), Vec::<&str>::new());
        let mut settings = BTreeMap::new();
        settings.insert("failing".to_string(), true);
        pipeline.configure(&settings).unwrap();

        let mut document = parse_str("<svg/>").unwrap();
        let err = pipeline
            .apply(&mut document, &PluginParams::default())
            .unwrap_err();
        assert!(matches!(err, Error::Transform { ref plugin, .. } if plugin == "failing"));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut pipeline = Pipeline::new().with_plugin(RemoveComments);
        pipeline.register(Box::new(RemoveComments));
        assert_eq!(pipeline.len(), 1);
    }
}
