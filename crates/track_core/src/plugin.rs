//! Plugin capability interface and the per-engine registry.
//!
//! Every hook has a default, so a plugin implements only what it reacts to.
//! Hooks run in activation order. `node_inserted` and `node_created` stop at the
//! first plugin that returns `false`. A panicking hook is not caught.

use crate::config::{PluginSpec, TrackerConfig, User};
use crate::error::{TrackError, TrackResult};
use crate::events::KeyEvent;
use crate::range::Range;
use html::{Document, NodeId};
use std::collections::BTreeMap;

/// What a hook may see and touch.
pub struct PluginContext<'a> {
    pub doc: &'a mut Document,
    pub root: NodeId,
    pub config: &'a TrackerConfig,
}

impl PluginContext<'_> {
    pub fn user(&self) -> &User {
        &self.config.current_user
    }
}

pub trait Plugin {
    fn start(&mut self, _ctx: &mut PluginContext<'_>) {}

    fn set_settings(&mut self, _settings: &serde_json::Value) -> Result<(), String> {
        Ok(())
    }

    fn clicked(&mut self, _ctx: &mut PluginContext<'_>) -> bool {
        true
    }

    fn mouse_down(&mut self, _ctx: &mut PluginContext<'_>) -> bool {
        true
    }

    fn key_down(&mut self, _ctx: &mut PluginContext<'_>, _event: &KeyEvent) -> bool {
        true
    }

    fn key_press(&mut self, _ctx: &mut PluginContext<'_>, _event: &KeyEvent) -> bool {
        true
    }

    /// Returns true to claim the combo; the host default is then prevented.
    fn key_combo(&mut self, _ctx: &mut PluginContext<'_>, _combo: &str) -> bool {
        false
    }

    fn selection_changed(&mut self, _ctx: &mut PluginContext<'_>, _range: Option<Range>) {}

    fn set_enabled(&mut self, _enabled: bool) {}

    fn caret_updated(&mut self, _ctx: &mut PluginContext<'_>) {}

    fn caret_positioned(&mut self, _ctx: &mut PluginContext<'_>) {}

    fn node_inserted(&mut self, _ctx: &mut PluginContext<'_>, _node: NodeId, _range: Range) -> bool {
        true
    }

    fn node_created(&mut self, _ctx: &mut PluginContext<'_>, _node: NodeId, _action: &str) -> bool {
        true
    }

    fn remove(&mut self, _ctx: &mut PluginContext<'_>) {}
}

pub type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin>>;

/// Named plugin constructors available to one engine instance.
#[derive(Default)]
pub struct PluginRegistry {
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("AddTitlePlugin", || {
            Box::new(crate::plugins::AddTitlePlugin::default())
        });
        registry
    }

    /// Registers `factory` under `name`, replacing an earlier registration.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Plugin> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    fn create(&self, name: &str) -> Option<Box<dyn Plugin>> {
        self.factories.get(name).map(|factory| factory())
    }
}

/// Plugins active on one engine, in activation order.
#[derive(Default)]
pub struct PluginHost {
    plugins: Vec<(String, Box<dyn Plugin>)>,
}

impl PluginHost {
    pub fn from_specs(registry: &PluginRegistry, specs: &[PluginSpec]) -> TrackResult<Self> {
        let mut plugins = Vec::with_capacity(specs.len());
        for spec in specs {
            let name = spec.name();
            let mut plugin = registry.create(name).ok_or_else(|| TrackError::UnknownPlugin {
                name: name.to_string(),
            })?;
            if let Some(settings) = spec.settings() {
                plugin
                    .set_settings(settings)
                    .map_err(|message| TrackError::PluginSettings {
                        name: name.to_string(),
                        message,
                    })?;
            }
            log::debug!(target: "track.plugin", "activated plugin {name}");
            plugins.push((name.to_string(), plugin));
        }
        Ok(Self { plugins })
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn start(&mut self, ctx: &mut PluginContext<'_>) {
        for (_, plugin) in &mut self.plugins {
            plugin.start(ctx);
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        for (_, plugin) in &mut self.plugins {
            plugin.set_enabled(enabled);
        }
    }

    pub fn clicked(&mut self, ctx: &mut PluginContext<'_>) -> bool {
        self.plugins.iter_mut().all(|(_, p)| p.clicked(ctx))
    }

    pub fn mouse_down(&mut self, ctx: &mut PluginContext<'_>) -> bool {
        self.plugins.iter_mut().all(|(_, p)| p.mouse_down(ctx))
    }

    pub fn key_down(&mut self, ctx: &mut PluginContext<'_>, event: &KeyEvent) -> bool {
        self.plugins.iter_mut().all(|(_, p)| p.key_down(ctx, event))
    }

    pub fn key_press(&mut self, ctx: &mut PluginContext<'_>, event: &KeyEvent) -> bool {
        self.plugins.iter_mut().all(|(_, p)| p.key_press(ctx, event))
    }

    /// True when some plugin claimed the combo.
    pub fn key_combo(&mut self, ctx: &mut PluginContext<'_>, combo: &str) -> bool {
        self.plugins.iter_mut().any(|(_, p)| p.key_combo(ctx, combo))
    }

    pub fn selection_changed(&mut self, ctx: &mut PluginContext<'_>, range: Option<Range>) {
        for (_, plugin) in &mut self.plugins {
            plugin.selection_changed(ctx, range);
        }
    }

    pub fn caret_updated(&mut self, ctx: &mut PluginContext<'_>) {
        for (_, plugin) in &mut self.plugins {
            plugin.caret_updated(ctx);
        }
    }

    pub fn caret_positioned(&mut self, ctx: &mut PluginContext<'_>) {
        for (_, plugin) in &mut self.plugins {
            plugin.caret_positioned(ctx);
        }
    }

    pub fn node_inserted(&mut self, ctx: &mut PluginContext<'_>, node: NodeId, range: Range) -> bool {
        self.plugins
            .iter_mut()
            .all(|(_, p)| p.node_inserted(ctx, node, range))
    }

    pub fn node_created(&mut self, ctx: &mut PluginContext<'_>, node: NodeId, action: &str) -> bool {
        self.plugins
            .iter_mut()
            .all(|(_, p)| p.node_created(ctx, node, action))
    }

    pub fn remove_all(&mut self, ctx: &mut PluginContext<'_>) {
        for (name, mut plugin) in self.plugins.drain(..) {
            log::debug!(target: "track.plugin", "removing plugin {name}");
            plugin.remove(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        label: &'static str,
        log: Rc<RefCell<Vec<String>>>,
        veto: bool,
    }

    impl Plugin for Recorder {
        fn node_created(&mut self, _ctx: &mut PluginContext<'_>, _node: NodeId, action: &str) -> bool {
            self.log.borrow_mut().push(format!("{}:{action}", self.label));
            !self.veto
        }

        fn set_settings(&mut self, settings: &serde_json::Value) -> Result<(), String> {
            match settings.get("veto") {
                Some(serde_json::Value::Bool(veto)) => {
                    self.veto = *veto;
                    Ok(())
                }
                _ => Err("expected a boolean `veto`".to_string()),
            }
        }
    }

    fn registry(log: &Rc<RefCell<Vec<String>>>) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        for label in ["first", "second"] {
            let log = Rc::clone(log);
            registry.register(label, move || {
                Box::new(Recorder {
                    label,
                    log: Rc::clone(&log),
                    veto: false,
                })
            });
        }
        registry
    }

    #[test]
    fn unknown_plugin_is_a_configuration_error() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let err = PluginHost::from_specs(&registry(&log), &[PluginSpec::Name("missing".into())])
            .err()
            .unwrap();
        assert!(matches!(err, TrackError::UnknownPlugin { name } if name == "missing"));
    }

    #[test]
    fn bad_settings_are_reported_with_the_plugin_name() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let specs = [PluginSpec::WithSettings {
            name: "first".into(),
            settings: serde_json::json!({"veto": "yes"}),
        }];
        let err = PluginHost::from_specs(&registry(&log), &specs).err().unwrap();
        assert!(matches!(err, TrackError::PluginSettings { name, .. } if name == "first"));
    }

    #[test]
    fn node_created_short_circuits_on_false() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let specs = [
            PluginSpec::WithSettings {
                name: "first".into(),
                settings: serde_json::json!({"veto": true}),
            },
            PluginSpec::Name("second".into()),
        ];
        let mut host = PluginHost::from_specs(&registry(&log), &specs).unwrap();
        assert_eq!(host.names(), ["first", "second"]);
        let mut doc = Document::new();
        let config = TrackerConfig::default();
        let root = doc.root();
        let mut ctx = PluginContext {
            doc: &mut doc,
            root,
            config: &config,
        };
        assert!(!host.node_created(&mut ctx, root, "Inserted"));
        assert_eq!(*log.borrow(), ["first:Inserted"]);
    }

    #[test]
    fn builtins_include_add_title() {
        assert!(PluginRegistry::with_builtins().contains("AddTitlePlugin"));
    }
}
