use crate::plugin::{Plugin, PluginContext};
use chrono::{DateTime, Utc};
use chrono::format::{Item, StrftimeItems};
use html::NodeId;
use serde::Deserialize;

pub const DEFAULT_TITLE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Writes a `title` describing who made a change and when onto every new region.
pub struct AddTitlePlugin {
    format: String,
}

impl Default for AddTitlePlugin {
    fn default() -> Self {
        Self {
            format: DEFAULT_TITLE_FORMAT.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AddTitleSettings {
    format: Option<String>,
}

impl AddTitlePlugin {
    pub fn with_format(format: &str) -> Result<Self, String> {
        validate_format(format)?;
        Ok(Self {
            format: format.to_string(),
        })
    }

    fn render_time(&self, millis: Option<i64>) -> String {
        millis
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|time| time.format(&self.format).to_string())
            .unwrap_or_default()
    }
}

fn validate_format(format: &str) -> Result<(), String> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid date format {format:?}"));
    }
    Ok(())
}

impl Plugin for AddTitlePlugin {
    fn set_settings(&mut self, settings: &serde_json::Value) -> Result<(), String> {
        let settings: AddTitleSettings =
            serde_json::from_value(settings.clone()).map_err(|err| err.to_string())?;
        if let Some(format) = settings.format {
            validate_format(&format)?;
            self.format = format;
        }
        Ok(())
    }

    fn node_created(&mut self, ctx: &mut PluginContext<'_>, node: NodeId, action: &str) -> bool {
        let config = ctx.config;
        let millis = ctx
            .doc
            .attr(node, &config.time_attribute)
            .and_then(|t| t.trim().parse().ok());
        let user = ctx
            .doc
            .attr(node, &config.user_name_attribute)
            .unwrap_or_default()
            .to_string();
        let action = if action.is_empty() { "Modified" } else { action };
        let title = format!("{action} by {user} - {}", self.render_time(millis));
        if let Err(err) = ctx.doc.set_attr(node, "title", &title) {
            log::warn!(target: "track.plugin", "AddTitlePlugin: {err}");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use html::Document;

    fn created(plugin: &mut AddTitlePlugin, action: &str) -> String {
        let mut doc = Document::parse(
            r#"<span class="ins" data-username="Ted" data-time="1700000000000">x</span>"#,
        );
        let root = doc.root();
        let node = doc.first_child(root).unwrap();
        let config = TrackerConfig::default();
        let mut ctx = PluginContext {
            doc: &mut doc,
            root,
            config: &config,
        };
        assert!(plugin.node_created(&mut ctx, node, action));
        doc.attr(node, "title").unwrap().to_string()
    }

    #[test]
    fn titles_name_action_user_and_time() {
        let mut plugin = AddTitlePlugin::default();
        assert_eq!(created(&mut plugin, "Inserted"), "Inserted by Ted - 14/11/2023 22:13");
        assert_eq!(created(&mut plugin, ""), "Modified by Ted - 14/11/2023 22:13");
    }

    #[test]
    fn format_comes_from_settings() {
        let mut plugin = AddTitlePlugin::default();
        plugin
            .set_settings(&serde_json::json!({"format": "%Y-%m-%d"}))
            .unwrap();
        assert_eq!(created(&mut plugin, "Deleted"), "Deleted by Ted - 2023-11-14");
        assert!(plugin.set_settings(&serde_json::json!({"format": "%Q"})).is_err());
        assert!(plugin.set_settings(&serde_json::json!({"colour": 1})).is_err());
    }
}
