//! Engine options.
//!
//! Keys use camelCase so a configuration written for a browser host can be loaded
//! unchanged from JSON or TOML.

use crate::change::ChangeType;
use crate::error::{TrackError, TrackResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Marker element for one change type: `<{tag} class="{alias}">`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeTypeConfig {
    pub tag: String,
    pub alias: String,
    /// Human readable verb passed to `nodeCreated` hooks.
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangeTypes {
    pub insert_type: ChangeTypeConfig,
    pub delete_type: ChangeTypeConfig,
}

impl Default for ChangeTypes {
    fn default() -> Self {
        Self {
            insert_type: ChangeTypeConfig {
                tag: "span".to_string(),
                alias: "ins".to_string(),
                action: "Inserted".to_string(),
            },
            delete_type: ChangeTypeConfig {
                tag: "span".to_string(),
                alias: "del".to_string(),
                action: "Deleted".to_string(),
            },
        }
    }
}

impl ChangeTypes {
    pub fn get(&self, change_type: ChangeType) -> &ChangeTypeConfig {
        match change_type {
            ChangeType::Insert => &self.insert_type,
            ChangeType::Delete => &self.delete_type,
        }
    }
}

/// A plugin activation entry: either a bare name or a name with settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginSpec {
    Name(String),
    WithSettings {
        name: String,
        #[serde(default)]
        settings: serde_json::Value,
    },
}

impl PluginSpec {
    pub fn name(&self) -> &str {
        match self {
            PluginSpec::Name(name) => name,
            PluginSpec::WithSettings { name, .. } => name,
        }
    }

    pub fn settings(&self) -> Option<&serde_json::Value> {
        match self {
            PluginSpec::Name(_) => None,
            PluginSpec::WithSettings { settings, .. } if settings.is_null() => None,
            PluginSpec::WithSettings { settings, .. } => Some(settings),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerConfig {
    pub is_tracking: bool,
    pub current_user: User,
    pub change_types: ChangeTypes,
    pub change_id_attribute: String,
    pub user_id_attribute: String,
    pub user_name_attribute: String,
    pub time_attribute: String,
    /// Block element created when content lands directly in an empty root.
    pub block_element: String,
    /// Tag of the inert stand-ins produced by `placehold_deletes`.
    pub placeholder_tag: String,
    pub plugins: Vec<PluginSpec>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            is_tracking: true,
            current_user: User::default(),
            change_types: ChangeTypes::default(),
            change_id_attribute: "data-cid".to_string(),
            user_id_attribute: "data-userid".to_string(),
            user_name_attribute: "data-username".to_string(),
            time_attribute: "data-time".to_string(),
            block_element: "p".to_string(),
            placeholder_tag: "tempdel".to_string(),
            plugins: Vec::new(),
        }
    }
}

fn is_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':')
}

impl TrackerConfig {
    pub fn from_json(json: &str) -> TrackResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the engine cannot operate on.
    pub fn validate(&self) -> TrackResult<()> {
        for (label, ty) in [
            ("insertType", &self.change_types.insert_type),
            ("deleteType", &self.change_types.delete_type),
        ] {
            if !is_name(&ty.tag) {
                return Err(TrackError::config(format!(
                    "changeTypes.{label}.tag {:?} is not a valid tag name",
                    ty.tag
                )));
            }
            if ty.alias.is_empty() || ty.alias.contains(char::is_whitespace) {
                return Err(TrackError::config(format!(
                    "changeTypes.{label}.alias {:?} must be a single class name",
                    ty.alias
                )));
            }
        }
        let insert = &self.change_types.insert_type;
        let delete = &self.change_types.delete_type;
        if insert.tag.eq_ignore_ascii_case(&delete.tag) && insert.alias == delete.alias {
            return Err(TrackError::config(
                "insert and delete change types must differ in tag or alias",
            ));
        }

        let attributes = [
            ("changeIdAttribute", &self.change_id_attribute),
            ("userIdAttribute", &self.user_id_attribute),
            ("userNameAttribute", &self.user_name_attribute),
            ("timeAttribute", &self.time_attribute),
        ];
        for (i, (label, value)) in attributes.iter().enumerate() {
            if !is_name(value) {
                return Err(TrackError::config(format!(
                    "{label} {value:?} is not a valid attribute name"
                )));
            }
            if let Some((other, _)) = attributes[i + 1..]
                .iter()
                .find(|(_, v)| v.eq_ignore_ascii_case(value))
            {
                return Err(TrackError::config(format!(
                    "{label} and {other} both use {value:?}"
                )));
            }
        }
        if !is_name(&self.block_element) {
            return Err(TrackError::config(format!(
                "blockElement {:?} is not a valid tag name",
                self.block_element
            )));
        }
        if !is_name(&self.placeholder_tag) {
            return Err(TrackError::config(format!(
                "placeholderTag {:?} is not a valid tag name",
                self.placeholder_tag
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        TrackerConfig::default().validate().unwrap();
    }

    #[test]
    fn parses_host_style_json() {
        let config = TrackerConfig::from_json(
            r#"{
                "isTracking": false,
                "currentUser": {"id": "4", "name": "Ted"},
                "changeTypes": {
                    "insertType": {"tag": "ins", "alias": "ins"},
                    "deleteType": {"tag": "del", "alias": "del"}
                },
                "changeIdAttribute": "cid",
                "userIdAttribute": "userid",
                "plugins": ["AddTitlePlugin", {"name": "Other", "settings": {"a": 1}}]
            }"#,
        )
        .unwrap();
        assert!(!config.is_tracking);
        assert_eq!(config.current_user, User::new("4", "Ted"));
        assert_eq!(config.change_types.delete_type.tag, "del");
        assert_eq!(config.user_name_attribute, "data-username");
        assert_eq!(config.plugins[0].name(), "AddTitlePlugin");
        assert!(config.plugins[0].settings().is_none());
        assert_eq!(config.plugins[1].settings().unwrap()["a"], 1);
    }

    #[test]
    fn parses_toml_with_plugin_settings() {
        let config: TrackerConfig = toml::from_str(
            r#"
            changeIdAttribute = "cid"
            plugins = ["AddTitlePlugin", { name = "AddTitlePlugin", settings = { format = "%Y" } }]

            [currentUser]
            id = "7"
            name = "Ann"

            [changeTypes.insertType]
            tag = "ins"
            alias = "ins"
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert!(config.is_tracking);
        assert_eq!(config.change_id_attribute, "cid");
        assert_eq!(config.current_user.name, "Ann");
        assert_eq!(config.change_types.insert_type.tag, "ins");
        assert_eq!(config.change_types.insert_type.action, "");
        assert_eq!(config.change_types.delete_type.alias, "del");
        assert_eq!(config.plugins[1].settings().unwrap()["format"], "%Y");
    }

    #[test]
    fn rejects_indistinguishable_change_types() {
        let mut config = TrackerConfig::default();
        config.change_types.delete_type.alias = "ins".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must differ"), "{err}");
    }

    #[test]
    fn rejects_shared_attribute_names() {
        let mut config = TrackerConfig::default();
        config.time_attribute = "data-cid".to_string();
        assert!(matches!(config.validate(), Err(TrackError::Config { .. })));
    }

    #[test]
    fn rejects_malformed_tag() {
        let mut config = TrackerConfig::default();
        config.change_types.insert_type.tag = "sp an".to_string();
        assert!(config.validate().is_err());
    }
}
