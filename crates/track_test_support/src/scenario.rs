use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A TOML file holding `[[scenario]]` tables.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    #[serde(rename = "scenario", default)]
    pub scenarios: Vec<Scenario>,
}

/// One editing session: starting markup, the acting user, steps, expectations.
///
/// Nodes are addressed by child-index paths from the editable root, so
/// `[1, 0]` is the first child of the root's second child.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    pub html: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub expect: Expectation,
    /// Skips the scenario with a reason, mirroring known gaps.
    #[serde(default)]
    pub skip: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case", deny_unknown_fields)]
pub enum Step {
    /// Collapsed caret at `offset` inside the node at `path`.
    Caret {
        path: Vec<usize>,
        offset: usize,
        /// Characters to move afterwards (negative moves left).
        #[serde(default)]
        shift: i64,
    },
    Select {
        start: Vec<usize>,
        start_offset: usize,
        end: Vec<usize>,
        end_offset: usize,
    },
    Type {
        text: String,
    },
    Html {
        html: String,
    },
    Backspace {
        #[serde(default = "one")]
        repeat: usize,
    },
    Delete {
        #[serde(default = "one")]
        repeat: usize,
    },
    Accept {
        path: Option<Vec<usize>>,
    },
    Reject {
        path: Option<Vec<usize>>,
    },
    AcceptAll,
    RejectAll,
    StartBatch,
    EndBatch,
    StopTracking,
    StartTracking,
}

fn one() -> usize {
    1
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    pub text: Option<String>,
    pub html: Option<String>,
    /// Exact number of insert regions.
    pub inserts: Option<usize>,
    /// Exact number of delete regions.
    pub deletes: Option<usize>,
    /// Text of every delete region, in document order.
    pub delete_texts: Option<Vec<String>>,
    /// Text of every insert region, in document order.
    pub insert_texts: Option<Vec<String>>,
    /// Number of distinct change ids across all regions.
    pub change_ids: Option<usize>,
}

/// Loads scenarios from `path`, panicking with the file name on any error.
pub fn load_scenarios(path: &Path) -> Vec<Scenario> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read scenarios {path:?}: {err}"));
    let file: ScenarioFile = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse scenarios {path:?}: {err}"));
    let mut seen = std::collections::BTreeSet::new();
    for scenario in &file.scenarios {
        if !seen.insert(scenario.name.as_str()) {
            panic!("duplicate scenario name '{}' in {path:?}", scenario.name);
        }
        if scenario.skip.as_deref() == Some("") {
            panic!("scenario '{}' is skipped without a reason in {path:?}", scenario.name);
        }
    }
    file.scenarios
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_steps_parse_from_toml() {
        let file: ScenarioFile = toml::from_str(
            r#"
            [[scenario]]
            name = "typing"
            html = "<p>a</p>"
            steps = [
                { op = "caret", path = [0, 0], offset = 1 },
                { op = "type", text = "b" },
                { op = "backspace", repeat = 2 },
                { op = "accept-all" },
            ]
            expect = { text = "a", deletes = 0 }
            "#,
        )
        .unwrap();
        let scenario = &file.scenarios[0];
        assert_eq!(scenario.steps.len(), 4);
        assert!(matches!(scenario.steps[2], Step::Backspace { repeat: 2 }));
        assert!(matches!(scenario.steps[0], Step::Caret { shift: 0, .. }));
        assert_eq!(scenario.expect.deletes, Some(0));
    }
}
