use html::NodeId;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use track_core::events::{KEY_BACKSPACE, KEY_DELETE};
use track_core::{
    Boundary, ChangeEditor, ChangeId, ChangeType, Content, EditorEvent, KeyEvent, PluginRegistry, Range,
    TrackerConfig, User,
};
use track_test_support::{Scenario, Step, diff_lines, escape_text, html_lines, load_scenarios};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn fixture_files() -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(fixtures_dir())
        .expect("fixtures directory")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    files.sort();
    files
}

fn resolve(editor: &ChangeEditor, path: &[usize]) -> Result<NodeId, String> {
    let doc = editor.document();
    path.iter().try_fold(editor.root(), |node, index| {
        doc.child_at(node, *index)
            .ok_or_else(|| format!("path {path:?}: node {node:?} has no child {index}"))
    })
}

fn boundary(editor: &ChangeEditor, path: &[usize], offset: usize) -> Result<Boundary, String> {
    Ok(Boundary::new(resolve(editor, path)?, offset))
}

fn key(editor: &mut ChangeEditor, event: KeyEvent, repeat: usize) {
    for _ in 0..repeat {
        let mut event = EditorEvent::key_down(event.clone());
        editor.handle_event(&mut event);
    }
}

fn run_step(editor: &mut ChangeEditor, batches: &mut Vec<ChangeId>, step: &Step) -> Result<(), String> {
    match step {
        Step::Caret { path, offset, shift } => {
            let at = boundary(editor, path, *offset)?;
            let at = editor
                .walker()
                .move_boundary(at, *shift as isize, true)
                .ok_or_else(|| format!("caret {path:?}@{offset} shifted by {shift} left the root"))?;
            if !editor.collapse_selection(at) {
                return Err(format!("caret {at:?} rejected"));
            }
        }
        Step::Select {
            start,
            start_offset,
            end,
            end_offset,
        } => {
            let range = Range::new(
                boundary(editor, start, *start_offset)?,
                boundary(editor, end, *end_offset)?,
            );
            if !editor.set_selection(range) {
                return Err(format!("selection {range:?} rejected"));
            }
        }
        Step::Type { text } => {
            for ch in text.chars() {
                let mut event = EditorEvent::key_press(KeyEvent::character(ch));
                editor.handle_event(&mut event);
            }
        }
        Step::Html { html } => {
            editor.insert(Content::Html(html.clone()), None);
        }
        Step::Backspace { repeat } => key(editor, KeyEvent::new("Backspace", KEY_BACKSPACE), *repeat),
        Step::Delete { repeat } => key(editor, KeyEvent::new("Delete", KEY_DELETE), *repeat),
        Step::Accept { path } => {
            let node = path.as_deref().map(|p| resolve(editor, p)).transpose()?;
            editor.accept_change(node);
        }
        Step::Reject { path } => {
            let node = path.as_deref().map(|p| resolve(editor, p)).transpose()?;
            editor.reject_change(node);
        }
        Step::AcceptAll => {
            editor.accept_all();
        }
        Step::RejectAll => {
            editor.reject_all();
        }
        Step::StartBatch => batches.push(editor.start_batch_change()),
        Step::EndBatch => {
            let id = batches.pop().ok_or("end-batch without start-batch")?;
            editor.end_batch_change(id);
        }
        Step::StopTracking => editor.stop_tracking(),
        Step::StartTracking => editor.start_tracking(),
    }
    Ok(())
}

fn region_texts(editor: &ChangeEditor, change_type: ChangeType) -> Vec<String> {
    let model = track_core::ChangeModel::new(editor.config());
    model
        .change_nodes(editor.document(), editor.root(), Some(change_type))
        .into_iter()
        .map(|n| editor.document().text_content(n))
        .collect()
}

fn check(editor: &ChangeEditor, scenario: &Scenario) -> Vec<String> {
    let expect = &scenario.expect;
    let mut failures = Vec::new();
    let doc = editor.document();
    if let Some(text) = &expect.text {
        let actual = doc.text_content(editor.root());
        if &actual != text {
            failures.push(format!(
                "text: expected \"{}\", got \"{}\"",
                escape_text(text),
                escape_text(&actual)
            ));
        }
    }
    if let Some(html) = &expect.html {
        let actual = editor.html();
        if &actual != html {
            failures.push(format!(
                "html:\n{}",
                diff_lines(&html_lines(html), &html_lines(&actual))
            ));
        }
    }
    let counts = editor.count_changes();
    if let Some(inserts) = expect.inserts.filter(|n| *n != counts.inserts) {
        failures.push(format!("inserts: expected {inserts}, got {}", counts.inserts));
    }
    if let Some(deletes) = expect.deletes.filter(|n| *n != counts.deletes) {
        failures.push(format!("deletes: expected {deletes}, got {}", counts.deletes));
    }
    if let Some(texts) = &expect.delete_texts {
        let actual = region_texts(editor, ChangeType::Delete);
        if &actual != texts {
            failures.push(format!("delete texts: expected {texts:?}, got {actual:?}"));
        }
    }
    if let Some(texts) = &expect.insert_texts {
        let actual = region_texts(editor, ChangeType::Insert);
        if &actual != texts {
            failures.push(format!("insert texts: expected {texts:?}, got {actual:?}"));
        }
    }
    if let Some(expected) = expect.change_ids {
        let model = track_core::ChangeModel::new(editor.config());
        let ids: BTreeSet<_> = model
            .change_nodes(doc, editor.root(), None)
            .into_iter()
            .filter_map(|n| model.change_id(doc, n))
            .collect();
        if ids.len() != expected {
            failures.push(format!("change ids: expected {expected}, got {ids:?}"));
        }
    }
    failures
}

fn run(scenario: &Scenario) -> Result<Vec<String>, String> {
    let mut config = TrackerConfig {
        current_user: User::new("4", "Ted"),
        ..TrackerConfig::default()
    };
    if let Some(user) = &scenario.user {
        config.current_user = User::new(user.id.clone(), user.name.clone());
    }
    let mut editor = ChangeEditor::from_html(&scenario.html, config, &PluginRegistry::new())
        .map_err(|err| err.to_string())?;
    editor.set_clock(|| 1_000);
    let mut batches = Vec::new();
    for (i, step) in scenario.steps.iter().enumerate() {
        run_step(&mut editor, &mut batches, step).map_err(|err| format!("step {i}: {err}"))?;
    }
    Ok(check(&editor, scenario))
}

#[test]
fn editing_scenarios() {
    let files = fixture_files();
    assert!(!files.is_empty(), "no scenario fixtures found");
    let mut failed = Vec::new();
    let mut ran = 0;
    for file in files {
        for scenario in load_scenarios(&file) {
            if let Some(reason) = &scenario.skip {
                eprintln!("skipping {}: {reason}", scenario.name);
                continue;
            }
            ran += 1;
            match run(&scenario) {
                Ok(failures) if failures.is_empty() => {}
                Ok(failures) => failed.push(format!("{}:\n  {}", scenario.name, failures.join("\n  "))),
                Err(err) => failed.push(format!("{}: {err}", scenario.name)),
            }
        }
    }
    assert!(ran > 0);
    assert!(failed.is_empty(), "{} scenario(s) failed:\n{}", failed.len(), failed.join("\n"));
}
