#![no_main]

use libfuzzer_sys::fuzz_target;
use track_core::{ChangeEditor, PluginRegistry, TrackerConfig};

const SEED: &str = concat!(
    r#"<p>one <span class="ins" data-cid="1" data-userid="2">two</span> three</p>"#,
    r#"<p><em>four <span class="del" data-cid="2">five</span></em> six<br>seven</p>"#,
    "<ul><li>eight</li><li>nine</li></ul>"
);

fuzz_target!(|data: &[u8]| {
    let Ok(mut editor) = ChangeEditor::from_html(SEED, TrackerConfig::default(), &PluginRegistry::new())
    else {
        return;
    };
    editor.set_clock(|| 0);
    for chunk in data.chunks(2) {
        let arg = chunk.get(1).copied().unwrap_or(0);
        match chunk[0] % 10 {
            0 => {
                editor.move_caret(isize::from(arg as i8));
            }
            1 | 2 => {
                let ch = char::from(b'a' + arg % 26);
                editor.insert(ch.to_string().as_str(), None);
            }
            3 => {
                editor.delete_contents(false, None);
            }
            4 => {
                editor.delete_contents(true, None);
            }
            5 => {
                editor.insert(track_core::Content::Html("x<p>y</p>z".to_string()), None);
            }
            6 => {
                if arg % 2 == 0 {
                    editor.accept_change(None);
                } else {
                    editor.reject_change(None);
                }
            }
            7 => {
                if arg % 2 == 0 {
                    editor.placehold_deletes();
                } else {
                    editor.revert_delete_placeholders();
                }
            }
            8 => {
                editor.select_end();
            }
            _ => {
                let _ = editor.get_clean_content(None);
            }
        }
    }
    editor.revert_delete_placeholders();
    let clean = editor.get_clean_content(None).ok();
    editor.accept_all();
    assert_eq!(Some(editor.html()), clean);
});
