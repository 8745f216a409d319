#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    let _ = html::tokenize(&input);
    let doc = html::Document::parse(&input);
    let serialized = doc.inner_html(doc.root());
    // Serialized output must be a fixed point of parse/serialize.
    let again = html::Document::parse(&serialized);
    assert_eq!(again.inner_html(again.root()), serialized);
});
