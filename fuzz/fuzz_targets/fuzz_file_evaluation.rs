#![no_main]

use codequery::query::{evaluate_file, post_eval_metadata_filters};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &[u8], bool)| {
    let (query, content, case_sensitive) = data;
    if let Ok(compiled) = codequery::CompiledQuery::new(query, 0) {
        let ast = compiled.ast.as_ref();
        let evaluation = evaluate_file(ast, content, "fuzz.rs", "src/fuzz.rs", case_sensitive);
        // Every range must slice the raw content
        for range in evaluation.locations.values().flatten() {
            assert!(range.start < range.end && range.end <= content.len());
        }
        let _ = evaluation.with_metadata("rust", 5);
        let _ = post_eval_metadata_filters(ast, "rust", 5);
    }
});
