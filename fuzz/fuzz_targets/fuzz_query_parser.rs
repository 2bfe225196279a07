#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse, rewrite and plan arbitrary strings; must never panic
    if let Ok(compiled) = codequery::CompiledQuery::new(data, 0)
        && let Some(ast) = &compiled.ast
    {
        let _ = codequery::query::parse_query(&ast.to_string());
    }
});
