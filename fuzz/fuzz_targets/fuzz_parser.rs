#![no_main]

use esparse::{ParseOptions, estree, parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process valid UTF-8
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Limit input size to avoid timeout
    if source.len() > 100_000 {
        return;
    }

    // Parse as both a script and a module; should return Ok or Err, never panic
    let script = ParseOptions::default();
    if let Ok(program) = parse(source, &script) {
        // Serialization must not panic either
        let _ = estree::to_json(&program, &script);
    }
    let module = ParseOptions {
        module: true,
        ..ParseOptions::default()
    };
    let _ = parse(source, &module);
});
