#![no_main]

use esparse::lexer::Lexer;
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

    let mut lexer = Lexer::new(source);

    // Consume all tokens; errors are expected, panics are not
    loop {
        match lexer.next_token() {
            Ok(token) => {
                if token.is_eof() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
});
