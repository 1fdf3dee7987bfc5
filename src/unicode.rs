//! Unicode character classification
//!
//! Static tables consumed only by the lexer: identifier start/continue,
//! whitespace, and line terminators as defined by ECMAScript.

use unicode_xid::UnicodeXID;

/// Check if a character can start an identifier.
///
/// ECMAScript IdentifierStart is ID_Start plus `$` and `_`.
pub fn is_id_start(ch: char) -> bool {
    ch == '$' || ch == '_' || UnicodeXID::is_xid_start(ch)
}

/// Check if a character can continue an identifier.
///
/// ECMAScript IdentifierPart is ID_Continue plus `$`, ZWNJ and ZWJ.
pub fn is_id_continue(ch: char) -> bool {
    ch == '$' || ch == '\u{200C}' || ch == '\u{200D}' || UnicodeXID::is_xid_continue(ch)
}

/// ECMAScript WhiteSpace:
/// - U+0009 (tab)
/// - U+000B (vertical tab)
/// - U+000C (form feed)
/// - U+0020 (space)
/// - U+00A0 (no-break space)
/// - U+FEFF (BOM / zero-width no-break space)
/// - any Zs (space separator) code point
pub fn is_whitespace(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// ECMAScript LineTerminator: LF, CR, LS (U+2028), PS (U+2029).
pub fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_start_accepts_dollar_underscore_and_letters() {
        assert!(is_id_start('$'));
        assert!(is_id_start('_'));
        assert!(is_id_start('a'));
        assert!(is_id_start('Ω'));
        assert!(!is_id_start('1'));
        assert!(!is_id_start(' '));
    }

    #[test]
    fn id_continue_accepts_digits_and_joiners() {
        assert!(is_id_continue('1'));
        assert!(is_id_continue('\u{200C}'));
        assert!(is_id_continue('\u{200D}'));
        assert!(!is_id_continue('-'));
    }

    #[test]
    fn line_terminators() {
        assert!(is_line_terminator('\n'));
        assert!(is_line_terminator('\r'));
        assert!(is_line_terminator('\u{2028}'));
        assert!(is_line_terminator('\u{2029}'));
        assert!(!is_line_terminator(' '));
    }
}
