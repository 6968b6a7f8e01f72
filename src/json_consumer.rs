//! Healed-JSON consumer (C3): bridges the cursor to the external
//! [`PartialJsonParser`], enforcing the invariant that a complete (non-partial) parse
//! must never have needed healing.

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};
use crate::partial_json::{Healed, PartialJsonParser};

/// Consumes a JSON value spanning the rest of the cursor's input. `Ok(None)` means no
/// value could be parsed at all (empty tail, or a hard syntax error unrelated to
/// truncation) — the cursor is left untouched in that case.
pub fn try_consume_json(
    cursor: &mut Cursor<'_>,
    parser: &dyn PartialJsonParser,
    healing_marker: &str,
) -> ParseResult<Option<Healed>> {
    let text = cursor.tail();
    if text.is_empty() {
        return Ok(None);
    }
    let Some(healed) = parser.parse(text, healing_marker) else {
        return Ok(None);
    };
    if healed.healing.is_some() && !cursor.is_partial() {
        return Err(ParseError::Partial("JSON".to_string()));
    }
    cursor.consume_rest();
    Ok(Some(healed))
}
