//
// position.rs
//
// Mapping between editor positions (line, UTF-16 character) and byte offsets
//

use ropey::Rope;

use crate::utf16::{byte_offset_to_utf16_column, utf16_column_to_byte_offset};

/// Text of a line without its terminator.
fn line_text(rope: &Rope, line: usize) -> String {
    let mut text = rope.line(line).to_string();
    while text.ends_with('\n') || text.ends_with('\r') {
        text.pop();
    }
    text
}

/// Convert a zero-based line and UTF-16 character to a byte offset into `text`.
///
/// Characters past the end of the line clamp to the line end. Returns `None`
/// when `line` is past the end of the document.
pub fn position_to_offset(text: &str, line: u32, character: u32) -> Option<usize> {
    let rope = Rope::from_str(text);
    let line = line as usize;
    if line >= rope.len_lines() {
        log::trace!("Line {} is outside document with {} lines", line, rope.len_lines());
        return None;
    }
    let line_start = rope.line_to_byte(line);
    let column = utf16_column_to_byte_offset(&line_text(&rope, line), character);
    Some(line_start + column)
}

/// Convert a byte offset into `text` back to a zero-based (line, UTF-16 character).
/// Offsets past the end of the document clamp to the end.
pub fn offset_to_position(text: &str, offset: usize) -> (u32, u32) {
    let rope = Rope::from_str(text);
    let offset = offset.min(rope.len_bytes());
    let line = rope.byte_to_line(offset);
    let line_start = rope.line_to_byte(line);
    let column = byte_offset_to_utf16_column(&line_text(&rope, line), offset - line_start);
    (line as u32, column)
}
