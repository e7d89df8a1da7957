#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Bracketed,
    LineComment,
    BlockComment(u32),
}

/// Byte offsets of every `?` placeholder outside literals, quoted identifiers, and comments.
pub(super) fn placeholder_offsets(sql: &str) -> Vec<usize> {
    use super::parsers::{is_block_comment_end, is_block_comment_start, is_line_comment_start};

    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'[' => state = State::Bracketed,
                b'?' => found.push(idx),
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                _ => {}
            },
            State::SingleQuoted => state = close_quote(bytes, &mut idx, b'\'', state),
            State::DoubleQuoted => state = close_quote(bytes, &mut idx, b'"', state),
            State::Bracketed => state = close_quote(bytes, &mut idx, b']', state),
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    found
}

// A doubled closing character is an escape and keeps the quote open.
fn close_quote(bytes: &[u8], idx: &mut usize, close: u8, current: State) -> State {
    if bytes[*idx] != close {
        return current;
    }
    if bytes.get(*idx + 1) == Some(&close) {
        *idx += 1;
        current
    } else {
        State::Normal
    }
}
