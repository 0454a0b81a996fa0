//! VTODO encoding and decoding (RFC 5545).
//!
//! The reconciler never sees wire data; remote resources are decoded here
//! into `TaskRecord`s, and new or modified records are encoded back here.

mod generate;
mod parse;
mod status;

pub use generate::generate_todo;
pub use parse::parse_todo;
pub use status::set_todo_status;

/// Unescape a raw TEXT value (RFC 5545 §3.3.11), the way `read_calendar`
/// does. Only for values taken from the wire, never for parsed properties.
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(c @ ('\\' | ',' | ';' | ':')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Split a raw multi-valued TEXT property on unescaped commas and unescape
/// each item.
fn split_text_list(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in value.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ',' {
            items.push(unescape_text(&current));
            current.clear();
        } else {
            current.push(c);
        }
    }
    if escaped {
        current.push('\\');
    }
    items.push(unescape_text(&current));

    items.into_iter().filter(|s| !s.trim().is_empty()).collect()
}
