//! Human-oriented pretty-printer: tab indentation, compact vector form, the
//! minimum quote level that preserves a lossless round trip.

use std::fmt::Write as _;

use crate::value::{Kind, Kvs};

/// Renders `root`'s children (i.e. the root node's body, unbraced) as text.
#[must_use]
pub fn write(root: &Kvs) -> String {
    let mut out = String::new();
    if let Kind::Node(children) = root.kind() {
        write_children(&mut out, children, 0);
    }
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn write_children(out: &mut String, children: &[Kvs], depth: usize) {
    for child in children {
        indent(out, depth);
        write_name(out, child.name().unwrap_or(""));
        out.push_str(" = ");
        write_value(out, child.kind(), depth);
        out.push('\n');
    }
}

fn needs_quoting(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    if s.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '-') {
        return true;
    }
    s.chars()
        .any(|c| c.is_whitespace() || "\t ,;=(){}[]/".contains(c))
}

fn write_name(out: &mut String, name: &str) {
    if needs_quoting(name) {
        write_quoted(out, name);
    } else {
        out.push_str(name);
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

fn write_string_value(out: &mut String, s: &str) {
    if s.contains('\n') {
        out.push_str("```");
        out.push_str(s);
        out.push_str("```");
    } else if needs_quoting(s) || matches!(s, "null" | "true" | "false") || s.parse::<f64>().is_ok() {
        write_quoted(out, s);
    } else {
        out.push_str(s);
    }
}

fn write_value(out: &mut String, value: &Kind, depth: usize) {
    match value {
        Kind::Null => out.push_str("null"),
        Kind::Int(v) => {
            let _ = write!(out, "{v}");
        }
        Kind::Dec(v) => {
            let _ = write!(out, "{v}");
        }
        Kind::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        Kind::String(s) => write_string_value(out, s),
        Kind::Vec1([a]) => {
            let _ = write!(out, "({a})");
        }
        Kind::Vec2([a, b]) => {
            let _ = write!(out, "({a} {b})");
        }
        Kind::Vec3([a, b, c]) => {
            let _ = write!(out, "({a} {b} {c})");
        }
        Kind::Vec4([a, b, c, d]) => {
            let _ = write!(out, "({a} {b} {c} {d})");
        }
        Kind::Array(items) => write_array(out, items),
        Kind::Node(children) => write_node(out, children, depth),
    }
}

fn write_array(out: &mut String, items: &[Kvs]) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }
    out.push_str("[ ");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_value(out, item.kind(), 0);
    }
    out.push_str(" ]");
}

fn write_node(out: &mut String, children: &[Kvs], depth: usize) {
    if children.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    write_children(out, children, depth + 1);
    indent(out, depth);
    out.push('}');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn round_trips_through_text() {
        let src = "a = 1\nb = hello\nc = (1 2 3)\nd = [ 1 2 3 ]\ne = {\n\tf = true\n}\n";
        let parsed = parse(src).unwrap();
        let rendered = write(&parsed);
        let reparsed = parse(&rendered).unwrap();
        assert_eq!(parsed, reparsed);
    }

    #[test]
    fn empty_collections_stay_on_one_line() {
        let parsed = parse("a = []\nb = {}\n").unwrap();
        let rendered = write(&parsed);
        assert!(rendered.contains("a = []"));
        assert!(rendered.contains("b = {}"));
    }

    #[test]
    fn strings_needing_quotes_round_trip() {
        let parsed = parse(r#"name = "has space""#).unwrap();
        let rendered = write(&parsed);
        let reparsed = parse(&rendered).unwrap();
        assert_eq!(parsed, reparsed);
    }
}
