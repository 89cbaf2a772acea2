//! Message → XML serialization.

use std::fmt::Write;

use crate::xml::value::{Message, XmlValue};

/// Root element name of every platform document.
pub const ROOT: &str = "xml";

/// Element name used for array members.
pub const ITEM: &str = "item";

const INDENT: &str = "  ";

/// Serialize a message as an `<xml>` document.
pub fn build(message: &Message) -> String {
    build_element(ROOT, &XmlValue::Object(message.clone()))
}

/// Serialize a single value under an arbitrary element name.
pub fn build_element(name: &str, value: &XmlValue) -> String {
    let mut out = String::new();
    write_element(&mut out, name, value, 0);
    out
}

fn write_element(out: &mut String, name: &str, value: &XmlValue, depth: usize) {
    match value {
        XmlValue::Null => {
            indent(out, depth);
            let _ = writeln!(out, "<{name}/>");
        }
        XmlValue::Text(s) => {
            indent(out, depth);
            let _ = writeln!(out, "<{name}>{}</{name}>", cdata(s));
        }
        XmlValue::Number(n) => {
            indent(out, depth);
            let _ = writeln!(out, "<{name}>{n}</{name}>");
        }
        XmlValue::Array(items) if name == ITEM => {
            for item in items {
                write_element(out, ITEM, item, depth);
            }
        }
        XmlValue::Array(items) => {
            if items.is_empty() {
                indent(out, depth);
                let _ = writeln!(out, "<{name}/>");
                return;
            }
            indent(out, depth);
            let _ = writeln!(out, "<{name}>");
            for item in items {
                write_element(out, ITEM, item, depth + 1);
            }
            indent(out, depth);
            let _ = writeln!(out, "</{name}>");
        }
        XmlValue::Object(m) => {
            if m.is_empty() {
                indent(out, depth);
                let _ = writeln!(out, "<{name}/>");
                return;
            }
            indent(out, depth);
            let _ = writeln!(out, "<{name}>");
            for (key, child) in m.iter() {
                write_element(out, key, child, depth + 1);
            }
            indent(out, depth);
            let _ = writeln!(out, "</{name}>");
        }
    }
    // The outermost element carries no trailing newline.
    if depth == 0 && out.ends_with('\n') {
        out.pop();
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Wrap text in CDATA, splitting any embedded terminator.
fn cdata(s: &str) -> String {
    format!("<![CDATA[{}]]>", s.replace("]]>", "]]]]><![CDATA[>"))
}
