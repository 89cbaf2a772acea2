//! XML → message tree parsing.
//!
//! The tree is simplified while it is built: leaves become scalars, elements
//! made only of `<item>` children become arrays, and repeated sibling names
//! fold into an array at the position of their first occurrence.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::xml::build::ITEM;
use crate::xml::value::{Message, XmlValue};

enum Segment {
    Text(String),
    CData(String),
}

/// An element still waiting for its end tag.
struct Frame {
    name: String,
    children: Vec<(String, XmlValue)>,
    segments: Vec<Segment>,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
            segments: Vec::new(),
        }
    }

    fn finish(self) -> (String, XmlValue) {
        let value = if self.children.is_empty() {
            leaf(self.segments)
        } else {
            group(self.children)
        };
        (self.name, value)
    }
}

/// Deepest element nesting accepted. Platform messages stay within a few levels.
pub const MAX_DEPTH: usize = 64;

/// Parse a document into a one-entry map of `root name → value`.
///
/// Returns `None` for anything that is not a single well-formed element tree,
/// or that nests deeper than [`MAX_DEPTH`].
pub fn parse(text: &str) -> Option<Message> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, XmlValue)> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(error = %e, position = reader.buffer_position(), "Malformed XML");
                return None;
            }
        };

        match event {
            Event::Start(e) => {
                if stack.is_empty() && root.is_some() {
                    return None;
                }
                if stack.len() >= MAX_DEPTH {
                    tracing::debug!(max_depth = MAX_DEPTH, "XML nested too deeply");
                    return None;
                }
                stack.push(Frame::new(element_name(e.name().as_ref())?));
            }
            Event::Empty(e) => {
                let name = element_name(e.name().as_ref())?;
                attach(&mut stack, &mut root, name, XmlValue::Null)?;
            }
            Event::End(_) => {
                let (name, value) = stack.pop()?.finish();
                attach(&mut stack, &mut root, name, value)?;
            }
            Event::Text(e) => {
                let text = e.unescape().ok()?.into_owned();
                match stack.last_mut() {
                    Some(frame) => frame.segments.push(Segment::Text(text)),
                    None if text.trim().is_empty() => {}
                    None => return None,
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8(e.into_inner().into_owned()).ok()?;
                stack.last_mut()?.segments.push(Segment::CData(text));
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if !stack.is_empty() {
        return None;
    }
    let (name, value) = root?;
    Some(Message::new().with(name, value))
}

fn element_name(raw: &[u8]) -> Option<String> {
    std::str::from_utf8(raw).ok().map(str::to_string)
}

fn attach(
    stack: &mut [Frame],
    root: &mut Option<(String, XmlValue)>,
    name: String,
    value: XmlValue,
) -> Option<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push((name, value)),
        None if root.is_none() => *root = Some((name, value)),
        None => return None,
    }
    Some(())
}

fn leaf(segments: Vec<Segment>) -> XmlValue {
    let has_cdata = segments.iter().any(|s| matches!(s, Segment::CData(_)));
    if has_cdata {
        let text = segments
            .into_iter()
            .filter_map(|s| match s {
                Segment::CData(t) => Some(t),
                Segment::Text(t) if !t.trim().is_empty() => Some(t),
                Segment::Text(_) => None,
            })
            .collect();
        return XmlValue::Text(text);
    }

    let text: String = segments
        .into_iter()
        .map(|s| match s {
            Segment::Text(t) | Segment::CData(t) => t,
        })
        .collect();
    if text.is_empty() {
        XmlValue::Null
    } else if is_numeric_literal(&text) {
        XmlValue::Number(text)
    } else {
        XmlValue::Text(text)
    }
}

fn group(children: Vec<(String, XmlValue)>) -> XmlValue {
    if children.iter().all(|(name, _)| name == ITEM) {
        return XmlValue::Array(children.into_iter().map(|(_, v)| v).collect());
    }

    let mut grouped: Vec<(String, Vec<XmlValue>)> = Vec::new();
    for (name, value) in children {
        match grouped.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => grouped.push((name, vec![value])),
        }
    }

    XmlValue::Object(
        grouped
            .into_iter()
            .map(|(name, mut values)| {
                let value = if values.len() == 1 {
                    values.remove(0)
                } else {
                    XmlValue::Array(values)
                };
                (name, value)
            })
            .collect(),
    )
}

/// `-?digits(.digits)?`
fn is_numeric_literal(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    all_digits(int) && frac.map_or(true, all_digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT_MESSAGE: &str = "<xml><ToUserName><![CDATA[gh_39993584375c]]></ToUserName>\n<FromUserName><![CDATA[oP8vYt86psFCDN_YWUaZpPhOQDTk]]></FromUserName>\n<CreateTime>1555664951</CreateTime>\n<MsgType><![CDATA[text]]></MsgType>\n<Content><![CDATA[hi]]></Content>\n<MsgId>22271766593385610</MsgId>\n</xml>";

    fn root(text: &str) -> Message {
        parse(text)
            .and_then(|mut doc| doc.remove("xml"))
            .and_then(XmlValue::into_object)
            .unwrap()
    }

    #[test]
    fn test_parse_text_message() {
        let msg = root(TEXT_MESSAGE);
        assert_eq!(msg.get_str("ToUserName"), Some("gh_39993584375c"));
        assert_eq!(msg.get("CreateTime"), Some(&XmlValue::Number("1555664951".into())));
        assert_eq!(msg.get("MsgId").and_then(XmlValue::as_u64), Some(22271766593385610));
        assert_eq!(msg.get_str("Content"), Some("hi"));
        assert_eq!(msg.len(), 6);
    }

    #[test]
    fn test_malformed_input() {
        assert!(parse("").is_none());
        assert!(parse("xxxx").is_none());
        assert!(parse("<xml><a>1</b></xml>").is_none());
        assert!(parse("<xml><a>1</a>").is_none());
        assert!(parse("<xml></xml><xml></xml>").is_none());
        assert!(parse("<xml></xml>trailing").is_none());
    }

    #[test]
    fn test_other_root_is_returned_as_is() {
        let doc = parse("<x></x>").unwrap();
        assert!(doc.get("xml").is_none());
        assert_eq!(doc.get("x"), Some(&XmlValue::Null));
    }

    #[test]
    fn test_declaration_and_whitespace_are_ignored() {
        let msg = root("<?xml version=\"1.0\"?>\n<xml>\n  <A>  </A>\n  <B>x &amp; y</B>\n  <C/>\n</xml>\n");
        assert_eq!(msg.get_str("A"), Some("  "));
        assert_eq!(msg.get_str("B"), Some("x & y"));
        assert_eq!(msg.get("C"), Some(&XmlValue::Null));
    }

    #[test]
    fn test_items_become_arrays() {
        let msg = root("<xml><Articles><item><Title><![CDATA[a]]></Title></item></Articles></xml>");
        let articles = msg.get("Articles").and_then(XmlValue::as_array).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].as_object().and_then(|a| a.get_str("Title")), Some("a"));
    }

    #[test]
    fn test_repeated_siblings_fold() {
        let msg = root("<xml><A>1</A><B>x</B><A>2</A></xml>");
        let keys: Vec<_> = msg.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(
            msg.get("A"),
            Some(&XmlValue::Array(vec![XmlValue::Number("1".into()), XmlValue::Number("2".into())]))
        );
    }

    #[test]
    fn test_numeric_literal() {
        assert!(is_numeric_literal("0"));
        assert!(is_numeric_literal("-12.50"));
        assert!(!is_numeric_literal("1e5"));
        assert!(!is_numeric_literal("1."));
        assert!(!is_numeric_literal("-"));
        assert!(!is_numeric_literal(" 1"));
    }

    fn nested(depth: usize) -> String {
        format!("<xml>{}{}</xml>", "<a>".repeat(depth), "</a>".repeat(depth))
    }

    #[test]
    fn test_depth_limit() {
        assert!(parse(&nested(MAX_DEPTH - 1)).is_some());
        assert_eq!(parse(&nested(MAX_DEPTH)), None);
        assert_eq!(parse(&nested(120_000)), None);
    }
}
