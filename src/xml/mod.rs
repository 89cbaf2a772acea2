//! Platform XML wire codec.
//!
//! # Data Flow
//! ```text
//! inbound body (text)
//!     → parse.rs (quick-xml events → simplified tree)
//!     → Message { ToUserName, FromUserName, CreateTime, MsgType, ... }
//!
//! reply Message
//!     → build.rs (CDATA strings, plain numbers, <item> arrays)
//!     → <xml>...</xml>
//! ```
//!
//! # Design Decisions
//! - Leaf kind is a tag on the value (`Text` vs `Number`), not a marker key
//! - Parsing never fails loudly: anything malformed reads as "no message"
//! - Arrays round-trip through `<item>` children of the array's own element

pub mod build;
pub mod parse;
pub mod value;

pub use build::{build, build_element, ITEM, ROOT};
pub use parse::parse;
pub use value::{Message, XmlValue};

/// Parse a document and return the fields of its `<xml>` root.
pub fn parse_root(text: &str) -> Option<Message> {
    parse(text)?.remove(ROOT)?.into_object()
}
