//! Command handlers, one module per subcommand.

pub mod categories;
pub mod documents;
pub mod elements;
pub mod label;
pub mod recommend;
pub mod search;
pub mod status;

use crate::output::{Renderable, pretty_kv, pretty_rule, snippet};
use sleuth_core::model::Element;
use std::io::{self, Write};

/// Shared row rendering for every element-listing command.
pub struct ElementRow(pub Element);

impl Renderable for ElementRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_kv(w, "element", &self.0.id)?;
        pretty_kv(w, "document", &self.0.docid)?;
        pretty_kv(w, "text", snippet(&self.0.text, 120))?;
        pretty_rule(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(w, &self.0).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}",
            self.0.id,
            self.0.docid,
            snippet(&self.0.text, 80)
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "document", "text"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ElementRow {
        ElementRow(Element {
            id: "d0-3".into(),
            docid: "d0".into(),
            text: "The claim was   filed\nlate.".into(),
        })
    }

    #[test]
    fn table_row_is_tab_separated_and_flattened() {
        let mut buf = Vec::new();
        row().render_table(&mut buf).expect("render");
        let line = String::from_utf8(buf).expect("utf8");
        assert_eq!(line, "d0-3\td0\tThe claim was filed late.\n");
    }

    #[test]
    fn json_row_keeps_wire_field_names() {
        let mut buf = Vec::new();
        row().render_json(&mut buf).expect("render");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(value["id"], "d0-3");
        assert_eq!(value["docid"], "d0");
    }
}
