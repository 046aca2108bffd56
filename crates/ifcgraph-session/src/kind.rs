use ifcgraph_ingest_step::PREAMBLE;
use ifcgraph_model::{GraphError, Result};
use std::fmt;

/// Which backend understands a document, decided from its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Step,
    Ifcx,
}

impl DocumentKind {
    /// `ISO-10303-21;` opens a STEP file, `{` opens an IFCX document. Leading
    /// whitespace and a byte-order mark are ignored. File names are never
    /// consulted.
    pub fn sniff(source_name: &str, text: &str) -> Result<Self> {
        let head = text.trim_start_matches('\u{feff}').trim_start();
        if head.starts_with(PREAMBLE) {
            Ok(DocumentKind::Step)
        } else if head.starts_with('{') {
            Ok(DocumentKind::Ifcx)
        } else {
            Err(GraphError::invalid_format(
                source_name,
                "neither a STEP file nor an IFCX document",
            ))
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Step => f.write_str("step"),
            DocumentKind::Ifcx => f.write_str("ifcx"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_by_content() {
        assert_eq!(
            DocumentKind::sniff("a.json", "ISO-10303-21;\nHEADER;").unwrap(),
            DocumentKind::Step
        );
        assert_eq!(
            DocumentKind::sniff("a.ifc", "\u{feff}  {\"header\":{}}").unwrap(),
            DocumentKind::Ifcx
        );
        assert!(matches!(
            DocumentKind::sniff("a.txt", "hello"),
            Err(GraphError::InvalidFormat { .. })
        ));
    }
}
