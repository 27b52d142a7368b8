//! Context building for RAG responses.

use crate::chunking::Passage;

/// Format retrieved passages for the prompt, in ranked order.
///
/// Each passage gets a provenance line followed by its text; passages are
/// separated by blank lines.
pub fn format_context_for_prompt(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| format!("[Source: {}, page {}]\n{}", p.source, p.page, p.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_layout() {
        let passages = vec![
            Passage::new("Revenue rose 12%.", 3, "report.pdf"),
            Passage::new("Costs were flat.", 7, "report.pdf"),
        ];

        let context = format_context_for_prompt(&passages);
        assert_eq!(
            context,
            "[Source: report.pdf, page 3]\nRevenue rose 12%.\n\n[Source: report.pdf, page 7]\nCosts were flat."
        );
    }

    #[test]
    fn test_empty_context() {
        assert_eq!(format_context_for_prompt(&[]), "");
    }
}
