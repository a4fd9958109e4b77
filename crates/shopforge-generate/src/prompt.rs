//! User-prompt assembly for generate and refine requests.

use std::fmt::Write as _;

use crate::request::GenerationRequest;

const REQUIREMENTS: &str = "
Requirements:
- React hooks (useState, useEffect, useRef) if needed
- Tailwind CSS only
- Mobile responsive
- Modern design with gradients/shadows
- Realistic content

CRITICAL - OUTPUT FORMAT:
Return ONLY a single valid React component.
NO markdown, NO explanations, NO imports, NO \"use client\"

Exact format:

export default function GeneratedPage() {
  return (
    <div className=\"min-h-screen\">
      ...
    </div>
  );
}
";

/// Builds the user message for `request`.
///
/// A request carrying previous code is a refinement and only restates that
/// code plus the requested changes.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let page_type = request.page_type;
    if let Some(previous) = request.refining() {
        return format!(
            "Refine this {page_type} page:\n\nCURRENT CODE:\n{previous}\n\nCHANGES REQUESTED:\n{}\n\nReturn the updated component in the same format.",
            request.description
        );
    }

    let mut prompt = format!(
        "Generate a {page_type} page for this shop:\n\n{}\n\nMust include these sections:\n",
        request.description
    );
    for (i, section) in page_type.required_sections().iter().enumerate() {
        let _ = writeln!(prompt, "{}. {section}", i + 1);
    }
    if let Some(url) = request.reference() {
        let _ = write!(prompt, "\nDesign inspiration: {url}\n");
    }
    prompt.push_str(REQUIREMENTS);
    prompt
}
