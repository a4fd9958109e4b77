//! Builds the standalone document an isolated context executes.
//!
//! The transform is total: malformed component bodies still produce a
//! document, and their faults surface later over the boundary channel.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::DocumentAssets;
use crate::protocol::ERROR_MESSAGE_TYPE;
use crate::source::{CandidateSource, PreviewDocument};

/// Mounted when the body does not name its default-exported component.
pub const DEFAULT_COMPONENT_NAME: &str = "GeneratedPage";

static IMPORT_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*import\s+(?:[\w*{}\s,$]+?\s+from\s+)?['"][^'"\n]+['"][ \t]*;?[ \t]*(?:\r?\n)?"#,
    )
    .expect("valid regex")
});
static REQUIRE_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*(?:const|let|var)\s+[\w{}\s,:$]+?=\s*require\(\s*['"][^'"\n]+['"]\s*\)[ \t]*;?[ \t]*(?:\r?\n)?"#,
    )
    .expect("valid regex")
});
static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*['"]use (?:client|server|strict)['"][ \t]*;?[ \t]*(?:\r?\n)?"#)
        .expect("valid regex")
});
static ANONYMOUS_DEFAULT_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"export\s+default\s+(async\s+)?function\s*\(").expect("valid regex")
});
static DEFAULT_EXPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"export\s+default\s+").expect("valid regex"));
static NAMED_EXPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)export\s+((?:async\s+)?(?:function|const|let|var|class)\b)")
        .expect("valid regex")
});
static DEFAULT_FUNCTION_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"export\s+default\s+(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)")
        .expect("valid regex")
});
static DEFAULT_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)export\s+default\s+([A-Za-z_$][\w$]*)\s*(?:;|$)").expect("valid regex")
});
static SCRIPT_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</script").expect("valid regex"));

/// Builds a preview document with the default CDN assets.
pub fn build_preview_document(source: &CandidateSource) -> PreviewDocument {
    build_preview_document_with(source, &DocumentAssets::default())
}

pub fn build_preview_document_with(
    source: &CandidateSource,
    assets: &DocumentAssets,
) -> PreviewDocument {
    let component = component_name(source.as_str());
    let body = clean_component_body(source.as_str());
    let html = render_template(&body, &component, assets);
    debug!(
        event = "preview.document_built",
        domain = "preview",
        component = component.as_str(),
        body_len = body.len() as u64,
        document_len = html.len() as u64
    );
    PreviewDocument::new(html)
}

/// Name of the component the document mounts.
pub fn component_name(code: &str) -> String {
    if let Some(caps) = DEFAULT_FUNCTION_NAME.captures(code) {
        return caps[1].to_string();
    }
    match DEFAULT_IDENTIFIER.captures(code) {
        Some(caps) if !matches!(&caps[1], "function" | "class" | "async") => caps[1].to_string(),
        _ => DEFAULT_COMPONENT_NAME.to_string(),
    }
}

/// Strips module-level statements so the body runs as a classic script:
/// imports, `require` bindings, `"use client"`-style directives and export
/// markers. Script-closing tags are escaped.
pub fn clean_component_body(code: &str) -> String {
    let code = IMPORT_STATEMENT.replace_all(code, "");
    let code = REQUIRE_STATEMENT.replace_all(&code, "");
    let code = DIRECTIVE.replace_all(&code, "");
    let code = ANONYMOUS_DEFAULT_FUNCTION
        .replace_all(&code, format!("${{1}}function {DEFAULT_COMPONENT_NAME}(").as_str());
    let code = DEFAULT_EXPORT.replace_all(&code, "");
    let code = NAMED_EXPORT.replace_all(&code, "$1$2");
    let code = SCRIPT_CLOSE.replace_all(&code, r"<\/script");
    code.trim().to_string()
}

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Preview</title>
"#;

const STYLE: &str = r#"  <style>
    body { margin: 0; padding: 0; overflow-x: hidden; }
    * { box-sizing: border-box; }
  </style>
</head>
<body>
  <div id="root"></div>
"#;

fn fault_harness() -> String {
    format!(
        r#"  <script>
    window.__previewReport = function (message) {{
      window.parent.postMessage({{ type: '{ERROR_MESSAGE_TYPE}', message: String(message) }}, '*');
    }};
    window.addEventListener('error', function (e) {{
      console.error('Preview error:', e.error);
      window.__previewReport((e.error && e.error.message) || e.message || 'Unknown error');
    }});
    window.addEventListener('unhandledrejection', function (e) {{
      console.error('Promise rejection:', e.reason);
      window.__previewReport((e.reason && e.reason.message) || 'Promise rejected');
    }});
  </script>
"#
    )
}

fn render_template(body: &str, component: &str, assets: &DocumentAssets) -> String {
    let mut html = String::with_capacity(body.len() + 3_072);
    html.push_str(HEAD);
    html.push_str(&script_tag(&assets.style_script_url, false));
    html.push_str(STYLE);
    html.push_str(&fault_harness());
    html.push_str(&script_tag(&assets.runtime_script_url, true));
    html.push_str(&script_tag(&assets.dom_script_url, true));
    html.push_str(&script_tag(&assets.transpiler_script_url, false));
    html.push_str(
        r#"  <script type="text/babel">
    const { useState, useEffect, useRef } = React;

    try {
"#,
    );
    for line in body.lines() {
        html.push_str("      ");
        html.push_str(line);
        html.push('\n');
    }
    html.push_str(&format!(
        r#"
      const root = ReactDOM.createRoot(document.getElementById('root'));
      root.render(<{component} />);
    }} catch (err) {{
      console.error('Preview render error:', err);
      var message = err && err.message ? err.message : String(err);
      window.__previewReport(message);
      var fallback = document.createElement('div');
      fallback.style.padding = '20px';
      fallback.style.color = 'red';
      fallback.textContent = 'Error: ' + message;
      var mount = document.getElementById('root');
      mount.innerHTML = '';
      mount.appendChild(fallback);
    }}
  </script>
</body>
</html>
"#
    ));
    html
}

fn script_tag(src: &str, crossorigin: bool) -> String {
    let src = src.replace('"', "&quot;");
    if crossorigin {
        format!("  <script crossorigin src=\"{src}\"></script>\n")
    } else {
        format!("  <script src=\"{src}\"></script>\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(code: &str) -> CandidateSource {
        CandidateSource::from_trusted(code)
    }

    #[test]
    fn strips_imports_directives_and_default_export() {
        let code = "\"use client\";\nimport React, { useState } from \"react\";\nimport Link from 'next/link';\nimport {\n  motion,\n} from 'framer-motion';\nimport './page.css';\n\nexport default function GeneratedPage() {\n  return <div className=\"p-4\" />;\n}";
        assert_eq!(
            clean_component_body(code),
            "function GeneratedPage() {\n  return <div className=\"p-4\" />;\n}"
        );
    }

    #[test]
    fn strips_require_bindings() {
        let code = "const React = require('react');\nconst { useMemo } = require(\"react\");\nexport default function P() { return null; }";
        assert_eq!(clean_component_body(code), "function P() { return null; }");
    }

    #[test]
    fn keeps_inner_text_that_mentions_imports() {
        let code = "export default function P() {\n  return <p className=\"x\">import data from files</p>;\n}";
        assert!(clean_component_body(code).contains("import data from files"));
    }

    #[test]
    fn named_exports_become_plain_declarations() {
        let code = "export const Card = () => <div />;\nexport default function P() { return <Card />; }";
        assert_eq!(
            clean_component_body(code),
            "const Card = () => <div />;\nfunction P() { return <Card />; }"
        );
    }

    #[test]
    fn mounts_the_declared_component_name() {
        assert_eq!(component_name("export default function Landing() {}"), "Landing");
        assert_eq!(
            component_name("const Shop = () => null;\nexport default Shop;"),
            "Shop"
        );
        assert_eq!(
            component_name("export default function () {}"),
            DEFAULT_COMPONENT_NAME
        );
        let doc = build_preview_document(&source("export default function Landing() { return null; }"));
        assert!(doc.as_str().contains("root.render(<Landing />);"));
    }

    #[test]
    fn anonymous_default_function_is_named() {
        assert_eq!(
            clean_component_body("export default function () { return null; }"),
            "function GeneratedPage() { return null; }"
        );
    }

    #[test]
    fn document_contains_runtime_harness_and_body() {
        let doc = build_preview_document(&source(
            "export default function GeneratedPage(){return <div className=\"p-4\">Hi</div>;}",
        ));
        let html = doc.as_str();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<div id=\"root\"></div>"));
        assert!(html.contains("react@18/umd/react.production.min.js"));
        assert!(html.contains("@babel/standalone"));
        assert!(html.contains("cdn.tailwindcss.com"));
        assert!(html.contains("function GeneratedPage(){return <div className=\"p-4\">Hi</div>;}"));
        assert!(!html.contains("export default"));
        assert!(html.contains("addEventListener('error'"));
        assert!(html.contains("addEventListener('unhandledrejection'"));
        assert!(html.contains("type: 'iframe-error'"));
        assert!(html.contains("} catch (err) {"));
    }

    #[test]
    fn harness_is_installed_before_the_component_script() {
        let html = build_preview_document(&source("export default function P(){}")).into_string();
        let harness = html.find("window.__previewReport = function").expect("harness");
        let component = html.find("type=\"text/babel\"").expect("component script");
        assert!(harness < component);
    }

    #[test]
    fn build_is_total_over_broken_source() {
        for code in [
            "",
            "export default function (",
            "}}}{{{ ``` </script><script>alert(1)</script>",
            "export default",
            "\u{0}\u{7f} import from",
        ] {
            let doc = build_preview_document(&source(code));
            assert!(doc.as_str().ends_with("</html>\n"), "{code:?}");
        }
    }

    #[test]
    fn script_close_tags_in_body_are_escaped() {
        let doc = build_preview_document(&source(
            "export default function P(){ return <div className=\"a\">{'</script>'}</div>; }",
        ));
        assert_eq!(doc.as_str().matches("</script>").count(), 6);
        assert!(doc.as_str().contains(r"<\/script>"));
    }

    #[test]
    fn custom_assets_are_used() {
        let assets = DocumentAssets {
            runtime_script_url: "http://localhost:9000/react.js".into(),
            ..DocumentAssets::default()
        };
        let doc = build_preview_document_with(&source("export default function P(){}"), &assets);
        assert!(doc.as_str().contains("<script crossorigin src=\"http://localhost:9000/react.js\">"));
    }
}
