//! Server-side HTML and SVG rendering.

mod chart;
mod page;

pub use chart::{render_scatter, ChartLayout};
pub use page::{render_dashboard, PageMeta};

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Avatar text for heroes without a portrait: the first two characters of
/// the name, uppercased.
pub fn initials(name: &str) -> String {
    name.trim()
        .chars()
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

const STYLE: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; background: #0f172a; color: #e2e8f0; }
main { max-width: 1180px; margin: 0 auto; padding: 24px; }
a { color: #93c5fd; }
header { display: flex; justify-content: space-between; align-items: baseline; flex-wrap: wrap; gap: 12px; }
header p { margin: 4px 0; color: #94a3b8; font-size: 14px; }
.card { background: rgba(255,255,255,0.05); border: 1px solid rgba(255,255,255,0.1); border-radius: 12px; padding: 16px; margin-top: 20px; }
form.filters { display: flex; gap: 12px; flex-wrap: wrap; align-items: end; }
form.filters label { display: flex; flex-direction: column; font-size: 12px; color: #94a3b8; gap: 4px; }
select, input, button { background: #1e293b; color: #e2e8f0; border: 1px solid #334155; border-radius: 6px; padding: 6px 10px; }
.regions { display: flex; gap: 8px; flex-wrap: wrap; align-items: center; }
.region { text-decoration: none; border: 1px solid #334155; border-radius: 999px; padding: 4px 12px; color: #94a3b8; font-size: 13px; }
.region.active { color: #0f172a; font-weight: 600; }
.swatch { display: inline-block; width: 10px; height: 10px; border-radius: 50%; margin-right: 6px; }
table { width: 100%; border-collapse: collapse; font-size: 14px; }
th, td { text-align: left; padding: 8px; border-bottom: 1px solid rgba(255,255,255,0.08); vertical-align: middle; }
th a { color: inherit; text-decoration: none; }
tr.highlight { background: rgba(147,197,253,0.12); }
.hero { display: flex; align-items: center; gap: 10px; }
.hero img, .avatar { width: 36px; height: 36px; border-radius: 8px; object-fit: cover; }
.hero small { display: block; color: #94a3b8; font-size: 11px; }
.avatar { display: inline-flex; align-items: center; justify-content: center; background: #334155; font-size: 12px; font-weight: 600; }
.relations { display: flex; flex-direction: column; gap: 4px; }
.badge { display: inline-block; background: #1e293b; border: 1px solid #334155; border-radius: 6px; padding: 1px 6px; margin-right: 4px; font-size: 12px; }
.relation-label { color: #94a3b8; font-size: 11px; margin-right: 6px; }
.more { color: #94a3b8; font-size: 12px; }
.empty { color: #94a3b8; text-align: center; padding: 32px 0; }
.error { color: #fecaca; }
"#;

/// Wrap body markup in a full HTML document.
pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{}</title>
<style>{}</style>
</head>
<body>
<main>
{}
</main>
</body>
</html>"#,
        escape_html(title),
        STYLE,
        body
    )
}

/// Full page shown when the upstream cannot be reached.
pub fn render_error_page(title: &str, message: &str) -> String {
    let body = format!(
        r#"<header><h1>MLBB Hero Meta</h1></header>
<section class="card">
<h2 class="error">{}</h2>
<p>{}</p>
<p><a href="/">Try again</a></p>
</section>"#,
        escape_html(title),
        escape_html(message)
    );
    layout(title, &body)
}
