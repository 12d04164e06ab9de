//! HTML rendering of a built report.
//!
//! The page is self-contained apart from the Vega scripts: chart specs are
//! embedded as one JSON blob and mounted with vega-embed.

use serde_json::{Map, Value};

use crate::charts::Artifact;
use crate::data::{DatasetManifest, ImpactType};
use crate::filter::{Controls, SlideFrame};
use crate::report::{Block, HeadingLevel, Report, Section};

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Controls submit back to the server; a static file shows them read-only.
    pub interactive: bool,
    /// Path the control form submits to.
    pub action: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            interactive: false,
            action: "/".to_string(),
        }
    }
}

impl RenderOptions {
    pub fn interactive(action: &str) -> Self {
        Self {
            interactive: true,
            action: action.to_string(),
        }
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Escape, then turn `**text**` pairs into `<strong>`.
pub fn inline_markup(s: &str) -> String {
    let escaped = escape_html(s);
    let mut out = String::with_capacity(escaped.len());
    let mut parts = escaped.split("**");
    if let Some(first) = parts.next() {
        out.push_str(first);
    }
    let rest: Vec<&str> = parts.collect();
    // An unpaired trailing marker is kept literally.
    let paired = rest.len() - rest.len() % 2;
    for (i, part) in rest.iter().enumerate() {
        if i >= paired {
            out.push_str("**");
            out.push_str(part);
        } else if i % 2 == 0 {
            out.push_str("<strong>");
            out.push_str(part);
        } else {
            out.push_str("</strong>");
            out.push_str(part);
        }
    }
    out
}

/// Serialize for a `<script>` element without allowing `</script>` breakouts.
fn script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

pub fn render_html(report: &Report, controls: &Controls, manifests: &[DatasetManifest], opts: &RenderOptions) -> String {
    let mut specs = Map::new();
    for artifact in report.artifacts() {
        if let (Some(id), Some(spec)) = (artifact.id(), artifact.spec()) {
            specs.insert(id.to_string(), spec.as_value().clone());
        }
    }

    let intro: String = report.intro.iter().map(render_block).collect();
    let sections: String = report
        .sections
        .iter()
        .map(|s| render_section(s, controls, opts))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="de">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <style>{css}</style>
  <script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>
</head>
<body>
  <aside class="sidebar">
    <div class="brand">Urban Butcher</div>
    {sidebar}
  </aside>
  <main>
    <h1>{title}</h1>
    <h3 class="subtitle">{subtitle}</h3>
    {intro}
    {sections}
    {footer}
  </main>
  <script>
    const SPECS = {specs};
    for (const [id, spec] of Object.entries(SPECS)) {{
      vegaEmbed('#' + id, spec, {{actions: false}}).catch(console.error);
    }}
  </script>
</body>
</html>
"#,
        title = escape_html(&report.title),
        subtitle = escape_html(&report.subtitle),
        css = CSS,
        sidebar = render_sidebar(controls, opts),
        intro = intro,
        sections = sections,
        footer = render_footer(manifests),
        specs = script_json(&Value::Object(specs)),
    )
}

fn render_sidebar(controls: &Controls, opts: &RenderOptions) -> String {
    let disabled = if opts.interactive { "" } else { " disabled" };
    let checked = |on: bool| if on { " checked" } else { "" };
    let options: String = ImpactType::ALL
        .iter()
        .map(|t| {
            let selected = if controls.filter.impact_types.contains(t) {
                " selected"
            } else {
                ""
            };
            format!(
                r#"<option value="{v}"{sel}>{v}</option>"#,
                v = escape_html(t.label()),
                sel = selected
            )
        })
        .collect();
    let submit = if opts.interactive {
        r#"<button type="submit">Anwenden</button>"#.to_string()
    } else {
        r#"<p class="hint">Statischer Bericht: Filter über den Report-Server ändern.</p>"#.to_string()
    };

    format!(
        r#"<form method="get" action="{action}">
      <h4>Wähle die Produktart um zu vergleichen</h4>
      <label><input type="checkbox" name="animal" value="1"{animal}{disabled}> Tierische Produkte</label>
      <label><input type="checkbox" name="plant" value="1"{plant}{disabled}> Pflanzliche Produkte</label>
      <h4>Wähle den Umwelt-Impact</h4>
      <select name="impact" multiple size="3"{disabled}>{options}</select>
      <h4>Slide {slide} von {last}</h4>
      <input type="range" name="slide" min="{first}" max="{last}" step="1" value="{slide}"{disabled}>
      {submit}
    </form>"#,
        action = escape_html(&opts.action),
        animal = checked(controls.filter.animal),
        plant = checked(controls.filter.plant),
        disabled = disabled,
        options = options,
        slide = controls.slide.get(),
        first = SlideFrame::FIRST.get(),
        last = SlideFrame::LAST.get(),
        submit = submit,
    )
}

fn render_block(block: &Block) -> String {
    match block {
        Block::Paragraph(text) => format!("<p>{}</p>\n", inline_markup(text)),
        Block::Quote(text) => format!("<blockquote>{}</blockquote>\n", inline_markup(text)),
        Block::Bullets(items) => {
            let lis: String = items
                .iter()
                .map(|i| format!("<li>{}</li>", inline_markup(i)))
                .collect();
            format!("<ul>{}</ul>\n", lis)
        }
    }
}

fn render_section(section: &Section, controls: &Controls, opts: &RenderOptions) -> String {
    let heading = match section.level {
        HeadingLevel::Header => format!("<h2 class=\"divider\">{}</h2>", escape_html(&section.heading)),
        HeadingLevel::Subheader => format!("<h3>{}</h3>", escape_html(&section.heading)),
    };
    let blocks: String = section.blocks.iter().map(render_block).collect();
    let artifact = section
        .artifact
        .as_ref()
        .map(|a| render_artifact(a, controls, opts))
        .unwrap_or_default();
    let caption: String = section.caption.iter().map(render_block).collect();
    format!(
        "<section>\n{}\n{}{}{}</section>\n",
        heading, blocks, artifact, caption
    )
}

fn render_artifact(artifact: &Artifact, controls: &Controls, opts: &RenderOptions) -> String {
    match artifact {
        Artifact::Chart { id, .. } => format!("<div class=\"chart\" id=\"{}\"></div>\n", escape_html(id)),
        Artifact::Slideshow { id, frame, .. } => format!(
            "{}<div class=\"chart\" id=\"{}\"></div>\n",
            render_slider(*frame, controls, opts),
            escape_html(id)
        ),
        Artifact::Placeholder { text } => format!("<p class=\"placeholder\">{}</p>\n", escape_html(text)),
    }
}

/// Frame selector. Served reports link each step; static reports show the current one.
fn render_slider(frame: SlideFrame, controls: &Controls, opts: &RenderOptions) -> String {
    let steps: String = SlideFrame::all()
        .map(|f| {
            let class = if f == frame { "step current" } else { "step" };
            if opts.interactive {
                let target = Controls {
                    filter: controls.filter.clone(),
                    slide: f,
                };
                format!(
                    r#"<a class="{}" href="{}?{}">{}</a>"#,
                    class,
                    escape_html(&opts.action),
                    escape_html(&target.to_query()),
                    f.get()
                )
            } else {
                format!(r#"<span class="{}">{}</span>"#, class, f.get())
            }
        })
        .collect();
    format!("<nav class=\"slides\" aria-label=\"Steuerung für die Slide-Show\">{}</nav>\n", steps)
}

fn render_footer(manifests: &[DatasetManifest]) -> String {
    let rows: String = manifests
        .iter()
        .map(|m| {
            format!(
                "<tr><td>{}</td><td class=\"mono\">{}</td><td>{}</td></tr>",
                escape_html(&m.path),
                escape_html(m.hash_sha256.get(..12).unwrap_or(&m.hash_sha256)),
                m.row_count
            )
        })
        .collect();
    format!(
        "<footer><h4>Datenquellen</h4><table><thead><tr><th>Datei</th><th>sha256</th><th>Zeilen</th></tr></thead><tbody>{}</tbody></table></footer>",
        rows
    )
}

const CSS: &str = r#"
    :root { --fg: #31333F; --muted: #808495; --accent: #6B68F9; --side: #F0F2F6; --sans: "Source Sans Pro", Helvetica, Arial, sans-serif; }
    * { box-sizing: border-box; }
    body { margin: 0; font-family: var(--sans); color: var(--fg); display: flex; line-height: 1.6; }
    .sidebar { width: 260px; min-height: 100vh; background: var(--side); padding: 1.5rem 1rem; position: sticky; top: 0; align-self: flex-start; }
    .sidebar .brand { font-weight: 700; font-size: 1.3rem; margin-bottom: 1rem; }
    .sidebar h4 { font-size: 0.9rem; margin: 1rem 0 0.4rem; }
    .sidebar label { display: block; font-size: 0.9rem; }
    .sidebar select { width: 100%; }
    .sidebar button { margin-top: 1rem; padding: 0.3rem 0.9rem; border: 1px solid var(--accent); background: white; color: var(--accent); border-radius: 4px; cursor: pointer; }
    .hint { font-size: 0.75rem; color: var(--muted); }
    main { max-width: 860px; padding: 2rem 3rem; flex: 1; }
    h1 { font-size: 2.4rem; margin: 0 0 0.3rem; }
    .subtitle { font-weight: 400; color: var(--muted); }
    h2.divider { border-bottom: 2px solid #d0d0d8; padding-bottom: 0.3rem; margin-top: 2.5rem; }
    blockquote { border-left: 3px solid var(--accent); margin: 1rem 0; padding-left: 1rem; color: var(--muted); }
    .chart { margin: 1rem 0; overflow-x: auto; }
    .placeholder { padding: 1rem; background: #FFF6E5; border-radius: 4px; }
    .slides { display: flex; gap: 0.4rem; margin: 0.5rem 0; }
    .slides .step { display: inline-block; width: 2rem; text-align: center; border: 1px solid var(--muted); border-radius: 4px; color: var(--muted); text-decoration: none; }
    .slides .step.current { border-color: var(--accent); background: var(--accent); color: white; }
    footer { margin-top: 3rem; font-size: 0.75rem; color: var(--muted); }
    footer table { border-collapse: collapse; width: 100%; }
    footer td, footer th { text-align: left; padding: 0.2rem 0.5rem; border-bottom: 1px solid #e6e6ea; }
    .mono { font-family: monospace; }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn bold_pairs_become_strong() {
        assert_eq!(inline_markup("a **b** c **d**"), "a <strong>b</strong> c <strong>d</strong>");
        assert_eq!(inline_markup("x **y"), "x **y");
        assert_eq!(inline_markup("<b>"), "&lt;b&gt;");
    }

    #[test]
    fn script_json_cannot_close_the_tag() {
        let v = serde_json::json!({"t": "</script><script>alert(1)"});
        assert!(!script_json(&v).contains("</script>"));
    }

    #[test]
    fn static_sidebar_is_read_only() {
        let html = render_sidebar(&Controls::default(), &RenderOptions::default());
        assert!(html.contains(" disabled"));
        assert!(!html.contains("<button"));
        let live = render_sidebar(&Controls::default(), &RenderOptions::interactive("/"));
        assert!(!live.contains(" disabled"));
        assert!(live.contains("<button"));
    }
}
