//! Markdown rendering (spec.md §4.8, §6 output format) and the restricted
//! Markdown→HTML inline converter the HTML composer uses for prose fields.
//!
//! The converter handles exactly the subset spec.md §4.8 names:
//! `**bold**`, `## H2`, `### H3`, and paragraph breaks on a blank line.
//! Text containing none of those stays byte-identical apart from paragraph
//! wrapping (testable property 8).

use crate::types::NewsletterContent;

/// Renders the full Markdown newsletter (spec.md §6): Executive Summary,
/// per-topic sections, Glossary, Metadata Footer, in that order.
pub fn render_markdown(content: &NewsletterContent) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {} — Research Newsletter\n\n", content.main_topic));
    out.push_str("## Executive Summary\n\n");
    out.push_str(content.executive_summary.trim());
    out.push_str("\n\n");

    for topic in &content.topics {
        out.push_str(&format!("## {}\n\n", topic.topic_name));
        out.push_str(topic.overview.trim());
        out.push_str("\n\n");

        if !topic.key_findings.is_empty() {
            out.push_str("### Key Findings\n\n");
            for finding in &topic.key_findings {
                out.push_str(&format!("- {finding}\n"));
            }
            out.push('\n');
        }

        if !topic.notable_trends.is_empty() {
            out.push_str("### Notable Trends\n\n");
            for trend in &topic.notable_trends {
                out.push_str(&format!("- {trend}\n"));
            }
            out.push('\n');
        }

        if !topic.top_articles.is_empty() {
            out.push_str("### Top Articles\n\n");
            for article in &topic.top_articles {
                let relevance = article.relevance_score.map(|r| format!(" (relevance {r:.2})")).unwrap_or_default();
                let source = article.source.as_deref().map(|s| format!(" — {s}")).unwrap_or_default();
                out.push_str(&format!("- [{}]({}){}{}\n", article.title, article.url, source, relevance));
            }
            out.push('\n');
        }
    }

    if !content.glossary.is_empty() {
        out.push_str("## Glossary\n\n");
        for entry in &content.glossary {
            out.push_str(&format!("**{}** ({}) — {}\n", entry.term, entry.entity_type_label, entry.definition));
            if !entry.related.is_empty() {
                out.push_str(&format!("  Related: {}\n", entry.related.join(", ")));
            }
            out.push('\n');
        }
    }

    out.push_str("---\n\n");
    out.push_str(&format!(
        "Generated {} · run `{}`\n",
        content.generated_at.format("%Y-%m-%d %H:%M UTC"),
        content.run_id
    ));

    out
}

/// Converts the restricted Markdown subset to HTML: `**bold**` to `<strong>`,
/// `## ` / `### ` headings, and blank-line paragraph breaks. Anything else
/// passes through unescaped beyond the minimal entity escaping needed for
/// valid HTML.
pub fn md_inline_to_html(text: &str) -> String {
    let paragraphs: Vec<&str> = text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()).collect();

    paragraphs
        .into_iter()
        .map(|p| {
            if let Some(heading) = p.strip_prefix("### ") {
                format!("<h3>{}</h3>", render_bold(&escape_html(heading)))
            } else if let Some(heading) = p.strip_prefix("## ") {
                format!("<h2>{}</h2>", render_bold(&escape_html(heading)))
            } else {
                format!("<p>{}</p>", render_bold(&escape_html(p)))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Replaces `**bold**` spans with `<strong>`. Operates after HTML-escaping
/// so the `**` delimiters themselves never collide with escaped entities.
fn render_bold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        match rest.find("**") {
            None => {
                out.push_str(rest);
                break;
            }
            Some(start) => {
                let after = &rest[start + 2..];
                match after.find("**") {
                    None => {
                        out.push_str(rest);
                        break;
                    }
                    Some(end) => {
                        out.push_str(&rest[..start]);
                        out.push_str("<strong>");
                        out.push_str(&after[..end]);
                        out.push_str("</strong>");
                        rest = &after[end + 2..];
                    }
                }
            }
        }
    }
    out
}
