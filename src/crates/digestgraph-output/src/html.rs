//! Self-contained HTML rendering (spec.md §4.8): a single file with the
//! cover image and charts embedded as base64 data URIs, so the output needs
//! no companion assets.

use crate::markdown::md_inline_to_html;
use crate::types::NewsletterContent;

/// Chart display order and labels (spec.md §4.8 analytics section). A chart
/// missing from `charts_base64` is silently omitted, never rendered as a
/// broken image.
const CHART_ORDER: &[(&str, &str)] = &[
    ("distribution", "Relevance Distribution"),
    ("quality_gauge", "Overall Quality"),
    ("quality_by_topic", "Quality by Topic"),
    ("dashboard", "Dashboard"),
];

/// Renders the full self-contained HTML document (spec.md §4.8): cover
/// image, executive summary, one section per topic, analytics, glossary —
/// in that order (testable property 6).
pub fn render_html(
    content: &NewsletterContent,
    cover_base64: Option<&str>,
    charts_base64: &std::collections::HashMap<String, String>,
) -> String {
    let mut body = String::new();

    if let Some(cover) = cover_base64 {
        body.push_str(&format!(
            "<section class=\"cover\"><img alt=\"cover\" src=\"data:image/png;base64,{cover}\"></section>\n"
        ));
    }

    body.push_str("<section class=\"executive-summary\">\n<h2>Executive Summary</h2>\n");
    body.push_str(&md_inline_to_html(&content.executive_summary));
    body.push_str("\n</section>\n");

    for topic in &content.topics {
        body.push_str(&render_topic_section(topic));
    }

    body.push_str(&render_analytics_section(&content.metrics, charts_base64));
    body.push_str(&render_glossary_section(&content.glossary));

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{} — Research Newsletter</title>\n<style>{}</style>\n</head>\n<body>\n<h1>{} — Research Newsletter</h1>\n{}\n<footer>Generated {} · run {}</footer>\n</body>\n</html>\n",
        escape(&content.main_topic),
        STYLE,
        escape(&content.main_topic),
        body,
        content.generated_at.format("%Y-%m-%d %H:%M UTC"),
        escape(&content.run_id),
    )
}

fn render_topic_section(topic: &crate::types::TopicSection) -> String {
    let mut s = format!("<section class=\"topic\">\n<h2>{}</h2>\n", escape(&topic.topic_name));
    s.push_str(&md_inline_to_html(&topic.overview));

    if !topic.key_findings.is_empty() {
        s.push_str("<h3>Key Findings</h3>\n<ol>\n");
        for f in &topic.key_findings {
            s.push_str(&format!("<li>{}</li>\n", escape(f)));
        }
        s.push_str("</ol>\n");
    }

    if !topic.notable_trends.is_empty() {
        s.push_str("<h3>Notable Trends</h3>\n<ol>\n");
        for t in &topic.notable_trends {
            s.push_str(&format!("<li>{}</li>\n", escape(t)));
        }
        s.push_str("</ol>\n");
    }

    if !topic.top_articles.is_empty() {
        s.push_str("<h3>Top Articles</h3>\n<ul class=\"articles\">\n");
        for a in &topic.top_articles {
            let badge = a
                .relevance_score
                .map(|r| format!("<span class=\"badge\">{r:.2}</span>"))
                .unwrap_or_default();
            let source = a.source.as_deref().map(|s| format!(" <span class=\"source\">{}</span>", escape(s))).unwrap_or_default();
            s.push_str(&format!(
                "<li><a href=\"{}\">{}</a>{}{}</li>\n",
                escape(&a.url),
                escape(&a.title),
                source,
                badge
            ));
        }
        s.push_str("</ul>\n");
    }

    if let Some(review) = &topic.review {
        s.push_str(&format!("<p class=\"quality-badge\">Quality: {:.2}</p>\n", review.score));
    }

    s.push_str("</section>\n");
    s
}

fn render_analytics_section(metrics: &crate::types::MetricsSummary, charts_base64: &std::collections::HashMap<String, String>) -> String {
    let mut s = String::from("<section class=\"analytics\">\n<h2>Analytics</h2>\n");
    s.push_str(&format!(
        "<p>{} articles analyzed, average quality {:.2}.</p>\n",
        metrics.total_articles, metrics.avg_quality
    ));
    for (key, label) in CHART_ORDER {
        if let Some(data) = charts_base64.get(*key) {
            s.push_str(&format!(
                "<figure class=\"chart\"><img alt=\"{label}\" src=\"data:image/png;base64,{data}\"><figcaption>{label}</figcaption></figure>\n"
            ));
        }
    }
    s.push_str("</section>\n");
    s
}

fn render_glossary_section(glossary: &[crate::types::GlossarySection]) -> String {
    if glossary.is_empty() {
        return String::new();
    }
    let mut s = String::from("<section class=\"glossary\">\n<h2>Glossary</h2>\n<dl>\n");
    for entry in glossary {
        s.push_str(&format!(
            "<dt>{} <span class=\"type-badge\">{}</span></dt>\n<dd>{}",
            escape(&entry.term),
            escape(&entry.entity_type_label),
            escape(&entry.definition)
        ));
        if !entry.related.is_empty() {
            s.push_str(&format!(" <em>Related: {}</em>", escape(&entry.related.join(", "))));
        }
        s.push_str("</dd>\n");
    }
    s.push_str("</dl>\n</section>\n");
    s
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

const STYLE: &str = "body{font-family:Georgia,serif;max-width:860px;margin:2rem auto;color:#1a1a1a;line-height:1.6}h1,h2,h3{font-family:Helvetica,Arial,sans-serif}section{margin-bottom:2.5rem}.badge{background:#eef;border-radius:4px;padding:0 .4rem;margin-left:.4rem;font-size:.85em}.source{color:#666;font-size:.85em}.quality-badge{font-weight:bold}figure.chart{display:inline-block;margin:.5rem}figure.chart img{max-width:380px}.type-badge{font-size:.75em;color:#555;text-transform:uppercase}footer{color:#888;font-size:.85em;border-top:1px solid #ddd;padding-top:1rem}";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArticleRef, GlossarySection, MetricsSummary, TopicSection};
    use chrono::Utc;
    use std::collections::HashMap;

    fn sample() -> NewsletterContent {
        NewsletterContent {
            main_topic: "oncology-ai".into(),
            generated_at: Utc::now(),
            executive_summary: "Cross-topic **highlights**.".into(),
            topics: vec![TopicSection {
                topic_name: "Early Detection".into(),
                overview: "Overview text.".into(),
                key_findings: vec!["Finding one".into()],
                notable_trends: vec![],
                top_articles: vec![ArticleRef {
                    title: "A Study".into(),
                    url: "https://example.com/a".into(),
                    source: Some("pubmed".into()),
                    relevance_score: Some(0.92),
                }],
                review: Some(crate::types::ReviewBadge { score: 0.8, issues: vec![] }),
            }],
            glossary: vec![GlossarySection {
                term: "immunotherapy".into(),
                entity_type_label: "treatment".into(),
                importance: 0.9,
                definition: "A cancer treatment.".into(),
                related: vec!["melanoma".into()],
            }],
            metrics: MetricsSummary { total_articles: 4, avg_quality: 0.8, ..Default::default() },
            run_id: "abc-123".into(),
        }
    }

    #[test]
    fn sections_appear_in_order() {
        let html = render_html(&sample(), None, &HashMap::new());
        let exec_pos = html.find("Executive Summary").unwrap();
        let topic_pos = html.find("Early Detection").unwrap();
        let glossary_pos = html.find("Glossary").unwrap();
        assert!(exec_pos < topic_pos);
        assert!(topic_pos < glossary_pos);
    }

    #[test]
    fn missing_chart_is_silently_omitted() {
        let html = render_html(&sample(), None, &HashMap::new());
        assert!(!html.contains("class=\"chart\""));
    }

    #[test]
    fn cover_image_embeds_as_base64_data_uri() {
        let html = render_html(&sample(), Some("AAAA"), &HashMap::new());
        assert!(html.contains("data:image/png;base64,AAAA"));
    }

    #[test]
    fn present_chart_is_embedded() {
        let mut charts = HashMap::new();
        charts.insert("dashboard".to_string(), "BBBB".to_string());
        let html = render_html(&sample(), None, &charts);
        assert!(html.contains("data:image/png;base64,BBBB"));
    }
}
