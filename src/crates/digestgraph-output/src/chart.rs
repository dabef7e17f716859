//! Chart Producer (spec.md §4.9, Component C9): up to four analytics PNGs
//! rendered from a [`MetricsSummary`] via `plotters`. Each chart is produced
//! independently — a failure on one never blocks the others, and a chart
//! that fails is simply absent from the returned map (spec.md §4.9: "a
//! missing chart is omitted from the report, never a broken image").

use std::collections::HashMap;

use plotters::prelude::*;

use crate::error::{OutputError, Result};
use crate::types::MetricsSummary;

pub const CHART_WIDTH: u32 = 640;
pub const CHART_HEIGHT: u32 = 480;

/// Renders every chart `metrics` has data for, returning PNG bytes keyed by
/// chart name (`distribution`, `quality_gauge`, `quality_by_topic`,
/// `dashboard`). Never returns `Err` — per-chart failures are logged and the
/// chart is dropped from the result.
pub fn render_charts(metrics: &MetricsSummary) -> HashMap<String, Vec<u8>> {
    let mut charts = HashMap::new();

    if !metrics.relevance_distribution.is_empty() {
        match render_distribution(metrics) {
            Ok(bytes) => {
                charts.insert("distribution".to_string(), bytes);
            }
            Err(err) => tracing::warn!(error = %err, "distribution chart failed, omitting"),
        }
    }

    match render_quality_gauge(metrics) {
        Ok(bytes) => {
            charts.insert("quality_gauge".to_string(), bytes);
        }
        Err(err) => tracing::warn!(error = %err, "quality gauge chart failed, omitting"),
    }

    if !metrics.quality_by_topic.is_empty() {
        match render_quality_by_topic(metrics) {
            Ok(bytes) => {
                charts.insert("quality_by_topic".to_string(), bytes);
            }
            Err(err) => tracing::warn!(error = %err, "quality-by-topic chart failed, omitting"),
        }
    }

    if !metrics.quality_by_topic.is_empty() || !metrics.relevance_distribution.is_empty() {
        match render_dashboard(metrics) {
            Ok(bytes) => {
                charts.insert("dashboard".to_string(), bytes);
            }
            Err(err) => tracing::warn!(error = %err, "dashboard chart failed, omitting"),
        }
    }

    charts
}

fn render_distribution(metrics: &MetricsSummary) -> Result<Vec<u8>> {
    render_png(|root| {
        let max_count = metrics.relevance_distribution.iter().map(|(_, c)| *c).max().unwrap_or(1).max(1);
        let mut chart = ChartBuilder::on(root)
            .caption("Relevance Distribution", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(35)
            .y_label_area_size(40)
            .build_cartesian_2d(0..metrics.relevance_distribution.len(), 0..max_count)
            .map_err(|e| OutputError::Chart(e.to_string()))?;

        chart
            .configure_mesh()
            .x_labels(metrics.relevance_distribution.len())
            .x_label_formatter(&|idx| {
                metrics.relevance_distribution.get(*idx).map(|(label, _)| label.clone()).unwrap_or_default()
            })
            .draw()
            .map_err(|e| OutputError::Chart(e.to_string()))?;

        chart
            .draw_series(metrics.relevance_distribution.iter().enumerate().map(|(i, (_, count))| {
                let mut bar = Rectangle::new([(i, 0), (i + 1, *count)], BLUE.filled());
                bar.set_margin(0, 0, 5, 5);
                bar
            }))
            .map_err(|e| OutputError::Chart(e.to_string()))?;
        Ok(())
    })
}

fn render_quality_gauge(metrics: &MetricsSummary) -> Result<Vec<u8>> {
    render_png(|root| {
        let pct = (metrics.avg_quality.clamp(0.0, 1.0) * 100.0) as i32;
        let mut chart = ChartBuilder::on(root)
            .caption("Overall Quality", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(0)
            .y_label_area_size(40)
            .build_cartesian_2d(0..1, 0..100)
            .map_err(|e| OutputError::Chart(e.to_string()))?;

        chart.configure_mesh().disable_x_mesh().draw().map_err(|e| OutputError::Chart(e.to_string()))?;

        chart
            .draw_series(std::iter::once({
                let mut bar = Rectangle::new([(0, 0), (1, pct)], GREEN.filled());
                bar.set_margin(0, 0, 40, 40);
                bar
            }))
            .map_err(|e| OutputError::Chart(e.to_string()))?;
        Ok(())
    })
}

fn render_quality_by_topic(metrics: &MetricsSummary) -> Result<Vec<u8>> {
    render_png(|root| {
        let labels: Vec<&str> = metrics.quality_by_topic.iter().map(|(name, _)| name.as_str()).collect();
        let mut chart = ChartBuilder::on(root)
            .caption("Quality by Topic", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(40)
            .build_cartesian_2d(0..metrics.quality_by_topic.len(), 0f64..1f64)
            .map_err(|e| OutputError::Chart(e.to_string()))?;

        chart
            .configure_mesh()
            .x_labels(labels.len())
            .x_label_formatter(&|idx| labels.get(*idx).map(|s| s.to_string()).unwrap_or_default())
            .draw()
            .map_err(|e| OutputError::Chart(e.to_string()))?;

        chart
            .draw_series(metrics.quality_by_topic.iter().enumerate().map(|(i, (_, score))| {
                let mut bar = Rectangle::new([(i, 0.0), (i + 1, *score)], CYAN.filled());
                bar.set_margin(0, 0, 5, 5);
                bar
            }))
            .map_err(|e| OutputError::Chart(e.to_string()))?;
        Ok(())
    })
}

/// A compact two-panel summary combining topic quality and overall article
/// volume, used as the HTML report's single at-a-glance chart.
fn render_dashboard(metrics: &MetricsSummary) -> Result<Vec<u8>> {
    render_png(|root| {
        let (left, right) = root.split_horizontally(CHART_WIDTH as u32 / 2);

        let mut left_chart = ChartBuilder::on(&left)
            .caption("Articles", ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(0)
            .y_label_area_size(30)
            .build_cartesian_2d(0..1, 0..metrics.total_articles.max(1))
            .map_err(|e| OutputError::Chart(e.to_string()))?;
        left_chart.configure_mesh().disable_x_mesh().draw().map_err(|e| OutputError::Chart(e.to_string()))?;
        left_chart
            .draw_series(std::iter::once(Rectangle::new([(0, 0), (1, metrics.total_articles)], BLUE.filled())))
            .map_err(|e| OutputError::Chart(e.to_string()))?;

        let pct = (metrics.avg_quality.clamp(0.0, 1.0) * 100.0) as i32;
        let mut right_chart = ChartBuilder::on(&right)
            .caption("Quality %", ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(0)
            .y_label_area_size(30)
            .build_cartesian_2d(0..1, 0..100)
            .map_err(|e| OutputError::Chart(e.to_string()))?;
        right_chart.configure_mesh().disable_x_mesh().draw().map_err(|e| OutputError::Chart(e.to_string()))?;
        right_chart
            .draw_series(std::iter::once(Rectangle::new([(0, 0), (1, pct)], GREEN.filled())))
            .map_err(|e| OutputError::Chart(e.to_string()))?;
        Ok(())
    })
}

fn render_png(draw: impl FnOnce(&DrawingArea<BitMapBackend, plotters::coord::Shift>) -> Result<()>) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| OutputError::Chart(e.to_string()))?;
        draw(&root)?;
        root.present().map_err(|e| OutputError::Chart(e.to_string()))?;
    }

    let mut png_bytes = Vec::new();
    {
        use image::ImageEncoder;
        image::codecs::png::PngEncoder::new(&mut png_bytes)
            .write_image(&buffer, CHART_WIDTH, CHART_HEIGHT, image::ExtendedColorType::Rgb8)
            .map_err(|e| OutputError::Chart(e.to_string()))?;
    }
    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metrics() -> MetricsSummary {
        MetricsSummary {
            total_articles: 12,
            avg_quality: 0.82,
            quality_by_topic: vec![("Early Detection".into(), 0.9), ("Biomarkers".into(), 0.7)],
            relevance_distribution: vec![("high".into(), 5), ("medium".into(), 4), ("low".into(), 3)],
        }
    }

    #[test]
    fn renders_all_four_charts_when_data_present() {
        let charts = render_charts(&sample_metrics());
        assert!(charts.contains_key("distribution"));
        assert!(charts.contains_key("quality_gauge"));
        assert!(charts.contains_key("quality_by_topic"));
        assert!(charts.contains_key("dashboard"));
        for bytes in charts.values() {
            assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
        }
    }

    #[test]
    fn omits_distribution_and_by_topic_when_no_data() {
        let metrics = MetricsSummary { total_articles: 0, avg_quality: 0.0, ..Default::default() };
        let charts = render_charts(&metrics);
        assert!(!charts.contains_key("distribution"));
        assert!(!charts.contains_key("quality_by_topic"));
        assert!(!charts.contains_key("dashboard"));
        assert!(charts.contains_key("quality_gauge"));
    }
}
