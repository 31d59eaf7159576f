// src/report/chart.rs

use anyhow::{ensure, Result};
use plotters::prelude::*;
use std::{f64::consts::PI, iter, path::Path};
use tracing::debug;

/// Scores are drawn on a 0..=5 maturity scale unless a section scores higher.
const MIN_SCALE: f64 = 5.0;
const RADAR_EXTENT: f64 = 1.35;
const LABEL_RADIUS: f64 = 1.12;

/// Upper bound of the value axis.
pub fn scale_max(scores: &[(String, f64)]) -> f64 {
    scores
        .iter()
        .map(|(_, s)| s.ceil())
        .fold(MIN_SCALE, f64::max)
}

/// Red for low scores through green for the top of the scale.
fn score_color(score: f64, max: f64) -> HSLColor {
    let frac = if max > 0.0 {
        (score / max).clamp(0.0, 1.0)
    } else {
        0.0
    };
    HSLColor(frac * 0.33, 0.65, 0.5)
}

/// Point on spoke `i` of `n` at `radius`; spoke 0 points up, the rest follow clockwise.
pub fn spoke(i: usize, n: usize, radius: f64) -> (f64, f64) {
    let angle = PI / 2.0 - 2.0 * PI * i as f64 / n.max(1) as f64;
    (radius * angle.cos(), radius * angle.sin())
}

/// Closed radar outline: one point per score scaled to `max`, with the first point repeated.
pub fn radar_points(scores: &[(String, f64)], max: f64) -> Vec<(f64, f64)> {
    let n = scores.len();
    let mut points: Vec<(f64, f64)> = scores
        .iter()
        .enumerate()
        .map(|(i, (_, s))| {
            let r = if max > 0.0 {
                (s / max).clamp(0.0, 1.0)
            } else {
                0.0
            };
            spoke(i, n, r)
        })
        .collect();
    if let Some(first) = points.first().copied() {
        points.push(first);
    }
    points
}

/// Bar chart of section vs score, bars coloured by score and labelled with their value.
pub fn render_bar_chart(scores: &[(String, f64)], path: &Path) -> Result<()> {
    ensure!(!scores.is_empty(), "no scores to chart");
    let n = scores.len();
    let max = scale_max(scores);

    let root = SVGBackend::new(path, (960, 560)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Section-wise Maturity Scores", ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(50)
        .build_cartesian_2d((0..n).into_segmented(), 0f64..max)?;

    let label = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => scores.get(*i).map(|(s, _)| s.clone()).unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label)
        .x_desc("Section")
        .y_desc("Score")
        .draw()?;

    chart.draw_series(scores.iter().enumerate().map(|(i, (_, score))| {
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(i), 0.0),
                (SegmentValue::Exact(i + 1), *score),
            ],
            score_color(*score, max).filled(),
        );
        bar.set_margin(0, 0, 10, 10);
        bar
    }))?;

    chart.draw_series(scores.iter().enumerate().map(|(i, (_, score))| {
        Text::new(
            format!("{:.2}", score),
            (SegmentValue::CenterOf(i), *score),
            ("sans-serif", 16).into_font(),
        )
    }))?;

    root.present()?;
    debug!(path = %path.display(), "bar chart written");
    Ok(())
}

/// Radar chart of section vs score as a closed polygon over concentric level rings.
pub fn render_radar_chart(scores: &[(String, f64)], path: &Path) -> Result<()> {
    ensure!(!scores.is_empty(), "no scores to chart");
    let n = scores.len();
    let max = scale_max(scores);
    let rings = max as usize;

    let root = SVGBackend::new(path, (760, 760)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Radar Chart - Section Scores", ("sans-serif", 28))
        .margin(30)
        .build_cartesian_2d(-RADAR_EXTENT..RADAR_EXTENT, -RADAR_EXTENT..RADAR_EXTENT)?;

    for ring in 1..=rings {
        let r = ring as f64 / rings as f64;
        let outline: Vec<(f64, f64)> = (0..=72).map(|k| spoke(k, 72, r)).collect();
        chart.draw_series(iter::once(PathElement::new(outline, &BLACK.mix(0.15))))?;
    }

    for (i, (section, _)) in scores.iter().enumerate() {
        chart.draw_series(iter::once(PathElement::new(
            vec![(0.0, 0.0), spoke(i, n, 1.0)],
            &BLACK.mix(0.25),
        )))?;
        chart.draw_series(iter::once(Text::new(
            section.clone(),
            spoke(i, n, LABEL_RADIUS),
            ("sans-serif", 14).into_font(),
        )))?;
    }

    let outline = radar_points(scores, max);
    chart.draw_series(iter::once(Polygon::new(
        outline.clone(),
        BLUE.mix(0.2).filled(),
    )))?;
    chart.draw_series(LineSeries::new(outline, BLUE.stroke_width(2)))?;

    root.present()?;
    debug!(path = %path.display(), "radar chart written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn scores(values: &[f64]) -> Vec<(String, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("S{}", i), *v))
            .collect()
    }

    #[test]
    fn scale_covers_maturity_range() {
        assert_eq!(scale_max(&scores(&[1.0, 3.2])), 5.0);
        assert_eq!(scale_max(&scores(&[6.4])), 7.0);
        assert_eq!(scale_max(&[]), 5.0);
    }

    #[test]
    fn radar_outline_is_closed() {
        let pts = radar_points(&scores(&[5.0, 2.5, 0.0, 5.0]), 5.0);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts.first(), pts.last());

        // first spoke points straight up at full radius
        assert_abs_diff_eq!(pts[0].0, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pts[0].1, 1.0, epsilon = 1e-9);
        // second spoke points right at half radius
        assert_abs_diff_eq!(pts[1].0, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(pts[1].1, 0.0, epsilon = 1e-9);
        // zero score collapses to the centre
        assert_abs_diff_eq!(pts[2].0, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pts[2].1, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_radar_outline() {
        assert!(radar_points(&[], 5.0).is_empty());
    }

    #[test]
    fn charts_refuse_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(render_bar_chart(&[], &dir.path().join("bar.svg")).is_err());
        assert!(render_radar_chart(&[], &dir.path().join("radar.svg")).is_err());
    }
}
