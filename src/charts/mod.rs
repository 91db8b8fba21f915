//! PNG rendering of the report's charts and tables.

use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::ops::Range;
use std::path::Path;

use crate::aggregate::{BarGroup, Series};
use crate::error::{ReportError, Result};

const CHART_SIZE: (u32, u32) = (1600, 900);
const BLANK_SIZE: (u32, u32) = (1000, 200);
const FONT: &str = "sans-serif";

const TABLE_ROW_HEIGHT: u32 = 48;
const TABLE_TITLE_HEIGHT: u32 = 80;
const TABLE_CHAR_WIDTH: u32 = 13;
const TABLE_CELL_PADDING: u32 = 24;
const TABLE_HEADER_FILL: RGBColor = RGBColor(0x2E, 0x40, 0x53);
const TABLE_STRIPE_FILL: RGBColor = RGBColor(0xF2, 0xF4, 0xF4);

type DrawResult = std::result::Result<(), Box<dyn Error>>;

fn render_png<F>(path: &Path, size: (u32, u32), draw: F) -> Result<()>
where
    F: FnOnce(&DrawingArea<BitMapBackend, Shift>) -> DrawResult,
{
    let root = BitMapBackend::new(path, size).into_drawing_area();
    draw(&root)
        .and_then(|()| root.present().map_err(Into::into))
        .map_err(|e| ReportError::Render {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// A titled table with a dark header row and striped body rows.
pub fn render_table(title: &str, headers: &[&str], rows: &[Vec<String>], path: &Path) -> Result<()> {
    let widths: Vec<u32> = (0..headers.len())
        .map(|col| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(headers[col].chars().count()))
                .max()
                .unwrap_or(0) as u32;
            longest * TABLE_CHAR_WIDTH + 2 * TABLE_CELL_PADDING
        })
        .collect();

    let title_width = title.chars().count() as u32 * 18 + 2 * TABLE_CELL_PADDING;
    let width = widths.iter().sum::<u32>().max(title_width);
    let height = TABLE_TITLE_HEIGHT + TABLE_ROW_HEIGHT * (rows.len() as u32 + 1) + TABLE_CELL_PADDING;

    render_png(path, (width, height), |root| {
        root.fill(&WHITE)?;
        root.draw(&Text::new(
            title.to_string(),
            (TABLE_CELL_PADDING as i32, 20),
            (FONT, 34).into_font(),
        ))?;

        let header_style = (FONT, 22).into_font().style(FontStyle::Bold).color(&WHITE);
        let body_style = (FONT, 22).into_font().color(&BLACK);

        let lines = std::iter::once(headers.iter().map(|h| h.to_string()).collect::<Vec<_>>())
            .chain(rows.iter().cloned());
        for (i, cells) in lines.enumerate() {
            let top = (TABLE_TITLE_HEIGHT + i as u32 * TABLE_ROW_HEIGHT) as i32;
            let bottom = top + TABLE_ROW_HEIGHT as i32;
            let fill = match i {
                0 => TABLE_HEADER_FILL,
                i if i % 2 == 0 => TABLE_STRIPE_FILL,
                _ => WHITE,
            };
            root.draw(&Rectangle::new([(0, top), (width as i32, bottom)], fill.filled()))?;

            let style = if i == 0 { &header_style } else { &body_style };
            let mut left = 0i32;
            for (col, cell) in cells.iter().enumerate() {
                root.draw(&Text::new(
                    cell.clone(),
                    (left + TABLE_CELL_PADDING as i32, top + 12),
                    style.clone(),
                ))?;
                left += widths.get(col).copied().unwrap_or(0) as i32;
            }
        }
        Ok(())
    })
}

/// One line per method, streams on the x axis.
pub fn render_line_chart(title: &str, y_label: &str, series: &[Series], path: &Path) -> Result<()> {
    let max_streams = series
        .iter()
        .flat_map(|s| s.points.iter().map(|&(x, _)| x))
        .max()
        .unwrap_or(1);
    let x_range = 0.0..(f64::from(max_streams) * 1.05 + 1.0);
    let y_range = value_range(series.iter().flat_map(|s| s.points.iter().map(|&(_, y)| y)));

    render_png(path, CHART_SIZE, |root| {
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 40))
            .margin(30)
            .x_label_area_size(60)
            .y_label_area_size(100)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc("Streams")
            .y_desc(y_label)
            .label_style((FONT, 20))
            .draw()?;

        for (idx, s) in series.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            let points: Vec<(f64, f64)> = s.points.iter().map(|&(x, y)| (f64::from(x), y)).collect();

            chart
                .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(3)))?
                .label(s.method.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));
            chart.draw_series(points.iter().map(|&p| Circle::new(p, 6, color.filled())))?;
        }

        chart
            .configure_series_labels()
            .label_font((FONT, 20))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    })
}

/// One cluster per stream count, one bar per method inside each cluster.
pub fn render_grouped_bars(
    title: &str,
    y_label: &str,
    groups: &[BarGroup],
    methods: &[String],
    path: &Path,
) -> Result<()> {
    let y_range = value_range(groups.iter().flat_map(|g| g.bars.iter().map(|(_, v)| *v)));
    let labels: Vec<String> = groups.iter().map(|g| g.streams.to_string()).collect();
    let bar_width = 0.8 / methods.len().max(1) as f64;

    render_png(path, CHART_SIZE, |root| {
        root.fill(&WHITE)?;
        let mut chart = category_chart(root, title, "Streams", y_label, &labels, y_range)?;

        for (idx, method) in methods.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            let offset = -0.4 + bar_width * idx as f64;
            let bars = groups.iter().enumerate().filter_map(|(slot, group)| {
                group
                    .bars
                    .iter()
                    .find(|(m, _)| m == method)
                    .map(|&(_, value)| {
                        let left = slot as f64 + offset;
                        Rectangle::new([(left, 0.0), (left + bar_width, value)], color.filled())
                    })
            });

            chart
                .draw_series(bars)?
                .label(method.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 16, y + 6)], color.filled()));
        }

        chart
            .configure_series_labels()
            .label_font((FONT, 20))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    })
}

/// A single series: one bar per method.
pub fn render_method_bars(title: &str, y_label: &str, bars: &[(String, f64)], path: &Path) -> Result<()> {
    let y_range = value_range(bars.iter().map(|(_, v)| *v));
    let labels: Vec<String> = bars.iter().map(|(m, _)| m.clone()).collect();

    render_png(path, CHART_SIZE, |root| {
        root.fill(&WHITE)?;
        let mut chart = category_chart(root, title, "Method", y_label, &labels, y_range)?;

        chart.draw_series(bars.iter().enumerate().map(|(slot, (_, value))| {
            let color = Palette99::pick(slot).to_rgba();
            let left = slot as f64 - 0.4;
            Rectangle::new([(left, 0.0), (left + 0.8, *value)], color.filled())
        }))?;
        Ok(())
    })
}

/// An empty white picture, used behind section-header slides.
pub fn render_blank(path: &Path) -> Result<()> {
    render_png(path, BLANK_SIZE, |root| {
        root.fill(&WHITE)?;
        Ok(())
    })
}

type CategoryChart<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<plotters::coord::types::RangedCoordf64, plotters::coord::types::RangedCoordf64>>;

/// Chart whose x positions `0, 1, 2, ...` are labelled with `labels`.
fn category_chart<'a, 'b>(
    root: &'a DrawingArea<BitMapBackend<'b>, Shift>,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    labels: &[String],
    y_range: Range<f64>,
) -> std::result::Result<CategoryChart<'a, 'b>, Box<dyn Error>> {
    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 40))
        .margin(30)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(-0.5..(labels.len().max(1) as f64 - 0.5), y_range)?;

    let label_at = |x: &f64| {
        let slot = x.round();
        if (x - slot).abs() > 1e-6 || slot < 0.0 {
            return String::new();
        }
        labels.get(slot as usize).cloned().unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len().max(1))
        .x_label_formatter(&label_at)
        .x_desc(x_desc)
        .y_desc(y_desc)
        .label_style((FONT, 20))
        .draw()?;

    Ok(chart)
}

/// Value axis covering every finite value and zero, with headroom above.
fn value_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = if hi - lo > f64::EPSILON { hi - lo } else { 1.0 };
    let lo = if lo < 0.0 { lo - span * 0.1 } else { lo };
    lo..(hi + span * 0.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_range_includes_zero_and_headroom() {
        let r = value_range([10.0, 20.0].into_iter());
        assert_eq!(r.start, 0.0);
        assert!((r.end - 22.0).abs() < 1e-9);
    }

    #[test]
    fn value_range_extends_below_zero_for_negative_values() {
        let r = value_range([-5.0, 5.0, f64::NAN].into_iter());
        assert!(r.start < -5.0);
        assert!(r.end > 5.0);
    }

    #[test]
    fn value_range_of_nothing_is_not_empty() {
        let r = value_range(std::iter::empty());
        assert!(r.end > r.start);
    }

    #[test]
    fn blank_image_needs_no_fonts() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("blank.png");
        render_blank(&path).unwrap();
        assert_eq!(image::image_dimensions(&path).unwrap(), BLANK_SIZE);
    }
}
