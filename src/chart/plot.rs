use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use super::{ChartKind, ChartSpec};
use crate::color::ColorMap;
use crate::error::RenderError;

pub const DEFAULT_SIZE: (u32, u32) = (1000, 560);

const ZERO_LINE: RGBColor = RGBColor(0xff, 0x00, 0x00);
const MARKER_SIZE: i32 = 3;
/// Share of one x step covered by a group of bars.
const BAR_GROUP_WIDTH: f64 = 0.8;

type Plane = Cartesian2d<RangedCoordf64, RangedCoordf64>;

// ---------------------------------------------------------------------------
// Chart → SVG
// ---------------------------------------------------------------------------

/// Draw a chart into an SVG document held in memory.
pub fn render_svg(chart: &ChartSpec, size: (u32, u32)) -> Result<String, RenderError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;

        let (x_min, x_max) = chart.x_range();
        let (y_min, y_max) = chart.y_range();

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 24))
            .margin(16)
            .x_label_area_size(48)
            .y_label_area_size(72)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        ctx.configure_mesh()
            .x_desc(chart.x_label.clone())
            .y_desc(chart.y_label.clone())
            .x_label_formatter(&format_x)
            .draw()?;

        if y_min < 0.0 && y_max > 0.0 {
            ctx.draw_series(LineSeries::new(
                vec![(x_min, 0.0), (x_max, 0.0)],
                ZERO_LINE.stroke_width(2),
            ))?;
        }

        let colors = ColorMap::new(chart.series.iter().map(|s| s.region.as_str()));
        match chart.kind {
            ChartKind::Line => draw_lines(&mut ctx, chart, &colors)?,
            ChartKind::Bar => draw_bars(&mut ctx, chart, &colors, (y_min, y_max))?,
        }

        ctx.configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
    }
    log::debug!(
        "rendered '{}' ({} series, {} bytes of SVG)",
        chart.title,
        chart.series.len(),
        svg.len()
    );
    Ok(svg)
}

/// Whole years print bare; monthly positions keep one decimal.
fn format_x(x: &f64) -> String {
    if x.fract().abs() < 1e-9 {
        format!("{x:.0}")
    } else {
        format!("{x:.1}")
    }
}

fn draw_lines<DB: DrawingBackend>(
    ctx: &mut ChartContext<'_, DB, Plane>,
    chart: &ChartSpec,
    colors: &ColorMap,
) -> Result<(), RenderError> {
    for series in &chart.series {
        let color = colors.color_for(&series.region);

        // Legend entry only; the data is drawn per segment below.
        ctx.draw_series(LineSeries::new(Vec::<(f64, f64)>::new(), color.stroke_width(2)))?
            .label(series.region.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        for segment in series.segments() {
            ctx.draw_series(LineSeries::new(segment, color.stroke_width(2)))?;
        }
        ctx.draw_series(series.points.iter().filter_map(|p| {
            let value = p.value?;
            Some(Circle::new(
                (p.period.x_position(), value),
                MARKER_SIZE,
                color.filled(),
            ))
        }))?;
    }
    Ok(())
}

fn draw_bars<DB: DrawingBackend>(
    ctx: &mut ChartContext<'_, DB, Plane>,
    chart: &ChartSpec,
    colors: &ColorMap,
    (y_min, y_max): (f64, f64),
) -> Result<(), RenderError> {
    let group = chart.x_step() * BAR_GROUP_WIDTH;
    let width = group / chart.series.len().max(1) as f64;
    let baseline = 0.0_f64.clamp(y_min, y_max);

    for (i, series) in chart.series.iter().enumerate() {
        let color = colors.color_for(&series.region);
        let offset = -group / 2.0 + width * i as f64;

        let (periods, values) = series.transpose();
        ctx.draw_series(periods.iter().zip(values).filter_map(|(period, value)| {
            let value = value?;
            let left = period.x_position() + offset;
            Some(Rectangle::new(
                [(left, baseline), (left + width, value)],
                color.filled(),
            ))
        }))?
        .label(series.region.clone())
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Period, SeriesPoint, SeriesSpec};

    fn chart(kind: ChartKind) -> ChartSpec {
        let series = |region: &str, values: &[Option<f64>]| SeriesSpec {
            indicator: "Temperature".into(),
            region: region.into(),
            unit: Some("Degree Celsius".into()),
            points: values
                .iter()
                .enumerate()
                .map(|(i, &value)| SeriesPoint {
                    period: Period::year(2000 + i as i32),
                    value,
                })
                .collect(),
        };
        let mut chart = ChartSpec::new(
            "Temperature",
            vec![
                series("World", &[Some(0.4), Some(0.6), None, Some(0.9)]),
                series("Canada", &[Some(-0.5), Some(1.2), Some(1.4), Some(1.1)]),
            ],
            2,
            Vec::new(),
        );
        chart.kind = kind;
        chart
    }

    #[test]
    fn line_chart_renders_svg_with_legend() {
        let svg = render_svg(&chart(ChartKind::Line), DEFAULT_SIZE).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("World"));
        assert!(svg.contains("Canada"));
        assert!(svg.contains("Degree Celsius"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn bar_chart_renders_rectangles() {
        let svg = render_svg(&chart(ChartKind::Bar), (640, 400)).unwrap();
        assert!(svg.contains("<rect"));
        assert!(svg.contains("Temperature"));
    }

    #[test]
    fn all_missing_series_still_renders() {
        let mut blank = chart(ChartKind::Line);
        for series in &mut blank.series {
            for point in &mut series.points {
                point.value = None;
            }
        }
        assert!(render_svg(&blank, DEFAULT_SIZE).is_ok());
    }

    #[test]
    fn x_labels_show_years() {
        assert_eq!(format_x(&2020.0), "2020");
        assert_eq!(format_x(&2020.5), "2020.5");
    }
}
