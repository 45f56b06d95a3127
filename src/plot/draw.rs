//! plotters rendering of a [`ChartArtifact`] onto any drawing backend.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::{Error, Result};
use crate::plot::chart::{ChartArtifact, Encoding, Legend, LegendPlacement, NO_DATA_TEXT};

type DrawResult<T, DB> = std::result::Result<T, DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// Categorical palette; series colors cycle through it in order.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

const GRID: RGBColor = RGBColor(225, 225, 225);
const FONT: &str = "sans-serif";
/// Share of a category slot covered by its bar cluster
const GROUP_WIDTH: f64 = 0.8;

pub fn series_color(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

/// Point sizes converted to pixels at a given resolution.
#[derive(Debug, Clone, Copy)]
struct Scale {
    dpi: f64,
}

impl Scale {
    fn px(&self, pt: f64) -> u32 {
        (pt * self.dpi / 72.0).round().max(1.0) as u32
    }

    fn text(&self, pt: f64) -> TextStyle<'static> {
        TextStyle::from((FONT, self.px(pt) as f64).into_font()).color(&BLACK)
    }
}

/// Raw RGB pixels (row-major, 3 bytes per pixel) of the artifact at `dpi`.
pub fn rgb_pixels(artifact: &ChartArtifact, dpi: u32) -> Result<(u32, u32, Vec<u8>)> {
    let (width, height) = artifact.size.pixels(dpi);
    let mut buffer = vec![255u8; (width as usize) * (height as usize) * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_chart(artifact, &root, dpi).map_err(Error::render)?;
        root.present().map_err(Error::render)?;
    }
    Ok((width, height, buffer))
}

pub fn svg_string(artifact: &ChartArtifact, dpi: u32) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, artifact.size.pixels(dpi)).into_drawing_area();
        draw_chart(artifact, &root, dpi).map_err(Error::render)?;
        root.present().map_err(Error::render)?;
    }
    Ok(svg)
}

pub fn draw_chart<DB: DrawingBackend>(
    artifact: &ChartArtifact,
    root: &DrawingArea<DB, Shift>,
    dpi: u32,
) -> DrawResult<(), DB> {
    let scale = Scale { dpi: dpi as f64 };
    root.fill(&WHITE)?;

    if artifact.is_placeholder() {
        return draw_placeholder(artifact, root, scale);
    }

    let legend = artifact.legend.as_ref();
    let plot_area = match legend {
        Some(legend) if legend.placement == LegendPlacement::Outside => {
            let (width, _) = root.dim_in_pixel();
            let (legend_w, _) = legend_box(root, artifact, legend, scale)?;
            let gap = scale.px(8.0);
            let split = width.saturating_sub(legend_w + 2 * gap).max(width / 2);
            let (left, right) = root.split_horizontally(split as i32);
            draw_legend(&right, artifact, legend, (gap as i32, scale.px(24.0) as i32), scale)?;
            left
        }
        _ => root.clone(),
    };

    let inner = match artifact.encoding {
        Encoding::HorizontalBars => draw_horizontal(artifact, &plot_area, scale)?,
        _ => draw_vertical(artifact, &plot_area, scale)?,
    };

    if let Some(legend) = legend.filter(|l| l.placement == LegendPlacement::Inside) {
        let (width, _) = inner.dim_in_pixel();
        let (legend_w, _) = legend_box(&inner, artifact, legend, scale)?;
        let pad = scale.px(4.0);
        let x = width.saturating_sub(legend_w + pad) as i32;
        draw_legend(&inner, artifact, legend, (x, pad as i32), scale)?;
    }
    Ok(())
}

fn draw_placeholder<DB: DrawingBackend>(
    artifact: &ChartArtifact,
    root: &DrawingArea<DB, Shift>,
    scale: Scale,
) -> DrawResult<(), DB> {
    let (width, height) = root.dim_in_pixel();
    let centered = Pos::new(HPos::Center, VPos::Center);
    root.draw_text(
        NO_DATA_TEXT,
        &scale.text(10.0).pos(centered),
        ((width / 2) as i32, (height / 2) as i32),
    )?;
    if let Some(title) = &artifact.title {
        root.draw_text(
            title,
            &scale.text(12.0).pos(Pos::new(HPos::Center, VPos::Top)),
            ((width / 2) as i32, scale.px(8.0) as i32),
        )?;
    }
    Ok(())
}

fn category_at(categories: &[String], pos: f64) -> String {
    let idx = pos.round();
    if (pos - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

fn widest<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    texts: impl IntoIterator<Item = impl AsRef<str>>,
    style: &TextStyle,
) -> DrawResult<u32, DB> {
    let mut max = 0;
    for text in texts {
        let (w, _) = area.estimate_text_size(text.as_ref(), style)?;
        max = max.max(w);
    }
    Ok(max)
}

/// Bars or lines with categories along x and scores up the y axis.
fn draw_vertical<DB: DrawingBackend>(
    artifact: &ChartArtifact,
    area: &DrawingArea<DB, Shift>,
    scale: Scale,
) -> DrawResult<DrawingArea<DB, Shift>, DB> {
    let n = artifact.categories.len();
    let tick = scale.text(10.0);
    let bars = artifact.encoding == Encoding::Bars;
    // bar charts get vertical category labels
    let x_label_area = if bars {
        widest(area, &artifact.categories, &tick)? + scale.px(24.0)
    } else {
        scale.px(40.0)
    };

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(scale.px(8.0))
        .x_label_area_size(x_label_area)
        .y_label_area_size(scale.px(48.0));
    if let Some(title) = &artifact.title {
        builder.caption(title, scale.text(12.0));
    }

    let (lo, hi) = artifact.value_range;
    let mut chart = builder.build_cartesian_2d(
        -0.5..n as f64 - 0.5,
        lo..hi,
    )?;

    let label_style = if bars {
        TextStyle::from((FONT, scale.px(10.0) as f64).into_font().transform(FontTransform::Rotate90))
            .pos(Pos::new(HPos::Left, VPos::Center))
    } else {
        tick.clone()
    };
    let category_fmt = |x: &f64| category_at(&artifact.categories, *x);
    let score_fmt = |y: &f64| format!("{y:.1}");
    let mut mesh = chart.configure_mesh();
    mesh.x_labels(n)
        .x_label_formatter(&category_fmt)
        .x_label_style(label_style)
        .y_labels(6)
        .y_label_formatter(&score_fmt)
        .y_label_style(tick.clone())
        .y_desc(artifact.value_label.as_str())
        .axis_desc_style(tick.clone())
        .bold_line_style(GRID.stroke_width(scale.px(0.8)))
        .max_light_lines(0);
    if let Some(label) = &artifact.category_label {
        mesh.x_desc(label.as_str());
    }
    mesh.draw()?;

    let m = artifact.series.len().max(1);
    let bar_w = GROUP_WIDTH / m as f64;
    for (j, series) in artifact.series.iter().enumerate() {
        let color = series_color(j);
        if bars {
            chart.draw_series(series.values.iter().enumerate().map(|(i, v)| {
                let x0 = i as f64 - GROUP_WIDTH / 2.0 + j as f64 * bar_w;
                Rectangle::new([(x0, lo), (x0 + bar_w, *v)], color.filled())
            }))?;
        } else {
            let points: Vec<(f64, f64)> = series
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (i as f64, *v))
                .collect();
            chart.draw_series(LineSeries::new(points.clone(), color.stroke_width(scale.px(1.5))))?;
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), scale.px(3.0), color.filled())),
            )?;
        }
    }

    Ok(chart.plotting_area().strip_coord_spec())
}

/// Clustered bars with scores along x and categories up the y axis.
fn draw_horizontal<DB: DrawingBackend>(
    artifact: &ChartArtifact,
    area: &DrawingArea<DB, Shift>,
    scale: Scale,
) -> DrawResult<DrawingArea<DB, Shift>, DB> {
    let n = artifact.categories.len();
    let tick = scale.text(10.0);
    let y_label_area = widest(area, &artifact.categories, &tick)? + scale.px(24.0);

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(scale.px(8.0))
        .x_label_area_size(scale.px(40.0))
        .y_label_area_size(y_label_area);
    if let Some(title) = &artifact.title {
        builder.caption(title, scale.text(12.0));
    }

    let (lo, hi) = artifact.value_range;
    let mut chart = builder.build_cartesian_2d(
        lo..hi,
        -0.5..n as f64 - 0.5,
    )?;

    let category_fmt = |y: &f64| category_at(&artifact.categories, *y);
    let score_fmt = |x: &f64| format!("{x:.1}");
    let mut mesh = chart.configure_mesh();
    mesh.y_labels(n)
        .y_label_formatter(&category_fmt)
        .y_label_style(tick.clone())
        .x_labels(6)
        .x_label_formatter(&score_fmt)
        .x_label_style(tick.clone())
        .x_desc(artifact.value_label.as_str())
        .axis_desc_style(tick.clone())
        .bold_line_style(GRID.stroke_width(scale.px(0.8)))
        .max_light_lines(0);
    if let Some(label) = &artifact.category_label {
        mesh.y_desc(label.as_str());
    }
    mesh.draw()?;

    let m = artifact.series.len().max(1);
    let bar_h = GROUP_WIDTH / m as f64;
    for (j, series) in artifact.series.iter().enumerate() {
        let color = series_color(j);
        chart.draw_series(series.values.iter().enumerate().map(|(i, v)| {
            let y0 = i as f64 - GROUP_WIDTH / 2.0 + j as f64 * bar_h;
            Rectangle::new([(lo, y0), (*v, y0 + bar_h)], color.filled())
        }))?;
    }

    Ok(chart.plotting_area().strip_coord_spec())
}

/// Pixel size of the framed legend box.
fn legend_box<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    artifact: &ChartArtifact,
    legend: &Legend,
    scale: Scale,
) -> DrawResult<(u32, u32), DB> {
    let text = scale.text(9.0);
    let names = widest(area, artifact.series.iter().map(|s| s.name.as_str()), &text)?;
    let title = widest(area, [legend.title.as_str()], &text)?;
    let pad = scale.px(4.0);
    let swatch = scale.px(16.0);
    let row = scale.px(13.0);
    let width = (swatch + pad + names).max(title) + 2 * pad;
    let height = row * (artifact.series.len() as u32 + 1) + 2 * pad;
    Ok((width, height))
}

fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    artifact: &ChartArtifact,
    legend: &Legend,
    (x, y): (i32, i32),
    scale: Scale,
) -> DrawResult<(), DB> {
    let (width, height) = legend_box(area, artifact, legend, scale)?;
    let pad = scale.px(4.0) as i32;
    let swatch = scale.px(16.0) as i32;
    let row = scale.px(13.0) as i32;
    let text = scale.text(9.0).pos(Pos::new(HPos::Left, VPos::Center));

    area.draw(&Rectangle::new(
        [(x, y), (x + width as i32, y + height as i32)],
        WHITE.filled(),
    ))?;
    area.draw(&Rectangle::new(
        [(x, y), (x + width as i32, y + height as i32)],
        GRID.stroke_width(scale.px(0.8)),
    ))?;

    let title_pos = Pos::new(HPos::Center, VPos::Center);
    area.draw_text(
        &legend.title,
        &scale.text(9.0).pos(title_pos),
        (x + width as i32 / 2, y + pad + row / 2),
    )?;

    let lines = artifact.encoding == Encoding::Lines;
    for (j, series) in artifact.series.iter().enumerate() {
        let color = series_color(j);
        let cy = y + pad + row * (j as i32 + 1) + row / 2;
        let sx = x + pad;
        if lines {
            area.draw(&PathElement::new(
                vec![(sx, cy), (sx + swatch, cy)],
                color.stroke_width(scale.px(1.5)),
            ))?;
            area.draw(&Circle::new((sx + swatch / 2, cy), scale.px(3.0), color.filled()))?;
        } else {
            let half = row / 3;
            area.draw(&Rectangle::new(
                [(sx, cy - half), (sx + swatch, cy + half)],
                color.filled(),
            ))?;
        }
        area.draw_text(&series.name, &text, (sx + swatch + pad, cy))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::chart::{ChartSeries, FigureSize};

    fn tiny_bar() -> ChartArtifact {
        ChartArtifact {
            encoding: Encoding::Bars,
            title: Some("t".to_string()),
            categories: vec!["A".to_string(), "B".to_string()],
            category_label: None,
            series: vec![ChartSeries {
                name: "accuracy".to_string(),
                values: vec![0.5, 1.0],
            }],
            value_label: "Score".to_string(),
            value_range: (0.0, 1.05),
            legend: None,
            size: FigureSize::BASE,
        }
    }

    #[test]
    fn category_labels_only_on_integer_positions() {
        let cats = vec!["A".to_string(), "B".to_string()];
        assert_eq!(category_at(&cats, 0.0), "A");
        assert_eq!(category_at(&cats, 1.0), "B");
        assert_eq!(category_at(&cats, 0.5), "");
        assert_eq!(category_at(&cats, 2.0), "");
        assert_eq!(category_at(&cats, -1.0), "");
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(series_color(0), series_color(10));
        assert_ne!(series_color(0), series_color(1));
    }

    #[test]
    fn bitmap_has_requested_size() {
        let (w, h, pixels) = rgb_pixels(&tiny_bar(), 50).unwrap();
        assert_eq!((w, h), (400, 200));
        assert_eq!(pixels.len(), 400 * 200 * 3);
        assert!(pixels.iter().any(|p| *p != 255));
    }

    #[test]
    fn every_encoding_draws_axes_and_legend() {
        for (encoding, placement) in [
            (Encoding::Bars, LegendPlacement::Inside),
            (Encoding::HorizontalBars, LegendPlacement::Outside),
            (Encoding::Lines, LegendPlacement::Outside),
        ] {
            let chart = ChartArtifact {
                encoding,
                legend: Some(Legend {
                    title: "Metric".to_string(),
                    placement,
                }),
                ..tiny_bar()
            };
            let svg = svg_string(&chart, 72).unwrap();
            assert!(svg.contains("Score"), "{encoding:?} lost its value axis label");
            assert!(svg.contains("accuracy"), "{encoding:?} lost its legend entry");
        }
    }

    #[test]
    fn placeholder_svg_mentions_no_data() {
        let svg = svg_string(&ChartArtifact::placeholder(FigureSize::BASE), 72).unwrap();
        assert!(svg.contains(NO_DATA_TEXT));
    }
}
