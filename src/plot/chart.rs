//! Backend-neutral chart descriptions.
//!
//! A [`ChartArtifact`] captures everything a figure shows (title, categories,
//! series, axis labels, legend, size) and nothing about pixels. Drawing lives
//! in [`crate::plot::draw`], file encoding in [`crate::plot::export`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::metric::Metric;
use crate::data::shaped::ShapedTable;
use crate::error::{Error, Result};
use crate::plot::draw;

/// Upper bound of every score axis; headroom above a perfect 1.0.
pub const SCORE_AXIS_MAX: f64 = 1.05;
pub const NO_DATA_TEXT: &str = "No data to display";
pub const SCORE_LABEL: &str = "Score";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartType {
    Bar,
    HorizontalBar,
    Line,
}

impl ChartType {
    pub const ALL: [ChartType; 3] = [ChartType::Bar, ChartType::HorizontalBar, ChartType::Line];

    /// Human label, as offered to a user picking a chart.
    pub fn label(&self) -> &'static str {
        match self {
            ChartType::Bar => "Bar",
            ChartType::HorizontalBar => "Horizontal Bar",
            ChartType::Line => "Line",
        }
    }

    /// File-name form of the label (`horizontal_bar`).
    pub fn slug(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::HorizontalBar => "horizontal_bar",
            ChartType::Line => "line",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChartType {
    type Err = Error;

    /// Accepts the label, the slug or the kebab-case CLI form.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");
        ChartType::ALL
            .into_iter()
            .find(|t| t.slug() == wanted)
            .ok_or_else(|| Error::UnknownChartType(s.to_string()))
    }
}

/// Figure size in inches; pixel size depends on the export resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigureSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl FigureSize {
    pub const BASE: FigureSize = FigureSize {
        width_in: 8.0,
        height_in: 4.0,
    };
    const HEIGHT_PER_ROW_IN: f64 = 0.5;

    /// Taller figures for more algorithms; never shorter than one row's worth.
    pub fn for_rows(rows: usize) -> Self {
        FigureSize {
            width_in: Self::BASE.width_in,
            height_in: Self::BASE.height_in + Self::HEIGHT_PER_ROW_IN * rows.max(1) as f64,
        }
    }

    pub fn pixels(&self, dpi: u32) -> (u32, u32) {
        let dpi = dpi as f64;
        (
            (self.width_in * dpi).round() as u32,
            (self.height_in * dpi).round() as u32,
        )
    }
}

/// How the series are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Clustered vertical bars, one cluster per category
    Bars,
    /// Same clusters with the score on the horizontal axis
    HorizontalBars,
    /// One polyline per series with a marker at every category
    Lines,
    /// Centered [`NO_DATA_TEXT`] only
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPlacement {
    /// Upper-right corner of the plotting area
    Inside,
    /// Right of the plotting area, top aligned
    Outside,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub title: String,
    pub placement: LegendPlacement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    /// One value per category
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartArtifact {
    pub encoding: Encoding,
    pub title: Option<String>,
    pub categories: Vec<String>,
    pub category_label: Option<String>,
    pub series: Vec<ChartSeries>,
    pub value_label: String,
    /// Inclusive score range on the value axis
    pub value_range: (f64, f64),
    pub legend: Option<Legend>,
    pub size: FigureSize,
}

impl ChartArtifact {
    pub fn placeholder(size: FigureSize) -> Self {
        ChartArtifact {
            encoding: Encoding::Placeholder,
            title: None,
            categories: Vec::new(),
            category_label: None,
            series: Vec::new(),
            value_label: String::new(),
            value_range: (0.0, SCORE_AXIS_MAX),
            legend: None,
            size,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.encoding == Encoding::Placeholder
    }

    fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// In-memory SVG document for live display.
    pub fn to_svg(&self, dpi: u32) -> Result<String> {
        draw::svg_string(self, dpi)
    }
}

/// Build the comparison chart of `shaped` for one chart type.
///
/// An empty table (no rows or no columns) yields a placeholder; this never fails.
pub fn render(shaped: &ShapedTable, chart_type: ChartType) -> ChartArtifact {
    let size = FigureSize::for_rows(shaped.n_rows());
    if shaped.is_empty() {
        return ChartArtifact::placeholder(size);
    }

    let algorithms = shaped.algorithms().to_vec();
    let metric_names: Vec<String> = shaped.metrics().iter().map(|m| m.as_str().to_string()).collect();

    let by_metric = || {
        shaped
            .metrics()
            .iter()
            .map(|m| ChartSeries {
                name: m.as_str().to_string(),
                values: shaped.column(*m).unwrap_or_default(),
            })
            .collect::<Vec<_>>()
    };

    match chart_type {
        ChartType::Bar | ChartType::HorizontalBar => {
            let (encoding, placement) = if chart_type == ChartType::Bar {
                (Encoding::Bars, LegendPlacement::Inside)
            } else {
                (Encoding::HorizontalBars, LegendPlacement::Outside)
            };
            ChartArtifact {
                encoding,
                title: None,
                categories: algorithms,
                category_label: Some(crate::data::columnar::ALGORITHM_COLUMN.to_string()),
                series: by_metric(),
                value_label: SCORE_LABEL.to_string(),
                value_range: (0.0, SCORE_AXIS_MAX),
                legend: Some(Legend {
                    title: "Metric".to_string(),
                    placement,
                }),
                size,
            }
        }
        ChartType::Line => {
            let series = algorithms
                .iter()
                .enumerate()
                .map(|(idx, name)| ChartSeries {
                    name: name.clone(),
                    values: shaped.row(idx).to_vec(),
                })
                .collect();
            ChartArtifact {
                encoding: Encoding::Lines,
                title: None,
                categories: metric_names,
                category_label: None,
                series,
                value_label: SCORE_LABEL.to_string(),
                value_range: (0.0, SCORE_AXIS_MAX),
                legend: Some(Legend {
                    title: "Algorithm".to_string(),
                    placement: LegendPlacement::Outside,
                }),
                size,
            }
        }
    }
}

/// Bar chart of one metric across algorithms, best first.
pub fn render_metric_ranking(shaped: &ShapedTable, metric: Metric) -> ChartArtifact {
    let title = format!("{} by Algorithm", metric.title());
    let size = FigureSize::for_rows(shaped.n_rows());
    let ranking = shaped.ranking(metric);
    if ranking.is_empty() {
        return ChartArtifact::placeholder(size).with_title(title);
    }

    let (categories, values): (Vec<String>, Vec<f64>) = ranking.into_iter().unzip();
    ChartArtifact {
        encoding: Encoding::Bars,
        title: Some(title),
        categories,
        category_label: Some(crate::data::columnar::ALGORITHM_COLUMN.to_string()),
        series: vec![ChartSeries {
            name: metric.as_str().to_string(),
            values,
        }],
        value_label: metric.title(),
        value_range: (0.0, SCORE_AXIS_MAX),
        legend: None,
        size,
    }
}

/// Line chart of one algorithm's scores across the selected metrics.
pub fn render_algorithm_profile(shaped: &ShapedTable, row: usize) -> ChartArtifact {
    let name = match shaped.algorithms().get(row) {
        Some(name) => name.clone(),
        None => return ChartArtifact::placeholder(FigureSize::BASE),
    };
    let title = format!("Metrics for {name}");
    if shaped.n_cols() == 0 {
        return ChartArtifact::placeholder(FigureSize::BASE).with_title(title);
    }

    ChartArtifact {
        encoding: Encoding::Lines,
        title: Some(title),
        categories: shaped.metrics().iter().map(|m| m.as_str().to_string()).collect(),
        category_label: None,
        series: vec![ChartSeries {
            name,
            values: shaped.row(row).to_vec(),
        }],
        value_label: SCORE_LABEL.to_string(),
        value_range: (0.0, SCORE_AXIS_MAX),
        legend: None,
        size: FigureSize::BASE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columnar::validate;
    use crate::data::loader::example_table;
    use crate::data::shaped::{shape, Selection};

    fn example(selection: Selection) -> ShapedTable {
        let (cleaned, _) = validate(&example_table().unwrap()).unwrap();
        shape(&cleaned, &selection)
    }

    #[test]
    fn chart_type_names() {
        assert_eq!("Horizontal Bar".parse::<ChartType>().unwrap(), ChartType::HorizontalBar);
        assert_eq!("horizontal-bar".parse::<ChartType>().unwrap(), ChartType::HorizontalBar);
        assert_eq!("LINE".parse::<ChartType>().unwrap(), ChartType::Line);
        assert!(matches!("pie".parse::<ChartType>(), Err(Error::UnknownChartType(_))));
        let slugs: Vec<_> = ChartType::ALL.iter().map(ChartType::slug).collect();
        assert_eq!(slugs, ["bar", "horizontal_bar", "line"]);
    }

    #[test]
    fn figure_grows_with_rows() {
        assert_eq!(FigureSize::for_rows(0).height_in, 4.5);
        assert_eq!(FigureSize::for_rows(1).height_in, 4.5);
        assert_eq!(FigureSize::for_rows(6).height_in, 7.0);
        assert_eq!(FigureSize::for_rows(3).pixels(200), (1600, 1100));
    }

    #[test]
    fn bar_groups_metrics_per_algorithm() {
        let chart = render(&example(Selection::all()), ChartType::Bar);
        assert_eq!(chart.encoding, Encoding::Bars);
        assert_eq!(chart.categories, ["Logistic Regression", "Random Forest", "GCN"]);
        assert_eq!(chart.series.len(), 4);
        assert_eq!(chart.series[0].name, "accuracy");
        assert_eq!(chart.series[0].values, [0.78, 0.86, 0.82]);
        assert_eq!(chart.value_range, (0.0, SCORE_AXIS_MAX));
        let legend = chart.legend.unwrap();
        assert_eq!(legend.title, "Metric");
        assert_eq!(legend.placement, LegendPlacement::Inside);
    }

    #[test]
    fn horizontal_bar_puts_legend_outside() {
        let chart = render(&example(Selection::all()), ChartType::HorizontalBar);
        assert_eq!(chart.encoding, Encoding::HorizontalBars);
        assert_eq!(chart.legend.unwrap().placement, LegendPlacement::Outside);
    }

    #[test]
    fn line_is_one_series_per_algorithm() {
        let shaped = example(Selection::all().with_metrics([Metric::Recall, Metric::Accuracy]));
        let chart = render(&shaped, ChartType::Line);
        assert_eq!(chart.categories, ["recall", "accuracy"]);
        assert_eq!(chart.series.len(), 3);
        assert_eq!(chart.series[1].name, "Random Forest");
        assert_eq!(chart.series[1].values, [0.79, 0.86]);
        assert_eq!(chart.legend.unwrap().title, "Algorithm");
    }

    #[test]
    fn empty_tables_render_placeholders() {
        let no_rows = example(Selection::all().with_algorithms(Vec::<String>::new()));
        let no_cols = example(Selection::all().with_metrics([]));
        for shaped in [&no_rows, &no_cols] {
            for chart_type in ChartType::ALL {
                assert!(render(shaped, chart_type).is_placeholder());
            }
        }
        assert_eq!(render(&no_cols, ChartType::Bar).size, FigureSize::for_rows(3));
    }

    #[test]
    fn rendering_is_deterministic() {
        let shaped = example(Selection::all());
        for chart_type in ChartType::ALL {
            assert_eq!(render(&shaped, chart_type), render(&shaped, chart_type));
        }
    }

    #[test]
    fn ranking_chart_sorts_descending() {
        let chart = render_metric_ranking(&example(Selection::all()), Metric::Precision);
        assert_eq!(chart.title.as_deref(), Some("Precision by Algorithm"));
        assert_eq!(chart.categories, ["Random Forest", "GCN", "Logistic Regression"]);
        assert_eq!(chart.series[0].values, [0.81, 0.75, 0.60]);
        assert_eq!(chart.value_label, "Precision");
        assert!(chart.legend.is_none());

        let f1 = render_metric_ranking(&example(Selection::all()), Metric::F1Score);
        assert_eq!(f1.title.as_deref(), Some("F1_Score by Algorithm"));
    }

    #[test]
    fn profile_chart_uses_base_size() {
        let chart = render_algorithm_profile(&example(Selection::all()), 2);
        assert_eq!(chart.title.as_deref(), Some("Metrics for GCN"));
        assert_eq!(chart.encoding, Encoding::Lines);
        assert_eq!(chart.size, FigureSize::BASE);
        assert_eq!(chart.series[0].values, [0.82, 0.75, 0.72, 0.73]);
        assert!(render_algorithm_profile(&example(Selection::all()), 9).is_placeholder());
    }
}
