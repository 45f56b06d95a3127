//! The full, organized chart set for one shaped table.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::shaped::ShapedTable;
use crate::error::{Error, Result};
use crate::plot::chart::{render, render_algorithm_profile, render_metric_ranking, ChartArtifact, ChartType};
use crate::plot::export::ImagePolicy;
use crate::plot::paths::{self, COMPARISONS_DIR, MANIFEST_FILE, PER_ALGORITHM_DIR, PER_METRIC_DIR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotSetOptions {
    pub save_comparisons: bool,
    pub save_per_metric: bool,
    pub save_per_algorithm: bool,
    pub image: ImagePolicy,
}

impl Default for PlotSetOptions {
    fn default() -> Self {
        PlotSetOptions {
            save_comparisons: true,
            save_per_metric: true,
            save_per_algorithm: true,
            image: ImagePolicy::default(),
        }
    }
}

/// Files written under one run root, relative to it, in write order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRun {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
}

impl OutputRun {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        OutputRun {
            root: root.into(),
            files: Vec::new(),
        }
    }

    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Add a written file; a path written twice is listed once.
    pub fn record(&mut self, relative: impl Into<PathBuf>) {
        let relative = relative.into();
        if !self.files.contains(&relative) {
            self.files.push(relative);
        }
    }

    /// Rasterize `artifact` to `relative` and record it.
    pub fn save_chart(&mut self, artifact: &ChartArtifact, relative: PathBuf, image: &ImagePolicy) -> Result<()> {
        let target = self.path(&relative);
        if let Some(parent) = target.parent() {
            paths::ensure_dir(parent)?;
        }
        image.save_png(artifact, &target)?;
        self.record(relative);
        Ok(())
    }

    pub fn files_under(&self, dir: &str) -> impl Iterator<Item = &PathBuf> + '_ {
        let dir = dir.to_string();
        self.files.iter().filter(move |f| f.starts_with(&dir))
    }

    /// Write `manifest.json` listing every recorded file.
    ///
    /// Written last; a run directory without it is incomplete.
    pub fn write_manifest(&self) -> Result<PathBuf> {
        let target = self.path(MANIFEST_FILE);
        let json = serde_json::to_vec_pretty(&self.files)?;
        fs::write(&target, json).map_err(|e| Error::io(&target, e))?;
        debug!(path = %target.display(), files = self.files.len(), "wrote manifest");
        Ok(target)
    }

    /// Re-read a finished run from its manifest.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let manifest = root.join(MANIFEST_FILE);
        let bytes = fs::read(&manifest).map_err(|e| Error::io(&manifest, e))?;
        let files = serde_json::from_slice(&bytes)?;
        Ok(OutputRun { root, files })
    }

    /// Recorded files that are no longer on disk.
    pub fn missing_files(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|f| !self.path(f).is_file())
            .cloned()
            .collect()
    }
}

/// Write the comparison, per-metric and per-algorithm charts under `out_root`.
///
/// Each pass can be switched off. Pass directories are created even when a
/// pass has nothing to draw. Writes are not transactional.
pub fn generate_all(shaped: &ShapedTable, out_root: &Path, options: &PlotSetOptions) -> Result<OutputRun> {
    paths::ensure_dir(out_root)?;
    let mut run = OutputRun::new(out_root);
    let image = &options.image;

    if options.save_comparisons {
        paths::ensure_dir(&run.path(COMPARISONS_DIR))?;
        for chart_type in ChartType::ALL {
            run.save_chart(&render(shaped, chart_type), paths::comparison_path(chart_type), image)?;
        }
    }

    if options.save_per_metric {
        paths::ensure_dir(&run.path(PER_METRIC_DIR))?;
        for metric in shaped.metrics() {
            run.save_chart(&render_metric_ranking(shaped, *metric), paths::metric_path(*metric), image)?;
        }
    }

    if options.save_per_algorithm {
        paths::ensure_dir(&run.path(PER_ALGORITHM_DIR))?;
        for (row, name) in shaped.algorithms().iter().enumerate() {
            run.save_chart(&render_algorithm_profile(shaped, row), paths::algorithm_path(name), image)?;
        }
    }

    info!(
        root = %run.root.display(),
        charts = run.files.len(),
        rows = shaped.n_rows(),
        metrics = shaped.n_cols(),
        "generated plot set"
    );
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columnar::validate;
    use crate::data::loader::read_csv_bytes;
    use crate::data::metric::Metric;
    use crate::data::shaped::{shape, Selection};
    use tempfile::TempDir;

    fn fast() -> PlotSetOptions {
        PlotSetOptions {
            image: ImagePolicy { dpi: 30, tight: true },
            ..PlotSetOptions::default()
        }
    }

    fn shaped(selection: Selection) -> ShapedTable {
        let csv = "algorithm,accuracy,precision,recall,f1_score\n\
                   Logistic Regression,0.78,0.60,0.55,0.57\n\
                   Random Forest,0.86,0.81,0.79,0.80\n";
        let (cleaned, _) = validate(&read_csv_bytes(csv.as_bytes()).unwrap()).unwrap();
        shape(&cleaned, &selection)
    }

    #[test]
    fn writes_the_fixed_tree() {
        let dir = TempDir::new().unwrap();
        let table = shaped(Selection::all().with_metrics([Metric::Accuracy, Metric::F1Score]));
        let run = generate_all(&table, dir.path(), &fast()).unwrap();

        assert_eq!(run.files_under(COMPARISONS_DIR).count(), 3);
        assert_eq!(run.files_under(PER_METRIC_DIR).count(), 2);
        assert_eq!(run.files_under(PER_ALGORITHM_DIR).count(), 2);
        assert!(dir.path().join("per_metric/f1_score_bar.png").is_file());
        assert!(dir.path().join("per_algorithm/Logistic_Regression/metrics_line.png").is_file());
        assert!(!dir.path().join("per_metric/recall_bar.png").exists());
        assert!(run.missing_files().is_empty());
    }

    #[test]
    fn passes_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let options = PlotSetOptions {
            save_per_metric: false,
            save_per_algorithm: false,
            ..fast()
        };
        let run = generate_all(&shaped(Selection::all()), dir.path(), &options).unwrap();
        assert_eq!(run.files.len(), 3);
        assert!(!dir.path().join(PER_METRIC_DIR).exists());
    }

    #[test]
    fn empty_table_still_writes_comparisons() {
        let dir = TempDir::new().unwrap();
        let table = shaped(Selection::all().with_algorithms(Vec::<String>::new()));
        let run = generate_all(&table, dir.path(), &fast()).unwrap();
        assert_eq!(run.files_under(COMPARISONS_DIR).count(), 3);
        assert_eq!(run.files_under(PER_METRIC_DIR).count(), 4);
        assert_eq!(run.files_under(PER_ALGORITHM_DIR).count(), 0);
        assert!(dir.path().join(PER_ALGORITHM_DIR).is_dir());
    }

    #[test]
    fn no_metrics_still_writes_comparisons_and_profiles() {
        let dir = TempDir::new().unwrap();
        let table = shaped(Selection::all().with_metrics([]));
        let run = generate_all(&table, dir.path(), &fast()).unwrap();
        assert_eq!(run.files_under(COMPARISONS_DIR).count(), 3);
        assert_eq!(run.files_under(PER_METRIC_DIR).count(), 0);
        assert!(dir.path().join(PER_METRIC_DIR).is_dir());
        assert_eq!(run.files_under(PER_ALGORITHM_DIR).count(), 2);
        assert!(dir.path().join("per_algorithm/Random_Forest/metrics_line.png").is_file());
    }

    #[test]
    fn colliding_names_are_recorded_once() {
        let csv = "algorithm,accuracy,precision,recall,f1_score\n\
                   A,0.1,0.1,0.1,0.1\nA,0.2,0.2,0.2,0.2\nA/B,0.3,0.3,0.3,0.3\nA:B,0.4,0.4,0.4,0.4\n";
        let (cleaned, _) = validate(&read_csv_bytes(csv.as_bytes()).unwrap()).unwrap();
        let table = shape(&cleaned, &Selection::all());

        let dir = TempDir::new().unwrap();
        let run = generate_all(&table, dir.path(), &fast()).unwrap();
        let profiles: Vec<&PathBuf> = run.files_under(PER_ALGORITHM_DIR).collect();
        assert_eq!(
            profiles,
            vec![
                &PathBuf::from("per_algorithm/A/metrics_line.png"),
                &PathBuf::from("per_algorithm/A_B/metrics_line.png"),
            ]
        );
        assert_eq!(run.files.len(), 3 + 4 + 2);

        run.write_manifest().unwrap();
        assert_eq!(OutputRun::load(dir.path()).unwrap().files.len(), 9);
    }

    #[test]
    fn manifest_round_trips() {
        let dir = TempDir::new().unwrap();
        let run = generate_all(&shaped(Selection::all()), dir.path(), &fast()).unwrap();
        run.write_manifest().unwrap();

        let loaded = OutputRun::load(dir.path()).unwrap();
        assert_eq!(loaded, run);

        fs::remove_file(dir.path().join("comparisons/comparison_line.png")).unwrap();
        assert_eq!(
            loaded.missing_files(),
            vec![PathBuf::from("comparisons/comparison_line.png")]
        );
    }
}
