use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};
use metric_plots::config::Config;
use metric_plots::data::columnar::validate;
use metric_plots::data::loader::read_csv_bytes;
use metric_plots::data::metric::Metric;
use metric_plots::data::shaped::{shape, Selection};
use metric_plots::pipeline::generate_at;
use metric_plots::plot::plot_set::OutputRun;
use metric_plots::Error;
use tempfile::TempDir;

const TWO_MODELS: &str = "algorithm,accuracy,precision,recall,f1_score\n\
                          Logistic Regression,0.78,0.60,0.55,0.57\n\
                          Random Forest,0.86,0.81,0.79,0.80\n";

fn config_in(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.output.root = dir.path().join("outputs");
    config.plots.dpi = 30;
    config
}

fn write_input(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().filter(|e| e.as_ref().unwrap().path().is_file()).count()
}

#[test]
fn two_models_two_metrics_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "metrics.csv", TWO_MODELS);
    let selection = Selection::all().with_metrics([Metric::Accuracy, Metric::F1Score]);
    let now = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

    let run = generate_at(&input, &selection, &config_in(&dir), &now).unwrap();
    assert_eq!(run.root, dir.path().join("outputs/metrics/20240506-070809"));

    assert_eq!(count_files(&run.root.join("comparisons")), 3);
    assert_eq!(count_files(&run.root.join("per_metric")), 2);
    let per_algorithm: Vec<_> = fs::read_dir(run.root.join("per_algorithm"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(per_algorithm.len(), 2);
    for alg_dir in &per_algorithm {
        assert_eq!(count_files(alg_dir), 1);
        assert!(alg_dir.join("metrics_line.png").is_file());
    }

    let csv = fs::read_to_string(run.root.join("selected_metrics.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "algorithm,accuracy,f1_score");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("Logistic Regression,0.78,0.57"));
    assert!(lines[2].starts_with("Random Forest,0.86,0.8"));

    let reloaded = OutputRun::load(&run.root).unwrap();
    assert_eq!(reloaded.files.len(), 3 + 2 + 2 + 1);
    assert!(reloaded.missing_files().is_empty());
}

#[test]
fn schema_error_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "broken.csv", "algorithm,accuracy,precision,recall\nA,1,1,1\n");
    let config = config_in(&dir);

    let err = generate_at(&input, &Selection::all(), &config, &Utc::now()).unwrap_err();
    assert!(matches!(err, Error::Schema));
    assert_eq!(
        err.to_string(),
        "CSV must contain columns: algorithm, accuracy, precision, recall, f1_score"
    );
    assert!(!config.output.root.exists());
}

#[test]
fn empty_selection_still_produces_every_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "metrics.csv", TWO_MODELS);
    let selection = Selection::all().with_algorithms(Vec::<String>::new());

    let run = generate_at(&input, &selection, &config_in(&dir), &Utc::now()).unwrap();
    assert_eq!(count_files(&run.root.join("comparisons")), 3);
    assert_eq!(count_files(&run.root.join("per_metric")), 4);
    assert!(run.root.join("per_algorithm").is_dir());

    let csv = fs::read_to_string(run.root.join("selected_metrics.csv")).unwrap();
    assert_eq!(csv.lines().count(), 1);
}

#[test]
fn no_metrics_selected_still_produces_every_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "metrics.csv", TWO_MODELS);
    let selection = Selection::all().with_metrics([]);

    let run = generate_at(&input, &selection, &config_in(&dir), &Utc::now()).unwrap();
    assert_eq!(count_files(&run.root.join("comparisons")), 3);
    assert_eq!(count_files(&run.root.join("per_metric")), 0);
    assert!(run.root.join("per_algorithm/Logistic_Regression/metrics_line.png").is_file());
    assert!(run.root.join("per_algorithm/Random_Forest/metrics_line.png").is_file());

    let csv = fs::read_to_string(run.root.join("selected_metrics.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines, ["algorithm", "Logistic Regression", "Random Forest"]);
    assert_eq!(OutputRun::load(&run.root).unwrap().files.len(), 3 + 2 + 1);
}

#[test]
fn manifest_can_be_switched_off() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "metrics.csv", TWO_MODELS);
    let mut config = config_in(&dir);
    config.plots.write_manifest = false;
    config.plots.save_per_algorithm = false;

    let run = generate_at(&input, &Selection::all(), &config, &Utc::now()).unwrap();
    assert!(!run.root.join("manifest.json").exists());
    assert!(!run.root.join("per_algorithm").exists());
    assert_eq!(run.files.last().unwrap(), Path::new("selected_metrics.csv"));
}

#[test]
fn export_round_trips_through_the_validator() {
    let text = "algorithm,accuracy,precision,recall,f1_score\n\
                A,0.75,0.5,0.25,0.8\nB,1,0,0.125,0.0625\n";
    let (cleaned, _) = validate(&read_csv_bytes(text.as_bytes()).unwrap()).unwrap();
    let shaped = shape(&cleaned, &Selection::all());

    let exported = shaped.to_csv_bytes().unwrap();
    let (reparsed, report) = validate(&read_csv_bytes(&exported).unwrap()).unwrap();
    assert!(report.is_clean());
    assert_eq!(reparsed, cleaned);
}

#[test]
fn missing_input_reports_the_path() {
    let dir = TempDir::new().unwrap();
    let err = generate_at(
        &dir.path().join("nope.csv"),
        &Selection::all(),
        &config_in(&dir),
        &Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert!(err.to_string().contains("nope.csv"));
}
