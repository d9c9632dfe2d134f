//! JSONL benchmark artifacts and their summaries.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub const SCHEMA_VERSION: u32 = 1;

/// One measured stage of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchRecord {
    pub schema_version: u32,
    pub run_id: String,
    pub backend: String,
    pub method: String,
    pub style: String,
    pub cells: usize,
    pub models: usize,
    pub workers: usize,
    /// `build`, `start`, `step-<n>` or `total`.
    pub stage: String,
    pub step: Option<u32>,
    pub duration_ms: f64,
    pub solves: usize,
    pub failures: usize,
    pub mean_objective: Option<f64>,
    pub rss_after_bytes: Option<u64>,
    pub rss_delta_bytes: Option<i64>,
    /// Highest RSS sampled during the run; set on the `total` record.
    #[serde(default)]
    pub peak_rss_bytes: Option<u64>,
}

impl BenchRecord {
    /// Stage used for grouping: every `step-<n>` folds into `step`.
    pub fn summary_stage(&self) -> &str {
        if self.step.is_some() {
            "step"
        } else {
            &self.stage
        }
    }

    fn key(&self) -> (String, String, String) {
        (
            self.backend.clone(),
            self.style.clone(),
            self.summary_stage().to_string(),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub backend: String,
    pub style: String,
    pub stage: String,
    pub samples: usize,
    pub mean_duration_ms: f64,
    pub max_duration_ms: f64,
    pub solves: usize,
    pub failures: usize,
    pub max_rss_after_bytes: Option<u64>,
}

impl SummaryRow {
    fn empty(key: (String, String, String)) -> Self {
        let (backend, style, stage) = key;
        Self {
            backend,
            style,
            stage,
            samples: 0,
            mean_duration_ms: 0.0,
            max_duration_ms: 0.0,
            solves: 0,
            failures: 0,
            max_rss_after_bytes: None,
        }
    }

    /// Fold one record in; `mean_duration_ms` holds the running sum until
    /// [`SummaryRow::finish`].
    fn absorb(&mut self, record: &BenchRecord) {
        self.samples += 1;
        self.mean_duration_ms += record.duration_ms;
        self.max_duration_ms = self.max_duration_ms.max(record.duration_ms);
        self.solves += record.solves;
        self.failures += record.failures;
        self.max_rss_after_bytes = self.max_rss_after_bytes.max(record.rss_after_bytes);
    }

    fn finish(mut self) -> Self {
        if self.samples > 0 {
            self.mean_duration_ms /= self.samples as f64;
        }
        self
    }

    fn key(&self) -> (&str, &str, &str) {
        (&self.backend, &self.style, &self.stage)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareRow {
    pub backend: String,
    pub style: String,
    pub stage: String,
    pub baseline_mean_duration_ms: f64,
    pub candidate_mean_duration_ms: f64,
    pub duration_change_pct: Option<f64>,
}

/// Group records by backend, style and stage.
pub fn summarize(records: &[BenchRecord]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<(String, String, String), SummaryRow> = BTreeMap::new();
    for record in records {
        let key = record.key();
        groups
            .entry(key.clone())
            .or_insert_with(|| SummaryRow::empty(key))
            .absorb(record);
    }
    groups.into_values().map(SummaryRow::finish).collect()
}

/// Pair summary rows of one stage present in both artifacts.
pub fn compare(baseline: &[SummaryRow], candidate: &[SummaryRow], stage: &str) -> Vec<CompareRow> {
    let baseline: BTreeMap<_, _> = baseline
        .iter()
        .filter(|row| row.stage == stage)
        .map(|row| (row.key(), row))
        .collect();

    candidate
        .iter()
        .filter(|row| row.stage == stage)
        .filter_map(|row| {
            let base = baseline.get(&row.key())?;
            Some(CompareRow {
                backend: row.backend.clone(),
                style: row.style.clone(),
                stage: row.stage.clone(),
                baseline_mean_duration_ms: base.mean_duration_ms,
                candidate_mean_duration_ms: row.mean_duration_ms,
                duration_change_pct: percent_change(base.mean_duration_ms, row.mean_duration_ms),
            })
        })
        .collect()
}

/// True when any row slowed down by more than `threshold_pct`.
pub fn regressed(rows: &[CompareRow], threshold_pct: Option<f64>) -> bool {
    let Some(threshold) = threshold_pct else {
        return false;
    };
    rows.iter()
        .filter_map(|row| row.duration_change_pct)
        .any(|pct| pct > threshold)
}

fn percent_change(baseline: f64, candidate: f64) -> Option<f64> {
    (baseline.abs() > f64::EPSILON).then(|| (candidate - baseline) / baseline.abs() * 100.0)
}

pub fn write_jsonl<T: Serialize>(
    path: &Path,
    rows: &[T],
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            rows.push(serde_json::from_str(&line)?);
        }
    }
    Ok(rows)
}

pub fn print_summary_table(rows: &[SummaryRow]) {
    println!(
        "{:<8} {:<30} {:<6} {:>7} {:>11} {:>11} {:>8} {:>8} {:>10}",
        "backend", "style", "stage", "samples", "mean_ms", "max_ms", "solves", "failed", "rss_mb"
    );
    for row in rows {
        println!(
            "{:<8} {:<30} {:<6} {:>7} {:>11.3} {:>11.3} {:>8} {:>8} {:>10}",
            row.backend,
            row.style,
            row.stage,
            row.samples,
            row.mean_duration_ms,
            row.max_duration_ms,
            row.solves,
            row.failures,
            row.max_rss_after_bytes.map_or_else(
                || "-".to_string(),
                |bytes| format!("{:.1}", bytes as f64 / 1_048_576.0),
            ),
        );
    }
}

pub fn print_compare_table(rows: &[CompareRow]) {
    println!(
        "{:<8} {:<30} {:<6} {:>11} {:>11} {:>8}",
        "backend", "style", "stage", "base_ms", "cand_ms", "change%"
    );
    for row in rows {
        println!(
            "{:<8} {:<30} {:<6} {:>11.3} {:>11.3} {:>8}",
            row.backend,
            row.style,
            row.stage,
            row.baseline_mean_duration_ms,
            row.candidate_mean_duration_ms,
            row.duration_change_pct
                .map_or_else(|| "-".to_string(), |pct| format!("{pct:+.1}")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(stage: &str, step: Option<u32>, duration_ms: f64, rss: Option<u64>) -> BenchRecord {
        BenchRecord {
            schema_version: SCHEMA_VERSION,
            run_id: "run".to_string(),
            backend: "highs".to_string(),
            method: "simplex".to_string(),
            style: "MAXIMIZE_OBJECTIVE_FLUX".to_string(),
            cells: 16,
            models: 2,
            workers: 4,
            stage: stage.to_string(),
            step,
            duration_ms,
            solves: 32,
            failures: 1,
            mean_objective: Some(2.0),
            rss_after_bytes: rss,
            rss_delta_bytes: None,
            peak_rss_bytes: None,
        }
    }

    fn approx_eq(left: f64, right: f64) {
        assert!((left - right).abs() < 1e-9, "left={left}, right={right}");
    }

    #[test]
    fn summarize_folds_steps_together() {
        let records = vec![
            record("step-0", Some(0), 10.0, Some(1_000)),
            record("step-1", Some(1), 30.0, None),
            record("total", None, 50.0, None),
        ];

        let summary = summarize(&records);
        assert_eq!(summary.len(), 2);
        let step = summary.iter().find(|row| row.stage == "step").unwrap();
        assert_eq!(step.samples, 2);
        approx_eq(step.mean_duration_ms, 20.0);
        approx_eq(step.max_duration_ms, 30.0);
        assert_eq!(step.solves, 64);
        assert_eq!(step.failures, 2);
        assert_eq!(step.max_rss_after_bytes, Some(1_000));
    }

    #[test]
    fn compare_flags_slowdowns_over_threshold() {
        let baseline = summarize(&[record("total", None, 100.0, None)]);
        let candidate = summarize(&[
            record("total", None, 120.0, None),
            record("build", None, 1.0, None),
        ]);

        let rows = compare(&baseline, &candidate, "total");
        assert_eq!(rows.len(), 1);
        approx_eq(rows[0].duration_change_pct.unwrap(), 20.0);
        assert!(regressed(&rows, Some(10.0)));
        assert!(!regressed(&rows, Some(25.0)));
        assert!(!regressed(&rows, None));
        assert!(compare(&baseline, &candidate, "build").is_empty());
    }

    #[test]
    fn jsonl_round_trip_skips_blank_lines() {
        let dir = std::env::temp_dir().join(format!("fba-bench-{}", std::process::id()));
        let path = dir.join("records.jsonl");
        let records = vec![record("build", None, 1.5, Some(10))];
        write_jsonl(&path, &records).unwrap();
        let mut text = std::fs::read_to_string(&path).unwrap();
        text.push('\n');
        std::fs::write(&path, text).unwrap();

        let back: Vec<BenchRecord> = read_jsonl(&path).unwrap();
        assert_eq!(back, records);
        let _ = std::fs::remove_dir_all(dir);
    }
}
