use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde_json::Value as JsonValue;

use super::catalog::{MetricsCatalog, RawRecord};
use super::mixing::MixingMatrix;
use super::model::{COL_COMPONENT, Cell, FieldValue};

// ---------------------------------------------------------------------------
// Loaded dataset
// ---------------------------------------------------------------------------

/// An image file read from the results folder.
#[derive(Debug, Clone)]
pub struct Figure {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

/// Everything in a results folder besides the metrics table.
#[derive(Debug, Clone, Default)]
pub struct Attachments {
    /// Folder the dataset was read from.
    pub root: PathBuf,
    /// Output directory recorded in the `tedana_*.tsv` log, if present.
    pub source_label: Option<String>,
    pub mixing: Option<MixingMatrix>,
    /// `comp_NNN.png` figures.
    pub component_figures: Vec<Figure>,
    /// `*.svg` carpet plots.
    pub carpets: Vec<Figure>,
    /// Contents of `report.txt`.
    pub report: Option<String>,
    /// 4D stat map handed to the volume viewer; never decoded here.
    pub stat_map: Option<PathBuf>,
    pub mask: Option<PathBuf>,
}

impl Attachments {
    /// Component figure for a label: `ICA_07` → `comp_007.png`,
    /// `ICA_100` → `comp_100.png`.
    pub fn figure_for(&self, id: &str) -> Option<&Figure> {
        let digits: String = id.chars().filter(char::is_ascii_digit).collect();
        let number: u64 = digits.parse().ok()?;
        let name = format!("comp_{number:03}.png");
        self.component_figures.iter().find(|f| f.name == name)
    }
}

/// A fully materialized results folder.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub catalog: MetricsCatalog,
    pub attachments: Attachments,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read a tedana results folder (searched recursively).
///
/// The metrics table (`*_metrics.tsv`, PCA tables excluded) is required;
/// everything else is optional.
pub fn load_folder(dir: &Path) -> Result<Dataset> {
    let mut files = Vec::new();
    collect_files(dir, &mut files).with_context(|| format!("listing {}", dir.display()))?;
    files.sort();

    let mut metrics_path = None;
    let mut attachments = Attachments {
        root: dir.to_path_buf(),
        ..Attachments::default()
    };

    for path in files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };

        if name.contains("_metrics.tsv") && !name.contains("PCA") {
            metrics_path = Some(path);
        } else if name.contains("_mixing.tsv") && !name.contains("PCA") {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            attachments.mixing = Some(MixingMatrix::parse_tsv(&text)?);
        } else if name.starts_with("comp_") && name.ends_with(".png") {
            attachments.component_figures.push(read_figure(&path, name)?);
        } else if name.ends_with(".svg") {
            attachments.carpets.push(read_figure(&path, name)?);
        } else if name == "report.txt" {
            attachments.report = Some(
                std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
            );
        } else if name.starts_with("tedana_20") && name.ends_with(".tsv") {
            match std::fs::read_to_string(&path) {
                Ok(text) => attachments.source_label = parse_source_label(&text),
                Err(e) => log::warn!("Skipping {}: {e}", path.display()),
            }
        } else if name.contains("stat-z_components.nii") {
            attachments.stat_map = Some(path);
        } else if name.contains("_mask.nii") {
            attachments.mask = Some(path);
        }
    }

    let Some(metrics_path) = metrics_path else {
        bail!("No *_metrics.tsv file found in {}", dir.display());
    };
    let catalog = load_metrics_file(&metrics_path)?;

    log::info!(
        "Loaded {} components from {} ({} figures, {} carpets, mixing matrix: {})",
        catalog.len(),
        metrics_path.display(),
        attachments.component_figures.len(),
        attachments.carpets.len(),
        attachments.mixing.is_some()
    );

    Ok(Dataset {
        catalog,
        attachments,
    })
}

/// Load just a metrics table.  Dispatch by extension.
///
/// Supported formats:
/// * `.tsv` / `.txt` – tab-separated table with a header row (tedana output)
/// * `.json`         – `[{ "Component": "ICA_00", "kappa": ..., ... }, ...]`
pub fn load_metrics_file(path: &Path) -> Result<MetricsCatalog> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let (columns, records) = match ext.as_str() {
        "tsv" | "txt" => parse_metrics_tsv(&text)?,
        "json" => parse_metrics_json(&text)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    MetricsCatalog::load(columns, records)
        .with_context(|| format!("building catalog from {}", path.display()))
}

// ---------------------------------------------------------------------------
// TSV metrics table
// ---------------------------------------------------------------------------

/// Parse a tab-separated metrics table into header order and records.
///
/// Rows whose field count differs from the header are skipped with a warning.
pub fn parse_metrics_tsv(text: &str) -> Result<(Vec<String>, Vec<RawRecord>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .context("reading TSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping metrics row {row_no}: {e}");
                continue;
            }
        };
        let raw: RawRecord = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), Cell::parse(value)))
            .collect();
        records.push(raw);
    }

    Ok((headers, records))
}

// ---------------------------------------------------------------------------
// JSON metrics table
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
///
/// Column order follows the first record, with `Component` moved to the front.
pub fn parse_metrics_json(text: &str) -> Result<(Vec<String>, Vec<RawRecord>)> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        if columns.is_empty() {
            columns = obj.keys().cloned().collect();
            if let Some(pos) = columns.iter().position(|c| c == COL_COMPONENT) {
                let id_col = columns.remove(pos);
                columns.insert(0, id_col);
            }
        }
        records.push(
            obj.iter()
                .map(|(k, v)| (k.clone(), json_to_cell(v)))
                .collect(),
        );
    }

    Ok((columns, records))
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        // Number text as written in the file, not re-rendered from f64.
        JsonValue::Number(n) => Cell {
            value: json_to_field(val),
            text: n.to_string(),
        },
        _ => Cell::from(json_to_field(val)),
    }
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

fn read_figure(path: &Path, name: String) -> Result<Figure> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(Figure {
        name,
        bytes: bytes.into(),
    })
}

/// The output directory sits after the colon in the last cell of the
/// first row of the tedana log table.
fn parse_source_label(text: &str) -> Option<String> {
    let first = text.lines().find(|l| !l.trim().is_empty())?;
    let last_cell = first.split('\t').last()?;
    let (_, path) = last_cell.split_once(':')?;
    let path = path.trim();
    (!path.is_empty()).then(|| path.to_string())
}
