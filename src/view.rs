//! Pure projections of catalog + selection into per-view display data.
//!
//! Every function here is deterministic and side-effect free, so the UI can
//! recompute all views on every frame and tests can snapshot them as JSON.

use serde::{Deserialize, Serialize};

use crate::data::catalog::MetricsCatalog;
use crate::data::mixing::MixingMatrix;
use crate::data::model::{
    COL_CLASSIFICATION, COL_COMPONENT, COL_KAPPA, COL_NORMALIZED_VARIANCE, COL_RATIONALE,
    COL_RHO, COL_TAGS, COL_VARIANCE, Classification, Component, FieldValue, Metric,
};
use crate::selection::SelectionState;

pub const COL_KAPPA_RANK: &str = "kappa rank";
pub const COL_RHO_RANK: &str = "rho rank";

/// Table columns, in display order.
pub const DISPLAY_COLUMNS: [&str; 11] = [
    COL_COMPONENT,
    COL_KAPPA,
    COL_RHO,
    COL_VARIANCE,
    COL_KAPPA_RANK,
    COL_RHO_RANK,
    "dice_FT2",
    "dice_FS0",
    "signal-noise_t",
    COL_CLASSIFICATION,
    COL_TAGS,
];

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

/// One scatter axis: a metric's value or its rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Value(Metric),
    Rank(Metric),
}

impl Axis {
    pub fn label(self) -> String {
        match self {
            Axis::Value(m) => m.label().to_string(),
            Axis::Rank(m) => format!("{} rank", m.label()),
        }
    }

    fn of(self, comp: &Component) -> f64 {
        match self {
            Axis::Value(m) => comp.metric(m),
            Axis::Rank(m) => comp.ranks.get(m) as f64,
        }
    }
}

/// The three standard scatter views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScatterPreset {
    #[default]
    KappaRho,
    KappaRank,
    RhoRank,
}

impl ScatterPreset {
    pub const ALL: [ScatterPreset; 3] = [
        ScatterPreset::KappaRho,
        ScatterPreset::KappaRank,
        ScatterPreset::RhoRank,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ScatterPreset::KappaRho => "Kappa / Rho",
            ScatterPreset::KappaRank => "Kappa rank",
            ScatterPreset::RhoRank => "Rho rank",
        }
    }

    /// `(x, y)` axes.
    pub fn axes(self) -> (Axis, Axis) {
        match self {
            ScatterPreset::KappaRho => (Axis::Value(Metric::Rho), Axis::Value(Metric::Kappa)),
            ScatterPreset::KappaRank => (Axis::Rank(Metric::Kappa), Axis::Value(Metric::Kappa)),
            ScatterPreset::RhoRank => (Axis::Rank(Metric::Rho), Axis::Value(Metric::Rho)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub id: String,
    pub ordinal: usize,
    pub x: f64,
    pub y: f64,
    pub classification: Classification,
    pub selected: bool,
}

/// One point per component, in table order.
pub fn scatter(
    catalog: &MetricsCatalog,
    selection: &SelectionState,
    x: Axis,
    y: Axis,
) -> Vec<ScatterPoint> {
    catalog
        .components()
        .iter()
        .map(|c| ScatterPoint {
            id: c.id.clone(),
            ordinal: c.ordinal,
            x: x.of(c),
            y: y.of(c),
            classification: c.classification(),
            selected: selection.is_selected(c.ordinal),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pie
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub id: String,
    pub ordinal: usize,
    /// Variance explained.
    pub value: f64,
    /// Share of the total, in `[0, 1]`.
    pub fraction: f64,
    pub classification: Classification,
    pub selected: bool,
}

/// Variance-explained slices in navigation order.
///
/// Negative values count as zero so slice angles stay well-defined.
pub fn pie(catalog: &MetricsCatalog, selection: &SelectionState) -> Vec<PieSlice> {
    let comps = catalog.components();
    let total: f64 = comps.iter().map(|c| c.variance_explained.max(0.0)).sum();
    selection
        .navigation_order()
        .iter()
        .map(|&i| {
            let c = &comps[i];
            let value = c.variance_explained;
            PieSlice {
                id: c.id.clone(),
                ordinal: i,
                value,
                fraction: if total > 0.0 { value.max(0.0) / total } else { 0.0 },
                classification: c.classification(),
                selected: selection.is_selected(i),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub id: String,
    pub ordinal: usize,
    pub cells: Vec<String>,
    pub classification: Classification,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    /// Raw column keys.
    pub columns: Vec<String>,
    /// Human-readable headers, same length as `columns`.
    pub labels: Vec<String>,
    pub rows: Vec<TableRow>,
}

/// Header label for a table column.
pub fn column_label(column: &str) -> &str {
    match column {
        COL_KAPPA => "Kappa",
        COL_RHO => "Rho",
        COL_VARIANCE => "Variance %",
        COL_NORMALIZED_VARIANCE => "Norm. Var.",
        "countsigFT2" => "Sig. FT2",
        "countsigFS0" => "Sig. FS0",
        "dice_FT2" => "Dice FT2",
        "dice_FS0" => "Dice FS0",
        "signal-noise_t" => "S/N t",
        "signal-noise_p" => "S/N p",
        "optimal sign" => "Sign",
        COL_CLASSIFICATION => "Classification",
        COL_TAGS => "Tags",
        COL_KAPPA_RANK => "κ Rank",
        COL_RHO_RANK => "ρ Rank",
        COL_RATIONALE => "Rationale",
        other => other,
    }
}

/// Display text of a cell: `—` when empty, scientific notation for tiny
/// non-zero numbers, two decimals otherwise.
pub fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => "—".to_string(),
        FieldValue::Text(s) if s.is_empty() => "—".to_string(),
        FieldValue::Float(v) if *v != 0.0 && v.abs() < 1e-4 => format!("{v:.2e}"),
        FieldValue::Float(v) => format!("{v:.2}"),
        FieldValue::Integer(i) => format!("{:.2}", *i as f64),
        other => other.to_string(),
    }
}

/// Fixed-order table of the columns the dataset has, rows in table order.
pub fn table(catalog: &MetricsCatalog, selection: &SelectionState) -> TableView {
    let columns: Vec<String> = DISPLAY_COLUMNS
        .iter()
        .filter(|&&col| {
            matches!(col, COL_KAPPA_RANK | COL_RHO_RANK | COL_TAGS) || catalog.has_column(col)
        })
        .map(|s| s.to_string())
        .collect();
    let labels = columns.iter().map(|c| column_label(c).to_string()).collect();

    let rows = catalog
        .components()
        .iter()
        .map(|c| TableRow {
            id: c.id.clone(),
            ordinal: c.ordinal,
            cells: columns.iter().map(|col| cell_text(c, col)).collect(),
            classification: c.classification(),
            selected: selection.is_selected(c.ordinal),
        })
        .collect();

    TableView {
        columns,
        labels,
        rows,
    }
}

fn cell_text(comp: &Component, column: &str) -> String {
    match column {
        COL_COMPONENT => comp.id.clone(),
        COL_KAPPA_RANK => comp.ranks.kappa.to_string(),
        COL_RHO_RANK => comp.ranks.rho.to_string(),
        COL_CLASSIFICATION => comp.classification().to_string(),
        COL_TAGS if comp.tags().is_empty() => "—".to_string(),
        COL_TAGS => comp.tags().to_string(),
        other => comp
            .fields
            .get(other)
            .map(|cell| format_value(&cell.value))
            .unwrap_or_else(|| "—".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Time series and volume frame
// ---------------------------------------------------------------------------

/// Mixing-matrix series of the selected component; empty when nothing is
/// selected or the matrix has no column at that position.
pub fn time_series<'a>(matrix: &'a MixingMatrix, selection: &SelectionState) -> &'a [f64] {
    selection
        .selected()
        .and_then(|i| matrix.series_at(i))
        .unwrap_or(&[])
}

/// 4D frame of the stat map to show for the selection.
pub fn volume_frame(selection: &SelectionState) -> Option<usize> {
    selection.selected()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::tests::catalog;
    use crate::selection::SelectionController;

    fn controller() -> SelectionController {
        SelectionController::new(catalog(&[
            ("ICA_00", 40.0, 10.0, 10.0, "rejected"),
            ("ICA_01", 80.0, 5.0, 30.0, "accepted"),
            ("ICA_02", 20.0, 15.0, 60.0, "accepted"),
        ]))
    }

    #[test]
    fn scatter_flags_only_the_selection() {
        let mut ctl = controller();
        ctl.select("ICA_01").unwrap();
        let (x, y) = ScatterPreset::KappaRho.axes();
        let pts = scatter(ctl.catalog(), ctl.state(), x, y);
        assert_eq!(pts.len(), 3);
        assert_eq!(pts.iter().filter(|p| p.selected).count(), 1);
        assert!(pts[1].selected);
        assert_eq!((pts[1].x, pts[1].y), (5.0, 80.0));
    }

    #[test]
    fn scatter_rank_axis_uses_ranks() {
        let ctl = controller();
        let (x, y) = ScatterPreset::KappaRank.axes();
        let pts = scatter(ctl.catalog(), ctl.state(), x, y);
        let xs: Vec<f64> = pts.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 1.0, 3.0]);
        assert_eq!(pts[0].y, 40.0);
    }

    #[test]
    fn pie_follows_navigation_order() {
        let ctl = controller();
        let slices = pie(ctl.catalog(), ctl.state());
        let ids: Vec<&str> = slices.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["ICA_02", "ICA_01", "ICA_00"]);
        let total: f64 = slices.iter().map(|s| s.fraction).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(slices[0].value, 60.0);
    }

    #[test]
    fn pie_reorders_after_reclassification() {
        let mut ctl = controller();
        ctl.select("ICA_00").unwrap();
        ctl.classify(Classification::Accepted).unwrap();
        let slices = pie(ctl.catalog(), ctl.state());
        assert_eq!(slices[2].id, "ICA_00");
        assert_eq!(slices[2].classification, Classification::Accepted);
        assert!(slices[2].selected);
    }

    #[test]
    fn table_keeps_display_order_and_live_labels() {
        let mut ctl = controller();
        ctl.select("ICA_02").unwrap();
        ctl.classify(Classification::Ignored).unwrap();
        let view = table(ctl.catalog(), ctl.state());
        assert_eq!(
            view.columns,
            vec![
                "Component",
                "kappa",
                "rho",
                "variance explained",
                "kappa rank",
                "rho rank",
                "classification",
                "classification_tags"
            ]
        );
        assert_eq!(view.labels[4], "κ Rank");
        let row = &view.rows[2];
        assert!(row.selected);
        assert_eq!(row.cells, vec!["ICA_02", "20.00", "15.00", "60.00", "3", "1", "ignored", "—"]);
    }

    #[test]
    fn optional_columns_get_short_labels() {
        assert_eq!(column_label(COL_NORMALIZED_VARIANCE), "Norm. Var.");
        assert_eq!(column_label(COL_RATIONALE), "Rationale");
        assert_eq!(column_label("unknown column"), "unknown column");
    }

    #[test]
    fn format_value_cases() {
        assert_eq!(format_value(&FieldValue::Null), "—");
        assert_eq!(format_value(&FieldValue::Float(0.00001234)), "1.23e-5");
        assert_eq!(format_value(&FieldValue::Float(0.0)), "0.00");
        assert_eq!(format_value(&FieldValue::Float(12.3456)), "12.35");
        assert_eq!(format_value(&FieldValue::Integer(7)), "7.00");
        assert_eq!(format_value(&FieldValue::Text("Likely BOLD".into())), "Likely BOLD");
    }

    #[test]
    fn time_series_and_frame_follow_selection() {
        let mut ctl = controller();
        let m = MixingMatrix::parse_tsv("ICA_00\tICA_01\n1\t2\n3\t4\n").unwrap();
        assert!(time_series(&m, ctl.state()).is_empty());
        assert_eq!(volume_frame(ctl.state()), None);

        ctl.select("ICA_01").unwrap();
        assert_eq!(time_series(&m, ctl.state()), &[2.0, 4.0]);
        assert_eq!(volume_frame(ctl.state()), Some(1));

        ctl.select("ICA_02").unwrap();
        assert!(time_series(&m, ctl.state()).is_empty());
    }

    #[test]
    fn projections_are_deterministic() {
        let mut ctl = controller();
        ctl.select("ICA_00").unwrap();
        let snap = || {
            let (x, y) = ScatterPreset::RhoRank.axes();
            serde_json::json!({
                "scatter": scatter(ctl.catalog(), ctl.state(), x, y),
                "pie": pie(ctl.catalog(), ctl.state()),
                "table": table(ctl.catalog(), ctl.state()),
            })
        };
        assert_eq!(snap(), snap());
        assert_eq!(snap()["pie"][2]["id"], "ICA_00");
        assert_eq!(snap()["scatter"][0]["classification"], "rejected");
    }
}
