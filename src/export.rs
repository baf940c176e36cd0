//! Reconciliation of manual edits against the loaded classification.

use std::path::Path;

use anyhow::Context;

use crate::data::catalog::MetricsCatalog;
use crate::data::model::{COL_RATIONALE, COL_TAGS, Classification};
use crate::error::{CoreError, Result};

/// Tag appended to components whose classification was changed by hand.
pub const MANUAL_TAG: &str = "Manual classification";
/// Rationale code written for manually changed components.
pub const MANUAL_RATIONALE: &str = "I001";

pub const TABLE_FILE: &str = "manual_classification.tsv";
pub const ACCEPTED_FILE: &str = "accepted_list.txt";
pub const REJECTED_FILE: &str = "rejected_list.txt";

/// The three export artifacts.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    /// Ordinals of components manually changed to accepted.
    pub accepted: Vec<usize>,
    /// Ordinals of components manually changed to rejected.
    pub rejected: Vec<usize>,
    pub table_tsv: Vec<u8>,
    pub accepted_list: Vec<u8>,
    pub rejected_list: Vec<u8>,
}

/// Tag manual edits and render the export artifacts.
///
/// A component is "changed" when its classification differs from the loaded
/// one. Changed components get the marker appended to their loaded `tags`
/// (and `rationale` overwritten, when the table has that column); every other
/// component gets its loaded `tags` and `rationale` back, so a marker left by
/// an earlier export of a since-reverted edit disappears. Nothing else in the
/// catalog is touched.
pub fn export(catalog: &mut MetricsCatalog) -> Result<ExportBundle> {
    let has_rationale = catalog.has_column(COL_RATIONALE);

    for comp in catalog.components_mut() {
        if !comp.is_manually_changed() {
            comp.tags = comp.original_tags.clone();
            comp.rationale = comp.original_rationale.clone();
            continue;
        }
        comp.tags = if has_manual_tag(&comp.original_tags) {
            comp.original_tags.clone()
        } else if comp.original_tags.is_empty() {
            MANUAL_TAG.to_string()
        } else {
            format!("{},{MANUAL_TAG}", comp.original_tags)
        };
        if has_rationale {
            comp.rationale = Some(MANUAL_RATIONALE.to_string());
        }
    }

    let changed_to = |class: Classification| -> Vec<usize> {
        catalog
            .components()
            .iter()
            .filter(|c| c.is_manually_changed() && c.classification() == class)
            .map(|c| c.ordinal)
            .collect()
    };
    let accepted = changed_to(Classification::Accepted);
    let rejected = changed_to(Classification::Rejected);

    log::info!(
        "Export: {} manually accepted, {} manually rejected",
        accepted.len(),
        rejected.len()
    );

    Ok(ExportBundle {
        table_tsv: render_table(catalog)?,
        accepted_list: index_list(&accepted).into_bytes(),
        rejected_list: index_list(&rejected).into_bytes(),
        accepted,
        rejected,
    })
}

fn has_manual_tag(tags: &str) -> bool {
    tags.split(',').any(|t| t.trim() == MANUAL_TAG)
}

/// Comma-separated ordinals, no trailing newline.
pub fn index_list(ordinals: &[usize]) -> String {
    ordinals
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Every component in table order with its live classification and tags.
/// `classification_tags` is appended when the loaded table lacked it.
fn render_table(catalog: &MetricsCatalog) -> Result<Vec<u8>> {
    let mut header: Vec<&str> = catalog.columns().iter().map(String::as_str).collect();
    if !catalog.has_column(COL_TAGS) {
        header.push(COL_TAGS);
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(Vec::new());
    writer
        .write_record(&header)
        .map_err(|e| CoreError::Export(e.to_string()))?;
    for comp in catalog.components() {
        writer
            .write_record(header.iter().map(|col| comp.cell(col)))
            .map_err(|e| CoreError::Export(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| CoreError::Export(e.to_string()))
}

/// Write the bundle into `dir` under the fixed file names.
pub fn write_bundle(dir: &Path, bundle: &ExportBundle) -> anyhow::Result<()> {
    for (name, bytes) in [
        (TABLE_FILE, &bundle.table_tsv),
        (ACCEPTED_FILE, &bundle.accepted_list),
        (REJECTED_FILE, &bundle.rejected_list),
    ] {
        let path = dir.join(name);
        std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    }
    log::info!("Wrote manual classification to {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::tests::catalog;
    use crate::data::loader::parse_metrics_tsv;
    use crate::selection::SelectionController;

    #[test]
    fn manual_accept_is_reported_and_reset_clears_it() {
        let mut ctl = SelectionController::new(catalog(&[
            ("ICA_00", 1.0, 1.0, 1.0, "accepted"),
            ("ICA_01", 1.0, 1.0, 1.0, "rejected"),
        ]));
        ctl.select("ICA_01").unwrap();
        ctl.classify(Classification::Accepted).unwrap();

        let bundle = export(ctl.catalog_mut()).unwrap();
        assert_eq!(bundle.accepted, vec![1]);
        assert!(bundle.rejected.is_empty());
        assert_eq!(bundle.accepted_list, b"1");
        assert_eq!(bundle.rejected_list, b"");
        assert_eq!(ctl.catalog().get("ICA_01").unwrap().tags(), MANUAL_TAG);
        assert_eq!(ctl.catalog().get("ICA_00").unwrap().tags(), "");

        ctl.reset();
        let labels: Vec<Classification> = ctl
            .catalog()
            .components()
            .iter()
            .map(|c| c.classification())
            .collect();
        assert_eq!(labels, vec![Classification::Accepted, Classification::Rejected]);
        let bundle = export(ctl.catalog_mut()).unwrap();
        assert!(bundle.accepted.is_empty());
        assert!(bundle.rejected.is_empty());
        assert_eq!(ctl.catalog().get("ICA_01").unwrap().tags(), "");
    }

    #[test]
    fn table_carries_all_fields_and_rewrites() {
        let text = "Component\tkappa\trho\tvariance explained\tclassification\tclassification_tags\trationale\tnote\n\
ICA_00\t45.5\t12\t20.25\taccepted\tLikely BOLD\t\tx\n\
ICA_01\t12\t30.5\t10\taccepted\t\t\ty\n";
        let (cols, records) = parse_metrics_tsv(text).unwrap();
        let mut cat = MetricsCatalog::load(cols, records).unwrap();
        cat.classify("ICA_01", Classification::Rejected).unwrap();
        cat.classify("ICA_00", Classification::Ignored).unwrap();

        let bundle = export(&mut cat).unwrap();
        assert_eq!(bundle.rejected, vec![1]);
        assert!(bundle.accepted.is_empty());

        let tsv = String::from_utf8(bundle.table_tsv).unwrap();
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(
            lines[0],
            "Component\tkappa\trho\tvariance explained\tclassification\tclassification_tags\trationale\tnote"
        );
        assert_eq!(
            lines[1],
            "ICA_00\t45.5\t12\t20.25\tignored\tLikely BOLD,Manual classification\tI001\tx"
        );
        assert_eq!(
            lines[2],
            "ICA_01\t12\t30.5\t10\trejected\tManual classification\tI001\ty"
        );
    }

    #[test]
    fn tags_column_is_appended_when_missing() {
        let mut cat = catalog(&[("A", 1.0, 1.0, 1.0, "accepted")]);
        cat.classify("A", Classification::Rejected).unwrap();
        let bundle = export(&mut cat).unwrap();
        let tsv = String::from_utf8(bundle.table_tsv).unwrap();
        let mut lines = tsv.lines();
        assert!(lines.next().unwrap().ends_with("\tclassification_tags"));
        assert!(lines.next().unwrap().ends_with("\trejected\tManual classification"));
        assert!(cat.get("A").unwrap().rationale().is_none());
    }

    #[test]
    fn repeated_export_does_not_duplicate_tag() {
        let mut cat = catalog(&[("A", 1.0, 1.0, 1.0, "accepted"), ("B", 1.0, 1.0, 1.0, "accepted")]);
        cat.classify("B", Classification::Rejected).unwrap();
        let first = export(&mut cat).unwrap();
        let second = export(&mut cat).unwrap();
        assert_eq!(first, second);
        assert_eq!(cat.get("B").unwrap().tags(), MANUAL_TAG);
    }

    #[test]
    fn reverted_edit_is_not_listed_and_drops_marker() {
        let mut cat = catalog(&[("A", 1.0, 1.0, 1.0, "accepted"), ("B", 1.0, 1.0, 1.0, "accepted")]);
        cat.classify("B", Classification::Rejected).unwrap();
        let first = export(&mut cat).unwrap();
        assert_eq!(first.rejected, vec![1]);

        cat.classify("B", Classification::Accepted).unwrap();
        assert!(!cat.is_modified());
        let second = export(&mut cat).unwrap();
        assert!(second.accepted.is_empty());
        assert!(second.rejected.is_empty());
        assert_eq!(cat.get("B").unwrap().tags(), "");
    }

    #[test]
    fn loaded_marker_without_edit_is_not_listed() {
        let text = "Component\tkappa\trho\tvariance explained\tclassification\tclassification_tags\trationale\n\
ICA_00\t1\t1\t1\taccepted\tLikely BOLD,Manual classification\tI001\n\
ICA_01\t1\t1\t1\trejected\tUnlikely BOLD\tP002\n";
        let (cols, records) = parse_metrics_tsv(text).unwrap();
        let mut cat = MetricsCatalog::load(cols, records).unwrap();
        let bundle = export(&mut cat).unwrap();
        assert!(bundle.accepted.is_empty());
        assert!(bundle.rejected.is_empty());
        assert_eq!(String::from_utf8(bundle.table_tsv).unwrap(), text);

        // Editing a row that already carries the marker does not repeat it.
        cat.classify("ICA_00", Classification::Rejected).unwrap();
        let bundle = export(&mut cat).unwrap();
        assert_eq!(bundle.rejected, vec![0]);
        assert_eq!(
            cat.get("ICA_00").unwrap().tags(),
            "Likely BOLD,Manual classification"
        );
    }

    #[test]
    fn unedited_table_round_trips_loaded_text() {
        let text = "Component\tkappa\trho\tvariance explained\tclassification\tflag\tcode\n\
007\t45.50\t1.0e-05\t10.0\taccepted\tTrue\t0.10\n\
008\t12\t3.25\t2.000\trejected\tfalse\t\n";
        let (cols, records) = parse_metrics_tsv(text).unwrap();
        let mut cat = MetricsCatalog::load(cols, records).unwrap();
        assert!(cat.get("007").is_some());

        let bundle = export(&mut cat).unwrap();
        let expected: String = text
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    format!("{line}\tclassification_tags\n")
                } else {
                    format!("{line}\t\n")
                }
            })
            .collect();
        assert_eq!(String::from_utf8(bundle.table_tsv).unwrap(), expected);
    }

    #[test]
    fn write_bundle_creates_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut cat = catalog(&[
            ("A", 1.0, 1.0, 1.0, "rejected"),
            ("B", 1.0, 1.0, 1.0, "accepted"),
            ("C", 1.0, 1.0, 1.0, "rejected"),
        ]);
        cat.classify("A", Classification::Accepted).unwrap();
        cat.classify("C", Classification::Accepted).unwrap();
        let bundle = export(&mut cat).unwrap();
        write_bundle(dir.path(), &bundle).unwrap();

        let accepted = std::fs::read_to_string(dir.path().join(ACCEPTED_FILE)).unwrap();
        assert_eq!(accepted, "0,2");
        let rejected = std::fs::read_to_string(dir.path().join(REJECTED_FILE)).unwrap();
        assert_eq!(rejected, "");
        assert!(dir.path().join(TABLE_FILE).exists());
    }
}
