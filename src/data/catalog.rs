use std::collections::{BTreeMap, HashMap};

use crate::error::{CoreError, Result};

use super::model::{
    COL_CLASSIFICATION, COL_COMPONENT, COL_KAPPA, COL_NORMALIZED_VARIANCE, COL_RATIONALE,
    COL_RHO, COL_TAGS, COL_VARIANCE, Cell, Classification, Component, REQUIRED_COLUMNS, Ranks,
};

/// One raw row of the metrics table: column → cell.
pub type RawRecord = BTreeMap<String, Cell>;

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Rank values in descending order, the largest getting rank 1.
///
/// Equal values share the rank of the first occurrence of that value in the
/// sorted order, so `[5, 5, 3]` ranks as `[1, 1, 3]`. This first-match rule is
/// intentional and differs from average or dense ranking.
pub fn rank(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // Stable, so equal values keep their input order.
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut ranks = vec![0; values.len()];
    let mut run_rank = 0;
    for (pos, &idx) in order.iter().enumerate() {
        let starts_run = pos == 0 || values[order[pos - 1]] != values[idx];
        if starts_run {
            run_rank = pos + 1;
        }
        ranks[idx] = run_rank;
    }
    ranks
}

// ---------------------------------------------------------------------------
// MetricsCatalog
// ---------------------------------------------------------------------------

/// Ordered collection of components with derived ranks.
///
/// Built once per loaded dataset and replaced wholesale on reload; afterwards
/// only classification, tags and rationale of individual components change.
#[derive(Debug, Clone)]
pub struct MetricsCatalog {
    components: Vec<Component>,
    columns: Vec<String>,
    by_id: HashMap<String, usize>,
}

impl MetricsCatalog {
    /// Build a catalog from raw records, computing ranks and snapshotting the
    /// loaded classifications.
    ///
    /// `columns` is the table's header order, used when exporting.
    pub fn load(columns: Vec<String>, records: Vec<RawRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(CoreError::MalformedInput("metrics table has no rows".into()));
        }

        let has_normalized = records
            .iter()
            .all(|r| r.get(COL_NORMALIZED_VARIANCE).and_then(Cell::as_f64).is_some());

        let mut components = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());

        for (ordinal, fields) in records.into_iter().enumerate() {
            for col in REQUIRED_COLUMNS {
                if !fields.get(col).is_some_and(|c| !c.is_null()) {
                    return Err(CoreError::MalformedInput(format!(
                        "row {ordinal}: missing '{col}'"
                    )));
                }
            }

            let id = fields[COL_COMPONENT].text.trim().to_string();
            if by_id.insert(id.clone(), ordinal).is_some() {
                return Err(CoreError::MalformedInput(format!(
                    "row {ordinal}: duplicate component '{id}'"
                )));
            }

            let classification: Classification = fields[COL_CLASSIFICATION]
                .text
                .parse()
                .map_err(|e| CoreError::MalformedInput(format!("row {ordinal}: {e}")))?;
            let tags = fields.get(COL_TAGS).map(|c| c.text.clone()).unwrap_or_default();
            let rationale = fields.get(COL_RATIONALE).map(|c| c.text.clone());

            components.push(Component {
                kappa: numeric(&fields, COL_KAPPA, ordinal)?,
                rho: numeric(&fields, COL_RHO, ordinal)?,
                variance_explained: numeric(&fields, COL_VARIANCE, ordinal)?,
                normalized_variance: fields
                    .get(COL_NORMALIZED_VARIANCE)
                    .and_then(Cell::as_f64),
                ranks: Ranks::default(),
                classification,
                original_classification: classification,
                original_tags: tags.clone(),
                tags,
                original_rationale: rationale.clone(),
                rationale,
                id,
                ordinal,
                fields,
            });
        }

        let kappa: Vec<f64> = components.iter().map(|c| c.kappa).collect();
        let rho: Vec<f64> = components.iter().map(|c| c.rho).collect();
        let variance: Vec<f64> = components
            .iter()
            .map(|c| match (has_normalized, c.normalized_variance) {
                (true, Some(v)) => v,
                _ => c.variance_explained,
            })
            .collect();

        let (kappa, rho, variance) = (rank(&kappa), rank(&rho), rank(&variance));
        for (i, comp) in components.iter_mut().enumerate() {
            comp.ranks = Ranks {
                kappa: kappa[i],
                rho: rho[i],
                variance: variance[i],
            };
        }

        Ok(Self {
            components,
            columns,
            by_id,
        })
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components in table order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Column names in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&Component> {
        self.index_of(id).map(|i| &self.components[i])
    }

    pub fn component_at(&self, ordinal: usize) -> Option<&Component> {
        self.components.get(ordinal)
    }

    /// Change one component's classification from a free-text label.
    pub fn set_classification(&mut self, id: &str, label: &str) -> Result<()> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| CoreError::UnknownComponent(id.to_string()))?;
        let classification: Classification = label.parse()?;
        self.components[idx].classification = classification;
        Ok(())
    }

    /// Typed variant of [`set_classification`](Self::set_classification).
    pub fn classify(&mut self, id: &str, classification: Classification) -> Result<()> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| CoreError::UnknownComponent(id.to_string()))?;
        self.components[idx].classification = classification;
        Ok(())
    }

    /// Restore every component's classification, tags and rationale to the
    /// loaded values. Ranks are never touched.
    pub fn reset(&mut self) {
        for comp in &mut self.components {
            comp.classification = comp.original_classification;
            comp.tags = comp.original_tags.clone();
            comp.rationale = comp.original_rationale.clone();
        }
    }

    /// Whether any component differs from its loaded classification.
    pub fn is_modified(&self) -> bool {
        self.components.iter().any(Component::is_manually_changed)
    }

    /// Number of components per current classification.
    pub fn count_by_classification(&self) -> BTreeMap<Classification, usize> {
        let mut counts = BTreeMap::new();
        for comp in &self.components {
            *counts.entry(comp.classification).or_insert(0) += 1;
        }
        counts
    }

    pub(crate) fn components_mut(&mut self) -> &mut [Component] {
        &mut self.components
    }
}

fn numeric(fields: &RawRecord, col: &str, ordinal: usize) -> Result<f64> {
    fields
        .get(col)
        .and_then(Cell::as_f64)
        .ok_or_else(|| CoreError::MalformedInput(format!("row {ordinal}: '{col}' is not a number")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::model::FieldValue;

    /// Build a catalog from `(id, kappa, rho, variance, classification)` rows.
    pub(crate) fn catalog(rows: &[(&str, f64, f64, f64, &str)]) -> MetricsCatalog {
        let columns: Vec<String> = [COL_COMPONENT, COL_KAPPA, COL_RHO, COL_VARIANCE, COL_CLASSIFICATION]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let records = rows
            .iter()
            .map(|&(id, kappa, rho, var, class)| {
                let mut r = RawRecord::new();
                r.insert(COL_COMPONENT.into(), FieldValue::Text(id.into()).into());
                r.insert(COL_KAPPA.into(), FieldValue::Float(kappa).into());
                r.insert(COL_RHO.into(), FieldValue::Float(rho).into());
                r.insert(COL_VARIANCE.into(), FieldValue::Float(var).into());
                r.insert(COL_CLASSIFICATION.into(), FieldValue::Text(class.into()).into());
                r
            })
            .collect();
        MetricsCatalog::load(columns, records).unwrap()
    }

    #[test]
    fn rank_uses_first_occurrence_for_ties() {
        assert_eq!(rank(&[5.0, 5.0, 3.0]), vec![1, 1, 3]);
        assert_eq!(rank(&[3.0, 5.0, 5.0, 1.0]), vec![3, 1, 1, 4]);
        assert!(rank(&[]).is_empty());
    }

    #[test]
    fn rank_is_monotone_and_bounded() {
        let values = [0.3, 7.5, -2.0, 7.5, 0.0, 12.25, 0.3, 4.0];
        let ranks = rank(&values);
        let n = values.len();
        for (i, &ri) in ranks.iter().enumerate() {
            assert!((1..=n).contains(&ri));
            for (j, &rj) in ranks.iter().enumerate() {
                if values[i] > values[j] {
                    assert!(ri < rj, "{} > {} but rank {ri} >= {rj}", values[i], values[j]);
                }
            }
        }
        assert_eq!(ranks[5], 1);
    }

    #[test]
    fn load_computes_ranks_per_metric() {
        let cat = catalog(&[
            ("ICA_00", 50.0, 10.0, 30.0, "accepted"),
            ("ICA_01", 20.0, 40.0, 50.0, "rejected"),
            ("ICA_02", 50.0, 5.0, 20.0, "accepted"),
        ]);
        let ranks: Vec<Ranks> = cat.components().iter().map(|c| c.ranks).collect();
        assert_eq!(ranks.iter().map(|r| r.kappa).collect::<Vec<_>>(), vec![1, 3, 1]);
        assert_eq!(ranks.iter().map(|r| r.rho).collect::<Vec<_>>(), vec![2, 1, 3]);
        assert_eq!(ranks.iter().map(|r| r.variance).collect::<Vec<_>>(), vec![2, 1, 3]);
    }

    #[test]
    fn load_prefers_normalized_variance_for_rank() {
        let columns = vec![
            COL_COMPONENT.to_string(),
            COL_KAPPA.to_string(),
            COL_RHO.to_string(),
            COL_VARIANCE.to_string(),
            COL_NORMALIZED_VARIANCE.to_string(),
            COL_CLASSIFICATION.to_string(),
        ];
        let records = [("A", 10.0, 0.9), ("B", 20.0, 0.1)]
            .iter()
            .map(|&(id, var, norm)| {
                let mut r = RawRecord::new();
                r.insert(COL_COMPONENT.into(), FieldValue::Text(id.into()).into());
                r.insert(COL_KAPPA.into(), FieldValue::Float(1.0).into());
                r.insert(COL_RHO.into(), FieldValue::Float(1.0).into());
                r.insert(COL_VARIANCE.into(), FieldValue::Float(var).into());
                r.insert(COL_NORMALIZED_VARIANCE.into(), FieldValue::Float(norm).into());
                r.insert(COL_CLASSIFICATION.into(), FieldValue::Text("accepted".into()).into());
                r
            })
            .collect();
        let cat = MetricsCatalog::load(columns, records).unwrap();
        assert_eq!(cat.get("A").unwrap().ranks.variance, 1);
        assert_eq!(cat.get("B").unwrap().ranks.variance, 2);
    }

    #[test]
    fn load_rejects_empty_and_missing_metrics() {
        assert!(matches!(
            MetricsCatalog::load(vec![], vec![]),
            Err(CoreError::MalformedInput(_))
        ));

        let mut r = RawRecord::new();
        r.insert(COL_COMPONENT.into(), FieldValue::Text("ICA_00".into()).into());
        r.insert(COL_KAPPA.into(), FieldValue::Float(1.0).into());
        r.insert(COL_VARIANCE.into(), FieldValue::Float(1.0).into());
        r.insert(COL_CLASSIFICATION.into(), FieldValue::Text("accepted".into()).into());
        let err = MetricsCatalog::load(vec![], vec![r]).unwrap_err();
        assert_eq!(err, CoreError::MalformedInput("row 0: missing 'rho'".into()));
    }

    #[test]
    fn load_rejects_unknown_label_and_duplicate_ids() {
        let mut r = RawRecord::new();
        r.insert(COL_COMPONENT.into(), FieldValue::Text("ICA_00".into()).into());
        r.insert(COL_KAPPA.into(), FieldValue::Float(1.0).into());
        r.insert(COL_RHO.into(), FieldValue::Float(1.0).into());
        r.insert(COL_VARIANCE.into(), FieldValue::Float(1.0).into());
        r.insert(COL_CLASSIFICATION.into(), FieldValue::Text("accepted".into()).into());
        let dup = MetricsCatalog::load(vec![], vec![r.clone(), r.clone()]);
        assert!(matches!(dup, Err(CoreError::MalformedInput(_))));

        r.insert(COL_CLASSIFICATION.into(), FieldValue::Text("provisional".into()).into());
        assert!(matches!(
            MetricsCatalog::load(vec![], vec![r]),
            Err(CoreError::MalformedInput(_))
        ));
    }

    #[test]
    fn set_classification_validates_id_and_label() {
        let mut cat = catalog(&[("A", 1.0, 1.0, 1.0, "accepted")]);
        assert_eq!(
            cat.set_classification("Z", "rejected"),
            Err(CoreError::UnknownComponent("Z".into()))
        );
        assert_eq!(
            cat.set_classification("A", "bogus"),
            Err(CoreError::InvalidLabel("bogus".into()))
        );
        assert_eq!(cat.get("A").unwrap().classification(), Classification::Accepted);

        cat.set_classification("A", "rejected").unwrap();
        let a = cat.get("A").unwrap();
        assert_eq!(a.classification(), Classification::Rejected);
        assert_eq!(a.original_classification(), Classification::Accepted);
        assert_eq!(a.tags(), "");
    }

    #[test]
    fn reset_restores_original_labels_and_keeps_ranks() {
        let mut cat = catalog(&[
            ("A", 3.0, 1.0, 1.0, "accepted"),
            ("B", 2.0, 2.0, 2.0, "rejected"),
        ]);
        let before: Vec<Ranks> = cat.components().iter().map(|c| c.ranks).collect();
        cat.classify("A", Classification::Ignored).unwrap();
        assert!(cat.is_modified());

        cat.reset();
        assert!(!cat.is_modified());
        assert_eq!(cat.get("A").unwrap().classification(), Classification::Accepted);
        let after: Vec<Ranks> = cat.components().iter().map(|c| c.ranks).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn counts_by_classification() {
        let cat = catalog(&[
            ("A", 1.0, 1.0, 1.0, "accepted"),
            ("B", 1.0, 1.0, 1.0, "rejected"),
            ("C", 1.0, 1.0, 1.0, "accepted"),
        ]);
        let counts = cat.count_by_classification();
        assert_eq!(counts[&Classification::Accepted], 2);
        assert_eq!(counts[&Classification::Rejected], 1);
        assert!(!counts.contains_key(&Classification::Ignored));
    }
}
