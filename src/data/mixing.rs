use anyhow::{Context, Result};

/// Time-by-component matrix, stored transposed as one series per component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixingMatrix {
    /// Component labels from the header row (`ICA_00`, `ICA_01`, ...).
    pub headers: Vec<String>,
    /// `series[component][timepoint]`.
    pub series: Vec<Vec<f64>>,
}

impl MixingMatrix {
    /// Parse a tab-separated mixing matrix whose first row holds component
    /// labels and whose remaining rows are timepoints.
    ///
    /// Cells that are not numbers read as `0.0`; short rows are padded the
    /// same way. Fewer than two rows yields an empty matrix.
    pub fn parse_tsv(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for (row_no, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("mixing matrix row {row_no}"))?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            rows.push(record);
        }

        if rows.len() < 2 {
            return Ok(Self::default());
        }

        let headers: Vec<String> = rows[0].iter().map(|h| h.trim().to_string()).collect();
        let mut series = vec![Vec::with_capacity(rows.len() - 1); headers.len()];
        for row in &rows[1..] {
            for (c, column) in series.iter_mut().enumerate() {
                let value = row
                    .get(c)
                    .and_then(|cell| cell.trim().parse::<f64>().ok())
                    .unwrap_or(0.0);
                column.push(value);
            }
        }

        Ok(Self { headers, series })
    }

    pub fn component_count(&self) -> usize {
        self.series.len()
    }

    pub fn timepoints(&self) -> usize {
        self.series.first().map_or(0, Vec::len)
    }

    /// Series of the component at `ordinal`, if the matrix has that column.
    pub fn series_at(&self, ordinal: usize) -> Option<&[f64]> {
        self.series.get(ordinal).map(Vec::as_slice)
    }

    /// Column index of a component label, accepting both `ICA_07` and `ICA07`.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        let alt = label.replacen("ICA", "ICA_", 1);
        self.headers.iter().position(|h| h == label || *h == alt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_transposes_to_component_series() {
        let text = "ICA_00\tICA_01\n1.0\t-1.0\n2.0\t-2.0\n3.0\t-3.0\n";
        let m = MixingMatrix::parse_tsv(text).unwrap();
        assert_eq!(m.headers, vec!["ICA_00", "ICA_01"]);
        assert_eq!(m.component_count(), 2);
        assert_eq!(m.timepoints(), 3);
        assert_eq!(m.series_at(1), Some(&[-1.0, -2.0, -3.0][..]));
        assert_eq!(m.series_at(2), None);
    }

    #[test]
    fn parse_reads_bad_cells_as_zero() {
        let text = "A\tB\n1.5\tn/a\n\n2.5\n";
        let m = MixingMatrix::parse_tsv(text).unwrap();
        assert_eq!(m.series[0], vec![1.5, 2.5]);
        assert_eq!(m.series[1], vec![0.0, 0.0]);
    }

    #[test]
    fn parse_header_only_is_empty() {
        let m = MixingMatrix::parse_tsv("ICA_00\tICA_01\n").unwrap();
        assert_eq!(m, MixingMatrix::default());
    }

    #[test]
    fn index_of_accepts_label_variants() {
        let m = MixingMatrix::parse_tsv("ICA_00\tICA_01\n0\t1\n").unwrap();
        assert_eq!(m.index_of("ICA_01"), Some(1));
        assert_eq!(m.index_of("ICA01"), Some(1));
        assert_eq!(m.index_of("ICA_09"), None);
    }
}
