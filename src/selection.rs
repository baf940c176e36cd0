use crate::data::catalog::MetricsCatalog;
use crate::data::model::{Classification, Component};
use crate::error::{CoreError, Result};

// ---------------------------------------------------------------------------
// Selection state
// ---------------------------------------------------------------------------

/// Keyboard traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Which component is selected plus the derived traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Ordinal of the selected component.
    selected: Option<usize>,
    /// Ordinals grouped by classification, then by descending variance explained.
    navigation_order: Vec<usize>,
}

impl SelectionState {
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn navigation_order(&self) -> &[usize] {
        &self.navigation_order
    }

    pub fn is_selected(&self, ordinal: usize) -> bool {
        self.selected == Some(ordinal)
    }
}

/// Stable sort by classification group, then descending variance explained.
pub fn navigation_order(catalog: &MetricsCatalog) -> Vec<usize> {
    let comps = catalog.components();
    let mut order: Vec<usize> = (0..comps.len()).collect();
    order.sort_by(|&a, &b| {
        let (ca, cb) = (&comps[a], &comps[b]);
        ca.classification()
            .navigation_rank()
            .cmp(&cb.classification().navigation_rank())
            .then_with(|| cb.variance_explained.total_cmp(&ca.variance_explained))
    });
    order
}

// ---------------------------------------------------------------------------
// SelectionController
// ---------------------------------------------------------------------------

/// Single owner of the catalog and the selection.
///
/// Views read through [`catalog`](Self::catalog) and [`state`](Self::state);
/// every mutation goes through the methods here so the navigation order can
/// never go stale.
#[derive(Debug, Clone)]
pub struct SelectionController {
    catalog: MetricsCatalog,
    state: SelectionState,
}

impl SelectionController {
    pub fn new(catalog: MetricsCatalog) -> Self {
        let navigation_order = navigation_order(&catalog);
        Self {
            catalog,
            state: SelectionState {
                selected: None,
                navigation_order,
            },
        }
    }

    pub fn catalog(&self) -> &MetricsCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// The selected component, if any.
    pub fn selected(&self) -> Option<&Component> {
        self.state
            .selected
            .and_then(|i| self.catalog.component_at(i))
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected().map(|c| c.id.as_str())
    }

    /// Swap in a freshly loaded catalog. The selection is cleared.
    pub fn replace_catalog(&mut self, catalog: MetricsCatalog) {
        *self = Self::new(catalog);
    }

    pub fn select(&mut self, id: &str) -> Result<()> {
        let ordinal = self
            .catalog
            .index_of(id)
            .ok_or_else(|| CoreError::UnknownComponent(id.to_string()))?;
        self.state.selected = Some(ordinal);
        log::debug!("Selected {id}");
        Ok(())
    }

    /// Select by table position, as clicks on rows and points do.
    pub fn select_ordinal(&mut self, ordinal: usize) -> Result<()> {
        if ordinal >= self.catalog.len() {
            return Err(CoreError::UnknownComponent(format!("#{ordinal}")));
        }
        self.state.selected = Some(ordinal);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.state.selected = None;
    }

    /// Reclassify the selected component. The selection does not move.
    pub fn classify(&mut self, classification: Classification) -> Result<()> {
        let id = self.selected_id().ok_or(CoreError::NoSelection)?.to_string();
        self.catalog.classify(&id, classification)?;
        self.refresh_order();
        Ok(())
    }

    /// Free-text variant of [`classify`](Self::classify).
    pub fn classify_label(&mut self, label: &str) -> Result<()> {
        let classification: Classification = label.parse()?;
        self.classify(classification)
    }

    /// Move one step through the navigation order, wrapping at both ends.
    ///
    /// With nothing selected, `Next` lands on the first entry and
    /// `Previous` on the last.
    pub fn navigate(&mut self, direction: Direction) {
        let order = &self.state.navigation_order;
        let n = order.len();
        if n == 0 {
            return;
        }
        let current = self
            .state
            .selected
            .and_then(|sel| order.iter().position(|&o| o == sel));

        let next_pos = match (current, direction) {
            (None, Direction::Next) => 0,
            (None, Direction::Previous) => n - 1,
            (Some(pos), Direction::Next) => (pos + 1) % n,
            (Some(pos), Direction::Previous) => (pos + n - 1) % n,
        };
        self.state.selected = Some(order[next_pos]);
    }

    /// Restore loaded classifications; the selection stays where it is.
    pub fn reset(&mut self) {
        self.catalog.reset();
        self.refresh_order();
    }

    /// Mutable access for the exporter's tag rewrite. Classifications are
    /// untouched by it, so the order stays valid.
    pub(crate) fn catalog_mut(&mut self) -> &mut MetricsCatalog {
        &mut self.catalog
    }

    fn refresh_order(&mut self) {
        self.state.navigation_order = navigation_order(&self.catalog);
    }
}
