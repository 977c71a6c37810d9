//! Per-session dashboard state.

mod centiles;

pub use centiles::CentileCache;

use std::collections::BTreeMap;

use roichart_core::{
    CentileKind, Dataset, DatasetProvider, Error, ReferenceCentileTable, Result, SubjectCentiles,
    SubjectMeasurements,
};

use crate::command::{Command, Warning};
use crate::config::{DashboardConfig, PlotDefaults};
use crate::figure::{build_figure, Figure, FigureInput};
use crate::layout::{layout, Layout};
use crate::plot::{
    FieldContext, PlotConfig, PlotField, PlotId, PlotKind, PlotRegistry, PlotUpdate, TraceKind,
};
use crate::selection::{resolve_click, ClickResolution, Selection};
use crate::traces::active_traces;

/// Everything one analysis session owns.
///
/// Every user action goes through [`DashboardState::apply`].
#[derive(Debug, Clone)]
pub struct DashboardState {
    config: DashboardConfig,
    dataset: Dataset,
    registry: PlotRegistry,
    defaults: PlotDefaults,
    selection: Selection,
    per_row: usize,
    references: BTreeMap<CentileKind, ReferenceCentileTable>,
    centile_cache: CentileCache,
}

impl DashboardState {
    /// Creates a session over `dataset` with no plots.
    #[must_use]
    pub fn new(dataset: Dataset, config: DashboardConfig) -> Self {
        let per_row = config
            .per_row
            .clamp(config.min_per_row, config.max_per_row.max(config.min_per_row));
        Self {
            defaults: PlotDefaults::for_config(&config),
            config,
            dataset,
            registry: PlotRegistry::new(),
            selection: Selection::default(),
            per_row,
            references: BTreeMap::new(),
            centile_cache: CentileCache::default(),
        }
    }

    /// Creates a session from a provider, loading every available
    /// reference table.
    ///
    /// # Errors
    /// Returns the provider's error if loading fails.
    pub fn from_provider<P: DatasetProvider>(
        provider: &P,
        config: DashboardConfig,
    ) -> std::result::Result<Self, P::Error> {
        let mut state = Self::new(provider.load_dataset()?, config);
        state.load_references(provider)?;
        Ok(state)
    }

    /// Loads the reference table of every centile kind the provider has.
    ///
    /// Returns the number of tables loaded.
    ///
    /// # Errors
    /// Returns the provider's error if a table cannot be read.
    pub fn load_references<P: DatasetProvider>(
        &mut self,
        provider: &P,
    ) -> std::result::Result<usize, P::Error> {
        let mut loaded = 0;
        for kind in CentileKind::ALL.into_iter().filter(|kind| !kind.is_none()) {
            if let Some(table) = provider.load_centiles(kind)? {
                self.set_reference(kind, table);
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Installs the reference table of one centile kind.
    pub fn set_reference(&mut self, kind: CentileKind, table: ReferenceCentileTable) {
        log::debug!("reference {kind}: {} rows", table.len());
        self.centile_cache.invalidate(kind);
        self.references.insert(kind, table);
    }

    #[must_use]
    pub fn with_reference(mut self, kind: CentileKind, table: ReferenceCentileTable) -> Self {
        self.set_reference(kind, table);
        self
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    #[must_use]
    pub fn registry(&self) -> &PlotRegistry {
        &self.registry
    }

    #[must_use]
    pub fn plot(&self, id: PlotId) -> Option<&PlotConfig> {
        self.registry.get(id)
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Settings the next added plot starts from.
    #[must_use]
    pub fn defaults(&self) -> &PlotDefaults {
        &self.defaults
    }

    #[must_use]
    pub fn per_row(&self) -> usize {
        self.per_row
    }

    #[must_use]
    pub fn reference(&self, kind: CentileKind) -> Option<&ReferenceCentileTable> {
        self.references.get(&kind)
    }

    /// Subject identifiers in sorted order, for a manual subject picker.
    #[must_use]
    pub fn subject_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.dataset.ids().iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Applies one user action.
    ///
    /// # Errors
    /// Returns an error for an unknown plot, an unparseable or invalid field
    /// value, or an out-of-range setting. State is unchanged on error.
    pub fn apply(&mut self, command: Command) -> Result<Vec<Warning>> {
        log::debug!("apply {}", command.name());
        let warnings = match command {
            Command::AddPlot => self.add_plot().map(|_| Vec::new()).unwrap_or_else(|w| vec![w]),
            Command::DeletePlot { plot } => {
                if !self.registry.remove_plot(plot) {
                    log::debug!("{plot} already deleted");
                }
                Vec::new()
            }
            Command::UpdateField { plot, update } => self.update_field(plot, update)?,
            Command::SelectPoint { plot, payload } => {
                let config = self
                    .registry
                    .get(plot)
                    .ok_or_else(|| Error::UnknownPlot(plot.to_string()))?;
                match resolve_click(&self.dataset, config, &payload) {
                    ClickResolution::Empty => Vec::new(),
                    ClickResolution::Subject { id, roi } => {
                        log::debug!("{plot}: selected {id}");
                        self.selection.subject = Some(id);
                        self.selection.roi = roi;
                        Vec::new()
                    }
                    ClickResolution::Ignored(reason) => {
                        vec![Warning::IgnoredClick { plot, reason }]
                    }
                }
            }
            Command::ChangePerRow { per_row } => {
                let range = self.config.per_row_range();
                if !range.contains(&per_row) {
                    return Err(Error::validation(
                        "per_row",
                        format!("{per_row} outside {}..={}", range.start(), range.end()),
                    ));
                }
                self.per_row = per_row;
                Vec::new()
            }
            Command::SelectPlotKind { kind } => {
                self.defaults.kind = kind;
                Vec::new()
            }
            Command::SelectSubject { subject } => {
                if let Some(id) = &subject {
                    if self.dataset.row_of(id).is_none() {
                        return Err(Error::validation("subject", format!("unknown subject {id}")));
                    }
                }
                self.selection.subject = subject;
                Vec::new()
            }
            Command::SelectRoi { roi } => {
                if let Some(name) = &roi {
                    if self.dataset.numeric(name).is_none() {
                        return Err(Error::validation("roi", format!("no numeric column {name}")));
                    }
                }
                self.selection.roi = roi;
                Vec::new()
            }
            Command::ClearSelection => {
                self.selection.clear();
                Vec::new()
            }
            Command::ReplaceDataset(dataset) => {
                self.replace_dataset(*dataset);
                if self.dataset.is_empty() {
                    vec![Warning::EmptyDataset]
                } else {
                    Vec::new()
                }
            }
        };
        for warning in &warnings {
            log::warn!("{warning}");
        }
        Ok(warnings)
    }

    fn update_field(&mut self, plot: PlotId, update: PlotUpdate) -> Result<Vec<Warning>> {
        let field = update.field();
        let ctx = FieldContext {
            dataset: &self.dataset,
            config: &self.config,
        };
        let report = self.registry.update_field(plot, update, &ctx)?;

        if let Some(config) = self.registry.get(plot) {
            match field {
                PlotField::XVar => self.defaults.x_var.clone_from(&config.x_var),
                PlotField::YVar => self.defaults.y_var.clone_from(&config.y_var),
                PlotField::Trend | PlotField::Traces | PlotField::CentileOverlay
                    if config.kind == PlotKind::Scatter =>
                {
                    self.defaults.trend = config.trend;
                    self.defaults.traces.clone_from(&config.traces);
                    self.defaults.centile_overlay = config.centile_overlay;
                }
                _ => {}
            }
        }

        Ok(report
            .forced
            .into_iter()
            .map(|forced| Warning::ForcedField {
                plot,
                field: forced.field,
                reason: forced.reason,
            })
            .collect())
    }

    /// Points the working defaults at existing numeric columns.
    fn ensure_defaults(&mut self) -> std::result::Result<(), Warning> {
        let numeric = self.dataset.numeric_columns();
        let Some(&first) = numeric.first() else {
            return Err(Warning::NoNumericColumns);
        };
        let second = numeric.get(1).copied().unwrap_or(first);
        let usable = |var: &Option<String>| {
            var.as_deref()
                .is_some_and(|name| self.dataset.numeric(name).is_some())
        };
        if !usable(&self.defaults.x_var) {
            self.defaults.x_var = Some(first.to_string());
        }
        if !usable(&self.defaults.y_var) {
            self.defaults.y_var = Some(second.to_string());
        }
        Ok(())
    }

    fn add_plot(&mut self) -> std::result::Result<PlotId, Warning> {
        if self.dataset.is_empty() {
            return Err(Warning::EmptyDataset);
        }
        self.ensure_defaults()?;
        let ctx = FieldContext {
            dataset: &self.dataset,
            config: &self.config,
        };
        Ok(self.registry.add_plot(&self.defaults, Some(&ctx)))
    }

    fn replace_dataset(&mut self, dataset: Dataset) {
        log::debug!("dataset replaced: {} subjects", dataset.len());
        self.dataset = dataset;
        self.registry.reset();
        self.selection.clear();
        self.centile_cache.clear();
    }

    /// Lays out every plot, first adding a default plot if there is none.
    ///
    /// An empty dataset or one without numeric columns lays out nothing.
    pub fn layout(&mut self) -> (Layout, Vec<Warning>) {
        let mut warnings = Vec::new();
        if self.registry.is_empty() {
            if let Err(warning) = self.add_plot() {
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }
        (layout(&self.registry.ids(), self.per_row), warnings)
    }

    /// Layers that `plot` draws with the current selection.
    ///
    /// # Errors
    /// Returns [`Error::UnknownPlot`] for an unknown identifier.
    pub fn active_traces(&self, plot: PlotId) -> Result<Vec<TraceKind>> {
        let config = self
            .registry
            .get(plot)
            .ok_or_else(|| Error::UnknownPlot(plot.to_string()))?;
        Ok(active_traces(config, &self.selection, &self.config))
    }

    /// Figure data of one plot.
    ///
    /// # Errors
    /// Returns [`Error::UnknownPlot`] for an unknown identifier.
    pub fn figure(&self, plot: PlotId) -> Result<Figure> {
        let config = self
            .registry
            .get(plot)
            .ok_or_else(|| Error::UnknownPlot(plot.to_string()))?;
        Ok(build_figure(&FigureInput {
            dataset: &self.dataset,
            config: &self.config,
            plot: config,
            selection: &self.selection,
            reference: self.references.get(&config.centile_overlay),
        }))
    }

    /// Figure data of every plot, in layout order.
    #[must_use]
    pub fn figures(&self) -> Vec<Figure> {
        self.registry
            .ids()
            .into_iter()
            .filter_map(|id| self.figure(id).ok())
            .collect()
    }

    /// Centile estimates of the selected subject against one reference.
    ///
    /// Returns `None` without a selected subject, a loaded table or a finite
    /// age. Results are memoized.
    pub fn subject_centiles(&mut self, kind: CentileKind) -> Option<SubjectCentiles> {
        let subject = self.selection.subject.as_deref()?;
        let row = self.dataset.row_of(subject)?;
        let table = self.references.get(&kind)?;
        let age = *self.dataset.numeric(&self.config.age_variable)?.get(row)?;
        if !age.is_finite() {
            return None;
        }

        let rois = table.rois();
        let measurements = SubjectMeasurements {
            age,
            values: self.dataset.row_values(row, rois.iter().copied()),
        };
        let centiles = self.centile_cache.get_or_compute(kind, table, &measurements);
        for ambiguous in &centiles.ambiguous {
            log::warn!("{subject}: {ambiguous}");
        }
        Some(centiles)
    }

    /// Number of memoized centile estimates.
    #[must_use]
    pub fn cached_centiles(&self) -> usize {
        self.centile_cache.len()
    }
}
