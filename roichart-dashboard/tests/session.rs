#![allow(clippy::float_cmp)]
use approx::assert_relative_eq;
use roichart_core::{
    augment_with_centiles, compute_axis_bounds, CentileKind, Column, Dataset, Error,
    ReferenceCentileTable,
};
use roichart_dashboard::{
    ClickPayload, Command, DashboardConfig, DashboardState, Geometry, GridCell, PlotId, PlotKind,
    PlotField, PlotUpdate, TraceKind, TrendKind, Warning,
};

fn reference() -> ReferenceCentileTable {
    ReferenceCentileTable::new(vec![5.0, 25.0, 50.0, 75.0, 95.0])
        .unwrap()
        .with_row("GM", 60.0, vec![400.0, 450.0, 500.0, 550.0, 600.0])
        .unwrap()
        .with_row("GM", 70.0, vec![380.0, 430.0, 480.0, 530.0, 580.0])
        .unwrap()
        .with_row("WM", 60.0, vec![300.0, 350.0, 400.0, 450.0, 500.0])
        .unwrap()
        .with_row("WM", 70.0, vec![280.0, 330.0, 380.0, 430.0, 480.0])
        .unwrap()
}

fn cohort() -> Dataset {
    let sex = ["Male", "Female", "Female", "Male", "Female", "Male", "Female"];
    Dataset::new("MRID", (1..=7).map(|i| format!("S{i}")).collect())
        .unwrap()
        .with_column(
            "Age",
            Column::Numeric(vec![60.0, 61.0, 63.0, 64.0, 66.0, 68.0, 70.0]),
        )
        .unwrap()
        .with_column(
            "GM",
            Column::Numeric(vec![500.0, 470.0, 520.0, 455.0, 505.0, 480.0, 490.0]),
        )
        .unwrap()
        .with_column(
            "WM",
            Column::Numeric(vec![400.0, 380.0, 420.0, 390.0, 410.0, 370.0, 395.0]),
        )
        .unwrap()
        .with_column(
            "ICV",
            Column::Numeric(vec![1.4e6, 1.5e6, 1.3e6, 1.45e6, 1.35e6, 1.6e6, 1.43e6]),
        )
        .unwrap()
        .with_column("Sex", Column::Categorical(sex.map(String::from).to_vec()))
        .unwrap()
}

fn session() -> DashboardState {
    let scored = augment_with_centiles(&cohort(), &reference(), "Age").unwrap();
    DashboardState::new(scored.dataset, DashboardConfig::default())
        .with_reference(CentileKind::Cn, reference())
}

fn first_plot(state: &mut DashboardState) -> PlotId {
    state.layout();
    state.registry().ids()[0]
}

#[test]
fn test_empty_registry_gets_default_plot() {
    let mut state = session();
    let (grid, warnings) = state.layout();
    assert!(warnings.is_empty());
    assert_eq!(
        grid.cells,
        vec![GridCell {
            plot: PlotId::new(0),
            row: 0,
            col: 0
        }]
    );
    let plot = state.plot(PlotId::new(0)).unwrap();
    assert_eq!(plot.x_var.as_deref(), Some("Age"));
    assert_eq!(plot.y_var.as_deref(), Some("GM"));

    // laying out again does not add another plot
    assert_eq!(state.layout().0.cells.len(), 1);
}

#[test]
fn test_default_plot_falls_back_to_numeric_columns() {
    let ds = Dataset::new("MRID", vec!["A".into(), "B".into()])
        .unwrap()
        .with_column("Hippocampus", Column::Numeric(vec![3.0, 4.0]))
        .unwrap()
        .with_column("Ventricles", Column::Numeric(vec![30.0, 40.0]))
        .unwrap();
    let mut state = DashboardState::new(ds, DashboardConfig::default());
    state.layout();
    let plot = state.plot(PlotId::new(0)).unwrap();
    assert_eq!(plot.x_var.as_deref(), Some("Hippocampus"));
    assert_eq!(plot.y_var.as_deref(), Some("Ventricles"));
}

#[test]
fn test_layout_without_numeric_columns() {
    let ds = Dataset::new("MRID", vec!["A".into()])
        .unwrap()
        .with_column("Site", Column::Categorical(vec!["X".into()]))
        .unwrap();
    let mut state = DashboardState::new(ds, DashboardConfig::default());
    let (grid, warnings) = state.layout();
    assert!(grid.cells.is_empty());
    assert_eq!(warnings, vec![Warning::NoNumericColumns]);
}

#[test]
fn test_layout_of_empty_dataset() {
    let ds = Dataset::new("MRID", Vec::new()).unwrap();
    let mut state = DashboardState::new(ds, DashboardConfig::default());
    let (grid, warnings) = state.layout();
    assert!(grid.cells.is_empty());
    assert_eq!(warnings, vec![Warning::EmptyDataset]);
}

#[test]
fn test_grid_follows_per_row() {
    let mut state = session();
    for _ in 0..5 {
        state.apply(Command::AddPlot).unwrap();
    }
    state.apply(Command::ChangePerRow { per_row: 3 }).unwrap();
    let (grid, _) = state.layout();
    assert_eq!(grid.rows(), 2);
    assert_eq!((grid.cells[4].row, grid.cells[4].col), (1, 1));

    state
        .apply(Command::DeletePlot {
            plot: PlotId::new(0),
        })
        .unwrap();
    // deleting twice is a no-op
    state
        .apply(Command::DeletePlot {
            plot: PlotId::new(0),
        })
        .unwrap();
    let (grid, _) = state.layout();
    assert_eq!(grid.cells[0].plot, PlotId::new(1));
    assert_eq!(grid.cells.len(), 4);
}

#[test]
fn test_grouped_click_selects_third_female() {
    let mut state = session();
    let id = first_plot(&mut state);
    state
        .apply(Command::UpdateField {
            plot: id,
            update: PlotUpdate::GroupBy(Some("Sex".into())),
        })
        .unwrap();

    let warnings = state
        .apply(Command::SelectPoint {
            plot: id,
            payload: ClickPayload::point(2, Some("Female")),
        })
        .unwrap();
    assert!(warnings.is_empty());
    // females in dataset order: S2, S3, S5, S7
    assert_eq!(state.selection().subject.as_deref(), Some("S5"));
    assert_eq!(state.selection().roi.as_deref(), Some("GM"));
}

#[test]
fn test_click_on_filtered_group() {
    let mut state = session();
    let id = first_plot(&mut state);
    for update in [
        PlotUpdate::GroupBy(Some("Sex".into())),
        PlotUpdate::GroupValues(vec!["Male".into()]),
    ] {
        state
            .apply(Command::UpdateField { plot: id, update })
            .unwrap();
    }
    state
        .apply(Command::SelectPoint {
            plot: id,
            payload: ClickPayload::point(1, Some("Male")),
        })
        .unwrap();
    assert_eq!(state.selection().subject.as_deref(), Some("S4"));

    let warnings = state
        .apply(Command::SelectPoint {
            plot: id,
            payload: ClickPayload::point(0, Some("Female")),
        })
        .unwrap();
    assert!(matches!(warnings.as_slice(), [Warning::IgnoredClick { .. }]));
    assert_eq!(state.selection().subject.as_deref(), Some("S4"));
}

#[test]
fn test_empty_click_is_noop() {
    let mut state = session();
    let id = first_plot(&mut state);
    let warnings = state
        .apply(Command::SelectPoint {
            plot: id,
            payload: ClickPayload::default(),
        })
        .unwrap();
    assert!(warnings.is_empty());
    assert!(state.selection().is_empty());
}

#[test]
fn test_x_change_to_non_age_clears_centiles() {
    let mut state = session();
    let id = first_plot(&mut state);
    state
        .apply(Command::UpdateField {
            plot: id,
            update: PlotUpdate::CentileOverlay(CentileKind::Cn),
        })
        .unwrap();
    assert_eq!(state.active_traces(id).unwrap().len(), 7);

    let warnings = state
        .apply(Command::UpdateField {
            plot: id,
            update: PlotUpdate::XVar("ICV".into()),
        })
        .unwrap();
    assert!(matches!(warnings.as_slice(), [Warning::ForcedField { .. }]));
    let plot = state.plot(id).unwrap();
    assert_eq!(plot.centile_overlay, CentileKind::None);
    assert!(!plot.traces.iter().any(|t| t.is_centile()));
    assert_eq!(
        state.active_traces(id).unwrap(),
        vec![TraceKind::Data, TraceKind::LinFit]
    );
}

#[test]
fn test_centile_normalized_plot() {
    let mut state = session();
    let id = first_plot(&mut state);
    for update in [
        PlotUpdate::CentileOverlay(CentileKind::Cn),
        PlotUpdate::CentileNormalized(true),
    ] {
        state
            .apply(Command::UpdateField { plot: id, update })
            .unwrap();
    }
    let plot = state.plot(id).unwrap();
    assert!(plot.centile_normalized);
    assert_eq!(
        plot.y_bounds,
        compute_axis_bounds(state.dataset(), "GM_centiles")
    );

    let figure = state.figure(id).unwrap();
    assert_eq!(figure.y_label.as_deref(), Some("GM (centile)"));
    let median = figure.layers_of(TraceKind::Centile50).next().unwrap();
    let Geometry::Line { points } = &median.geometry else {
        panic!("expected line");
    };
    assert!(points.iter().all(|p| p[1] == 50.0));
}

#[test]
fn test_invalid_field_leaves_state_unchanged() {
    let mut state = session();
    let id = first_plot(&mut state);
    let before = state.plot(id).unwrap().clone();

    let err = roichart_dashboard::PlotUpdate::parse("hue", "Sex").unwrap_err();
    assert!(matches!(err, Error::InvalidField(_)));

    let err = state
        .apply(Command::UpdateField {
            plot: id,
            update: PlotUpdate::Smoothing(0.6),
        })
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(state.plot(id).unwrap(), &before);
}

#[test]
fn test_selected_subject_centiles() {
    let mut state = session();
    assert!(state.subject_centiles(CentileKind::Cn).is_none());

    state
        .apply(Command::SelectSubject {
            subject: Some("S1".into()),
        })
        .unwrap();
    let centiles = state.subject_centiles(CentileKind::Cn).unwrap();
    assert_relative_eq!(centiles.get("GM").unwrap(), 50.0);
    assert_eq!(centiles.reference_age, Some(60.0));

    state.subject_centiles(CentileKind::Cn).unwrap();
    assert_eq!(state.cached_centiles(), 1);
    assert!(state.subject_centiles(CentileKind::CnMales).is_none());
}

#[test]
fn test_replace_dataset_resets_session() {
    let mut state = session();
    state.apply(Command::AddPlot).unwrap();
    state.apply(Command::AddPlot).unwrap();
    state
        .apply(Command::SelectSubject {
            subject: Some("S2".into()),
        })
        .unwrap();

    state
        .apply(Command::ReplaceDataset(Box::new(cohort())))
        .unwrap();
    assert!(state.registry().is_empty());
    assert!(state.selection().is_empty());

    state.apply(Command::AddPlot).unwrap();
    assert_eq!(state.registry().ids(), vec![PlotId::new(0)]);
}

#[test]
fn test_distribution_plot_session() {
    let mut state = session();
    let id = first_plot(&mut state);
    for update in [
        PlotUpdate::Trend(TrendKind::Smoothed),
        PlotUpdate::XVar("GM".into()),
        PlotUpdate::Kind(PlotKind::Distribution),
        PlotUpdate::CorrectIcv(true),
    ] {
        state
            .apply(Command::UpdateField { plot: id, update })
            .unwrap();
    }
    let plot = state.plot(id).unwrap();
    assert_eq!(plot.trend, TrendKind::None);
    assert!(plot.x_bounds.is_some());

    let warnings = state
        .apply(Command::SelectPoint {
            plot: id,
            payload: ClickPayload::point(0, None),
        })
        .unwrap();
    assert!(matches!(warnings.as_slice(), [Warning::IgnoredClick { .. }]));

    let figure = state.figure(id).unwrap();
    assert_eq!(figure.x_label.as_deref(), Some("GM (ICV corrected)"));
    assert!(figure.layers_of(TraceKind::Density).next().is_some());
}

#[test]
fn test_figures_serialize() {
    let mut state = session();
    state.layout();
    let json = serde_json::to_string(&state.figures()).unwrap();
    assert!(json.contains("\"lin_fit\""));
}

fn update(state: &mut DashboardState, plot: PlotId, update: PlotUpdate) -> Vec<Warning> {
    state
        .apply(Command::UpdateField { plot, update })
        .unwrap()
}

#[test]
fn test_copied_centile_tags_cleared_on_non_age_x() {
    let mut state = session();
    let first = first_plot(&mut state);
    update(&mut state, first, PlotUpdate::CentileOverlay(CentileKind::Cn));
    update(
        &mut state,
        first,
        PlotUpdate::Traces([TraceKind::Data, TraceKind::LinFit, TraceKind::Centile50].into()),
    );

    state.apply(Command::AddPlot).unwrap();
    let second = state.registry().ids()[1];
    update(&mut state, second, PlotUpdate::XVar("WM".into()));

    let plot = state.plot(second).unwrap();
    assert_eq!(plot.centile_overlay, CentileKind::None);
    assert!(!plot.traces.iter().any(|t| t.is_centile()));
    assert!(!state
        .active_traces(second)
        .unwrap()
        .iter()
        .any(|t| t.is_centile()));

    // the next plot starts on WM from the working defaults, so no centiles either
    state.apply(Command::AddPlot).unwrap();
    let third = state.plot(state.registry().ids()[2]).unwrap();
    assert_eq!(third.x_var.as_deref(), Some("WM"));
    assert_eq!(third.centile_overlay, CentileKind::None);
    assert!(!third.traces.iter().any(|t| t.is_centile()));
}

#[test]
fn test_normalization_bounds_follow_centile_column() {
    let mut state = session();
    let id = first_plot(&mut state);
    let raw = state.plot(id).unwrap().y_bounds;
    assert_eq!(raw, compute_axis_bounds(state.dataset(), "GM"));

    update(&mut state, id, PlotUpdate::CentileNormalized(true));
    let normalized = state.plot(id).unwrap().y_bounds;
    assert_eq!(normalized, compute_axis_bounds(state.dataset(), "GM_centiles"));
    assert_ne!(normalized, raw);

    // hue changes never touch bounds
    let x_before = state.plot(id).unwrap().x_bounds;
    update(&mut state, id, PlotUpdate::GroupBy(Some("Sex".into())));
    let plot = state.plot(id).unwrap();
    assert_eq!(plot.y_bounds, normalized);
    assert_eq!(plot.x_bounds, x_before);

    // switching to another scored ROI stays on its centile column
    let warnings = update(&mut state, id, PlotUpdate::YVar("WM".into()));
    assert!(warnings.is_empty());
    let plot = state.plot(id).unwrap();
    assert!(plot.centile_normalized);
    assert_eq!(plot.y_bounds, compute_axis_bounds(state.dataset(), "WM_centiles"));

    // an unscored variable turns normalization off and uses the raw column
    let warnings = update(&mut state, id, PlotUpdate::YVar("ICV".into()));
    assert!(matches!(
        warnings.as_slice(),
        [Warning::ForcedField { field: PlotField::CentileNormalized, .. }]
    ));
    let plot = state.plot(id).unwrap();
    assert!(!plot.centile_normalized);
    assert_eq!(plot.y_bounds, compute_axis_bounds(state.dataset(), "ICV"));

    update(&mut state, id, PlotUpdate::CentileNormalized(false));
    update(&mut state, id, PlotUpdate::YVar("GM".into()));
    assert_eq!(state.plot(id).unwrap().y_bounds, raw);
}
