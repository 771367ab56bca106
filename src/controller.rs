//! Map state controller
//!
//! Single owner of the dataset and the search state. All mutation goes
//! through [`Controller::apply`]; the rendering surface only ever reads a
//! [`ViewModel`] snapshot.
//!
//! ```text
//! Loading --LoadSucceeded--> Ready --Search--> Ready ...
//!    \
//!     --LoadFailed--> LoadFailed (searches always miss)
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::matcher;
use crate::models::{Coordinates, SearchState, SelectedLocation, ServiceAreaRecord};
use crate::reference::{ReferencePoint, STATE_CAPITALS};
use crate::viewport::{MapOptions, Viewport, NEW_ENGLAND};

/// Shown whenever the dataset could not be loaded
pub const LOAD_FAILED_MESSAGE: &str = "Unable to load service area data right now.";

/// Message for a ZIP with no record; embeds the input exactly as typed.
pub fn out_of_area_message(input: &str) -> String {
    format!("The {} is out of our service area", input)
}

pub type Dataset = Arc<Vec<ServiceAreaRecord>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Loading,
    Ready,
    LoadFailed,
}

/// Everything that can change controller state
#[derive(Debug)]
pub enum MapEvent {
    LoadSucceeded(Vec<ServiceAreaRecord>),
    LoadFailed(LoadError),
    QueryChanged(String),
    Search,
    ResetView,
    ViewChanged { center: Coordinates, zoom: u8 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(SelectedLocation),
    NotFound,
    /// Dataset never loaded; the matcher was not consulted
    Unavailable,
}

pub struct Controller {
    status: LoadStatus,
    load_started: bool,
    dataset: Dataset,
    search: SearchState,
    viewport: Viewport,
    options: &'static MapOptions,
    loaded_at: Option<DateTime<Utc>>,
}

impl Controller {
    pub fn new() -> Self {
        Self::with_options(&NEW_ENGLAND)
    }

    pub fn with_options(options: &'static MapOptions) -> Self {
        Self {
            status: LoadStatus::Loading,
            load_started: false,
            dataset: Arc::new(Vec::new()),
            search: SearchState::default(),
            viewport: Viewport::initial(options),
            options,
            loaded_at: None,
        }
    }

    /// Claims the single dataset fetch. Returns `false` once a fetch has
    /// already been started for this controller.
    pub fn mount(&mut self) -> bool {
        if self.load_started {
            debug!("Dataset load already started, ignoring mount");
            return false;
        }
        self.load_started = true;
        self.status = LoadStatus::Loading;
        true
    }

    /// Apply one event. Returns whether anything visible changed.
    pub fn apply(&mut self, event: MapEvent) -> bool {
        match event {
            MapEvent::LoadSucceeded(records) => self.load_succeeded(records),
            MapEvent::LoadFailed(err) => self.load_failed(err),
            MapEvent::QueryChanged(query) => {
                if self.search.query == query {
                    return false;
                }
                self.search.query = query;
                true
            }
            MapEvent::Search => {
                self.search();
                true
            }
            MapEvent::ResetView => {
                let initial = Viewport::initial(self.options);
                let changed = self.viewport != initial;
                self.viewport = initial;
                changed
            }
            MapEvent::ViewChanged { center, zoom } => {
                let next = self.viewport.constrained(self.options, center, zoom);
                let changed = self.viewport != next;
                self.viewport = next;
                changed
            }
        }
    }

    fn load_succeeded(&mut self, records: Vec<ServiceAreaRecord>) -> bool {
        if self.status != LoadStatus::Loading {
            warn!("Ignoring dataset completion in state {:?}", self.status);
            return false;
        }
        info!("Service area dataset ready: {} records", records.len());
        self.dataset = Arc::new(records);
        self.status = LoadStatus::Ready;
        self.search.error_message = None;
        self.loaded_at = Some(Utc::now());
        true
    }

    fn load_failed(&mut self, err: LoadError) -> bool {
        if self.status != LoadStatus::Loading {
            warn!("Ignoring load failure in state {:?}: {}", self.status, err);
            return false;
        }
        warn!("Service area dataset failed to load ({}): {}", err.kind(), err);
        self.status = LoadStatus::LoadFailed;
        self.search.error_message = Some(LOAD_FAILED_MESSAGE.to_string());
        true
    }

    /// Run the current query against the current dataset.
    pub fn search(&mut self) -> SearchOutcome {
        if self.status == LoadStatus::LoadFailed {
            self.search.selected = None;
            self.search.error_message = Some(LOAD_FAILED_MESSAGE.to_string());
            return SearchOutcome::Unavailable;
        }

        match matcher::find(&self.dataset, &self.search.query) {
            Some(record) => {
                let selected = SelectedLocation::from(record);
                debug!("ZIP {:?} matched {}", self.search.query, selected.city);
                self.search.selected = Some(selected.clone());
                self.search.error_message = None;
                SearchOutcome::Found(selected)
            }
            None => {
                debug!("ZIP {:?} not in service area", self.search.query);
                self.search.selected = None;
                self.search.error_message = Some(out_of_area_message(&self.search.query));
                SearchOutcome::NotFound
            }
        }
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn dataset(&self) -> Dataset {
        Arc::clone(&self.dataset)
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn view_model(&self) -> ViewModel {
        ViewModel {
            status: self.status,
            query: self.search.query.clone(),
            error: self.search.error_message.clone().unwrap_or_default(),
            reference_points: STATE_CAPITALS
                .iter()
                .map(|p| Marker::capital(p, self.options))
                .collect(),
            selected: self
                .search
                .selected
                .as_ref()
                .map(|s| Marker::selected(s, self.options)),
            viewport: self.viewport,
            options: self.options,
            record_count: self.dataset.len(),
            loaded_at: self.loaded_at,
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// View Model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: Coordinates,
    pub label: String,
    pub icon: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'static str>,
}

impl Marker {
    pub fn capital(point: &ReferencePoint, options: &MapOptions) -> Self {
        Self {
            position: point.coordinates,
            label: point.label(),
            icon: options.capital_icon.icon,
            state: Some(point.state),
        }
    }

    fn selected(location: &SelectedLocation, options: &MapOptions) -> Self {
        Self {
            position: location.coordinates,
            label: location.city.clone(),
            icon: options.selected_icon.icon,
            state: None,
        }
    }
}

/// Snapshot handed to the rendering surface
#[derive(Debug, Clone, Serialize)]
pub struct ViewModel {
    pub status: LoadStatus,
    pub query: String,
    /// Empty string means no error
    pub error: String,
    pub reference_points: Vec<Marker>,
    pub selected: Option<Marker>,
    pub viewport: Viewport,
    pub options: &'static MapOptions,
    pub record_count: usize,
    pub loaded_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boston() -> Vec<ServiceAreaRecord> {
        vec![ServiceAreaRecord::new("02134", "Boston", "42.35", "-71.06")]
    }

    fn ready() -> Controller {
        let mut controller = Controller::new();
        assert!(controller.mount());
        assert!(controller.apply(MapEvent::LoadSucceeded(boston())));
        controller
    }

    fn search_for(controller: &mut Controller, query: &str) -> SearchOutcome {
        controller.apply(MapEvent::QueryChanged(query.to_string()));
        controller.search()
    }

    #[test]
    fn test_initial_view_model() {
        let controller = Controller::new();
        let view = controller.view_model();
        assert_eq!(view.status, LoadStatus::Loading);
        assert_eq!(view.reference_points.len(), 4);
        assert_eq!(view.reference_points[0].label, "Boston (Capital)");
        assert!(view.selected.is_none());
        assert_eq!(view.error, "");
        assert_eq!(view.record_count, 0);
        assert!(view.loaded_at.is_none());
    }

    #[test]
    fn test_mount_once() {
        let mut controller = Controller::new();
        assert!(controller.mount());
        assert!(!controller.mount());
    }

    #[test]
    fn test_match_selects_location() {
        let mut controller = ready();
        let outcome = search_for(&mut controller, "2134");

        let expected = SelectedLocation {
            city: "Boston".to_string(),
            coordinates: Coordinates::new(42.35, -71.06),
        };
        assert_eq!(outcome, SearchOutcome::Found(expected.clone()));
        assert_eq!(controller.search_state().selected, Some(expected));
        assert_eq!(controller.search_state().error_message, None);

        let view = controller.view_model();
        assert_eq!(view.error, "");
        let marker = view.selected.unwrap();
        assert_eq!(marker.label, "Boston");
        assert_eq!(marker.icon, "selected");
    }

    #[test]
    fn test_miss_sets_message_and_clears_selection() {
        let mut controller = ready();
        search_for(&mut controller, "2134");

        let outcome = search_for(&mut controller, "99999");
        assert_eq!(outcome, SearchOutcome::NotFound);
        assert_eq!(controller.search_state().selected, None);
        assert_eq!(
            controller.view_model().error,
            "The 99999 is out of our service area"
        );
    }

    #[test]
    fn test_miss_message_keeps_raw_input() {
        let mut controller = ready();
        search_for(&mut controller, " 021 34 ");
        assert_eq!(
            controller.view_model().error,
            "The  021 34  is out of our service area"
        );
    }

    #[test]
    fn test_search_idempotent() {
        let mut controller = ready();
        let first = search_for(&mut controller, "02134");
        let state = controller.search_state().clone();
        for _ in 0..3 {
            assert_eq!(controller.search(), first);
            assert_eq!(controller.search_state(), &state);
        }
    }

    #[test]
    fn test_load_success_clears_error() {
        let mut controller = Controller::new();
        controller.mount();
        search_for(&mut controller, "02134");
        assert!(!controller.view_model().error.is_empty());

        controller.apply(MapEvent::LoadSucceeded(boston()));
        assert_eq!(controller.status(), LoadStatus::Ready);
        assert_eq!(controller.view_model().error, "");
        assert_eq!(controller.view_model().record_count, 1);
        assert!(controller.view_model().loaded_at.is_some());
    }

    #[test]
    fn test_load_failure_is_terminal() {
        let mut controller = Controller::new();
        controller.mount();
        controller.apply(MapEvent::LoadFailed(LoadError::Status { status: 500 }));

        let view = controller.view_model();
        assert_eq!(view.status, LoadStatus::LoadFailed);
        assert_eq!(view.error, LOAD_FAILED_MESSAGE);
        assert_eq!(view.reference_points.len(), STATE_CAPITALS.len());

        assert_eq!(search_for(&mut controller, "02134"), SearchOutcome::Unavailable);
        assert_eq!(search_for(&mut controller, ""), SearchOutcome::Unavailable);
        assert_eq!(controller.view_model().error, LOAD_FAILED_MESSAGE);
        assert!(controller.view_model().selected.is_none());
        assert!(controller.dataset().is_empty());

        // A late success must not resurrect the controller
        assert!(!controller.apply(MapEvent::LoadSucceeded(boston())));
        assert_eq!(controller.status(), LoadStatus::LoadFailed);
    }

    #[test]
    fn test_second_completion_ignored() {
        let mut controller = ready();
        let before = controller.dataset();
        assert!(!controller.apply(MapEvent::LoadSucceeded(Vec::new())));
        assert!(!controller.apply(MapEvent::LoadFailed(LoadError::Status { status: 500 })));
        assert!(Arc::ptr_eq(&before, &controller.dataset()));
        assert_eq!(controller.status(), LoadStatus::Ready);
    }

    #[test]
    fn test_reset_view_only_touches_viewport() {
        let mut controller = ready();
        search_for(&mut controller, "02134");
        controller.apply(MapEvent::ViewChanged {
            center: Coordinates::new(42.0, -71.0),
            zoom: 9,
        });
        assert_eq!(controller.viewport().zoom, 9);

        let search_before = controller.search_state().clone();
        assert!(controller.apply(MapEvent::ResetView));
        assert_eq!(controller.viewport(), Viewport::initial(&NEW_ENGLAND));
        assert_eq!(controller.search_state(), &search_before);

        // Same with an error showing
        search_for(&mut controller, "99999");
        let search_before = controller.search_state().clone();
        controller.apply(MapEvent::ResetView);
        assert_eq!(controller.search_state(), &search_before);
        assert_eq!(controller.dataset().len(), 1);
    }

    #[test]
    fn test_view_model_json_shape() {
        let mut controller = ready();
        search_for(&mut controller, "02134");
        let json = serde_json::to_value(controller.view_model()).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["selected"]["position"], serde_json::json!([42.35, -71.06]));
        assert_eq!(json["reference_points"][1]["state"], "ME");
        assert_eq!(json["options"]["min_zoom"], 6);
        assert_eq!(json["viewport"]["zoom"], 7);
    }
}
