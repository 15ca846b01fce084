//! Per-diagram orchestration: initial state, geometry passes, interaction
//! handling and reconciliation of changes made by other views.
//!
//! One `MapController` exists per loaded diagram and owns everything that
//! used to be page-global: the unit board, the slice cache and the poller.

use foundation::math::Vec2;
use foundation::time::{Clock, phase_ms};
use persistence::{
    KvStore, MapDataSnapshot, PersistenceBridge, Slice, TransformSnapshot, decode_map_data,
    decode_transform, decode_values,
};
use scene::matching::{assign_buildings, center_label};
use scene::{
    BuildingId, BuildingMarker, Interaction, LabelTransform, Transition, UnitBoard, UnitId,
    UnitState,
};
use tracing::debug;

use crate::config::MapConfig;
use crate::event_bus::{EventBus, MapEvent};
use crate::surface::{DiagramDocument, DiagramElement, ZoomSurface};
use crate::sync::{ExternalChange, SyncPoller};

const UNIT_CLASS: &str = "unit";
const NO_MOUSE_CLASS: &str = "no-mouse";

/// What the load-time geometry passes did.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct MatchReport {
    pub unit_labels_centered: usize,
    pub building_labels_centered: usize,
    pub units_assigned: usize,
}

/// A building marker element and the id it toggles.
#[derive(Debug, Clone)]
pub struct BuildingTarget<E> {
    pub element: E,
    pub id: Option<BuildingId>,
}

pub struct MapController<D, S, Z, C>
where
    D: DiagramDocument,
{
    config: MapConfig,
    document: D,
    units: Vec<D::Element>,
    buildings: Vec<BuildingTarget<D::Element>>,
    board: UnitBoard,
    bridge: PersistenceBridge<S>,
    poller: SyncPoller,
    zoom: Z,
    clock: C,
    bus: EventBus,
    report: MatchReport,
}

impl<D, S, Z, C> MapController<D, S, Z, C>
where
    D: DiagramDocument,
    S: KvStore,
    Z: ZoomSurface,
    C: Clock,
{
    /// Brings an imported diagram to its interactive starting state.
    ///
    /// The diagram must already be grafted into its content group with the
    /// pan/zoom behavior attached; the caller binds input handlers to
    /// [`units`](Self::units) and [`buildings`](Self::buildings) afterwards
    /// and starts polling.
    pub fn mount(
        document: D,
        store: S,
        zoom: Z,
        clock: C,
        bus: EventBus,
        config: MapConfig,
    ) -> Self {
        let units = match config.unit_selector() {
            Some(selector) => document.select_all(&selector),
            None => Vec::new(),
        };
        let unit_count = units.len();

        let mut bridge = PersistenceBridge::new(store, config.keys.clone());
        if bridge.discard_stale_map_data(unit_count) {
            debug!(unit_count, "stale map data erased");
        }
        let initial = bridge.load_map_data(unit_count);

        let mut controller = Self {
            poller: SyncPoller::new(config.poll_interval_ms),
            board: UnitBoard::from_states(initial.0),
            config,
            document,
            units,
            buildings: Vec::new(),
            bridge,
            zoom,
            clock,
            bus,
            report: MatchReport::default(),
        };

        controller.commit();
        controller.disable_pointer_events();
        controller.prepare_units();
        controller.report.unit_labels_centered = controller.center_unit_labels();
        controller.collect_buildings();
        controller.restore_transform();

        debug!(
            units = unit_count,
            buildings = controller.buildings.len(),
            report = ?controller.report,
            "map mounted"
        );
        controller
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn units(&self) -> &[D::Element] {
        &self.units
    }

    pub fn buildings(&self) -> &[BuildingTarget<D::Element>] {
        &self.buildings
    }

    pub fn board(&self) -> &UnitBoard {
        &self.board
    }

    pub fn states(&self) -> Vec<UnitState> {
        self.board.states()
    }

    pub fn match_report(&self) -> MatchReport {
        self.report
    }

    pub fn poller(&self) -> &SyncPoller {
        &self.poller
    }

    pub fn bridge(&self) -> &PersistenceBridge<S> {
        &self.bridge
    }

    /// Applies one user interaction, then persists and notifies.
    ///
    /// Returns `None` (and does nothing) for an out-of-range unit.
    pub fn handle(&mut self, interaction: &Interaction) -> Option<Transition> {
        let transition = self.board.apply(interaction)?;
        for change in &transition.changes {
            self.render_unit(change.unit);
        }
        if matches!(interaction, Interaction::PrimaryActivate(_)) {
            for unit in transition.newly_selected() {
                self.bus.emit(MapEvent::UnitClicked(unit));
            }
        }
        self.commit();
        Some(transition)
    }

    /// Moves a unit to any state, `completed` included.
    pub fn set_unit_state(&mut self, unit: UnitId, state: UnitState) -> Option<UnitState> {
        let previous = self.board.set_state(unit, state)?;
        self.render_unit(unit);
        self.commit();
        Some(previous)
    }

    /// Records a pan/zoom gesture made by the user in this view.
    pub fn user_zoomed(&mut self, transform: TransformSnapshot) {
        if let Err(err) = transform.validate() {
            debug!("ignoring zoom: {err}");
            return;
        }
        self.bridge.save_transform(&transform);
        self.bus.emit(MapEvent::Transform(transform));
    }

    /// One poll tick: reconciles every slice another view changed.
    pub fn poll(&mut self) -> Vec<ExternalChange> {
        let changes = self.poller.poll(&mut self.bridge);
        for change in &changes {
            self.reconcile(change);
        }
        changes
    }

    fn reconcile(&mut self, change: &ExternalChange) {
        let raw = change.raw.as_deref();
        match change.slice {
            Slice::MapData => {
                let snapshot = match decode_map_data(raw, self.board.len()) {
                    Ok(v) => v.unwrap_or_else(|| MapDataSnapshot::initial(self.board.len())),
                    Err(err) => {
                        debug!("external map data ignored: {err}");
                        return;
                    }
                };
                if self.board.replace_states(snapshot.states()).is_err() {
                    return;
                }
                self.render_all_units();
                self.bus.emit(MapEvent::MapData(snapshot));
            }
            Slice::Values => match decode_values(raw) {
                Ok(v) => self.bus.emit(MapEvent::Values(v.unwrap_or_default())),
                Err(err) => debug!("external values ignored: {err}"),
            },
            Slice::Transform => match decode_transform(raw) {
                Ok(v) => {
                    let transform = v.unwrap_or_default();
                    self.zoom.apply_transform(transform);
                    self.bus.emit(MapEvent::Transform(transform));
                }
                Err(err) => debug!("external transform ignored: {err}"),
            },
        }
    }

    /// Persists map data and recomputed values, then notifies.
    fn commit(&mut self) {
        let snapshot = MapDataSnapshot(self.board.states());
        self.bridge.save_map_data(&snapshot);
        self.bus.emit(MapEvent::MapData(snapshot));

        let values = self
            .bridge
            .load_values()
            .with_units_count(self.board.selected_count());
        self.bridge.save_values(&values);
        self.bus.emit(MapEvent::Values(values));
    }

    fn disable_pointer_events(&self) {
        for text in self.document.select_all("text") {
            text.add_class(NO_MOUSE_CLASS);
            text.set_style("pointer-events", Some("none"));
        }
        if let Some(selector) = self.config.overlay_selector() {
            for el in self.document.select_all(&selector) {
                el.set_style("pointer-events", Some("none"));
            }
        }
    }

    fn prepare_units(&self) {
        for el in &self.units {
            el.set_style("pointer-events", Some("all"));
            el.set_style("cursor", Some("pointer"));
        }
        self.render_all_units();
    }

    fn render_all_units(&self) {
        for idx in 0..self.units.len() {
            self.render_unit(UnitId::from_index(idx));
        }
    }

    fn render_unit(&self, unit: UnitId) {
        let (Some(el), Some(state)) = (self.units.get(unit.index()), self.board.state(unit)) else {
            return;
        };
        for s in UnitState::ALL {
            if s != state {
                el.remove_class(s.as_str());
            }
        }
        el.add_class(UNIT_CLASS);
        el.add_class(state.as_str());
        if state.glows() {
            let phase = phase_ms(self.clock.now_ms(), self.config.glow_period_ms);
            el.set_style("animation-delay", Some(&format!("-{phase}ms")));
        } else {
            el.set_style("animation-delay", None);
        }
    }

    fn unit_centers(&self) -> Vec<Vec2> {
        self.units
            .iter()
            .map(|el| {
                el.bbox()
                    .map(|b| b.center())
                    .unwrap_or(Vec2::new(f64::NAN, f64::NAN))
            })
            .collect()
    }

    fn center_unit_labels(&self) -> usize {
        let centers = self.unit_centers();
        center_labels(
            &self.document,
            &self.config.unit_label_selector(),
            &centers,
            self.config.unit_label_threshold,
        )
    }

    fn collect_buildings(&mut self) {
        let attr = self.config.building_attr.clone();
        let circles = self.document.select_all(&self.config.building_selector());

        let markers: Vec<Option<BuildingMarker>> = circles
            .iter()
            .map(|el| {
                BuildingMarker::from_attrs(
                    el.attr(&attr).as_deref(),
                    el.attr("cx").as_deref(),
                    el.attr("cy").as_deref(),
                )
            })
            .collect();

        let circle_centers: Vec<Vec2> = markers
            .iter()
            .map(|m| m.as_ref().map_or(Vec2::new(f64::NAN, f64::NAN), |m| m.center))
            .collect();
        self.report.building_labels_centered = center_labels(
            &self.document,
            &self.config.building_label_selector(),
            &circle_centers,
            self.config.building_label_threshold,
        );

        let candidates: Vec<BuildingMarker> = markers.into_iter().flatten().collect();
        let assigned = assign_buildings(&self.unit_centers(), &candidates);
        let mut units_assigned = 0;
        for (idx, building) in assigned.into_iter().enumerate() {
            if let Some(id) = &building {
                self.units[idx].set_attr(&attr, id.as_str());
                units_assigned += 1;
            }
            self.board.assign_building(UnitId::from_index(idx), building);
        }
        self.report.units_assigned = units_assigned;

        self.buildings = circles
            .into_iter()
            .map(|element| {
                element.set_style("cursor", Some("pointer"));
                element.set_style("pointer-events", Some("all"));
                let id = element
                    .attr(&attr)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .map(BuildingId);
                BuildingTarget { element, id }
            })
            .collect();
    }

    /// Applies the stored transform through the programmatic path and marks
    /// it as seen so the first poll does not replay it.
    fn restore_transform(&mut self) {
        let raw = self.bridge.raw(Slice::Transform);
        let transform = self.bridge.load_transform();
        self.zoom.apply_transform(transform);
        self.bridge.remember(Slice::Transform, raw);
        self.bus.emit(MapEvent::Transform(transform));
    }
}

/// Snaps every label matching `selector` onto the nearest center within
/// `threshold`. Returns how many labels moved.
fn center_labels<D: DiagramDocument>(
    document: &D,
    selector: &str,
    centers: &[Vec2],
    threshold: f64,
) -> usize {
    let mut moved = 0;
    for label in document.select_all(selector) {
        let Some(current) = label.attr("transform").as_deref().and_then(LabelTransform::parse)
        else {
            continue;
        };
        let Some(placement) = center_label(&current, centers, threshold) else {
            continue;
        };
        label.set_attr("text-anchor", "middle");
        label.set_attr("dominant-baseline", "central");
        label.set_attr("transform", &placement.transform.to_string());
        if let Some(tspan) = label.select_first("tspan") {
            tspan.set_attr("x", "0");
            tspan.set_attr("y", "0");
        }
        moved += 1;
    }
    moved
}
