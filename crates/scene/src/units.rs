use serde::{Deserialize, Serialize};

use crate::building::BuildingId;
use crate::entity::UnitId;

/// Lifecycle state of a single unit.
///
/// Serialized as the lowercase state name; that string is also the CSS
/// class the unit element carries.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    #[default]
    Initial,
    Selected,
    Completed,
}

impl UnitState {
    pub const ALL: [UnitState; 3] = [UnitState::Initial, UnitState::Selected, UnitState::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitState::Initial => "initial",
            UnitState::Selected => "selected",
            UnitState::Completed => "completed",
        }
    }

    /// Only selected units glow.
    pub fn glows(&self) -> bool {
        matches!(self, UnitState::Selected)
    }

    /// States a building toggle is allowed to overwrite.
    fn is_toggleable(&self) -> bool {
        matches!(self, UnitState::Initial | UnitState::Selected)
    }
}

impl std::fmt::Display for UnitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Unit {
    pub state: UnitState,
    pub building: Option<BuildingId>,
}

/// Input-agnostic interaction events.
///
/// The browser layer maps `click` to `PrimaryActivate`, `dblclick` to
/// `SecondaryActivate` and a building-marker click to `BulkToggle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    PrimaryActivate(UnitId),
    SecondaryActivate(UnitId),
    BulkToggle(BuildingId),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub unit: UnitId,
    pub from: UnitState,
    pub to: UnitState,
}

/// Result of applying one interaction. May be empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transition {
    pub changes: Vec<StateChange>,
}

impl Transition {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    /// Units that went `initial -> selected`, whatever the interaction.
    /// Callers decide which interactions count as clicks.
    pub fn newly_selected(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.changes
            .iter()
            .filter(|c| c.from == UnitState::Initial && c.to == UnitState::Selected)
            .map(|c| c.unit)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LengthMismatch {
    pub expected: usize,
    pub actual: usize,
}

impl std::fmt::Display for LengthMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unit count mismatch: diagram has {}, snapshot has {}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for LengthMismatch {}

/// Fixed-length, index-aligned sequence of units for one loaded diagram.
///
/// Ordering contract:
/// - Iteration yields units in markup order.
/// - The length never changes after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitBoard {
    units: Vec<Unit>,
}

impl UnitBoard {
    /// `len` units, all `initial`, none assigned to a building.
    pub fn new(len: usize) -> Self {
        Self {
            units: vec![Unit::default(); len],
        }
    }

    pub fn from_states(states: impl IntoIterator<Item = UnitState>) -> Self {
        Self {
            units: states
                .into_iter()
                .map(|state| Unit {
                    state,
                    building: None,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, unit: UnitId) -> Option<&Unit> {
        self.units.get(unit.index())
    }

    pub fn state(&self, unit: UnitId) -> Option<UnitState> {
        self.get(unit).map(|u| u.state)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &Unit)> + '_ {
        self.units
            .iter()
            .enumerate()
            .map(|(idx, u)| (UnitId::from_index(idx), u))
    }

    pub fn states(&self) -> Vec<UnitState> {
        self.units.iter().map(|u| u.state).collect()
    }

    /// Count of units currently `selected`, recomputed over the whole board.
    pub fn selected_count(&self) -> usize {
        self.units.iter().filter(|u| u.state == UnitState::Selected).count()
    }

    pub fn members(&self, building: &BuildingId) -> impl Iterator<Item = UnitId> + '_ {
        let building = building.clone();
        self.iter()
            .filter(move |(_, u)| u.building.as_ref() == Some(&building))
            .map(|(id, _)| id)
    }

    pub fn assign_building(&mut self, unit: UnitId, building: Option<BuildingId>) {
        if let Some(u) = self.units.get_mut(unit.index()) {
            u.building = building;
        }
    }

    /// Overwrites one unit's state directly.
    ///
    /// This is the only way into `completed`; interactive handling never
    /// produces it. Returns the previous state, or `None` if out of range.
    pub fn set_state(&mut self, unit: UnitId, state: UnitState) -> Option<UnitState> {
        let u = self.units.get_mut(unit.index())?;
        Some(std::mem::replace(&mut u.state, state))
    }

    /// Replaces every state from an index-aligned snapshot.
    ///
    /// Building assignments are kept.
    pub fn replace_states(&mut self, states: &[UnitState]) -> Result<(), LengthMismatch> {
        if states.len() != self.units.len() {
            return Err(LengthMismatch {
                expected: self.units.len(),
                actual: states.len(),
            });
        }
        for (u, s) in self.units.iter_mut().zip(states) {
            u.state = *s;
        }
        Ok(())
    }

    /// Applies one interaction.
    ///
    /// Returns `None` when the interaction addresses a unit outside the
    /// board; otherwise the (possibly empty) set of changes.
    pub fn apply(&mut self, interaction: &Interaction) -> Option<Transition> {
        match interaction {
            Interaction::PrimaryActivate(unit) => {
                let from = self.state(*unit)?;
                let to = match from {
                    UnitState::Initial => UnitState::Selected,
                    UnitState::Selected => UnitState::Initial,
                    UnitState::Completed => return Some(Transition::default()),
                };
                Some(self.change(*unit, to))
            }
            Interaction::SecondaryActivate(unit) => {
                let from = self.state(*unit)?;
                if from != UnitState::Completed {
                    return Some(Transition::default());
                }
                Some(self.change(*unit, UnitState::Initial))
            }
            Interaction::BulkToggle(building) => Some(self.toggle_building(building)),
        }
    }

    fn toggle_building(&mut self, building: &BuildingId) -> Transition {
        let members: Vec<UnitId> = self.members(building).collect();
        let all_selected = members
            .iter()
            .all(|id| self.state(*id) == Some(UnitState::Selected));
        let target = if all_selected {
            UnitState::Initial
        } else {
            UnitState::Selected
        };

        let mut out = Transition::default();
        for id in members {
            let Some(from) = self.state(id) else {
                continue;
            };
            if !from.is_toggleable() || from == target {
                continue;
            }
            out.changes.extend(self.change(id, target).changes);
        }
        out
    }

    fn change(&mut self, unit: UnitId, to: UnitState) -> Transition {
        match self.set_state(unit, to) {
            Some(from) if from != to => Transition {
                changes: vec![StateChange { unit, from, to }],
            },
            _ => Transition::default(),
        }
    }
}
