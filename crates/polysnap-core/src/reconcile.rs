//! Transition table from a mode sample to the desired binding state.
//!
//! | enabled | mode          | draw             | modify                          |
//! |---------|---------------|------------------|---------------------------------|
//! | false   | any           | detach if present| detach if present               |
//! | true    | Idle          | detach if present| detach if present               |
//! | true    | Drawing       | attach if absent | detach if present               |
//! | true    | Modifying(L)  | detach if present| attach if absent, rebind if ≠ L |

use crate::binding::{BindingKind, BindingState};
use crate::host::{LayerHandle, LayerId};
use crate::mode::Mode;

/// What to do with one binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Leave the slot as it is.
    Keep,
    Attach,
    Detach,
    /// Detach, then attach to the sampled layer.
    Rebind,
}

/// Steps for both slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub draw: Step,
    pub modify: Step,
}

impl Plan {
    pub const NOTHING: Plan = Plan {
        draw: Step::Keep,
        modify: Step::Keep,
    };

    pub fn step(&self, kind: BindingKind) -> Step {
        match kind {
            BindingKind::Draw => self.draw,
            BindingKind::Modify => self.modify,
        }
    }

    pub fn is_noop(&self) -> bool {
        *self == Plan::NOTHING
    }
}

fn want_detached(current: &Option<LayerId>) -> Step {
    if current.is_some() { Step::Detach } else { Step::Keep }
}

fn want_attached(current: &Option<LayerId>) -> Step {
    if current.is_some() { Step::Keep } else { Step::Attach }
}

fn want_bound_to(current: &Option<LayerId>, layer: &LayerId) -> Step {
    match current {
        None => Step::Attach,
        Some(bound) if bound == layer => Step::Keep,
        Some(_) => Step::Rebind,
    }
}

/// Compute the steps that move `state` to what `mode` implies.
pub fn plan<L: LayerHandle>(enabled: bool, mode: &Mode<L>, state: &BindingState) -> Plan {
    if !enabled {
        return Plan {
            draw: want_detached(&state.draw),
            modify: want_detached(&state.modify),
        };
    }

    match mode {
        Mode::Idle => Plan {
            draw: want_detached(&state.draw),
            modify: want_detached(&state.modify),
        },
        Mode::Drawing => Plan {
            draw: want_attached(&state.draw),
            modify: want_detached(&state.modify),
        },
        Mode::Modifying(layer) => Plan {
            draw: want_detached(&state.draw),
            modify: want_bound_to(&state.modify, &layer.layer_id()),
        },
    }
}

/// An effect applied during a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Attached { kind: BindingKind, layer: LayerId },
    Detached { kind: BindingKind, layer: LayerId },
    /// The modify binding moved from one layer to another.
    Rebound { from: LayerId, to: LayerId },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(draw: Option<&str>, modify: Option<&str>) -> BindingState {
        BindingState {
            draw: draw.map(LayerId::from),
            modify: modify.map(LayerId::from),
        }
    }

    fn modifying(layer: &str) -> Mode<LayerId> {
        Mode::Modifying(LayerId::from(layer))
    }

    #[test]
    fn test_disabled_detaches_everything() {
        let full = state(Some("sketch"), Some("venues"));
        for mode in [Mode::Idle, Mode::Drawing, modifying("venues")] {
            let p = plan(false, &mode, &full);
            assert_eq!(p, Plan { draw: Step::Detach, modify: Step::Detach });
        }
        assert!(plan(false, &Mode::<LayerId>::Drawing, &BindingState::default()).is_noop());
    }

    #[test]
    fn test_idle() {
        assert!(plan(true, &Mode::<LayerId>::Idle, &BindingState::default()).is_noop());
        assert_eq!(
            plan(true, &Mode::<LayerId>::Idle, &state(Some("sketch"), None)),
            Plan { draw: Step::Detach, modify: Step::Keep }
        );
    }

    #[test]
    fn test_drawing() {
        assert_eq!(
            plan(true, &Mode::<LayerId>::Drawing, &BindingState::default()),
            Plan { draw: Step::Attach, modify: Step::Keep }
        );
        assert_eq!(
            plan(true, &Mode::<LayerId>::Drawing, &state(Some("sketch"), Some("venues"))),
            Plan { draw: Step::Keep, modify: Step::Detach }
        );
    }

    #[test]
    fn test_modifying() {
        assert_eq!(
            plan(true, &modifying("venues"), &state(Some("sketch"), None)),
            Plan { draw: Step::Detach, modify: Step::Attach }
        );
        assert!(plan(true, &modifying("venues"), &state(None, Some("venues"))).is_noop());
        assert_eq!(
            plan(true, &modifying("comments"), &state(None, Some("venues"))),
            Plan { draw: Step::Keep, modify: Step::Rebind }
        );
        assert_eq!(plan(true, &modifying("comments"), &state(None, Some("venues"))).step(BindingKind::Modify), Step::Rebind);
    }
}
