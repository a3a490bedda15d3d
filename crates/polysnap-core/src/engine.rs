//! Reconciliation engine.
//!
//! [`SnapEngine`] owns everything that changes at runtime: the host
//! adapter, the enable flag, the binding slots and the schedule. Every
//! trigger ends in the same [`SnapEngine::reconcile`] call, which samples
//! the mode, plans against the committed binding state and applies the
//! plan. A pass is synchronous from start to finish.

use crate::binding::{BindingKind, BindingManager};
use crate::config::SnapConfig;
use crate::host::{Host, LayerHandle, LayerId};
use crate::mode::{Mode, detect_mode};
use crate::reconcile::{Plan, Step, Transition, plan};
use crate::resolver::resolve_targets;
use crate::schedule::{Schedule, Trigger};
use crate::toggle::EnableToggle;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Owned reconciliation context.
pub struct SnapEngine<H: Host> {
    host: H,
    config: SnapConfig,
    toggle: EnableToggle,
    bindings: BindingManager<H>,
    schedule: Schedule,
}

impl<H: Host> SnapEngine<H> {
    /// Create an engine with both slots empty.
    pub fn new(host: H, config: SnapConfig) -> Self {
        let toggle = EnableToggle::new(config.enabled_by_default);
        let schedule = Schedule::new(config.poll_interval(), config.debounce());
        Self {
            host,
            config,
            toggle,
            bindings: BindingManager::new(),
            schedule,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    #[cfg(test)]
    fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    pub fn bindings(&self) -> &BindingManager<H> {
        &self.bindings
    }

    pub fn is_enabled(&self) -> bool {
        self.toggle.is_enabled()
    }

    pub fn toggle_state(&self) -> EnableToggle {
        self.toggle
    }

    /// Set the enable flag. Disabling runs an immediate pass that releases
    /// both bindings; enabling waits for the next trigger.
    pub fn set_enabled(&mut self, enabled: bool) -> Vec<Transition> {
        if !self.toggle.set(enabled) {
            return Vec::new();
        }
        log::info!("{}", if enabled { "Enabled" } else { "Disabled" });
        if enabled {
            Vec::new()
        } else {
            self.reconcile_with(&Mode::Idle)
        }
    }

    /// Flip the enable flag.
    pub fn toggle(&mut self) -> Vec<Transition> {
        let enabled = !self.toggle.is_enabled();
        self.set_enabled(enabled)
    }

    /// Sample the host and bring the bindings in line with the sample.
    pub fn reconcile(&mut self) -> Vec<Transition> {
        let mode = detect_mode(&self.host);
        self.reconcile_with(&mode)
    }

    /// Bring the bindings in line with a given mode sample.
    pub fn reconcile_with(&mut self, mode: &Mode<H::Layer>) -> Vec<Transition> {
        let plan = plan(self.toggle.is_enabled(), mode, &self.bindings.state());
        self.apply(plan, mode)
    }

    /// Record a host notification (selection or editing changed).
    pub fn notify(&mut self, now: Instant) {
        self.schedule.notify(now);
    }

    /// Run a pass if the poll interval or a settled notification is due.
    pub fn pump(&mut self, now: Instant) -> Option<(Trigger, Vec<Transition>)> {
        let trigger = self.schedule.due(now)?;
        Some((trigger, self.reconcile()))
    }

    /// Delay until [`SnapEngine::pump`] has something to do.
    pub fn next_wake(&self, now: Instant) -> Duration {
        self.schedule.next_wake(now)
    }

    /// Release both bindings regardless of mode.
    pub fn shutdown(&mut self) -> Vec<Transition> {
        let mut transitions = Vec::new();
        for kind in [BindingKind::Draw, BindingKind::Modify] {
            if let Some(layer) = self.bindings.detach(&mut self.host, kind) {
                transitions.push(Transition::Detached { kind, layer });
            }
        }
        transitions
    }

    fn apply(&mut self, plan: Plan, mode: &Mode<H::Layer>) -> Vec<Transition> {
        let mut transitions = Vec::new();
        if plan.is_noop() {
            return transitions;
        }

        // Release first so a dropped binding stops intercepting input
        // before a new one is registered.
        for kind in [BindingKind::Draw, BindingKind::Modify] {
            if plan.step(kind) == Step::Detach {
                if let Some(layer) = self.bindings.detach(&mut self.host, kind) {
                    transitions.push(Transition::Detached { kind, layer });
                }
            }
        }

        if matches!(plan.draw, Step::Attach | Step::Rebind) {
            if let Some(transition) = self.attach_draw() {
                transitions.push(transition);
            }
        }

        if let Mode::Modifying(layer) = mode {
            match plan.modify {
                Step::Attach => {
                    if let Some(transition) = self.attach_modify(layer.clone()) {
                        transitions.push(transition);
                    }
                }
                Step::Rebind => transitions.extend(self.rebind_modify(layer.clone())),
                Step::Keep | Step::Detach => {}
            }
        }

        transitions
    }

    fn sketch_layer(&self) -> Option<H::Layer> {
        match self.host.sketch_layer() {
            Ok(layer) => layer,
            Err(e) => {
                log::debug!("Sketch layer lookup failed: {}", e);
                None
            }
        }
    }

    /// Targets never include the sketch layer.
    fn sketch_id(&self) -> Option<LayerId> {
        self.sketch_layer().map(|layer| layer.layer_id())
    }

    fn attach_draw(&mut self) -> Option<Transition> {
        let Some(sketch) = self.sketch_layer() else {
            log::debug!("Drawing without a sketch layer, nothing to bind");
            return None;
        };
        let targets = resolve_targets(&self.host, &self.config, Some(&sketch.layer_id()));
        self.bindings
            .attach(&mut self.host, BindingKind::Draw, sketch, targets)
            .map(|binding| Transition::Attached {
                kind: BindingKind::Draw,
                layer: binding.layer_id(),
            })
    }

    fn attach_modify(&mut self, layer: H::Layer) -> Option<Transition> {
        let exclude = self.sketch_id();
        let targets = resolve_targets(&self.host, &self.config, exclude.as_ref());
        self.bindings
            .attach(&mut self.host, BindingKind::Modify, layer, targets)
            .map(|binding| Transition::Attached {
                kind: BindingKind::Modify,
                layer: binding.layer_id(),
            })
    }

    fn rebind_modify(&mut self, layer: H::Layer) -> Option<Transition> {
        let from = self.bindings.bound_layer(BindingKind::Modify);
        let exclude = self.sketch_id();
        let targets = resolve_targets(&self.host, &self.config, exclude.as_ref());
        let to = self
            .bindings
            .rebind(&mut self.host, BindingKind::Modify, layer, targets)
            .map(|binding| binding.layer_id());

        match (from, to) {
            (Some(from), Some(to)) => Some(Transition::Rebound { from, to }),
            (None, Some(layer)) => Some(Transition::Attached {
                kind: BindingKind::Modify,
                layer,
            }),
            (Some(layer), None) => Some(Transition::Detached {
                kind: BindingKind::Modify,
                layer,
            }),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerCategory;
    use crate::host::{FakeHost, FeatureProbe, LayerProbe};

    /// Host with a sketch layer, venues and comments layers, and two
    /// selectable polygons: `v1` on venues and `c1` on comments.
    fn host() -> FakeHost {
        let mut host = FakeHost::with_venues();
        host.set_named_layer(LayerCategory::MapComments, LayerProbe::vector(LayerId::from("comments")));
        host.set_owner("v1", "venues");
        host.set_owner("c1", "comments");
        host
    }

    fn engine() -> SnapEngine<FakeHost> {
        SnapEngine::new(host(), SnapConfig::default())
    }

    fn attached(kind: BindingKind, layer: &str) -> Transition {
        Transition::Attached { kind, layer: LayerId::from(layer) }
    }

    fn detached(kind: BindingKind, layer: &str) -> Transition {
        Transition::Detached { kind, layer: LayerId::from(layer) }
    }

    /// No leaked behaviors and no more than one binding per slot.
    fn assert_consistent(engine: &SnapEngine<FakeHost>) {
        let live = engine.bindings().live_count();
        assert!(live <= 2);
        assert_eq!(engine.host().live_behaviors(), live);
        assert_eq!(engine.host().registered_behaviors(), live);
        assert_eq!(engine.host().active_behaviors().len(), live);
    }

    enum Sample {
        Idle,
        Drawing,
        Modifying(&'static str),
    }

    fn set_mode(engine: &mut SnapEngine<FakeHost>, sample: &Sample) {
        let host = engine.host_mut();
        host.clear_selection();
        host.set_drawing(Some(false));
        match sample {
            Sample::Idle => {}
            Sample::Drawing => host.set_drawing(Some(true)),
            Sample::Modifying(feature) => {
                host.select(vec![FeatureProbe::tagged(*feature, "venue")])
            }
        }
    }

    #[test]
    fn test_end_to_end_trace() {
        let mut engine = engine();
        let samples = [
            Sample::Idle,
            Sample::Drawing,
            Sample::Drawing,
            Sample::Idle,
            Sample::Modifying("v1"),
            Sample::Modifying("v1"),
            Sample::Modifying("c1"),
            Sample::Idle,
        ];

        let mut trace = Vec::new();
        for sample in &samples {
            set_mode(&mut engine, sample);
            trace.push(engine.reconcile());
            assert_consistent(&engine);
        }

        assert_eq!(
            trace,
            vec![
                vec![],
                vec![attached(BindingKind::Draw, "sketch")],
                vec![],
                vec![detached(BindingKind::Draw, "sketch")],
                vec![attached(BindingKind::Modify, "venues")],
                vec![],
                vec![Transition::Rebound {
                    from: LayerId::from("venues"),
                    to: LayerId::from("comments"),
                }],
                vec![detached(BindingKind::Modify, "comments")],
            ]
        );
        assert_eq!(engine.host().live_behaviors(), 0);
    }

    #[test]
    fn test_rebind_leaves_no_stale_behavior() {
        let mut engine = engine();
        set_mode(&mut engine, &Sample::Modifying("v1"));
        engine.reconcile();
        set_mode(&mut engine, &Sample::Modifying("c1"));
        engine.reconcile();

        assert_eq!(engine.bindings().bound_layer(BindingKind::Modify), Some(LayerId::from("comments")));
        let active = engine.host().active_behaviors();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].editable, LayerId::from("comments"));
    }

    #[test]
    fn test_disable_then_enable_while_drawing() {
        let mut engine = engine();
        set_mode(&mut engine, &Sample::Drawing);
        engine.reconcile();
        assert!(engine.bindings().is_attached(BindingKind::Draw));

        let transitions = engine.toggle();
        assert!(!engine.is_enabled());
        assert_eq!(transitions, vec![detached(BindingKind::Draw, "sketch")]);
        assert_consistent(&engine);

        // Still drawing, but disabled: nothing attaches.
        assert!(engine.reconcile().is_empty());
        assert_eq!(engine.bindings().live_count(), 0);

        assert!(engine.toggle().is_empty());
        assert_eq!(engine.reconcile(), vec![attached(BindingKind::Draw, "sketch")]);
        assert_consistent(&engine);
    }

    #[test]
    fn test_set_enabled_unchanged_is_noop() {
        let mut engine = engine();
        set_mode(&mut engine, &Sample::Drawing);
        engine.reconcile();
        assert!(engine.set_enabled(true).is_empty());
        assert!(engine.bindings().is_attached(BindingKind::Draw));
    }

    #[test]
    fn test_starts_disabled_from_config() {
        let config = SnapConfig {
            enabled_by_default: false,
            ..SnapConfig::default()
        };
        let mut engine = SnapEngine::new(host(), config);
        set_mode(&mut engine, &Sample::Drawing);
        assert!(engine.reconcile().is_empty());
        assert_eq!(engine.toggle_state().label(), "OFF");
    }

    #[test]
    fn test_drawing_detaches_modify() {
        let mut engine = engine();
        set_mode(&mut engine, &Sample::Modifying("v1"));
        engine.reconcile();

        set_mode(&mut engine, &Sample::Drawing);
        assert_eq!(
            engine.reconcile(),
            vec![
                detached(BindingKind::Modify, "venues"),
                attached(BindingKind::Draw, "sketch"),
            ]
        );
        assert_consistent(&engine);
    }

    #[test]
    fn test_draw_targets_exclude_sketch() {
        let mut engine = engine();
        set_mode(&mut engine, &Sample::Drawing);
        engine.reconcile();

        let active = engine.host().active_behaviors();
        assert_eq!(active[0].editable, LayerId::from("sketch"));
        assert_eq!(
            active[0].targets,
            vec![LayerId::from("venues"), LayerId::from("comments")]
        );
    }

    #[test]
    fn test_no_targets_retries_next_pass() {
        let mut host = FakeHost::new();
        host.set_sketch_layer(Some("sketch"));
        host.set_drawing(Some(true));
        let mut engine = SnapEngine::new(host, SnapConfig::default());

        assert!(engine.reconcile().is_empty());
        assert_consistent(&engine);

        engine.host_mut().add_layer(LayerProbe::vector(LayerId::from("places")));
        assert_eq!(engine.reconcile(), vec![attached(BindingKind::Draw, "sketch")]);
    }

    #[test]
    fn test_activation_failure_degrades() {
        let mut engine = engine();
        engine.host_mut().fail_activation(true);
        set_mode(&mut engine, &Sample::Drawing);

        for _ in 0..3 {
            assert!(engine.reconcile().is_empty());
            assert_consistent(&engine);
        }
    }

    #[test]
    fn test_failed_rebind_reports_detach() {
        let mut engine = engine();
        set_mode(&mut engine, &Sample::Modifying("v1"));
        engine.reconcile();

        engine.host_mut().fail_create(true);
        set_mode(&mut engine, &Sample::Modifying("c1"));
        assert_eq!(engine.reconcile(), vec![detached(BindingKind::Modify, "venues")]);
        assert_consistent(&engine);
    }

    #[test]
    fn test_random_mode_sequence_keeps_invariants() {
        let mut engine = engine();
        // Deterministic pseudo-random walk over modes and toggles.
        let mut x: u32 = 0x9E37_79B9;
        for _ in 0..500 {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            match x % 5 {
                0 => set_mode(&mut engine, &Sample::Idle),
                1 => set_mode(&mut engine, &Sample::Drawing),
                2 => set_mode(&mut engine, &Sample::Modifying("v1")),
                3 => set_mode(&mut engine, &Sample::Modifying("c1")),
                _ => {
                    engine.toggle();
                }
            }
            engine.reconcile();
            assert_consistent(&engine);
        }
    }

    #[test]
    fn test_pump_follows_schedule() {
        let mut engine = engine();
        set_mode(&mut engine, &Sample::Drawing);

        let t0 = Instant::now();
        let (trigger, transitions) = engine.pump(t0).expect("first poll");
        assert_eq!(trigger, Trigger::Poll);
        assert_eq!(transitions, vec![attached(BindingKind::Draw, "sketch")]);
        assert!(engine.pump(t0 + Duration::from_millis(10)).is_none());

        set_mode(&mut engine, &Sample::Idle);
        engine.notify(t0 + Duration::from_millis(20));
        assert!(engine.pump(t0 + Duration::from_millis(50)).is_none());

        let (trigger, transitions) = engine
            .pump(t0 + Duration::from_millis(100))
            .expect("settled notification");
        assert_eq!(trigger, Trigger::Notification);
        assert_eq!(transitions, vec![detached(BindingKind::Draw, "sketch")]);
    }

    #[test]
    fn test_notification_burst_samples_settled_state() {
        let mut engine = engine();
        let t0 = Instant::now();
        set_mode(&mut engine, &Sample::Modifying("v1"));
        let (_, transitions) = engine.pump(t0).expect("first poll");
        assert_eq!(transitions, vec![attached(BindingKind::Modify, "venues")]);

        engine.notify(t0 + Duration::from_millis(10));
        set_mode(&mut engine, &Sample::Idle);
        engine.notify(t0 + Duration::from_millis(70));

        // The first event's settle time has passed but the burst has not.
        assert!(engine.pump(t0 + Duration::from_millis(90)).is_none());
        assert!(engine.bindings().is_attached(BindingKind::Modify));

        let (trigger, transitions) = engine
            .pump(t0 + Duration::from_millis(150))
            .expect("settled burst");
        assert_eq!(trigger, Trigger::Notification);
        assert_eq!(transitions, vec![detached(BindingKind::Modify, "venues")]);
        assert_consistent(&engine);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut engine = engine();
        set_mode(&mut engine, &Sample::Modifying("v1"));
        engine.reconcile();
        assert_eq!(engine.shutdown(), vec![detached(BindingKind::Modify, "venues")]);
        assert!(engine.shutdown().is_empty());
        assert_eq!(engine.host().live_behaviors(), 0);
    }
}
