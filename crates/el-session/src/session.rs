//! The edit session state machine.
//!
//! ```text
//!            set / set_many
//!   Idle ─────────────────────► PendingNotify ──┐
//!    ▲                               │    ▲      │ set / set_many
//!    │         delay elapsed         │    └──────┘ (re-arm, old timer dropped)
//!    └───────────────────────────────┘
//!         emits SpecChanged(current)
//! ```

use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use el_dyno::{CompareResult, DynoRunner, SweepConfig};
use el_edit::{ConstraintRegistry, EditError, EditOp, FieldEdit, apply_edits, resolve_derived};
use el_model::{EngineSpec, FieldChange, PatchValue, diff};
use tracing::{debug, warn};

use crate::debounce::Debouncer;
use crate::events::{EventHub, GuardRail};
use crate::{SessionEvent, SessionResult};

/// Quiet period before a settled snapshot is announced.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(120);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub debounce: Duration,
    pub registry: Arc<ConstraintRegistry>,
}

static STANDARD_REGISTRY: LazyLock<Arc<ConstraintRegistry>> =
    LazyLock::new(|| Arc::new(ConstraintRegistry::standard().clone()));

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            registry: STANDARD_REGISTRY.clone(),
        }
    }
}

impl SessionOptions {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_registry(mut self, registry: ConstraintRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    PendingNotify,
}

/// What one accepted edit batch produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub snapshot: Arc<EngineSpec>,
    pub guardrails: Vec<GuardRail>,
    /// Compression ratio recomputed from chamber geometry, if the batch
    /// left geometry in charge of it.
    pub compression_ratio: Option<f64>,
}

/// State reachable from the debounce worker.
struct Shared {
    current: RwLock<Arc<EngineSpec>>,
    events: EventHub,
}

impl Shared {
    fn current(&self) -> Arc<EngineSpec> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, spec: Arc<EngineSpec>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = spec;
    }
}

/// Baseline plus an evolving current snapshot.
///
/// All methods take `&self`; edit batches are serialized internally, so a
/// session can be shared between threads behind an `Arc`.
pub struct EditSession {
    baseline: Arc<EngineSpec>,
    registry: Arc<ConstraintRegistry>,
    shared: Arc<Shared>,
    writer: Mutex<()>,
    debouncer: Debouncer,
}

impl EditSession {
    pub fn new(baseline: EngineSpec) -> Self {
        Self::with_options(baseline, SessionOptions::default())
    }

    /// The snapshot is taken as already validated. Derived fields are
    /// brought in line first so the baseline agrees with its own geometry.
    pub fn with_options(baseline: EngineSpec, options: SessionOptions) -> Self {
        let baseline = match resolve_derived(&baseline) {
            Ok(Some(derived)) => derived.spec,
            Ok(None) => baseline,
            Err(err) => {
                warn!(%err, "baseline geometry is non-physical, keeping it as given");
                baseline
            }
        };
        let baseline = Arc::new(baseline);
        let shared = Arc::new(Shared {
            current: RwLock::new(baseline.clone()),
            events: EventHub::default(),
        });
        let debouncer = {
            let shared = shared.clone();
            Debouncer::spawn(options.debounce, move |_| {
                shared.events.spec_changed(shared.current());
            })
        };
        Self {
            baseline,
            registry: options.registry,
            shared,
            writer: Mutex::new(()),
            debouncer,
        }
    }

    pub fn baseline(&self) -> Arc<EngineSpec> {
        self.baseline.clone()
    }

    /// Latest snapshot, including edits not yet announced.
    pub fn current(&self) -> Arc<EngineSpec> {
        self.shared.current()
    }

    pub fn registry(&self) -> &ConstraintRegistry {
        &self.registry
    }

    pub fn state(&self) -> SessionState {
        if self.debouncer.is_pending() {
            SessionState::PendingNotify
        } else {
            SessionState::Idle
        }
    }

    /// Edit one leaf.
    pub fn set(&self, path: &str, value: impl Into<PatchValue>) -> SessionResult<EditOutcome> {
        self.set_many([EditOp::new(path, value)])
    }

    /// Edit several leaves as one batch.
    ///
    /// Every path is resolved before anything else happens; an unknown path
    /// or an unconvertible value leaves `current` untouched. Each value is
    /// clamped against the snapshot as it stands after the batch's earlier
    /// edits. Edits to disabled fields are dropped and reported. Guardrails
    /// go out synchronously once the batch has been applied; the settled
    /// snapshot is announced after the debounce delay.
    ///
    /// If the batch leaves the chamber geometry non-physical, `current`
    /// keeps the applied edits without the derived compression ratio, any
    /// pending announcement is cancelled and the error is returned.
    pub fn set_many(&self, ops: impl IntoIterator<Item = EditOp>) -> SessionResult<EditOutcome> {
        let _writer = self.lock_writer();
        let requested = ops
            .into_iter()
            .map(|op| op.resolve())
            .collect::<Result<Vec<FieldEdit>, EditError>>()?;
        let current = self.shared.current();
        if requested.is_empty() {
            return Ok(EditOutcome {
                snapshot: current,
                guardrails: Vec::new(),
                compression_ratio: None,
            });
        }

        let mut staged = (*current).clone();
        let mut accepted = Vec::with_capacity(requested.len());
        let mut guardrails = Vec::new();
        for edit in requested {
            let outcome = self.registry.clamp(edit.path, &edit.value, &staged);
            if let Some(note) = outcome.note {
                guardrails.push(GuardRail {
                    path: edit.path,
                    requested: edit.value.clone(),
                    note,
                });
            }
            if outcome.is_disabled() {
                continue;
            }
            let clamped = FieldEdit::new(edit.path, outcome.value);
            staged = apply_edits(&staged, std::slice::from_ref(&clamped))?;
            accepted.push(clamped);
        }

        let applied = apply_edits(&current, &accepted)?;
        debug!(
            edits = accepted.len(),
            guardrails = guardrails.len(),
            "edit batch applied"
        );

        let derived = match resolve_derived(&applied) {
            Ok(derived) => derived,
            Err(err) => {
                self.shared.replace(Arc::new(applied));
                self.emit_guardrails(&guardrails);
                self.debouncer.cancel();
                return Err(err.into());
            }
        };
        let (snapshot, compression_ratio) = match derived {
            Some(d) => (d.spec, Some(d.compression_ratio)),
            None => (applied, None),
        };

        let snapshot = Arc::new(snapshot);
        self.shared.replace(snapshot.clone());
        self.emit_guardrails(&guardrails);
        self.debouncer.arm();

        Ok(EditOutcome {
            snapshot,
            guardrails,
            compression_ratio,
        })
    }

    /// Compare the baseline against the latest current snapshot.
    pub fn compare<R>(&self, sweep: &SweepConfig, runner: &R) -> SessionResult<CompareResult>
    where
        R: DynoRunner + ?Sized,
    {
        let current = self.current();
        Ok(el_dyno::compare(&self.baseline, &current, sweep, runner)?)
    }

    /// Leaves that differ between baseline and current.
    pub fn diff(&self) -> Vec<FieldChange> {
        diff(&self.baseline, &self.current())
    }

    /// Drop a pending announcement. Returns whether one was pending.
    pub fn cancel_pending(&self) -> bool {
        self.debouncer.cancel()
    }

    /// Called with the settled snapshot, on the debounce thread.
    pub fn on_spec_changed(&self, f: impl Fn(&Arc<EngineSpec>) + Send + Sync + 'static) {
        self.shared.events.on_spec_changed(f);
    }

    /// Called synchronously, on the editing thread, for each guardrail.
    /// The callback runs inside the edit batch and must not edit this
    /// session.
    pub fn on_guardrail(&self, f: impl Fn(&GuardRail) + Send + Sync + 'static) {
        self.shared.events.on_guardrail(f);
    }

    /// Channel carrying every event, for consumers polling from their own
    /// thread.
    pub fn subscribe(&self) -> std::sync::mpsc::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    fn emit_guardrails(&self, guardrails: &[GuardRail]) {
        for guard in guardrails {
            warn!(path = %guard.path, requested = %guard.requested, note = %guard.note, "guardrail");
            self.shared.events.guardrail(guard.clone());
        }
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use el_edit::GuardNote;
    use el_model::{FieldPath, HeaderLayout, presets};

    fn session() -> EditSession {
        EditSession::with_options(
            presets::b6_minimal(),
            SessionOptions::default().with_debounce(Duration::from_secs(60)),
        )
    }

    #[test]
    fn set_replaces_current_and_keeps_baseline() {
        let s = session();
        let out = s.set("Bore_mm", 80.0).unwrap();
        assert_eq!(out.snapshot.bore_mm, 80.0);
        assert_eq!(s.current().bore_mm, 80.0);
        assert_eq!(s.baseline().bore_mm, 78.0);
        assert_eq!(s.state(), SessionState::PendingNotify);
        assert!(out.guardrails.is_empty());
    }

    #[test]
    fn unknown_path_rejects_whole_batch() {
        let s = session();
        let err = s
            .set_many([EditOp::new("Bore_mm", 80.0), EditOp::new("NotARealField", 1.0)])
            .unwrap_err();
        assert!(matches!(
            err,
            crate::SessionError::Edit(EditError::UnsupportedPath { .. })
        ));
        assert_eq!(*s.current(), presets::b6_minimal());
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn clamps_against_earlier_edits_in_batch() {
        let s = session();
        let out = s
            .set_many([
                EditOp::new("Redline_RPM", 8000_i64),
                EditOp::new("RevLimit_RPM", 7500_i64),
            ])
            .unwrap();
        assert_eq!(out.snapshot.redline_rpm, 8000);
        assert_eq!(out.snapshot.rev_limit_rpm, 8000);
        assert_eq!(out.guardrails.len(), 1);
        assert_eq!(out.guardrails[0].note, GuardNote::Clamped { to: 8000.0 });
    }

    #[test]
    fn disabled_field_is_ignored_and_reported() {
        let s = session();
        s.set("Header", "4-1").unwrap();
        let out = s.set("PrimaryLength2_mm", 450.0).unwrap();
        assert_eq!(out.snapshot.header, HeaderLayout::FourIntoOne);
        assert_eq!(out.snapshot.primary_length2_mm, None);
        assert_eq!(out.guardrails[0].path, FieldPath::PrimaryLength2Mm);
        assert_eq!(out.guardrails[0].note, GuardNote::Disabled);
    }

    #[test]
    fn chamber_edit_derives_compression_ratio() {
        let s = EditSession::with_options(
            presets::b6_with_chamber(),
            SessionOptions::default().with_debounce(Duration::from_secs(60)),
        );
        let out = s.set("ChamberVolume_cc", 42.0).unwrap();
        let cr = out.compression_ratio.unwrap();
        assert_eq!(out.snapshot.compression_ratio, Some(cr));
        assert!(cr < 9.921);
    }

    #[test]
    fn sessions_share_the_standard_registry() {
        let a = session();
        let b = session();
        assert!(Arc::ptr_eq(&a.registry, &b.registry));
    }

    #[test]
    fn chamber_baseline_starts_with_derived_ratio() {
        let s = EditSession::with_options(
            presets::b6_with_chamber(),
            SessionOptions::default().with_debounce(Duration::from_secs(60)),
        );
        let cr = s.baseline().compression_ratio.unwrap();
        assert!((cr - 9.921).abs() < 1e-3);

        s.set("Cam.IntakeDuration_deg050", 244_i64).unwrap();
        let changes = s.diff();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, FieldPath::CamIntakeDurationDeg050);
    }

    #[test]
    fn non_physical_geometry_keeps_applied_edits() {
        let mut spec = presets::b6_with_chamber();
        spec.piston_dish_volume_cc = Some(39.0);
        let s = EditSession::with_options(
            spec,
            SessionOptions::default().with_debounce(Duration::from_secs(60)),
        );
        s.set("Bore_mm", 80.0).unwrap();
        assert_eq!(s.state(), SessionState::PendingNotify);

        let err = s
            .set_many([
                EditOp::new("HeadGasketThickness_mm", 0.3),
                EditOp::new("ChamberVolume_cc", 20.0),
                EditOp::new("PistonDishVolume_cc", 40.0),
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            crate::SessionError::Edit(EditError::NonPhysicalGeometry { .. })
        ));
        let current = s.current();
        assert_eq!(current.chamber_volume_cc, Some(20.0));
        assert_eq!(current.piston_dish_volume_cc, Some(40.0));
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let s = session();
        let out = s.set_many(Vec::<EditOp>::new()).unwrap();
        assert_eq!(*out.snapshot, presets::b6_minimal());
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn diff_lists_changed_leaves() {
        let s = session();
        s.set("Cam.IntakeDuration_deg050", 244_i64).unwrap();
        let changes = s.diff();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, FieldPath::CamIntakeDurationDeg050);
        assert_eq!(changes[0].after, PatchValue::Float(244.0));
    }

    #[test]
    fn cancel_pending_returns_to_idle() {
        let s = session();
        s.set("Bore_mm", 80.0).unwrap();
        assert!(s.cancel_pending());
        assert_eq!(s.state(), SessionState::Idle);
        assert!(!s.cancel_pending());
    }
}
