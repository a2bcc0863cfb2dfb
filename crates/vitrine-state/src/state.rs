use std::time::Instant;

use crate::catalog::{ModelCatalog, ModelEntry};
use crate::settings::ViewSettings;

/// Identity of one issued load. Tickets increase monotonically, so a
/// completion arriving for anything but the in-flight ticket is stale.
pub type LoadTicket = u64;

/// Returned by an index transition; the caller runs the loader for it
/// exactly once and reports back with the ticket.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub index: usize,
    pub entry: ModelEntry,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Loading {
        ticket: LoadTicket,
        target_index: usize,
        started: Instant,
    },
}

/// The viewer's session state: current place in the catalog, zoom scale,
/// and sole ownership of the loaded scene handle `S`.
///
/// Index transitions are asynchronous and commit on success: the index,
/// display name, scene and scale only change once the load finishes. A
/// failed or abandoned load leaves everything as it was, apart from a
/// user-visible failure notice. At most one load is in flight; further
/// requests are rejected until it resolves.
pub struct ViewerState<S> {
    catalog: ModelCatalog,
    settings: ViewSettings,
    current_index: usize,
    current_name: String,
    scale: f32,
    scene: Option<S>,
    phase: Phase,
    next_ticket: LoadTicket,
    last_failure: Option<String>,
}

impl<S> ViewerState<S> {
    pub fn new(catalog: ModelCatalog, settings: ViewSettings) -> Self {
        let current_name = catalog.get(0).name.clone();
        let scale = settings.default_scale;
        Self {
            catalog,
            settings,
            current_index: 0,
            current_name,
            scale,
            scene: None,
            phase: Phase::Idle,
            next_ticket: 0,
            last_failure: None,
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_name(&self) -> &str {
        &self.current_name
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    pub fn scene(&self) -> Option<&S> {
        self.scene.as_ref()
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Starts a load of the next model in the cycle, or returns `None` if a
    /// load is already in flight.
    pub fn request_next(&mut self) -> Option<LoadRequest> {
        let target = self.catalog.next(self.current_index);
        self.begin_load(target)
    }

    /// Starts a load of the previous model in the cycle, or returns `None`
    /// if a load is already in flight.
    pub fn request_previous(&mut self) -> Option<LoadRequest> {
        let target = self.catalog.previous(self.current_index);
        self.begin_load(target)
    }

    fn begin_load(&mut self, target_index: usize) -> Option<LoadRequest> {
        if self.is_loading() {
            return None;
        }
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.phase = Phase::Loading {
            ticket,
            target_index,
            started: Instant::now(),
        };
        self.last_failure = None;
        Some(LoadRequest {
            ticket,
            index: target_index,
            entry: self.catalog.get(target_index).clone(),
        })
    }

    /// Commits a finished load: moves to the target index, re-derives the
    /// display name, replaces the scene (dropping the old handle) and resets
    /// the scale. Returns `false` for a stale ticket, in which case `scene`
    /// is dropped and nothing else changes.
    pub fn complete_load(&mut self, ticket: LoadTicket, scene: S) -> bool {
        match self.phase {
            Phase::Loading {
                ticket: current,
                target_index,
                ..
            } if current == ticket => {
                self.current_index = target_index;
                self.current_name = self.catalog.get(target_index).name.clone();
                self.scale = self.settings.default_scale;
                self.scene = Some(scene);
                self.phase = Phase::Idle;
                true
            }
            _ => false,
        }
    }

    /// Records a failed load: clears the loading phase and sets the failure
    /// notice. Index, name, scale and the current scene stay untouched.
    /// Returns `false` for a stale ticket.
    pub fn fail_load(&mut self, ticket: LoadTicket, message: impl Into<String>) -> bool {
        match self.phase {
            Phase::Loading {
                ticket: current, ..
            } if current == ticket => {
                self.phase = Phase::Idle;
                self.last_failure = Some(message.into());
                true
            }
            _ => false,
        }
    }

    /// Abandons the in-flight load once the configured timeout has elapsed.
    /// The abandoned ticket no longer matches, so a completion arriving
    /// later is dropped as stale. Returns `true` when a timeout fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(timeout) = self.settings.load_timeout else {
            return false;
        };
        if let Phase::Loading {
            target_index,
            started,
            ..
        } = self.phase
        {
            if now.duration_since(started) >= timeout {
                let name = &self.catalog.get(target_index).name;
                self.last_failure = Some(format!("timed out loading \"{name}\""));
                self.phase = Phase::Idle;
                return true;
            }
        }
        false
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale * self.settings.zoom_factor);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale / self.settings.zoom_factor);
    }

    fn set_scale(&mut self, scale: f32) {
        self.scale = scale.clamp(self.settings.min_scale, self.settings.max_scale);
    }

    /// Startup-only: installs the scene for the model the session opens on,
    /// without an index transition.
    pub fn install_scene(&mut self, scene: S) {
        self.scene = Some(scene);
    }

    /// Startup-only: records a failed initial load. The session continues
    /// with an empty viewport.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.last_failure = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;

    fn catalog(n: usize) -> ModelCatalog {
        let entries = (0..n)
            .map(|i| ModelEntry::from_path(PathBuf::from(format!("m{i}.gltf"))))
            .collect();
        ModelCatalog::new(entries).unwrap()
    }

    fn viewer(n: usize) -> ViewerState<()> {
        ViewerState::new(catalog(n), ViewSettings::default())
    }

    /// Scene stand-in that flips a flag when dropped.
    struct TrackedScene(Rc<Cell<bool>>);

    impl Drop for TrackedScene {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    #[test]
    fn starts_idle_on_first_entry_at_default_scale() {
        let v = viewer(3);
        assert_eq!(v.current_index(), 0);
        assert_eq!(v.current_name(), "m0");
        assert!(!v.is_loading());
        assert!(v.scene().is_none());
        assert_eq!(v.scale(), ViewSettings::default().default_scale);
    }

    #[test]
    fn requests_are_rejected_while_loading() {
        let mut v = viewer(3);
        let req = v.request_next().expect("idle viewer should accept a request");
        assert!(v.is_loading());
        assert!(v.request_next().is_none());
        assert!(v.request_previous().is_none());
        assert!(v.complete_load(req.ticket, ()));
        assert!(!v.is_loading());
    }

    #[test]
    fn tickets_increase_per_request() {
        let mut v = viewer(3);
        let a = v.request_next().unwrap();
        v.fail_load(a.ticket, "nope");
        let b = v.request_next().unwrap();
        assert!(b.ticket > a.ticket);
    }

    #[test]
    fn stale_completion_is_dropped() {
        let mut v: ViewerState<TrackedScene> =
            ViewerState::new(catalog(3), ViewSettings::default());
        let first = v.request_next().unwrap();
        assert!(v.fail_load(first.ticket, "disk error"));
        let second = v.request_next().unwrap();

        let stale = Rc::new(Cell::new(false));
        assert!(!v.complete_load(first.ticket, TrackedScene(stale.clone())));
        assert!(stale.get(), "stale scene handle should be dropped");
        assert!(v.is_loading(), "in-flight load is unaffected by a stale result");

        let fresh = Rc::new(Cell::new(false));
        assert!(v.complete_load(second.ticket, TrackedScene(fresh.clone())));
        assert_eq!(v.current_index(), 1);
        assert!(!fresh.get());
    }

    #[test]
    fn replaced_scene_is_released() {
        let mut v: ViewerState<TrackedScene> =
            ViewerState::new(catalog(2), ViewSettings::default());
        let old = Rc::new(Cell::new(false));
        v.install_scene(TrackedScene(old.clone()));

        let req = v.request_next().unwrap();
        assert!(!old.get(), "scene must live until the replacement commits");
        let fresh = Rc::new(Cell::new(false));
        assert!(v.complete_load(req.ticket, TrackedScene(fresh.clone())));
        assert!(old.get(), "replaced scene handle should be dropped on commit");
        assert!(!fresh.get());
    }

    #[test]
    fn failure_keeps_previous_model_and_sets_notice() {
        let mut v = viewer(3);
        let req = v.request_next().unwrap();
        assert!(v.complete_load(req.ticket, ()));
        assert_eq!(v.current_index(), 1);
        v.zoom_in();
        let scale_before = v.scale();

        let req = v.request_next().unwrap();
        assert!(v.fail_load(req.ticket, "no such file"));
        assert_eq!(v.current_index(), 1);
        assert_eq!(v.current_name(), "m1");
        assert_eq!(v.scale(), scale_before);
        assert!(v.scene().is_some());
        assert!(!v.is_loading());
        assert_eq!(v.last_failure(), Some("no such file"));
    }

    #[test]
    fn failure_notice_clears_on_next_request() {
        let mut v = viewer(2);
        let req = v.request_next().unwrap();
        v.fail_load(req.ticket, "no such file");
        assert!(v.last_failure().is_some());
        v.request_next().unwrap();
        assert!(v.last_failure().is_none());
    }

    #[test]
    fn timeout_abandons_load_and_late_result_is_stale() {
        let settings = ViewSettings {
            load_timeout: Some(Duration::from_millis(50)),
            ..ViewSettings::default()
        };
        let mut v: ViewerState<()> = ViewerState::new(catalog(2), settings);
        let req = v.request_next().unwrap();

        assert!(!v.tick(Instant::now()), "timeout must not fire immediately");
        assert!(v.tick(Instant::now() + Duration::from_secs(1)));
        assert!(!v.is_loading());
        assert!(v.last_failure().unwrap().contains("timed out"));
        assert!(!v.complete_load(req.ticket, ()));
        assert_eq!(v.current_index(), 0, "abandoned load must not commit");
    }

    #[test]
    fn tick_is_inert_without_a_timeout() {
        let mut v = viewer(2);
        v.request_next().unwrap();
        assert!(!v.tick(Instant::now() + Duration::from_secs(3600)));
        assert!(v.is_loading());
    }

    #[test]
    fn zoom_clamps_to_configured_bounds() {
        let settings = ViewSettings {
            default_scale: 1.0,
            zoom_factor: 10.0,
            min_scale: 0.5,
            max_scale: 2.0,
            load_timeout: None,
        };
        let mut v: ViewerState<()> = ViewerState::new(catalog(1), settings);
        v.zoom_in();
        assert_eq!(v.scale(), 2.0);
        v.zoom_out();
        v.zoom_out();
        assert_eq!(v.scale(), 0.5);
    }

    #[test]
    fn zoom_is_allowed_while_loading() {
        let mut v = viewer(2);
        let req = v.request_next().unwrap();
        v.zoom_in();
        assert!(v.scale() > ViewSettings::default().default_scale);
        assert!(v.complete_load(req.ticket, ()));
        assert_eq!(v.scale(), ViewSettings::default().default_scale);
    }

    #[test]
    fn record_failure_is_visible_without_a_ticket() {
        let mut v = viewer(1);
        v.record_failure("initial load failed");
        assert_eq!(v.last_failure(), Some("initial load failed"));
        assert!(!v.is_loading());
    }
}
