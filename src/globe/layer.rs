use std::time::Instant;

use tracing::debug;

use crate::data::locations::{generate_arcs, Arc, Location};
use crate::data::stars::Star;
use crate::globe::camera::{CameraTween, View, FLY_DURATION};
use crate::globe::effects::{BurstSystem, Halo, ResourceLedger};
use crate::globe::idle::IdleTimer;
use crate::globe::projection::{altitude_to_zoom, GlobeViewport};

/// Altitude used when a location is picked.
pub const SELECT_ALTITUDE: f64 = 2.0;
/// Tighter altitude used by Enter.
pub const FOCUS_ALTITUDE: f64 = 1.2;
/// Pointer hit radius around a location dot, in braille pixels.
pub const HIT_TOLERANCE: i32 = 3;
/// Auto-rotate speed in radians per frame.
const AUTO_ROTATE_STEP: f64 = 0.004;
/// Starfield rotation in radians per frame.
pub const STAR_ROTATION_STEP: f64 = 0.0005;

/// What the pointer should look like over the globe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    /// Over an interactive location
    Pointer,
    /// Over empty globe or space
    Grab,
    /// While dragging
    Grabbing,
}

/// Everything that only exists while the globe is mounted.
struct Scene {
    viewport: GlobeViewport,
    bursts: BurstSystem,
    halo: Halo,
}

struct Drag {
    last: (i32, i32),
    moved: bool,
}

/// Owns the globe scene and turns pointer/keyboard input into camera motion,
/// selection state and visual effects. Siblings only see it through the
/// values its methods return.
pub struct GlobeLayer {
    locations: &'static [Location],
    arcs: Vec<Arc>,
    stars: Vec<Star>,
    ledger: ResourceLedger,
    scene: Option<Scene>,
    hovered: Option<usize>,
    selected: Option<usize>,
    auto_rotate: bool,
    rotating: bool,
    idle: IdleTimer,
    tween: Option<CameraTween>,
    drag: Option<Drag>,
    star_rotation: f64,
    frame: u64,
    started: Instant,
}

impl GlobeLayer {
    pub fn new(locations: &'static [Location], stars: Vec<Star>, now: Instant) -> Self {
        Self {
            locations,
            arcs: generate_arcs(locations),
            stars,
            ledger: ResourceLedger::new(),
            scene: None,
            hovered: None,
            selected: None,
            auto_rotate: true,
            rotating: true,
            idle: IdleTimer::default(),
            tween: None,
            drag: None,
            star_rotation: 0.0,
            frame: 0,
            started: now,
        }
    }

    /// Create the scene, or resize it if it already exists.
    pub fn mount(&mut self, width: usize, height: usize) {
        if let Some(scene) = self.scene.as_mut() {
            scene.viewport.set_size(width, height);
            return;
        }

        debug!(width, height, "mounting globe scene");
        let mut halo = Halo::new(self.ledger.clone());
        if let Some(loc) = self.selected_location() {
            halo.place(loc.lat, loc.lng);
        }
        self.scene = Some(Scene {
            viewport: GlobeViewport::new(20.0, 0.0, 1.0, width, height),
            bursts: BurstSystem::new(self.ledger.clone()),
            halo,
        });
    }

    /// Tear the scene down, releasing every graphics resource it holds.
    pub fn unmount(&mut self) {
        if let Some(mut scene) = self.scene.take() {
            scene.bursts.clear();
            debug!(live = self.ledger.live(), "unmounted globe scene");
        }
        self.tween = None;
        self.drag = None;
        self.hovered = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.scene.is_some()
    }

    pub fn viewport(&self) -> Option<&GlobeViewport> {
        self.scene.as_ref().map(|s| &s.viewport)
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Animate the camera to look at (lat, lng) from `altitude`.
    pub fn fly_to(&mut self, lat: f64, lng: f64, altitude: f64, now: Instant) {
        let Some(scene) = self.scene.as_ref() else {
            return;
        };
        let (clat, clng) = scene.viewport.center();
        let from = View { lat: clat, lng: clng, zoom: scene.viewport.zoom };
        let to = View { lat, lng, zoom: altitude_to_zoom(altitude) };
        self.tween = Some(CameraTween::new(from, to, now, FLY_DURATION));
    }

    /// Short-lived particle burst at a surface point.
    pub fn spawn_burst(&mut self, lat: f64, lng: f64, now: Instant) {
        if let Some(scene) = self.scene.as_mut() {
            scene.bursts.spawn(lat, lng, now);
        }
    }

    /// Select a location: fly to it, mark it with the halo, burst on it.
    pub fn select(&mut self, index: usize, now: Instant) -> Option<&'static Location> {
        let locations = self.locations;
        let loc = locations.get(index)?;
        self.selected = Some(index);
        if let Some(scene) = self.scene.as_mut() {
            scene.halo.place(loc.lat, loc.lng);
        }
        self.fly_to(loc.lat, loc.lng, SELECT_ALTITUDE, now);
        self.spawn_burst(loc.lat, loc.lng, now);
        Some(loc)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        if let Some(scene) = self.scene.as_mut() {
            scene.halo.hide();
        }
    }

    /// Right arrow: next location, wrapping to the first.
    pub fn select_next(&mut self, now: Instant) -> Option<&'static Location> {
        let n = self.locations.len();
        if n == 0 {
            return None;
        }
        let next = self.selected.map_or(0, |i| (i + 1) % n);
        self.select(next, now)
    }

    /// Left arrow: previous location, wrapping to the last.
    pub fn select_prev(&mut self, now: Instant) -> Option<&'static Location> {
        let n = self.locations.len();
        if n == 0 {
            return None;
        }
        let prev = self.selected.map_or(n - 1, |i| (i + n - 1) % n);
        self.select(prev, now)
    }

    /// Enter: re-centre on the selection at the tighter altitude.
    pub fn recenter(&mut self, now: Instant) {
        if let Some(loc) = self.selected_location() {
            self.fly_to(loc.lat, loc.lng, FOCUS_ALTITUDE, now);
        }
    }

    /// Space: flip the auto-rotate preference. Turning it on spins at once;
    /// turning it off also stops the idle timer from bringing it back.
    pub fn toggle_auto_rotate(&mut self) {
        self.auto_rotate = !self.auto_rotate;
        self.rotating = self.auto_rotate;
        if !self.auto_rotate {
            self.idle.cancel();
        }
    }

    pub fn set_auto_rotate(&mut self, on: bool) {
        if self.auto_rotate != on {
            self.toggle_auto_rotate();
        }
    }

    /// Any pointer/keyboard activity: stop spinning and restart the idle wait.
    pub fn note_interaction(&mut self, now: Instant) {
        self.rotating = false;
        if self.auto_rotate {
            self.idle.touch(now);
        }
    }

    /// Location dot under a pixel, nearest first.
    pub fn hit_test(&self, px: i32, py: i32) -> Option<usize> {
        let vp = self.viewport()?;
        let tol2 = HIT_TOLERANCE * HIT_TOLERANCE;
        self.locations
            .iter()
            .enumerate()
            .filter_map(|(i, loc)| {
                let (x, y) = vp.project(loc.lat, loc.lng)?;
                let d2 = (x - px).pow(2) + (y - py).pow(2);
                (d2 <= tol2).then_some((d2, i))
            })
            .min()
            .map(|(_, i)| i)
    }

    pub fn pointer_move(&mut self, px: i32, py: i32, now: Instant) {
        self.note_interaction(now);
        self.hovered = self.hit_test(px, py);
    }

    pub fn pointer_leave(&mut self) {
        self.hovered = None;
    }

    pub fn pointer_down(&mut self, px: i32, py: i32, now: Instant) {
        self.note_interaction(now);
        self.drag = Some(Drag { last: (px, py), moved: false });
    }

    /// Drag rotates the globe so the surface follows the pointer.
    pub fn pointer_drag(&mut self, px: i32, py: i32, now: Instant) {
        self.note_interaction(now);
        self.hovered = None;
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let (dx, dy) = (drag.last.0 - px, drag.last.1 - py);
        if dx == 0 && dy == 0 {
            return;
        }
        drag.last = (px, py);
        drag.moved = true;
        self.tween = None;
        if let Some(scene) = self.scene.as_mut() {
            scene.viewport.rotate_drag(dx, dy);
        }
    }

    /// Release; a press that did not drag is a click. Returns the clicked
    /// location after selecting it.
    pub fn pointer_up(&mut self, px: i32, py: i32, now: Instant) -> Option<usize> {
        if !self.take_click(now) {
            return None;
        }
        let index = self.hit_test(px, py)?;
        self.select(index, now)?;
        Some(index)
    }

    /// End a press; true when it was a click rather than a drag.
    pub fn take_click(&mut self, now: Instant) -> bool {
        self.note_interaction(now);
        self.drag.take().is_some_and(|d| !d.moved)
    }

    /// Scroll zoom. Cancels a running fly-to.
    pub fn zoom_by(&mut self, factor: f64, now: Instant) {
        self.note_interaction(now);
        self.tween = None;
        if let Some(scene) = self.scene.as_mut() {
            scene.viewport.zoom_by(factor);
        }
    }

    pub fn cursor(&self) -> CursorStyle {
        if self.drag.as_ref().is_some_and(|d| d.moved) {
            CursorStyle::Grabbing
        } else if self.hovered.is_some() {
            CursorStyle::Pointer
        } else {
            CursorStyle::Grab
        }
    }

    /// Advance one frame: idle timer, camera tween or auto-rotate, starfield,
    /// and the shared burst update.
    pub fn tick(&mut self, now: Instant) {
        self.frame = self.frame.wrapping_add(1);
        self.star_rotation += STAR_ROTATION_STEP;

        if self.idle.poll(now) && self.auto_rotate {
            debug!("idle timeout, resuming auto-rotate");
            self.rotating = true;
        }

        let Some(scene) = self.scene.as_mut() else {
            return;
        };

        if let Some(tween) = &self.tween {
            let (view, done) = tween.sample(now);
            scene.viewport.look_at(view.lat, view.lng);
            scene.viewport.zoom = view.zoom;
            if done {
                self.tween = None;
            }
        } else if self.rotating {
            scene.viewport.spin(AUTO_ROTATE_STEP);
        }

        if scene.bursts.is_running() {
            scene.bursts.tick(now);
        }
    }

    pub fn locations(&self) -> &'static [Location] {
        self.locations
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn star_rotation(&self) -> f64 {
        self.star_rotation
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Time since the layer was created (drives dash and ring phases).
    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.started).as_millis() as u64
    }

    pub fn halo(&self) -> Option<&Halo> {
        self.scene.as_ref().map(|s| &s.halo)
    }

    pub fn bursts(&self) -> Option<&BurstSystem> {
        self.scene.as_ref().map(|s| &s.bursts)
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn hovered_location(&self) -> Option<&'static Location> {
        self.hovered.and_then(|i| self.locations.get(i))
    }

    pub fn selected_location(&self) -> Option<&'static Location> {
        self.selected.and_then(|i| self.locations.get(i))
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    pub fn auto_rotate_enabled(&self) -> bool {
        self.auto_rotate
    }

    pub fn is_flying(&self) -> bool {
        self.tween.is_some()
    }
}
