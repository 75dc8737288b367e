//! Transient and persistent globe decorations, and the ledger that owns
//! their graphics buffers.
//!
//! Every buffer is a [`GpuResource`] handed out by a [`ResourceLedger`].
//! Dropping the handle releases the buffer, so a burst that expires, a halo
//! that is torn down, and a whole scene that is unmounted all free their
//! resources exactly once without explicit bookkeeping at the call sites.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::geo::{destination, small_circle};
use crate::hash::{hash2, unit_noise};

/// Burst lifetime.
pub const BURST_LIFETIME: Duration = Duration::from_millis(900);
/// Particles per burst.
pub const BURST_PARTICLES: usize = 24;
/// How far (degrees of arc) the fastest particle travels in one lifetime.
const BURST_REACH_DEG: f64 = 8.0;
/// Halo ring radius in degrees of arc.
pub const HALO_RADIUS_DEG: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ParticleBuffer,
    HaloMesh,
}

#[derive(Default)]
struct LedgerState {
    next_id: u64,
    live: HashSet<u64>,
    allocated: u64,
    released: u64,
}

/// Tracks every graphics buffer the globe has allocated and not yet freed.
#[derive(Clone, Default)]
pub struct ResourceLedger {
    state: Rc<RefCell<LedgerState>>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a buffer; it is released when the returned handle drops.
    pub fn allocate(&self, kind: ResourceKind, len: usize) -> GpuResource {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.allocated += 1;
        state.live.insert(id);
        trace!(id, ?kind, len, "allocated graphics buffer");

        GpuResource {
            id,
            kind,
            len,
            ledger: Rc::clone(&self.state),
        }
    }

    /// Buffers currently alive.
    pub fn live(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn allocated(&self) -> u64 {
        self.state.borrow().allocated
    }

    pub fn released(&self) -> u64 {
        self.state.borrow().released
    }
}

/// Owned graphics buffer. Not `Clone`: one handle, one release.
pub struct GpuResource {
    id: u64,
    kind: ResourceKind,
    len: usize,
    ledger: Rc<RefCell<LedgerState>>,
}

impl GpuResource {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for GpuResource {
    fn drop(&mut self) {
        let mut state = self.ledger.borrow_mut();
        if state.live.remove(&self.id) {
            state.released += 1;
            trace!(id = self.id, kind = ?self.kind, "released graphics buffer");
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Particle {
    /// Radians clockwise from north
    bearing: f64,
    /// Fraction of the full reach travelled over the lifetime
    speed: f64,
}

/// One outward-expanding particle burst anchored at a surface point.
pub struct Burst {
    pub lat: f64,
    pub lng: f64,
    born: Instant,
    particles: Vec<Particle>,
    _buffer: GpuResource,
}

impl Burst {
    /// Fraction of the lifetime elapsed at `now`, in [0, 1].
    pub fn progress(&self, now: Instant) -> f64 {
        let age = now.saturating_duration_since(self.born);
        (age.as_secs_f64() / BURST_LIFETIME.as_secs_f64()).min(1.0)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.born) >= BURST_LIFETIME
    }

    /// Current particle positions (lat, lng).
    pub fn particle_positions(&self, now: Instant) -> impl Iterator<Item = (f64, f64)> + '_ {
        // Ease-out so particles decelerate as they spread
        let t = self.progress(now);
        let spread = 1.0 - (1.0 - t) * (1.0 - t);
        self.particles.iter().map(move |p| {
            destination(self.lat, self.lng, p.bearing, BURST_REACH_DEG * p.speed * spread)
        })
    }
}

/// All live bursts, advanced by one shared per-frame update.
pub struct BurstSystem {
    ledger: ResourceLedger,
    bursts: Vec<Burst>,
    spawned: u64,
    running: bool,
}

impl BurstSystem {
    pub fn new(ledger: ResourceLedger) -> Self {
        Self {
            ledger,
            bursts: Vec::new(),
            spawned: 0,
            running: false,
        }
    }

    /// Start a burst at (lat, lng) and make sure the update loop runs.
    pub fn spawn(&mut self, lat: f64, lng: f64, now: Instant) {
        let seq = self.spawned;
        self.spawned += 1;

        let particles = (0..BURST_PARTICLES)
            .map(|i| {
                let jitter = unit_noise(hash2(seq, i as u64));
                Particle {
                    bearing: (i as f64 + jitter) / BURST_PARTICLES as f64 * std::f64::consts::TAU,
                    speed: 0.55 + 0.45 * unit_noise(hash2(i as u64, seq.wrapping_add(0x5eed))),
                }
            })
            .collect::<Vec<_>>();

        let buffer = self.ledger.allocate(ResourceKind::ParticleBuffer, particles.len() * 3);
        self.bursts.push(Burst { lat, lng, born: now, particles, _buffer: buffer });
        self.running = true;
    }

    /// Advance every burst, dropping (and releasing) the expired ones.
    /// Returns whether any burst is still alive; the loop stops when not.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.running {
            return false;
        }
        self.bursts.retain(|b| !b.is_expired(now));
        self.running = !self.bursts.is_empty();
        self.running
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    /// Drop every burst immediately (scene teardown).
    pub fn clear(&mut self) {
        self.bursts.clear();
        self.running = false;
    }
}

/// Persistent selection marker. The mesh is allocated on first placement
/// and only hidden afterwards.
pub struct Halo {
    ledger: ResourceLedger,
    mesh: Option<GpuResource>,
    position: Option<(f64, f64)>,
    ring: Vec<(f64, f64)>,
    visible: bool,
}

impl Halo {
    pub fn new(ledger: ResourceLedger) -> Self {
        Self {
            ledger,
            mesh: None,
            position: None,
            ring: Vec::new(),
            visible: false,
        }
    }

    /// Move the halo to (lat, lng) and show it.
    pub fn place(&mut self, lat: f64, lng: f64) {
        if self.mesh.is_none() {
            self.mesh = Some(self.ledger.allocate(ResourceKind::HaloMesh, 48));
        }
        if self.position != Some((lat, lng)) {
            self.ring = small_circle(lat, lng, HALO_RADIUS_DEG, 48);
            self.position = Some((lat, lng));
        }
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        self.position
    }

    /// Ring outline when visible.
    pub fn ring(&self) -> Option<&[(f64, f64)]> {
        self.visible.then_some(self.ring.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_drop_releases_once() {
        let ledger = ResourceLedger::new();
        let a = ledger.allocate(ResourceKind::ParticleBuffer, 3);
        let b = ledger.allocate(ResourceKind::HaloMesh, 3);
        assert_eq!(ledger.live(), 2);
        drop(a);
        assert_eq!(ledger.live(), 1);
        drop(b);
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.allocated(), 2);
        assert_eq!(ledger.released(), 2);
    }

    #[test]
    fn test_bursts_expire_and_stop_loop() {
        let ledger = ResourceLedger::new();
        let mut system = BurstSystem::new(ledger.clone());
        let t0 = Instant::now();

        system.spawn(10.0, 20.0, t0);
        system.spawn(-5.0, 40.0, t0 + Duration::from_millis(400));
        assert_eq!(ledger.live(), 2);
        assert!(system.is_running());

        assert!(system.tick(t0 + Duration::from_millis(899)));
        assert!(system.tick(t0 + Duration::from_millis(900)));
        assert_eq!(system.bursts().len(), 1);
        assert_eq!(ledger.live(), 1);

        assert!(!system.tick(t0 + Duration::from_millis(1300)));
        assert!(!system.is_running());
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.released(), 2);
    }

    #[test]
    fn test_clear_releases_everything() {
        let ledger = ResourceLedger::new();
        let mut system = BurstSystem::new(ledger.clone());
        let t0 = Instant::now();
        for i in 0..5 {
            system.spawn(i as f64, 0.0, t0);
        }
        system.clear();
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.released(), 5);
        assert!(!system.tick(t0));
    }

    #[test]
    fn test_particles_spread_outward() {
        let ledger = ResourceLedger::new();
        let mut system = BurstSystem::new(ledger);
        let t0 = Instant::now();
        system.spawn(0.0, 0.0, t0);
        let burst = &system.bursts()[0];

        let start: Vec<_> = burst.particle_positions(t0).collect();
        assert_eq!(start.len(), BURST_PARTICLES);
        assert!(start.iter().all(|(lat, lng)| lat.abs() < 1e-9 && lng.abs() < 1e-9));

        let later = burst.particle_positions(t0 + Duration::from_millis(600));
        assert!(later.into_iter().all(|(lat, lng)| lat.hypot(lng) > 1.0));
    }

    #[test]
    fn test_halo_allocates_once_and_hides() {
        let ledger = ResourceLedger::new();
        let mut halo = Halo::new(ledger.clone());
        assert!(halo.ring().is_none());

        halo.place(51.5, -0.1);
        halo.place(35.6, 139.6);
        assert_eq!(ledger.allocated(), 1);
        assert_eq!(halo.position(), Some((35.6, 139.6)));
        assert!(halo.ring().is_some());

        halo.hide();
        assert!(!halo.is_visible());
        assert!(halo.ring().is_none());
        assert_eq!(ledger.live(), 1);

        drop(halo);
        assert_eq!(ledger.live(), 0);
    }
}
