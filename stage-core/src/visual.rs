//! Visual sync layer: one interactive proxy per entity.
//!
//! Model → proxy: component changes mark a proxy dirty and enqueue a single
//! refresh that runs on the next [`run_pending`](crate::SceneDocument::run_pending)
//! turn. Proxy → model: geometry signals raised by direct manipulation are
//! routed back to the transform. Signals raised while a refresh writes
//! geometry are dropped under a [`FeedbackGuard`], so a refresh never writes
//! the model.

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::geometry::{Affine, Point, Rect, Size};
use crate::layout::{Placement, DEFAULT_CONTENT_SIZE};

/// Refresh lifecycle of a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RefreshState {
    /// Geometry matches the model.
    #[default]
    Clean,
    /// A refresh is queued; further changes are absorbed into it.
    DirtyScheduled,
    /// Geometry is being written.
    Refreshing,
}

/// Which proxy property changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    /// Position in the parent's coordinates.
    Position,
    /// Rotation.
    Rotation,
    /// Local rectangle size.
    Size,
}

/// Change notification raised by a proxy geometry write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxySignal {
    /// The proxy's entity.
    pub entity: EntityId,
    /// What changed.
    pub kind: SignalKind,
}

/// Interactive stand-in for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualProxy {
    entity: EntityId,
    local_rect: Rect,
    position: Point,
    rotation: f64,
    z: usize,
    selected: bool,
    state: RefreshState,
    refresh_count: u64,
}

impl VisualProxy {
    /// A clean proxy with the default candidate size.
    #[must_use]
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            local_rect: Rect::from_size(DEFAULT_CONTENT_SIZE),
            position: Point::ZERO,
            rotation: 0.0,
            z: 0,
            selected: false,
            state: RefreshState::Clean,
            refresh_count: 0,
        }
    }

    /// The entity this proxy shows.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Local rectangle (origin at the proxy position).
    #[must_use]
    pub fn local_rect(&self) -> Rect {
        self.local_rect
    }

    /// Position in the parent proxy's local coordinates.
    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Rotation in degrees.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Stacking order; higher draws later.
    #[must_use]
    pub fn z(&self) -> usize {
        self.z
    }

    /// Whether this proxy is the selection.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Refresh lifecycle state.
    #[must_use]
    pub fn state(&self) -> RefreshState {
        self.state
    }

    /// Completed refreshes.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    /// Local-to-parent transform.
    #[must_use]
    pub fn local_transform(&self) -> Affine {
        Affine::placement(self.position, self.rotation)
    }

    /// Move the proxy; raises a signal when the position changed.
    pub fn set_position(&mut self, position: Point) -> Option<ProxySignal> {
        if !position.is_finite() || self.position == position {
            return None;
        }
        self.position = position;
        Some(self.signal(SignalKind::Position))
    }

    /// Rotate the proxy; raises a signal when the rotation changed.
    pub fn set_rotation(&mut self, degrees: f64) -> Option<ProxySignal> {
        if !degrees.is_finite() || (self.rotation - degrees).abs() <= f64::EPSILON {
            return None;
        }
        self.rotation = degrees;
        Some(self.signal(SignalKind::Rotation))
    }

    /// Resize the proxy; raises a signal when the size changed.
    pub fn set_size(&mut self, size: Size) -> Option<ProxySignal> {
        if !size.is_finite() {
            return None;
        }
        let rect = Rect::from_size(size);
        if self.local_rect == rect {
            return None;
        }
        self.local_rect = rect;
        Some(self.signal(SignalKind::Size))
    }

    fn signal(&self, kind: SignalKind) -> ProxySignal {
        ProxySignal {
            entity: self.entity,
            kind,
        }
    }
}

/// Counters describing sync activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncStats {
    /// Completed proxy refreshes.
    pub refreshes: u64,
    /// Schedule requests absorbed by an already queued refresh.
    pub absorbed_schedules: u64,
    /// Proxy signals dropped while a refresh held the feedback guard.
    pub suppressed_signals: u64,
    /// Transform writes caused by direct manipulation.
    pub gesture_writes: u64,
}

/// Scoped suppression of proxy → model feedback.
///
/// Restores the previous flag value on drop, so guards nest.
#[derive(Debug)]
pub struct FeedbackGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> FeedbackGuard<'a> {
    /// Raise `flag` until the guard is dropped.
    #[must_use]
    pub fn engage(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for FeedbackGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

fn route_signal(
    suppressing: &Cell<bool>,
    stats: &mut SyncStats,
    signal: ProxySignal,
) -> Option<ProxySignal> {
    if suppressing.get() {
        stats.suppressed_signals += 1;
        tracing::trace!("Suppressed {:?} signal from {}", signal.kind, signal.entity);
        return None;
    }
    Some(signal)
}

/// Side table of proxies keyed by entity, plus the refresh queue.
#[derive(Debug, Default)]
pub struct VisualLayer {
    proxies: HashMap<EntityId, VisualProxy>,
    pending: VecDeque<EntityId>,
    suppressing: Cell<bool>,
    stats: SyncStats,
}

impl VisualLayer {
    /// An empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of proxies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Whether there are no proxies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// The proxy for `id`.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&VisualProxy> {
        self.proxies.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut VisualProxy> {
        self.proxies.get_mut(&id)
    }

    /// Whether `id` has a proxy.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.proxies.contains_key(&id)
    }

    /// All proxies in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &VisualProxy> {
        self.proxies.values()
    }

    /// Create a proxy for `id`; returns `false` if one exists.
    pub fn insert(&mut self, id: EntityId) -> bool {
        if self.proxies.contains_key(&id) {
            return false;
        }
        self.proxies.insert(id, VisualProxy::new(id));
        true
    }

    /// Release the proxy for `id` and drop any queued refresh.
    pub fn remove(&mut self, id: EntityId) -> Option<VisualProxy> {
        self.pending.retain(|p| *p != id);
        self.proxies.remove(&id)
    }

    /// Drop every proxy and queued refresh; counters are kept.
    pub fn clear(&mut self) {
        self.proxies.clear();
        self.pending.clear();
    }

    /// Queue a refresh of `id`.
    ///
    /// Returns `true` if this call queued it and `false` if it was absorbed
    /// by a refresh that is already queued or running.
    pub fn schedule(&mut self, id: EntityId) -> bool {
        let Some(proxy) = self.proxies.get_mut(&id) else {
            return false;
        };
        if proxy.state != RefreshState::Clean {
            self.stats.absorbed_schedules += 1;
            return false;
        }
        proxy.state = RefreshState::DirtyScheduled;
        self.pending.push_back(id);
        true
    }

    /// Whether refreshes are queued.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of queued refreshes.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn take_pending(&mut self) -> Vec<EntityId> {
        self.pending.drain(..).collect()
    }

    /// Whether a refresh currently holds the feedback guard.
    #[must_use]
    pub fn is_suppressing(&self) -> bool {
        self.suppressing.get()
    }

    /// Pass a proxy signal toward the model, or drop it under the guard.
    pub fn route(&mut self, signal: ProxySignal) -> Option<ProxySignal> {
        route_signal(&self.suppressing, &mut self.stats, signal)
    }

    pub(crate) fn begin_refresh(&mut self, id: EntityId) {
        if let Some(proxy) = self.proxies.get_mut(&id) {
            proxy.state = RefreshState::Refreshing;
        }
    }

    /// Write resolved geometry into a proxy under the feedback guard.
    ///
    /// Returns the number of signals suppressed.
    pub(crate) fn apply_placement(&mut self, id: EntityId, placement: &Placement) -> usize {
        let Self {
            proxies,
            suppressing,
            stats,
            ..
        } = self;
        let Some(proxy) = proxies.get_mut(&id) else {
            return 0;
        };

        let _guard = FeedbackGuard::engage(suppressing);
        let signals = [
            proxy.set_size(placement.local_rect.size()),
            proxy.set_position(placement.position),
            proxy.set_rotation(placement.rotation),
        ];
        let suppressed = signals
            .into_iter()
            .flatten()
            .filter(|s| route_signal(suppressing, stats, *s).is_none())
            .count();

        proxy.state = RefreshState::Clean;
        proxy.refresh_count += 1;
        stats.refreshes += 1;
        tracing::trace!("Refreshed {} ({} signals suppressed)", id, suppressed);
        suppressed
    }

    /// Pin the root proxy to the canvas rectangle; the root is never laid out.
    pub(crate) fn pin_to_canvas(&mut self, id: EntityId, canvas: Rect) {
        if let Some(proxy) = self.proxies.get_mut(&id) {
            proxy.local_rect = canvas;
            proxy.position = Point::ZERO;
            proxy.rotation = 0.0;
            proxy.state = RefreshState::Clean;
        }
    }

    /// Assign z-values from a pre-order listing.
    pub(crate) fn restack(&mut self, order: &[EntityId]) {
        for (z, id) in order.iter().enumerate() {
            if let Some(proxy) = self.proxies.get_mut(id) {
                proxy.z = z;
            }
        }
    }

    /// Mark exactly `selected` as selected (or nothing for `None`).
    pub fn set_selected(&mut self, selected: Option<EntityId>) {
        for (id, proxy) in &mut self.proxies {
            proxy.selected = Some(*id) == selected;
        }
    }

    /// The selected entity, if any.
    #[must_use]
    pub fn selected(&self) -> Option<EntityId> {
        self.proxies
            .values()
            .find(|p| p.selected)
            .map(VisualProxy::entity)
    }

    /// Sync counters.
    #[must_use]
    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub(crate) fn record_gesture_write(&mut self) {
        self.stats.gesture_writes += 1;
    }
}
