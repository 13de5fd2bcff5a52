//! Scroll physics: drag, fling, momentum and snap-back.
//!
//! Everything advances in [`ScrollPhysics::tick`], one call per animation
//! interval. Pointer handlers only record where the pointer is; the tick
//! turns that into motion, velocity samples and state changes.

use std::collections::VecDeque;

use glide_core::{EasingFn, Vec2};

use super::config::ListConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollState {
    Idle,
    Dragging,
    Momentum,
    SnapToBounds,
}

/// How a press ended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Release {
    /// The pointer never left the drag lock: treat it as a tap at this
    /// (device space) position.
    Click(Vec2),
    /// The press was a drag; momentum may follow.
    Fling { velocity: f32 },
}

/// Result of one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollStep {
    /// Change applied to the offset this tick.
    pub delta: f32,
    /// The list came to rest this tick (nothing moving, no pointer down).
    pub at_rest: bool,
}

#[derive(Clone, Copy, Debug)]
struct Press {
    origin: Vec2,
    last: Vec2,
    current: Vec2,
}

#[derive(Clone, Copy, Debug)]
struct Snap {
    from: f32,
    to: f32,
    frame: u32,
}

pub struct ScrollPhysics {
    tick_ms: f64,
    snap_ms: f64,
    decay: f32,
    min_velocity: f32,
    max_samples: usize,
    lock_distance: f32,
    easing: EasingFn,

    offset: f32,
    content: f32,
    viewport: f32,

    state: ScrollState,
    press: Option<Press>,
    drag_locked: bool,
    samples: VecDeque<f32>,
    velocity: f32,
    snap: Option<Snap>,
}

impl std::fmt::Debug for ScrollPhysics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollPhysics")
            .field("state", &self.state)
            .field("offset", &self.offset)
            .field("content", &self.content)
            .field("viewport", &self.viewport)
            .field("velocity", &self.velocity)
            .finish_non_exhaustive()
    }
}

impl ScrollPhysics {
    pub fn new(config: &ListConfig) -> Self {
        Self {
            tick_ms: config.tick_interval_ms.max(1) as f64,
            snap_ms: config.snap_duration_ms as f64,
            decay: config.momentum_decay,
            min_velocity: config.min_velocity,
            max_samples: config.velocity_samples.max(1),
            lock_distance: config.drag_lock_distance(),
            easing: config.easing.function(),
            offset: 0.0,
            content: 0.0,
            viewport: 0.0,
            state: ScrollState::Idle,
            press: None,
            drag_locked: true,
            samples: VecDeque::new(),
            velocity: 0.0,
            snap: None,
        }
    }

    /// Use a custom curve for snap and scroll-to animations.
    pub fn set_easing(&mut self, easing: EasingFn) {
        self.easing = easing;
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn content_height(&self) -> f32 {
        self.content
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport
    }

    /// Lowest legal offset.
    pub fn min_offset(&self) -> f32 {
        (self.viewport - self.content).min(0.0)
    }

    pub fn clamp(&self, offset: f32) -> f32 {
        offset.max(self.viewport - self.content).min(0.0)
    }

    pub fn in_bounds(&self) -> bool {
        self.offset <= 0.0 && self.offset >= self.min_offset()
    }

    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    pub fn is_at_rest(&self) -> bool {
        self.state == ScrollState::Idle && self.press.is_none() && self.in_bounds()
    }

    pub fn set_extent(&mut self, content: f32, viewport: f32) {
        self.content = content.max(0.0);
        self.viewport = viewport.max(0.0);
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        if self.state != ScrollState::Dragging {
            log::trace!("scroll: {:?} -> Dragging", self.state);
        }
        self.snap = None;
        self.velocity = 0.0;
        self.samples.clear();
        self.press = Some(Press {
            origin: position,
            last: position,
            current: position,
        });
        self.state = ScrollState::Dragging;
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        if let Some(p) = self.press.as_mut() {
            p.current = position;
        }
    }

    /// End the press. A release inside the drag lock is a click; anything
    /// else flings with the average of the recent per-tick deltas.
    pub fn pointer_up(&mut self, position: Vec2) -> Option<Release> {
        let press = self.press.take()?;
        if self.drag_locked {
            self.state = ScrollState::Idle;
            self.samples.clear();
            return Some(Release::Click(position));
        }
        self.push_sample(position.y - press.last.y);
        let velocity = self.average();
        self.samples.clear();
        Some(Release::Fling {
            velocity: if self.fling(velocity) { velocity } else { 0.0 },
        })
    }

    pub fn cancel(&mut self) {
        if self.press.take().is_some() {
            self.samples.clear();
            self.state = ScrollState::Idle;
        }
    }

    /// Start momentum at `velocity` px per tick if that moves content
    /// further into its legal range. Returns whether momentum started.
    pub fn fling(&mut self, velocity: f32) -> bool {
        let moves = self.offset + velocity < 0.0
            && self.offset + self.content + velocity >= self.viewport;
        if moves && velocity.abs() > self.min_velocity {
            log::trace!("scroll: fling at {velocity:.1} px/tick");
            self.velocity = velocity;
            self.snap = None;
            self.state = ScrollState::Momentum;
            true
        } else {
            self.velocity = 0.0;
            if self.state != ScrollState::SnapToBounds {
                self.state = ScrollState::Idle;
            }
            false
        }
    }

    /// Animate to `target` (clamped to the legal range). Returns false when
    /// already there.
    pub fn animate_to(&mut self, target: f32) -> bool {
        let target = self.clamp(target);
        if target == self.offset {
            return false;
        }
        self.begin_snap(target);
        true
    }

    /// Jump to `target` (clamped), stopping any animation. Returns the
    /// applied delta.
    pub fn jump_to(&mut self, target: f32) -> f32 {
        let target = self.clamp(target);
        self.snap = None;
        self.velocity = 0.0;
        if self.press.is_none() {
            self.state = ScrollState::Idle;
        }
        let delta = target - self.offset;
        self.offset = target;
        delta
    }

    /// Shift the offset by `delta` with no bounds check.
    #[cfg(test)]
    fn shift(&mut self, delta: f32) {
        self.offset += delta;
    }

    fn begin_snap(&mut self, to: f32) {
        log::trace!("scroll: {:?} -> SnapToBounds ({} -> {to})", self.state, self.offset);
        self.velocity = 0.0;
        self.snap = Some(Snap {
            from: self.offset,
            to,
            frame: 0,
        });
        self.state = ScrollState::SnapToBounds;
    }

    fn push_sample(&mut self, delta: f32) {
        self.samples.push_back(delta);
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }
    }

    fn average(&self) -> f32 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.samples.iter().sum::<f32>() / self.samples.len() as f32
        }
    }

    fn drag_delta(&self, delta: f32) -> f32 {
        let mut d = delta;
        if self.content <= self.viewport || self.offset + d > 0.0 {
            d = -self.offset;
        }
        if self.content > self.viewport && self.offset + self.content + d < self.viewport {
            d = self.viewport - self.offset - self.content;
        }
        d
    }

    pub fn tick(&mut self) -> ScrollStep {
        let before = self.offset;
        let mut at_rest = false;
        match self.state {
            ScrollState::Dragging => self.tick_drag(),
            ScrollState::Momentum => {
                if self.velocity.abs() > self.min_velocity {
                    let target = self.offset + self.velocity;
                    let clamped = self.clamp(target);
                    self.offset = clamped;
                    self.velocity *= self.decay;
                    if clamped != target {
                        log::trace!("scroll: momentum hit the edge");
                        self.velocity = 0.0;
                    }
                } else {
                    self.velocity = 0.0;
                    self.state = ScrollState::Idle;
                    at_rest = self.settle();
                }
            }
            ScrollState::SnapToBounds => self.tick_snap(),
            ScrollState::Idle => at_rest = self.settle(),
        }
        ScrollStep {
            delta: self.offset - before,
            at_rest,
        }
    }

    fn tick_drag(&mut self) {
        let Some(mut press) = self.press else {
            self.state = ScrollState::Idle;
            return;
        };
        if self.drag_locked {
            if (press.current.y - press.origin.y).abs() > self.lock_distance {
                self.drag_locked = false;
                press.origin = press.current;
                press.last = press.current;
                self.press = Some(press);
            }
            return;
        }
        let delta = self.drag_delta(press.current.y - press.last.y);
        press.last = press.current;
        self.press = Some(press);
        self.offset += delta;
        self.push_sample(delta);
    }

    fn tick_snap(&mut self) {
        let Some(mut snap) = self.snap else {
            self.state = ScrollState::Idle;
            return;
        };
        snap.frame += 1;
        let t = snap.frame as f64 * self.tick_ms;
        if t >= self.snap_ms {
            self.offset = snap.to;
            self.snap = None;
            self.state = ScrollState::Idle;
            log::trace!("scroll: SnapToBounds -> Idle at {}", self.offset);
        } else {
            let from = snap.from as f64;
            let change = (snap.to - snap.from) as f64;
            self.offset = (self.easing)(t, from, change, self.snap_ms) as f32;
            self.snap = Some(snap);
        }
    }

    /// Idle housekeeping: re-arm the drag lock and start snap-back when the
    /// offset sits outside the legal range. Returns true when at rest.
    fn settle(&mut self) -> bool {
        self.velocity = 0.0;
        self.drag_locked = true;
        if self.offset > 0.0 || (self.content <= self.viewport && self.offset != 0.0) {
            self.begin_snap(0.0);
            return false;
        }
        if self.content > self.viewport && self.offset + self.content < self.viewport {
            self.begin_snap(self.viewport - self.content);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn physics(content: f32, viewport: f32) -> ScrollPhysics {
        let mut p = ScrollPhysics::new(&ListConfig::default());
        p.set_extent(content, viewport);
        p
    }

    fn drag(p: &mut ScrollPhysics, ys: &[f32]) {
        for &y in ys {
            p.pointer_move(Vec2::new(0.0, y));
            p.tick();
        }
    }

    #[test]
    fn momentum_decays_geometrically() {
        let mut p = physics(100_000.0, 400.0);
        p.jump_to(-50_000.0);
        assert!(p.fling(40.0));
        let mut ticks = 0;
        while p.state() == ScrollState::Momentum {
            if p.tick().delta != 0.0 {
                ticks += 1;
            }
        }
        let expected = ((1.0f64 / 40.0).ln() / 0.85f64.ln()).ceil() as usize;
        assert_eq!(ticks, expected);
        assert_eq!(ticks, 23);
    }

    #[test]
    fn press_inside_drag_lock_is_a_click() {
        let mut p = physics(1000.0, 400.0);
        p.pointer_down(Vec2::new(10.0, 100.0));
        drag(&mut p, &[103.0, 105.0]);
        assert_eq!(p.offset(), 0.0);
        assert_eq!(
            p.pointer_up(Vec2::new(10.0, 105.0)),
            Some(Release::Click(Vec2::new(10.0, 105.0)))
        );
    }

    #[test]
    fn drag_moves_after_unlock_and_flings() {
        let mut p = physics(2000.0, 400.0);
        p.pointer_down(Vec2::new(0.0, 300.0));
        // Unlock; the unlocking position becomes the new origin.
        drag(&mut p, &[290.0]);
        assert_eq!(p.offset(), 0.0);
        drag(&mut p, &[270.0, 250.0, 230.0]);
        assert_eq!(p.offset(), -60.0);
        match p.pointer_up(Vec2::new(0.0, 210.0)) {
            Some(Release::Fling { velocity }) => assert_eq!(velocity, -20.0),
            other => panic!("expected a fling, got {other:?}"),
        }
        assert_eq!(p.state(), ScrollState::Momentum);
    }

    #[test]
    fn drag_cannot_pass_the_top() {
        let mut p = physics(2000.0, 400.0);
        p.pointer_down(Vec2::new(0.0, 100.0));
        drag(&mut p, &[120.0, 200.0]);
        assert_eq!(p.offset(), 0.0);
    }

    #[test]
    fn drag_on_unscrollable_content_stays_at_zero() {
        let mut p = physics(400.0, 400.0);
        p.pointer_down(Vec2::new(0.0, 300.0));
        drag(&mut p, &[290.0, 250.0]);
        assert_eq!(p.offset(), 0.0);
        p.pointer_up(Vec2::new(0.0, 250.0));
        for _ in 0..20 {
            p.tick();
        }
        assert_eq!(p.offset(), 0.0);
        assert!(p.is_at_rest());
    }

    #[test]
    fn snap_back_uses_easing_and_lands_exactly() {
        let mut p = physics(1000.0, 400.0);
        p.shift(-900.0);
        assert!(!p.tick().at_rest);
        assert_eq!(p.state(), ScrollState::SnapToBounds);
        let mut frames = 0;
        while p.state() == ScrollState::SnapToBounds {
            p.tick();
            frames += 1;
            assert!(p.offset() >= -900.0 && p.offset() <= -600.0);
        }
        assert_eq!(frames, 10);
        assert_eq!(p.offset(), -600.0);
        assert!(p.tick().at_rest);
    }

    #[test]
    fn animate_to_clamps_and_skips_noops() {
        let mut p = physics(1000.0, 400.0);
        assert!(!p.animate_to(50.0));
        assert!(p.animate_to(-5000.0));
        while p.state() == ScrollState::SnapToBounds {
            p.tick();
        }
        assert_eq!(p.offset(), -600.0);
    }

    #[test]
    fn new_press_interrupts_momentum() {
        let mut p = physics(10_000.0, 400.0);
        p.jump_to(-5000.0);
        p.fling(-30.0);
        p.tick();
        p.pointer_down(Vec2::new(0.0, 10.0));
        assert_eq!(p.state(), ScrollState::Dragging);
        assert_eq!(p.velocity(), 0.0);
    }

    fn drag_path() -> impl Strategy<Value = Vec<i16>> {
        prop::collection::vec(-80i16..=80, 1..200)
    }

    proptest! {
        #[test]
        fn offset_stays_in_bounds_over_random_drags(
            content in 0u16..3000,
            steps in drag_path(),
        ) {
            let mut p = physics(f32::from(content), 400.0);
            let mut y = 200.0;
            p.pointer_down(Vec2::new(0.0, y));
            for step in steps {
                y += f32::from(step);
                p.pointer_move(Vec2::new(0.0, y));
                p.tick();
                prop_assert!(p.in_bounds(), "{p:?} left its bounds while dragging");
            }
            p.pointer_up(Vec2::new(0.0, y));
            for _ in 0..200 {
                p.tick();
                prop_assert!(p.offset() <= 0.0 && p.offset() >= p.min_offset());
            }
            prop_assert!(p.is_at_rest());
        }
    }
}
