//! Spread position and display mode.
//!
//! Page numbers are one-based. `current_right` is the page in the right slot
//! (or the only slot in single mode); in double mode the left slot shows
//! `current_right - 1`, except on the cover where it stays empty.

use crate::config::SingleMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutState {
    Uninitialized,
    Loaded { total: u32, current_right: u32 },
}

/// Pages shown in the two slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spread {
    pub left: Option<u32>,
    pub right: u32,
}

/// Flags the presentation layer styles itself from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayFlags {
    /// Double mode showing the cover alone
    pub cover: bool,
    pub single: bool,
    pub can_prev: bool,
    pub can_next: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    state: LayoutState,
    single: bool,
    single_override: bool,
    breakpoint: f32,
    animating: bool,
}

impl Layout {
    pub fn new(mode: SingleMode, breakpoint: f32, viewport_width: f32) -> Self {
        let (single, single_override) = match mode {
            SingleMode::Fixed(single) => (single, true),
            SingleMode::Auto => (viewport_width < breakpoint, false),
        };

        Self { state: LayoutState::Uninitialized, single, single_override, breakpoint, animating: false }
    }

    /// Enter `Loaded` on the cover. `total` is at least 1.
    pub fn load(&mut self, total: u32, viewport_width: f32) {
        self.state = LayoutState::Loaded { total: total.max(1), current_right: 1 };
        if !self.single_override {
            self.single = viewport_width < self.breakpoint;
        }
        self.animating = false;
    }

    pub fn unload(&mut self) {
        self.state = LayoutState::Uninitialized;
        self.animating = false;
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LayoutState::Loaded { .. })
    }

    pub fn total(&self) -> Option<u32> {
        match self.state {
            LayoutState::Loaded { total, .. } => Some(total),
            LayoutState::Uninitialized => None,
        }
    }

    pub fn current_right(&self) -> Option<u32> {
        match self.state {
            LayoutState::Loaded { current_right, .. } => Some(current_right),
            LayoutState::Uninitialized => None,
        }
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    pub fn is_double(&self) -> bool {
        !self.single
    }

    pub fn is_pinned(&self) -> bool {
        self.single_override
    }

    pub fn breakpoint(&self) -> f32 {
        self.breakpoint
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn is_cover(&self) -> bool {
        self.is_double() && self.current_right() == Some(1)
    }

    pub fn can_prev(&self) -> bool {
        self.current_right().is_some_and(|right| right > 1)
    }

    pub fn can_next(&self) -> bool {
        match self.state {
            LayoutState::Loaded { total, current_right } => current_right < total,
            LayoutState::Uninitialized => false,
        }
    }

    pub fn visible_pages(&self) -> Option<Spread> {
        let right = self.current_right()?;
        let left = (self.is_double() && right > 1).then(|| right - 1);
        Some(Spread { left, right })
    }

    pub fn flags(&self) -> DisplayFlags {
        DisplayFlags {
            cover: self.is_cover(),
            single: self.single,
            can_prev: self.can_prev(),
            can_next: self.can_next(),
        }
    }

    pub fn next_target(&self) -> Option<u32> {
        let LayoutState::Loaded { total, current_right } = self.state else {
            return None;
        };

        let target = if self.single {
            current_right.saturating_add(1).min(total)
        } else if current_right == 1 {
            3.min(total)
        } else {
            current_right.saturating_add(2).min(total)
        };

        (target != current_right).then_some(target)
    }

    pub fn prev_target(&self) -> Option<u32> {
        let LayoutState::Loaded { current_right, .. } = self.state else {
            return None;
        };

        let target = if self.single {
            current_right.saturating_sub(1).max(1)
        } else if current_right <= 3 {
            1
        } else {
            current_right.saturating_sub(2).max(1)
        };

        (target != current_right).then_some(target)
    }

    /// Advance one spread. Returns the new position, or `None` for a no-op.
    pub fn next(&mut self) -> Option<u32> {
        if self.animating {
            return None;
        }
        let target = self.next_target()?;
        self.move_to(target);
        Some(target)
    }

    /// Go back one spread. Returns the new position, or `None` for a no-op.
    pub fn prev(&mut self) -> Option<u32> {
        if self.animating {
            return None;
        }
        let target = self.prev_target()?;
        self.move_to(target);
        Some(target)
    }

    /// Jump so that `page` is visible, aligned to a spread in double mode.
    pub fn go_to(&mut self, page: u32) -> Option<u32> {
        if self.animating {
            return None;
        }
        let LayoutState::Loaded { total, current_right } = self.state else {
            return None;
        };

        let page = page.clamp(1, total);
        let target = if self.single || page == 1 || page % 2 == 1 {
            page
        } else {
            (page + 1).min(total)
        };

        if target == current_right {
            return None;
        }
        self.move_to(target);
        Some(target)
    }

    fn move_to(&mut self, target: u32) {
        if let LayoutState::Loaded { current_right, .. } = &mut self.state {
            *current_right = target;
        }
    }

    /// Pin or unpin the display mode. Returns `true` if `single` changed.
    pub fn set_single(&mut self, mode: SingleMode, viewport_width: f32) -> bool {
        match mode {
            SingleMode::Fixed(single) => self.pin(single),
            SingleMode::Auto => {
                self.single_override = false;
                self.apply_responsive(viewport_width)
            }
        }
    }

    /// Pin the opposite of the current mode.
    pub fn toggle_single(&mut self) -> bool {
        self.pin(!self.single)
    }

    fn pin(&mut self, single: bool) -> bool {
        self.single_override = true;
        let changed = self.single != single;
        self.single = single;
        changed
    }

    /// Recompute the mode from the viewport unless pinned. Returns `true` if
    /// `single` flipped.
    pub fn on_resize(&mut self, viewport_width: f32) -> bool {
        if self.single_override {
            return false;
        }
        self.apply_responsive(viewport_width)
    }

    fn apply_responsive(&mut self, viewport_width: f32) -> bool {
        let desired = viewport_width < self.breakpoint;
        let changed = self.single != desired;
        self.single = desired;
        changed
    }

    /// Take the navigation lock for a turn gesture. Returns `false` if a
    /// gesture is already running or nothing is loaded.
    pub fn begin_turn(&mut self) -> bool {
        if self.animating || !self.is_loaded() {
            return false;
        }
        self.animating = true;
        true
    }

    pub fn end_turn(&mut self) {
        self.animating = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn double(total: u32) -> Layout {
        let mut layout = Layout::new(SingleMode::Auto, 900.0, 1200.0);
        layout.load(total, 1200.0);
        layout
    }

    fn single(total: u32) -> Layout {
        let mut layout = Layout::new(SingleMode::Fixed(true), 900.0, 1200.0);
        layout.load(total, 1200.0);
        layout
    }

    #[test]
    fn starts_uninitialized_and_inert() {
        let mut layout = Layout::new(SingleMode::Auto, 900.0, 1200.0);

        assert_eq!(layout.state(), LayoutState::Uninitialized);
        assert_eq!(layout.next(), None);
        assert_eq!(layout.prev(), None);
        assert_eq!(layout.visible_pages(), None);
        assert_eq!(layout.flags(), DisplayFlags::default());
    }

    #[test]
    fn double_mode_walks_spreads_from_cover() {
        let mut layout = double(10);
        assert_eq!(layout.current_right(), Some(1));

        assert_eq!(layout.next(), Some(3));
        assert_eq!(layout.next(), Some(5));
        assert_eq!(layout.prev(), Some(3));
        assert_eq!(layout.prev(), Some(1));
        assert_eq!(layout.prev(), None);
    }

    #[test]
    fn pinned_single_mode_steps_one_page() {
        let mut layout = single(5);

        let visited: Vec<u32> = (0..5)
            .map(|_| {
                layout.next();
                layout.current_right().unwrap()
            })
            .collect();

        assert_eq!(visited, vec![2, 3, 4, 5, 5]);
        assert_eq!(layout.next(), None);
    }

    #[test]
    fn narrow_viewport_loads_single() {
        let mut layout = Layout::new(SingleMode::Auto, 900.0, 500.0);
        layout.load(8, 500.0);

        assert!(layout.is_single());
        assert!(!layout.is_pinned());
    }

    #[test]
    fn next_at_end_and_prev_at_start_are_noops() {
        let mut layout = double(4);
        assert_eq!(layout.prev(), None);

        assert_eq!(layout.next(), Some(3));
        assert_eq!(layout.next(), Some(4));
        assert_eq!(layout.next(), None);
        assert_eq!(layout.current_right(), Some(4));
    }

    #[test]
    fn short_documents_clamp_cover_jump() {
        let mut two = double(2);
        assert_eq!(two.next(), Some(2));
        assert_eq!(two.visible_pages(), Some(Spread { left: Some(1), right: 2 }));

        let mut one = double(1);
        assert_eq!(one.next(), None);
        assert_eq!(one.visible_pages(), Some(Spread { left: None, right: 1 }));
    }

    #[test]
    fn cover_flag_only_on_first_double_spread() {
        let mut layout = double(9);
        assert!(layout.is_cover());
        assert_eq!(layout.visible_pages(), Some(Spread { left: None, right: 1 }));

        while layout.next().is_some() {
            assert!(!layout.is_cover());
        }

        layout.set_single(SingleMode::Fixed(true), 1200.0);
        while layout.prev().is_some() {}
        assert_eq!(layout.current_right(), Some(1));
        assert!(!layout.is_cover());
    }

    #[test]
    fn nav_flags_track_bounds() {
        let mut layout = double(3);
        let flags = layout.flags();
        assert!(!flags.can_prev);
        assert!(flags.can_next);

        layout.next();
        let flags = layout.flags();
        assert!(flags.can_prev);
        assert!(!flags.can_next);
    }

    #[test]
    fn prev_then_next_round_trips_in_single_mode() {
        let total = 12;
        for page in 2..=total {
            let mut layout = single(total);
            layout.go_to(page);

            layout.prev();
            layout.next();
            assert_eq!(layout.current_right(), Some(page), "page {page}");
        }
    }

    #[test]
    fn prev_then_next_round_trips_past_the_cover() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..200 {
            let total = rng.gen_range(4..=60);
            let mut layout = double(total);
            let page = rng.gen_range(4..=total);
            layout.go_to(page);
            let before = layout.current_right().unwrap();
            if before < 4 {
                continue;
            }

            layout.prev();
            layout.next();
            assert_eq!(layout.current_right(), Some(before), "total {total}, page {page}");
        }
    }

    #[test]
    fn cover_transitions_are_exact() {
        let mut layout = double(10);
        layout.set_single(SingleMode::Fixed(true), 1200.0);
        layout.go_to(2);
        layout.set_single(SingleMode::Fixed(false), 1200.0);

        assert_eq!(layout.prev(), Some(1));
        assert_eq!(layout.next(), Some(3));
    }

    #[test]
    fn go_to_aligns_to_spreads() {
        let mut layout = double(10);

        assert_eq!(layout.go_to(4), Some(5));
        assert_eq!(layout.visible_pages(), Some(Spread { left: Some(4), right: 5 }));
        assert_eq!(layout.go_to(10), Some(10));
        assert_eq!(layout.go_to(99), None);
        assert_eq!(layout.go_to(0), Some(1));
    }

    #[test]
    fn resize_crossing_breakpoint_flips_once() {
        let mut layout = double(10);
        assert!(layout.is_double());

        assert!(!layout.on_resize(1000.0));
        assert!(layout.on_resize(899.0));
        assert!(layout.is_single());
        assert!(!layout.on_resize(600.0));
        assert!(layout.on_resize(900.0));
        assert!(layout.is_double());
    }

    #[test]
    fn pinned_mode_ignores_resize() {
        let mut layout = double(10);
        layout.set_single(SingleMode::Fixed(false), 1200.0);

        assert!(!layout.on_resize(300.0));
        assert!(layout.is_double());
    }

    #[test]
    fn auto_mode_recomputes_from_viewport() {
        let mut layout = double(10);
        layout.set_single(SingleMode::Fixed(false), 500.0);
        assert!(layout.is_double());

        assert!(layout.set_single(SingleMode::Auto, 500.0));
        assert!(layout.is_single());
        assert!(!layout.is_pinned());
    }

    #[test]
    fn toggle_pins_the_opposite_mode() {
        let mut layout = double(10);

        assert!(layout.toggle_single());
        assert!(layout.is_single());
        assert!(layout.is_pinned());
        assert!(!layout.on_resize(2000.0));
        assert!(layout.toggle_single());
        assert!(layout.is_double());
    }

    #[test]
    fn turn_lock_blocks_navigation() {
        let mut layout = double(10);

        assert!(layout.begin_turn());
        assert!(!layout.begin_turn());
        assert_eq!(layout.next(), None);
        assert_eq!(layout.go_to(7), None);

        layout.end_turn();
        assert_eq!(layout.next(), Some(3));
    }
}
