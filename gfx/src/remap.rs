//! Palette remapping.
//!
//! A small block of palette indexes is reserved for remap colours. A remap colour
//! in a cel is never drawn as itself: it selects a translation that is applied to
//! the pixel already in the target buffer (shadows, tinted glass, highlights). The
//! policy deciding which translations are active lives with the palette manager;
//! the compositing pipeline only needs the [`Remap`] interface.

use serde::{Deserialize, Serialize};

/// The reserved remap colours, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemapRange {
    pub start: u8,
    pub end: u8,
}

impl RemapRange {
    #[must_use]
    pub const fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn contains(&self, color: u8) -> bool {
        self.start <= color && color < self.end
    }
}

impl Default for RemapRange {
    fn default() -> Self {
        Self::new(236, 244)
    }
}

/// Remap services consumed by the pixel mappers.
pub trait Remap {
    fn range(&self) -> RemapRange;

    /// Number of remap colours with an active translation.
    fn remap_count(&self) -> usize;

    /// New value of a target pixel currently holding `target` that is covered by
    /// remap colour `source`.
    fn remap_color(&self, source: u8, target: u8) -> u8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum RemapKind {
    Off,
    ToColor(u8),
    ByRange { from: u8, to: u8, delta: i16 },
}

/// Table driven [`Remap`] implementation: one translation slot per remap colour.
#[derive(Debug, Clone)]
pub struct ColorRemap {
    range: RemapRange,
    slots: Vec<RemapKind>,
}

impl Default for ColorRemap {
    fn default() -> Self {
        Self::new(RemapRange::default())
    }
}

impl ColorRemap {
    #[must_use]
    pub fn new(range: RemapRange) -> Self {
        let len = usize::from(range.end.saturating_sub(range.start));
        Self {
            range,
            slots: vec![RemapKind::Off; len],
        }
    }

    fn slot_mut(&mut self, color: u8) -> Option<&mut RemapKind> {
        if !self.range.contains(color) {
            tracing::warn!("colour {color} is outside the remap range");
            return None;
        }
        self.slots.get_mut(usize::from(color - self.range.start))
    }

    pub fn set_remap_off(&mut self, color: u8) {
        if let Some(slot) = self.slot_mut(color) {
            *slot = RemapKind::Off;
        }
    }

    /// Every pixel covered by `color` becomes `to`.
    pub fn set_remap_to_color(&mut self, color: u8, to: u8) {
        if let Some(slot) = self.slot_mut(color) {
            *slot = RemapKind::ToColor(to);
        }
    }

    /// Covered pixels in `from..=to` are shifted by `delta`; others are untouched.
    pub fn set_remap_by_range(&mut self, color: u8, from: u8, to: u8, delta: i16) {
        if let Some(slot) = self.slot_mut(color) {
            *slot = RemapKind::ByRange { from, to, delta };
        }
    }
}

impl Remap for ColorRemap {
    fn range(&self) -> RemapRange {
        self.range
    }

    fn remap_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| !matches!(slot, RemapKind::Off))
            .count()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn remap_color(&self, source: u8, target: u8) -> u8 {
        let Some(slot) = source
            .checked_sub(self.range.start)
            .and_then(|index| self.slots.get(usize::from(index)))
        else {
            return target;
        };

        match *slot {
            RemapKind::Off => target,
            RemapKind::ToColor(color) => color,
            RemapKind::ByRange { from, to, delta } if (from..=to).contains(&target) => {
                (i16::from(target) + delta).clamp(0, 255) as u8
            }
            RemapKind::ByRange { .. } => target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn range_is_half_open() {
        let range = RemapRange::new(236, 244);
        assert!(!range.contains(235));
        assert!(range.contains(236));
        assert!(range.contains(243));
        assert!(!range.contains(244));
    }

    #[test]
    fn inactive_by_default() {
        let remap = ColorRemap::default();
        assert_eq!(remap.remap_count(), 0);
        assert_eq!(remap.remap_color(236, 17), 17);
    }

    #[test]
    fn to_color_and_by_range() {
        let mut remap = ColorRemap::default();
        remap.set_remap_to_color(236, 3);
        remap.set_remap_by_range(237, 10, 20, 5);
        assert_eq!(remap.remap_count(), 2);

        assert_eq!(remap.remap_color(236, 100), 3);
        assert_eq!(remap.remap_color(237, 15), 20);
        assert_eq!(remap.remap_color(237, 21), 21);

        remap.set_remap_off(236);
        assert_eq!(remap.remap_count(), 1);
        assert_eq!(remap.remap_color(236, 100), 100);
    }

    #[test]
    fn colours_outside_the_range_are_ignored() {
        let mut remap = ColorRemap::default();
        remap.set_remap_to_color(10, 3);
        assert_eq!(remap.remap_count(), 0);
        assert_eq!(remap.remap_color(10, 50), 50);
    }
}
