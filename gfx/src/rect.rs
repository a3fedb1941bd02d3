use std::ops;

use serde::{Deserialize, Serialize};

use crate::ratio::{Ratio, mul_round_up};

/// A point in screen, script or cel space.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Scales both coordinates, rounding up (see [`mul_round_up`]).
    pub const fn mul_round_up(&mut self, ratio_x: Ratio, ratio_y: Ratio) {
        self.x = mul_round_up(self.x, ratio_x, 0);
        self.y = mul_round_up(self.y, ratio_y, 0);
    }
}

impl ops::Add<Self> for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl ops::Sub<Self> for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// A rectangle with exclusive `right` and `bottom` edges.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// A `width` x `height` rectangle anchored at the origin.
    #[must_use]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    #[must_use]
    pub const fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        self.left <= point.x && point.x < self.right && self.top <= point.y && point.y < self.bottom
    }

    /// Shrinks `self` to its overlap with `other`.
    pub fn clip(&mut self, other: &Self) {
        self.left = self.left.max(other.left);
        self.top = self.top.max(other.top);
        self.right = self.right.min(other.right);
        self.bottom = self.bottom.min(other.bottom);
    }

    /// The overlap of `self` and `other`, or an empty rectangle when they are disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        if self.intersects(other) {
            let mut clipped = *self;
            clipped.clip(other);
            clipped
        } else {
            Self::default()
        }
    }

    pub const fn translate(&mut self, dx: i32, dy: i32) {
        self.left += dx;
        self.right += dx;
        self.top += dy;
        self.bottom += dy;
    }

    /// Scales the rectangle treating `right`/`bottom` as the last included pixel plus
    /// one: the far edges are scaled from the last pixel and then re-extended.
    pub fn mul_inc(&mut self, ratio_x: Ratio, ratio_y: Ratio) {
        self.left = (self.left * ratio_x).to_int();
        self.top = (self.top * ratio_y).to_int();
        self.right = ((self.right - 1) * ratio_x).to_int() + 1;
        self.bottom = ((self.bottom - 1) * ratio_y).to_int() + 1;
    }

    /// Same shape as [`Rect::mul_inc`] but rounding up; `extra` is applied to the far
    /// edges only.
    pub const fn mul_round_up(&mut self, ratio_x: Ratio, ratio_y: Ratio, extra: i32) {
        self.left = mul_round_up(self.left, ratio_x, 0);
        self.top = mul_round_up(self.top, ratio_y, 0);
        self.right = mul_round_up(self.right - 1, ratio_x, extra) + 1;
        self.bottom = mul_round_up(self.bottom - 1, ratio_y, extra) + 1;
    }
}
