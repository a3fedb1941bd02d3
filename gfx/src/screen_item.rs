//! Screen items: cels placed on a plane.
//!
//! Scripts position items in script coordinates; [`ScreenItem::calc_rects`] turns
//! that placement into the screen rectangle the item covers and the ratios its
//! cel is drawn with. Cels authored at the low resolution and cels authored at
//! any other resolution take different routes through the arithmetic, each with
//! its own rounding, and both are kept as they are so pixel alignment matches
//! what the games were tested against.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::cel::{CelInfo, CelObj, CelType};
use crate::config::{LOW_RES_X, LOW_RES_Y};
use crate::context::CelContext;
use crate::error::CelError;
use crate::plane::PlaneGeometry;
use crate::ratio::Ratio;
use crate::rect::{Point, Rect};

/// Number of frames a change stays pending.
pub const SCREEN_COUNT: u8 = 1;

/// Denominator of script scale values: 128 is 100%.
const SCALE_UNIT: i32 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScaleSignal {
    #[default]
    None,
    /// Scale by `x` and `y` over 128.
    Manual,
    /// Scale with the distance to the plane's vanishing point, up to `max`.
    VanishingPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleInfo {
    pub x: i32,
    pub y: i32,
    pub max: i32,
    pub signal: ScaleSignal,
}

impl Default for ScaleInfo {
    fn default() -> Self {
        Self {
            x: SCALE_UNIT,
            y: SCALE_UNIT,
            max: 100,
            signal: ScaleSignal::None,
        }
    }
}

impl ScaleInfo {
    #[must_use]
    pub const fn manual(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            max: 100,
            signal: ScaleSignal::Manual,
        }
    }

    #[must_use]
    pub const fn vanishing_point(max: i32) -> Self {
        Self {
            x: SCALE_UNIT,
            y: SCALE_UNIT,
            max,
            signal: ScaleSignal::VanishingPoint,
        }
    }

    /// Ratios for an item at script row `y` on a plane with vanishing point
    /// `vanishing_point`.
    fn ratios(&self, y: i32, vanishing_point: Point, script_width: i32) -> (Ratio, Ratio) {
        match self.signal {
            ScaleSignal::None => (Ratio::ONE, Ratio::ONE),
            ScaleSignal::Manual => (Ratio::new(self.x, SCALE_UNIT), Ratio::new(self.y, SCALE_UNIT)),
            ScaleSignal::VanishingPoint => {
                let distance = script_width - vanishing_point.y;
                let scale = if distance == 0 {
                    0
                } else {
                    self.max * (y - vanishing_point.y) / distance
                };
                let ratio = Ratio::new(scale, SCALE_UNIT);
                (ratio, ratio)
            }
        }
    }
}

/// Script-side state of a screen item, as applied by [`ScreenItem::update_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenItemProperties {
    pub cel_info: CelInfo,
    pub position: Point,
    pub z: i32,
    /// Fixed priority; `None` derives it from `z` and the position.
    pub priority: Option<i32>,
    pub scale: ScaleInfo,
    pub mirror_x: bool,
    pub inset_rect: Option<Rect>,
}

#[derive(Debug, Clone)]
pub struct ScreenItem {
    pub creation_id: u32,
    pub cel_info: CelInfo,
    cel_obj: Option<CelObj>,
    /// Script coordinates.
    pub position: Point,
    pub z: i32,
    pub priority: i32,
    pub fixed_priority: bool,
    pub scale: ScaleInfo,
    pub mirror_x: bool,
    pub use_inset_rect: bool,
    /// Crop rectangle in cel coordinates.
    pub inset_rect: Rect,
    pub draw_black_lines: bool,
    /// Set on items that belong to a picture.
    pub picture_id: Option<u16>,

    /// Where the cel's top left pixel lands, in screen coordinates.
    pub scaled_position: Point,
    pub screen_item_rect: Rect,
    /// `screen_item_rect` clipped to the plane; empty when nothing is drawn.
    pub screen_rect: Rect,
    pub ratio_x: Ratio,
    pub ratio_y: Ratio,

    /// Frames left until the item's creation has been shown.
    pub created: u8,
    pub updated: u8,
    /// Frames left until a deleted item is dropped.
    pub deleted: u8,
}

impl ScreenItem {
    #[must_use]
    pub fn new(creation_id: u32, cel_info: CelInfo) -> Self {
        Self {
            creation_id,
            cel_info,
            cel_obj: None,
            position: Point::default(),
            z: 0,
            priority: 0,
            fixed_priority: false,
            scale: ScaleInfo::default(),
            mirror_x: false,
            use_inset_rect: false,
            inset_rect: Rect::default(),
            draw_black_lines: false,
            picture_id: None,
            scaled_position: Point::default(),
            screen_item_rect: Rect::default(),
            screen_rect: Rect::default(),
            ratio_x: Ratio::ONE,
            ratio_y: Ratio::ONE,
            created: SCREEN_COUNT,
            updated: 0,
            deleted: 0,
        }
    }

    #[must_use]
    pub fn with_position(creation_id: u32, cel_info: CelInfo, position: Point, scale: ScaleInfo) -> Self {
        Self {
            position,
            scale,
            ..Self::new(creation_id, cel_info)
        }
    }

    /// An item covering `rect` (script coordinates), typically a colour fill.
    #[must_use]
    pub fn with_rect(creation_id: u32, cel_info: CelInfo, rect: Rect) -> Self {
        let mut inset_rect = rect;
        inset_rect.translate(-rect.left, -rect.top);
        Self {
            position: rect.top_left(),
            use_inset_rect: true,
            inset_rect,
            ..Self::new(creation_id, cel_info)
        }
    }

    /// The item's cel, built on first use.
    ///
    /// # Errors
    ///
    /// Fails when the cel cannot be built.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn cel_obj(&mut self, ctx: &mut CelContext) -> Result<&CelObj, CelError> {
        if self.cel_obj.is_none() {
            let cel = match self.cel_info.kind {
                CelType::Color => {
                    let width = self.inset_rect.width().clamp(0, i32::from(u16::MAX)) as u16;
                    let height = self.inset_rect.height().clamp(0, i32::from(u16::MAX)) as u16;
                    let mut cel = ctx.color(self.cel_info.color, width, height);
                    cel.info = self.cel_info;
                    cel
                }
                _ => ctx.create(&self.cel_info)?,
            };
            self.cel_obj = Some(cel);
        }

        self.cel_obj.as_ref().ok_or(CelError::UnsupportedOperation("screen item without a cel"))
    }

    /// Hands the item a cel built elsewhere.
    pub fn set_cel_obj(&mut self, cel: CelObj) {
        self.cel_obj = Some(cel);
    }

    /// Marks the item changed: the cel is rebuilt on next use.
    pub fn update(&mut self) {
        if self.created == 0 {
            self.updated = SCREEN_COUNT;
        }
        self.deleted = 0;
        self.cel_obj = None;
    }

    /// Applies script-side changes. The cel is only rebuilt when a different one
    /// is asked for.
    pub fn update_from(&mut self, properties: &ScreenItemProperties) {
        if self.cel_info != properties.cel_info || self.cel_info.color != properties.cel_info.color {
            self.cel_info = properties.cel_info;
            self.cel_obj = None;
        }

        self.position = properties.position;
        self.z = properties.z;
        self.scale = properties.scale;
        self.mirror_x = properties.mirror_x;
        match properties.priority {
            Some(priority) => {
                self.priority = priority;
                self.fixed_priority = true;
            }
            None => self.fixed_priority = false,
        }
        match properties.inset_rect {
            Some(rect) => {
                if self.cel_info.kind == CelType::Color && rect != self.inset_rect {
                    self.cel_obj = None;
                }
                self.use_inset_rect = true;
                self.inset_rect = rect;
            }
            None => self.use_inset_rect = false,
        }

        if self.created == 0 {
            self.updated = SCREEN_COUNT;
        }
        self.deleted = 0;
    }

    /// Recomputes the screen geometry of the item on a plane.
    ///
    /// # Errors
    ///
    /// Fails when the item's cel cannot be built.
    pub fn calc_rects(&mut self, ctx: &mut CelContext, plane: &PlaneGeometry) -> Result<(), CelError> {
        let cel = self.cel_obj(ctx)?.clone();
        let config = ctx.config();
        let script_width = i32::from(config.script_width);
        let script_height = i32::from(config.script_height);
        let screen_width = i32::from(config.screen_width);
        let screen_height = i32::from(config.screen_height);

        let cel_rect = cel.rect();
        if self.use_inset_rect {
            self.inset_rect = self.inset_rect.intersection(&cel_rect);
        } else {
            self.inset_rect = cel_rect;
        }

        let (scale_x, scale_y) =
            self.scale
                .ratios(self.position.y, plane.vanishing_point, script_width);

        if scale_x.numerator() <= 0 || scale_y.numerator() <= 0 {
            self.screen_rect = Rect::default();
            return Ok(());
        }

        self.screen_item_rect = self.inset_rect;
        let cel_to_screen_x = Ratio::new(screen_width, i32::from(cel.x_resolution));
        let cel_to_screen_y = Ratio::new(screen_height, i32::from(cel.y_resolution));
        let scaled = !scale_x.is_one() || !scale_y.is_one();
        let is_pic = cel.info.kind == CelType::Pic;
        let mirrored = self.mirror_x != cel.mirror_x;

        let mut displace_x = cel.origin.x;
        if mirrored && !is_pic {
            displace_x = i32::from(cel.width) - cel.origin.x - 1;
        }

        if cel.x_resolution != LOW_RES_X || cel.y_resolution != LOW_RES_Y {
            let mut displace_y = cel.origin.y;

            if self.use_inset_rect {
                let script_to_cel_x = Ratio::new(i32::from(cel.x_resolution), script_width);
                let script_to_cel_y = Ratio::new(i32::from(cel.y_resolution), script_height);
                self.screen_item_rect
                    .mul_round_up(script_to_cel_x, script_to_cel_y, 0);
                self.screen_item_rect = self.screen_item_rect.intersection(&cel_rect);
            }

            if scaled {
                if script_width == i32::from(LOW_RES_X) {
                    self.screen_item_rect.mul_inc(scale_x, scale_y);
                } else {
                    scale_with_high_res_rounding(&mut self.screen_item_rect, scale_x, scale_y);
                }
                displace_x = (displace_x * scale_x).to_int();
                displace_y = (displace_y * scale_y).to_int();
            }

            self.screen_item_rect.mul_inc(cel_to_screen_x, cel_to_screen_y);
            displace_x = (displace_x * cel_to_screen_x).to_int();
            displace_y = (displace_y * cel_to_screen_y).to_int();

            let script_to_screen_x = Ratio::new(screen_width, script_width);
            let script_to_screen_y = Ratio::new(screen_height, script_height);

            self.scaled_position = Point::new(
                (self.position.x * script_to_screen_x).to_int() - displace_x,
                (self.position.y * script_to_screen_y).to_int() - displace_y,
            );
            self.screen_item_rect
                .translate(self.scaled_position.x, self.scaled_position.y);

            if mirrored && is_pic {
                let mut temp = self.inset_rect;
                if !scale_x.is_one() {
                    temp.mul_inc(scale_x, Ratio::ONE);
                }
                temp.mul_inc(cel_to_screen_x, Ratio::ONE);
                temp.translate(
                    (cel.relative_position().x * script_to_screen_x).to_int() - displace_x,
                    0,
                );

                // Mirrored pictures are aligned against the right edge of the plane.
                let delta_x = plane.plane_rect.width() - temp.right - 1 - temp.left;
                self.scaled_position.x += delta_x;
                self.screen_item_rect.translate(delta_x, 0);
            }

            self.scaled_position.x += plane.plane_rect.left;
            self.scaled_position.y += plane.plane_rect.top;
            self.screen_item_rect
                .translate(plane.plane_rect.left, plane.plane_rect.top);
        } else {
            if scaled {
                self.screen_item_rect.mul_inc(scale_x, scale_y);
                self.screen_item_rect.right -= 1;
                self.screen_item_rect.bottom -= 1;
            }

            self.scaled_position = Point::new(
                self.position.x - (displace_x * scale_x).to_int(),
                self.position.y - (cel.origin.y * scale_y).to_int(),
            );
            self.screen_item_rect
                .translate(self.scaled_position.x, self.scaled_position.y);

            if mirrored && is_pic {
                let mut temp = self.inset_rect;
                if !scale_x.is_one() {
                    temp.mul_inc(scale_x, Ratio::ONE);
                    temp.right -= 1;
                }
                let relative = cel.relative_position();
                temp.translate(
                    relative.x - (displace_x * scale_x).to_int(),
                    relative.y - (cel.origin.y * scale_y).to_int(),
                );

                let delta_x = plane.game_rect.width() - temp.right - 1 - temp.left;
                self.scaled_position.x += delta_x;
                self.screen_item_rect.translate(delta_x, 0);
            }

            self.scaled_position.x += plane.game_rect.left;
            self.scaled_position.y += plane.game_rect.top;
            self.screen_item_rect
                .translate(plane.game_rect.left, plane.game_rect.top);

            if i32::from(cel.x_resolution) < screen_width {
                self.scaled_position.mul_round_up(cel_to_screen_x, cel_to_screen_y);
                self.screen_item_rect
                    .mul_round_up(cel_to_screen_x, cel_to_screen_y, 1);
            }
        }

        self.ratio_x = scale_x * cel_to_screen_x;
        self.ratio_y = scale_y * cel_to_screen_y;
        self.screen_rect = self.screen_item_rect.intersection(&plane.screen_rect);

        if !self.fixed_priority {
            self.priority = self.z + self.position.y;
        }
        Ok(())
    }

    /// Drawing order: priority, then `y + z`, then creation order.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then((self.position.y + self.z).cmp(&(other.position.y + other.z)))
            .then(self.creation_id.cmp(&other.creation_id))
    }

    /// Whether the item puts anything on screen this frame.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.deleted == 0 && !self.screen_rect.is_empty()
    }
}

/// Scales `rect` the way scripts with a high-resolution coordinate system do:
/// enlarging keeps the far edges exclusive, shrinking keeps them inclusive.
fn scale_with_high_res_rounding(rect: &mut Rect, scale_x: Ratio, scale_y: Ratio) {
    rect.left = (rect.left * scale_x).to_int();
    rect.top = (rect.top * scale_y).to_int();

    rect.right = if scale_x.numerator() > scale_x.denominator() {
        (rect.right * scale_x).to_int()
    } else {
        ((rect.right - 1) * scale_x).to_int() + 1
    };
    rect.bottom = if scale_y.numerator() > scale_y.denominator() {
        (rect.bottom * scale_y).to_int()
    } else {
        ((rect.bottom - 1) * scale_y).to_int() + 1
    };
}
