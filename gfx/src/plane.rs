//! Planes: drawing layers holding screen items.

use crate::buffer::Buffer;
use crate::cel::CelInfo;
use crate::config::RenderConfig;
use crate::context::CelContext;
use crate::error::CelError;
use crate::ratio::Ratio;
use crate::rect::{Point, Rect};
use crate::screen_item::{SCREEN_COUNT, ScreenItem};
use crate::screen_item_list::ScreenItemList;

/// Where a plane sits, in script and screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneGeometry {
    /// Script coordinates.
    pub game_rect: Rect,
    /// `game_rect` in screen coordinates.
    pub plane_rect: Rect,
    /// `plane_rect` clipped to the screen.
    pub screen_rect: Rect,
    /// Script coordinates.
    pub vanishing_point: Point,
}

impl PlaneGeometry {
    #[must_use]
    pub fn new(game_rect: Rect, config: &RenderConfig) -> Self {
        let mut plane_rect = game_rect;
        plane_rect.mul_round_up(
            Ratio::new(i32::from(config.screen_width), i32::from(config.script_width)),
            Ratio::new(i32::from(config.screen_height), i32::from(config.script_height)),
            1,
        );

        let screen = Rect::from_size(i32::from(config.screen_width), i32::from(config.screen_height));
        Self {
            game_rect,
            plane_rect,
            screen_rect: plane_rect.intersection(&screen),
            vanishing_point: Point::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Plane {
    pub creation_id: u32,
    pub priority: i32,
    pub geometry: PlaneGeometry,
    /// Colour the plane is cleared to before its items are drawn.
    pub back_color: Option<u8>,
    /// The picture shown on the plane, if any.
    pub picture_id: Option<u16>,
    pub screen_items: ScreenItemList,
    next_item_id: u32,
}

impl Plane {
    #[must_use]
    pub fn new(creation_id: u32, game_rect: Rect, config: &RenderConfig) -> Self {
        Self {
            creation_id,
            priority: 0,
            geometry: PlaneGeometry::new(game_rect, config),
            back_color: None,
            picture_id: None,
            screen_items: ScreenItemList::new(),
            next_item_id: 0,
        }
    }

    /// A creation id for a new item of this plane.
    pub const fn next_creation_id(&mut self) -> u32 {
        self.next_item_id += 1;
        self.next_item_id
    }

    /// A plain item showing `cel_info`, returned for the caller to place.
    pub fn new_screen_item(&mut self, cel_info: CelInfo) -> ScreenItem {
        ScreenItem::new(self.next_creation_id(), cel_info)
    }

    pub fn add_screen_item(&mut self, item: ScreenItem) -> usize {
        self.screen_items.add(item)
    }

    /// Deletes the item in slot `index`. Items that were never drawn go at once;
    /// others stay until the end of the next frame.
    pub fn delete_screen_item(&mut self, index: usize) {
        let Some(item) = self.screen_items.get_mut(index) else {
            return;
        };

        if item.created > 0 {
            self.screen_items.remove(index);
        } else {
            item.updated = 0;
            item.deleted = SCREEN_COUNT;
        }
    }

    /// Adds one fixed-priority item per cel of pic `pic_id`, each at the cel's
    /// position in the picture plus `offset`. Returns the number of items added.
    ///
    /// # Errors
    ///
    /// Fails when a cel of the picture cannot be built.
    pub fn add_pic(
        &mut self,
        ctx: &mut CelContext,
        pic_id: u16,
        offset: Option<Point>,
        mirror_x: bool,
    ) -> Result<usize, CelError> {
        let mut cel_count = None;
        let mut cel_no: u8 = 0;
        let mut added = 0;

        while cel_count.is_none_or(|count| cel_no < count) {
            let cel = ctx.pic(pic_id, i16::from(cel_no))?;
            let count = *cel_count.get_or_insert(cel.cel_count());

            let mut item = self.new_screen_item(cel.info);
            item.picture_id = Some(pic_id);
            item.mirror_x = mirror_x;
            item.priority = i32::from(cel.priority());
            item.fixed_priority = true;
            item.position = offset.unwrap_or_default() + cel.relative_position();
            item.set_cel_obj(cel);
            self.screen_items.add(item);
            added += 1;

            if count == 0 {
                break;
            }
            cel_no += 1;
        }

        self.picture_id = Some(pic_id);
        tracing::debug!("plane {}: pic {pic_id} added as {added} items", self.creation_id);
        Ok(added)
    }

    /// Deletes every item of pic `pic_id`.
    pub fn delete_pic(&mut self, pic_id: u16) {
        let indexes: Vec<_> = (0..self.screen_items.len())
            .filter(|&i| {
                self.screen_items
                    .get(i)
                    .is_some_and(|item| item.picture_id == Some(pic_id))
            })
            .collect();

        for index in indexes {
            self.delete_screen_item(index);
        }
        if self.picture_id == Some(pic_id) {
            self.picture_id = None;
        }
    }

    /// Recomputes the geometry of every item.
    ///
    /// # Errors
    ///
    /// Fails when an item's cel cannot be built.
    pub fn calc_rects(&mut self, ctx: &mut CelContext) -> Result<(), CelError> {
        let geometry = self.geometry;
        for item in self.screen_items.iter_mut() {
            item.calc_rects(ctx, &geometry)?;
        }
        Ok(())
    }

    /// Draws the visible items into `target` in priority order, then ages the
    /// items' pending changes by one frame.
    ///
    /// # Errors
    ///
    /// Fails when an item cannot be drawn; the item order is restored either way.
    pub fn draw(&mut self, ctx: &mut CelContext, target: &mut Buffer) -> Result<(), CelError> {
        if let Some(color) = self.back_color {
            target.fill_rect(&self.geometry.screen_rect, color);
        }

        self.screen_items.sort();
        let drawn = self.draw_sorted(ctx, target);
        self.screen_items.unsort();
        drawn?;

        self.end_frame();
        Ok(())
    }

    fn draw_sorted(&mut self, ctx: &mut CelContext, target: &mut Buffer) -> Result<(), CelError> {
        for item in self.screen_items.iter_mut() {
            if !item.is_visible() {
                continue;
            }

            let cel = item.cel_obj(ctx)?.clone();
            let mirrored = item.mirror_x != cel.mirror_x;
            let rect = item.screen_rect;
            cel.draw_screen_item(ctx, target, item, &rect, mirrored)?;
        }
        Ok(())
    }

    fn end_frame(&mut self) {
        let mut gone = Vec::new();
        for index in 0..self.screen_items.len() {
            let Some(item) = self.screen_items.get_mut(index) else {
                continue;
            };
            item.created = item.created.saturating_sub(1);
            item.updated = item.updated.saturating_sub(1);
            if item.deleted > 0 {
                item.deleted -= 1;
                if item.deleted == 0 {
                    gone.push(index);
                }
            }
        }

        for index in gone {
            self.screen_items.remove(index);
        }
        self.screen_items.pack();
    }
}

/// Planes in drawing order: by priority, then creation.
#[derive(Debug, Clone, Default)]
pub struct PlaneList {
    planes: Vec<Plane>,
}

impl PlaneList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, plane: Plane) {
        self.planes.push(plane);
        self.sort();
    }

    pub fn sort(&mut self) {
        self.planes
            .sort_by_key(|plane| (plane.priority, plane.creation_id));
    }

    #[must_use]
    pub fn find(&self, creation_id: u32) -> Option<&Plane> {
        self.planes.iter().find(|plane| plane.creation_id == creation_id)
    }

    pub fn find_mut(&mut self, creation_id: u32) -> Option<&mut Plane> {
        self.planes
            .iter_mut()
            .find(|plane| plane.creation_id == creation_id)
    }

    pub fn remove(&mut self, creation_id: u32) -> Option<Plane> {
        let index = self
            .planes
            .iter()
            .position(|plane| plane.creation_id == creation_id)?;
        Some(self.planes.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plane> {
        self.planes.iter()
    }

    /// Recomputes geometry and draws every plane, back to front.
    ///
    /// # Errors
    ///
    /// Stops at the first plane that fails to draw.
    pub fn draw(&mut self, ctx: &mut CelContext, target: &mut Buffer) -> Result<(), CelError> {
        for plane in &mut self.planes {
            plane.calc_rects(ctx)?;
            plane.draw(ctx, target)?;
        }
        Ok(())
    }
}
