//! The renderer state every cel operation runs against.

use slotcache::Lookup;

use crate::bitmap::{BitmapHandle, BitmapStore};
use crate::cel::cache::CelCache;
use crate::cel::{CelInfo, CelObj, CelType, pic, view};
use crate::config::RenderConfig;
use crate::error::CelError;
use crate::remap::{ColorRemap, Remap};
use crate::render::table::CelScaler;
use crate::resource::{ResourceData, ResourceProvider, ResourceType};

/// State that only exists between [`CelContext::init`] and
/// [`CelContext::teardown`].
struct CelState {
    cache: CelCache,
    scaler: CelScaler,
}

/// What a draw borrows from the context. The scaler is borrowed mutably while the
/// rest stays shared.
pub struct DrawResources<'a> {
    pub scaler: &'a mut CelScaler,
    pub remap: &'a dyn Remap,
    pub bitmaps: &'a BitmapStore,
    /// Scale through one table for every cel instead of per draw.
    pub global_scaling: bool,
}

/// Owns the cel cache, the scale tables and the collaborators cels are built from.
///
/// Several contexts can live side by side; nothing is process-wide.
pub struct CelContext {
    config: RenderConfig,
    resources: Box<dyn ResourceProvider>,
    bitmaps: BitmapStore,
    remap: Box<dyn Remap>,
    state: Option<CelState>,
}

impl CelContext {
    /// A context with no active remaps. Call [`init`](Self::init) before building
    /// or drawing cels.
    #[must_use]
    pub fn new(config: RenderConfig, resources: Box<dyn ResourceProvider>) -> Self {
        Self {
            config,
            resources,
            bitmaps: BitmapStore::new(),
            remap: Box::new(ColorRemap::default()),
            state: None,
        }
    }

    #[must_use]
    pub fn with_remap(mut self, remap: Box<dyn Remap>) -> Self {
        self.remap = remap;
        self
    }

    pub fn set_remap(&mut self, remap: Box<dyn Remap>) {
        self.remap = remap;
    }

    /// Sets up an empty cache and fresh scale tables. Calling it again starts over.
    ///
    /// # Errors
    ///
    /// Fails when the configuration has a zero-sized coordinate system.
    pub fn init(&mut self) -> Result<(), CelError> {
        self.config.validate().map_err(CelError::InvalidConfig)?;
        self.state = Some(CelState {
            cache: CelCache::new(),
            scaler: CelScaler::new(),
        });
        tracing::debug!(
            "cel context ready: script {}x{}, screen {}x{}",
            self.config.script_width,
            self.config.script_height,
            self.config.screen_width,
            self.config.screen_height
        );
        Ok(())
    }

    /// Drops every cached cel and the scale tables.
    pub fn teardown(&mut self) {
        if self.state.take().is_some() {
            tracing::debug!("cel context torn down");
        }
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    #[must_use]
    pub const fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[must_use]
    pub const fn bitmaps(&self) -> &BitmapStore {
        &self.bitmaps
    }

    pub const fn bitmaps_mut(&mut self) -> &mut BitmapStore {
        &mut self.bitmaps
    }

    #[must_use]
    pub fn remap(&self) -> &dyn Remap {
        self.remap.as_ref()
    }

    /// # Errors
    ///
    /// Fails before [`init`](Self::init).
    pub fn cache(&self) -> Result<&CelCache, CelError> {
        self.state
            .as_ref()
            .map(|state| &state.cache)
            .ok_or(CelError::NotInitialized)
    }

    fn cache_mut(&mut self) -> Result<&mut CelCache, CelError> {
        self.state
            .as_mut()
            .map(|state| &mut state.cache)
            .ok_or(CelError::NotInitialized)
    }

    /// Splits the context for one draw.
    ///
    /// # Errors
    ///
    /// Fails before [`init`](Self::init).
    pub fn draw_resources(&mut self) -> Result<DrawResources<'_>, CelError> {
        let state = self.state.as_mut().ok_or(CelError::NotInitialized)?;
        Ok(DrawResources {
            scaler: &mut state.scaler,
            remap: self.remap.as_ref(),
            bitmaps: &self.bitmaps,
            global_scaling: self.config.uses_global_scaling(),
        })
    }

    fn resource(&self, kind: ResourceType, id: u16) -> Option<ResourceData> {
        self.resources
            .find_resource(kind, id)
            .map(|bytes| ResourceData::new(bytes, self.config.endian))
    }

    /// Builds the cel `info` names. View and pic cels are served from the cache
    /// when possible.
    ///
    /// # Errors
    ///
    /// Colour cels need dimensions and cannot be built from an info alone; see
    /// [`color`](Self::color).
    pub fn create(&mut self, info: &CelInfo) -> Result<CelObj, CelError> {
        match info.kind {
            CelType::View => self.view(info.resource_id, info.loop_no, info.cel_no),
            CelType::Pic => self.pic(info.resource_id, info.cel_no),
            CelType::Mem => self.mem(info.bitmap),
            CelType::Color => Err(CelError::UnsupportedOperation(
                "creating a color cel without dimensions",
            )),
        }
    }

    fn cached(
        &mut self,
        info: CelInfo,
        parse: impl FnOnce(&Self, ResourceData) -> Result<CelObj, CelError>,
    ) -> Result<CelObj, CelError> {
        let (kind, id) = match info.kind {
            CelType::Pic => (ResourceType::Pic, info.resource_id),
            _ => (ResourceType::View, info.resource_id),
        };

        let index = match self.cache_mut()?.search(&info) {
            Lookup::Hit(index) => return self.cache()?.get(index, info.kind),
            Lookup::Miss(index) => index,
        };

        let data = self
            .resource(kind, id)
            .ok_or(CelError::ResourceNotFound { kind, id })?;
        let cel = parse(self, data)?;
        self.cache_mut()?.insert(index, info, &cel)?;
        Ok(cel)
    }

    /// Cel `cel_no` of loop `loop_no` of view `id`. Numbers past the end are clamped.
    ///
    /// # Errors
    ///
    /// Fails for a missing view, negative numbers and corrupt data.
    pub fn view(&mut self, id: u16, loop_no: i16, cel_no: i16) -> Result<CelObj, CelError> {
        let info = CelInfo::view(id, loop_no, cel_no);
        self.cached(info, |ctx, data| view::parse(data, info, ctx.remap.range()))
            .inspect_err(|err| tracing::error!("view {id} loop {loop_no} cel {cel_no}: {err}"))
    }

    /// Cel `cel_no` of pic `id`.
    ///
    /// A pic listed in the configuration's tolerated missing pics yields an empty
    /// cel when absent.
    ///
    /// # Errors
    ///
    /// Fails for any other missing pic, cel numbers past the end and corrupt data.
    pub fn pic(&mut self, id: u16, cel_no: i16) -> Result<CelObj, CelError> {
        let info = CelInfo::pic(id, cel_no);
        self.cache()?;

        if self.config.tolerated_missing_pics.contains(&id)
            && self.resources.find_resource(ResourceType::Pic, id).is_none()
        {
            tracing::warn!("pic {id} is missing, drawing nothing in its place");
            return Ok(pic::empty(info, self.config.endian));
        }

        self.cached(info, |_, data| pic::parse(data, info))
            .inspect_err(|err| tracing::error!("pic {id} cel {cel_no}: {err}"))
    }

    /// A cel over bitmap `handle`.
    ///
    /// # Errors
    ///
    /// Fails for an unknown handle.
    pub fn mem(&self, handle: BitmapHandle) -> Result<CelObj, CelError> {
        CelObj::mem(&self.bitmaps, handle)
    }

    /// A `width` by `height` fill of `color`, authored in script coordinates.
    #[must_use]
    pub const fn color(&self, color: u8, width: u16, height: u16) -> CelObj {
        CelObj::color(
            color,
            width,
            height,
            self.config.script_width,
            self.config.script_height,
        )
    }

    /// Number of loops in view `id`; 0 when the view does not exist.
    ///
    /// # Errors
    ///
    /// Fails on a view too short to hold its header.
    pub fn num_loops(&self, id: u16) -> Result<u8, CelError> {
        self.resource(ResourceType::View, id)
            .map_or(Ok(0), |data| view::loop_count(&data))
    }

    /// Number of cels in loop `loop_no` of view `id`; 0 when the view or the loop
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Asking for the loop one past the last one fails unless the configuration
    /// picks a compatible answer.
    pub fn num_cels(&self, id: u16, loop_no: i16) -> Result<i16, CelError> {
        self.resource(ResourceType::View, id)
            .map_or(Ok(0), |data| {
                view::cel_count(&data, id, loop_no, self.config.cel_count_compat)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CelCountCompat;
    use crate::resource::ResourceStore;
    use crate::testing::{CelDef, PicBuilder, ViewBuilder};
    use pretty_assertions::assert_eq;

    fn store() -> ResourceStore {
        let mut store = ResourceStore::new();
        store.insert(
            ResourceType::View,
            1,
            ViewBuilder::new()
                .add_loop(vec![
                    CelDef::uncompressed(2, 2, vec![1; 4]),
                    CelDef::uncompressed(3, 1, vec![2; 3]),
                ])
                .add_loop(vec![CelDef::compressed(4, 1, vec![3; 4])])
                .build(),
        );
        store.insert(
            ResourceType::Pic,
            2,
            PicBuilder::new()
                .add_cel(CelDef::uncompressed(1, 1, vec![9]))
                .build(),
        );
        store
    }

    fn context(config: RenderConfig) -> CelContext {
        let mut ctx = CelContext::new(config, Box::new(store()));
        ctx.init().unwrap();
        ctx
    }

    #[test]
    fn cels_need_an_initialised_context() {
        let mut ctx = CelContext::new(RenderConfig::default(), Box::new(store()));
        assert_eq!(ctx.view(1, 0, 0).err(), Some(CelError::NotInitialized));
        assert_eq!(ctx.pic(2, 0).err(), Some(CelError::NotInitialized));
        assert!(ctx.draw_resources().is_err());

        ctx.init().unwrap();
        assert!(ctx.view(1, 0, 0).is_ok());

        ctx.teardown();
        assert!(!ctx.is_initialized());
        assert_eq!(ctx.cache().err(), Some(CelError::NotInitialized));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = RenderConfig {
            screen_width: 0,
            ..RenderConfig::default()
        };
        let mut ctx = CelContext::new(config, Box::new(store()));
        assert!(matches!(ctx.init(), Err(CelError::InvalidConfig(_))));
        assert!(!ctx.is_initialized());
    }

    #[test]
    fn repeated_requests_share_one_cache_slot() {
        let mut ctx = context(RenderConfig::default());
        let first = ctx.view(1, 0, 1).unwrap();
        let second = ctx.view(1, 0, 1).unwrap();
        assert_eq!(ctx.cache().unwrap().len(), 1);
        assert_eq!((first.width, first.height), (second.width, second.height));
        assert_eq!(first.info, second.info);

        ctx.view(1, 0, 0).unwrap();
        ctx.pic(2, 0).unwrap();
        assert_eq!(ctx.cache().unwrap().len(), 3);
    }

    #[test]
    fn clamped_requests_are_cached_under_the_request() {
        let mut ctx = context(RenderConfig::default());
        let cel = ctx.view(1, 5, 5).unwrap();
        assert_eq!((cel.info.loop_no, cel.info.cel_no), (1, 0));

        let cache = ctx.cache().unwrap();
        assert_eq!(cache.len(), 1);
        assert!((0..cache.capacity()).any(|i| cache.key(i) == Some(CelInfo::view(1, 5, 5))));
    }

    #[test]
    fn missing_resources() {
        let config = RenderConfig {
            tolerated_missing_pics: vec![64_000],
            ..RenderConfig::default()
        };
        let mut ctx = context(config);

        assert_eq!(
            ctx.view(99, 0, 0).err(),
            Some(CelError::ResourceNotFound {
                kind: ResourceType::View,
                id: 99
            })
        );
        assert_eq!(
            ctx.pic(98, 0).err(),
            Some(CelError::ResourceNotFound {
                kind: ResourceType::Pic,
                id: 98
            })
        );

        let empty = ctx.pic(64_000, 0).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.cel_count(), 0);
        assert!(ctx.cache().unwrap().is_empty());
    }

    #[test]
    fn create_dispatches_on_type() {
        let mut ctx = context(RenderConfig::default());
        assert_eq!(ctx.create(&CelInfo::view(1, 1, 0)).unwrap().width, 4);
        assert_eq!(ctx.create(&CelInfo::pic(2, 0)).unwrap().width, 1);
        assert!(matches!(
            ctx.create(&CelInfo::color(3)),
            Err(CelError::UnsupportedOperation(_))
        ));

        let handle = ctx.bitmaps_mut().allocate(crate::bitmap::Bitmap::new(
            2,
            3,
            255,
            crate::rect::Point::new(0, 0),
            0,
            0,
            false,
        ));
        let cached = ctx.cache().unwrap().len();
        assert_eq!(cached, 2);
        let mem = ctx.create(&CelInfo::mem(handle)).unwrap();
        assert_eq!((mem.width, mem.height), (2, 3));
        // Bitmap cels bypass the cache.
        assert_eq!(ctx.cache().unwrap().len(), cached);
    }

    #[test]
    fn color_cels_use_script_resolution() {
        let config = RenderConfig {
            script_width: 640,
            script_height: 480,
            ..RenderConfig::default()
        };
        let ctx = context(config);
        let cel = ctx.color(4, 10, 20);
        assert_eq!((cel.x_resolution, cel.y_resolution), (640, 480));
        assert_eq!(cel.info.color, 4);
    }

    #[test]
    fn loop_and_cel_counts() {
        let ctx = context(RenderConfig::default());
        assert_eq!(ctx.num_loops(1), Ok(2));
        assert_eq!(ctx.num_loops(50), Ok(0));
        assert_eq!(ctx.num_cels(1, 0), Ok(2));
        assert_eq!(ctx.num_cels(50, 0), Ok(0));
        assert_eq!(
            ctx.num_cels(1, 2),
            Err(CelError::LoopEqualsCount { id: 1, loop_no: 2 })
        );

        let ctx = context(RenderConfig {
            cel_count_compat: CelCountCompat::LastLoop,
            ..RenderConfig::default()
        });
        assert_eq!(ctx.num_cels(1, 2), Ok(1));
    }
}
