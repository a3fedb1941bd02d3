use serde::{Deserialize, Serialize};

use crate::resource::SciEndian;

/// Width of the low-resolution coordinate system most cels and scripts use.
pub const LOW_RES_X: u16 = 320;

/// Height of the low-resolution coordinate system.
pub const LOW_RES_Y: u16 = 200;

/// How to answer a cel-count request for the loop one past the last one.
///
/// Every release of the original interpreter reads memory it should not for that
/// request. Some scripts depend on what they got back, so the behaviour is
/// selectable per game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CelCountCompat {
    /// Refuse the request with an error naming the view and loop.
    #[default]
    Error,
    /// Answer with the cel count of loop 0, which is what later interpreters read.
    FirstLoop,
    /// Answer with the cel count of the last loop.
    LastLoop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub script_width: u16,
    pub script_height: u16,
    pub screen_width: u16,
    pub screen_height: u16,
    pub endian: SciEndian,
    pub cel_count_compat: CelCountCompat,
    /// Pics some releases reference but never shipped. Asking for one of these
    /// produces an empty cel and a warning instead of an error.
    pub tolerated_missing_pics: Vec<u16>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            script_width: LOW_RES_X,
            script_height: LOW_RES_Y,
            screen_width: LOW_RES_X,
            screen_height: LOW_RES_Y,
            endian: SciEndian::Little,
            cel_count_compat: CelCountCompat::Error,
            tolerated_missing_pics: Vec::new(),
        }
    }
}

impl RenderConfig {
    /// # Errors
    ///
    /// Fails when any coordinate system has a zero dimension.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.script_width == 0 || self.script_height == 0 {
            return Err("script dimensions must be non-zero");
        }
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err("screen dimensions must be non-zero");
        }
        Ok(())
    }

    /// Scripts written for the low-resolution coordinate system scale every cel
    /// with one global cadence.
    #[must_use]
    pub const fn uses_global_scaling(&self) -> bool {
        self.script_width == LOW_RES_X
    }
}
