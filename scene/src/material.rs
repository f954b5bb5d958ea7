use bitflags::bitflags;

use crate::common::{RgbColor, RgbaColor};

/// Unique identifier for materials, assigned sequentially by the Scene.
pub type MaterialId = u32;

bitflags! {
    /// Blend state the host renderer reads when drawing a material.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        const NONE = 0;
        /// Render in the blended pass, honouring `opacity`
        const TRANSPARENT = 1 << 0;
        /// Write to the depth buffer
        const DEPTH_WRITE = 1 << 1;
        /// Disable back-face culling
        const DOUBLE_SIDED = 1 << 2;
    }
}

impl Default for MaterialFlags {
    fn default() -> Self {
        MaterialFlags::DEPTH_WRITE
    }
}

/// Surface description of one material slot.
///
/// The viewer only ever touches three things here: the emissive colour
/// (selection highlight), the opacity and the depth-write flag.
///
/// # Examples
///
/// ```
/// use partview_scene::{Material, Scene};
/// use partview_scene::common::{RgbColor, RgbaColor};
///
/// let material = Material::new()
///     .with_base_color(RgbaColor::GRAY)
///     .with_emissive(RgbColor::from_hex(0x202020));
///
/// let mut scene = Scene::new();
/// let id = scene.add_material(material);
/// assert_eq!(scene.get_material(id).unwrap().emissive().to_hex(), 0x202020);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Assigned by Scene
    pub id: MaterialId,
    pub name: Option<String>,
    base_color: RgbaColor,
    emissive: RgbColor,
    opacity: f32,
    flags: MaterialFlags,
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}

impl Material {
    /// Opaque light-gray material with no emission.
    pub fn new() -> Self {
        Self {
            id: 0,
            name: None,
            base_color: RgbaColor::GRAY,
            emissive: RgbColor::BLACK,
            opacity: 1.0,
            flags: MaterialFlags::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_base_color(mut self, color: RgbaColor) -> Self {
        self.base_color = color;
        self
    }

    pub fn with_emissive(mut self, color: RgbColor) -> Self {
        self.emissive = color;
        self
    }

    pub fn with_flags(mut self, flags: MaterialFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn base_color(&self) -> RgbaColor {
        self.base_color
    }

    pub fn emissive(&self) -> RgbColor {
        self.emissive
    }

    pub fn set_emissive(&mut self, color: RgbColor) {
        self.emissive = color;
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    pub fn flags(&self) -> MaterialFlags {
        self.flags
    }

    pub fn depth_write(&self) -> bool {
        self.flags.contains(MaterialFlags::DEPTH_WRITE)
    }

    pub fn set_depth_write(&mut self, enabled: bool) {
        self.flags.set(MaterialFlags::DEPTH_WRITE, enabled);
    }

    pub fn is_transparent(&self) -> bool {
        self.flags.contains(MaterialFlags::TRANSPARENT)
    }

    pub fn set_transparent(&mut self, enabled: bool) {
        self.flags.set(MaterialFlags::TRANSPARENT, enabled);
    }
}
