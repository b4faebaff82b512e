//! # Assets — named, cached resources
//!
//! [`ResourceManager`] loads meshes, textures, shaders and fonts from the
//! directories in [`ResourcePaths`] and caches them by name. Loading a name
//! that is already cached returns the cached handle without touching the
//! disk, so states can call `load_*` freely in their `init`.
//!
//! Handles are `Rc`s. Freeing a name only drops the cache's reference:
//! objects still holding the resource keep it alive.
//!
//! A few names are built in and never read from disk:
//!
//! | name          | kind   | contents                         |
//! |---------------|--------|----------------------------------|
//! | `quad`        | mesh   | unit quad, origin bottom-left    |
//! | `quad_center` | mesh   | unit quad centered on the origin |
//! | `sprite`      | shader | MVP-only textured quad           |
//! | `animation`   | shader | sprite sheet frame slicing       |

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::ResourcePaths;
use crate::error::ResourceError;
use crate::object::RenderObject;
use crate::render::{ANIMATION_WGSL, FilterMode, Mesh, MeshData, RenderBackend, SPRITE_WGSL, Shader, Texture};

#[cfg(feature = "text")]
use crate::font::FontFace;

pub const QUAD: &str = "quad";
pub const QUAD_CENTER: &str = "quad_center";
pub const SPRITE_SHADER: &str = "sprite";
pub const ANIMATION_SHADER: &str = "animation";

/// Pixel size fonts are parsed at. Any size can be rasterized afterwards.
#[cfg(feature = "text")]
const FONT_SCALE: f32 = 40.0;

/// Load-or-fetch caches for every resource kind.
#[derive(Default)]
pub struct ResourceManager {
    paths: ResourcePaths,
    meshes: HashMap<String, Rc<Mesh>>,
    textures: HashMap<String, Rc<Texture>>,
    shaders: HashMap<String, Rc<Shader>>,
    #[cfg(feature = "text")]
    fonts: HashMap<String, Rc<FontFace>>,
}

impl ResourceManager {
    pub fn new(paths: ResourcePaths) -> Self {
        Self {
            paths,
            ..Default::default()
        }
    }

    pub fn paths(&self) -> &ResourcePaths {
        &self.paths
    }

    /// Load a `.nfg` mesh from the mesh directory, or one of the built-in
    /// quads.
    pub fn load_mesh(&mut self, backend: &mut dyn RenderBackend, name: &str) -> Result<Rc<Mesh>, ResourceError> {
        if let Some(mesh) = self.meshes.get(name) {
            return Ok(mesh.clone());
        }

        let data = match name {
            QUAD => MeshData::quad(),
            QUAD_CENTER => MeshData::quad_centered(),
            _ => {
                let source = read_to_string(&self.paths.meshes.join(name))?;
                MeshData::parse_nfg(&source).map_err(|source| ResourceError::Mesh {
                    name: name.to_owned(),
                    source,
                })?
            }
        };
        let mesh = Mesh::upload(backend, name, data).map_err(|source| ResourceError::Render {
            name: name.to_owned(),
            source,
        })?;

        log::debug!("loaded mesh '{name}' ({} indices)", mesh.index_count());
        let mesh = Rc::new(mesh);
        self.meshes.insert(name.to_owned(), mesh.clone());
        Ok(mesh)
    }

    /// Decode a PNG/JPEG from the texture directory.
    pub fn load_texture(
        &mut self,
        backend: &mut dyn RenderBackend,
        name: &str,
        filter: FilterMode,
    ) -> Result<Rc<Texture>, ResourceError> {
        if let Some(texture) = self.textures.get(name) {
            return Ok(texture.clone());
        }

        let bytes = read(&self.paths.textures.join(name))?;
        let image = image::load_from_memory(&bytes)
            .map_err(|source| ResourceError::Image {
                name: name.to_owned(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        let texture = Texture::from_rgba(backend, name, width, height, image.as_raw(), filter).map_err(|source| {
            ResourceError::Render {
                name: name.to_owned(),
                source,
            }
        })?;

        log::debug!("loaded texture '{name}' ({width}x{height})");
        let texture = Rc::new(texture);
        self.textures.insert(name.to_owned(), texture.clone());
        Ok(texture)
    }

    /// Cache a texture built in code under `name`. Replaces any entry with
    /// the same name.
    pub fn insert_texture(&mut self, name: impl Into<String>, texture: Rc<Texture>) {
        self.textures.insert(name.into(), texture);
    }

    /// Compile `<name>.wgsl` from the shader directory, or a built-in shader.
    pub fn load_shader(&mut self, backend: &mut dyn RenderBackend, name: &str) -> Result<Rc<Shader>, ResourceError> {
        if let Some(shader) = self.shaders.get(name) {
            return Ok(shader.clone());
        }

        let owned;
        let source = match name {
            SPRITE_SHADER => SPRITE_WGSL,
            ANIMATION_SHADER => ANIMATION_WGSL,
            _ => {
                owned = read_to_string(&self.paths.shaders.join(format!("{name}.wgsl")))?;
                owned.as_str()
            }
        };
        let shader = backend
            .create_shader(name, source)
            .map_err(|source| ResourceError::Render {
                name: name.to_owned(),
                source,
            })?;

        log::debug!("loaded shader '{name}'");
        let shader = Rc::new(shader);
        self.shaders.insert(name.to_owned(), shader.clone());
        Ok(shader)
    }

    /// Parse a TTF/OTF file from the font directory.
    #[cfg(feature = "text")]
    pub fn load_font(&mut self, name: &str) -> Result<Rc<FontFace>, ResourceError> {
        if let Some(font) = self.fonts.get(name) {
            return Ok(font.clone());
        }

        let bytes = read(&self.paths.fonts.join(name))?;
        let font = Rc::new(FontFace::from_bytes(name, bytes, FONT_SCALE)?);
        self.fonts.insert(name.to_owned(), font.clone());
        Ok(font)
    }

    /// A sprite on the shared unit quad.
    pub fn sprite(
        &mut self,
        backend: &mut dyn RenderBackend,
        texture: Rc<Texture>,
    ) -> Result<RenderObject, ResourceError> {
        let quad = self.load_mesh(backend, QUAD)?;
        Ok(RenderObject::sprite(quad, texture))
    }

    pub fn get_mesh(&self, name: &str) -> Option<Rc<Mesh>> {
        self.meshes.get(name).cloned()
    }

    pub fn get_texture(&self, name: &str) -> Option<Rc<Texture>> {
        self.textures.get(name).cloned()
    }

    pub fn get_shader(&self, name: &str) -> Option<Rc<Shader>> {
        self.shaders.get(name).cloned()
    }

    #[cfg(feature = "text")]
    pub fn get_font(&self, name: &str) -> Option<Rc<FontFace>> {
        self.fonts.get(name).cloned()
    }

    pub fn free_mesh(&mut self, name: &str) {
        self.meshes.remove(name);
    }

    pub fn free_texture(&mut self, name: &str) {
        self.textures.remove(name);
    }

    pub fn free_shader(&mut self, name: &str) {
        self.shaders.remove(name);
    }

    #[cfg(feature = "text")]
    pub fn free_font(&mut self, name: &str) {
        self.fonts.remove(name);
    }

    /// Drop every cached handle.
    pub fn free_all(&mut self) {
        self.meshes.clear();
        self.textures.clear();
        self.shaders.clear();
        #[cfg(feature = "text")]
        self.fonts.clear();
        log::debug!("freed all cached resources");
    }
}

fn read(path: &Path) -> Result<Vec<u8>, ResourceError> {
    std::fs::read(path).map_err(|e| io_error(path, e))
}

fn read_to_string(path: &Path) -> Result<String, ResourceError> {
    std::fs::read_to_string(path).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: std::io::Error) -> ResourceError {
    let path = PathBuf::from(path);
    if source.kind() == std::io::ErrorKind::NotFound {
        ResourceError::NotFound(path)
    } else {
        ResourceError::Io { path, source }
    }
}
