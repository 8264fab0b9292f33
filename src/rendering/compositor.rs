use std::collections::{HashMap, HashSet};

use glam::{Mat4, Vec2, Vec4};
use orom_miniquad::*;
use tracing::{debug, info, warn};

use crate::config::RenderConfig;
use crate::effects::{ParticleState, ParticleSystem};
use crate::error::{HeliumError, Result};
use crate::rendering::atlas::{encode_lookup, TextureRef, ATLAS_SIZE};
use crate::rendering::shaders::{downsample_shader, grid_shader, light_shader, particle_shader, sprite_shader};
use crate::rendering::transform::transform_point;
use crate::universe::{DrawCommand, FramePhase, Universe};
use crate::utility::StopWatch;

/// Quads per particle draw; keeps every index inside `u16`.
pub const MAX_PARTICLE_QUADS: usize = 16384;
const INITIAL_PARTICLE_QUADS: usize = 256;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
struct QuadVertex {
    pos: [f32; 2],
}

unsafe impl bytemuck::Zeroable for QuadVertex {}
unsafe impl bytemuck::Pod for QuadVertex {}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParticleVertex {
    /// Clip space position.
    pub pos: [f32; 2],
    /// `[-1, 1]²` offset from the sprite centre.
    pub corner: [f32; 2],
    pub color: [f32; 4],
}

unsafe impl bytemuck::Zeroable for ParticleVertex {}
unsafe impl bytemuck::Pod for ParticleVertex {}

const UNIT_QUAD: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0] },
];
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];
const CORNERS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

/// Rejects offscreen targets the GPU could never complete.
pub fn check_target(width: u32, height: u32, max_dimension: u32) -> Result<()> {
    if width == 0 || height == 0 || width > max_dimension || height > max_dimension {
        Err(HeliumError::IncompleteRenderTarget { width, height })
    } else {
        Ok(())
    }
}

/// Fits a requested target size into `[1, max_dimension]` per axis. A large
/// window keeps rendering at a lower effective supersample factor.
pub fn fit_target((width, height): (u32, u32), max_dimension: u32) -> (u32, u32) {
    let max_dimension = max_dimension.max(1);
    (width.clamp(1, max_dimension), height.clamp(1, max_dimension))
}

/// Drops every cached entry whose key was not used this frame.
fn evict_unused<T>(cache: &mut HashMap<(u32, u32), T>, used: &HashSet<(u32, u32)>, mut release: impl FnMut(T)) {
    let stale: Vec<(u32, u32)> = cache.keys().filter(|key| !used.contains(key)).copied().collect();
    for key in stale {
        if let Some(value) = cache.remove(&key) {
            release(value);
        }
    }
}

/// Expands one particle into a screen-aligned quad, `size` pixels across.
pub fn push_particle_quad(
    state: &ParticleState,
    view: Mat4,
    framebuffer: Vec2,
    out: &mut impl Extend<ParticleVertex>,
) {
    let centre = transform_point(view, state.position);
    let half = Vec2::splat(state.size) / framebuffer;
    let color = state.color.to_array();
    out.extend(CORNERS.iter().map(|&corner| ParticleVertex {
        pos: (centre + half * Vec2::from(corner)).to_array(),
        corner,
        color,
    }));
}

fn quad_index_list(quads: usize) -> Vec<u16> {
    (0..quads)
        .flat_map(|quad| {
            let base = (quad * 4) as u16;
            QUAD_INDICES.iter().map(move |i| base + i)
        })
        .collect()
}

fn build_pipeline(
    ctx: &mut Context,
    vertex: &str,
    fragment: &str,
    meta: ShaderMeta,
    attributes: &[VertexAttribute],
    params: PipelineParams,
) -> Result<Pipeline> {
    let shader = Shader::new(ctx, vertex, fragment, meta)
        .map_err(|e| HeliumError::ShaderCompilation(format!("{:?}", e)))?;
    Ok(Pipeline::with_params(ctx, &[BufferLayout::default()], attributes, shader, params))
}

fn alpha_blend() -> PipelineParams {
    PipelineParams {
        color_blend: Some(BlendState::new(
            Equation::Add,
            BlendFactor::Value(BlendValue::SourceAlpha),
            BlendFactor::OneMinusValue(BlendValue::SourceAlpha),
        )),
        ..Default::default()
    }
}

fn additive_blend() -> PipelineParams {
    PipelineParams {
        color_blend: Some(BlendState::new(
            Equation::Add,
            BlendFactor::Value(BlendValue::SourceAlpha),
            BlendFactor::One,
        )),
        alpha_blend: Some(BlendState::new(Equation::Add, BlendFactor::Zero, BlendFactor::One)),
        ..Default::default()
    }
}

struct Offscreen {
    texture: Texture,
    pass: RenderPass,
    size: (u32, u32),
}

impl Offscreen {
    fn new(ctx: &mut Context, (width, height): (u32, u32), max_dimension: u32) -> Result<Self> {
        check_target(width, height, max_dimension)?;
        let texture = Texture::new_render_texture(
            ctx,
            TextureParams {
                width,
                height,
                format: TextureFormat::RGBA8,
                wrap: TextureWrap::Clamp,
                filter: FilterMode::Nearest,
                ..TextureParams::default()
            },
        );
        let pass = RenderPass::new(ctx, texture, None);
        Ok(Self {
            texture,
            pass,
            size: (width, height),
        })
    }

    fn delete(&self, ctx: &mut Context) {
        self.pass.delete(ctx);
        self.texture.delete();
    }
}

/// GPU half of the scene. Owns every GPU resource up front and replays the
/// universe's recorded draws once per frame: grids and sprites into the
/// supersampled target, then downsample, particles and lights on screen.
pub struct Compositor {
    config: RenderConfig,
    offscreen: Offscreen,
    atlas: Texture,
    lookups: HashMap<(u32, u32), Texture>,
    lookups_used: HashSet<(u32, u32)>,
    lookup_texels: Vec<u8>,
    quad_vertices: Buffer,
    quad_indices: Buffer,
    particle_vertices: Buffer,
    particle_indices: Buffer,
    particle_capacity: usize,
    grid_pipeline: Pipeline,
    sprite_pipeline: Pipeline,
    downsample_pipeline: Pipeline,
    particle_pipeline: Pipeline,
    light_pipeline: Pipeline,
    arena: bumpalo::Bump,
}

impl Compositor {
    pub fn new(ctx: &mut Context, universe: &mut Universe) -> Result<Self> {
        let config = universe.config().render.clone();
        let (width, height) = ctx.screen_size();
        let factor = config.supersample.max(1);
        let offscreen = Offscreen::new(
            ctx,
            (width as u32 * factor, height as u32 * factor),
            config.max_target_dimension,
        )?;

        let atlas = Texture::from_data_and_format(
            ctx,
            universe.atlas().pixels(),
            TextureParams {
                format: TextureFormat::RGBA8,
                wrap: TextureWrap::Clamp,
                filter: FilterMode::Nearest,
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth: 1,
            },
            TextureKind::Texture2D,
        );
        // the initial upload above covers anything registered so far
        let _ = universe.atlas_mut().take_dirty();

        let quad_vertices = Buffer::immutable(ctx, BufferType::VertexBuffer, &UNIT_QUAD);
        let quad_indices = Buffer::immutable(ctx, BufferType::IndexBuffer, &QUAD_INDICES);
        let particle_vertices = Buffer::stream(
            ctx,
            BufferType::VertexBuffer,
            INITIAL_PARTICLE_QUADS * 4 * std::mem::size_of::<ParticleVertex>(),
        );
        let particle_indices = Buffer::immutable(ctx, BufferType::IndexBuffer, &quad_index_list(INITIAL_PARTICLE_QUADS)[..]);

        let quad_layout = [VertexAttribute::new("pos", VertexFormat::Float2)];
        let grid_pipeline = build_pipeline(
            ctx,
            grid_shader::VERTEX,
            grid_shader::FRAGMENT,
            grid_shader::meta(),
            &quad_layout,
            alpha_blend(),
        )?;
        let sprite_pipeline = build_pipeline(
            ctx,
            sprite_shader::VERTEX,
            sprite_shader::FRAGMENT,
            sprite_shader::meta(),
            &quad_layout,
            alpha_blend(),
        )?;
        let downsample_pipeline = build_pipeline(
            ctx,
            downsample_shader::VERTEX,
            downsample_shader::FRAGMENT,
            downsample_shader::meta(),
            &quad_layout,
            PipelineParams::default(),
        )?;
        let particle_pipeline = build_pipeline(
            ctx,
            particle_shader::VERTEX,
            particle_shader::FRAGMENT,
            particle_shader::meta(),
            &[
                VertexAttribute::new("pos", VertexFormat::Float2),
                VertexAttribute::new("corner", VertexFormat::Float2),
                VertexAttribute::new("color", VertexFormat::Float4),
            ],
            additive_blend(),
        )?;
        let light_pipeline = build_pipeline(
            ctx,
            light_shader::VERTEX,
            light_shader::FRAGMENT,
            light_shader::meta(),
            &quad_layout,
            additive_blend(),
        )?;

        info!(
            width = offscreen.size.0,
            height = offscreen.size.1,
            supersample = factor,
            "compositor ready"
        );

        Ok(Self {
            config,
            offscreen,
            atlas,
            lookups: HashMap::new(),
            lookups_used: HashSet::new(),
            lookup_texels: Vec::new(),
            quad_vertices,
            quad_indices,
            particle_vertices,
            particle_indices,
            particle_capacity: INITIAL_PARTICLE_QUADS,
            grid_pipeline,
            sprite_pipeline,
            downsample_pipeline,
            particle_pipeline,
            light_pipeline,
            arena: bumpalo::Bump::new(),
        })
    }

    pub fn offscreen_size(&self) -> (u32, u32) {
        self.offscreen.size
    }

    /// Rebuilds the offscreen target if the universe's framebuffer changed.
    /// Sizes beyond `max_target_dimension` are clamped rather than rejected.
    pub fn resize(&mut self, ctx: &mut Context, size: (u32, u32)) -> Result<()> {
        let target = fit_target(size, self.config.max_target_dimension);
        if target == self.offscreen.size {
            return Ok(());
        }
        if target != size {
            warn!(
                requested_width = size.0,
                requested_height = size.1,
                width = target.0,
                height = target.1,
                "offscreen target clamped"
            );
        }
        let offscreen = Offscreen::new(ctx, target, self.config.max_target_dimension)?;
        self.offscreen.delete(ctx);
        self.offscreen = offscreen;
        debug!(width = target.0, height = target.1, "offscreen target resized");
        Ok(())
    }

    /// Replays the finished frame. Must run after `Universe::post_frame`.
    pub fn draw(&mut self, ctx: &mut Context, universe: &mut Universe) -> Result<()> {
        universe.expect_phase(FramePhase::PostFrame)?;
        self.resize(ctx, universe.offscreen_size())?;

        if let Some(pixels) = universe.atlas_mut().take_dirty() {
            self.atlas.update(ctx, pixels);
        }

        {
            let _sw = StopWatch::named("scene");
            let [r, g, b, a] = self.config.offscreen_clear_color;
            ctx.begin_pass(self.offscreen.pass, PassAction::clear_color(r, g, b, a));
            self.lookups_used.clear();
            for command in universe.draws() {
                if let DrawCommand::Grid { transform, width, height, textures } = command {
                    self.draw_grid(ctx, *transform, *width, *height, textures);
                }
            }
            for command in universe.draws() {
                if let DrawCommand::Sprite { transform, texture } = command {
                    let uv = universe.atlas().uv_rect(*texture)?;
                    self.draw_sprite(ctx, *transform, uv);
                }
            }
            ctx.end_render_pass();
            evict_unused(&mut self.lookups, &self.lookups_used, |texture| texture.delete());
        }

        let [r, g, b, a] = self.config.clear_color;
        ctx.begin_default_pass(PassAction::clear_color(r, g, b, a));
        {
            let _sw = StopWatch::named("downsample");
            let (width, height) = self.offscreen.size;
            ctx.apply_pipeline(&self.downsample_pipeline);
            ctx.apply_bindings(&Bindings {
                vertex_buffers: vec![self.quad_vertices],
                index_buffer: self.quad_indices,
                images: vec![self.offscreen.texture],
            });
            ctx.apply_uniforms(&downsample_shader::Uniforms {
                texel: [1.0 / width as f32, 1.0 / height as f32],
            });
            ctx.draw(0, 6, 1);
        }
        {
            let _sw = StopWatch::named("particles");
            self.draw_particles(ctx, universe.particles(), universe.view(), universe.framebuffer());
        }
        {
            let _sw = StopWatch::named("lights");
            ctx.apply_pipeline(&self.light_pipeline);
            ctx.apply_bindings(&Bindings {
                vertex_buffers: vec![self.quad_vertices],
                index_buffer: self.quad_indices,
                images: Vec::new(),
            });
            let view = universe.view();
            for light in universe.lights() {
                ctx.apply_uniforms(&light_shader::Uniforms {
                    transform: view * light.transform,
                    color: light.color.to_array(),
                });
                ctx.draw(0, 6, 1);
            }
        }
        ctx.end_render_pass();
        ctx.commit_frame();
        Ok(())
    }

    fn draw_grid(&mut self, ctx: &mut Context, transform: Mat4, width: u32, height: u32, textures: &[TextureRef]) {
        if width == 0 || height == 0 {
            return;
        }
        encode_lookup(textures, &mut self.lookup_texels);
        self.lookups_used.insert((width, height));
        let lookup = *self.lookups.entry((width, height)).or_insert_with(|| {
            debug!(width, height, "new grid lookup texture");
            Texture::from_data_and_format(
                ctx,
                &vec![0u8; width as usize * height as usize * 4],
                TextureParams {
                    format: TextureFormat::RGBA8,
                    wrap: TextureWrap::Clamp,
                    filter: FilterMode::Nearest,
                    width,
                    height,
                    depth: 1,
                },
                TextureKind::Texture2D,
            )
        });
        lookup.update(ctx, &self.lookup_texels);

        ctx.apply_pipeline(&self.grid_pipeline);
        ctx.apply_bindings(&Bindings {
            vertex_buffers: vec![self.quad_vertices],
            index_buffer: self.quad_indices,
            images: vec![self.atlas, lookup],
        });
        ctx.apply_uniforms(&grid_shader::Uniforms {
            transform,
            grid_size: [width as f32, height as f32],
        });
        ctx.draw(0, 6, 1);
    }

    fn draw_sprite(&self, ctx: &mut Context, transform: Mat4, uv: Vec4) {
        ctx.apply_pipeline(&self.sprite_pipeline);
        ctx.apply_bindings(&Bindings {
            vertex_buffers: vec![self.quad_vertices],
            index_buffer: self.quad_indices,
            images: vec![self.atlas],
        });
        ctx.apply_uniforms(&sprite_shader::Uniforms {
            transform,
            uv_rect: uv.to_array(),
        });
        ctx.draw(0, 6, 1);
    }

    fn draw_particles(&mut self, ctx: &mut Context, particles: &ParticleSystem, view: Mat4, framebuffer: Vec2) {
        if particles.is_empty() {
            return;
        }
        let count = particles.len().min(MAX_PARTICLE_QUADS);
        if particles.len() > MAX_PARTICLE_QUADS {
            warn!(particles = particles.len(), drawn = count, "particle overflow");
        }
        if count > self.particle_capacity {
            self.grow_particle_buffers(ctx, count);
        }

        {
            let mut vertices = bumpalo::collections::Vec::with_capacity_in(count * 4, &self.arena);
            for particle in particles.iter().take(count) {
                push_particle_quad(&particle.state, view, framebuffer, &mut vertices);
            }
            self.particle_vertices.update(ctx, &vertices[..]);
        }
        self.arena.reset();

        ctx.apply_pipeline(&self.particle_pipeline);
        ctx.apply_bindings(&Bindings {
            vertex_buffers: vec![self.particle_vertices],
            index_buffer: self.particle_indices,
            images: Vec::new(),
        });
        ctx.draw(0, (count * 6) as i32, 1);
    }

    fn grow_particle_buffers(&mut self, ctx: &mut Context, needed: usize) {
        let capacity = needed.next_power_of_two().min(MAX_PARTICLE_QUADS);
        warn!(from = self.particle_capacity, to = capacity, "growing particle buffers");
        self.particle_vertices.delete();
        self.particle_indices.delete();
        self.particle_vertices = Buffer::stream(
            ctx,
            BufferType::VertexBuffer,
            capacity * 4 * std::mem::size_of::<ParticleVertex>(),
        );
        self.particle_indices = Buffer::immutable(ctx, BufferType::IndexBuffer, &quad_index_list(capacity)[..]);
        self.particle_capacity = capacity;
    }
}
