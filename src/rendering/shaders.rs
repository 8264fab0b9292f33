//! GLSL sources and uniform layouts for every pass the compositor runs.
//!
//! All passes share one vertex layout: a unit quad with `pos` in `[0, 1]²`,
//! except particles which are expanded on the CPU.

pub mod grid_shader {
    use glam::Mat4;
    use orom_miniquad::*;

    pub const VERTEX: &str = r#"#version 100
        attribute vec2 pos;

        uniform mat4 transform;
        uniform vec2 grid_size;

        varying highp vec2 grid_pos;

        void main() {
            grid_pos = pos * grid_size;
            gl_Position = transform * vec4(grid_pos, 0.0, 1.0);
        }
    "#;

    pub const FRAGMENT: &str = r#"#version 100
        precision highp float;

        varying highp vec2 grid_pos;

        uniform vec2 grid_size;
        uniform sampler2D atlas;
        uniform sampler2D lookup;

        void main() {
            vec2 cell = clamp(floor(grid_pos), vec2(0.0), grid_size - 1.0);
            vec2 local = clamp(grid_pos - cell, 0.0, 0.999);

            vec4 entry = texture2D(lookup, (cell + 0.5) / grid_size);
            float slot = floor(entry.r * 255.0 + 0.5) + floor(entry.g * 255.0 + 0.5) * 256.0;
            if (slot < 0.5) {
                discard;
            }

            vec2 origin = vec2(mod(slot, 16.0), floor(slot / 16.0));
            vec2 uv = (origin + vec2(local.x, 1.0 - local.y)) / 16.0;
            gl_FragColor = texture2D(atlas, uv);
        }
    "#;

    pub fn meta() -> ShaderMeta {
        ShaderMeta {
            images: vec!["atlas".to_string(), "lookup".to_string()],
            uniforms: UniformBlockLayout {
                uniforms: vec![
                    UniformDesc::new("transform", UniformType::Mat4),
                    UniformDesc::new("grid_size", UniformType::Float2),
                ],
            },
        }
    }

    #[repr(C)]
    pub struct Uniforms {
        pub transform: Mat4,
        pub grid_size: [f32; 2],
    }
}

pub mod sprite_shader {
    use glam::Mat4;
    use orom_miniquad::*;

    pub const VERTEX: &str = r#"#version 100
        attribute vec2 pos;

        uniform mat4 transform;
        uniform vec4 uv_rect;

        varying lowp vec2 texcoord;

        void main() {
            gl_Position = transform * vec4(pos, 0.0, 1.0);
            texcoord = mix(uv_rect.xy, uv_rect.zw, vec2(pos.x, 1.0 - pos.y));
        }
    "#;

    pub const FRAGMENT: &str = r#"#version 100
        varying lowp vec2 texcoord;

        uniform sampler2D atlas;

        void main() {
            gl_FragColor = texture2D(atlas, texcoord);
        }
    "#;

    pub fn meta() -> ShaderMeta {
        ShaderMeta {
            images: vec!["atlas".to_string()],
            uniforms: UniformBlockLayout {
                uniforms: vec![
                    UniformDesc::new("transform", UniformType::Mat4),
                    UniformDesc::new("uv_rect", UniformType::Float4),
                ],
            },
        }
    }

    #[repr(C)]
    pub struct Uniforms {
        pub transform: Mat4,
        pub uv_rect: [f32; 4],
    }
}

/// Box-filters the supersampled target down to the window.
pub mod downsample_shader {
    use orom_miniquad::*;

    pub const VERTEX: &str = r#"#version 100
        attribute vec2 pos;

        varying highp vec2 texcoord;

        void main() {
            gl_Position = vec4(pos * 2.0 - 1.0, 0.0, 1.0);
            texcoord = pos;
        }
    "#;

    pub const FRAGMENT: &str = r#"#version 100
        precision highp float;

        varying highp vec2 texcoord;

        uniform vec2 texel;
        uniform sampler2D tex;

        void main() {
            vec2 d = texel * 0.5;
            vec4 sum = texture2D(tex, texcoord + vec2(-d.x, -d.y))
                     + texture2D(tex, texcoord + vec2( d.x, -d.y))
                     + texture2D(tex, texcoord + vec2(-d.x,  d.y))
                     + texture2D(tex, texcoord + vec2( d.x,  d.y));
            gl_FragColor = vec4((sum * 0.25).rgb, 1.0);
        }
    "#;

    pub fn meta() -> ShaderMeta {
        ShaderMeta {
            images: vec!["tex".to_string()],
            uniforms: UniformBlockLayout {
                uniforms: vec![UniformDesc::new("texel", UniformType::Float2)],
            },
        }
    }

    #[repr(C)]
    pub struct Uniforms {
        pub texel: [f32; 2],
    }
}

/// Round point sprites. Vertices arrive in clip space already.
pub mod particle_shader {
    use orom_miniquad::*;

    pub const VERTEX: &str = r#"#version 100
        attribute vec2 pos;
        attribute vec2 corner;
        attribute vec4 color;

        varying lowp vec2 offset;
        varying lowp vec4 tint;

        void main() {
            gl_Position = vec4(pos, 0.0, 1.0);
            offset = corner;
            tint = color;
        }
    "#;

    pub const FRAGMENT: &str = r#"#version 100
        varying lowp vec2 offset;
        varying lowp vec4 tint;

        void main() {
            lowp float falloff = 1.0 - clamp(length(offset), 0.0, 1.0);
            gl_FragColor = vec4(tint.rgb, tint.a * falloff);
        }
    "#;

    pub fn meta() -> ShaderMeta {
        ShaderMeta {
            images: Vec::new(),
            uniforms: UniformBlockLayout { uniforms: Vec::new() },
        }
    }
}

pub mod light_shader {
    use glam::Mat4;
    use orom_miniquad::*;

    pub const VERTEX: &str = r#"#version 100
        attribute vec2 pos;

        uniform mat4 transform;

        varying lowp vec2 offset;

        void main() {
            gl_Position = transform * vec4(pos, 0.0, 1.0);
            offset = pos * 2.0 - 1.0;
        }
    "#;

    pub const FRAGMENT: &str = r#"#version 100
        varying lowp vec2 offset;

        uniform lowp vec4 color;

        void main() {
            lowp float falloff = 1.0 - clamp(length(offset), 0.0, 1.0);
            gl_FragColor = vec4(color.rgb, color.a * falloff * falloff);
        }
    "#;

    pub fn meta() -> ShaderMeta {
        ShaderMeta {
            images: Vec::new(),
            uniforms: UniformBlockLayout {
                uniforms: vec![
                    UniformDesc::new("transform", UniformType::Mat4),
                    UniformDesc::new("color", UniformType::Float4),
                ],
            },
        }
    }

    #[repr(C)]
    pub struct Uniforms {
        pub transform: Mat4,
        pub color: [f32; 4],
    }
}
