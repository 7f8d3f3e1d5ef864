//! CPU mirror of the lighting uniform block shared by every lit program.
//!
//! Programs address their uniforms by name (`viewPos`, `ambient`,
//! `lights[i].position`, ...). Names are resolved to a flat slot index which
//! doubles as the [`UniformLocation`] handed back to callers.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::backend::{UniformKind, UniformLocation, UniformValue};

/// Number of light slots in the block.
pub const MAX_LIGHTS: usize = 4;

const VIEW_POS_SLOT: usize = 0;
const AMBIENT_SLOT: usize = 1;
const FIRST_LIGHT_SLOT: usize = 2;

const LIGHT_FIELDS: [(&str, UniformKind); 5] = [
    ("enabled", UniformKind::Int),
    ("type", UniformKind::Int),
    ("position", UniformKind::Vec3),
    ("target", UniformKind::Vec3),
    ("color", UniformKind::Vec4),
];

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    pub enabled: i32,
    pub target: [f32; 3],
    pub kind: i32,
    pub color: [f32; 4],
}

/// Layout matches the `Lighting` struct declared by the WGSL stage files.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct LightingUniforms {
    pub view_pos: [f32; 3],
    _pad: f32,
    pub ambient: [f32; 4],
    pub lights: [LightUniform; MAX_LIGHTS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UniformSlot {
    offset: usize,
    kind: UniformKind,
}

/// Resolves a uniform name to its location, or `None` for names the layout
/// does not define.
pub fn lookup(name: &str) -> Option<UniformLocation> {
    let slot = match name {
        "viewPos" => VIEW_POS_SLOT,
        "ambient" => AMBIENT_SLOT,
        _ => {
            let (index, field) = name.strip_prefix("lights[")?.split_once("].")?;
            let index: usize = index.parse().ok()?;
            if index >= MAX_LIGHTS {
                return None;
            }
            let field = LIGHT_FIELDS.iter().position(|(known, _)| *known == field)?;
            FIRST_LIGHT_SLOT + index * LIGHT_FIELDS.len() + field
        }
    };
    i32::try_from(slot).ok().map(UniformLocation)
}

/// Whether `source` mentions the root identifier of a uniform `name`
/// (`lights` for `lights[0].color`).
pub fn source_declares(source: &str, name: &str) -> bool {
    let root = name.split(['[', '.']).next().unwrap_or(name);
    if root.is_empty() {
        return false;
    }
    source.match_indices(root).any(|(at, _)| {
        let before = source[..at].chars().next_back();
        let after = source[at + root.len()..].chars().next();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn slot(location: UniformLocation) -> Option<UniformSlot> {
    let index = usize::try_from(location.0).ok()?;
    match index {
        VIEW_POS_SLOT => Some(UniformSlot {
            offset: offset_of!(LightingUniforms, view_pos),
            kind: UniformKind::Vec3,
        }),
        AMBIENT_SLOT => Some(UniformSlot {
            offset: offset_of!(LightingUniforms, ambient),
            kind: UniformKind::Vec4,
        }),
        _ => {
            let index = index - FIRST_LIGHT_SLOT;
            let light = index / LIGHT_FIELDS.len();
            let field = index % LIGHT_FIELDS.len();
            if light >= MAX_LIGHTS {
                return None;
            }
            let field_offset = match field {
                0 => offset_of!(LightUniform, enabled),
                1 => offset_of!(LightUniform, kind),
                2 => offset_of!(LightUniform, position),
                3 => offset_of!(LightUniform, target),
                _ => offset_of!(LightUniform, color),
            };
            Some(UniformSlot {
                offset: offset_of!(LightingUniforms, lights)
                    + light * size_of::<LightUniform>()
                    + field_offset,
                kind: LIGHT_FIELDS[field].1,
            })
        }
    }
}

/// Uniform storage of one loaded program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformBlock {
    values: LightingUniforms,
}

impl UniformBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies `value` into the slot at `location`. Returns `false` and leaves
    /// the block untouched when the location is unknown or the value kind
    /// does not match the slot.
    pub fn write(&mut self, location: UniformLocation, value: UniformValue) -> bool {
        let Some(slot) = slot(location) else {
            return false;
        };
        if slot.kind != value.kind() {
            return false;
        }
        let src = value.as_bytes();
        bytemuck::bytes_of_mut(&mut self.values)[slot.offset..slot.offset + src.len()]
            .copy_from_slice(src);
        true
    }

    pub fn values(&self) -> &LightingUniforms {
        &self.values
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.values)
    }
}
