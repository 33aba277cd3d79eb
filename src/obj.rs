use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::{vec::Vec3, Mesh, UvTriangle};

/// One `v[/vt[/vn]]` reference of a face, zero based.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Corner {
    vert: usize,
    tex: Option<usize>,
}

fn parse_index(s: &str, len: usize, what: &str) -> Result<usize> {
    let i: usize = s.parse().with_context(|| format!("invalid {what} index `{s}`"))?;
    if i == 0 || i > len {
        bail!("{what} index {i} out of range (1..={len})");
    }
    Ok(i - 1)
}

fn parse_corner(s: &str, n_verts: usize, n_tex: usize) -> Result<Corner> {
    let mut parts = s.split('/');
    let vert = parts.next().unwrap_or_default();
    let vert = parse_index(vert, n_verts, "vertex")?;
    let tex = match parts.next() {
        None | Some("") => None,
        Some(t) => Some(parse_index(t, n_tex, "texture")?),
    };
    Ok(Corner { vert, tex })
}

fn parse_floats<const N: usize>(it: &mut std::str::SplitAsciiWhitespace) -> Result<[f32; N]> {
    let mut ret = [0.; N];
    for el in &mut ret {
        let s = it.next().ok_or_else(|| anyhow!("expected {N} coordinates"))?;
        *el = s.parse().with_context(|| format!("invalid number `{s}`"))?;
    }
    Ok(ret)
}

/// Parses vertex positions, texture coordinates and faces of an OBJ file. Quads are split into `(0, 1, 3)` and
/// `(1, 2, 3)`. Texture coordinates are kept only if every face references them.
pub fn parse_obj(src: &str) -> Result<Mesh> {
    let mut verts: Vec<Vec3> = Vec::new();
    let mut tex: Vec<Vec3> = Vec::new();
    let mut faces: Vec<[Corner; 3]> = Vec::new();

    for (lineno, line) in src.lines().enumerate() {
        let mut it = line.split_ascii_whitespace();
        let parsed = match it.next() {
            Some("v") => parse_floats::<3>(&mut it).map(|p| verts.push(Vec3::from(p))),
            Some("vt") => parse_floats::<2>(&mut it).map(|[u, v]| tex.push(Vec3::from([u, v, 0.]))),
            Some("f") => it
                .map(|s| parse_corner(s, verts.len(), tex.len()))
                .collect::<Result<Vec<_>>>()
                .and_then(|corners| match corners[..] {
                    [a, b, c] => {
                        faces.push([a, b, c]);
                        Ok(())
                    }
                    [a, b, c, d] => {
                        faces.push([a, b, d]);
                        faces.push([b, c, d]);
                        Ok(())
                    }
                    _ => Err(anyhow!("faces must have 3 or 4 vertices, got {}", corners.len())),
                }),
            _ => continue,
        };
        parsed.with_context(|| format!("line {}", lineno + 1))?;
    }

    let triangles = faces
        .iter()
        .map(|f| f.map(|c| verts[c.vert]))
        .collect();

    let uvs: Option<Vec<UvTriangle>> = faces
        .iter()
        .map(|f| {
            let [a, b, c] = f.map(|c| c.tex);
            Some([tex[a?], tex[b?], tex[c?]])
        })
        .collect();

    Ok(match uvs {
        Some(uvs) if !faces.is_empty() => Mesh::with_uvs(triangles, uvs),
        _ => Mesh::new(triangles),
    })
}

pub fn load_obj(path: &Path) -> Result<Mesh> {
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mesh = parse_obj(&src).with_context(|| format!("failed to parse {}", path.display()))?;
    log::info!(
        "loaded {} ({} triangles, {})",
        path.display(),
        mesh.len(),
        if mesh.has_uvs() { "textured" } else { "untextured" }
    );
    Ok(mesh)
}
