//! Plain-text OBJ mesh reader.
//!
//! Recognised records: `v x y z`, `vn x y z`, `vt u v`, `f c1 c2 c3 ...`.
//! A face corner is `p`, `p/t`, `p//n` or `p/t/n`. Indices are 1-based;
//! negative indices count back from the most recent element. Every face
//! corner becomes its own interleaved vertex (no sharing), so the index
//! buffer is always `0..N`.
//!
//! Anything else (`o`, `g`, `s`, `usemtl`, `mtllib`, comments) is skipped.

use crate::mesh::{MeshData, VertexLayout};
use glam::{Vec2, Vec3};
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Errors from reading an OBJ mesh. Line numbers are 1-based.
#[derive(Debug, thiserror::Error)]
pub enum ObjError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),
    #[error("line {line}: `{record}` needs {expected} values, found {found}")]
    MissingField {
        line: usize,
        record: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: malformed number `{token}`")]
    MalformedNumber { line: usize, token: String },
    #[error("line {line}: malformed face corner `{token}`")]
    BadFaceCorner { line: usize, token: String },
    #[error("line {line}: {kind} index {index} out of range ({available} defined)")]
    IndexOutOfRange {
        line: usize,
        kind: &'static str,
        index: i64,
        available: usize,
    },
    #[error("line {line}: face needs at least 3 corners, found {found}")]
    DegenerateFace { line: usize, found: usize },
    #[error("mesh contains no faces")]
    NoFaces,
}

#[derive(Debug, Clone, Copy)]
struct Corner {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

#[derive(Debug, Default)]
struct ObjParser {
    line: usize,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    texcoords: Vec<Vec2>,
    /// Triangulated faces, three corners each.
    triangles: Vec<[Corner; 3]>,
    skipped: usize,
}

impl ObjParser {
    fn parse_line(&mut self, text: &str) -> Result<(), ObjError> {
        let text = match text.find('#') {
            Some(comment) => &text[..comment],
            None => text,
        };
        let mut tokens = text.split_whitespace();
        let Some(record) = tokens.next() else {
            return Ok(());
        };

        match record {
            "v" => {
                let [x, y, z] = self.floats::<3>("v", &mut tokens)?;
                self.positions.push(Vec3::new(x, y, z));
            }
            "vn" => {
                let [x, y, z] = self.floats::<3>("vn", &mut tokens)?;
                self.normals.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = self.floats::<2>("vt", &mut tokens)?;
                self.texcoords.push(Vec2::new(u, v));
            }
            "f" => {
                let corners = tokens
                    .map(|token| self.corner(token))
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.len() < 3 {
                    return Err(ObjError::DegenerateFace {
                        line: self.line,
                        found: corners.len(),
                    });
                }
                // Fan around the first corner; a triangle yields itself.
                for i in 1..corners.len() - 1 {
                    self.triangles.push([corners[0], corners[i], corners[i + 1]]);
                }
            }
            other => {
                self.skipped += 1;
                tracing::trace!(line = self.line, record = other, "skipping OBJ record");
            }
        }
        Ok(())
    }

    fn floats<const N: usize>(
        &self,
        record: &'static str,
        tokens: &mut std::str::SplitWhitespace<'_>,
    ) -> Result<[f32; N], ObjError> {
        let mut out = [0.0; N];
        for (found, slot) in out.iter_mut().enumerate() {
            let token = tokens.next().ok_or(ObjError::MissingField {
                line: self.line,
                record,
                expected: N,
                found,
            })?;
            *slot = self.number(token)?;
        }
        Ok(out)
    }

    fn number(&self, token: &str) -> Result<f32, ObjError> {
        token
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ObjError::MalformedNumber {
                line: self.line,
                token: token.to_string(),
            })
    }

    fn corner(&self, token: &str) -> Result<Corner, ObjError> {
        let bad = || ObjError::BadFaceCorner {
            line: self.line,
            token: token.to_string(),
        };
        let mut parts = token.split('/');
        let position = parts.next().filter(|p| !p.is_empty()).ok_or_else(bad)?;
        let texcoord = parts.next().filter(|p| !p.is_empty());
        let normal = parts.next().filter(|p| !p.is_empty());
        if parts.next().is_some() {
            return Err(bad());
        }

        Ok(Corner {
            position: self.resolve(position, "position", self.positions.len(), token)?,
            texcoord: texcoord
                .map(|t| self.resolve(t, "texcoord", self.texcoords.len(), token))
                .transpose()?,
            normal: normal
                .map(|n| self.resolve(n, "normal", self.normals.len(), token))
                .transpose()?,
        })
    }

    /// Turn a 1-based (or negative, relative) index into a 0-based one.
    fn resolve(
        &self,
        raw: &str,
        kind: &'static str,
        available: usize,
        token: &str,
    ) -> Result<usize, ObjError> {
        let index: i64 = raw.parse().map_err(|_| ObjError::BadFaceCorner {
            line: self.line,
            token: token.to_string(),
        })?;
        let resolved = match index {
            i if i > 0 => i - 1,
            i if i < 0 => available as i64 + i,
            _ => -1,
        };
        if resolved < 0 || resolved as usize >= available {
            return Err(ObjError::IndexOutOfRange {
                line: self.line,
                kind,
                index,
                available,
            });
        }
        Ok(resolved as usize)
    }

    fn finish(self) -> Result<MeshData, ObjError> {
        if self.triangles.is_empty() {
            return Err(ObjError::NoFaces);
        }

        let layout = if self.texcoords.is_empty() {
            VertexLayout::PositionNormal
        } else {
            VertexLayout::PositionNormalUv
        };
        let vertex_count = self.triangles.len() * 3;
        let mut vertices = Vec::with_capacity(vertex_count * layout.stride());

        for tri in &self.triangles {
            let face_normal = if tri.iter().any(|c| c.normal.is_none()) {
                Some(self.face_normal(tri))
            } else {
                None
            };
            for corner in tri {
                let p = self.positions[corner.position];
                let n = corner
                    .normal
                    .map(|i| self.normals[i])
                    .or(face_normal)
                    .unwrap_or(Vec3::Y);
                vertices.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z]);
                if layout.has_texcoords() {
                    let uv = corner.texcoord.map(|i| self.texcoords[i]).unwrap_or(Vec2::ZERO);
                    vertices.extend_from_slice(&[uv.x, uv.y]);
                }
            }
        }

        let indices = (0..vertex_count as u32).collect();
        Ok(MeshData::from_parts(vertices, indices, layout))
    }

    fn face_normal(&self, tri: &[Corner; 3]) -> Vec3 {
        let [a, b, c] = tri.map(|corner| self.positions[corner.position]);
        let n = (b - a).cross(c - a).normalize_or_zero();
        if n == Vec3::ZERO { Vec3::Y } else { n }
    }
}

/// Parse OBJ text from any buffered reader.
pub fn read_obj<R: BufRead>(reader: R) -> Result<MeshData, ObjError> {
    let mut parser = ObjParser::default();
    for line in reader.lines() {
        parser.line += 1;
        parser.parse_line(&line?)?;
    }
    if parser.skipped > 0 {
        tracing::debug!(skipped = parser.skipped, "ignored unrecognised OBJ records");
    }
    parser.finish()
}

/// Parse OBJ text held in memory.
pub fn parse_obj(source: &str) -> Result<MeshData, ObjError> {
    read_obj(source.as_bytes())
}

/// Open and parse an OBJ file.
pub fn load_obj(path: impl AsRef<Path>) -> Result<MeshData, ObjError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| ObjError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = read_obj(std::io::BufReader::new(file))?;
    tracing::debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        texcoords = mesh.has_texcoords(),
        "loaded OBJ mesh"
    );
    Ok(mesh)
}
