use crate::mesh::{MeshData, VertexLayout};
use cisco_common::{ConfigError, GridConfig};

/// Build the floor grid: `(cells + 1)^2` vertices at `y = height`, spaced
/// `spacing` apart and centred on the origin, all with +Y normals.
///
/// Each cell contributes two triangles: top-left, bottom-left, top-right and
/// top-right, bottom-left, bottom-right. The geometry depends only on the
/// config, so repeated calls produce identical meshes.
pub fn floor_grid(grid: &GridConfig) -> Result<MeshData, ConfigError> {
    grid.validate()?;

    let side = grid.side();
    let half = grid.cells as f32 * grid.spacing * 0.5;

    let mut vertices = Vec::with_capacity(grid.vertex_count() * VertexLayout::PositionNormal.stride());
    for z in 0..side {
        for x in 0..side {
            vertices.extend_from_slice(&[
                x as f32 * grid.spacing - half,
                grid.height,
                z as f32 * grid.spacing - half,
                0.0,
                1.0,
                0.0,
            ]);
        }
    }

    let mut indices = Vec::with_capacity(grid.index_count());
    for z in 0..grid.cells {
        for x in 0..grid.cells {
            let top_left = z * side + x;
            let top_right = top_left + 1;
            let bottom_left = (z + 1) * side + x;
            let bottom_right = bottom_left + 1;
            indices.extend_from_slice(&[
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }

    Ok(MeshData::from_parts(vertices, indices, VertexLayout::PositionNormal))
}
