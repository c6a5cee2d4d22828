//! CPU rasterisation of the full-screen shader pattern.

use glam::Vec2;
use nannou::prelude::*;
use tonescape_engine::modes::shader::shade;
use tonescape_engine::scene::ShaderUniforms;

/// Columns of the sampling grid; rows follow the window aspect
pub const GRID_COLUMNS: usize = 96;

/// Cell centres in uv space (0-1, origin bottom-left) for a `w` x `h` window
pub fn cell_grid(w: f32, h: f32) -> (usize, usize, Vec<Vec2>) {
    let cols = GRID_COLUMNS;
    let rows = ((cols as f32 * h / w.max(1.0)).round() as usize).max(1);
    let centres = (0..rows)
        .flat_map(|row| {
            (0..cols).map(move |col| {
                Vec2::new(
                    (col as f32 + 0.5) / cols as f32,
                    (row as f32 + 0.5) / rows as f32,
                )
            })
        })
        .collect();
    (cols, rows, centres)
}

pub fn draw_shader_quad(draw: &Draw, bounds: Rect, uniforms: ShaderUniforms) {
    let (cols, rows, centres) = cell_grid(bounds.w(), bounds.h());
    let cell_w = bounds.w() / cols as f32;
    let cell_h = bounds.h() / rows as f32;

    for uv in centres {
        let c = shade(uv, uniforms.time, uniforms.audio_data);
        if c.r + c.g + c.b < 1e-3 {
            continue;
        }
        let x = bounds.left() + uv.x * bounds.w();
        let y = bounds.bottom() + uv.y * bounds.h();
        draw.rect()
            .x_y(x, y)
            .w_h(cell_w + 0.5, cell_h + 0.5)
            .color(rgb(c.r, c.g, c.b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_follows_aspect() {
        let (cols, rows, centres) = cell_grid(1600.0, 800.0);
        assert_eq!(cols, GRID_COLUMNS);
        assert_eq!(rows, GRID_COLUMNS / 2);
        assert_eq!(centres.len(), cols * rows);
        for uv in centres {
            assert!(uv.x > 0.0 && uv.x < 1.0);
            assert!(uv.y > 0.0 && uv.y < 1.0);
        }
    }

    #[test]
    fn test_degenerate_window_keeps_one_row() {
        let (_, rows, _) = cell_grid(0.0, 0.0);
        assert_eq!(rows, 1);
    }
}
