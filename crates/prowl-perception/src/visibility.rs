//! Line-of-sight field of view.
//!
//! Visibility is computed in two passes:
//!
//! 1. [`vision_bounds`] collects every coordinate inside a digital circle of
//!    radius `r` around the viewer, clamped to the grid.
//! 2. [`visible_tiles`] casts a [`raster_line`] from the viewer to each of
//!    those coordinates and walks it outward.  Open tiles along the ray are
//!    visible; the first wall is visible too, and the ray stops there.
//!
//! Occlusion is decided per ray, so this is an approximation of true shadow
//! casting: a tile can be reached by one ray while another ray to it is
//! blocked.  Whichever rasterised line reaches it first wins.
//!
//! # Example
//!
//! ```rust
//! use prowl_perception::{grid::Grid, visibility::visible_tiles};
//! use prowl_types::Position;
//!
//! let grid = Grid::parse("..#..").unwrap();
//! let seen = visible_tiles(Position::new(0, 0), 4.0, &grid);
//!
//! assert!(seen.contains(&Position::new(2, 0)));  // the wall itself
//! assert!(!seen.contains(&Position::new(3, 0))); // hidden behind it
//! ```

use std::collections::HashSet;

use prowl_types::Position;

use crate::grid::Grid;

/// Every in-grid coordinate within `radius` of `center`, deduplicated.
///
/// Each scanline `y` in `[ceil(cy - r), floor(cy + r)]` contributes the span
/// `[ceil(cx - w), floor(cx + w)]` with `w = sqrt(r² - dy²)`.  The transposed
/// octant sweep over `k ∈ [0, floor(r·√½)]` then adds the eight symmetric
/// points `(cx ± d, cy ± k)` and `(cx ± k, cy ± d)` with
/// `d = floor(sqrt(r² - k²))`, which fills the gaps near the poles on coarse
/// radii.  Coordinates outside the grid are clamped onto its border.
///
/// Rows and spans are cut to the grid before they are walked, so the cost is
/// bounded by the grid area rather than by `r²`.  For a viewer standing on the
/// grid this yields the same set as clamping every point of the full disc.
pub fn vision_bounds(center: Position, radius: f64, grid: &Grid) -> Vec<Position> {
    if !(radius >= 0.0) {
        return vec![grid.clamp(center)];
    }

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut push = |p: Position| {
        let p = grid.clamp(p);
        if seen.insert(p) {
            out.push(p);
        }
    };

    let (cx, cy) = (f64::from(center.x), f64::from(center.y));
    let r2 = radius * radius;

    let (max_x, max_y) = (grid.width() as i32 - 1, grid.height() as i32 - 1);

    let top = ((cy - radius).ceil() as i32).max(0);
    let bottom = ((cy + radius).floor() as i32).min(max_y);
    for y in top..=bottom {
        let dy = f64::from(y) - cy;
        let half = (r2 - dy * dy).max(0.0).sqrt();
        let left = ((cx - half).ceil() as i32).max(0);
        let right = ((cx + half).floor() as i32).min(max_x);
        for x in left..=right {
            push(Position::new(x, y));
        }
    }

    // Past the longer side every octant point clamps onto a border tile the
    // scanlines already produced.
    let k_max = ((radius * 0.5_f64.sqrt()).floor() as i32).min(max_x.max(max_y) + 1);
    for k in 0..=k_max {
        let d = (r2 - f64::from(k * k)).max(0.0).sqrt().floor() as i32;
        let (x, y) = (center.x, center.y);
        for p in [
            Position::new(x - d, y + k),
            Position::new(x + d, y + k),
            Position::new(x - d, y - k),
            Position::new(x + d, y - k),
            Position::new(x + k, y - d),
            Position::new(x + k, y + d),
            Position::new(x - k, y - d),
            Position::new(x - k, y + d),
        ] {
            push(p);
        }
    }

    out
}

/// Bresenham rasterisation of the segment `from → to`, both ends included,
/// ordered starting at `from`.
pub fn raster_line(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);

    let mut line = Vec::with_capacity((dx - dy) as usize + 1);
    loop {
        line.push(Position::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    line
}

/// Tiles an observer at `center` with vision `radius` can currently see on
/// `grid`.
///
/// The result is deduplicated and ordered by first discovery.  Walls that
/// stop a ray are included; nothing behind them on that ray is.
pub fn visible_tiles(center: Position, radius: f64, grid: &Grid) -> Vec<Position> {
    let mut visible = Vec::new();
    let mut seen = HashSet::new();

    for target in vision_bounds(center, radius, grid) {
        for p in raster_line(center, target) {
            let Some(tile) = grid.get(p) else {
                break;
            };
            if seen.insert(p) {
                visible.push(p);
            }
            if tile.is_wall {
                break;
            }
        }
    }

    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within(center: Position, p: Position, r: f64) -> bool {
        let (dx, dy) = (f64::from(p.x - center.x), f64::from(p.y - center.y));
        dx * dx + dy * dy <= r * r
    }

    // ── raster_line ─────────────────────────────────────────────────────────

    #[test]
    fn raster_line_is_contiguous_and_inclusive() {
        let from = Position::new(1, 7);
        let to = Position::new(9, 2);
        let line = raster_line(from, to);
        assert_eq!(line.first(), Some(&from));
        assert_eq!(line.last(), Some(&to));
        for pair in line.windows(2) {
            assert!((pair[0].x - pair[1].x).abs() <= 1);
            assert!((pair[0].y - pair[1].y).abs() <= 1);
        }
    }

    #[test]
    fn raster_line_to_self_is_single_point() {
        let p = Position::new(3, 3);
        assert_eq!(raster_line(p, p), vec![p]);
    }

    #[test]
    fn raster_line_horizontal() {
        let line = raster_line(Position::new(4, 0), Position::new(1, 0));
        let xs: Vec<i32> = line.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![4, 3, 2, 1]);
    }

    // ── vision_bounds ───────────────────────────────────────────────────────

    #[test]
    fn bounds_cover_the_disc_and_nothing_outside_its_box() {
        let grid = Grid::open(30, 30).unwrap();
        let c = Position::new(15, 15);
        let r = 7.5;
        let bounds: HashSet<Position> = vision_bounds(c, r, &grid).into_iter().collect();
        for t in grid.tiles() {
            if within(c, t.position, r) {
                assert!(bounds.contains(&t.position), "missing {}", t.position);
            }
        }
        for p in &bounds {
            assert!((p.x - c.x).abs() <= 7 && (p.y - c.y).abs() <= 7);
        }
    }

    #[test]
    fn bounds_are_clamped_into_grid() {
        let grid = Grid::open(5, 5).unwrap();
        for p in vision_bounds(Position::new(0, 0), 6.0, &grid) {
            assert!(grid.in_bounds(p), "{p} escaped the grid");
        }
    }

    #[test]
    fn huge_radius_is_bounded_by_the_grid() {
        let grid = Grid::open(5, 5).unwrap();
        let c = Position::new(2, 2);
        let huge: HashSet<Position> = vision_bounds(c, 4000.0, &grid).into_iter().collect();
        let modest: HashSet<Position> = vision_bounds(c, 10.0, &grid).into_iter().collect();
        assert_eq!(huge.len(), 25);
        assert_eq!(huge, modest);
        assert_eq!(visible_tiles(c, 4000.0, &grid).len(), 25);
    }

    #[test]
    fn clipped_rows_match_clamping_the_full_disc() {
        let grid = Grid::open(7, 4).unwrap();
        let c = Position::new(1, 3);
        let r = 5.5;
        let clipped: HashSet<Position> = vision_bounds(c, r, &grid).into_iter().collect();
        let mut expected = HashSet::new();
        for y in -6..=9 {
            for x in -6..=8 {
                let p = Position::new(x, y);
                if within(c, p, r) {
                    expected.insert(grid.clamp(p));
                }
            }
        }
        assert_eq!(clipped, expected);
    }

    #[test]
    fn negative_radius_sees_only_own_tile() {
        let grid = Grid::open(5, 5).unwrap();
        let c = Position::new(2, 2);
        assert_eq!(vision_bounds(c, -1.0, &grid), vec![c]);
        assert_eq!(visible_tiles(c, f64::NAN, &grid), vec![c]);
    }

    // ── visible_tiles ───────────────────────────────────────────────────────

    #[test]
    fn open_ground_sees_everything_in_range() {
        let grid = Grid::open(20, 20).unwrap();
        let c = Position::new(6, 9);
        let r = 5.0;
        let seen: HashSet<Position> = visible_tiles(c, r, &grid).into_iter().collect();
        for t in grid.tiles() {
            let p = t.position;
            if within(c, p, r) {
                assert!(seen.contains(&p), "{p} should be visible");
            }
            if (p.x - c.x).abs() > 5 || (p.y - c.y).abs() > 5 {
                assert!(!seen.contains(&p), "{p} is outside the bounding box");
            }
        }
    }

    #[test]
    fn wall_in_corridor_hides_everything_behind_it() {
        let grid = Grid::parse("...#....").unwrap();
        let seen = visible_tiles(Position::new(0, 0), 7.5, &grid);
        assert!(seen.contains(&Position::new(3, 0)));
        for x in 4..8 {
            assert!(!seen.contains(&Position::new(x, 0)));
        }
    }

    #[test]
    fn single_wall_occludes_far_tile_on_open_plane() {
        let mut layout = vec![".........."; 11];
        layout[5] = "...#......";
        let grid = Grid::parse(&layout.join("\n")).unwrap();
        let seen = visible_tiles(Position::new(0, 5), 7.5, &grid);
        assert!(seen.contains(&Position::new(3, 5)));
        assert!(!seen.contains(&Position::new(6, 5)));
        assert!(!seen.contains(&Position::new(7, 5)));
        // Off-axis tiles remain visible.
        assert!(seen.contains(&Position::new(6, 8)));
    }

    #[test]
    fn results_are_deduplicated() {
        let grid = Grid::open(12, 12).unwrap();
        let seen = visible_tiles(Position::new(5, 5), 4.0, &grid);
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), seen.len());
    }
}
