//! Structural repair applied after every crossover and mutation.

use crate::schema::{Container, PlacementBox, Solution};

/// Restore container bounds and reduce overlap inside each group.
///
/// Pass one shrinks every tray so it ends at or before the container wall on
/// each axis. A tray that starts at or beyond the wall cannot be fixed by
/// shrinking alone; it is pulled back to the last unit inside the container.
/// This is the only case where repair changes a position instead of a size.
///
/// Pass two walks every pair of trays in a group (same layer only). When two
/// trays overlap on all three axes, the later one is shrunk along the axis with
/// the smallest overlap, by exactly that overlap.
pub fn repair(solution: &mut Solution, container: &Container) {
    let (size_x, size_y, size_z) = container.layer_size();
    let limits = [size_x, size_y, size_z];

    for group in solution.groups_mut() {
        for tray in &mut group.boxes {
            clamp_to_container(tray, limits);
        }

        for j in 0..group.boxes.len() {
            for k in (j + 1)..group.boxes.len() {
                let first = group.boxes[j];
                let later = &mut group.boxes[k];
                if first.layer != later.layer {
                    continue;
                }
                shrink_overlap(&first, later);
            }
        }
    }
}

fn clamp_to_container(tray: &mut PlacementBox, limits: [u32; 3]) {
    let axes = [
        (&mut tray.x, &mut tray.dim_x, limits[0]),
        (&mut tray.y, &mut tray.dim_y, limits[1]),
        (&mut tray.z, &mut tray.dim_z, limits[2]),
    ];
    for (pos, dim, limit) in axes {
        if *pos >= limit {
            *pos = limit - 1;
        }
        if *pos as u64 + *dim as u64 > limit as u64 {
            *dim = (limit - *pos).max(1);
        }
    }
}

/// Shrink `later` along its least-overlapping axis.
fn shrink_overlap(first: &PlacementBox, later: &mut PlacementBox) {
    let overlap = first.overlap(later);
    if overlap.contains(&0) {
        return;
    }

    let axis = (0..3).min_by_key(|&a| overlap[a]).unwrap_or(0);
    let dim = later.dim_mut(axis);
    *dim = dim.saturating_sub(overlap[axis]).max(1);
}
