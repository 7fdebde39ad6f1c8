//! Binary segmentation and outer boundary tracing.
//!
//! Foreground components are 8-connected, background is 4-connected. Only
//! external boundaries are traced: a component sitting inside a hole of
//! another component is ignored.

use image::{GrayImage, Luma};
use std::f64::consts::PI;

/// Clockwise neighbour offsets in image coordinates (y grows downwards).
const NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Index of west in [`NEIGHBORS`].
const WEST: usize = 4;

/// Corrects the systematic overestimate of 8-connected chain lengths on
/// curved boundaries (Kulpa, 1977). With it a digitized disk measures a
/// circularity close to 1.0.
const CHAIN_LENGTH_CORRECTION: f64 = PI / (8.0 * (std::f64::consts::SQRT_2 - 1.0));

/// Maps `pixel > cutoff` to 255 and everything else to 0.
pub fn binarize(gray: &GrayImage, cutoff: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] > cutoff {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// A closed boundary as the ordered list of its pixel centres.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    points: Vec<(i32, i32)>,
}

impl Contour {
    /// Boundary pixels in tracing order; the last connects back to the first.
    pub fn points(&self) -> &[(i32, i32)] {
        &self.points
    }

    /// Enclosed area by the shoelace formula over the pixel centres.
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let twice: i64 = self
            .closed_steps()
            .map(|((x0, y0), (x1, y1))| i64::from(x0) * i64::from(y1) - i64::from(x1) * i64::from(y0))
            .sum();
        (twice as f64).abs() / 2.0
    }

    /// Corrected chain-code length of the closed boundary.
    pub fn perimeter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        let raw: f64 = self
            .closed_steps()
            .map(|((x0, y0), (x1, y1))| {
                if x0 != x1 && y0 != y1 {
                    std::f64::consts::SQRT_2
                } else {
                    1.0
                }
            })
            .sum();
        raw * CHAIN_LENGTH_CORRECTION
    }

    /// Isoperimetric ratio `4π·area / perimeter²`; `None` when the
    /// perimeter is zero.
    pub fn circularity(&self) -> Option<f64> {
        let perimeter = self.perimeter();
        if perimeter == 0.0 {
            return None;
        }
        Some(4.0 * PI * self.area() / (perimeter * perimeter))
    }

    fn closed_steps(&self) -> impl Iterator<Item = ((i32, i32), (i32, i32))> + '_ {
        self.points
            .iter()
            .copied()
            .zip(self.points.iter().copied().cycle().skip(1))
    }
}

/// Traces the outer boundary of every external foreground component of a
/// binary image (non-zero = foreground).
pub fn external_contours(binary: &GrayImage) -> Vec<Contour> {
    let (width, height) = (binary.width() as i32, binary.height() as i32);
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let index = |x: i32, y: i32| (y * width + x) as usize;
    let foreground = |x: i32, y: i32| binary.get_pixel(x as u32, y as u32).0[0] != 0;

    // Label 8-connected foreground components, remembering the raster-first
    // (topmost, then leftmost) pixel of each one.
    let mut labels = vec![0u32; (width as usize) * (height as usize)];
    let mut starts: Vec<(i32, i32)> = Vec::new();
    let mut sizes: Vec<usize> = Vec::new();
    let mut stack = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if !foreground(x, y) || labels[index(x, y)] != 0 {
                continue;
            }
            starts.push((x, y));
            let label = starts.len() as u32;
            let mut size = 0;
            labels[index(x, y)] = label;
            stack.push((x, y));
            while let Some((cx, cy)) = stack.pop() {
                size += 1;
                for (dx, dy) in NEIGHBORS {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if nx < 0 || ny < 0 || nx >= width || ny >= height {
                        continue;
                    }
                    if foreground(nx, ny) && labels[index(nx, ny)] == 0 {
                        labels[index(nx, ny)] = label;
                        stack.push((nx, ny));
                    }
                }
            }
            sizes.push(size);
        }
    }
    if starts.is_empty() {
        return Vec::new();
    }

    // Background reachable from the image border through 4-connected steps.
    let mut outside = vec![false; labels.len()];
    for y in 0..height {
        for x in 0..width {
            let on_border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
            if on_border && labels[index(x, y)] == 0 && !outside[index(x, y)] {
                outside[index(x, y)] = true;
                stack.push((x, y));
            }
        }
    }
    while let Some((cx, cy)) = stack.pop() {
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let (nx, ny) = (cx + dx, cy + dy);
            if nx < 0 || ny < 0 || nx >= width || ny >= height {
                continue;
            }
            let i = index(nx, ny);
            if labels[i] == 0 && !outside[i] {
                outside[i] = true;
                stack.push((nx, ny));
            }
        }
    }

    // A component is external when it touches the border or the outer
    // background.
    let mut external = vec![false; starts.len() + 1];
    for y in 0..height {
        for x in 0..width {
            let label = labels[index(x, y)] as usize;
            if label == 0 || external[label] {
                continue;
            }
            let on_border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
            let touches_outside = [(1, 0), (-1, 0), (0, 1), (0, -1)].iter().any(|&(dx, dy)| {
                let (nx, ny) = (x + dx, y + dy);
                nx >= 0 && ny >= 0 && nx < width && ny < height && outside[index(nx, ny)]
            });
            external[label] = on_border || touches_outside;
        }
    }

    starts
        .iter()
        .enumerate()
        .filter(|(i, _)| external[i + 1])
        .map(|(i, &start)| {
            let label = i as u32 + 1;
            let belongs = |(x, y): (i32, i32)| {
                x >= 0 && y >= 0 && x < width && y < height && labels[index(x, y)] == label
            };
            trace_boundary(belongs, start, sizes[i])
        })
        .collect()
}

/// Moore-neighbour tracing from the raster-first pixel of a component.
///
/// Stops when the start pixel is about to be left through the same step
/// that began the trace.
fn trace_boundary(
    belongs: impl Fn((i32, i32)) -> bool,
    start: (i32, i32),
    pixel_count: usize,
) -> Contour {
    let step = |(x, y): (i32, i32), dir: usize| (x + NEIGHBORS[dir].0, y + NEIGHBORS[dir].1);

    let mut points = vec![start];
    let mut current = start;
    let mut backtrack = WEST;
    let mut first_step = None;

    for _ in 0..(4 * pixel_count + 8) {
        let found = (1..8).find_map(|k| {
            let candidate = step(current, (backtrack + k) % 8);
            belongs(candidate).then_some((candidate, (backtrack + k - 1) % 8))
        });
        // An isolated pixel has no neighbours to walk to.
        let Some((next, checked_before)) = found else {
            break;
        };

        if current == start {
            match first_step {
                None => first_step = Some(next),
                Some(first) if first == next => {
                    points.pop();
                    break;
                }
                Some(_) => {}
            }
        }

        // The last background pixel examined becomes the new backtrack
        // point; it is always a neighbour of `next`.
        let behind = step(current, checked_before);
        let offset = (behind.0 - next.0, behind.1 - next.1);
        backtrack = NEIGHBORS
            .iter()
            .position(|&d| d == offset)
            .unwrap_or(WEST);

        points.push(next);
        current = next;
    }

    Contour { points }
}
