//! Palette reduction for GIF frames.
//!
//! GIF frames carry at most 256 colors. [`quantize`] turns an RGBA buffer
//! into a palette plus one index per pixel. Alpha is not preserved: screen
//! captures are opaque and every output pixel is drawn.
//!
//! Frames that already use 256 colors or fewer get an exact palette no
//! matter which algorithm is configured. Otherwise:
//! - Octree: color octree, deepest/lightest branches folded until 256
//!   leaves remain.
//! - NeuQuant: the `gif` crate's neural-net quantizer.

use std::collections::{HashMap, HashSet};

use crate::config::QuantizerAlgorithm;
use crate::frame::CHANNELS;
use crate::similarity::sample_step;

/// Colors in a GIF color table
pub const MAX_COLORS: usize = 256;

const OCTREE_DEPTH: usize = 8;

/// A frame reduced to a color table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFrame {
    /// RGB triples, at most [`MAX_COLORS`] entries
    pub palette: Vec<u8>,
    /// One palette index per pixel
    pub indices: Vec<u8>,
}

impl IndexedFrame {
    pub fn color_count(&self) -> usize {
        self.palette.len() / 3
    }

    /// RGB color of the pixel at `index`
    pub fn color_at(&self, index: usize) -> Option<[u8; 3]> {
        let slot = *self.indices.get(index)? as usize * 3;
        let c = self.palette.get(slot..slot + 3)?;
        Some([c[0], c[1], c[2]])
    }
}

/// Reduce an RGBA buffer to an indexed frame.
///
/// `quality` ranges 1 (best) to 20 (fastest) and controls how many pixels
/// feed the quantizer.
pub fn quantize(
    rgba: &[u8],
    width: u16,
    height: u16,
    algorithm: QuantizerAlgorithm,
    quality: u8,
) -> IndexedFrame {
    if let Some(exact) = exact_palette(rgba) {
        return exact;
    }

    match algorithm {
        QuantizerAlgorithm::Octree => quantize_octree(rgba, quality),
        QuantizerAlgorithm::NeuQuant => quantize_neuquant(rgba, width, height, quality),
    }
}

/// Build a palette holding exactly the colors of the frame, if they fit.
fn exact_palette(rgba: &[u8]) -> Option<IndexedFrame> {
    let mut lookup: HashMap<[u8; 3], u8> = HashMap::new();
    let mut palette = Vec::new();
    let mut indices = Vec::with_capacity(rgba.len() / CHANNELS);

    for px in rgba.chunks_exact(CHANNELS) {
        let rgb = [px[0], px[1], px[2]];
        let index = match lookup.get(&rgb) {
            Some(&index) => index,
            None => {
                if lookup.len() == MAX_COLORS {
                    return None;
                }
                let index = lookup.len() as u8;
                lookup.insert(rgb, index);
                palette.extend_from_slice(&rgb);
                index
            }
        };
        indices.push(index);
    }

    Some(IndexedFrame { palette, indices })
}

fn quantize_neuquant(rgba: &[u8], width: u16, height: u16, quality: u8) -> IndexedFrame {
    let mut opaque = rgba.to_vec();
    for px in opaque.chunks_exact_mut(CHANNELS) {
        px[3] = 255;
    }

    // gif accepts speeds 1..=30 with the same "lower is better" meaning
    let speed = i32::from(quality.clamp(1, 30));
    let frame = gif::Frame::from_rgba_speed(width, height, &mut opaque, speed);

    IndexedFrame {
        palette: frame.palette.unwrap_or_default(),
        indices: frame.buffer.into_owned(),
    }
}

fn quantize_octree(rgba: &[u8], quality: u8) -> IndexedFrame {
    let stride = usize::from(quality.max(1));
    let mut tree = Octree::new();
    for px in rgba.chunks_exact(CHANNELS).step_by(stride) {
        tree.insert([px[0], px[1], px[2]]);
    }
    let palette = tree.build_palette();

    let mut fallback: HashMap<[u8; 3], u8> = HashMap::new();
    let indices = rgba
        .chunks_exact(CHANNELS)
        .map(|px| {
            let rgb = [px[0], px[1], px[2]];
            tree.lookup(rgb).unwrap_or_else(|| {
                *fallback
                    .entry(rgb)
                    .or_insert_with(|| nearest_color(&palette, rgb))
            })
        })
        .collect();

    IndexedFrame { palette, indices }
}

/// Index of the palette entry closest to `rgb` (squared RGB distance)
pub fn nearest_color(palette: &[u8], rgb: [u8; 3]) -> u8 {
    palette
        .chunks_exact(3)
        .enumerate()
        .min_by_key(|(_, c)| {
            let dr = c[0] as i32 - rgb[0] as i32;
            let dg = c[1] as i32 - rgb[1] as i32;
            let db = c[2] as i32 - rgb[2] as i32;
            dr * dr + dg * dg + db * db
        })
        .map(|(i, _)| i as u8)
        .unwrap_or(0)
}

/// Percentage of sampled pixels whose exact color is present in `palette`.
pub fn palette_coverage(rgba: &[u8], palette: &[u8]) -> f64 {
    let total_pixels = rgba.len() / CHANNELS;
    if total_pixels == 0 || palette.is_empty() {
        return 0.0;
    }

    let colors: HashSet<[u8; 3]> = palette.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
    let step = sample_step(total_pixels);

    let mut sampled = 0usize;
    let mut covered = 0usize;
    for pixel in (0..total_pixels).step_by(step) {
        let offset = pixel * CHANNELS;
        let rgb = [rgba[offset], rgba[offset + 1], rgba[offset + 2]];
        if colors.contains(&rgb) {
            covered += 1;
        }
        sampled += 1;
    }

    covered as f64 / sampled as f64 * 100.0
}

/// Index every pixel against an existing palette
pub fn map_to_palette(rgba: &[u8], palette: &[u8]) -> IndexedFrame {
    let mut cache: HashMap<[u8; 3], u8> = palette
        .chunks_exact(3)
        .enumerate()
        .map(|(i, c)| ([c[0], c[1], c[2]], i as u8))
        .collect();

    let indices = rgba
        .chunks_exact(CHANNELS)
        .map(|px| {
            let rgb = [px[0], px[1], px[2]];
            *cache
                .entry(rgb)
                .or_insert_with(|| nearest_color(palette, rgb))
        })
        .collect();

    IndexedFrame {
        palette: palette.to_vec(),
        indices,
    }
}

// ============================================================================
// Octree
// ============================================================================

#[derive(Debug, Default, Clone)]
struct OctreeNode {
    /// Pixels that passed through this node
    weight: u64,
    red: u64,
    green: u64,
    blue: u64,
    /// Pixels accumulated in this node once it is a leaf
    count: u64,
    children: [Option<usize>; 8],
    leaf: bool,
    palette_index: u8,
}

/// Arena-backed color octree. Node 0 is the root.
struct Octree {
    nodes: Vec<OctreeNode>,
    /// Internal nodes per depth, candidates for folding
    reducible: [Vec<usize>; OCTREE_DEPTH],
    leaf_count: usize,
}

fn child_slot(rgb: [u8; 3], depth: usize) -> usize {
    let shift = 7 - depth;
    let r = ((rgb[0] >> shift) & 1) as usize;
    let g = ((rgb[1] >> shift) & 1) as usize;
    let b = ((rgb[2] >> shift) & 1) as usize;
    (r << 2) | (g << 1) | b
}

impl Octree {
    fn new() -> Self {
        Self {
            nodes: vec![OctreeNode::default()],
            reducible: Default::default(),
            leaf_count: 0,
        }
    }

    fn insert(&mut self, rgb: [u8; 3]) {
        let mut node = 0;
        let mut depth = 0;
        loop {
            self.nodes[node].weight += 1;
            if self.nodes[node].leaf {
                let n = &mut self.nodes[node];
                n.red += rgb[0] as u64;
                n.green += rgb[1] as u64;
                n.blue += rgb[2] as u64;
                n.count += 1;
                break;
            }

            let slot = child_slot(rgb, depth);
            let next = match self.nodes[node].children[slot] {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    let leaf = depth + 1 == OCTREE_DEPTH;
                    self.nodes.push(OctreeNode {
                        leaf,
                        ..Default::default()
                    });
                    if leaf {
                        self.leaf_count += 1;
                    } else {
                        self.reducible[depth + 1].push(child);
                    }
                    self.nodes[node].children[slot] = Some(child);
                    child
                }
            };
            node = next;
            depth += 1;
        }

        while self.leaf_count > MAX_COLORS {
            if !self.reduce() {
                break;
            }
        }
    }

    /// Fold the lightest internal node of the deepest populated level into
    /// a single leaf. Returns false when nothing can be folded.
    fn reduce(&mut self) -> bool {
        let Some(depth) = (1..OCTREE_DEPTH).rev().find(|d| !self.reducible[*d].is_empty()) else {
            return false;
        };

        let candidates = &mut self.reducible[depth];
        let Some(pos) = candidates
            .iter()
            .enumerate()
            .min_by_key(|(_, idx)| self.nodes[**idx].weight)
            .map(|(pos, _)| pos)
        else {
            return false;
        };
        let node = candidates.swap_remove(pos);

        let mut removed_leaves = 0;
        let (mut red, mut green, mut blue, mut count) = (0, 0, 0, 0);
        for slot in 0..8 {
            if let Some(child) = self.nodes[node].children[slot].take() {
                let c = &self.nodes[child];
                red += c.red;
                green += c.green;
                blue += c.blue;
                count += c.count;
                removed_leaves += 1;
            }
        }

        let n = &mut self.nodes[node];
        n.red = red;
        n.green = green;
        n.blue = blue;
        n.count = count;
        n.leaf = true;
        self.leaf_count = self.leaf_count + 1 - removed_leaves;
        true
    }

    /// Average the leaves into a palette and remember each leaf's slot.
    fn build_palette(&mut self) -> Vec<u8> {
        let mut palette = Vec::with_capacity(self.leaf_count * 3);
        let mut stack = vec![0usize];
        while let Some(node) = stack.pop() {
            if self.nodes[node].leaf {
                let n = &mut self.nodes[node];
                let count = n.count.max(1);
                n.palette_index = (palette.len() / 3) as u8;
                palette.push((n.red / count) as u8);
                palette.push((n.green / count) as u8);
                palette.push((n.blue / count) as u8);
                continue;
            }
            stack.extend(self.nodes[node].children.iter().rev().flatten());
        }
        palette
    }

    /// Palette slot of the leaf `rgb` falls into, if the tree covers it
    fn lookup(&self, rgb: [u8; 3]) -> Option<u8> {
        let mut node = 0;
        let mut depth = 0;
        loop {
            let n = &self.nodes[node];
            if n.leaf {
                return Some(n.palette_index);
            }
            node = n.children[child_slot(rgb, depth)]?;
            depth += 1;
        }
    }
}
