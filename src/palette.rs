//! Palette: the bounded ordered set of representative colors, with the
//! transparency ordering the output container requires.
//!
//! Entries that need an alpha value form a contiguous suffix; the opaque
//! prefix can then be stored without any per-entry alpha. Within each group
//! entries are ordered by descending usage weight (ties by build order), so
//! identical input always yields a byte-identical table.

extern crate alloc;
use alloc::vec::Vec;

use crate::oklab::{oklaba_to_rgba, rgba_to_oklaba, OKLabA};

#[derive(Debug, Clone)]
struct Entry {
    rgba: rgb::RGBA<u8>,
    laba: OKLabA,
    weight: f32,
    /// Marks the dedicated entry fully transparent pixels map to.
    sentinel: bool,
}

/// A quantized color palette with paired OKLab + alpha values for remapping.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<rgb::RGBA<u8>>,
    labas: Vec<OKLabA>,
    transparent_count: usize,
    transparent_index: Option<u8>,
}

impl Palette {
    /// Build from clustering centroids. When `has_transparent` is set, a
    /// dedicated `(0,0,0,0)` entry is added for fully transparent pixels;
    /// its alpha is exact, never a quantized approximation.
    pub fn from_centroids(centroids: Vec<(OKLabA, f32)>, has_transparent: bool) -> Self {
        let entries = centroids
            .into_iter()
            .map(|(laba, weight)| Entry {
                rgba: oklaba_to_rgba(laba),
                laba,
                weight,
                sentinel: false,
            })
            .collect();
        Self::assemble(entries, has_transparent)
    }

    /// Build from exact sRGBA colors (the few-distinct-colors fast path).
    /// Entry bytes reproduce the input colors exactly.
    pub fn from_exact(colors: Vec<(rgb::RGBA<u8>, f32)>, has_transparent: bool) -> Self {
        let entries = colors
            .into_iter()
            .map(|(rgba, weight)| Entry {
                rgba,
                laba: rgba_to_oklaba(rgba),
                weight,
                sentinel: false,
            })
            .collect();
        Self::assemble(entries, has_transparent)
    }

    fn assemble(mut entries: Vec<Entry>, has_transparent: bool) -> Self {
        if has_transparent {
            entries.push(Entry {
                rgba: rgb::RGBA { r: 0, g: 0, b: 0, a: 0 },
                laba: OKLabA::new(0.0, 0.0, 0.0, 0.0),
                // Sorts to the end of the suffix unless transparency
                // dominates the image
                weight: 0.0,
                sentinel: true,
            });
        }

        // Opaque prefix, then the alpha-bearing suffix; descending usage
        // weight within each group, build order breaking ties.
        let mut order: Vec<usize> = (0..entries.len()).collect();
        order.sort_by(|&ia, &ib| {
            let a = &entries[ia];
            let b = &entries[ib];
            let group_a = a.rgba.a < 255;
            let group_b = b.rgba.a < 255;
            group_a
                .cmp(&group_b)
                .then(b.weight.total_cmp(&a.weight))
                .then(ia.cmp(&ib))
        });

        let mut sorted = Vec::with_capacity(entries.len());
        let mut transparent_index = None;
        for (pos, &src) in order.iter().enumerate() {
            if entries[src].sentinel {
                transparent_index = Some(pos as u8);
            }
            sorted.push(entries[src].clone());
        }
        entries = sorted;

        let transparent_count = entries.iter().filter(|e| e.rgba.a < 255).count();

        Self {
            labas: entries.iter().map(|e| e.laba).collect(),
            entries: entries.into_iter().map(|e| e.rgba).collect(),
            transparent_count,
            transparent_index,
        }
    }

    /// sRGBA palette entries, opaque prefix first.
    pub fn entries(&self) -> &[rgb::RGBA<u8>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of trailing entries that carry an alpha value below 255.
    pub fn transparent_count(&self) -> usize {
        self.transparent_count
    }

    /// Index of the dedicated fully-transparent entry, if the image had any
    /// fully transparent pixels.
    pub fn transparent_index(&self) -> Option<u8> {
        self.transparent_index
    }

    /// Alpha values of the trailing transparent entries, parallel to
    /// `entries()[len - transparent_count..]`.
    pub fn alpha_table(&self) -> Vec<u8> {
        self.entries[self.len() - self.transparent_count..]
            .iter()
            .map(|e| e.a)
            .collect()
    }

    /// Full per-entry alpha sequence (255 for the opaque prefix).
    pub fn alphas(&self) -> Vec<u8> {
        self.entries.iter().map(|e| e.a).collect()
    }

    /// OKLab + alpha value of one entry.
    pub fn laba(&self, index: u8) -> OKLabA {
        self.labas[index as usize]
    }

    /// Nearest entry by squared distance in OKLab + alpha. First minimum
    /// wins, so results are deterministic.
    pub fn nearest(&self, laba: OKLabA) -> u8 {
        let mut best = 0u8;
        let mut best_dist = f32::MAX;
        for (i, entry) in self.labas.iter().enumerate() {
            let d = laba.distance_sq(*entry);
            if d < best_dist {
                best_dist = d;
                best = i as u8;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn opaque(l: f32, weight: f32) -> (OKLabA, f32) {
        (OKLabA::new(l, 0.0, 0.0, 1.0), weight)
    }

    #[test]
    fn empty_without_transparency() {
        let p = Palette::from_centroids(Vec::new(), false);
        assert!(p.is_empty());
        assert_eq!(p.transparent_count(), 0);
        assert!(p.transparent_index().is_none());
    }

    #[test]
    fn only_transparency_still_one_entry() {
        let p = Palette::from_centroids(Vec::new(), true);
        assert_eq!(p.len(), 1);
        assert_eq!(p.transparent_index(), Some(0));
        assert_eq!(p.transparent_count(), 1);
        assert_eq!(p.entries()[0], rgb::RGBA { r: 0, g: 0, b: 0, a: 0 });
    }

    #[test]
    fn opaque_prefix_transparent_suffix() {
        let centroids = vec![
            (OKLabA::new(0.9, 0.0, 0.0, 0.5), 50.0), // semi-transparent, heavy
            opaque(0.2, 10.0),
            (OKLabA::new(0.4, 0.0, 0.0, 0.3), 1.0),
            opaque(0.7, 30.0),
        ];
        let p = Palette::from_centroids(centroids, true);
        assert_eq!(p.len(), 5);

        let alphas = p.alphas();
        let first_transparent = alphas.iter().position(|&a| a < 255).unwrap();
        assert!(
            alphas[first_transparent..].iter().all(|&a| a < 255),
            "transparent entries must be a contiguous suffix: {alphas:?}"
        );
        assert_eq!(p.transparent_count(), 3);
        assert_eq!(p.alpha_table().len(), 3);
    }

    #[test]
    fn weight_orders_within_groups() {
        let centroids = vec![opaque(0.2, 1.0), opaque(0.5, 100.0), opaque(0.8, 10.0)];
        let p = Palette::from_centroids(centroids, false);
        // Heaviest first: L ≈ 0.5, then 0.8, then 0.2
        assert!(p.laba(0).l > 0.4 && p.laba(0).l < 0.6);
        assert!(p.laba(1).l > 0.7);
        assert!(p.laba(2).l < 0.3);
    }

    #[test]
    fn sentinel_alpha_exact_zero() {
        let centroids = vec![opaque(0.5, 10.0), (OKLabA::new(0.1, 0.0, 0.0, 0.01), 5.0)];
        let p = Palette::from_centroids(centroids, true);
        let ti = p.transparent_index().unwrap() as usize;
        assert_eq!(p.entries()[ti].a, 0);
        // The near-transparent centroid rounds to a small nonzero alpha and
        // stays a distinct entry
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn exact_entries_reproduced() {
        let colors = vec![
            (rgb::RGBA { r: 1, g: 2, b: 3, a: 255 }, 5.0),
            (rgb::RGBA { r: 250, g: 128, b: 37, a: 255 }, 9.0),
        ];
        let p = Palette::from_exact(colors, false);
        // Heavier entry first
        assert_eq!(p.entries()[0], rgb::RGBA { r: 250, g: 128, b: 37, a: 255 });
        assert_eq!(p.entries()[1], rgb::RGBA { r: 1, g: 2, b: 3, a: 255 });
    }

    #[test]
    fn nearest_finds_closest() {
        let p = Palette::from_centroids(
            vec![opaque(0.2, 1.0), opaque(0.5, 1.0), opaque(0.8, 1.0)],
            false,
        );
        let idx = p.nearest(OKLabA::new(0.19, 0.0, 0.0, 1.0));
        assert!((p.laba(idx).l - 0.2).abs() < 0.05);
    }

    #[test]
    fn nearest_respects_alpha() {
        let centroids = vec![
            (OKLabA::new(0.5, 0.0, 0.0, 1.0), 1.0),
            (OKLabA::new(0.5, 0.0, 0.0, 0.2), 1.0),
        ];
        let p = Palette::from_centroids(centroids, false);
        let ghost = p.nearest(OKLabA::new(0.5, 0.0, 0.0, 0.25));
        assert!((p.laba(ghost).alpha - 0.2).abs() < 0.01);
    }
}
