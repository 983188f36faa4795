//! Property-based tests for gifrec-core
//!
//! These tests verify pipeline stage properties using proptest.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::config::QuantizerAlgorithm;
    use crate::frame::{CanonicalFrame, CHANNELS};
    use crate::quantize::{quantize, MAX_COLORS};
    use crate::scaler::{scale, scaled_dimensions};
    use crate::similarity::similarity;

    fn arb_frame(max_side: u32) -> impl Strategy<Value = CanonicalFrame> {
        (1..=max_side, 1..=max_side).prop_flat_map(|(w, h)| {
            prop::collection::vec(any::<u8>(), (w * h) as usize * CHANNELS)
                .prop_map(move |pixels| CanonicalFrame {
                    pixels,
                    width: w,
                    height: h,
                })
        })
    }

    // Scaling output geometry
    //
    // A frame wider than the bound comes out exactly at the bound, with a
    // height of floor(h * max / w) but never 0. Narrower frames pass through.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_scale_geometry(frame in arb_frame(48), max_width in 1u32..64) {
            let (w, h) = frame.dimensions();
            let scaled = scale(frame.clone(), max_width);

            if w > max_width {
                prop_assert_eq!(scaled.width, max_width);
                prop_assert_eq!(scaled.height, ((h * max_width) / w).max(1));
            } else {
                prop_assert_eq!(&scaled, &frame);
            }
            prop_assert_eq!(scaled.dimensions(), scaled_dimensions(w, h, max_width));
            prop_assert_eq!(
                scaled.pixels.len(),
                CanonicalFrame::buffer_len(scaled.width, scaled.height)
            );
        }

        #[test]
        fn test_scale_idempotent(frame in arb_frame(48), max_width in 1u32..64) {
            let once = scale(frame, max_width);
            let twice = scale(once.clone(), max_width);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn test_scaled_pixels_come_from_source(frame in arb_frame(32), max_width in 1u32..32) {
            let scaled = scale(frame.clone(), max_width);
            for chunk in scaled.pixels.chunks(CHANNELS) {
                let found = frame.pixels.chunks(CHANNELS).any(|p| p == chunk);
                prop_assert!(found);
            }
        }
    }

    // Similarity bounds
    //
    // Scores stay within 0..=100, a frame is always 100% similar to itself,
    // and the measure is symmetric.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_similarity_bounds(
            a in prop::collection::vec(any::<u8>(), 0..2048),
            b in prop::collection::vec(any::<u8>(), 0..2048)
        ) {
            let score = similarity(&a, &b);
            prop_assert!((0.0..=100.0).contains(&score));
            prop_assert_eq!(score, similarity(&b, &a));
        }

        #[test]
        fn test_similarity_reflexive(frame in arb_frame(64)) {
            prop_assert_eq!(similarity(&frame.pixels, &frame.pixels), 100.0);
        }
    }

    // Quantizer output shape
    //
    // At most 256 colors, one index per pixel, every index points into the
    // palette. With few enough colors, every pixel is reproduced exactly.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn test_octree_indices_in_range(frame in arb_frame(24), quality in 1u8..=20) {
            let indexed = quantize(
                &frame.pixels,
                frame.width as u16,
                frame.height as u16,
                QuantizerAlgorithm::Octree,
                quality,
            );
            prop_assert!(indexed.color_count() >= 1);
            prop_assert!(indexed.color_count() <= MAX_COLORS);
            prop_assert_eq!(indexed.palette.len() % 3, 0);
            prop_assert_eq!(indexed.indices.len(), frame.pixel_count());
            for &index in &indexed.indices {
                prop_assert!((index as usize) < indexed.color_count());
            }
        }

        #[test]
        fn test_few_colors_are_exact(
            colors in prop::collection::vec(any::<[u8; 3]>(), 1..16),
            picks in prop::collection::vec(any::<prop::sample::Index>(), 64)
        ) {
            let mut pixels = Vec::with_capacity(64 * CHANNELS);
            for pick in &picks {
                let [r, g, b] = colors[pick.index(colors.len())];
                pixels.extend_from_slice(&[r, g, b, 255]);
            }

            for algorithm in [QuantizerAlgorithm::Octree, QuantizerAlgorithm::NeuQuant] {
                let indexed = quantize(&pixels, 8, 8, algorithm, 10);
                for i in 0..indexed.indices.len() {
                    let expected = [pixels[i * 4], pixels[i * 4 + 1], pixels[i * 4 + 2]];
                    prop_assert_eq!(indexed.color_at(i), Some(expected));
                }
            }
        }
    }
}
