//! Property-based tests for the invariants of the learning components.
//!
//! Run with: `cargo test --test properties`

use dendrite::prelude::*;
use proptest::prelude::*;
use std::collections::HashSet;

/// Helper to create an SDR from arbitrary (unsorted, duplicated, out of range) indices
fn make_sdr(size: u32, indices: &[u32]) -> Sdr {
    let mut sorted: Vec<u32> = indices.iter().copied().filter(|&i| i < size).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut sdr = Sdr::new(&[size]);
    sdr.set_sparse(&sorted).unwrap();
    sdr
}

fn spatial_pooler(input_size: usize, seed: i64) -> SpatialPooler {
    SpatialPooler::new(SpatialPoolerParams {
        input_size,
        num_columns: 100,
        seed,
        ..Default::default()
    })
    .unwrap()
}

// =============================================================================
// SDR
// =============================================================================

mod sdr_operations {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_overlap_equals_set_intersection(
            indices1 in proptest::collection::vec(0u32..1000, 0..100),
            indices2 in proptest::collection::vec(0u32..1000, 0..100)
        ) {
            let sdr1 = make_sdr(1000, &indices1);
            let sdr2 = make_sdr(1000, &indices2);

            let set1: HashSet<u32> = sdr1.get_sparse().iter().copied().collect();
            let set2: HashSet<u32> = sdr2.get_sparse().iter().copied().collect();

            prop_assert_eq!(sdr1.get_overlap(&sdr2), set1.intersection(&set2).count());
            prop_assert_eq!(sdr1.get_overlap(&sdr2), sdr2.get_overlap(&sdr1));
        }

        #[test]
        fn prop_union_and_intersection_sizes(
            indices1 in proptest::collection::vec(0u32..300, 0..60),
            indices2 in proptest::collection::vec(0u32..300, 0..60)
        ) {
            let a = make_sdr(300, &indices1);
            let b = make_sdr(300, &indices2);

            let mut union = Sdr::new(&[300]);
            let mut intersection = Sdr::new(&[300]);
            union.set_union(&a, &b).unwrap();
            intersection.intersection(&a, &b).unwrap();

            prop_assert_eq!(
                union.get_sum() + intersection.get_sum(),
                a.get_sum() + b.get_sum()
            );
            prop_assert_eq!(intersection.get_sum(), a.get_overlap(&b));
        }

        #[test]
        fn prop_dense_sparse_agree(indices in proptest::collection::vec(0u32..200, 0..80)) {
            let sdr = make_sdr(200, &indices);
            let mut copy = Sdr::new(&[200]);
            copy.set_dense(&sdr.get_dense()).unwrap();
            prop_assert_eq!(copy, sdr);
        }
    }
}

// =============================================================================
// SPATIAL POOLER
// =============================================================================

mod spatial_pooler {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        #[test]
        fn prop_exact_number_of_active_columns(
            inputs in proptest::collection::vec(
                proptest::collection::vec(0u32..64, 0..40), 1..8),
            learn in any::<bool>(),
            boost in any::<bool>(),
            seed in 0i64..1000
        ) {
            let mut sp = spatial_pooler(64, seed);
            let mut output = Sdr::new(&[100]);

            for indices in &inputs {
                let input = make_sdr(64, indices);
                sp.compute(&input, learn, boost, &mut output).unwrap();
                prop_assert_eq!(output.get_sum(), 2);
            }
        }

        #[test]
        fn prop_inference_is_deterministic(
            training in proptest::collection::vec(
                proptest::collection::vec(0u32..64, 0..30), 0..5),
            query in proptest::collection::vec(0u32..64, 0..30),
            seed in 0i64..1000
        ) {
            let mut sp = spatial_pooler(64, seed);
            let mut output = Sdr::new(&[100]);
            for indices in &training {
                sp.compute(&make_sdr(64, indices), true, false, &mut output).unwrap();
            }

            let query = make_sdr(64, &query);
            let mut first = Sdr::new(&[100]);
            let mut second = Sdr::new(&[100]);
            sp.compute(&query, false, false, &mut first).unwrap();
            sp.compute(&query, false, false, &mut second).unwrap();

            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_permanences_bounded_and_mask_consistent(
            inputs in proptest::collection::vec(
                proptest::collection::vec(0u32..48, 0..30), 1..10),
            inc in 0i32..40,
            dec in 0i32..40,
            seed in 0i64..1000
        ) {
            let mut sp = SpatialPooler::new(SpatialPoolerParams {
                input_size: 48,
                num_columns: 100,
                active_column_ratio: 0.1,
                synapse_inc: inc,
                synapse_dec: dec,
                seed,
                ..Default::default()
            })
            .unwrap();
            let mut output = Sdr::new(&[100]);

            for indices in &inputs {
                sp.compute(&make_sdr(48, indices), true, true, &mut output).unwrap();
            }

            let threshold = sp.synapse_threshold();
            let counts = sp.connected_counts();
            for column in 0..100u32 {
                let pool = sp.potential_pool(column).unwrap();
                let perms = sp.permanences(column).unwrap();
                prop_assert!(perms.iter().all(|&p| (0..=100).contains(&p)));

                let expected: Vec<u32> = pool
                    .iter()
                    .zip(&perms)
                    .filter(|(_, p)| **p >= threshold)
                    .map(|(&i, _)| i)
                    .collect();
                prop_assert_eq!(&sp.connected_inputs(column).unwrap(), &expected);
                prop_assert_eq!(counts[column as usize] as usize, expected.len());
            }
        }
    }
}

// =============================================================================
// TEMPORAL MEMORY
// =============================================================================

mod temporal_memory {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        #[test]
        fn prop_bursting_and_predicted_partition_active_columns(
            sequence in proptest::collection::vec(
                proptest::collection::vec(0u32..50, 0..12), 1..20),
            learn in any::<bool>()
        ) {
            let mut tm = TemporalMemory::new(TemporalMemoryParams {
                num_columns: 50,
                cells_per_column: 4,
                segment_active_threshold: 3,
                segment_match_threshold: 2,
                ..Default::default()
            })
            .unwrap();
            let mut output = Sdr::new(&[200]);

            for indices in sequence.iter().cycle().take(sequence.len() * 3) {
                let columns = make_sdr(50, indices);
                tm.compute(&columns, learn, &mut output).unwrap();

                let bursting: HashSet<u32> = tm.bursting_columns().iter().copied().collect();
                let predicted: HashSet<u32> = tm.predictive_columns().iter().copied().collect();
                let active: HashSet<u32> = columns.get_sparse().iter().copied().collect();

                prop_assert!(bursting.is_disjoint(&predicted));
                let union: HashSet<u32> = bursting.union(&predicted).copied().collect();
                prop_assert_eq!(union, active);

                // Bursting columns activate every cell
                for &column in &bursting {
                    for cell in column * 4..column * 4 + 4 {
                        prop_assert!(output.contains(cell));
                    }
                }
                prop_assert!(output.get_sum() <= 200);
            }
        }

        #[test]
        fn prop_no_segments_means_full_burst(
            indices in proptest::collection::vec(0u32..50, 0..20)
        ) {
            let mut tm = TemporalMemory::new(TemporalMemoryParams {
                num_columns: 50,
                cells_per_column: 3,
                ..Default::default()
            })
            .unwrap();
            let columns = make_sdr(50, &indices);

            for _ in 0..2 {
                let cells = tm.inference(&columns).unwrap();
                prop_assert_eq!(cells.get_sum(), columns.get_sum() * 3);
                prop_assert_eq!(tm.bursting_columns(), columns.get_sparse());
            }
        }
    }
}

// =============================================================================
// ENCODERS AND DECODERS
// =============================================================================

mod encoders {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_scalar_encoding_is_contiguous(value in 0.0f64..100.0, active_bits in 1u32..30) {
            let encoder = ScalarEncoder::new(ScalarEncoderParams {
                minimum: 0.0,
                maximum: 100.0,
                num_buckets: 100,
                active_bits,
            })
            .unwrap();

            let sdr = encoder.encode_to_sdr(value).unwrap();
            let sparse = sdr.get_sparse();
            prop_assert_eq!(sparse.len(), active_bits as usize);
            prop_assert!(sparse.windows(2).all(|w| w[1] == w[0] + 1));
            prop_assert_eq!(sparse[0], encoder.bucket_index(value).unwrap());
        }

        #[test]
        fn prop_scalar_buckets_monotonic(a in -50.0f64..50.0, b in -50.0f64..50.0) {
            let encoder = ScalarEncoder::new(ScalarEncoderParams {
                minimum: -50.0,
                maximum: 50.0,
                num_buckets: 37,
                active_bits: 4,
            })
            .unwrap();

            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(encoder.bucket_index(lo).unwrap() <= encoder.bucket_index(hi).unwrap());
        }

        #[test]
        fn prop_scalar_round_trip(value in 0.0f64..100.0) {
            let encoder = ScalarEncoder::new(ScalarEncoderParams {
                minimum: 0.0,
                maximum: 100.0,
                num_buckets: 100,
                active_bits: 5,
            })
            .unwrap();
            let mut decoder = ScalarDecoder::new(encoder.size()).unwrap();

            let sdr = encoder.encode_to_sdr(value).unwrap();
            decoder.decode(&sdr, Some(value), true).unwrap();
            prop_assert_eq!(decoder.decode(&sdr, None, false).unwrap(), Some(value));
        }

        #[test]
        fn prop_category_round_trip(
            categories in proptest::collection::vec("[a-z]{1,6}", 1..10),
            pick in any::<prop::sample::Index>()
        ) {
            let encoder = CategoryEncoder::new(CategoryEncoderParams {
                categories: categories.clone(),
                active_bits: 3,
            })
            .unwrap();
            let size = encoder.size();
            let mut decoder = CategoryDecoder::new(size).unwrap();

            let category = pick.get(&categories).clone();
            let sdr = encoder.encode_to_sdr(category.as_str()).unwrap();
            prop_assert_eq!(sdr.get_sum(), 3);
            prop_assert!(encoder.bucket_index(&category) > 0);

            decoder.decode(&sdr, Some(category.clone()), true).unwrap();
            prop_assert_eq!(decoder.infer(&sdr).unwrap(), Some(category));
        }
    }
}
