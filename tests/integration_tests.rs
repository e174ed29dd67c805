mod common;

use std::{collections::HashSet, sync::Arc, thread};
use tractseed::{
    error::{SeedingError, SeedingErrorKind},
    geometry::{
        Dim3::{X, Y, Z},
        Idx3, Point3,
    },
    io::Verbosity,
    random::WorkerRngFactory,
    seeding::{
        config::{build_seeder, SeederConfig, SeedingStrategy},
        draw_seeds_in_parallel,
        grid_per_voxel::GridPerVoxelSeeder3,
        random_per_voxel::RandomPerVoxelSeeder3,
        rejection::{RejectionSeeder3, RejectionSeederConfig, WeightLookup},
        SeedOutcome, SeedStream, Seeder3,
    },
    volume::{fgr, Volume3},
};

const N_THREADS: usize = 4;

/// Pulls seeds from the seeder on several threads until it is exhausted.
fn drain_on_threads(seeder: &dyn Seeder3, rng_factory: &WorkerRngFactory) -> Vec<Point3<fgr>> {
    thread::scope(|scope| {
        let handles: Vec<_> = (0..N_THREADS)
            .map(|_| {
                scope.spawn(move || {
                    SeedStream::new(seeder, rng_factory.create())
                        .collect::<Result<Vec<_>, _>>()
                        .unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    })
}

#[test]
fn random_per_voxel_seeds_every_voxel_exactly_num_times_across_threads() {
    let mask = common::all_ones_mask(2, 2, 2);
    let seeder = RandomPerVoxelSeeder3::new(Arc::clone(&mask), 3, &Verbosity::Quiet).unwrap();
    let rng_factory = WorkerRngFactory::from_seed(1);

    let seeds = drain_on_threads(&seeder, &rng_factory);
    assert_eq!(seeds.len(), 24);

    let counts = common::count_seeds_per_voxel(&mask, &seeds);
    assert_eq!(counts.len(), 8);
    assert!(counts.values().all(|&count| count == 3));

    let mut rng = rng_factory.create();
    assert_eq!(seeder.get_seed(&mut rng).unwrap(), SeedOutcome::Exhausted);
    assert_eq!(seeder.get_seed(&mut rng).unwrap(), SeedOutcome::Exhausted);
}

#[test]
fn twenty_fifth_request_is_exhausted() {
    let seeder =
        RandomPerVoxelSeeder3::new(common::all_ones_mask(2, 2, 2), 3, &Verbosity::Quiet).unwrap();
    let mut rng = WorkerRngFactory::from_seed(2).create();
    for _ in 0..24 {
        assert!(!seeder.get_seed(&mut rng).unwrap().is_exhausted());
    }
    assert!(seeder.get_seed(&mut rng).unwrap().is_exhausted());
}

#[test]
fn parallel_drawing_collects_all_seeds_of_finite_seeders() {
    let mask = common::oblique_shell_mask();
    let n_nonzero = mask.count_nonzero();
    let seeder = RandomPerVoxelSeeder3::new(Arc::clone(&mask), 5, &Verbosity::Quiet).unwrap();

    let seeds = draw_seeds_in_parallel(
        &seeder,
        usize::MAX,
        &WorkerRngFactory::from_seed(3),
        &Verbosity::Quiet,
    )
    .unwrap();

    assert_eq!(seeds.len(), 5 * n_nonzero);
    common::assert_seeds_in_nonzero_voxels(&mask, &seeds);
    let counts = common::count_seeds_per_voxel(&mask, &seeds);
    assert_eq!(counts.len(), n_nonzero);
    assert!(counts.values().all(|&count| count == 5));
}

#[test]
fn parallel_drawing_with_progress_bar_collects_every_seed() {
    let mask = common::all_ones_mask(3, 3, 3);
    let seeder = GridPerVoxelSeeder3::new(Arc::clone(&mask), 2, &Verbosity::Quiet).unwrap();
    let seeds = draw_seeds_in_parallel(
        &seeder,
        usize::MAX,
        &WorkerRngFactory::from_seed(9),
        &Verbosity::progress(),
    )
    .unwrap();
    assert_eq!(seeds.len(), 27 * 8);
    let counts = common::count_seeds_per_voxel(&mask, &seeds);
    assert!(counts.values().all(|&count| count == 8));
}

#[test]
fn grid_per_voxel_gives_distinct_reproducible_seeds() {
    let mask = common::oblique_shell_mask();
    let n_nonzero = mask.count_nonzero();
    let oversampling = 3;
    let rng_factory = WorkerRngFactory::from_seed(4);

    let seeder =
        GridPerVoxelSeeder3::new(Arc::clone(&mask), oversampling, &Verbosity::Quiet).unwrap();
    let seeds = drain_on_threads(&seeder, &rng_factory);
    assert_eq!(seeds.len(), n_nonzero * 27);

    let counts = common::count_seeds_per_voxel(&mask, &seeds);
    assert!(counts.values().all(|&count| count == 27));

    let quantize = |point: &Point3<fgr>| {
        (
            (point[X] * 1e6).round() as i64,
            (point[Y] * 1e6).round() as i64,
            (point[Z] * 1e6).round() as i64,
        )
    };
    let distinct: HashSet<_> = seeds.iter().map(quantize).collect();
    assert_eq!(distinct.len(), seeds.len());

    let repeated =
        GridPerVoxelSeeder3::new(Arc::clone(&mask), oversampling, &Verbosity::Quiet).unwrap();
    let repeated_seeds: HashSet<_> = SeedStream::new(&repeated, rng_factory.create())
        .map(|seed| quantize(&seed.unwrap()))
        .collect();
    assert_eq!(repeated_seeds, distinct);
}

#[test]
fn unit_sphere_seeds_stay_inside() {
    let config: SeederConfig = "sphere:0,0,0,1".parse().unwrap();
    let seeder = build_seeder::<u8>(&config, None).unwrap();
    let seeds = draw_seeds_in_parallel(
        seeder.as_ref(),
        10_000,
        &WorkerRngFactory::from_seed(5),
        &Verbosity::Quiet,
    )
    .unwrap();
    assert_eq!(seeds.len(), 10_000);
    for seed in &seeds {
        assert!(seed[X] * seed[X] + seed[Y] * seed[Y] + seed[Z] * seed[Z] <= 1.0);
    }
}

#[test]
fn mask_seeds_map_back_to_nonzero_voxels_under_oblique_transformation() {
    let mask = common::oblique_shell_mask();
    let config = SeederConfig::new(SeedingStrategy::Mask {
        max_sampling_attempts: None,
    });
    let seeder = build_seeder(&config, Some(Arc::clone(&mask))).unwrap();
    assert!(!seeder.is_finite());

    let seeds = draw_seeds_in_parallel(
        seeder.as_ref(),
        5000,
        &WorkerRngFactory::from_seed(6),
        &Verbosity::Quiet,
    )
    .unwrap();
    common::assert_seeds_in_nonzero_voxels(&mask, &seeds);
    assert_eq!(
        common::count_seeds_per_voxel(&mask, &seeds).len(),
        mask.count_nonzero()
    );
}

#[test]
fn rejection_sampling_of_uniform_cube_is_uniform_and_confined() {
    let (shape, lower, size) = (8, 2, 4);
    let weights = common::uniform_cube_weights(shape, lower, size);
    for lookup in [WeightLookup::Nearest, WeightLookup::Linear] {
        let config = RejectionSeederConfig {
            lookup,
            ..RejectionSeederConfig::default()
        };
        let seeder = RejectionSeeder3::new(&weights, config, &Verbosity::Quiet).unwrap();
        assert_eq!(
            seeder.weights().shape(),
            tractseed::geometry::In3D::same(size + 2)
        );

        let seeds = draw_seeds_in_parallel(
            &seeder,
            64_000,
            &WorkerRngFactory::from_seed(7),
            &Verbosity::Quiet,
        )
        .unwrap();
        assert_eq!(seeds.len(), 64_000);

        if lookup == WeightLookup::Nearest {
            common::assert_seeds_in_nonzero_voxels(&weights, &seeds);
            let counts = common::count_seeds_per_voxel(&weights, &seeds);
            assert_eq!(counts.len(), size * size * size);
            for (indices, &count) in &counts {
                assert!(
                    (750..=1250).contains(&count),
                    "Voxel {} received {} seeds",
                    indices,
                    count
                );
            }
        } else {
            // Interpolated weights are positive only within one voxel of the cube.
            let (min, max) = ((lower - 1) as fgr, (lower + size) as fgr);
            for seed in &seeds {
                for dim in [X, Y, Z] {
                    assert!(seed[dim] > min && seed[dim] < max, "Seed {} outside", seed);
                }
            }
        }
    }
}

#[test]
fn rejection_sampling_rejects_invalid_weight_images() {
    let mut weights = common::uniform_cube_weights(6, 1, 3);
    let negative = {
        let mut values = weights.values().clone();
        values[[4, 4, 5]] = -0.01;
        Volume3::with_identity_transformation("negative".to_string(), values)
    };
    let err = RejectionSeeder3::new(&negative, RejectionSeederConfig::default(), &Verbosity::Quiet)
        .unwrap_err();
    assert_eq!(err.kind(), SeedingErrorKind::Data);
    assert!(matches!(
        err,
        SeedingError::NegativeWeight { indices, .. } if indices == Idx3::new(4, 4, 5)
    ));

    weights = weights.mapv(|_| 0.0_f32);
    assert_eq!(
        RejectionSeeder3::new(&weights, RejectionSeederConfig::default(), &Verbosity::Quiet)
            .unwrap_err(),
        SeedingError::EmptyWeights("cube".to_string())
    );
}

#[test]
fn invalid_configurations_are_rejected_before_seeding() {
    let mask = common::all_ones_mask(2, 2, 2);
    for strategy in [
        SeedingStrategy::Sphere {
            center: Point3::origin(),
            radius: 0.0,
        },
        SeedingStrategy::Sphere {
            center: Point3::origin(),
            radius: -2.0,
        },
        SeedingStrategy::RandomPerVoxel {
            samples_per_voxel: 0,
        },
        SeedingStrategy::GridPerVoxel { oversampling: 0 },
    ] {
        let err = build_seeder(&SeederConfig::new(strategy.clone()), Some(Arc::clone(&mask)))
            .err()
            .unwrap();
        assert_eq!(err.kind(), SeedingErrorKind::Configuration, "{:?}", strategy);
    }

    for text in ["grid_per_voxel:3000000", "random_per_voxel:18446744073709551615"] {
        let err = build_seeder(&text.parse().unwrap(), Some(common::all_ones_mask(2, 1, 1)))
            .err()
            .unwrap();
        assert!(matches!(err, SeedingError::TooManySeeds { .. }), "{}", text);
        assert_eq!(err.kind(), SeedingErrorKind::Configuration);
    }

    let missing = build_seeder::<u8>(&"random_per_voxel:2".parse().unwrap(), None)
        .err()
        .unwrap();
    assert_eq!(missing.kind(), SeedingErrorKind::Configuration);
}

#[test]
fn seed_streams_stop_after_the_first_error() {
    let weights = common::uniform_cube_weights(16, 0, 1);
    let config = RejectionSeederConfig {
        lookup: WeightLookup::Nearest,
        max_sampling_attempts: Some(1),
    };
    let seeder = RejectionSeeder3::new(&weights, config, &Verbosity::Quiet).unwrap();
    let mut stream = SeedStream::new(&seeder, WorkerRngFactory::from_seed(8).create());
    let first_error = stream.by_ref().find(|result| result.is_err());
    assert!(matches!(
        first_error,
        Some(Err(SeedingError::SamplingAttemptsExceeded { attempts: 1, .. }))
    ));
    assert!(stream.next().is_none());
}
