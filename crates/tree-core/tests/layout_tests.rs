// Host-side tests for the position generators and photo placement.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tree_core::constants::*;
use tree_core::curve::RibbonCurve;
use tree_core::layout::*;

#[test]
fn sphere_volume_samples_have_cubic_radial_cdf() {
    let mut rng = StdRng::seed_from_u64(7);
    let radius = 10.0;
    let n = 40_000;
    let samples: Vec<f32> = (0..n)
        .map(|_| sample_sphere_volume(&mut rng, radius).length())
        .collect();
    assert!(samples.iter().all(|&r| r <= radius + 1e-4), "outside sphere");
    for x in [0.3f32, 0.5, 0.8] {
        let inside = samples.iter().filter(|&&r| r <= x * radius).count() as f32 / n as f32;
        let expected = x * x * x;
        assert!(
            (inside - expected).abs() < 0.012,
            "P(r <= {x}R) = {inside}, expected {expected}"
        );
    }
}

#[test]
fn sphere_volume_is_not_biased_to_one_hemisphere() {
    let mut rng = StdRng::seed_from_u64(11);
    let mean = (0..20_000)
        .map(|_| sample_sphere_volume(&mut rng, 1.0))
        .fold(Vec3::ZERO, |acc, p| acc + p)
        / 20_000.0;
    assert!(mean.length() < 0.02, "mean {mean:?}");
}

#[test]
fn photo_curve_parameters_for_five_photos() {
    let expected = [0.15, 0.325, 0.5, 0.675, 0.85];
    for (i, e) in expected.iter().enumerate() {
        let u = photo_curve_parameter(i, 5);
        assert!((u - e).abs() < 1e-6, "photo {i}: {u} vs {e}");
    }
}

#[test]
fn single_photo_sits_at_curve_midpoint() {
    assert_eq!(photo_curve_parameter(0, 1), 0.5);
    let mut rng = StdRng::seed_from_u64(1);
    let curve = RibbonCurve::default();
    let slot = place_photo(&mut rng, &curve, 0, 1);
    assert_eq!(slot.curve_u, 0.5);
    let expected = curve.point(0.5) - Vec3::Y * PHOTO_DROP;
    assert!(slot.target.distance(expected) < 1e-5);
}

#[test]
fn photo_slots_hang_below_the_ribbon_and_face_outward() {
    let mut rng = StdRng::seed_from_u64(3);
    let curve = RibbonCurve::default();
    for i in 0..5 {
        let slot = place_photo(&mut rng, &curve, i, 5);
        let anchor = curve.point(slot.curve_u);
        assert!((anchor.y - slot.target.y - PHOTO_DROP).abs() < 1e-5);
        let front = slot.rotation * Vec3::Z;
        let outward = Vec3::new(slot.target.x, 0.0, slot.target.z).normalize();
        assert!(front.dot(outward) > 0.8, "photo {i} faces {front:?}");
        assert!(slot.chaos.length() <= CHAOS_RADIUS * 0.6 + 1e-4);
    }
}

#[test]
fn ornament_kind_buckets() {
    assert_eq!(OrnamentKind::from_roll(0.9), OrnamentKind::Box);
    assert_eq!(OrnamentKind::from_roll(0.85), OrnamentKind::VelvetBall);
    assert_eq!(OrnamentKind::from_roll(0.6), OrnamentKind::VelvetBall);
    assert_eq!(OrnamentKind::from_roll(0.45), OrnamentKind::MetallicBall);
    assert_eq!(OrnamentKind::from_roll(0.0), OrnamentKind::MetallicBall);
    assert!(OrnamentKind::Box.speed() < OrnamentKind::MetallicBall.speed());
}

#[test]
fn ornaments_sit_outside_the_cone_surface() {
    let mut rng = StdRng::seed_from_u64(5);
    let shape = TreeShape::default();
    for o in ornaments(&mut rng, 200, &shape) {
        let t = (o.target.y - shape.base_y) / shape.height;
        let r = Vec3::new(o.target.x, 0.0, o.target.z).length();
        assert!((r - (shape.radius_at(t) + ORNAMENT_SURFACE_OFFSET)).abs() < 1e-3);
        assert_eq!(o.speed, o.kind.speed());
    }
}

#[test]
fn generators_produce_matching_buffer_lengths() {
    let mut rng = StdRng::seed_from_u64(9);
    let shape = TreeShape::default();
    let foliage = foliage_positions(&mut rng, 500, &shape);
    assert_eq!(foliage.chaos.len(), 1500);
    assert_eq!(foliage.target.len(), 1500);

    let lights = light_positions(&mut rng, 40, &shape);
    assert_eq!(lights.positions.len(), 40);
    assert_eq!(lights.phases.len(), 40);

    let ribbon = ribbon_and_snow(&mut rng, 30, 20, &RibbonCurve::default());
    assert_eq!(ribbon.positions.len(), 50);
    assert_eq!(ribbon.kinds.len(), 50);
    assert_eq!(ribbon.fall_speeds.len(), 50);
    assert!(ribbon.kinds[..30].iter().all(|k| *k == ParticleKind::Ribbon));
    assert!(ribbon.kinds[30..].iter().all(|k| *k == ParticleKind::Snow));

    let halo = halo_positions(&mut rng, 25);
    assert_eq!(halo.positions.len(), 25);
}

#[test]
fn foliage_targets_stay_inside_the_cone() {
    let mut rng = StdRng::seed_from_u64(13);
    let shape = TreeShape::default();
    let set = foliage_positions(&mut rng, 2_000, &shape);
    for p in set.target.chunks_exact(3) {
        let t = ((p[1] - shape.base_y) / shape.height).clamp(0.0, 1.0);
        let r = (p[0] * p[0] + p[2] * p[2]).sqrt();
        // y jitter shifts t slightly, so allow a little slack
        assert!(r <= shape.radius_at(t) + 0.1, "r={r} at t={t}");
    }
}
