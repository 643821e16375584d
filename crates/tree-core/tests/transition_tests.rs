// Host-side tests for progress smoothing and the particle families.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tree_core::constants::*;
use tree_core::curve::RibbonCurve;
use tree_core::frame::FrameContext;
use tree_core::layout::{OrnamentKind, ParticleKind, PositionSet, TreeShape};
use tree_core::math::ease_in_out_cubic;
use tree_core::particles::lights::blink_brightness;
use tree_core::particles::ribbon::{snow_height, snow_opacity};
use tree_core::particles::*;
use tree_core::transition::{ParticleBuffers, Progress};
use tree_core::SceneError;

fn ctx(dt: f32, time: f32) -> FrameContext {
    FrameContext::new(dt, time, 1.0, Vec2::new(1280.0, 720.0))
}

#[test]
fn ease_endpoints_and_midpoint() {
    assert_eq!(ease_in_out_cubic(0.0), 0.0);
    assert_eq!(ease_in_out_cubic(1.0), 1.0);
    assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
    assert_eq!(ease_in_out_cubic(-3.0), 0.0);
    assert_eq!(ease_in_out_cubic(7.0), 1.0);
}

#[test]
fn progress_stays_in_unit_range_for_any_dt() {
    let mut p = Progress::new(0.8);
    p.set_formed(true);
    for dt in [0.0, 1.0 / 60.0, 0.5, 10.0, 1e9, f32::INFINITY, f32::NAN, -1.0] {
        let v = p.step(dt);
        assert!((0.0..=1.0).contains(&v), "dt {dt} gave {v}");
    }
    assert_eq!(p.value(), 1.0, "huge dt reaches the target");
    p.set_formed(false);
    assert_eq!(p.step(f32::NAN), 1.0, "NaN dt does not move");
    assert_eq!(p.step(-5.0), 1.0, "negative dt does not move");
    p.step(1e9);
    assert_eq!(p.value(), 0.0);
}

#[test]
fn progress_approaches_monotonically() {
    let mut p = Progress::new(0.7);
    p.set_formed(true);
    let mut last = 0.0;
    for _ in 0..600 {
        let v = p.step(1.0 / 60.0);
        assert!(v >= last);
        last = v;
    }
    assert!(last > 0.99);
}

#[test]
fn mismatched_buffers_are_rejected() {
    let set = PositionSet {
        chaos: vec![0.0; 6],
        target: vec![0.0; 3],
    };
    match ParticleBuffers::new("test", set) {
        Err(SceneError::BufferMismatch { chaos, target, .. }) => {
            assert_eq!((chaos, target), (6, 3));
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
}

#[test]
fn blend_reproduces_both_endpoints_exactly() {
    let set = PositionSet {
        chaos: vec![0.1, -3.7, 12.25, 1e-3, 7.0, -0.3],
        target: vec![5.5, 0.3, -9.1, 2.0, -7.7, 0.123],
    };
    let mut b = ParticleBuffers::new("test", set.clone()).expect("buffers");
    b.blend(1.0);
    assert_eq!(b.current(), &set.target[..]);
    b.blend(0.0);
    assert_eq!(b.current(), &set.chaos[..]);
}

#[test]
fn foliage_snaps_exactly_to_either_layout() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut f = Foliage::new(&mut rng, 300, &TreeShape::default(), FOLIAGE_RATE).expect("foliage");
    f.snap(true);
    assert_eq!(f.attributes().positions, f.buffers().target());
    f.snap(false);
    assert_eq!(f.attributes().positions, f.buffers().chaos());

    // Progress 0 with no pending transition leaves chaos untouched.
    f.update(&ctx(1.0 / 60.0, 3.0));
    assert_eq!(f.attributes().positions, f.buffers().chaos());
}

fn assert_close(actual: &[f32], expected: &[f32], what: &str) {
    assert_eq!(actual.len(), expected.len(), "{what}");
    let worst = actual
        .iter()
        .zip(expected)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f32, f32::max);
    assert!(worst < 1e-4, "{what}: max deviation {worst}");
}

/// A minute formed, then five minutes released, in clamped frame steps.
fn form_then_release(f: &mut dyn ParticleFamily) {
    f.set_formed(true);
    for i in 0..240 {
        f.update(&ctx(0.25, i as f32 * 0.25));
    }
    f.set_formed(false);
    for i in 0..1200 {
        f.update(&ctx(0.25, 60.0 + i as f32 * 0.25));
    }
    assert!(f.progress().value() < 1e-6, "{}", f.name());
}

#[test]
fn point_families_return_to_chaos_after_a_full_cycle() {
    let mut rng = StdRng::seed_from_u64(21);
    let shape = TreeShape::default();

    let mut lights = FairyLights::new(&mut rng, 60, &shape, LIGHT_RATE).expect("lights");
    lights.snap(true);
    assert_close(lights.attributes().positions, lights.buffers().target(), "lights formed");
    form_then_release(&mut lights);
    assert_close(lights.attributes().positions, lights.buffers().chaos(), "lights chaos");

    let mut orn = Ornaments::new(&mut rng, 40, &shape, ORNAMENT_RATE).expect("ornaments");
    orn.snap(true);
    assert_close(orn.attributes().positions, orn.buffers().target(), "ornaments formed");
    form_then_release(&mut orn);
    assert_close(orn.attributes().positions, orn.buffers().chaos(), "ornaments chaos");
}

#[test]
fn halo_spin_never_leaks_into_chaos() {
    let mut rng = StdRng::seed_from_u64(22);
    let mut halo = Halo::new(&mut rng, 80, HALO_RATE).expect("halo");
    halo.snap(true);
    assert_close(halo.attributes().positions, halo.buffers().target(), "halo formed");
    form_then_release(&mut halo);
    assert!(halo.angle() > 0.1, "ring spun while formed: {}", halo.angle());
    assert_close(halo.attributes().positions, halo.buffers().chaos(), "halo chaos");
}

#[test]
fn ribbon_particles_return_to_chaos_after_a_full_cycle() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut rs = RibbonSnow::new(&mut rng, 50, 20, &RibbonCurve::default(), RIBBON_RATE)
        .expect("ribbon");
    let ribbon_of = |rs: &RibbonSnow, buf: &[f32]| -> Vec<f32> {
        rs.kinds()
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == ParticleKind::Ribbon)
            .flat_map(|(i, _)| buf[i * 3..i * 3 + 3].to_vec())
            .collect()
    };
    rs.snap(true);
    assert_close(
        &ribbon_of(&rs, rs.attributes().positions),
        &ribbon_of(&rs, rs.buffers().target()),
        "ribbon formed",
    );
    form_then_release(&mut rs);
    assert_close(
        &ribbon_of(&rs, rs.attributes().positions),
        &ribbon_of(&rs, rs.buffers().chaos()),
        "ribbon chaos",
    );
}

#[test]
fn ornament_rates_stay_inside_the_family_band() {
    let mut rng = StdRng::seed_from_u64(24);
    let orn = Ornaments::new(&mut rng, 200, &TreeShape::default(), ORNAMENT_RATE)
        .expect("ornaments");
    for i in 0..orn.len() {
        let rate = orn.instance_rate(i).expect("rate");
        assert!(
            (PROGRESS_RATE_MIN..=PROGRESS_RATE_MAX).contains(&rate),
            "ornament {i} rate {rate}"
        );
    }
}

#[test]
fn every_family_keeps_attribute_lengths_through_updates() {
    let mut rng = StdRng::seed_from_u64(4);
    let shape = TreeShape::default();
    let mut families: Vec<Box<dyn ParticleFamily>> = vec![
        Box::new(Foliage::new(&mut rng, 100, &shape, 0.8).expect("foliage")),
        Box::new(Ornaments::new(&mut rng, 20, &shape, 0.7).expect("ornaments")),
        Box::new(FairyLights::new(&mut rng, 30, &shape, 0.75).expect("lights")),
        Box::new(RibbonSnow::new(&mut rng, 40, 10, &RibbonCurve::default(), 0.6).expect("ribbon")),
        Box::new(Halo::new(&mut rng, 25, 0.65).expect("halo")),
    ];
    for f in families.iter_mut() {
        f.set_formed(true);
        for i in 0..120 {
            f.update(&ctx(1.0 / 30.0, i as f32 / 30.0));
        }
        let a = f.attributes();
        assert_eq!(a.len(), f.len(), "{}", f.name());
        assert_eq!(a.positions.len(), f.len() * 3, "{}", f.name());
        assert_eq!(a.colors.len(), f.len() * 3, "{}", f.name());
        assert_eq!(a.intensities.len(), f.len(), "{}", f.name());
        assert!(a.positions.iter().all(|v| v.is_finite()), "{}", f.name());
    }
}

#[test]
fn zero_particle_families_update_safely() {
    let mut rng = StdRng::seed_from_u64(6);
    let shape = TreeShape::default();
    let mut families: Vec<Box<dyn ParticleFamily>> = vec![
        Box::new(Foliage::new(&mut rng, 0, &shape, 0.8).expect("foliage")),
        Box::new(Ornaments::new(&mut rng, 0, &shape, 0.7).expect("ornaments")),
        Box::new(FairyLights::new(&mut rng, 0, &shape, 0.75).expect("lights")),
        Box::new(RibbonSnow::new(&mut rng, 0, 0, &RibbonCurve::default(), 0.6).expect("ribbon")),
        Box::new(Halo::new(&mut rng, 0, 0.65).expect("halo")),
    ];
    for f in families.iter_mut() {
        f.set_formed(true);
        f.update(&ctx(0.1, 1.0));
        f.snap(false);
        assert!(f.is_empty());
        assert!(f.attributes().is_empty());
        assert_eq!(f.progress().value(), 0.0, "{}", f.name());
    }
}

#[test]
fn snow_height_wraps_into_its_range() {
    let half = SNOW_HEIGHT * 0.5;
    for target_y in [-15.0, -3.2, 0.0, 9.9, 14.99] {
        for time in [0.0f32, 0.5, 17.0, 123.4, 9_999.0] {
            for speed in [SNOW_FALL_MIN, 1.0, SNOW_FALL_MAX] {
                let y = snow_height(target_y, time, speed);
                assert!(y >= -half && y <= half, "y={y} target={target_y} t={time}");
            }
        }
    }
    assert!((snow_height(2.0, 0.0, 1.0) - 2.0).abs() < 1e-5);
    assert!((snow_height(-14.0, 2.0, 1.0) - 14.0).abs() < 1e-4, "wraps to top");
}

#[test]
fn snow_fades_in_with_progress() {
    assert_eq!(snow_opacity(0.0), 0.0);
    assert_eq!(snow_opacity(0.1), 0.0);
    assert_eq!(snow_opacity(0.6), 1.0);
    assert!(snow_opacity(0.35) > 0.0 && snow_opacity(0.35) < 1.0);
}

#[test]
fn ribbon_and_snow_share_one_buffer() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut rs = RibbonSnow::new(&mut rng, 12, 8, &RibbonCurve::default(), RIBBON_RATE)
        .expect("ribbon");
    assert_eq!(rs.len(), 20);
    assert_eq!(rs.kinds()[11], ParticleKind::Ribbon);
    assert_eq!(rs.kinds()[12], ParticleKind::Snow);
    rs.update(&ctx(1.0 / 60.0, 40.0));
    let half = SNOW_HEIGHT * 0.5;
    for (i, y) in rs.attributes().positions.chunks_exact(3).map(|p| p[1]).enumerate() {
        if rs.kinds()[i] == ParticleKind::Snow {
            assert!(y >= -half && y <= half);
        }
    }
}

#[test]
fn light_blink_is_halved_while_scattered() {
    for t in [0.0, 0.7, 3.3] {
        let full = blink_brightness(t, 1.1, 0.8);
        let dim = blink_brightness(t, 1.1, 0.2);
        assert!((dim - full * 0.5).abs() < 1e-6);
        assert!((0.2..=1.0).contains(&full));
    }
}

#[test]
fn halo_spin_scales_with_progress() {
    let mut rng = StdRng::seed_from_u64(10);
    let mut halo = Halo::new(&mut rng, 10, HALO_RATE).expect("halo");
    halo.update(&ctx(0.1, 0.1));
    assert_eq!(halo.angle(), 0.0, "no spin while scattered");
    halo.set_formed(true);
    for i in 0..60 {
        halo.update(&ctx(0.1, i as f32 * 0.1));
    }
    assert!(halo.angle() > 0.0);
}

#[test]
fn heavy_ornaments_settle_more_slowly() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut orn = Ornaments::new(&mut rng, 200, &TreeShape::default(), ORNAMENT_RATE)
        .expect("ornaments");
    orn.set_formed(true);
    for i in 0..30 {
        orn.update(&ctx(1.0 / 30.0, i as f32 / 30.0));
    }
    let progress_of = |kind| {
        orn.instances()
            .iter()
            .position(|o| o.kind == kind)
            .and_then(|i| orn.instance_progress(i))
            .expect("kind present")
    };
    assert!(progress_of(OrnamentKind::Box) < progress_of(OrnamentKind::VelvetBall));
    assert!(progress_of(OrnamentKind::VelvetBall) < progress_of(OrnamentKind::MetallicBall));
    assert_eq!(orn.rotations().len(), orn.len());
}
