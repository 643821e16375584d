// Host-side tests for the scene orchestrator: uploads, removal, focus and input.

use glam::Vec2;
use tree_core::error::StoreError;
use tree_core::frame::FrameContext;
use tree_core::gesture::{Gesture, HandPose};
use tree_core::rotation::RotationMode;
use tree_core::store::{MemoryStore, PhotoStore, StoredPhoto};
use tree_core::{
    texture_extent, AppState, NewPhoto, ParticleFamily, PhotoId, PhotoPixels, Scene, SceneError,
    SceneParams,
};

fn small_scene() -> Scene {
    Scene::new(SceneParams::scaled_down(100), 42).expect("scene")
}

fn ctx(time: f32) -> FrameContext {
    FrameContext::new(1.0 / 60.0, time, 1.0, Vec2::new(1000.0, 800.0))
}

fn run(scene: &mut Scene, seconds: f32) {
    let frames = (seconds * 60.0) as usize;
    for i in 0..frames {
        scene.frame(&ctx(i as f32 / 60.0));
    }
}

fn photos(n: usize) -> Vec<NewPhoto> {
    (0..n)
        .map(|i| NewPhoto {
            image: format!("data:image/png;base64,{i}"),
            aspect_ratio: 1.0 + i as f32 * 0.25,
        })
        .collect()
}

/// Store whose writes and deletes can be made to fail.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_put: bool,
    fail_delete: bool,
    fail_list: bool,
}

impl PhotoStore for FlakyStore {
    fn put(&mut self, record: &StoredPhoto) -> Result<(), StoreError> {
        if self.fail_put {
            return Err(StoreError::Write("quota exceeded".into()));
        }
        self.inner.put(record)
    }

    fn delete(&mut self, id: &PhotoId) -> Result<(), StoreError> {
        if self.fail_delete {
            return Err(StoreError::Unavailable("locked".into()));
        }
        self.inner.delete(id)
    }

    fn list_all(&self) -> Result<Vec<StoredPhoto>, StoreError> {
        if self.fail_list {
            return Err(StoreError::Unavailable("offline".into()));
        }
        self.inner.list_all()
    }
}

#[test]
fn upload_three_delete_middle_respaces_the_rest() {
    let mut scene = small_scene();
    let mut store = MemoryStore::new();
    let report = scene.upload(&mut store, photos(3), 1_000);
    assert_eq!(report.added.len(), 3);
    assert!(report.failed.is_empty());
    assert_eq!(*scene.state(), AppState::Formed);
    assert_eq!(store.len(), 3);

    let us: Vec<f32> = scene.photos().iter().map(|p| p.curve_u).collect();
    for (u, expected) in us.iter().zip([0.15, 0.5, 0.85]) {
        assert!((u - expected).abs() < 1e-6, "{us:?}");
    }

    scene.remove(&mut store, &report.added[1]).expect("remove");
    let us: Vec<f32> = scene.photos().iter().map(|p| p.curve_u).collect();
    assert_eq!(us.len(), 2);
    assert!((us[0] - 0.15).abs() < 1e-6, "{us:?}");
    assert!((us[1] - 0.85).abs() < 1e-6, "{us:?}");
    assert_eq!(store.len(), 2);
    assert_eq!(*scene.state(), AppState::Formed, "removal does not change state");
}

#[test]
fn failed_store_write_leaves_collection_untouched() {
    let mut scene = small_scene();
    let mut store = FlakyStore {
        fail_put: true,
        ..Default::default()
    };
    let report = scene.upload(&mut store, photos(2), 5);
    assert!(report.added.is_empty());
    assert_eq!(report.failed.len(), 2);
    assert!(matches!(report.failed[0], SceneError::Store(StoreError::Write(_))));
    assert!(scene.photos().is_empty());
    assert_eq!(*scene.state(), AppState::Chaos);
}

#[test]
fn invalid_aspect_ratio_is_skipped() {
    let mut scene = small_scene();
    let mut store = MemoryStore::new();
    let mut items = photos(2);
    items[0].aspect_ratio = 0.0;
    let report = scene.upload(&mut store, items, 5);
    assert_eq!(report.added.len(), 1);
    assert!(matches!(report.failed[0], SceneError::InvalidAspect(_)));
    assert_eq!(store.len(), 1);
}

#[test]
fn failed_store_delete_keeps_the_photo() {
    let mut scene = small_scene();
    let mut store = FlakyStore::default();
    let added = scene.upload(&mut store, photos(2), 5).added;
    store.fail_delete = true;
    assert!(scene.remove(&mut store, &added[0]).is_err());
    assert_eq!(scene.photos().len(), 2);
    assert!(scene.photos().contains(&added[0]));
}

#[test]
fn removing_unknown_photo_is_an_error() {
    let mut scene = small_scene();
    let mut store = MemoryStore::new();
    let err = scene.remove(&mut store, &PhotoId::from("nope"));
    assert!(matches!(err, Err(SceneError::UnknownPhoto(_))));
}

#[test]
fn load_from_store_restores_photos_in_creation_order() {
    let mut store = MemoryStore::new();
    for (id, at) in [("b", 20u64), ("a", 10), ("c", 30)] {
        store
            .put(&StoredPhoto {
                id: PhotoId::from(id),
                image: format!("{id}.jpg"),
                aspect_ratio: 1.5,
                created_at_ms: at,
            })
            .expect("put");
    }
    let mut scene = small_scene();
    assert_eq!(scene.load_from_store(&store).expect("load"), 3);
    let order: Vec<_> = scene.photos().iter().map(|p| p.id.to_string()).collect();
    assert_eq!(order, ["a", "b", "c"]);
    assert_eq!(*scene.state(), AppState::Formed);
}

#[test]
fn load_failure_leaves_an_empty_chaos_scene() {
    let store = FlakyStore {
        fail_list: true,
        ..Default::default()
    };
    let mut scene = small_scene();
    assert!(scene.load_from_store(&store).is_err());
    assert!(scene.photos().is_empty());
    assert_eq!(*scene.state(), AppState::Chaos);
}

#[test]
fn gesture_sink_drives_the_state_machine() {
    let mut scene = small_scene();
    scene.gesture_sink().set(Gesture::Fist);
    scene.frame(&ctx(0.0));
    assert_eq!(*scene.state(), AppState::Formed);
    assert_eq!(scene.foliage().progress().target(), 1.0);

    scene.gesture_sink().set(Gesture::Open);
    scene.frame(&ctx(0.1));
    assert_eq!(*scene.state(), AppState::Chaos);
    assert_eq!(scene.halo().progress().target(), 0.0);
}

#[test]
fn point_without_photos_stays_put() {
    let mut scene = small_scene();
    scene.gesture_sink().set(Gesture::Point);
    scene.frame(&ctx(0.0));
    assert_eq!(*scene.state(), AppState::Chaos);
}

#[test]
fn featured_photo_locks_in_front_of_the_camera() {
    let mut scene = small_scene();
    let mut store = MemoryStore::new();
    scene.upload(&mut store, photos(2), 1);
    run(&mut scene, 2.0);

    scene.apply_gesture(Gesture::Point);
    let featured = scene.state().featured().cloned().expect("focus");
    run(&mut scene, 2.0);

    assert!(scene.focus().is_locked());
    let parent = scene.rotation().transform();
    let photo = scene.photos().get(&featured).expect("featured");
    let target = scene.focus().local_target(scene.camera(), parent);
    assert!(photo.position.distance(target) < 1e-5, "locked photo tracks target");
    let world = parent * photo.position;
    let ahead = scene.camera().point_ahead(scene.focus().params().distance);
    assert!(world.distance(ahead) < 1e-3);

    let front = parent * (photo.rotation * glam::Vec3::Z);
    let to_eye = (scene.camera().eye - world).normalize();
    assert!(front.dot(to_eye) > 0.999, "faces the camera");

    for other in scene.photos().iter().filter(|p| p.id != featured) {
        assert!(other.current_scale < 0.01, "others shrink away");
    }
}

#[test]
fn locked_photo_follows_a_spinning_parent() {
    let mut scene = small_scene();
    let mut store = MemoryStore::new();
    scene.upload(&mut store, photos(1), 1);
    scene.apply_gesture(Gesture::Point);
    run(&mut scene, 2.0);
    assert!(scene.focus().is_locked());

    // Fling the tree; the photo must stay pinned in world space every frame.
    scene.pointer_down(0.0);
    scene.pointer_move(900.0, 1000.0);
    scene.pointer_up();
    let ahead = scene.camera().point_ahead(scene.focus().params().distance);
    for i in 0..30 {
        scene.frame(&ctx(i as f32 / 60.0));
        let photo = scene.photos().iter().next().expect("photo");
        let world = scene.rotation().transform() * photo.position;
        assert!(world.distance(ahead) < 1e-3, "frame {i}: drifted to {world:?}");
    }
}

#[test]
fn hand_pose_overrides_drag_and_zeroes_velocity() {
    let mut scene = small_scene();
    scene.pointer_down(0.0);
    scene.pointer_move(500.0, 1000.0);
    scene.pointer_up();
    assert!(scene.rotation().velocity() > 1.0);

    scene.hand_pose_sink().set(HandPose { x: 0.75, y: 0.5 });
    scene.frame(&ctx(0.0));
    assert_eq!(scene.rotation().velocity(), 0.0);
    assert_eq!(scene.rotation().mode(), RotationMode::Hand);

    run(&mut scene, 5.0);
    let quarter = std::f32::consts::FRAC_PI_2;
    assert!((scene.rotation().rotation_y() - quarter).abs() < 1e-3);

    scene.hand_pose_sink().clear();
    scene.frame(&ctx(5.0));
    assert_eq!(scene.rotation().mode(), RotationMode::Drag);
}

#[test]
fn point_releases_the_hand_override() {
    let mut scene = small_scene();
    let mut store = MemoryStore::new();
    scene.upload(&mut store, photos(3), 1);
    scene.hand_pose_sink().set(HandPose { x: 0.2, y: 0.3 });
    scene.frame(&ctx(0.0));
    assert_eq!(scene.rotation().mode(), RotationMode::Hand);

    scene.gesture_sink().set(Gesture::Point);
    scene.frame(&ctx(0.1));
    assert!(scene.hand_pose_sink().get().is_none());
    assert_eq!(scene.rotation().mode(), RotationMode::Drag);

    // While focused, a fresh pose does not take over rotation.
    scene.hand_pose_sink().set(HandPose { x: 0.9, y: 0.9 });
    scene.frame(&ctx(0.2));
    assert_eq!(scene.rotation().mode(), RotationMode::Drag);
}

#[test]
fn removing_featured_photo_returns_to_formed() {
    let mut scene = small_scene();
    let mut store = MemoryStore::new();
    scene.upload(&mut store, photos(2), 1);
    scene.apply_gesture(Gesture::Point);
    let featured = scene.state().featured().cloned().expect("focus");
    run(&mut scene, 0.5);
    scene.remove(&mut store, &featured).expect("remove");
    assert_eq!(*scene.state(), AppState::Formed);
    assert!(scene.focus().photo().is_none());
    assert!(!scene.machine().history().contains(&featured));
    run(&mut scene, 0.5);
}

#[test]
fn toggle_does_not_leave_focus() {
    let mut scene = small_scene();
    assert!(scene.toggle());
    assert_eq!(*scene.state(), AppState::Formed);
    let mut store = MemoryStore::new();
    scene.upload(&mut store, photos(1), 1);
    scene.apply_gesture(Gesture::Point);
    assert!(!scene.toggle());
    assert!(matches!(scene.state(), AppState::Focus { .. }));
}

#[test]
fn empty_scene_runs() {
    let params = SceneParams {
        foliage_count: 0,
        ornament_count: 0,
        light_count: 0,
        ribbon_count: 0,
        snow_count: 0,
        halo_count: 0,
        ..SceneParams::default()
    };
    let mut scene = Scene::new(params, 0).expect("scene");
    scene.toggle();
    run(&mut scene, 0.5);
    assert!(scene.families().iter().all(|f| f.is_empty()));
}

#[test]
fn stored_photo_json_uses_camel_case() {
    let record = StoredPhoto {
        id: PhotoId::from("photo-1"),
        image: "data:image/jpeg;base64,AAAA".into(),
        aspect_ratio: 0.75,
        created_at_ms: 1_700_000_000_000,
    };
    let json = serde_json::to_string(&record).expect("json");
    assert!(json.contains("\"aspectRatio\":0.75"));
    assert!(json.contains("\"createdAtMs\":1700000000000"));
    assert!(json.contains("\"id\":\"photo-1\""));
    let back: StoredPhoto = serde_json::from_str(&json).expect("parse");
    assert_eq!(back, record);
}

#[test]
fn photo_pixels_must_match_their_dimensions() {
    let px = PhotoPixels::new(2, 3, vec![255; 24]).expect("2x3 rgba");
    assert_eq!((px.width(), px.height(), px.rgba().len()), (2, 3, 24));
    match PhotoPixels::new(2, 3, vec![0; 23]) {
        Err(SceneError::InvalidPixels { len, .. }) => assert_eq!(len, 23),
        other => panic!("expected invalid pixels, got {other:?}"),
    }
    assert!(PhotoPixels::new(0, 3, Vec::new()).is_err());
}

#[test]
fn large_photos_are_fitted_keeping_their_aspect() {
    assert_eq!(texture_extent(640, 480, 1024), (640, 480));
    assert_eq!(texture_extent(4000, 3000, 1024), (1024, 768));
    assert_eq!(texture_extent(1000, 8000, 1024), (128, 1024));
    assert_eq!(texture_extent(100_000, 1, 1024), (1024, 1));
}
