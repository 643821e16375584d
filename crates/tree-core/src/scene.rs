//! Scene orchestrator: owns every animated component and advances them in a
//! fixed order once per frame.

use crate::camera::Camera;
use crate::constants::*;
use crate::curve::RibbonCurve;
use crate::error::{SceneError, StoreError};
use crate::focus::{FocusController, FocusParams};
use crate::frame::FrameContext;
use crate::gesture::{Gesture, HandPose};
use crate::handoff::Latest;
use crate::layout::TreeShape;
use crate::particles::{FairyLights, Foliage, Halo, Ornaments, ParticleFamily, RibbonSnow};
use crate::photos::{Photo, PhotoCollection, PhotoId};
use crate::rotation::{RotationController, RotationParams};
use crate::state::{AppState, StateMachine};
use crate::store::{PhotoStore, StoredPhoto};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Runtime sizing and rates. `Default` is the full-size scene.
#[derive(Clone, Debug)]
pub struct SceneParams {
    pub foliage_count: usize,
    pub ornament_count: usize,
    pub light_count: usize,
    pub ribbon_count: usize,
    pub snow_count: usize,
    pub halo_count: usize,
    pub foliage_rate: f32,
    pub ornament_rate: f32,
    pub light_rate: f32,
    pub ribbon_rate: f32,
    pub halo_rate: f32,
    pub shape: TreeShape,
    pub curve: RibbonCurve,
    pub rotation: RotationParams,
    pub focus: FocusParams,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            foliage_count: FOLIAGE_COUNT,
            ornament_count: ORNAMENT_COUNT,
            light_count: LIGHT_COUNT,
            ribbon_count: RIBBON_COUNT,
            snow_count: SNOW_COUNT,
            halo_count: HALO_COUNT,
            foliage_rate: FOLIAGE_RATE,
            ornament_rate: ORNAMENT_RATE,
            light_rate: LIGHT_RATE,
            ribbon_rate: RIBBON_RATE,
            halo_rate: HALO_RATE,
            shape: TreeShape::default(),
            curve: RibbonCurve::default(),
            rotation: RotationParams::default(),
            focus: FocusParams::default(),
        }
    }
}

impl SceneParams {
    /// Same shape and rates with every particle count divided by `factor`.
    pub fn scaled_down(factor: usize) -> Self {
        let f = factor.max(1);
        let d = Self::default();
        Self {
            foliage_count: d.foliage_count / f,
            ornament_count: d.ornament_count / f,
            light_count: d.light_count / f,
            ribbon_count: d.ribbon_count / f,
            snow_count: d.snow_count / f,
            halo_count: d.halo_count / f,
            ..d
        }
    }
}

/// A photo handed to `Scene::upload` before it has an id.
#[derive(Clone, Debug)]
pub struct NewPhoto {
    pub image: String,
    pub aspect_ratio: f32,
}

#[derive(Debug, Default)]
pub struct UploadReport {
    pub added: Vec<PhotoId>,
    pub failed: Vec<SceneError>,
}

pub struct Scene {
    rng: StdRng,
    curve: RibbonCurve,
    foliage: Foliage,
    ornaments: Ornaments,
    lights: FairyLights,
    ribbon: RibbonSnow,
    halo: Halo,
    photos: PhotoCollection,
    machine: StateMachine,
    rotation: RotationController,
    focus: FocusController,
    camera: Camera,
    gesture: Latest<Gesture>,
    hand_pose: Latest<HandPose>,
}

impl Scene {
    pub fn new(params: SceneParams, seed: u64) -> Result<Self, SceneError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let shape = params.shape;
        let scene = Self {
            foliage: Foliage::new(&mut rng, params.foliage_count, &shape, params.foliage_rate)?,
            ornaments: Ornaments::new(
                &mut rng,
                params.ornament_count,
                &shape,
                params.ornament_rate,
            )?,
            lights: FairyLights::new(&mut rng, params.light_count, &shape, params.light_rate)?,
            ribbon: RibbonSnow::new(
                &mut rng,
                params.ribbon_count,
                params.snow_count,
                &params.curve,
                params.ribbon_rate,
            )?,
            halo: Halo::new(&mut rng, params.halo_count, params.halo_rate)?,
            rng,
            curve: params.curve,
            photos: PhotoCollection::new(),
            machine: StateMachine::default(),
            rotation: RotationController::new(params.rotation),
            focus: FocusController::new(params.focus),
            camera: Camera::default(),
            gesture: Latest::new(),
            hand_pose: Latest::new(),
        };
        log::info!(
            "[scene] created with {} particles",
            scene.families().iter().map(|f| f.len()).sum::<usize>()
        );
        Ok(scene)
    }

    pub fn families(&self) -> [&dyn ParticleFamily; 5] {
        [
            &self.foliage,
            &self.ornaments,
            &self.lights,
            &self.ribbon,
            &self.halo,
        ]
    }

    fn families_mut(&mut self) -> [&mut dyn ParticleFamily; 5] {
        [
            &mut self.foliage,
            &mut self.ornaments,
            &mut self.lights,
            &mut self.ribbon,
            &mut self.halo,
        ]
    }

    /// Jump every family to the layout implied by the current state.
    pub fn snap_to_state(&mut self) {
        let formed = self.machine.state().is_formed();
        for family in self.families_mut() {
            family.snap(formed);
        }
    }

    pub fn foliage(&self) -> &Foliage {
        &self.foliage
    }

    pub fn ornaments(&self) -> &Ornaments {
        &self.ornaments
    }

    pub fn lights(&self) -> &FairyLights {
        &self.lights
    }

    pub fn ribbon(&self) -> &RibbonSnow {
        &self.ribbon
    }

    pub fn halo(&self) -> &Halo {
        &self.halo
    }

    pub fn photos(&self) -> &PhotoCollection {
        &self.photos
    }

    pub fn state(&self) -> &AppState {
        self.machine.state()
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn rotation(&self) -> &RotationController {
        &self.rotation
    }

    pub fn rotation_mut(&mut self) -> &mut RotationController {
        &mut self.rotation
    }

    pub fn focus(&self) -> &FocusController {
        &self.focus
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Cell the gesture loop writes debounced gestures into.
    pub fn gesture_sink(&self) -> Latest<Gesture> {
        self.gesture.clone()
    }

    /// Cell the gesture loop writes the hand pose into (`None` = no hand).
    pub fn hand_pose_sink(&self) -> Latest<HandPose> {
        self.hand_pose.clone()
    }

    /// Populate from the store. On failure the scene stays in chaos with no
    /// photos and the error is returned for logging.
    pub fn load_from_store(&mut self, store: &dyn PhotoStore) -> Result<usize, SceneError> {
        let records = store.list_all()?;
        let mut loaded = 0;
        for record in records {
            match Photo::new(record.id, record.image, record.aspect_ratio) {
                Ok(photo) => {
                    if self.photos.insert(photo) {
                        loaded += 1;
                    }
                }
                Err(e) => log::warn!("[store] skipping record: {e}"),
            }
        }
        if loaded > 0 {
            self.photos.regenerate(&mut self.rng, &self.curve);
            self.machine.on_upload();
        }
        log::info!("[store] loaded {loaded} photos");
        Ok(loaded)
    }

    /// Store then admit each photo; items that fail are skipped and reported.
    /// Ends in formed if anything was admitted.
    pub fn upload(
        &mut self,
        store: &mut dyn PhotoStore,
        items: Vec<NewPhoto>,
        now_ms: u64,
    ) -> UploadReport {
        let mut report = UploadReport::default();
        for (i, item) in items.into_iter().enumerate() {
            let id = PhotoId::generate(&mut self.rng, now_ms + i as u64);
            let photo = match Photo::new(id.clone(), item.image, item.aspect_ratio) {
                Ok(p) => p,
                Err(e) => {
                    report.failed.push(e);
                    continue;
                }
            };
            let record = StoredPhoto {
                id: id.clone(),
                image: photo.image.clone(),
                aspect_ratio: photo.aspect_ratio,
                created_at_ms: now_ms + i as u64,
            };
            if let Err(e) = store.put(&record) {
                log::error!("[store] failed to save {id}: {e}");
                report.failed.push(e.into());
                continue;
            }
            if self.photos.insert(photo) {
                report.added.push(id);
            }
        }
        if !report.added.is_empty() {
            self.photos.regenerate(&mut self.rng, &self.curve);
            self.machine.on_upload();
            log::info!("[scene] added {} photos", report.added.len());
        }
        report
    }

    /// Delete from the store first; on failure nothing changes.
    pub fn remove(&mut self, store: &mut dyn PhotoStore, id: &PhotoId) -> Result<(), SceneError> {
        if !self.photos.contains(id) {
            return Err(SceneError::UnknownPhoto(id.to_string()));
        }
        match store.delete(id) {
            Ok(()) | Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        self.photos.remove(id);
        self.photos.regenerate(&mut self.rng, &self.curve);
        self.machine.on_removed(id);
        if self.focus.photo() == Some(id) {
            self.focus.release();
        }
        log::info!("[scene] removed {id}");
        Ok(())
    }

    pub fn toggle(&mut self) -> bool {
        self.machine.toggle()
    }

    /// Feed a gesture straight to the state machine, bypassing the sink.
    pub fn apply_gesture(&mut self, gesture: Gesture) {
        let ids = self.photos.ids();
        let t = self.machine.on_gesture(gesture, &ids, &mut self.rng);
        if t.release_hand {
            self.hand_pose.clear();
        }
    }

    pub fn pointer_down(&mut self, x: f32) {
        self.rotation.pointer_down(x);
    }

    pub fn pointer_move(&mut self, x: f32, viewport_width: f32) {
        self.rotation.pointer_move(x, viewport_width);
    }

    pub fn pointer_up(&mut self) {
        self.rotation.pointer_up();
    }

    pub fn frame(&mut self, ctx: &FrameContext) {
        if let Some(g) = self.gesture.take() {
            self.apply_gesture(g);
        }

        let formed = self.machine.state().is_formed();
        for family in self.families_mut() {
            family.set_formed(formed);
        }

        // Hand rotation is suspended while a photo is featured.
        let featured = self.machine.featured().cloned();
        let pose = match featured {
            Some(_) => None,
            None => self.hand_pose.get(),
        };
        self.rotation.update(ctx, pose);

        for family in self.families_mut() {
            family.update(ctx);
        }

        let parent = self.rotation.transform();
        for photo in self.photos.iter_mut() {
            if Some(&photo.id) != featured.as_ref() {
                photo.animate(formed, featured.is_some(), ctx.dt);
            }
        }
        match featured.as_ref().and_then(|id| self.photos.get_mut(id)) {
            Some(photo) => self.focus.update(photo, parent, &self.camera, ctx.dt),
            None => self.focus.release(),
        }
    }
}
