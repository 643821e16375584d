//! Application state machine: chaos, formed, and focus on one photo.

use crate::constants::HISTORY_CAPACITY;
use crate::gesture::Gesture;
use crate::photos::PhotoId;
use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;
use std::collections::VecDeque;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppState {
    Chaos,
    Formed,
    /// Always carries the featured photo; leaving focus drops it.
    Focus { photo: PhotoId },
}

impl AppState {
    /// Whether particle families should be heading for the formed layout.
    pub fn is_formed(&self) -> bool {
        !matches!(self, AppState::Chaos)
    }

    pub fn featured(&self) -> Option<&PhotoId> {
        match self {
            AppState::Focus { photo } => Some(photo),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AppState::Chaos => "chaos",
            AppState::Formed => "formed",
            AppState::Focus { .. } => "focus",
        }
    }
}

/// Bounded queue of recently featured photos, oldest first.
#[derive(Clone, Debug)]
pub struct FeaturedHistory {
    ids: VecDeque<PhotoId>,
    capacity: usize,
}

impl Default for FeaturedHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl FeaturedHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, id: PhotoId) {
        self.ids.push_back(id);
        while self.ids.len() > self.capacity {
            self.ids.pop_front();
        }
    }

    pub fn contains(&self, id: &PhotoId) -> bool {
        self.ids.contains(id)
    }

    pub fn most_recent(&self) -> Option<&PhotoId> {
        self.ids.back()
    }

    pub fn remove(&mut self, id: &PhotoId) {
        self.ids.retain(|h| h != id);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhotoId> {
        self.ids.iter()
    }
}

/// Picks the next photo to feature.
///
/// Photos not in the history come first. If every photo is in the history,
/// only the most recent one is excluded, and a single photo may repeat.
/// Returns `None` only for an empty candidate list.
pub fn select_photo<'a, R: Rng + ?Sized>(
    rng: &mut R,
    candidates: &'a [PhotoId],
    history: &FeaturedHistory,
) -> Option<&'a PhotoId> {
    if candidates.len() <= 1 {
        return candidates.first();
    }
    let fresh: SmallVec<[&PhotoId; 16]> =
        candidates.iter().filter(|id| !history.contains(id)).collect();
    if !fresh.is_empty() {
        return fresh.choose(rng).copied();
    }
    let last = history.most_recent();
    let others: SmallVec<[&PhotoId; 16]> =
        candidates.iter().filter(|id| Some(*id) != last).collect();
    others.choose(rng).copied()
}

/// What a transition asks of the rest of the scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Transition {
    pub changed: bool,
    /// Drop any hand-driven rotation so the scene idles while focused.
    pub release_hand: bool,
}

impl Transition {
    fn changed(changed: bool) -> Self {
        Self {
            changed,
            release_hand: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StateMachine {
    state: AppState,
    history: FeaturedHistory,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(AppState::Chaos)
    }
}

impl StateMachine {
    pub fn new(initial: AppState) -> Self {
        Self {
            state: initial,
            history: FeaturedHistory::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn featured(&self) -> Option<&PhotoId> {
        self.state.featured()
    }

    pub fn history(&self) -> &FeaturedHistory {
        &self.history
    }

    fn set(&mut self, next: AppState) -> bool {
        if self.state == next {
            return false;
        }
        log::info!("[state] {} -> {}", self.state.name(), next.name());
        self.state = next;
        true
    }

    pub fn on_gesture<R: Rng + ?Sized>(
        &mut self,
        gesture: Gesture,
        photos: &[PhotoId],
        rng: &mut R,
    ) -> Transition {
        match gesture {
            Gesture::None => Transition::default(),
            Gesture::Open => Transition::changed(self.set(AppState::Chaos)),
            Gesture::Fist => Transition::changed(self.set(AppState::Formed)),
            Gesture::Point => {
                if matches!(self.state, AppState::Focus { .. }) {
                    return Transition::default();
                }
                let Some(photo) = select_photo(rng, photos, &self.history).cloned() else {
                    log::debug!("[state] point ignored, no photos");
                    return Transition::default();
                };
                self.history.push(photo.clone());
                self.set(AppState::Focus { photo });
                Transition {
                    changed: true,
                    release_hand: true,
                }
            }
        }
    }

    /// Chaos and formed swap; focus is left alone.
    pub fn toggle(&mut self) -> bool {
        match self.state {
            AppState::Chaos => self.set(AppState::Formed),
            AppState::Formed => self.set(AppState::Chaos),
            AppState::Focus { .. } => false,
        }
    }

    pub fn on_upload(&mut self) -> bool {
        self.set(AppState::Formed)
    }

    /// Prunes `id` from the history. If it was featured, focus falls back to
    /// formed.
    pub fn on_removed(&mut self, id: &PhotoId) -> bool {
        self.history.remove(id);
        if self.state.featured() == Some(id) {
            return self.set(AppState::Formed);
        }
        false
    }
}
