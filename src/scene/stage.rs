use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::foundation::core::{Affine, Canvas};
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::element::Element;

/// Identifier of an element mounted on a [`Stage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MountId(pub u64);

/// Host surface that off-screen clones are mounted on while they are being captured.
///
/// Captures never touch the caller's element directly: each export mounts its own clone sized to
/// the target resolution and unmounts it when the [`MountGuard`] drops.
#[derive(Clone, Debug, Default)]
pub struct Stage {
    inner: Arc<Mutex<StageInner>>,
}

#[derive(Debug, Default)]
struct StageInner {
    next_id: u64,
    mounted: BTreeMap<MountId, Canvas>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StageInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mount a detached clone of `element` fitted into `canvas`.
    pub fn mount_offscreen(&self, element: &Element, canvas: Canvas) -> ReelResult<MountGuard> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ReelError::validation(
                "off-screen clone width/height must be non-zero",
            ));
        }

        let id = {
            let mut inner = self.lock();
            let id = MountId(inner.next_id);
            inner.next_id += 1;
            inner.mounted.insert(id, canvas);
            id
        };
        tracing::debug!(id = id.0, canvas.width, canvas.height, "mounted off-screen clone");

        Ok(MountGuard {
            stage: self.clone(),
            staged: Arc::new(StagedElement {
                id,
                element: element.clone(),
                canvas,
                fit: fit_transform(element, canvas),
            }),
        })
    }

    pub fn is_mounted(&self, id: MountId) -> bool {
        self.lock().mounted.contains_key(&id)
    }

    pub fn mounted_count(&self) -> usize {
        self.lock().mounted.len()
    }

    fn unmount(&self, id: MountId) {
        if self.lock().mounted.remove(&id).is_some() {
            tracing::debug!(id = id.0, "unmounted off-screen clone");
        }
    }
}

/// Read-only view of a mounted clone shared with capture workers.
#[derive(Debug)]
pub struct StagedElement {
    id: MountId,
    element: Element,
    canvas: Canvas,
    fit: Affine,
}

impl StagedElement {
    pub fn id(&self) -> MountId {
        self.id
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Maps SVG user units into the clone's pixel box (uniform scale, centered).
    pub fn fit(&self) -> Affine {
        self.fit
    }
}

/// Keeps a clone mounted; unmounts it on drop, on every exit path.
#[derive(Debug)]
pub struct MountGuard {
    stage: Stage,
    staged: Arc<StagedElement>,
}

impl MountGuard {
    pub fn staged(&self) -> &Arc<StagedElement> {
        &self.staged
    }

    pub fn id(&self) -> MountId {
        self.staged.id
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        self.stage.unmount(self.staged.id);
    }
}

fn fit_transform(element: &Element, canvas: Canvas) -> Affine {
    let (w, h) = element.size();
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let s = (cw / w).min(ch / h);
    let tx = (cw - w * s) / 2.0;
    let ty = (ch - h * s) / 2.0;
    Affine::translate((tx, ty)) * Affine::scale(s)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/stage.rs"]
mod tests;
