//! Scoped thumbnail capture.
//!
//! Capturing a thumbnail mutates host-wide visibility and view state. The
//! [`IsolationScope`] guard puts both back on every exit path: explicitly via
//! [`IsolationScope::finish`], or on drop when an error or panic unwinds past it.

use std::path::Path;

use log::{debug, warn};

use crate::error::CaptureError;
use crate::scene::FrameCapture;

/// Only `subject` visible and framed for as long as the scope lives.
pub struct IsolationScope<'s, S: FrameCapture> {
    scene: &'s mut S,
    subject: S::Handle,
    /// Subject visibility before the scope touched anything.
    subject_prior: S::Visibility,
    hidden: Vec<(S::Handle, S::Visibility)>,
    view_saved: bool,
    restored: bool,
}

impl<'s, S: FrameCapture> IsolationScope<'s, S> {
    /// Hide everything, show `subject` and fit the view on it.
    pub fn enter(scene: &'s mut S, subject: &S::Handle) -> Result<Self, CaptureError> {
        let subject_prior = scene.visibility(subject)?;
        let hidden = scene.hide_all()?;
        let mut scope = IsolationScope {
            scene,
            subject: subject.clone(),
            subject_prior,
            hidden,
            view_saved: false,
            restored: false,
        };
        // Errors from here on unwind through Drop, which restores visibility.
        scope.scene.show(std::slice::from_ref(subject))?;
        scope.scene.fit_view(subject)?;
        scope.view_saved = true;
        debug!(
            "isolated {:?} for capture ({} objects hidden)",
            scope.subject,
            scope.hidden.len()
        );
        Ok(scope)
    }

    pub fn scene(&mut self) -> &mut S {
        &mut *self.scene
    }

    /// Restore visibility and view, reporting the first restore failure.
    pub fn finish(mut self) -> Result<(), CaptureError> {
        self.restore()
    }

    fn restore(&mut self) -> Result<(), CaptureError> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        let mut first_err = None;
        if self.view_saved {
            if let Err(e) = self.scene.restore_view() {
                first_err.get_or_insert(e);
            }
        }
        for (node, prior) in std::mem::take(&mut self.hidden) {
            if let Err(e) = self.scene.set_visibility(&node, prior) {
                first_err.get_or_insert(e);
            }
        }
        if let Err(e) = self
            .scene
            .set_visibility(&self.subject, self.subject_prior.clone())
        {
            first_err.get_or_insert(e);
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<S: FrameCapture> Drop for IsolationScope<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!("failed to restore scene after capture: {e}");
        }
    }
}

/// Render `subject` alone into a square image at `path`.
pub fn capture_thumbnail<S: FrameCapture>(
    scene: &mut S,
    subject: &S::Handle,
    path: &Path,
    size: u32,
) -> Result<(), CaptureError> {
    let mut scope = IsolationScope::enter(scene, subject)?;
    let captured = scope.scene().capture_frame(path, size);
    let restored = scope.finish();
    captured?;
    restored
}
