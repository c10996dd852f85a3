//! Visualization lifecycle controller.
//!
//! The controller owns a single chart slot. `show` always tears the live
//! instance down before asking the backend for a new one, and a failed
//! construction leaves the slot empty. At no point do two live instances
//! exist.

use serde::Serialize;
use tracing::{debug, error};

use crate::error::RenderError;
use crate::visualization::VisualizationSpec;

/// Rendering backend that turns specs into live chart instances.
pub trait ChartRenderer: Send {
    /// Handle to a live instance.
    type Handle: Send;

    /// Construct a live instance from a normalized spec.
    fn create(&mut self, spec: &VisualizationSpec) -> Result<Self::Handle, RenderError>;

    /// Tear down a live instance.
    fn destroy(&mut self, handle: Self::Handle);
}

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartState {
    /// No live instance.
    Hidden,
    /// Exactly one live instance.
    Visible,
}

struct LiveChart<H> {
    handle: H,
    spec: VisualizationSpec,
}

/// Owner of the at-most-one live chart.
pub struct VisualizationController<R: ChartRenderer> {
    renderer: R,
    live: Option<LiveChart<R::Handle>>,
}

impl<R: ChartRenderer> VisualizationController<R> {
    /// Create a controller in the `hidden` state.
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            live: None,
        }
    }

    /// Replace whatever is shown with `spec`.
    ///
    /// # Errors
    /// Returns the backend error when construction fails; the controller is
    /// then `hidden`.
    pub fn show(&mut self, spec: &VisualizationSpec) -> Result<(), RenderError> {
        self.teardown();

        match self.renderer.create(spec) {
            Ok(handle) => {
                debug!(kind = %spec.kind(), title = %spec.title(), "Chart shown");
                self.live = Some(LiveChart {
                    handle,
                    spec: spec.clone(),
                });
                Ok(())
            }
            Err(e) => {
                error!(error = %e, title = %spec.title(), "Chart construction failed");
                Err(e)
            }
        }
    }

    /// Tear down the live chart, if any. Idempotent.
    pub fn hide(&mut self) {
        if self.teardown() {
            debug!("Chart hidden");
        }
    }

    /// `Some(spec)` shows, `None` hides. There is no "keep previous chart".
    pub fn apply(&mut self, spec: Option<&VisualizationSpec>) -> Result<(), RenderError> {
        match spec {
            Some(spec) => self.show(spec),
            None => {
                self.hide();
                Ok(())
            }
        }
    }

    /// Current state.
    pub fn state(&self) -> ChartState {
        if self.live.is_some() {
            ChartState::Visible
        } else {
            ChartState::Hidden
        }
    }

    /// Number of live instances (0 or 1).
    pub fn live_count(&self) -> usize {
        usize::from(self.live.is_some())
    }

    /// Spec of the live chart.
    pub fn current(&self) -> Option<&VisualizationSpec> {
        self.live.as_ref().map(|live| &live.spec)
    }

    /// The rendering backend.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    fn teardown(&mut self) -> bool {
        match self.live.take() {
            Some(live) => {
                self.renderer.destroy(live.handle);
                true
            }
            None => false,
        }
    }
}

impl<R: ChartRenderer> Drop for VisualizationController<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualization::{ChartData, ChartKind, Series};

    /// Tracks live instances and asserts the backend never holds two.
    #[derive(Default)]
    struct CountingRenderer {
        next_id: u32,
        live: Vec<u32>,
        created: usize,
        destroyed: usize,
        fail_next: bool,
    }

    impl ChartRenderer for CountingRenderer {
        type Handle = u32;

        fn create(&mut self, _spec: &VisualizationSpec) -> Result<u32, RenderError> {
            if std::mem::take(&mut self.fail_next) {
                return Err(RenderError::Backend {
                    message: "canvas lost".to_string(),
                });
            }
            assert!(self.live.is_empty(), "create called with a live instance");
            self.next_id += 1;
            self.created += 1;
            self.live.push(self.next_id);
            Ok(self.next_id)
        }

        fn destroy(&mut self, handle: u32) {
            self.destroyed += 1;
            self.live.retain(|&id| id != handle);
        }
    }

    fn spec(title: &str) -> VisualizationSpec {
        VisualizationSpec::new(
            ChartKind::Bar,
            title,
            ChartData::new(["a"], vec![Series::new("s", &[1.0])]),
        )
    }

    #[test]
    fn test_starts_hidden() {
        let controller = VisualizationController::new(CountingRenderer::default());
        assert_eq!(controller.state(), ChartState::Hidden);
        assert_eq!(controller.live_count(), 0);
        assert!(controller.current().is_none());
    }

    #[test]
    fn test_show_then_show_destroys_first() {
        let mut controller = VisualizationController::new(CountingRenderer::default());
        controller.show(&spec("one")).unwrap();
        controller.show(&spec("two")).unwrap();

        assert_eq!(controller.state(), ChartState::Visible);
        assert_eq!(controller.live_count(), 1);
        assert_eq!(controller.renderer().live, vec![2]);
        assert_eq!(controller.renderer().destroyed, 1);
        assert_eq!(controller.current().unwrap().title(), "two");
    }

    #[test]
    fn test_rapid_shows_keep_one_live() {
        let mut controller = VisualizationController::new(CountingRenderer::default());
        for i in 0..20 {
            controller.show(&spec(&format!("chart {}", i))).unwrap();
            assert_eq!(controller.renderer().live.len(), 1);
        }
        assert_eq!(controller.renderer().created, 20);
        assert_eq!(controller.renderer().destroyed, 19);
    }

    #[test]
    fn test_hide_is_idempotent() {
        let mut controller = VisualizationController::new(CountingRenderer::default());
        controller.show(&spec("one")).unwrap();
        controller.hide();
        controller.hide();

        assert_eq!(controller.state(), ChartState::Hidden);
        assert_eq!(controller.live_count(), 0);
        assert_eq!(controller.renderer().destroyed, 1);
    }

    #[test]
    fn test_hide_when_hidden_is_noop() {
        let mut controller = VisualizationController::new(CountingRenderer::default());
        controller.hide();
        assert_eq!(controller.state(), ChartState::Hidden);
        assert_eq!(controller.renderer().destroyed, 0);
    }

    #[test]
    fn test_failed_construction_reverts_to_hidden() {
        let mut controller = VisualizationController::new(CountingRenderer::default());
        controller.show(&spec("one")).unwrap();

        let mut renderer_fail = CountingRenderer::default();
        renderer_fail.fail_next = true;
        let mut failing = VisualizationController::new(renderer_fail);
        assert!(failing.show(&spec("x")).is_err());
        assert_eq!(failing.state(), ChartState::Hidden);

        // Failure after a live chart still tears the old one down
        controller.renderer.fail_next = true;
        assert!(controller.show(&spec("two")).is_err());
        assert_eq!(controller.state(), ChartState::Hidden);
        assert!(controller.renderer().live.is_empty());
    }

    #[test]
    fn test_apply_maps_option_to_show_or_hide() {
        let mut controller = VisualizationController::new(CountingRenderer::default());
        controller.apply(Some(&spec("one"))).unwrap();
        assert_eq!(controller.state(), ChartState::Visible);
        controller.apply(None).unwrap();
        assert_eq!(controller.state(), ChartState::Hidden);
    }
}
