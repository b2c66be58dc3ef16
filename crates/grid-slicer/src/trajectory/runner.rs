//! Background trajectory jobs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::SlicerConfig;
use crate::error::{Result, SliceError};

use super::integrate::{integrate_trajectories, Trajectory, TrajectoryRequest};

/// Shared cancellation flag for a background job.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Runs trajectory integrations off the async executor.
#[derive(Debug, Clone)]
pub struct TrajectoryRunner {
    max_steps: usize,
}

impl TrajectoryRunner {
    pub fn new(config: &SlicerConfig) -> Self {
        Self {
            max_steps: config.trajectory_max_steps,
        }
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Start a job. Must be called from within a Tokio runtime.
    pub fn submit(&self, request: TrajectoryRequest) -> TrajectoryHandle {
        self.submit_with_token(request, CancelToken::new())
    }

    /// Start a job that stops when `token` is cancelled.
    pub fn submit_with_token(&self, request: TrajectoryRequest, token: CancelToken) -> TrajectoryHandle {
        let max_steps = self.max_steps;
        let job_token = token.clone();

        let task = tokio::task::spawn_blocking(move || {
            if job_token.is_cancelled() {
                return Err(SliceError::Cancelled);
            }
            let started = std::time::Instant::now();
            let result = integrate_trajectories(&request, max_steps, &job_token);
            match &result {
                Ok(paths) => info!(
                    trajectories = paths.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Trajectory job finished"
                ),
                Err(SliceError::Cancelled) => warn!("Trajectory job cancelled"),
                Err(e) => warn!(error = %e, "Trajectory job failed"),
            }
            result
        });

        TrajectoryHandle { token, task }
    }
}

/// Handle to a running trajectory job.
pub struct TrajectoryHandle {
    token: CancelToken,
    task: JoinHandle<Result<Vec<Trajectory>>>,
}

impl TrajectoryHandle {
    /// Request cancellation. The job stops at its next step boundary.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the job's trajectories.
    pub async fn wait(self) -> Result<Vec<Trajectory>> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(SliceError::Internal(format!("trajectory task failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SpatialDomain;
    use crate::field::GriddedField;
    use chrono::{DateTime, Utc};
    use geo_common::{EarthLocation, LinearAxis};
    use test_utils::fixtures::time::HOURLY_STEPS;

    fn request() -> TrajectoryRequest {
        let times: Vec<DateTime<Utc>> = HOURLY_STEPS.iter().map(|s| s.parse().unwrap()).collect();
        let domain = SpatialDomain::lat_lon(LinearAxis::new(0.0, 1.0, 5), LinearAxis::new(0.0, 1.0, 5)).unwrap();
        let u = Arc::new(GriddedField::new("u", "u", "m/s", domain.clone(), times.clone(), vec![5.0; 75]).unwrap());
        let v = Arc::new(GriddedField::new("v", "v", "m/s", domain, times, vec![0.0; 75]).unwrap());
        TrajectoryRequest::new(u, v, vec![EarthLocation::surface(2.0, 1.0), EarthLocation::surface(3.0, 1.0)])
    }

    #[tokio::test]
    async fn test_submit_and_wait() {
        let runner = TrajectoryRunner::new(&SlicerConfig::default());
        let paths = tokio_test::assert_ok!(runner.submit(request()).wait().await);
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.len() == 3));
        assert!(paths[0].points[2].longitude > 1.0);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let runner = TrajectoryRunner::new(&SlicerConfig::default());
        let token = CancelToken::new();
        token.cancel();
        let result = runner.submit_with_token(request(), token).wait().await;
        assert!(matches!(result, Err(SliceError::Cancelled)));
    }

    #[tokio::test]
    async fn test_handle_cancel_sets_token() {
        let runner = TrajectoryRunner::new(&SlicerConfig::default());
        let handle = runner.submit(request());
        handle.cancel();
        assert!(handle.token().is_cancelled());
        // Either finished before noticing or stopped
        match handle.wait().await {
            Ok(paths) => assert_eq!(paths.len(), 2),
            Err(e) => assert!(matches!(e, SliceError::Cancelled)),
        }
    }
}
