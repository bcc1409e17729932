use std::sync::Arc;

use diffscope::pipeline::PipelineService;
use diffscope::queue::TaskQueue;

#[derive(Clone)]
pub struct HandlerState {
    pub pipeline: Arc<PipelineService>,

    pub queue: Arc<TaskQueue>,

    /// Shared secret for webhook signature verification. `None` disables
    /// verification (explicit opt-out).
    pub webhook_secret: Option<String>,
}

impl HandlerState {
    pub fn new(
        pipeline: Arc<PipelineService>,
        queue: Arc<TaskQueue>,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            pipeline,
            queue,
            webhook_secret,
        }
    }
}
