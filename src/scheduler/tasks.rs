use tokio_util::sync::{CancellationToken, DropGuard};

use crate::render::executor::CancelFlag;

/// The surface's in-flight rasterization. Dropping the handle cancels the job.
#[derive(Debug)]
pub(crate) struct RenderTask {
    pub(crate) id: u64,
    cancel: CancelFlag,
}

impl RenderTask {
    pub(crate) fn new(id: u64, cancel: CancelFlag) -> Self {
        Self { id, cancel }
    }
}

impl Drop for RenderTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// The surface's in-flight resource resolutions. Dropping the handle cancels all of them.
#[derive(Debug)]
pub(crate) struct ProcessTask {
    pub(crate) id: u64,
    pub(crate) pending: usize,
    _guard: DropGuard,
}

impl ProcessTask {
    pub(crate) fn new(id: u64, token: CancellationToken, pending: usize) -> Self {
        Self {
            id,
            pending,
            _guard: token.drop_guard(),
        }
    }
}
