use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::RunnerError;

use super::types::{RunnerStartArgs, Termination};

#[async_trait]
pub trait RunnerSession: Send {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    async fn kill(&mut self) -> anyhow::Result<()>;
    /// Must be cancel safe: the runtime races it against timeout and abort.
    async fn wait(&mut self) -> anyhow::Result<Termination>;
}

#[async_trait]
pub trait RunnerPlugin: Send + Sync {
    fn name(&self) -> &str;
    async fn start_session(
        &self,
        args: &RunnerStartArgs,
    ) -> Result<Box<dyn RunnerSession>, RunnerError>;
}
