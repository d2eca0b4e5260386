use std::sync::Arc;

use tokio::runtime::{Builder, Handle, Runtime};
use tracing::debug;

use crate::{
    Config, Result, Session,
    persistence::{HttpBackend, WorkflowBackend},
};

pub struct SessionBuilder {
    config: Config,
    backend: Option<Arc<dyn WorkflowBackend>>,
    async_worker_thread_number: u16,
    rt: Option<Arc<Runtime>>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            backend: None,
            async_worker_thread_number: 2,
            rt: None,
        }
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    /// Backend to persist to. Without one, an [`HttpBackend`] is built from
    /// the backend section of the config.
    pub fn backend(
        mut self,
        backend: Arc<dyn WorkflowBackend>,
    ) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn async_worker_thread_number(
        mut self,
        n: u16,
    ) -> Self {
        self.async_worker_thread_number = n;
        self
    }

    pub fn runtime(
        mut self,
        runtime: Arc<Runtime>,
    ) -> Self {
        self.rt = Some(runtime);
        self
    }

    /// Builds the session and starts its background tasks. Runs on the
    /// given runtime, else on the current one, else on a runtime of its own.
    pub fn build(self) -> Result<Session> {
        let backend: Arc<dyn WorkflowBackend> = match self.backend {
            Some(backend) => backend,
            None => Arc::new(HttpBackend::new(&self.config.backend)?),
        };

        let (handle, owned) = match self.rt {
            Some(rt) => (rt.handle().clone(), Some(rt)),
            None => match Handle::try_current() {
                Ok(handle) => (handle, None),
                Err(_) => {
                    debug!("SessionBuilder::build: no runtime, starting one");
                    let rt = Arc::new(Builder::new_multi_thread().worker_threads(self.async_worker_thread_number.into()).enable_all().build()?);
                    (rt.handle().clone(), Some(rt))
                }
            },
        };

        let session = Session::new(self.config, backend, handle, owned);
        session.launch();
        Ok(session)
    }
}
