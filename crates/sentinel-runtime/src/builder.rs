//! Pipeline Builder API
//!
//! Builder-style assembly for consumers (CLI, tests) that want to register
//! capabilities and start the pipeline in one expression.

use crate::pipeline::SentinelPipeline;
use sentinel_core::{
    DuplicatePolicy, PipelineConfig, Receiver, SentinelResult, Solver, Transmitter,
};
use std::sync::Arc;
use tracing::info;

/// Builder for a [`SentinelPipeline`]
pub struct PipelineBuilder<S: Solver + 'static> {
    config: PipelineConfig,
    solver: Arc<S>,
    receivers: Vec<Box<dyn Receiver>>,
    transmitters: Vec<Box<dyn Transmitter<S::Value>>>,
}

impl<S: Solver + 'static> PipelineBuilder<S> {
    /// Create a builder with the default configuration
    pub fn new(solver: S) -> Self {
        Self::with_shared_solver(Arc::new(solver))
    }

    pub fn with_shared_solver(solver: Arc<S>) -> Self {
        Self {
            config: PipelineConfig::default(),
            solver,
            receivers: Vec::new(),
            transmitters: Vec::new(),
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of compute workers
    pub fn compute_workers(mut self, workers: usize) -> Self {
        self.config.compute_workers = workers;
        self
    }

    /// Set the bit position of the group id
    pub fn id_shift(mut self, shift: u32) -> Self {
        self.config.id_shift = shift;
        self
    }

    /// Set the duplicate delivery policy
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.config.duplicate_policy = policy;
        self
    }

    /// Set the thread name prefix
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Add a receiver
    pub fn receiver<R: Receiver + 'static>(mut self, receiver: R) -> Self {
        self.receivers.push(Box::new(receiver));
        self
    }

    /// Add a transmitter
    pub fn transmitter<T>(mut self, transmitter: T) -> Self
    where
        T: Transmitter<S::Value> + 'static,
    {
        self.transmitters.push(Box::new(transmitter));
        self
    }

    /// Assemble an idle pipeline
    pub fn build(self) -> SentinelResult<SentinelPipeline<S>> {
        let mut pipeline = SentinelPipeline::with_shared_solver(self.config, self.solver)?;
        for receiver in self.receivers {
            pipeline.add_receiver(receiver)?;
        }
        for transmitter in self.transmitters {
            pipeline.add_transmitter(transmitter)?;
        }
        Ok(pipeline)
    }

    /// Assemble the pipeline and start it with the configured worker count
    pub fn start(self) -> SentinelResult<SentinelPipeline<S>> {
        let mut pipeline = self.build()?;
        pipeline.start_configured()?;
        info!(
            workers = pipeline.config().compute_workers,
            "pipeline started from builder"
        );
        Ok(pipeline)
    }
}
