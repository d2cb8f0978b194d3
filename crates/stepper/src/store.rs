use crate::runner::Runner;
use crate::settings::{DELAY_MS_RANGE, Settings};
use crate::versioned::Versioned;
use rand::Rng;
use sssp::{
    EdgeId, GenerateError, GeneratorParams, Graph, GraphError, GraphType,
    NodeId, RunError, generate_graph, respace_spatial_weights,
};
use std::time::{Duration, Instant};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("no source node selected")]
    NoSource,
}

pub struct Store {
    pub graph: Versioned<Graph>,
    pub settings: Settings,
    pub viewport: (f64, f64),
    pub source: Option<NodeId>,
    pub destination: Option<NodeId>,
    /// Whether manually added edges are undirected.
    pub undirected: bool,
    pub has_negative_cycle: bool,
    /// Edge weights track node distances and follow every move.
    pub spatial_weights_locked: bool,
    pub runner: Runner,
    /// Graph version the runner's steps were generated from.
    steps_version: Option<u64>,
    pub notice: Option<String>,
    pub error_message: Option<String>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Store {
    pub fn new(settings: Settings) -> Self {
        let settings = settings.clamped();
        let runner = Runner::new(
            settings.generator.algorithm,
            settings.playback.delay(),
        );
        Self {
            graph: Versioned::new(Graph::default()),
            undirected: !settings.generator.is_directed,
            settings,
            viewport: (800.0, 600.0),
            source: None,
            destination: None,
            has_negative_cycle: false,
            spatial_weights_locked: false,
            runner,
            steps_version: None,
            notice: None,
            error_message: None,
        }
    }

    pub fn generator_params(&self) -> GeneratorParams {
        let (width, height) = self.viewport;
        self.settings.generator.to_params(width, height)
    }

    /// Drop the step log; called after every change that affects it.
    pub fn invalidate(&mut self) {
        self.runner.reset();
        self.steps_version = None;
    }

    /// Reset the runner if the graph moved since steps were generated.
    pub fn ensure_steps_fresh(&mut self) {
        if self.runner.is_empty() {
            self.steps_version = None;
            return;
        }
        if self.steps_version != Some(self.graph.version()) {
            tracing::debug!(
                graph_version = self.graph.version(),
                steps_version = ?self.steps_version,
                "steps are stale"
            );
            self.invalidate();
        }
    }

    // ---------------------------------------------------------------
    // Settings
    // ---------------------------------------------------------------

    pub fn apply_settings(&mut self, settings: Settings) {
        let settings = settings.clamped();
        self.runner.set_algorithm(settings.generator.algorithm);
        self.runner.set_delay(settings.playback.delay());
        self.settings = settings;
    }

    pub fn set_algorithm(&mut self, algorithm: sssp::Algorithm) {
        self.settings.generator.algorithm = algorithm;
        self.runner.set_algorithm(algorithm);
        self.invalidate();
    }

    pub fn set_delay_ms(&mut self, delay_ms: u64) {
        let delay_ms = DELAY_MS_RANGE.clamp(delay_ms as f64) as u64;
        self.settings.playback.delay_ms = delay_ms;
        self.runner.set_delay(Duration::from_millis(delay_ms));
    }

    // ---------------------------------------------------------------
    // Whole-graph operations
    // ---------------------------------------------------------------

    pub fn regenerate<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<(), EditError> {
        let params = self.generator_params();
        let generated = generate_graph(&params, rng)?;
        tracing::info!(
            nodes = generated.graph.node_count(),
            edges = generated.graph.edges.len(),
            source = generated.params.source_node,
            has_negative_cycle = generated.params.has_negative_cycle,
            "new graph"
        );
        self.graph.set(generated.graph);
        self.source = Some(generated.params.source_node);
        self.destination = None;
        self.undirected = !params.is_directed;
        self.has_negative_cycle = generated.params.has_negative_cycle;
        self.spatial_weights_locked = params.graph_type == GraphType::Spatial;
        self.notice = None;
        self.runner.set_algorithm(generated.params.algorithm);
        self.invalidate();
        Ok(())
    }

    pub fn clear_graph(&mut self) {
        self.graph.get_mut().clear();
        self.source = None;
        self.destination = None;
        self.has_negative_cycle = false;
        self.spatial_weights_locked = false;
        self.notice = None;
        self.invalidate();
    }

    /// Scale node positions to a new viewport size.
    pub fn resize_viewport(&mut self, width: f64, height: f64) {
        let (old_w, old_h) = self.viewport;
        if !(width > 0.0 && height > 0.0) || (width, height) == self.viewport {
            return;
        }
        self.viewport = (width, height);
        let (sx, sy) = (width / old_w, height / old_h);
        for node in &mut self.graph.get_mut().nodes {
            node.x *= sx;
            node.y *= sy;
        }
        self.respace();
        self.invalidate();
    }

    fn respace(&mut self) {
        if !self.spatial_weights_locked {
            return;
        }
        let params = GeneratorParams {
            graph_type: GraphType::Spatial,
            ..self.generator_params()
        };
        respace_spatial_weights(self.graph.get_mut(), &params);
    }

    fn detach_spatial_weights(&mut self) {
        if self.spatial_weights_locked {
            self.spatial_weights_locked = false;
            self.notice =
                Some("Edge weights no longer follow node distances".into());
            tracing::info!("spatial weights detached by manual edit");
        }
    }

    // ---------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------

    pub fn set_source(&mut self, node: NodeId) -> Result<(), EditError> {
        if !self.graph.get().contains_node(node) {
            return Err(GraphError::UnknownNode(node).into());
        }
        self.source = Some(node);
        self.invalidate();
        Ok(())
    }

    pub fn set_destination(
        &mut self,
        node: Option<NodeId>,
    ) -> Result<(), EditError> {
        if let Some(id) = node
            && !self.graph.get().contains_node(id)
        {
            return Err(GraphError::UnknownNode(id).into());
        }
        self.destination = node;
        self.invalidate();
        Ok(())
    }

    /// Path from the source to the selected destination, when the run
    /// produced one.
    pub fn destination_path(&self) -> Option<&[NodeId]> {
        self.runner.result()?.path(self.destination?)
    }

    // ---------------------------------------------------------------
    // Node edits
    // ---------------------------------------------------------------

    pub fn add_node(&mut self, x: f64, y: f64) -> NodeId {
        let id = self.graph.get_mut().add_node(x, y);
        if self.source.is_none() {
            self.source = Some(id);
        }
        self.invalidate();
        id
    }

    pub fn remove_node(&mut self, node: NodeId) -> Result<(), EditError> {
        self.graph.try_update(|g| g.remove_node(node))?;
        if self.source == Some(node) {
            self.source = self.graph.get().node_ids().next();
        }
        if self.destination == Some(node) {
            self.destination = None;
        }
        self.invalidate();
        Ok(())
    }

    pub fn move_node(
        &mut self,
        node: NodeId,
        x: f64,
        y: f64,
    ) -> Result<(), EditError> {
        self.graph.try_update(|g| g.move_node(node, x, y))?;
        self.respace();
        self.invalidate();
        Ok(())
    }

    // ---------------------------------------------------------------
    // Edge edits
    // ---------------------------------------------------------------

    /// Add an edge. Without an explicit weight the edge takes its
    /// spatial weight, or the minimum configured weight.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        weight: Option<f64>,
    ) -> Result<EdgeId, EditError> {
        let undirected = self.undirected;
        let min_weight = self.settings.generator.min_weight;
        let id = self.graph.try_update(|g| {
            g.add_edge(source, target, weight.unwrap_or(min_weight), undirected)
        })?;
        match weight {
            Some(_) => self.detach_spatial_weights(),
            None => self.respace(),
        }
        self.invalidate();
        Ok(id)
    }

    pub fn remove_edge(&mut self, edge: &EdgeId) -> Result<(), EditError> {
        self.graph.try_update(|g| g.remove_edge(edge))?;
        self.invalidate();
        Ok(())
    }

    pub fn reweight_edge(
        &mut self,
        edge: &EdgeId,
        weight: f64,
    ) -> Result<(), EditError> {
        self.graph.try_update(|g| g.set_weight(edge, weight))?;
        self.detach_spatial_weights();
        self.invalidate();
        Ok(())
    }

    // ---------------------------------------------------------------
    // Runner bridge
    // ---------------------------------------------------------------

    fn require_source(&self) -> Result<NodeId, EditError> {
        self.source.ok_or(EditError::NoSource)
    }

    pub fn generate_steps(&mut self) -> Result<usize, EditError> {
        let source = self.require_source()?;
        let count = self.runner.generate_steps(self.graph.get(), source)?;
        self.steps_version = Some(self.graph.version());
        Ok(count)
    }

    pub fn play(&mut self, now: Instant) -> Result<(), EditError> {
        let source = self.require_source()?;
        self.ensure_steps_fresh();
        self.runner.play(self.graph.get(), source, now)?;
        self.steps_version = Some(self.graph.version());
        Ok(())
    }

    pub fn set_mode(
        &mut self,
        mode: crate::runner::Mode,
    ) -> Result<(), EditError> {
        let source = self.require_source()?;
        self.ensure_steps_fresh();
        self.runner.set_mode(mode, self.graph.get(), source)?;
        self.steps_version = Some(self.graph.version());
        Ok(())
    }
}
