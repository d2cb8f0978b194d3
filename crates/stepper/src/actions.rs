use crate::effects::Effect;
use crate::runner::Mode;
use crate::settings::GeneratorSettings;
use crate::store::{EditError, Store};
use sssp::{Algorithm, EdgeId, NodeId};
use std::path::PathBuf;
use std::time::Instant;

/// Actions that can be dispatched to modify the stepper state
#[derive(Debug, Clone)]
pub enum Action {
    // Graph Actions
    /// Generate a fresh graph; `seed` makes it reproducible
    GenerateGraph { seed: Option<u64> },
    /// Remove every node and edge
    ClearGraph,
    /// Replace the generator settings used by the next generation
    SetGeneratorSettings { settings: GeneratorSettings },
    /// Switch between Dijkstra and Bellman-Ford
    SetAlgorithm { algorithm: Algorithm },
    /// Scale node positions to a new viewport
    ResizeViewport { width: f64, height: f64 },

    // Selection Actions
    SetSource { node: NodeId },
    SetDestination { node: Option<NodeId> },

    // Node Actions
    AddNode { x: f64, y: f64 },
    RemoveNode { node: NodeId },
    /// Drag a node; spatial weights follow
    MoveNode { node: NodeId, x: f64, y: f64 },

    // Edge Actions
    /// Add an edge; without a weight it gets its spatial or default weight
    AddEdge {
        source: NodeId,
        target: NodeId,
        weight: Option<f64>,
    },
    RemoveEdge { edge: EdgeId },
    ReweightEdge { edge: EdgeId, weight: f64 },

    // Playback Actions
    /// Start playback, or toggle pause while playing
    Play { now: Instant },
    Pause,
    Resume { now: Instant },
    Step,
    BackStep,
    ForwardStep,
    SeekTo { index: usize },
    Reset,
    GenerateSteps,
    SetMode { mode: Mode },
    SetDelay { delay_ms: u64 },

    // File Operations
    LoadSettings { path: PathBuf },
    /// Clear any error message
    ClearErrorMessage,
    ClearNotice,
}

/// Apply an action to the store, returning effects to run afterwards.
pub fn update(store: &mut Store, action: Action) -> Vec<Effect> {
    tracing::debug!(?action, "dispatch");
    let mut effects = Vec::new();
    let outcome: Result<(), EditError> = match action {
        Action::GenerateGraph { seed } => {
            effects.push(Effect::GenerateGraph { seed });
            Ok(())
        }
        Action::ClearGraph => {
            store.clear_graph();
            Ok(())
        }
        Action::SetGeneratorSettings { settings } => {
            let mut next = store.settings.clone();
            next.generator = settings;
            store.apply_settings(next);
            Ok(())
        }
        Action::SetAlgorithm { algorithm } => {
            store.set_algorithm(algorithm);
            Ok(())
        }
        Action::ResizeViewport { width, height } => {
            store.resize_viewport(width, height);
            Ok(())
        }

        Action::SetSource { node } => store.set_source(node),
        Action::SetDestination { node } => store.set_destination(node),

        Action::AddNode { x, y } => {
            store.add_node(x, y);
            Ok(())
        }
        Action::RemoveNode { node } => store.remove_node(node),
        Action::MoveNode { node, x, y } => store.move_node(node, x, y),

        Action::AddEdge {
            source,
            target,
            weight,
        } => store.add_edge(source, target, weight).map(|_| ()),
        Action::RemoveEdge { edge } => store.remove_edge(&edge),
        Action::ReweightEdge { edge, weight } => {
            store.reweight_edge(&edge, weight)
        }

        Action::Play { now } => store.play(now),
        Action::Pause => {
            store.runner.pause();
            Ok(())
        }
        Action::Resume { now } => {
            store.runner.resume(now);
            Ok(())
        }
        Action::Step => {
            store.runner.step();
            Ok(())
        }
        Action::BackStep => {
            store.runner.back_step();
            Ok(())
        }
        Action::ForwardStep => {
            store.runner.forward_step();
            Ok(())
        }
        Action::SeekTo { index } => {
            store.runner.seek(index);
            Ok(())
        }
        Action::Reset => {
            store.invalidate();
            Ok(())
        }
        Action::GenerateSteps => store.generate_steps().map(|_| ()),
        Action::SetMode { mode } => store.set_mode(mode),
        Action::SetDelay { delay_ms } => {
            store.set_delay_ms(delay_ms);
            Ok(())
        }

        Action::LoadSettings { path } => {
            effects.push(Effect::LoadSettings { path });
            Ok(())
        }
        Action::ClearErrorMessage => {
            store.error_message = None;
            Ok(())
        }
        Action::ClearNotice => {
            store.notice = None;
            Ok(())
        }
    };

    if let Err(e) = outcome {
        tracing::warn!(error = %e, "edit rejected");
        store.error_message = Some(e.to_string());
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Phase;
    use sssp::GraphError;

    fn triangle() -> Store {
        let mut store = Store::default();
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)] {
            update(&mut store, Action::AddNode { x, y });
        }
        for (source, target) in [(0, 1), (1, 2)] {
            update(
                &mut store,
                Action::AddEdge {
                    source,
                    target,
                    weight: Some(1.0),
                },
            );
        }
        store
    }

    #[test]
    fn test_rejected_edit_sets_error_message() {
        let mut store = triangle();
        let before = store.graph.get().clone();
        update(
            &mut store,
            Action::AddEdge {
                source: 0,
                target: 7,
                weight: Some(1.0),
            },
        );
        assert_eq!(
            store.error_message,
            Some(GraphError::UnknownNode(7).to_string())
        );
        assert_eq!(store.graph.get(), &before);

        update(&mut store, Action::ClearErrorMessage);
        assert_eq!(store.error_message, None);
    }

    #[test]
    fn test_deferred_actions_emit_effects() {
        let mut store = Store::default();
        let effects = update(&mut store, Action::GenerateGraph { seed: Some(1) });
        assert!(matches!(
            effects.as_slice(),
            [Effect::GenerateGraph { seed: Some(1) }]
        ));
        let effects = update(
            &mut store,
            Action::LoadSettings {
                path: PathBuf::from("settings.json"),
            },
        );
        assert!(matches!(effects.as_slice(), [Effect::LoadSettings { .. }]));
    }

    #[test]
    fn test_playback_actions() {
        let mut store = triangle();
        let now = Instant::now();
        update(&mut store, Action::Play { now });
        assert_eq!(store.runner.phase(), Phase::Running);
        update(&mut store, Action::Step);
        assert_eq!(store.runner.phase(), Phase::Paused);
        assert_eq!(store.runner.current_step(), 1);
        update(&mut store, Action::ForwardStep);
        update(&mut store, Action::BackStep);
        update(&mut store, Action::SeekTo { index: usize::MAX });
        assert!(store.runner.is_at_end());
        update(&mut store, Action::Reset);
        assert!(store.runner.is_empty());
        assert!(store.error_message.is_none());
    }

    #[test]
    fn test_generator_settings_reach_runner() {
        let mut store = Store::default();
        let settings = GeneratorSettings {
            algorithm: Algorithm::BellmanFord,
            node_count: 99,
            ..Default::default()
        };
        update(&mut store, Action::SetGeneratorSettings { settings });
        assert_eq!(store.runner.algorithm(), Algorithm::BellmanFord);
        assert_eq!(store.settings.generator.node_count, 15);
    }
}
