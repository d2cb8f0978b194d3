pub mod bellman_ford;
pub mod dijkstra;
pub mod generator;
pub mod graph;
pub mod layout_circular;
pub mod layout_spatial;
pub mod negative_cycle;
pub mod step;
pub mod topology;
pub mod weights;

pub use generator::{
    GenerateError, GeneratedGraph, GeneratorParams, GraphParams, GraphType,
    generate_graph, respace_spatial_weights,
};
pub use graph::{Edge, EdgeId, EdgeStatus, Graph, GraphError, Node, NodeId};
pub use step::{
    Algorithm, AlgorithmRun, AlgorithmState, EdgeUpdate, HeapEntry,
    RunError, ShortestPathResult, Step, StepLabel,
};
