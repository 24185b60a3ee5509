//! Stage identities, edges, and the two fixed topologies.

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One named unit of work in the pipeline graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Develop the narrative scaffold (extended topology only).
    Narrative,
    /// Generate the initial lyrics draft.
    Draft,
    /// Review fan-out, revision, and scoring; one loop round.
    Review,
    /// Apply a single critic pass.
    Critic,
    /// Revise specifically against preflight issues; one loop round.
    TargetedRevise,
    /// Check the lyrics against style and tag constraints.
    Preflight,
    /// Final arrangement refinement (extended topology only).
    Refine,
    /// Summarize song metadata.
    Metadata,
    /// Persist the finished song.
    Persist,
}

impl StageId {
    /// Returns the stage's wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Narrative => "narrative",
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Critic => "critic",
            Self::TargetedRevise => "targeted_revise",
            Self::Preflight => "preflight",
            Self::Refine => "refine",
            Self::Metadata => "metadata",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which fixed topology a job runs. Selected once at job start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    /// Linear flow with review and preflight-fix loops.
    Standard,
    /// Standard plus narrative development at the head and an arrangement
    /// refinement pass before persistence.
    Extended,
}

impl Default for TopologyKind {
    fn default() -> Self {
        Self::Standard
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Extended => write!(f, "extended"),
        }
    }
}

/// The two bounded-loop routers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterKind {
    /// Keep reviewing while the score is below threshold and rounds remain.
    Review,
    /// Keep fixing while preflight fails and rounds remain.
    Preflight,
}

/// The edge leaving a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Unconditional transition.
    To(StageId),
    /// Conditional transition over a fixed candidate pair.
    Router {
        /// Which router decides.
        kind: RouterKind,
        /// Target while the loop continues.
        stay: StageId,
        /// Target once the loop exits.
        advance: StageId,
    },
    /// The run is finished.
    End,
}

/// One stage in an assembled topology.
#[derive(Debug, Clone, Copy)]
pub struct StageNode {
    /// The stage identity.
    pub id: StageId,
    /// Fixed progress index for this topology. Retry loops revisit an index,
    /// so the derived percentage can plateau across rounds.
    pub step_index: u32,
    /// The edge leaving this stage.
    pub next: Edge,
}

/// A fixed, validated stage graph.
///
/// Acyclic except for the explicitly bounded loops; their termination is a
/// runtime invariant enforced by the routers (`round < max_rounds`), not a
/// static property of the graph.
#[derive(Debug, Clone)]
pub struct Topology {
    kind: TopologyKind,
    entry: StageId,
    nodes: HashMap<StageId, StageNode>,
    total_steps: u32,
}

impl Topology {
    /// Assembles the standard topology:
    /// draft → review ⟲ → critic → preflight ⟲ → metadata → persist.
    pub fn standard() -> Result<Self, ValidationError> {
        TopologyBuilder::new(TopologyKind::Standard)
            .entry(StageId::Draft)
            .stage(StageId::Draft, 0, Edge::To(StageId::Review))
            .stage(
                StageId::Review,
                1,
                Edge::Router {
                    kind: RouterKind::Review,
                    stay: StageId::Review,
                    advance: StageId::Critic,
                },
            )
            .stage(StageId::Critic, 2, Edge::To(StageId::Preflight))
            .stage(
                StageId::Preflight,
                3,
                Edge::Router {
                    kind: RouterKind::Preflight,
                    stay: StageId::TargetedRevise,
                    advance: StageId::Metadata,
                },
            )
            .stage(StageId::TargetedRevise, 3, Edge::To(StageId::Review))
            .stage(StageId::Metadata, 4, Edge::To(StageId::Persist))
            .stage(StageId::Persist, 5, Edge::End)
            .build()
    }

    /// Assembles the extended topology: narrative development at the head
    /// and an arrangement refinement pass before persistence.
    pub fn extended() -> Result<Self, ValidationError> {
        TopologyBuilder::new(TopologyKind::Extended)
            .entry(StageId::Narrative)
            .stage(StageId::Narrative, 0, Edge::To(StageId::Draft))
            .stage(StageId::Draft, 1, Edge::To(StageId::Review))
            .stage(
                StageId::Review,
                2,
                Edge::Router {
                    kind: RouterKind::Review,
                    stay: StageId::Review,
                    advance: StageId::Critic,
                },
            )
            .stage(StageId::Critic, 3, Edge::To(StageId::Preflight))
            .stage(
                StageId::Preflight,
                4,
                Edge::Router {
                    kind: RouterKind::Preflight,
                    stay: StageId::TargetedRevise,
                    advance: StageId::Metadata,
                },
            )
            .stage(StageId::TargetedRevise, 4, Edge::To(StageId::Review))
            .stage(StageId::Metadata, 5, Edge::To(StageId::Refine))
            .stage(StageId::Refine, 6, Edge::To(StageId::Persist))
            .stage(StageId::Persist, 7, Edge::End)
            .build()
    }

    /// Assembles the topology for a kind.
    pub fn for_kind(kind: TopologyKind) -> Result<Self, ValidationError> {
        match kind {
            TopologyKind::Standard => Self::standard(),
            TopologyKind::Extended => Self::extended(),
        }
    }

    /// Returns the topology kind.
    #[must_use]
    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    /// Returns the entry stage.
    #[must_use]
    pub fn entry(&self) -> StageId {
        self.entry
    }

    /// Looks up a stage node.
    #[must_use]
    pub fn node(&self, id: StageId) -> Option<&StageNode> {
        self.nodes.get(&id)
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total step count for progress percentages; the terminal "complete"
    /// notification uses this index to land on 100%.
    #[must_use]
    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }
}

/// Builder assembling a [`Topology`] with validation.
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    kind: TopologyKind,
    entry: Option<StageId>,
    nodes: Vec<StageNode>,
}

impl TopologyBuilder {
    /// Creates a builder for the given kind.
    #[must_use]
    pub fn new(kind: TopologyKind) -> Self {
        Self {
            kind,
            entry: None,
            nodes: Vec::new(),
        }
    }

    /// Sets the entry stage.
    #[must_use]
    pub fn entry(mut self, id: StageId) -> Self {
        self.entry = Some(id);
        self
    }

    /// Adds a stage with its progress index and outgoing edge.
    #[must_use]
    pub fn stage(mut self, id: StageId, step_index: u32, next: Edge) -> Self {
        self.nodes.push(StageNode {
            id,
            step_index,
            next,
        });
        self
    }

    /// Validates and assembles the topology.
    ///
    /// # Errors
    ///
    /// Returns an error on an empty graph, a missing or unknown entry,
    /// duplicate stages, or an edge naming a stage that was never added.
    pub fn build(self) -> Result<Topology, ValidationError> {
        if self.nodes.is_empty() {
            return Err(ValidationError::new("topology has no stages"));
        }

        let entry = self
            .entry
            .ok_or_else(|| ValidationError::new("topology has no entry stage"))?;

        let mut nodes = HashMap::new();
        for node in self.nodes {
            if nodes.insert(node.id, node).is_some() {
                return Err(ValidationError::new(format!(
                    "stage '{}' defined twice",
                    node.id
                ))
                .with_field(node.id.as_str()));
            }
        }

        if !nodes.contains_key(&entry) {
            return Err(ValidationError::new(format!(
                "entry stage '{entry}' is not in the topology"
            ))
            .with_field(entry.as_str()));
        }

        for node in nodes.values() {
            let targets: Vec<StageId> = match node.next {
                Edge::To(next) => vec![next],
                Edge::Router { stay, advance, .. } => vec![stay, advance],
                Edge::End => Vec::new(),
            };
            for target in targets {
                if !nodes.contains_key(&target) {
                    return Err(ValidationError::new(format!(
                        "stage '{}' routes to unknown stage '{target}'",
                        node.id
                    ))
                    .with_field(node.id.as_str()));
                }
            }
        }

        let total_steps = nodes
            .values()
            .map(|node| node.step_index)
            .max()
            .unwrap_or(0)
            + 1;

        Ok(Topology {
            kind: self.kind,
            entry,
            nodes,
            total_steps,
        })
    }
}
