use std::collections::HashMap;

use super::petri_net_struct::{Flow, FlowMap, NodeKind, Petrinet, Place, Transition};

///
/// Structural rule violated while assembling a [`Petrinet`]
///
/// Every violation is reported by the [`PetrinetBuilder`] call that would
/// have introduced it, never later.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PetrinetBuilderError {
    /// The identifier is already registered, for either node kind (identifier included)
    DuplicateIdentifier(String),
    /// A flow endpoint does not resolve to any registered node (identifier included)
    UnknownEndpoint(String),
    /// A flow connects two nodes of the same kind
    InvalidFlowKind {
        /// Source identifier of the rejected flow
        source: String,
        /// Target identifier of the rejected flow
        target: String,
    },
    /// A flow weight is not a positive integer (weight included)
    InvalidWeight(u32),
}

impl std::fmt::Display for PetrinetBuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to build Petri net: {self:?}")
    }
}

impl std::error::Error for PetrinetBuilderError {}

///
/// Incremental construction of a [`Petrinet`]
///
/// The builder is the single place where the structural rules of a net are
/// enforced: unique identifiers across both node kinds, flows connecting one
/// place and one transition only, flow endpoints registered beforehand, and
/// positive flow weights. Each `add_*` call validates eagerly and rejects the
/// offending element with a [`PetrinetBuilderError`]; accepted elements are
/// kept, so a caller may recover from a rejection and continue.
///
/// [`PetrinetBuilder::build`] consumes the builder and cannot fail: any
/// sequence of successful `add_*` calls yields a valid net.
///
/// ## Example
///
/// ```
/// use petrinet_io::{Flow, PetrinetBuilder, Place, Transition};
///
/// let mut builder = PetrinetBuilder::new();
/// builder.add_place(Place::new("p1").with_label("Start"))?;
/// builder.add_transition(Transition::new("t1"))?;
/// builder.add_flow(Flow::new("p1", "t1"), 1)?;
/// let net = builder.build();
/// assert_eq!(net.places().len(), 1);
/// assert_eq!(net.transitions().len(), 1);
/// # Ok::<(), petrinet_io::PetrinetBuilderError>(())
/// ```
///
#[derive(Debug, Default)]
pub struct PetrinetBuilder {
    places: Vec<Place>,
    transitions: Vec<Transition>,
    // Single lookup shared by both node kinds; also the duplicate check.
    kinds: HashMap<String, NodeKind>,
    flows: FlowMap,
}

impl PetrinetBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, id: &str, kind: NodeKind) -> Result<(), PetrinetBuilderError> {
        if self.kinds.contains_key(id) {
            return Err(PetrinetBuilderError::DuplicateIdentifier(id.to_string()));
        }
        self.kinds.insert(id.to_string(), kind);
        Ok(())
    }

    /// Register a place
    ///
    /// Fails with [`PetrinetBuilderError::DuplicateIdentifier`] if the
    /// identifier is already taken by *any* node, place or transition.
    pub fn add_place(&mut self, place: Place) -> Result<&mut Self, PetrinetBuilderError> {
        self.register(place.id(), NodeKind::Place)?;
        self.places.push(place);
        Ok(self)
    }

    /// Register a transition
    ///
    /// Fails with [`PetrinetBuilderError::DuplicateIdentifier`] if the
    /// identifier is already taken by *any* node, place or transition.
    pub fn add_transition(
        &mut self,
        transition: Transition,
    ) -> Result<&mut Self, PetrinetBuilderError> {
        self.register(transition.id(), NodeKind::Transition)?;
        self.transitions.push(transition);
        Ok(self)
    }

    /// Register all places of an iterator, stopping at the first rejection
    pub fn add_places<I>(&mut self, places: I) -> Result<&mut Self, PetrinetBuilderError>
    where
        I: IntoIterator<Item = Place>,
    {
        for place in places {
            self.add_place(place)?;
        }
        Ok(self)
    }

    /// Register all transitions of an iterator, stopping at the first rejection
    pub fn add_transitions<I>(&mut self, transitions: I) -> Result<&mut Self, PetrinetBuilderError>
    where
        I: IntoIterator<Item = Transition>,
    {
        for transition in transitions {
            self.add_transition(transition)?;
        }
        Ok(self)
    }

    /// Register a weighted flow between two previously registered nodes of
    /// opposite kinds
    ///
    /// Fails with [`PetrinetBuilderError::UnknownEndpoint`] if an endpoint
    /// identifier is not registered, with
    /// [`PetrinetBuilderError::InvalidFlowKind`] if both endpoints are of the
    /// same kind, and with [`PetrinetBuilderError::InvalidWeight`] if the
    /// weight is zero. Adding a flow for a `(source, target)` pair that is
    /// already present replaces its weight.
    pub fn add_flow(&mut self, flow: Flow, weight: u32) -> Result<&mut Self, PetrinetBuilderError> {
        let source_kind = self
            .kinds
            .get(flow.source())
            .copied()
            .ok_or_else(|| PetrinetBuilderError::UnknownEndpoint(flow.source().to_string()))?;
        let target_kind = self
            .kinds
            .get(flow.target())
            .copied()
            .ok_or_else(|| PetrinetBuilderError::UnknownEndpoint(flow.target().to_string()))?;
        if source_kind == target_kind {
            return Err(PetrinetBuilderError::InvalidFlowKind {
                source: flow.source().to_string(),
                target: flow.target().to_string(),
            });
        }
        if weight == 0 {
            return Err(PetrinetBuilderError::InvalidWeight(weight));
        }
        self.flows.insert(flow, weight);
        Ok(self)
    }

    /// Look up a registered place by identifier
    pub fn place<S: AsRef<str>>(&self, id: S) -> Option<&Place> {
        let id = id.as_ref();
        self.places.iter().find(|place| place.id() == id)
    }

    /// Look up a registered transition by identifier
    pub fn transition<S: AsRef<str>>(&self, id: S) -> Option<&Transition> {
        let id = id.as_ref();
        self.transitions.iter().find(|transition| transition.id() == id)
    }

    /// Kind of the node registered under the given identifier, or `None` for
    /// identifiers that are not registered
    pub fn node_kind<S: AsRef<str>>(&self, id: S) -> Option<NodeKind> {
        self.kinds.get(id.as_ref()).copied()
    }

    /// Whether nothing has been registered yet
    pub fn is_empty(&self) -> bool {
        self.places.is_empty() && self.transitions.is_empty() && self.flows.is_empty()
    }

    /// Consume the builder and produce the assembled [`Petrinet`]
    ///
    /// Infallible: all rules were already enforced by the `add_*` calls.
    /// Consuming `self` makes the builder single-use, so one accumulated
    /// state can never leak into a second net.
    pub fn build(self) -> Petrinet {
        Petrinet::from_parts(self.places, self.transitions, self.flows)
    }
}
