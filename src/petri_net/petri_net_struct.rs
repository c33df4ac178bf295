use serde::{Deserialize, Serialize};

use super::builder::PetrinetBuilder;
use super::import_pnml::PnmlImportError;
use super::marking::Marking;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
/// 2-D layout hint of a node
///
/// Taken from the `position` element of PNML documents; purely cosmetic and
/// carried through to the rendered graph description unchanged.
pub struct Coordinates {
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
}

impl Coordinates {
    /// Create new [`Coordinates`]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
/// Place in a Petri net
///
/// The passive node kind: places hold tokens. Identified by a string
/// identifier that is unique across *all* nodes of the owning net.
pub struct Place {
    id: String,
    label: Option<String>,
    coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
/// Transition in a Petri net
///
/// The active node kind. Shares the identifier namespace with [`Place`]s.
pub struct Transition {
    id: String,
    label: Option<String>,
    coordinates: Option<Coordinates>,
}

macro_rules! node_impl {
    ($t:ident) => {
        impl $t {
            /// Create a new node with the given identifier and neither label nor coordinates
            pub fn new(id: impl Into<String>) -> Self {
                Self {
                    id: id.into(),
                    label: None,
                    coordinates: None,
                }
            }

            /// Set the display label
            pub fn with_label(mut self, label: impl Into<String>) -> Self {
                self.label = Some(label.into());
                self
            }

            /// Set the layout coordinates
            pub fn with_coordinates(mut self, x: f64, y: f64) -> Self {
                self.coordinates = Some(Coordinates::new(x, y));
                self
            }

            /// Identifier of this node
            pub fn id(&self) -> &str {
                &self.id
            }

            /// Display label, if one was set
            pub fn label(&self) -> Option<&str> {
                self.label.as_deref()
            }

            /// Display label, falling back to the identifier when none was set
            pub fn display_label(&self) -> &str {
                self.label.as_deref().unwrap_or(&self.id)
            }

            /// Layout coordinates, if any
            pub fn coordinates(&self) -> Option<Coordinates> {
                self.coordinates
            }
        }
    };
}

node_impl!(Place);
node_impl!(Transition);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The bipartite "color" of a node: every identifier of a net resolves to
/// exactly one kind
///
/// Returned by the `node_kind` lookups on [`PetrinetBuilder`] and
/// [`Petrinet`]; `None` stands for an unknown identifier.
pub enum NodeKind {
    /// The identifier belongs to a place
    Place,
    /// The identifier belongs to a transition
    Transition,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
/// Directed connection between two nodes of a Petri net
///
/// A flow is identified by its `(source, target)` identifier pair; it has no
/// id of its own. Constructing a [`Flow`] performs no validation. Whether
/// the endpoints exist and are of opposite kinds is checked by
/// [`PetrinetBuilder::add_flow`](super::builder::PetrinetBuilder::add_flow),
/// which must therefore also be able to receive invalid pairs.
pub struct Flow {
    source: String,
    target: String,
}

impl Flow {
    /// Create a new flow from the identifier of the source node to the identifier of the target node
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Create a new flow from a place to a transition
    pub fn place_to_transition(from: &Place, to: &Transition) -> Self {
        Self::new(from.id(), to.id())
    }

    /// Create a new flow from a transition to a place
    pub fn transition_to_place(from: &Transition, to: &Place) -> Self {
        Self::new(from.id(), to.id())
    }

    /// Identifier of the node the flow leaves
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Identifier of the node the flow enters
    pub fn target(&self) -> &str {
        &self.target
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
/// Mapping from [`Flow`]s to their positive weights
///
/// Holds at most one weight per distinct `(source, target)` pair; inserting
/// a pair again replaces its weight. Iteration follows insertion order so
/// rendered output is deterministic, but the order carries no meaning.
pub struct FlowMap {
    entries: Vec<(Flow, u32)>,
}

impl FlowMap {
    /// Create an empty [`FlowMap`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a weight for a flow, returning the previous weight if the pair was already present
    pub fn insert(&mut self, flow: Flow, weight: u32) -> Option<u32> {
        match self.entries.iter_mut().find(|(f, _)| *f == flow) {
            Some((_, w)) => Some(std::mem::replace(w, weight)),
            None => {
                self.entries.push((flow, weight));
                None
            }
        }
    }

    /// Weight of the given flow, if present
    pub fn weight(&self, flow: &Flow) -> Option<u32> {
        self.entries
            .iter()
            .find(|(f, _)| f == flow)
            .map(|(_, w)| *w)
    }

    /// Whether the given flow is present
    pub fn contains(&self, flow: &Flow) -> bool {
        self.entries.iter().any(|(f, _)| f == flow)
    }

    /// Iterate over all flows and their weights in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Flow, u32)> {
        self.entries.iter().map(|(flow, weight)| (flow, *weight))
    }

    /// Number of flows
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no flows
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
///
/// A Petri net of [`Place`]s and [`Transition`]s
///
/// Bipartite graph of [`Place`]s and [`Transition`]s with a [`FlowMap`] of
/// weighted flows connecting them. Values of this type are immutable and
/// structurally valid by construction: every flow connects one place and one
/// transition (never two nodes of the same kind), every flow endpoint is a
/// member of the net, and all identifiers are unique across both node kinds.
/// The only ways to obtain one are
/// [`PetrinetBuilder`](super::builder::PetrinetBuilder) and the
/// [`Deserialize`] impl, which replays the data through that builder.
pub struct Petrinet {
    places: Vec<Place>,
    transitions: Vec<Transition>,
    flows: FlowMap,
}

impl Petrinet {
    pub(crate) fn from_parts(
        places: Vec<Place>,
        transitions: Vec<Transition>,
        flows: FlowMap,
    ) -> Self {
        Self {
            places,
            transitions,
            flows,
        }
    }

    /// All places, in registration order
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// All transitions, in registration order
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// All flows and their weights
    pub fn flows(&self) -> &FlowMap {
        &self.flows
    }

    /// Look up a place by identifier
    pub fn place<S: AsRef<str>>(&self, id: S) -> Option<&Place> {
        let id = id.as_ref();
        self.places.iter().find(|place| place.id() == id)
    }

    /// Look up a transition by identifier
    pub fn transition<S: AsRef<str>>(&self, id: S) -> Option<&Transition> {
        let id = id.as_ref();
        self.transitions.iter().find(|transition| transition.id() == id)
    }

    /// Kind of the node registered under the given identifier, or `None` for
    /// identifiers that are not part of the net
    pub fn node_kind<S: AsRef<str>>(&self, id: S) -> Option<NodeKind> {
        let id = id.as_ref();
        if self.places.iter().any(|place| place.id() == id) {
            Some(NodeKind::Place)
        } else if self.transitions.iter().any(|transition| transition.id() == id) {
            Some(NodeKind::Transition)
        } else {
            None
        }
    }

    /// Render this net as a Graphviz DOT document
    ///
    /// _Note_: This is an export method for __visualizing__ the Petri net.
    /// The resulting text cannot be imported as a Petri net again (for that
    /// functionality, see [`Petrinet::export_pnml`]).
    pub fn to_dot(&self, marking: Option<&Marking>) -> String {
        super::export_dot::petrinet_to_dot(self, marking)
    }

    #[cfg(feature = "graphviz-export")]
    /// Export this Petri net as a PNG image
    ///
    /// The PNG file is written to the specified filepath
    ///
    /// Only available with the `graphviz-export` feature.
    pub fn export_png<P: AsRef<std::path::Path>>(
        &self,
        marking: Option<&Marking>,
        path: P,
    ) -> Result<(), std::io::Error> {
        super::image_export::export_petrinet_image_png(self, marking, path)
    }

    #[cfg(feature = "graphviz-export")]
    /// Export this Petri net as an SVG image
    ///
    /// The SVG file is written to the specified filepath
    ///
    /// Only available with the `graphviz-export` feature.
    pub fn export_svg<P: AsRef<std::path::Path>>(
        &self,
        marking: Option<&Marking>,
        path: P,
    ) -> Result<(), std::io::Error> {
        super::image_export::export_petrinet_image_svg(self, marking, path)
    }

    /// Export this Petri net (and optionally a marking of it) to a PNML file
    ///
    /// _Note_: This is an export method for __saving__ the Petri net data.
    /// The resulting file can also be imported as a Petri net again (see
    /// [`Petrinet::import_pnml`]).
    pub fn export_pnml<P: AsRef<std::path::Path>>(
        &self,
        marking: Option<&Marking>,
        path: P,
    ) -> Result<(), quick_xml::Error> {
        super::export_pnml::export_pnml_to_path(self, marking, path)
    }

    /// Import a Petri net (and the initial marking declared in the document,
    /// if any) from a PNML file
    ///
    /// For the related export function, see [`Petrinet::export_pnml`]
    pub fn import_pnml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<(Petrinet, Option<Marking>), PnmlImportError> {
        super::import_pnml::import_pnml_from_path(path)
    }
}

impl<'de> Deserialize<'de> for Petrinet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawPetrinet {
            places: Vec<Place>,
            transitions: Vec<Transition>,
            flows: Vec<(Flow, u32)>,
        }

        // Replays everything through the builder so that hand-written JSON
        // cannot smuggle in a net violating the structural rules.
        let raw = RawPetrinet::deserialize(deserializer)?;
        let mut builder = PetrinetBuilder::new();
        builder
            .add_places(raw.places)
            .map_err(serde::de::Error::custom)?;
        builder
            .add_transitions(raw.transitions)
            .map_err(serde::de::Error::custom)?;
        for (flow, weight) in raw.flows {
            builder
                .add_flow(flow, weight)
                .map_err(serde::de::Error::custom)?;
        }
        Ok(builder.build())
    }
}
