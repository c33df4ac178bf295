use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::petri_net_struct::Petrinet;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Number of tokens residing on a single place
///
/// Deliberately an enum rather than a bare integer: richer token notions
/// (e.g. colored or symbolic tokens) would slot in as further variants
/// without touching the [`Marking`] plumbing around them.
pub enum TokenCount {
    /// A plain token count
    Integer(u64),
}

impl TokenCount {
    /// Whether this count stands for at least one token
    pub fn is_positive(&self) -> bool {
        let TokenCount::Integer(count) = self;
        *count > 0
    }
}

impl From<u64> for TokenCount {
    fn from(count: u64) -> Self {
        TokenCount::Integer(count)
    }
}

impl std::fmt::Display for TokenCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let TokenCount::Integer(count) = self;
        write!(f, "{count}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
///
/// Token assignment over the places of one specific [`Petrinet`]
///
/// Partial by design: places without an entry implicitly hold zero tokens,
/// which keeps markings of large nets small. An *explicit* zero entry is
/// allowed and preserved (it round-trips through PNML as an empty
/// `initialMarking` element), the two are only rendered differently.
///
/// A marking is valid for the net it was built against: every key is the
/// identifier of a place of that net. This is checked when the marking is
/// assembled by [`MarkingBuilder::build`], the only way to obtain one.
///
pub struct Marking {
    // BTreeMap so iteration (and thus rendered output) is sorted by place id.
    tokens: BTreeMap<String, TokenCount>,
}

impl Marking {
    /// Token count explicitly assigned to the given place, `None` if the
    /// place has no entry
    pub fn get<S: AsRef<str>>(&self, place: S) -> Option<&TokenCount> {
        self.tokens.get(place.as_ref())
    }

    /// Token count of the given place, counting absent entries as zero
    pub fn tokens<S: AsRef<str>>(&self, place: S) -> TokenCount {
        self.tokens
            .get(place.as_ref())
            .cloned()
            .unwrap_or(TokenCount::Integer(0))
    }

    /// Iterate over all explicit entries, ordered by place identifier
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenCount)> {
        self.tokens.iter().map(|(place, tokens)| (place.as_str(), tokens))
    }

    /// Number of explicit entries (including explicit zeros)
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there are no explicit entries
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

///
/// Error encountered while assembling a [`Marking`]
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkingBuilderError {
    /// A token assignment references a place that is not part of the net the
    /// marking was built against (identifier included)
    UnknownPlace(String),
}

impl std::fmt::Display for MarkingBuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to build marking: {self:?}")
    }
}

impl std::error::Error for MarkingBuilderError {}

///
/// Incremental construction of a [`Marking`]
///
/// Token assignments are staged without validation; whether the named places
/// exist is only decided by [`MarkingBuilder::build`], which binds the staged
/// assignments to a concrete [`Petrinet`]. Staging the same place twice
/// replaces the earlier count. Consumes itself on `build`, like
/// [`PetrinetBuilder`](super::builder::PetrinetBuilder).
///
#[derive(Debug, Default)]
pub struct MarkingBuilder {
    staged: BTreeMap<String, TokenCount>,
}

impl MarkingBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a token count for a place, replacing any previously staged count
    pub fn assign(&mut self, place: impl Into<String>, tokens: TokenCount) -> &mut Self {
        self.staged.insert(place.into(), tokens);
        self
    }

    /// Validate the staged assignments against `net` and produce the marking
    ///
    /// Fails with [`MarkingBuilderError::UnknownPlace`] if any staged place
    /// identifier does not name a place of `net` (transition identifiers
    /// count as unknown here too).
    pub fn build(self, net: &Petrinet) -> Result<Marking, MarkingBuilderError> {
        for place in self.staged.keys() {
            if net.place(place).is_none() {
                return Err(MarkingBuilderError::UnknownPlace(place.clone()));
            }
        }
        Ok(Marking {
            tokens: self.staged,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::petri_net::builder::PetrinetBuilder;
    use crate::petri_net::petri_net_struct::{Place, Transition};

    fn sample_net() -> Petrinet {
        let mut builder = PetrinetBuilder::new();
        builder
            .add_place(Place::new("p1"))
            .unwrap()
            .add_place(Place::new("p2"))
            .unwrap()
            .add_transition(Transition::new("t1"))
            .unwrap();
        builder.build()
    }

    #[test]
    fn marking_binds_to_net() {
        let net = sample_net();
        let mut builder = MarkingBuilder::new();
        builder
            .assign("p1", TokenCount::Integer(2))
            .assign("p2", TokenCount::Integer(0));
        let marking = builder.build(&net).unwrap();

        assert_eq!(marking.tokens("p1"), TokenCount::Integer(2));
        // Explicit zero and absent entry agree on the count...
        assert_eq!(marking.tokens("p2"), TokenCount::Integer(0));
        assert_eq!(marking.tokens("p3"), TokenCount::Integer(0));
        // ...but not on presence.
        assert_eq!(marking.get("p2"), Some(&TokenCount::Integer(0)));
        assert_eq!(marking.get("p3"), None);
        assert_eq!(marking.len(), 2);
    }

    #[test]
    fn unknown_place_rejected() {
        let net = sample_net();
        let mut builder = MarkingBuilder::new();
        builder.assign("p1", TokenCount::Integer(1));
        builder.assign("elsewhere", TokenCount::Integer(1));
        assert_eq!(
            builder.build(&net).unwrap_err(),
            MarkingBuilderError::UnknownPlace("elsewhere".to_string())
        );
    }

    #[test]
    fn transition_identifier_is_not_a_place() {
        let net = sample_net();
        let mut builder = MarkingBuilder::new();
        builder.assign("t1", TokenCount::Integer(1));
        assert_eq!(
            builder.build(&net).unwrap_err(),
            MarkingBuilderError::UnknownPlace("t1".to_string())
        );
    }

    #[test]
    fn reassignment_replaces_staged_count() {
        let net = sample_net();
        let mut builder = MarkingBuilder::new();
        builder.assign("p1", TokenCount::Integer(1));
        builder.assign("p1", TokenCount::Integer(5));
        let marking = builder.build(&net).unwrap();
        assert_eq!(marking.tokens("p1"), TokenCount::Integer(5));
        assert_eq!(marking.len(), 1);
    }

    #[test]
    fn iteration_is_sorted_by_place() {
        let net = sample_net();
        let mut builder = MarkingBuilder::new();
        builder.assign("p2", TokenCount::Integer(1));
        builder.assign("p1", TokenCount::Integer(3));
        let marking = builder.build(&net).unwrap();
        let places: Vec<&str> = marking.iter().map(|(place, _)| place).collect();
        assert_eq!(places, vec!["p1", "p2"]);
    }

    #[test]
    fn token_count_display_and_sign() {
        assert_eq!(TokenCount::Integer(3).to_string(), "3");
        assert_eq!(TokenCount::from(7), TokenCount::Integer(7));
        assert!(TokenCount::Integer(1).is_positive());
        assert!(!TokenCount::Integer(0).is_positive());
    }
}
