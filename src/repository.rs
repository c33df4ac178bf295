//! Interface boundary towards persistent storage of nets and markings
//!
//! The conversion core neither implements nor requires a store; this module
//! only fixes the contract a storage backend has to offer so that nets and
//! markings can cross that boundary as the same validated values the
//! builders produce. Backends are expected to receive their connection and
//! naming configuration through their own constructors, not from any global
//! state.

use crate::petri_net::marking::Marking;
use crate::petri_net::petri_net_struct::Petrinet;

/// Storage handle of a persisted [`Petrinet`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PetrinetId(pub i64);

/// Storage handle of a persisted [`Marking`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkingId(pub i64);

/// Handles assigned by [`PetrinetRepository::save`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Handle the net was stored under
    pub petrinet: PetrinetId,
    /// Handle the marking was stored under, if one was saved along
    pub marking: Option<MarkingId>,
}

/// A store of [`Petrinet`]s and [`Marking`]s
///
/// Markings are stored per net and only make sense relative to one: loading
/// a marking requires the net it belongs to, and implementations are
/// expected to rebuild the marking against that net (via
/// [`MarkingBuilder`](crate::petri_net::marking::MarkingBuilder)) so that a
/// stored marking can never resurrect token counts for places the net does
/// not have.
pub trait PetrinetRepository {
    /// Error type of the underlying store
    type Error;

    /// Load a net; `None` if nothing is stored under the handle
    fn load_petrinet(&mut self, id: PetrinetId) -> Result<Option<Petrinet>, Self::Error>;

    /// Load a marking of `net`; `None` if nothing is stored under the handle
    fn load_marking(&mut self, id: MarkingId, net: &Petrinet)
        -> Result<Option<Marking>, Self::Error>;

    /// Handles of all markings stored for the net stored under `net`
    fn list_marking_ids(&mut self, net: PetrinetId) -> Result<Vec<MarkingId>, Self::Error>;

    /// Persist a net, optionally together with one of its markings, on
    /// behalf of `owner`; `name` is a display name for listings
    fn save(
        &mut self,
        net: &Petrinet,
        marking: Option<&Marking>,
        owner: &str,
        name: Option<&str>,
    ) -> Result<SaveOutcome, Self::Error>;
}
