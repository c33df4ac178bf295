use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::rc::Rc;

use log::{debug, warn};
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Error as QuickXMLError;
use quick_xml::Reader;

use super::builder::{PetrinetBuilder, PetrinetBuilderError};
use super::marking::{Marking, MarkingBuilder, MarkingBuilderError, TokenCount};
use super::petri_net_struct::{Coordinates, Flow, NodeKind, Petrinet, Place, Transition};

///
/// Error encountered while importing a PNML document
///
#[derive(Debug, Clone)]
pub enum PnmlImportError {
    /// The document is not well-formed XML, or a required element or
    /// attribute is missing or invalid (reason included)
    MalformedDocument(String),
    /// The document uses a PNML feature outside the supported subset
    /// (feature included)
    UnsupportedFeature(&'static str),
    /// An arc references endpoints that do not resolve to exactly one place
    /// and one transition
    InconsistentFlow {
        /// `source` attribute of the offending arc
        source: String,
        /// `target` attribute of the offending arc
        target: String,
    },
    /// A structural rule was violated while assembling the net
    Build(PetrinetBuilderError),
    /// A token assignment referenced a place that is not part of the net
    Marking(MarkingBuilderError),
    /// IO error while reading the document
    IOError(Rc<std::io::Error>),
}

impl std::fmt::Display for PnmlImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to import PNML: {self:?}")
    }
}

impl std::error::Error for PnmlImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PnmlImportError::IOError(e) => Some(e.as_ref()),
            PnmlImportError::Build(e) => Some(e),
            PnmlImportError::Marking(e) => Some(e),
            _ => None,
        }
    }

    fn description(&self) -> &str {
        "description() is deprecated; use Display"
    }

    fn cause(&self) -> Option<&dyn std::error::Error> {
        self.source()
    }
}

impl From<std::io::Error> for PnmlImportError {
    fn from(e: std::io::Error) -> Self {
        Self::IOError(Rc::new(e))
    }
}

impl From<QuickXMLError> for PnmlImportError {
    fn from(e: QuickXMLError) -> Self {
        Self::MalformedDocument(e.to_string())
    }
}

impl From<PetrinetBuilderError> for PnmlImportError {
    fn from(e: PetrinetBuilderError) -> Self {
        Self::Build(e)
    }
}

impl From<MarkingBuilderError> for PnmlImportError {
    fn from(e: MarkingBuilderError) -> Self {
        Self::Marking(e)
    }
}

///
/// Current parsing mode (i.e., which tag is currently being processed)
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Place,
    PlaceText,
    ReferencePlace,
    Transition,
    TransitionText,
    InitialMarking,
    Arc,
    None,
}

/// Node element currently being read; becomes a [`Place`] or [`Transition`]
/// once its end tag arrives.
#[derive(Debug, Default)]
struct PendingNode {
    id: String,
    label: Option<String>,
    coordinates: Option<Coordinates>,
    // Some as soon as an initialMarking element was seen, even an empty one.
    tokens: Option<u64>,
}

impl PendingNode {
    fn with_id(id: String) -> Self {
        PendingNode {
            id,
            ..Default::default()
        }
    }

    fn into_place(self) -> Place {
        let mut place = Place::new(self.id);
        if let Some(label) = self.label {
            place = place.with_label(label);
        }
        if let Some(position) = self.coordinates {
            place = place.with_coordinates(position.x, position.y);
        }
        place
    }

    fn into_transition(self) -> Transition {
        let mut transition = Transition::new(self.id);
        if let Some(label) = self.label {
            transition = transition.with_label(label);
        }
        if let Some(position) = self.coordinates {
            transition = transition.with_coordinates(position.x, position.y);
        }
        transition
    }
}

/// Arc element as read from the document; classified against the registered
/// nodes only after the whole document was seen.
#[derive(Debug)]
struct PnmlArc {
    source: String,
    target: String,
    weight: u32,
}

fn lossy_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn optional_attr(tag: &BytesStart<'_>, key: &str) -> Result<Option<String>, PnmlImportError> {
    match tag.try_get_attribute(key).unwrap_or_default() {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn required_attr(tag: &BytesStart<'_>, key: &str) -> Result<String, PnmlImportError> {
    optional_attr(tag, key)?.ok_or_else(|| {
        PnmlImportError::MalformedDocument(format!(
            "missing attribute '{key}' on <{}>",
            lossy_string(tag.name().as_ref())
        ))
    })
}

fn position_axis(tag: &BytesStart<'_>, axis: &str) -> Result<f64, PnmlImportError> {
    let raw = optional_attr(tag, axis)?.ok_or_else(|| {
        PnmlImportError::MalformedDocument(format!("<position> is missing the '{axis}' attribute"))
    })?;
    raw.parse::<f64>().map_err(|_| {
        PnmlImportError::MalformedDocument(format!(
            "<position> attribute '{axis}' is not numeric: '{raw}'"
        ))
    })
}

fn read_position(tag: &BytesStart<'_>) -> Result<Coordinates, PnmlImportError> {
    Ok(Coordinates::new(
        position_axis(tag, "x")?,
        position_axis(tag, "y")?,
    ))
}

fn arc_weight(tag: &BytesStart<'_>) -> Result<u32, PnmlImportError> {
    Ok(match optional_attr(tag, "weight")? {
        None => 1,
        Some(raw) => raw.parse::<u32>().unwrap_or_else(|_| {
            warn!("arc weight '{raw}' is not an integer, defaulting to 1");
            1
        }),
    })
}

///
/// Import a PNML document from the given XML reader ([`quick_xml::Reader`])
///
/// Returns the net together with the initial marking declared in the
/// document; the marking is `None` when no place carries an `initialMarking`
/// element. The supported subset of PNML:
///
/// - at most one `page` element; a second one aborts with
///   [`PnmlImportError::UnsupportedFeature`]
/// - `place` and `transition` elements with an `id` attribute, an optional
///   nested `text` (the display label, first one wins) and an optional
///   nested `position` whose `x`/`y` attributes must both be numeric
/// - `referencePlace` elements, imported as ordinary places whose label is
///   the value of their `ref` attribute (the referenced place is *not*
///   resolved; its label and coordinates are not copied over)
/// - `initialMarking` elements on places, counting nested `token` elements
///   (an `initialMarking` without any `token` child stages an explicit zero)
/// - `arc` elements with `source` and `target` attributes and an optional
///   `weight` attribute (absent or non-numeric weights default to 1); each
///   arc must connect one place and one transition, in either direction,
///   anything else aborts with [`PnmlImportError::InconsistentFlow`]
///
/// XML entities in text content and attribute values are decoded, so a
/// label stored as `A &amp; B` is read back as `A & B`.
///
pub fn import_pnml<T>(
    reader: &mut Reader<T>,
) -> Result<(Petrinet, Option<Marking>), PnmlImportError>
where
    T: BufRead,
{
    reader.config_mut().trim_text(true);
    reader.config_mut().expand_empty_elements = true;
    let mut buf: Vec<u8> = Vec::new();

    let mut mode = Mode::None;
    let mut builder = PetrinetBuilder::new();
    let mut pending: Option<PendingNode> = None;
    // Arcs are buffered until the end of the document, as they might appear
    // before the nodes they connect.
    let mut arcs: Vec<PnmlArc> = Vec::new();
    let mut marked: Vec<(String, u64)> = Vec::new();
    let mut pages = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(tag) => match tag.name().as_ref() {
                b"page" => {
                    pages += 1;
                    if pages > 1 {
                        return Err(PnmlImportError::UnsupportedFeature("multiple pages"));
                    }
                }
                b"place" => {
                    mode = Mode::Place;
                    pending = Some(PendingNode::with_id(required_attr(&tag, "id")?));
                }
                b"referencePlace" => {
                    mode = Mode::ReferencePlace;
                    let mut node = PendingNode::with_id(required_attr(&tag, "id")?);
                    node.label = optional_attr(&tag, "ref")?;
                    pending = Some(node);
                }
                b"transition" => {
                    mode = Mode::Transition;
                    pending = Some(PendingNode::with_id(required_attr(&tag, "id")?));
                }
                b"position" => {
                    if matches!(mode, Mode::Place | Mode::ReferencePlace | Mode::Transition) {
                        if let Some(node) = pending.as_mut() {
                            if node.coordinates.is_none() {
                                node.coordinates = Some(read_position(&tag)?);
                            }
                        }
                    }
                }
                b"text" => match mode {
                    Mode::Place => mode = Mode::PlaceText,
                    Mode::Transition => mode = Mode::TransitionText,
                    _ => {}
                },
                b"initialMarking" => {
                    if mode == Mode::Place {
                        mode = Mode::InitialMarking;
                        if let Some(node) = pending.as_mut() {
                            node.tokens.get_or_insert(0);
                        }
                    }
                }
                b"token" => {
                    if mode == Mode::InitialMarking {
                        if let Some(node) = pending.as_mut() {
                            if let Some(tokens) = node.tokens.as_mut() {
                                *tokens += 1;
                            }
                        }
                    }
                }
                b"arc" => {
                    mode = Mode::Arc;
                    arcs.push(PnmlArc {
                        source: required_attr(&tag, "source")?,
                        target: required_attr(&tag, "target")?,
                        weight: arc_weight(&tag)?,
                    });
                }
                _ => {}
            },
            Event::End(tag) => match tag.name().as_ref() {
                b"place" | b"referencePlace" => {
                    if let Some(node) = pending.take() {
                        if let Some(tokens) = node.tokens {
                            marked.push((node.id.clone(), tokens));
                        }
                        builder.add_place(node.into_place())?;
                    }
                    mode = Mode::None;
                }
                b"transition" => {
                    if let Some(node) = pending.take() {
                        builder.add_transition(node.into_transition())?;
                    }
                    mode = Mode::None;
                }
                b"text" => match mode {
                    Mode::PlaceText => mode = Mode::Place,
                    Mode::TransitionText => mode = Mode::Transition,
                    _ => {}
                },
                b"initialMarking" => {
                    if mode == Mode::InitialMarking {
                        mode = Mode::Place;
                    }
                }
                b"arc" => {
                    mode = Mode::None;
                }
                _ => {}
            },
            Event::Text(text) => match mode {
                Mode::PlaceText | Mode::TransitionText => {
                    if let Some(node) = pending.as_mut() {
                        if node.label.is_none() {
                            node.label = Some(text.unescape()?.into_owned());
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    for arc in arcs {
        match (builder.node_kind(&arc.source), builder.node_kind(&arc.target)) {
            (Some(NodeKind::Place), Some(NodeKind::Transition))
            | (Some(NodeKind::Transition), Some(NodeKind::Place)) => {
                builder.add_flow(Flow::new(arc.source, arc.target), arc.weight)?;
            }
            _ => {
                return Err(PnmlImportError::InconsistentFlow {
                    source: arc.source,
                    target: arc.target,
                });
            }
        }
    }

    let net = builder.build();
    let marking = if marked.is_empty() {
        None
    } else {
        let mut marking_builder = MarkingBuilder::new();
        for (place, tokens) in marked {
            marking_builder.assign(place, TokenCount::Integer(tokens));
        }
        Some(marking_builder.build(&net)?)
    };

    debug!(
        "imported PNML document: {} places, {} transitions, {} flows, initial marking: {}",
        net.places().len(),
        net.transitions().len(),
        net.flows().len(),
        marking.is_some()
    );

    Ok((net, marking))
}

///
/// Import a PNML document from a byte reader (e.g., a file or byte slice)
///
pub fn import_pnml_reader<T>(
    reader: &mut T,
) -> Result<(Petrinet, Option<Marking>), PnmlImportError>
where
    T: BufRead,
{
    let mut xml_reader = Reader::from_reader(reader);
    import_pnml(&mut xml_reader)
}

///
/// Import a PNML document from a string slice
///
pub fn import_pnml_str(pnml: &str) -> Result<(Petrinet, Option<Marking>), PnmlImportError> {
    import_pnml(&mut Reader::from_str(pnml))
}

///
/// Import a PNML document from a filepath
///
pub fn import_pnml_from_path<P: AsRef<Path>>(
    path: P,
) -> Result<(Petrinet, Option<Marking>), PnmlImportError> {
    let file = File::open(path)?;
    let mut reader = Reader::from_reader(BufReader::new(file));
    import_pnml(&mut reader)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::test_utils::get_test_data_path;

    const SAMPLE_PNML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pnml>
    <net id="net1" type="http://www.pnml.org/version-2009/grammar/ptnet">
        <page id="page1">
            <place id="p1">
                <name>
                    <text>Start</text>
                </name>
                <graphics>
                    <position x="10" y="20"/>
                </graphics>
                <initialMarking>
                    <token/>
                    <token/>
                </initialMarking>
            </place>
            <place id="p2"/>
            <transition id="t1"/>
            <arc id="a1" source="p1" target="t1" weight="2"/>
            <arc id="a2" source="t1" target="p2"/>
        </page>
    </net>
</pnml>"#;

    #[test]
    fn import_sample_pnml() {
        let (net, marking) = import_pnml_str(SAMPLE_PNML).unwrap();
        assert_eq!(net.places().len(), 2);
        assert_eq!(net.transitions().len(), 1);
        assert_eq!(net.flows().len(), 2);

        let p1 = net.place("p1").unwrap();
        assert_eq!(p1.label(), Some("Start"));
        assert_eq!(p1.coordinates(), Some(Coordinates::new(10.0, 20.0)));
        let p2 = net.place("p2").unwrap();
        assert_eq!(p2.label(), None);
        assert_eq!(p2.coordinates(), None);

        assert_eq!(net.flows().weight(&Flow::new("p1", "t1")), Some(2));
        assert_eq!(net.flows().weight(&Flow::new("t1", "p2")), Some(1));

        let marking = marking.unwrap();
        assert_eq!(marking.tokens("p1"), TokenCount::Integer(2));
        assert_eq!(marking.get("p2"), None);
    }

    #[test]
    fn import_from_test_data_file() {
        let path = get_test_data_path().join("producer-consumer.pnml");
        let (net, marking) = import_pnml_from_path(path).unwrap();
        assert_eq!(net.places().len(), 3);
        assert_eq!(net.transitions().len(), 2);
        assert_eq!(net.flows().len(), 4);
        assert_eq!(marking.unwrap().tokens("capacity"), TokenCount::Integer(3));
    }

    #[test]
    fn multiple_pages_are_rejected() {
        let pnml = r#"<pnml><net id="n">
            <page id="pg1"><place id="p1"/></page>
            <page id="pg2"><place id="p2"/></page>
        </net></pnml>"#;
        let err = import_pnml_str(pnml).unwrap_err();
        assert!(matches!(
            err,
            PnmlImportError::UnsupportedFeature("multiple pages")
        ));
    }

    #[test]
    fn reference_places_take_their_label_from_ref() {
        let pnml = r#"<pnml><page>
            <place id="p1"/>
            <referencePlace id="rp1" ref="p1">
                <text>ignored</text>
            </referencePlace>
            <transition id="t1"/>
            <arc source="rp1" target="t1"/>
        </page></pnml>"#;
        let (net, marking) = import_pnml_str(pnml).unwrap();
        // The reference is kept as the label, not resolved any further.
        let rp1 = net.place("rp1").unwrap();
        assert_eq!(rp1.label(), Some("p1"));
        assert_eq!(rp1.coordinates(), None);
        assert!(net.flows().contains(&Flow::new("rp1", "t1")));
        assert!(marking.is_none());
    }

    #[test]
    fn reference_place_without_ref_falls_back_to_id() {
        let pnml = r#"<pnml><page><referencePlace id="rp1"/></page></pnml>"#;
        let (net, _) = import_pnml_str(pnml).unwrap();
        let rp1 = net.place("rp1").unwrap();
        assert_eq!(rp1.label(), None);
        assert_eq!(rp1.display_label(), "rp1");
    }

    #[test]
    fn xml_entities_are_decoded() {
        let pnml = r#"<pnml><page>
            <place id="p1"><name><text>Fetch &amp; decode</text></name></place>
            <referencePlace id="rp1" ref="buffer &lt;shared&gt;"/>
        </page></pnml>"#;
        let (net, _) = import_pnml_str(pnml).unwrap();
        assert_eq!(net.place("p1").unwrap().label(), Some("Fetch & decode"));
        assert_eq!(net.place("rp1").unwrap().label(), Some("buffer <shared>"));
    }

    #[test]
    fn position_must_carry_both_numeric_axes() {
        let missing_axis = r#"<pnml><page>
            <place id="p1"><graphics><position x="10"/></graphics></place>
        </page></pnml>"#;
        assert!(matches!(
            import_pnml_str(missing_axis).unwrap_err(),
            PnmlImportError::MalformedDocument(_)
        ));

        let bad_axis = r#"<pnml><page>
            <place id="p1"><graphics><position x="10" y="north"/></graphics></place>
        </page></pnml>"#;
        assert!(matches!(
            import_pnml_str(bad_axis).unwrap_err(),
            PnmlImportError::MalformedDocument(_)
        ));

        // No position element at all is fine: coordinates are optional.
        let no_position = r#"<pnml><page><place id="p1"/></page></pnml>"#;
        let (net, _) = import_pnml_str(no_position).unwrap();
        assert_eq!(net.place("p1").unwrap().coordinates(), None);
    }

    #[test]
    fn nodes_without_id_are_rejected() {
        let pnml = r#"<pnml><page><place><text>unnamed</text></place></page></pnml>"#;
        assert!(matches!(
            import_pnml_str(pnml).unwrap_err(),
            PnmlImportError::MalformedDocument(_)
        ));
    }

    #[test]
    fn arc_weights_default_to_one() {
        let pnml = r#"<pnml><page>
            <place id="p1"/>
            <transition id="t1"/>
            <arc source="p1" target="t1"/>
            <arc source="t1" target="p1" weight="lots"/>
        </page></pnml>"#;
        let (net, _) = import_pnml_str(pnml).unwrap();
        assert_eq!(net.flows().weight(&Flow::new("p1", "t1")), Some(1));
        assert_eq!(net.flows().weight(&Flow::new("t1", "p1")), Some(1));
    }

    #[test]
    fn explicit_zero_weight_is_rejected() {
        let pnml = r#"<pnml><page>
            <place id="p1"/>
            <transition id="t1"/>
            <arc source="p1" target="t1" weight="0"/>
        </page></pnml>"#;
        assert!(matches!(
            import_pnml_str(pnml).unwrap_err(),
            PnmlImportError::Build(PetrinetBuilderError::InvalidWeight(0))
        ));
    }

    #[test]
    fn arcs_must_connect_one_place_and_one_transition() {
        let unknown_endpoint = r#"<pnml><page>
            <place id="p1"/>
            <transition id="t1"/>
            <arc source="p1" target="gone"/>
        </page></pnml>"#;
        match import_pnml_str(unknown_endpoint).unwrap_err() {
            PnmlImportError::InconsistentFlow { source, target } => {
                assert_eq!(source, "p1");
                assert_eq!(target, "gone");
            }
            other => panic!("expected InconsistentFlow, got {other:?}"),
        }

        let place_to_place = r#"<pnml><page>
            <place id="p1"/>
            <place id="p2"/>
            <arc source="p1" target="p2"/>
        </page></pnml>"#;
        assert!(matches!(
            import_pnml_str(place_to_place).unwrap_err(),
            PnmlImportError::InconsistentFlow { .. }
        ));
    }

    #[test]
    fn arcs_may_precede_their_endpoints() {
        let pnml = r#"<pnml><page>
            <arc source="p1" target="t1" weight="3"/>
            <place id="p1"/>
            <transition id="t1"/>
        </page></pnml>"#;
        let (net, _) = import_pnml_str(pnml).unwrap();
        assert_eq!(net.flows().weight(&Flow::new("p1", "t1")), Some(3));
    }

    #[test]
    fn duplicate_identifiers_are_rejected() {
        let pnml = r#"<pnml><page>
            <place id="n1"/>
            <transition id="n1"/>
        </page></pnml>"#;
        assert!(matches!(
            import_pnml_str(pnml).unwrap_err(),
            PnmlImportError::Build(PetrinetBuilderError::DuplicateIdentifier(_))
        ));
    }

    #[test]
    fn marking_is_absent_without_initial_marking_elements() {
        let pnml = r#"<pnml><page><place id="p1"/><transition id="t1"/></page></pnml>"#;
        let (_, marking) = import_pnml_str(pnml).unwrap();
        assert!(marking.is_none());
    }

    #[test]
    fn empty_initial_marking_stages_an_explicit_zero() {
        let pnml = r#"<pnml><page>
            <place id="p1"><initialMarking/></place>
            <place id="p2"/>
        </page></pnml>"#;
        let (_, marking) = import_pnml_str(pnml).unwrap();
        let marking = marking.unwrap();
        assert_eq!(marking.get("p1"), Some(&TokenCount::Integer(0)));
        assert_eq!(marking.get("p2"), None);
    }

    #[test]
    fn malformed_xml_is_rejected() {
        let pnml = r#"<pnml><page><place id="p1"></page></pnml>"#;
        assert!(matches!(
            import_pnml_str(pnml).unwrap_err(),
            PnmlImportError::MalformedDocument(_)
        ));
    }
}
