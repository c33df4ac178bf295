use std::fs::File;
use std::io::Write;
use std::path::Path;

use quick_xml::events::BytesText;
use quick_xml::Writer;

use super::marking::{Marking, TokenCount};
use super::petri_net_struct::{Coordinates, Petrinet, Place, Transition};

// Type of an Ok: Result (for easier to read code in the Writer closures below)
const OK: std::io::Result<()> = Ok(());

fn write_position<W: Write>(writer: &mut Writer<W>, position: Coordinates) -> std::io::Result<()> {
    writer
        .create_element("graphics")
        .write_inner_content(|writer| {
            writer
                .create_element("position")
                .with_attribute(("x", position.x.to_string().as_str()))
                .with_attribute(("y", position.y.to_string().as_str()))
                .write_empty()?;
            OK
        })?;
    Ok(())
}

fn write_label<W: Write>(writer: &mut Writer<W>, label: &str) -> std::io::Result<()> {
    writer.create_element("name").write_inner_content(|writer| {
        writer
            .create_element("text")
            .write_text_content(BytesText::new(label))?;
        OK
    })?;
    Ok(())
}

fn write_place<W: Write>(
    writer: &mut Writer<W>,
    place: &Place,
    marking: Option<&Marking>,
) -> std::io::Result<()> {
    writer
        .create_element("place")
        .with_attribute(("id", place.id()))
        .write_inner_content(|writer| {
            if let Some(label) = place.label() {
                write_label(writer, label)?;
            }
            if let Some(position) = place.coordinates() {
                write_position(writer, position)?;
            }
            // Explicit zero entries round-trip as an empty initialMarking.
            if let Some(TokenCount::Integer(count)) = marking.and_then(|m| m.get(place.id())) {
                writer
                    .create_element("initialMarking")
                    .write_inner_content(|writer| {
                        for _ in 0..*count {
                            writer.create_element("token").write_empty()?;
                        }
                        OK
                    })?;
            }
            OK
        })?;
    Ok(())
}

fn write_transition<W: Write>(
    writer: &mut Writer<W>,
    transition: &Transition,
) -> std::io::Result<()> {
    writer
        .create_element("transition")
        .with_attribute(("id", transition.id()))
        .write_inner_content(|writer| {
            if let Some(label) = transition.label() {
                write_label(writer, label)?;
            }
            if let Some(position) = transition.coordinates() {
                write_position(writer, position)?;
            }
            OK
        })?;
    Ok(())
}

///
/// Export a [`Petrinet`] (and optionally a [`Marking`] of it) as a PNML
/// document to the given XML writer ([`quick_xml::Writer`])
///
/// The produced document is within the subset understood by
/// [`import_pnml`](super::import_pnml::import_pnml): one `net`, one `page`,
/// `place`/`transition` elements with optional `name` and `graphics`
/// children, token-counting `initialMarking` elements for every place the
/// marking has an explicit entry for, and one `arc` element per flow.
///
pub fn export_pnml<W>(
    net: &Petrinet,
    marking: Option<&Marking>,
    writer: &mut Writer<W>,
) -> Result<(), quick_xml::Error>
where
    W: Write,
{
    writer.create_element("pnml").write_inner_content(|writer| {
        writer
            .create_element("net")
            .with_attributes(vec![
                ("id", "net1"),
                ("type", "http://www.pnml.org/version-2009/grammar/ptnet"),
            ])
            .write_inner_content(|writer| {
                writer
                    .create_element("page")
                    .with_attribute(("id", "page1"))
                    .write_inner_content(|writer| {
                        for place in net.places() {
                            write_place(writer, place, marking)?;
                        }
                        for transition in net.transitions() {
                            write_transition(writer, transition)?;
                        }
                        for (flow, weight) in net.flows().iter() {
                            writer
                                .create_element("arc")
                                .with_attribute((
                                    "id",
                                    format!("{}{}", flow.source(), flow.target()).as_str(),
                                ))
                                .with_attribute(("source", flow.source()))
                                .with_attribute(("target", flow.target()))
                                .with_attribute(("weight", weight.to_string().as_str()))
                                .write_empty()?;
                        }
                        OK
                    })?;
                OK
            })?;
        OK
    })?;
    Ok(())
}

///
/// Export a [`Petrinet`] (and optionally a [`Marking`] of it) as a PNML [`String`]
///
pub fn export_pnml_to_string(
    net: &Petrinet,
    marking: Option<&Marking>,
) -> Result<String, quick_xml::Error> {
    let mut writer = Writer::new(Vec::new());
    export_pnml(net, marking, &mut writer)?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

///
/// Export a [`Petrinet`] (and optionally a [`Marking`] of it) as a PNML file
/// to the given filepath
///
pub fn export_pnml_to_path<P: AsRef<Path>>(
    net: &Petrinet,
    marking: Option<&Marking>,
    path: P,
) -> Result<(), quick_xml::Error> {
    let file = File::create(path)?;
    let mut writer = Writer::new_with_indent(file, b' ', 4);
    export_pnml(net, marking, &mut writer)
}
