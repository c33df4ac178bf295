use itertools::Itertools;

use super::marking::Marking;
use super::petri_net_struct::{Coordinates, Petrinet, Place, Transition};

///
/// Render a [`Petrinet`] (and optionally a [`Marking`]) as a Graphviz DOT document
///
/// The layout of the produced text:
///
/// - global font defaults for the graph, its nodes and its edges
/// - one declaration line per node kind, listing all identifiers of that
///   kind followed by the shared style (ellipses for places, filled green
///   boxes for transitions); kinds without any node are left out entirely
/// - one line per node carrying its display label as an `xlabel` and, when
///   the node has coordinates, an `xcoordinates` hint (nodes without
///   coordinates get no such attribute, not a zero default)
/// - one `source -> target;` line per flow, with a `label` attribute for
///   weights greater than 1 (weight 1 is the implicit default and stays
///   unlabeled)
/// - if a marking is given, one `label` line per place holding a positive
///   token count (zero counts stay visually silent)
///
/// Rendering is pure and total: a structurally valid net cannot fail to
/// render. Identifiers are emitted as unquoted DOT node ids; callers feeding
/// identifiers from untrusted sources are responsible for making sure they
/// are valid in the DOT grammar, no quoting or escaping is applied here.
///
pub fn petrinet_to_dot(net: &Petrinet, marking: Option<&Marking>) -> String {
    let mut lines: Vec<String> = vec![
        r#"graph [fontname="monospace", fontsize="14"]"#.to_string(),
        r#"node [fontname="monospace", fontsize="14"]"#.to_string(),
        r#"edge [fontname="monospace", fontsize="10"]"#.to_string(),
    ];

    if !net.places().is_empty() {
        lines.push(format!(
            r#"{}[shape="ellipse", width=0.75, height=0.75, label=""]"#,
            net.places().iter().map(Place::id).join(", ")
        ));
        for place in net.places() {
            lines.push(node_label_line(
                place.id(),
                place.display_label(),
                place.coordinates(),
            ));
        }
    }

    if !net.transitions().is_empty() {
        lines.push(format!(
            r##"{}[shape="box", style="filled", fillcolor="#2ECC71", width=0.75, height=0.75]"##,
            net.transitions().iter().map(Transition::id).join(", ")
        ));
        for transition in net.transitions() {
            lines.push(node_label_line(
                transition.id(),
                transition.display_label(),
                transition.coordinates(),
            ));
        }
    }

    for (flow, weight) in net.flows().iter() {
        let mut line = format!("{} -> {}", flow.source(), flow.target());
        if weight > 1 {
            line.push_str(&format!("[label={weight}]"));
        }
        line.push(';');
        lines.push(line);
    }

    if let Some(marking) = marking {
        for (place, tokens) in marking.iter() {
            if !tokens.is_positive() {
                continue;
            }
            lines.push(format!(r#"{place} [label="{tokens}"];"#));
        }
    }

    format!("digraph G {{\n\t{}\n}}", lines.join("\n\t"))
}

fn node_label_line(id: &str, label: &str, coordinates: Option<Coordinates>) -> String {
    match coordinates {
        Some(position) => format!(r#"{id} [xlabel="{label}", xcoordinates="{position}"]"#),
        None => format!(r#"{id} [xlabel="{label}"]"#),
    }
}
