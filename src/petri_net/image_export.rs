use std::fs::File;
use std::io::Write;
use std::path::Path;

use graphviz_rust::cmd::Format;

use super::export_dot::petrinet_to_dot;
use super::marking::Marking;
use super::petri_net_struct::Petrinet;

///
/// Export the image of a [`Petrinet`] (and optionally a [`Marking`] of it)
///
/// The rendered graph is the one produced by
/// [`petrinet_to_dot`](super::export_dot::petrinet_to_dot), passed through
/// the `dot` layout engine. Requires an active graphviz installation in the
/// `PATH`.
///
/// Also see [`export_petrinet_image_svg`] and [`export_petrinet_image_png`]
///
pub fn export_petrinet_image<P: AsRef<Path>>(
    net: &Petrinet,
    marking: Option<&Marking>,
    path: P,
    format: Format,
) -> Result<(), std::io::Error> {
    let dot = petrinet_to_dot(net, marking);
    let out = graphviz_rust::exec_dot(dot, vec![format.into()])?;
    let mut f = File::create(path)?;
    f.write_all(&out)?;
    Ok(())
}

///
/// Export the image of a [`Petrinet`] (and optionally a [`Marking`] of it) as a SVG file
///
pub fn export_petrinet_image_svg<P: AsRef<Path>>(
    net: &Petrinet,
    marking: Option<&Marking>,
    path: P,
) -> Result<(), std::io::Error> {
    export_petrinet_image(net, marking, path, Format::Svg)
}

///
/// Export the image of a [`Petrinet`] (and optionally a [`Marking`] of it) as a PNG file
///
pub fn export_petrinet_image_png<P: AsRef<Path>>(
    net: &Petrinet,
    marking: Option<&Marking>,
    path: P,
) -> Result<(), std::io::Error> {
    export_petrinet_image(net, marking, path, Format::Png)
}
