#![warn(
    clippy::doc_markdown,
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs
)]

#![doc = include_str!("../README.md")]

///
/// Petri nets: the [`Petrinet`] domain model, its builders, PNML interchange and DOT rendering
///
pub mod petri_net {
    /// Incremental, invariant-checking construction of a [`Petrinet`]
    pub mod builder;
    /// Render a [`Petrinet`] as a Graphviz DOT document
    pub mod export_dot;
    /// Export [`Petrinet`] to `.pnml`
    pub mod export_pnml;
    #[cfg(feature = "graphviz-export")]
    /// Export [`Petrinet`] to images (SVG, PNG, ...)
    ///
    /// __Requires the `graphviz-export` feature to be enabled__
    ///
    /// Also requires an active graphviz installation in the PATH.
    /// See also <https://github.com/besok/graphviz-rust?tab=readme-ov-file#caveats> and <https://graphviz.org/download/>
    pub mod image_export;
    /// Import [`Petrinet`] from `.pnml`
    pub mod import_pnml;
    /// Token [`Marking`]s over the places of a [`Petrinet`]
    pub mod marking;
    /// [`Petrinet`] struct and its node and flow types
    pub mod petri_net_struct;

    #[doc(inline)]
    pub use marking::Marking;

    #[doc(inline)]
    pub use petri_net_struct::Petrinet;
}

pub mod repository;

#[doc(inline)]
pub use petri_net::builder::PetrinetBuilder;

#[doc(inline)]
pub use petri_net::builder::PetrinetBuilderError;

#[doc(inline)]
pub use petri_net::export_dot::petrinet_to_dot;

#[doc(inline)]
pub use petri_net::export_pnml::export_pnml;

#[doc(inline)]
pub use petri_net::export_pnml::export_pnml_to_path;

#[doc(inline)]
pub use petri_net::export_pnml::export_pnml_to_string;

#[cfg(feature = "graphviz-export")]
#[doc(inline)]
pub use petri_net::image_export::export_petrinet_image_png;

#[cfg(feature = "graphviz-export")]
#[doc(inline)]
pub use petri_net::image_export::export_petrinet_image_svg;

#[doc(inline)]
pub use petri_net::import_pnml::import_pnml;

#[doc(inline)]
pub use petri_net::import_pnml::import_pnml_from_path;

#[doc(inline)]
pub use petri_net::import_pnml::import_pnml_reader;

#[doc(inline)]
pub use petri_net::import_pnml::import_pnml_str;

#[doc(inline)]
pub use petri_net::import_pnml::PnmlImportError;

#[doc(inline)]
pub use petri_net::marking::Marking;

#[doc(inline)]
pub use petri_net::marking::MarkingBuilder;

#[doc(inline)]
pub use petri_net::marking::MarkingBuilderError;

#[doc(inline)]
pub use petri_net::marking::TokenCount;

#[doc(inline)]
pub use petri_net::petri_net_struct::Coordinates;

#[doc(inline)]
pub use petri_net::petri_net_struct::Flow;

#[doc(inline)]
pub use petri_net::petri_net_struct::FlowMap;

#[doc(inline)]
pub use petri_net::petri_net_struct::NodeKind;

#[doc(inline)]
pub use petri_net::petri_net_struct::Petrinet;

#[doc(inline)]
pub use petri_net::petri_net_struct::Place;

#[doc(inline)]
pub use petri_net::petri_net_struct::Transition;

///
/// Serialize a [`Petrinet`] as a JSON [`String`]
///
pub fn petrinet_to_json(net: &Petrinet) -> String {
    serde_json::to_string(net).unwrap()
}

///
/// Deserialize a [`Petrinet`] from a JSON [`String`]
///
/// Deserialization replays the data through [`PetrinetBuilder`], so JSON
/// describing a structurally invalid net (duplicate identifiers, same-kind
/// flows, dangling flow endpoints, zero weights) is rejected here rather
/// than producing an invalid value.
///
pub fn json_to_petrinet(net_json: &str) -> Result<Petrinet, serde_json::Error> {
    serde_json::from_str(net_json)
}

#[cfg(test)]
pub(crate) mod utils {
    /// Helpers for getting test files
    pub mod test_utils {
        use std::path::PathBuf;

        /// Get the path of the `test_data` directory (in which test files reside)
        pub fn get_test_data_path() -> PathBuf {
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_data")
        }
    }
}
