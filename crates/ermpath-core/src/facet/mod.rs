//! Facet blobs: the JSON model, the LZString path encoding, rendering
//! into join paths, and conversion from plain filters.

mod codec;
mod convert;
mod model;
mod render;


pub use codec::{
    INVALID_BOOLEAN_OPERATOR, INVALID_FACET, INVALID_STRING, decode_facets, encode_facets,
    facets_from_value,
};
pub use model::{FacetRange, FacetTerm, Facets};
pub use render::{
    FacetPath, FacetRenderer, INVALID_CHOICE, INVALID_RANGE, INVALID_SEARCH, INVALID_SOURCE,
    INVALID_SOURCEKEY, MISSING_CONSTRAINTS, ONLY_ONE_NULL_FILTER,
};
