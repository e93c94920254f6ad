use crate::{
    encode,
    error::Error,
    facet::{FacetTerm, Facets},
};
use serde_json::Value;

pub const INVALID_STRING: &str = "Given encoded string cannot be decoded.";
pub const INVALID_FACET: &str = "Facet description is invalid.";
pub const INVALID_BOOLEAN_OPERATOR: &str = "Only conjunction of facets is supported currently.";

/// Compress a facet set into an LZString URI-component blob, the form
/// facet permalinks are shared in.
pub fn encode_facets(facets: &Facets) -> Result<String, Error> {
    let json = serde_json::to_string(facets)
        .map_err(|e| Error::invalid_input(format!("facets cannot be serialized: {e}")))?;

    Ok(lz_str::compress_to_encoded_uri_component(json.as_str()))
}

/// Decode a blob produced by [`encode_facets`]. `path` is the location
/// path the blob came from, used for the redirect.
pub fn decode_facets(blob: &str, path: Option<&str>) -> Result<Facets, Error> {
    let invalid_string = || Error::invalid_facet(INVALID_STRING, path);

    // the blob alphabet has no `%`, so this only undoes escaping by a browser
    let blob = encode::decode(blob).map_err(|_| invalid_string())?;
    let wide = lz_str::decompress_from_encoded_uri_component(blob.as_str())
        .ok_or_else(invalid_string)?;
    let json = String::from_utf16(&wide).map_err(|_| invalid_string())?;
    let value: Value = serde_json::from_str(&json).map_err(|_| invalid_string())?;

    facets_from_value(&value).map_err(|e| match path {
        Some(path) => e.with_path(path, None),
        None => e,
    })
}

/// Validate the JSON shape of a facet set. Term errors carry `(index=i)`.
pub fn facets_from_value(value: &Value) -> Result<Facets, Error> {
    let Value::Object(object) = value else {
        return Err(Error::invalid_facet(INVALID_FACET, None));
    };
    if object.contains_key("or") {
        return Err(Error::invalid_facet(INVALID_BOOLEAN_OPERATOR, None));
    }
    let Some(Value::Array(terms)) = object.get("and") else {
        return Err(Error::invalid_facet(INVALID_FACET, None));
    };
    if terms.is_empty() {
        return Err(Error::invalid_facet(INVALID_FACET, None));
    }

    let and = terms
        .iter()
        .enumerate()
        .map(|(index, term)| {
            serde_json::from_value::<FacetTerm>(term.clone()).map_err(|_| {
                Error::invalid_facet(format!("{INVALID_FACET}(index={index})"), None)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Facets { and })
}
