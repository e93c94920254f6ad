use crate::{
    encode,
    error::Error,
    facet::decode_facets,
    filter::{FilterNode, parse_filter_segment_at},
    location::{DUPLICATE_FACETS, Location},
    obs::{self, TraceEvent},
    reference::Interface,
    sort::{PageCursor, PageDirection, SortSpec, validate_paging},
};

pub(crate) const FACETS_PREFIX: &str = "*::facets::";

const CATALOG_MARKER: &str = "/catalog/";
const MODIFIER_MARKERS: [&str; 3] = ["@sort(", "@before(", "@after("];

impl Location {
    /// Parse a service URI (`<service>/catalog/<id>/<api>/<path>`) or a
    /// fragment (`...#<id>/<path>`). An empty input or empty fragment has
    /// no location and yields `Ok(None)`.
    pub fn parse(uri: &str) -> Result<Option<Self>, Error> {
        let (uri, query) = match uri.split_once('?') {
            Some((uri, query)) => (uri, Some(query)),
            None => (uri, None),
        };

        let (service, catalog, api, path) = if let Some((_, fragment)) = uri.split_once('#') {
            if fragment.is_empty() {
                return Ok(None);
            }
            let (catalog, path) = fragment.split_once('/').unwrap_or((fragment, ""));

            (None, catalog, Interface::Entity, path)
        } else if let Some(at) = uri.find(CATALOG_MARKER) {
            let rest = &uri[at + CATALOG_MARKER.len()..];
            let (catalog, rest) = rest.split_once('/').unwrap_or((rest, ""));
            let (head, tail) = rest.split_once('/').unwrap_or((rest, ""));
            let (api, path) = match Interface::from_name(head) {
                Some(api) => (api, tail),
                None => (Interface::Entity, rest),
            };

            (Some(&uri[..at]), catalog, api, path)
        } else if uri.is_empty() {
            return Ok(None);
        } else {
            return Err(Error::malformed_uri(format!(
                "'{uri}' is neither a catalog URI nor a fragment."
            )));
        };

        let (catalog, snapshot) = match catalog.split_once('@') {
            Some((catalog, snapshot)) => (catalog, Some(snapshot)),
            None => (catalog, None),
        };

        let mut location = parse_path(catalog, path)?;
        location.service = service.map(ToString::to_string);
        location.snapshot = snapshot.map(ToString::to_string);
        location.api = api;
        location.query = query.map(ToString::to_string);

        location.record();

        Ok(Some(location))
    }

    /// Parse a location path (`[schema:]table[/filter][@sort(..)]...`) of
    /// `catalog`.
    pub fn from_path(catalog: &str, path: &str) -> Result<Self, Error> {
        let location = parse_path(catalog, path)?;
        location.record();

        Ok(location)
    }

    fn record(&self) {
        obs::record(TraceEvent::LocationParsed {
            catalog: self.catalog.clone(),
            table: self.table_name.clone(),
        });
    }
}

fn parse_path(catalog: &str, path: &str) -> Result<Location, Error> {
    if catalog.is_empty() {
        return Err(Error::malformed_uri("Catalog id is missing."));
    }

    let split = MODIFIER_MARKERS
        .iter()
        .filter_map(|marker| path.find(marker))
        .min()
        .unwrap_or(path.len());
    let (compact, modifiers) = path.split_at(split);
    let compact = compact.trim_end_matches('/');
    if compact.contains('@') {
        return Err(Error::malformed_uri(format!(
            "Invalid modifiers in '{path}'."
        )));
    }

    let mut segments = compact.split('/');
    let head = segments.next().unwrap_or_default();
    let (schema_name, table_name) = match head.split(':').collect::<Vec<_>>().as_slice() {
        [table] => (None, encode::decode(table)?),
        [schema, table] => (Some(encode::decode(schema)?), encode::decode(table)?),
        _ => return Err(start_with_table()),
    };
    if table_name.is_empty() {
        return Err(start_with_table());
    }

    let mut location = Location::new(catalog, schema_name.as_deref(), table_name);
    let mut filters = Vec::new();

    for segment in segments {
        if segment.is_empty() {
            return Err(Error::malformed_uri(format!(
                "Empty path segment in '{path}'."
            )));
        }

        if let Some(blob) = segment.strip_prefix(FACETS_PREFIX) {
            if location.facets.is_some() {
                return Err(Error::invalid_facet(DUPLICATE_FACETS, Some(path)));
            }
            location.facets = Some(decode_facets(blob, Some(path))?);
            location.facet_blob = Some(blob.to_string());
            continue;
        }

        if segment.starts_with('$') || segment.contains(")=(") {
            return Err(Error::malformed_uri(format!(
                "Join segment '{segment}' is not supported in a location path."
            )));
        }

        filters.push(parse_filter_segment_at(segment, path)?);
    }
    if !filters.is_empty() {
        location.filter = Some(FilterNode::and(filters));
    }

    let (sort, paging) = parse_modifiers(modifiers, path)?;
    location.sort = sort;
    location.paging = paging;

    Ok(location)
}

// `@sort(..)`, `@before(..)` and `@after(..)` in any order, each at most once.
fn parse_modifiers(modifiers: &str, path: &str) -> Result<(SortSpec, Option<PageCursor>), Error> {
    let mut sort: Option<SortSpec> = None;
    let mut before: Option<PageCursor> = None;
    let mut after: Option<PageCursor> = None;

    let mut rest = modifiers;
    while !rest.is_empty() {
        let parsed = rest
            .strip_prefix('@')
            .and_then(|body| body.split_once('('))
            .and_then(|(name, tail)| tail.split_once(')').map(|(inner, tail)| (name, inner, tail)));
        let Some((name, inner, tail)) = parsed else {
            return Err(Error::malformed_uri(format!(
                "Invalid modifiers '{modifiers}'."
            )));
        };

        let duplicate = match name {
            "sort" => sort
                .replace(SortSpec::parse(inner).map_err(|e| e.with_path(path, None))?)
                .is_some(),
            "before" => before
                .replace(
                    PageCursor::parse(PageDirection::Before, inner)
                        .map_err(|e| e.with_path(path, None))?,
                )
                .is_some(),
            "after" => after
                .replace(
                    PageCursor::parse(PageDirection::After, inner)
                        .map_err(|e| e.with_path(path, None))?,
                )
                .is_some(),
            other => {
                return Err(Error::malformed_uri(format!(
                    "Unknown modifier @{other}."
                )));
            }
        };
        if duplicate {
            return Err(Error::malformed_uri(format!(
                "Modifier @{name} is given more than once."
            )));
        }

        rest = tail;
    }

    let sort = sort.unwrap_or_default();
    validate_paging(&sort, before.as_ref(), after.as_ref())
        .map_err(|e| e.with_path(path, None))?;

    Ok((sort, before.or(after)))
}

fn start_with_table() -> Error {
    Error::malformed_uri("Given url must start with `schema:table`.")
}
