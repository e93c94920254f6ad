// Redirect path computation. Paths here are location paths
// (`schema:table/filter/...@sort(...)@after(...)`), never full URIs.

const FACETS_MARKER: &str = "*::facets::";

// Remove the first `@<name>(...)` modifier.
fn strip_modifier(path: &str, name: &str) -> String {
    let marker = format!("@{name}(");
    let Some(start) = path.find(&marker) else {
        return path.to_string();
    };
    let Some(len) = path[start..].find(')') else {
        return path[..start].to_string();
    };

    format!("{}{}", &path[..start], &path[start + len + 1..])
}

pub(super) fn strip_sort(path: &str) -> String {
    strip_modifier(path, "sort")
}

pub(super) fn strip_paging(path: &str) -> String {
    strip_modifier(&strip_modifier(path, "before"), "after")
}

pub(super) fn strip_filter(path: &str, bad_span: Option<&str>) -> String {
    if let Some(span) = bad_span.filter(|s| !s.is_empty())
        && let Some(start) = path.find(span)
    {
        let mut out = format!("{}{}", &path[..start], &path[start + span.len()..]);
        tidy_slashes(&mut out);
        return out;
    }

    path.find('/')
        .map_or_else(|| path.to_string(), |end| path[..end].to_string())
}

pub(super) fn strip_facets(path: &str) -> String {
    let mut out = path.to_string();
    while let Some(start) = out.find(FACETS_MARKER) {
        let end = out[start..]
            .find(['/', '@'])
            .map_or(out.len(), |offset| start + offset);
        out.replace_range(start..end, "");
    }
    tidy_slashes(&mut out);

    out
}

// Collapse the separators left behind by a removed segment.
fn tidy_slashes(path: &mut String) {
    while let Some(at) = path.find("//") {
        path.replace_range(at..at + 2, "/");
    }
    while let Some(at) = path.find("/@") {
        path.replace_range(at..=at, "");
    }
    while path.ends_with('/') {
        path.pop();
    }
}
