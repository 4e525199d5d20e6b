use crate::http::request::QueryParam;

/// Maximum number of query parameters kept per request.
pub const MAX_QUERY_PARAMS: usize = 5;

/// Splits a `name=value&name=value` segment into at most [`MAX_QUERY_PARAMS`] pairs.
///
/// A name runs up to the next `=`, its value up to the next `&` or the end of the segment.
/// Parsing stops at the first remainder without `=`, and pairs past the cap are dropped.
/// Names and values are copied as-is; no percent-decoding is done.
pub fn parse_query(segment: Option<&str>) -> Vec<QueryParam> {
    let mut params = Vec::new();

    let Some(mut rest) = segment else {
        return params;
    };

    while !rest.is_empty() && params.len() < MAX_QUERY_PARAMS {
        let Some((name, after_eq)) = rest.split_once('=') else {
            break;
        };

        let (value, next) = match after_eq.split_once('&') {
            Some((value, next)) => (value, next),
            None => (after_eq, ""),
        };

        params.push(QueryParam::new(name, value));
        rest = next;
    }

    params
}
