/// Counts the bytes at the start of `$expression[$offset..]` which
/// match `$pattern`.
macro_rules! strspn {
    ($expression:expr, $pattern:pat $(if $guard:expr)?, $offset:expr $(,)?) => {{
        $expression[$offset..]
            .iter()
            .position(|&b| !matches!(b, $pattern $(if $guard)?))
            .unwrap_or($expression.len() - $offset)
    }};
    ($expression:expr, $pattern:pat $(if $guard:expr)?, $offset:expr, $limit:expr $(,)?) => {{
        $expression[$offset..$offset + $limit]
            .iter()
            .position(|&b| !matches!(b, $pattern $(if $guard)?))
            .unwrap_or($limit)
    }};
}

/// Counts the bytes at the start of `$expression[$offset..]` before
/// the first match of `$pattern`.
macro_rules! strcspn {
    ($expression:expr, $pattern:pat $(if $guard:expr)?, $offset:expr $(,)?) => {{
        $expression[$offset..]
            .iter()
            .position(|&b| matches!(b, $pattern $(if $guard)?))
            .unwrap_or($expression.len() - $offset)
    }};
    ($expression:expr, $pattern:pat $(if $guard:expr)?, $offset:expr, $limit:expr $(,)?) => {{
        $expression[$offset..$offset + $limit]
            .iter()
            .position(|&b| matches!(b, $pattern $(if $guard)?))
            .unwrap_or($limit)
    }};
}

pub(crate) use strcspn;
pub(crate) use strspn;
