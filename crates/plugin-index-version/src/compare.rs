use std::cmp::Ordering;

/// Compare two dotted version strings.
///
/// Pre-release separators (`-`) are treated like release separators (`.`).
/// Leading identical segments are skipped; the first differing pair decides,
/// numerically if both parse as integers and lexically otherwise. When one
/// version runs out of segments first, the longer one is greater, so
/// `1.2.3 > 1.2` and `2.0-rc1 > 2.0`.
pub fn compare(a: &str, b: &str) -> Ordering {
    let left = segments(a);
    let right = segments(b);

    let common = left
        .iter()
        .zip(right.iter())
        .take_while(|(l, r)| l == r)
        .count();

    match (left.get(common), right.get(common)) {
        (Some(l), Some(r)) => compare_segment(l, r),
        _ => left.len().cmp(&right.len()),
    }
}

/// Returns true if `candidate` is strictly later than `current`.
pub fn is_later(candidate: &str, current: &str) -> bool {
    compare(candidate, current) == Ordering::Greater
}

fn segments(version: &str) -> Vec<&str> {
    version.split(['.', '-']).collect()
}

fn compare_segment(l: &str, r: &str) -> Ordering {
    match (l.parse::<i64>(), r.parse::<i64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r),
        _ => l.cmp(r),
    }
}
