use crate::commands::CommandError;

/// Checks the argument count of `command`.
///
/// `max` of `None` means the command is variadic.
pub fn check_arity(
    command: &str,
    arguments: &[String],
    min: usize,
    max: Option<usize>,
) -> Result<(), CommandError> {
    let len = arguments.len();

    if len < min || max.is_some_and(|max| len > max) {
        return Err(CommandError::bad_arity(command));
    }

    Ok(())
}

pub fn parse_integer(argument: &str) -> Result<i64, CommandError> {
    argument
        .parse::<i64>()
        .map_err(|_| CommandError::NotInteger)
}

pub fn parse_float(argument: &str) -> Result<f64, CommandError> {
    match argument.parse::<f64>() {
        Ok(value) if !value.is_nan() => Ok(value),
        _ => Err(CommandError::NotFloat),
    }
}

/// Parses a non-negative count such as the one taken by LPOP or SRANDMEMBER.
pub fn parse_count(argument: &str) -> Result<usize, CommandError> {
    usize::try_from(parse_integer(argument)?).map_err(|_| CommandError::NotInteger)
}

/// Splits `[k1, v1, k2, v2, ...]` into pairs, rejecting an odd count.
pub fn into_pairs(command: &str, arguments: &[String]) -> Result<Vec<(String, String)>, CommandError> {
    if arguments.is_empty() || arguments.len() % 2 != 0 {
        return Err(CommandError::bad_arity(command));
    }

    Ok(arguments
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect())
}

/// Normalizes a `[start, end]` index pair against a sequence of `len` items.
///
/// Negative indices count from the tail. Bounds are clamped, and `None` is
/// returned when the resulting range is empty.
pub fn validate_range_indexes(len: usize, start_index: i64, end_index: i64) -> Option<(usize, usize)> {
    let len = len as i64;

    let start = if start_index < 0 {
        len + start_index
    } else {
        start_index
    };
    let end = if end_index < 0 {
        len + end_index
    } else {
        end_index
    };

    let start = start.max(0);
    let end = end.min(len - 1);

    if start >= len || end < 0 || start > end {
        return None;
    }

    Some((start as usize, end as usize))
}

/// Normalizes a single, possibly negative, index. `None` if out of range.
pub fn normalize_index(len: usize, index: i64) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { len + index } else { index };

    (0..len).contains(&index).then_some(index as usize)
}
