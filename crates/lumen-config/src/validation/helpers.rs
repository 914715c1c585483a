/// Push an error if `value` is outside `[min, max]`.
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: i32, min: i32, max: i32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error if an optional string is present but blank.
pub(crate) fn validate_not_blank(errors: &mut Vec<String>, name: &str, value: Option<&str>) {
    if value.is_some_and(|v| v.trim().is_empty()) {
        errors.push(format!("{name} must not be empty when set"));
    }
}
