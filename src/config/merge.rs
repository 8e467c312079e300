//! Deep merge for loose settings values.

use toml::Value;

/// Merge `overlay` onto `base` in place.
///
/// Tables merge recursively, key by key. Everything else, scalars and
/// arrays alike, is overwritten by the overlay. Arrays are never
/// concatenated: an argument or definition list supplied by the caller
/// replaces the base list outright.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base), Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Value {
        s.parse::<Value>().unwrap()
    }

    #[test]
    fn test_arrays_are_replaced_not_concatenated() {
        let mut base = parse(r#"arguments = ["-x"]"#);
        deep_merge(&mut base, parse(r#"arguments = ["-y"]"#));

        assert_eq!(base, parse(r#"arguments = ["-y"]"#));
    }

    #[test]
    fn test_nested_tables_union_keys() {
        let mut base = parse(r#"install = { path = "a" }"#);
        deep_merge(&mut base, parse(r#"install = { binaryPath = "b" }"#));

        assert_eq!(
            base,
            parse(r#"install = { path = "a", binaryPath = "b" }"#)
        );
    }

    #[test]
    fn test_scalars_are_overwritten() {
        let mut base = parse(r#"type = "make""#);
        deep_merge(&mut base, parse(r#"type = "cmake""#));

        assert_eq!(base, parse(r#"type = "cmake""#));
    }

    #[test]
    fn test_overlay_introduces_new_keys() {
        let mut base = parse(r#"build = { target = "all" }"#);
        deep_merge(&mut base, parse(r#"clean = { target = "distclean" }"#));

        assert_eq!(
            base,
            parse(r#"build = { target = "all" }
clean = { target = "distclean" }"#)
        );
    }

    #[test]
    fn test_scalar_replaced_by_table() {
        let mut base = parse(r#"build = "legacy""#);
        deep_merge(&mut base, parse(r#"build = { target = "all" }"#));

        assert_eq!(base, parse(r#"build = { target = "all" }"#));
    }
}
