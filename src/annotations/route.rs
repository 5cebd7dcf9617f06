//! Cookie and header routing annotations.
//!
//! Values take the form `"<name>: <value>"`, for example
//! `router.header: "X-Canary: true"`.

use crate::annotations::quote;
use crate::error::ValidationError;
use crate::rules::Annotations;

pub const COOKIE_ANNOTATION: &str = "bfe.ingress.kubernetes.io/router.cookie";
pub const HEADER_ANNOTATION: &str = "bfe.ingress.kubernetes.io/router.header";

/// Routing-relevant annotation kinds, in rendering order.
const ROUTE_ANNOTATIONS: [(&str, &str); 2] = [
    (COOKIE_ANNOTATION, "req_cookie_value_in"),
    (HEADER_ANNOTATION, "req_header_value_in"),
];

/// Ranking over routing annotation kinds, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// No routing-relevant annotation: pure host + path.
    Basic,
    Header,
    Cookie,
    CookieHeader,
}

/// Classify a declaration's annotations.
pub fn priority(annotations: &Annotations) -> Priority {
    match (
        annotations.contains(COOKIE_ANNOTATION),
        annotations.contains(HEADER_ANNOTATION),
    ) {
        (true, true) => Priority::CookieHeader,
        (true, false) => Priority::Cookie,
        (false, true) => Priority::Header,
        (false, false) => Priority::Basic,
    }
}

/// Render the routing predicates of `annotations`, or an empty string when
/// none are present.
pub fn expression(annotations: &Annotations) -> Result<String, ValidationError> {
    let mut primitives = Vec::new();
    for (key, function) in ROUTE_ANNOTATIONS {
        if let Some(raw) = annotations.get(key) {
            let (name, value) = split_pair(key, raw)?;
            primitives.push(format!(
                "{}({}, {}, false)",
                function,
                quote(name),
                quote(value)
            ));
        }
    }
    Ok(primitives.join("&&"))
}

/// Check every routing annotation without rendering.
pub fn validate(annotations: &Annotations) -> Result<(), ValidationError> {
    expression(annotations).map(|_| ())
}

fn split_pair<'a>(key: &str, raw: &'a str) -> Result<(&'a str, &'a str), ValidationError> {
    let Some((name, value)) = raw.split_once(':') else {
        return Err(ValidationError::annotation(
            key,
            format!("[{raw}] should have the form \"<name>: <value>\""),
        ));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::annotation(key, format!("[{raw}] has an empty name")));
    }
    Ok((name, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annots(pairs: &[(&str, &str)]) -> Annotations {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_priority_classes() {
        assert_eq!(priority(&Annotations::new()), Priority::Basic);
        assert_eq!(
            priority(&annots(&[("unrelated/key", "v")])),
            Priority::Basic
        );
        assert_eq!(
            priority(&annots(&[(HEADER_ANNOTATION, "X-A: 1")])),
            Priority::Header
        );
        assert_eq!(
            priority(&annots(&[(COOKIE_ANNOTATION, "c: 2")])),
            Priority::Cookie
        );
        assert_eq!(
            priority(&annots(&[(HEADER_ANNOTATION, "X-A: 1"), (COOKIE_ANNOTATION, "c: 2")])),
            Priority::CookieHeader
        );
        assert!(Priority::CookieHeader > Priority::Cookie);
        assert!(Priority::Cookie > Priority::Header);
        assert!(Priority::Header > Priority::Basic);
    }

    #[test]
    fn test_expression_rendering() {
        assert_eq!(expression(&Annotations::new()).unwrap(), "");

        let header = annots(&[(HEADER_ANNOTATION, "X-Canary: true")]);
        assert_eq!(
            expression(&header).unwrap(),
            r#"req_header_value_in("X-Canary", "true", false)"#
        );

        let both = annots(&[(HEADER_ANNOTATION, "X-A: 1"), (COOKIE_ANNOTATION, "user: beta")]);
        assert_eq!(
            expression(&both).unwrap(),
            r#"req_cookie_value_in("user", "beta", false)&&req_header_value_in("X-A", "1", false)"#
        );
    }

    #[test]
    fn test_malformed_values_rejected() {
        assert!(validate(&annots(&[(COOKIE_ANNOTATION, "no-separator")])).is_err());
        assert!(validate(&annots(&[(HEADER_ANNOTATION, " : value")])).is_err());
    }

    #[test]
    fn test_values_are_escaped() {
        let tricky = annots(&[(HEADER_ANNOTATION, r#"X-A: say "hi""#)]);
        assert_eq!(
            expression(&tricky).unwrap(),
            r#"req_header_value_in("X-A", "say \"hi\"", false)"#
        );
    }
}
