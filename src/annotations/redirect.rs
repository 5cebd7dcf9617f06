//! Redirect action annotations.
//!
//! # Responsibilities
//! - Detect the single redirect action a declaration carries
//! - Validate its parameter
//! - Resolve the response status (default 302, override within 3XX)
//!
//! # Design Decisions
//! - Actions are mutually exclusive; two or more is an error reported
//!   before the index is touched
//! - A status override without an action is an error, not ignored

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CompileError, ValidationError};
use crate::rules::Annotations;

pub const URL_SET_ANNOTATION: &str = "bfe.ingress.kubernetes.io/redirect.url-set";
pub const URL_FROM_QUERY_ANNOTATION: &str = "bfe.ingress.kubernetes.io/redirect.url-from-query";
pub const URL_PREFIX_ADD_ANNOTATION: &str = "bfe.ingress.kubernetes.io/redirect.url-prefix-add";
pub const SCHEME_SET_ANNOTATION: &str = "bfe.ingress.kubernetes.io/redirect.scheme-set";
pub const RESPONSE_STATUS_ANNOTATION: &str = "bfe.ingress.kubernetes.io/redirect.response-status";

pub const DEFAULT_STATUS: u16 = 302;

/// Origin used to check that a bare path forms a valid URL.
const PLACEHOLDER_ORIGIN: &str = "https://fake.org";

/// Redirect command understood by the matching engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedirectCmd {
    UrlSet,
    UrlFromQuery,
    UrlPrefixAdd,
    SchemeSet,
}

impl RedirectCmd {
    /// Annotation that selects this command.
    pub fn annotation(&self) -> &'static str {
        match self {
            RedirectCmd::UrlSet => URL_SET_ANNOTATION,
            RedirectCmd::UrlFromQuery => URL_FROM_QUERY_ANNOTATION,
            RedirectCmd::UrlPrefixAdd => URL_PREFIX_ADD_ANNOTATION,
            RedirectCmd::SchemeSet => SCHEME_SET_ANNOTATION,
        }
    }
}

const ACTIONS: [RedirectCmd; 4] = [
    RedirectCmd::UrlSet,
    RedirectCmd::UrlFromQuery,
    RedirectCmd::UrlPrefixAdd,
    RedirectCmd::SchemeSet,
];

/// A redirect action descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedirectAction {
    pub cmd: RedirectCmd,
    pub params: Vec<String>,
}

/// Action plus response status derived from a declaration's annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub action: RedirectAction,
    pub status: u16,
}

/// Returns true when exactly one redirect action is present.
///
/// Fails on multiple actions, or on a status override with no action.
pub fn has_redirect(annotations: &Annotations) -> Result<bool, CompileError> {
    let present = present_actions(annotations);
    match present.len() {
        0 => {
            if let Some(value) = annotations.get(RESPONSE_STATUS_ANNOTATION) {
                if !value.is_empty() {
                    return Err(ValidationError::UnexpectedAnnotation {
                        key: RESPONSE_STATUS_ANNOTATION.to_string(),
                        value: value.to_string(),
                    }
                    .into());
                }
            }
            Ok(false)
        }
        1 => Ok(true),
        _ => Err(CompileError::MultipleActions(
            present.iter().map(|cmd| cmd.annotation().to_string()).collect(),
        )),
    }
}

/// Parse the redirect carried by `annotations`, if any.
pub fn parse(annotations: &Annotations) -> Result<Option<Redirect>, CompileError> {
    if !has_redirect(annotations)? {
        return Ok(None);
    }

    let Some(cmd) = present_actions(annotations).into_iter().next() else {
        return Ok(None);
    };
    let param = annotations.get(cmd.annotation()).unwrap_or_default();
    check_action(cmd, param)?;

    Ok(Some(Redirect {
        action: RedirectAction {
            cmd,
            params: vec![param.to_string()],
        },
        status: status_code(annotations)?,
    }))
}

/// Resolve the response status override.
pub fn status_code(annotations: &Annotations) -> Result<u16, ValidationError> {
    let raw = match annotations.get(RESPONSE_STATUS_ANNOTATION) {
        None | Some("") => return Ok(DEFAULT_STATUS),
        Some(raw) => raw,
    };

    match raw.trim().parse::<u16>() {
        Ok(code) if (300..=399).contains(&code) => Ok(code),
        _ => Err(ValidationError::StatusCode {
            key: RESPONSE_STATUS_ANNOTATION.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn present_actions(annotations: &Annotations) -> Vec<RedirectCmd> {
    ACTIONS
        .into_iter()
        .filter(|cmd| annotations.contains(cmd.annotation()))
        .collect()
}

fn check_action(cmd: RedirectCmd, param: &str) -> Result<(), ValidationError> {
    let key = cmd.annotation();
    if param.is_empty() {
        return Err(ValidationError::annotation(key, "value must not be empty"));
    }

    match cmd {
        RedirectCmd::UrlSet => {
            if Url::parse(param).is_ok() {
                return Ok(());
            }
            let joined = format!("{PLACEHOLDER_ORIGIN}{param}");
            match Url::parse(&joined) {
                Ok(url) if url.host_str() == Some("fake.org") => Ok(()),
                _ => Err(ValidationError::annotation(
                    key,
                    format!("[{param}] should be a valid URL string or a valid URL path string"),
                )),
            }
        }
        RedirectCmd::UrlFromQuery => Ok(()),
        RedirectCmd::UrlPrefixAdd => {
            let parsed = Url::parse(param).or_else(|_| {
                Url::parse(PLACEHOLDER_ORIGIN).and_then(|origin| origin.join(param))
            });
            match parsed {
                Ok(url) if url.fragment().is_none() => Ok(()),
                Ok(_) => Err(ValidationError::annotation(
                    key,
                    format!("[{param}] should be a valid URL string without fragment"),
                )),
                Err(e) => Err(ValidationError::annotation(
                    key,
                    format!("[{param}] should be a valid URL string: {e}"),
                )),
            }
        }
        RedirectCmd::SchemeSet => match param {
            "http" | "https" => Ok(()),
            _ => Err(ValidationError::annotation(
                key,
                format!("scheme {param} invalid, only http|https supported now"),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annots(pairs: &[(&str, &str)]) -> Annotations {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_status_code_bounds() {
        assert_eq!(status_code(&Annotations::new()), Ok(302));
        assert_eq!(status_code(&annots(&[(RESPONSE_STATUS_ANNOTATION, "301")])), Ok(301));
        assert!(status_code(&annots(&[(RESPONSE_STATUS_ANNOTATION, "200")])).is_err());
        assert!(status_code(&annots(&[(RESPONSE_STATUS_ANNOTATION, "400")])).is_err());
        assert!(status_code(&annots(&[(RESPONSE_STATUS_ANNOTATION, "3xx")])).is_err());
    }

    #[test]
    fn test_parse_single_action() {
        let a = annots(&[
            (SCHEME_SET_ANNOTATION, "https"),
            (RESPONSE_STATUS_ANNOTATION, "308"),
        ]);
        let redirect = parse(&a).unwrap().unwrap();
        assert_eq!(redirect.action.cmd, RedirectCmd::SchemeSet);
        assert_eq!(redirect.action.params, vec!["https".to_string()]);
        assert_eq!(redirect.status, 308);
    }

    #[test]
    fn test_no_action_is_none() {
        assert_eq!(parse(&Annotations::new()), Ok(None));
    }

    #[test]
    fn test_multiple_actions_rejected() {
        let a = annots(&[
            (URL_SET_ANNOTATION, "https://example.org"),
            (SCHEME_SET_ANNOTATION, "https"),
        ]);
        match parse(&a) {
            Err(CompileError::MultipleActions(keys)) => assert_eq!(keys.len(), 2),
            other => panic!("expected MultipleActions, got {:?}", other),
        }
    }

    #[test]
    fn test_status_without_action_rejected() {
        let a = annots(&[(RESPONSE_STATUS_ANNOTATION, "301")]);
        assert!(matches!(
            has_redirect(&a),
            Err(CompileError::Validation(ValidationError::UnexpectedAnnotation { .. }))
        ));
    }

    #[test]
    fn test_action_parameters() {
        assert!(check_action(RedirectCmd::UrlSet, "https://example.org/a").is_ok());
        assert!(check_action(RedirectCmd::UrlSet, "/relative/path").is_ok());
        assert!(check_action(RedirectCmd::UrlPrefixAdd, "/prefix").is_ok());
        assert!(check_action(RedirectCmd::UrlPrefixAdd, "https://example.org/p#frag").is_err());
        assert!(check_action(RedirectCmd::SchemeSet, "ftp").is_err());
        assert!(check_action(RedirectCmd::UrlFromQuery, "target").is_ok());
        assert!(check_action(RedirectCmd::UrlFromQuery, "").is_err());
    }
}
