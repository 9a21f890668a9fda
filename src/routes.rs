//! Navigation entry points and the URLs that reach them.

use crate::access::{ShareUrlError, SnippetRef, ID_PARAM};
use crate::snippet::SnippetId;
use thiserror::Error;
use url::Url;

const TITLE_PARAM: &str = "title";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Create,
    Collection,
    View(SnippetRef),
    CodeIssuance {
        id: SnippetId,
        title: Option<String>,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("No page at {0}")]
    Unknown(String),

    #[error("Not a valid address: {0}")]
    Invalid(String),

    #[error(transparent)]
    Share(#[from] ShareUrlError),
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Route {
    /// Resolve an application URL.
    ///
    /// `/?id=<id>` is what older scanned codes point at; it lands on the view
    /// like `/view?id=<id>` does.
    pub fn parse(url: &Url) -> Result<Route, RouteError> {
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [] => match query_value(url, ID_PARAM) {
                Some(id) => Ok(Route::View(SnippetRef::Id(SnippetId::new(id)))),
                None => Ok(Route::Collection),
            },
            ["snippets"] => Ok(Route::Collection),
            ["create"] => Ok(Route::Create),
            ["view"] => Ok(Route::View(SnippetRef::from_share_url(url)?)),
            ["view", id] => {
                let id = percent_decode(id);
                Ok(Route::View(SnippetRef::Id(SnippetId::new(id))))
            }
            ["qr-details"] => {
                let id = query_value(url, ID_PARAM).ok_or(ShareUrlError::MissingId)?;
                Ok(Route::CodeIssuance {
                    id: SnippetId::new(id),
                    title: query_value(url, TITLE_PARAM),
                })
            }
            _ => Err(RouteError::Unknown(url.path().to_string())),
        }
    }

    /// Accepts a full URL or a bare path such as `/view?id=abc`.
    pub fn parse_str(input: &str) -> Result<Route, RouteError> {
        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("app://local/")
                .and_then(|base| base.join(input))
                .map_err(|_| RouteError::Invalid(input.to_string()))?,
            Err(_) => return Err(RouteError::Invalid(input.to_string())),
        };
        Route::parse(&url)
    }

    /// Path and query for this route. A direct-reference view renders as its id.
    pub fn path(&self) -> String {
        match self {
            Route::Create => "/create".to_string(),
            Route::Collection => "/snippets".to_string(),
            Route::View(reference) => {
                format!("/view?{}", encode_pairs(&[(ID_PARAM, reference.id().as_str())]))
            }
            Route::CodeIssuance { id, title } => {
                let mut pairs = vec![(ID_PARAM, id.as_str())];
                if let Some(title) = title {
                    pairs.push((TITLE_PARAM, title.as_str()));
                }
                format!("/qr-details?{}", encode_pairs(&pairs))
            }
        }
    }
}

fn encode_pairs(pairs: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().copied())
        .finish()
}

fn percent_decode(segment: &str) -> String {
    url::form_urlencoded::parse(format!("v={}", segment.replace('+', "%2B")).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| segment.to_string())
}
