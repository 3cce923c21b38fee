use crate::UrlError;
use url::Url;

/// Placeholder substituted with the page parameter value in URL templates
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// How a job board encodes the result page in its search URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageParam {
    /// 1-based page number, e.g. `&page=3`
    Number { name: String },
    /// 0-based result offset, e.g. `&start=20` with 10 results per page
    Offset { name: String, per_page: u32 },
}

impl PageParam {
    /// Returns the query parameter name
    pub fn name(&self) -> &str {
        match self {
            Self::Number { name } | Self::Offset { name, .. } => name,
        }
    }

    /// Returns the parameter value for a 1-based page number
    pub fn value_for(&self, page: u32) -> u32 {
        match self {
            Self::Number { .. } => page,
            Self::Offset { per_page, .. } => page.saturating_sub(1) * per_page,
        }
    }
}

/// Builds the URL of one result page of a search
///
/// A `{page}` placeholder in the template is replaced with the parameter
/// value; otherwise the page parameter is set on the query string, replacing
/// any value already present.
///
/// # Examples
///
/// ```
/// use job_harvest::url::{page_url, PageParam};
///
/// let number = PageParam::Number { name: "page".to_string() };
/// let url = page_url("https://www.dice.com/jobs?q=sap", 3, &number).unwrap();
/// assert_eq!(url, "https://www.dice.com/jobs?q=sap&page=3");
///
/// let offset = PageParam::Offset { name: "start".to_string(), per_page: 10 };
/// let url = page_url("https://www.indeed.com/jobs?q=sap", 3, &offset).unwrap();
/// assert_eq!(url, "https://www.indeed.com/jobs?q=sap&start=20");
/// ```
pub fn page_url(template: &str, page: u32, param: &PageParam) -> Result<String, UrlError> {
    let value = param.value_for(page).to_string();

    if template.contains(PAGE_PLACEHOLDER) {
        let filled = template.replace(PAGE_PLACEHOLDER, &value);
        return Url::parse(&filled)
            .map(|url| url.to_string())
            .map_err(|e| UrlError::Parse(format!("{}: {}", filled, e)));
    }

    let mut url =
        Url::parse(template).map_err(|e| UrlError::Parse(format!("{}: {}", template, e)))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != param.name())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(param.name(), &value);

    Ok(url.to_string())
}
