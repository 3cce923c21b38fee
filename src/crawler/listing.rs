//! Listing extraction
//!
//! Reads the result cards of a loaded search page in DOM order. Every field
//! is read on its own; a missing field leaves that field empty and never
//! drops the card.

use crate::browser::{Browser, BrowserError, ElementHandle};
use crate::dataset::ListingRecord;
use crate::site::SiteAdapter;
use url::Url;

/// Extracts the listing cards of the current page
///
/// # Arguments
///
/// * `browser` - Browser with the results page loaded
/// * `site` - Card and field selectors
/// * `page_url` - URL the page was requested with; base for relative links
/// * `limit` - Process at most this many cards
///
/// # Returns
///
/// Listings in DOM order. Cards whose link is missing or does not look like a
/// detail page get an empty `detail_url`. A card list that is still stale
/// after one retry is reported as `BrowserError::StaleReference`.
pub async fn extract_listings(
    browser: &dyn Browser,
    site: &SiteAdapter,
    page_url: &str,
    limit: Option<usize>,
) -> Result<Vec<ListingRecord>, BrowserError> {
    let cards = match browser.query(&site.card_selector).await {
        Err(BrowserError::StaleReference) => {
            tracing::debug!("Card list went stale, querying again");
            browser.query(&site.card_selector).await?
        }
        other => other?,
    };
    let base = Url::parse(page_url).ok();
    let limit = limit.unwrap_or(usize::MAX);

    if cards.len() > limit {
        tracing::debug!("Processing {} of {} cards", limit, cards.len());
    }

    let mut listings = Vec::new();
    for (index, card) in cards.iter().take(limit).enumerate() {
        let position = index + 1;
        match read_card(browser, site, card, base.as_ref()).await {
            Ok(mut listing) => {
                listing.listing_url = card_url(page_url, position);
                listings.push(listing);
            }
            Err(BrowserError::StaleReference) => {
                tracing::debug!("Card {} went stale, skipping", position);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(listings)
}

async fn read_card(
    browser: &dyn Browser,
    site: &SiteAdapter,
    card: &ElementHandle,
    base: Option<&Url>,
) -> Result<ListingRecord, BrowserError> {
    let href = match browser.find_within(card, &site.listing.link).await {
        Ok(link) => link.attr("href").unwrap_or("").trim().to_string(),
        Err(e) if e.is_not_found() => String::new(),
        Err(e) => return Err(e),
    };

    let detail_url = match resolve_href(&href, base) {
        Some(url) if site.is_detail_url(&url) => url,
        Some(url) => {
            tracing::debug!("Not a detail link, keeping listing only: {}", url);
            String::new()
        }
        None => String::new(),
    };

    Ok(ListingRecord {
        detail_url,
        title_preview: card_text(browser, card, &site.listing.title).await?,
        company_preview: card_text(browser, card, &site.listing.company).await?,
        location_preview: card_text(browser, card, &site.listing.location).await?,
        listing_url: String::new(),
    })
}

async fn card_text(
    browser: &dyn Browser,
    card: &ElementHandle,
    selector: &str,
) -> Result<String, BrowserError> {
    match browser.find_within(card, selector).await {
        Ok(element) => Ok(element.text.trim().to_string()),
        Err(e) if e.is_not_found() => Ok(String::new()),
        Err(e) => Err(e),
    }
}

/// Resolves a card link to an absolute http(s) URL
fn resolve_href(href: &str, base: Option<&Url>) -> Option<String> {
    if href.is_empty() {
        return None;
    }

    let resolved = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Identifies a card by its results page and 1-based position
fn card_url(page_url: &str, position: usize) -> String {
    let fragment = format!("card-{}", position);
    match Url::parse(page_url) {
        Ok(mut url) => {
            url.set_fragment(Some(&fragment));
            url.to_string()
        }
        Err(_) => format!("{}#{}", page_url, fragment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeBrowser;

    const PAGE_URL: &str = "https://www.dice.com/jobs?q=oracle&page=1";

    const RESULTS: &str = r#"
        <html><body>
        <div role="listitem">
            <a data-testid="job-search-job-card-link" href="/job-detail/aaa?searchlink=x"></a>
            <a data-testid="job-search-job-detail-link">Oracle EBS Consultant</a>
            <p class="mb-0 line-clamp-2 text-sm sm:line-clamp-1">Acme Staffing</p>
            <p class="text-sm font-normal text-zinc-600">Dallas, TX</p>
        </div>
        <div role="listitem">
            <a data-testid="job-search-job-card-link" href="https://www.dice.com/job-detail/bbb"></a>
            <a data-testid="job-search-job-detail-link">Oracle Financials Lead</a>
            <p class="text-sm font-normal text-zinc-600">Remote</p>
        </div>
        <div role="listitem">
            <a data-testid="job-search-job-card-link" href="https://apply.example.net/redirect?id=9"></a>
            <a data-testid="job-search-job-detail-link">Oracle DBA</a>
        </div>
        <div role="listitem">
            <a data-testid="job-search-job-detail-link">Oracle Apps Analyst</a>
        </div>
        </body></html>
    "#;

    #[tokio::test]
    async fn test_extracts_cards_in_dom_order() {
        let site = SiteAdapter::preset("dice").unwrap();
        let mut browser = FakeBrowser::new().with_page(PAGE_URL, RESULTS);
        browser.navigate(PAGE_URL).await.unwrap();

        let listings = extract_listings(&browser, &site, PAGE_URL, None).await.unwrap();
        let titles: Vec<_> = listings.iter().map(|l| l.title_preview.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Oracle EBS Consultant",
                "Oracle Financials Lead",
                "Oracle DBA",
                "Oracle Apps Analyst"
            ]
        );

        assert_eq!(
            listings[0].detail_url,
            "https://www.dice.com/job-detail/aaa?searchlink=x"
        );
        assert_eq!(listings[0].company_preview, "Acme Staffing");
        assert_eq!(listings[0].location_preview, "Dallas, TX");
        assert_eq!(listings[0].listing_url, format!("{}#card-1", PAGE_URL));
    }

    #[tokio::test]
    async fn test_stale_card_list_is_queried_again() {
        let site = SiteAdapter::preset("dice").unwrap();
        let mut browser = FakeBrowser::new()
            .with_page(PAGE_URL, RESULTS)
            .with_stale_once(&site.card_selector);
        browser.navigate(PAGE_URL).await.unwrap();

        let listings = extract_listings(&browser, &site, PAGE_URL, None).await.unwrap();
        assert_eq!(listings.len(), 4);
    }

    #[tokio::test]
    async fn test_card_list_stale_twice_is_reported() {
        let site = SiteAdapter::preset("dice").unwrap();
        let mut browser = FakeBrowser::new()
            .with_page(PAGE_URL, RESULTS)
            .with_stale(&site.card_selector);
        browser.navigate(PAGE_URL).await.unwrap();

        let result = extract_listings(&browser, &site, PAGE_URL, None).await;
        assert!(matches!(result, Err(BrowserError::StaleReference)));
    }

    #[tokio::test]
    async fn test_missing_fields_are_empty_not_fatal() {
        let site = SiteAdapter::preset("dice").unwrap();
        let mut browser = FakeBrowser::new().with_page(PAGE_URL, RESULTS);
        browser.navigate(PAGE_URL).await.unwrap();

        let listings = extract_listings(&browser, &site, PAGE_URL, None).await.unwrap();

        assert_eq!(listings[1].company_preview, "");
        assert_eq!(listings[1].location_preview, "Remote");
        // Redirect links and missing links both demote to listing-only.
        assert_eq!(listings[2].detail_url, "");
        assert_eq!(listings[3].detail_url, "");
        assert_eq!(listings[3].listing_url, format!("{}#card-4", PAGE_URL));
    }

    #[tokio::test]
    async fn test_listing_cap() {
        let site = SiteAdapter::preset("dice").unwrap();
        let mut browser = FakeBrowser::new().with_page(PAGE_URL, RESULTS);
        browser.navigate(PAGE_URL).await.unwrap();

        let listings = extract_listings(&browser, &site, PAGE_URL, Some(2)).await.unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[1].title_preview, "Oracle Financials Lead");
    }

    #[tokio::test]
    async fn test_page_without_cards() {
        let site = SiteAdapter::preset("dice").unwrap();
        let mut browser = FakeBrowser::new().with_page(PAGE_URL, "<html><body>No jobs</body></html>");
        browser.navigate(PAGE_URL).await.unwrap();

        let listings = extract_listings(&browser, &site, PAGE_URL, None).await.unwrap();
        assert!(listings.is_empty());
    }

    #[tokio::test]
    async fn test_stale_cards_are_skipped() {
        let site = SiteAdapter::preset("dice").unwrap();
        let mut browser = FakeBrowser::new()
            .with_page(PAGE_URL, RESULTS)
            .with_stale(&site.listing.link);
        browser.navigate(PAGE_URL).await.unwrap();

        let listings = extract_listings(&browser, &site, PAGE_URL, None).await.unwrap();
        assert!(listings.is_empty());
    }

    #[test]
    fn test_resolve_relative_href() {
        let base = Url::parse("https://www.dice.com/jobs?q=sap&page=2").unwrap();
        assert_eq!(
            resolve_href("/job-detail/abc", Some(&base)).as_deref(),
            Some("https://www.dice.com/job-detail/abc")
        );
        assert_eq!(
            resolve_href("https://www.dice.com/job-detail/xyz", Some(&base)).as_deref(),
            Some("https://www.dice.com/job-detail/xyz")
        );
    }

    #[test]
    fn test_resolve_rejects_non_http() {
        let base = Url::parse("https://www.dice.com/jobs").unwrap();
        assert_eq!(resolve_href("javascript:void(0)", Some(&base)), None);
        assert_eq!(resolve_href("mailto:hr@dice.com", Some(&base)), None);
        assert_eq!(resolve_href("", Some(&base)), None);
        assert_eq!(resolve_href("/job-detail/1", None), None);
    }

    #[test]
    fn test_card_url_fragment() {
        assert_eq!(
            card_url("https://www.dice.com/jobs?q=sap&page=2", 4),
            "https://www.dice.com/jobs?q=sap&page=2#card-4"
        );
        assert_eq!(card_url("not a url", 1), "not a url#card-1");
    }
}
