use super::{BadgeRules, FieldChains, ListingSelectors, SiteAdapter};
use crate::url::PageParam;

fn chain(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| s.to_string()).collect()
}

/// Dice: cards link straight to `/job-detail/` pages with id-tagged chips.
pub(super) fn dice() -> SiteAdapter {
    SiteAdapter {
        name: "dice".to_string(),
        expected_domain: "*.dice.com".to_string(),
        card_selector: r#"div[role="listitem"]"#.to_string(),
        listing: ListingSelectors {
            link: r#"a[data-testid="job-search-job-card-link"]"#.to_string(),
            title: r#"a[data-testid="job-search-job-detail-link"]"#.to_string(),
            company: r"p.mb-0.line-clamp-2.text-sm.sm\:line-clamp-1".to_string(),
            location: "p.text-sm.font-normal.text-zinc-600".to_string(),
        },
        detail_url_marker: "job-detail".to_string(),
        ready_marker: "h1".to_string(),
        fields: FieldChains {
            title: chain(&["h1"]),
            company: chain(&[
                "a[data-cy='companyNameLink']",
                "[data-cy='companyNameNoLink']",
            ]),
            location: chain(&["li[data-cy='location']"]),
            recruiter: chain(&["p[data-testid='recruiterName']"]),
            description: chain(&["div.job-description", "[data-testid='jobDescriptionHtml']"]),
        },
        badges: BadgeRules::ChipIds {
            selector: "div.chip_chip__cYJs6 span".to_string(),
            employment_prefix: "employmentDetailChip:".to_string(),
            pay_prefix: "payChip:".to_string(),
            work_type_prefix: "location:".to_string(),
        },
        page_param: PageParam::Number {
            name: "page".to_string(),
        },
        title_suffix: None,
        location_from_description: false,
    }
}

/// Indeed: offset pagination, keyword-classified metadata and locations that
/// often only appear inside the description.
pub(super) fn indeed() -> SiteAdapter {
    SiteAdapter {
        name: "indeed".to_string(),
        expected_domain: "*.indeed.com".to_string(),
        card_selector: ".job_seen_beacon".to_string(),
        listing: ListingSelectors {
            link: "a.jcs-JobTitle".to_string(),
            title: "a.jcs-JobTitle".to_string(),
            company: "[data-testid='company-name']".to_string(),
            location: "[data-testid='text-location']".to_string(),
        },
        detail_url_marker: "jk=".to_string(),
        ready_marker: concat!(
            "[data-testid='jobsearch-ViewJobComponent'], ",
            ".jobsearch-ViewJobLayout, ",
            "#jobDescriptionText"
        )
        .to_string(),
        fields: FieldChains {
            title: chain(&[
                "h2.jobsearch-JobInfoHeader-title span",
                "h1[data-testid='jobsearch-JobInfoHeader-title'] span",
                ".jobsearch-JobInfoHeader-title span",
                "h2.jobTitle span",
            ]),
            company: chain(&[
                "[data-testid='inlineHeader-companyName'] a",
                "[data-testid='inlineHeader-companyName']",
                ".jobsearch-JobInfoHeader-companyNameLink a",
                ".css-1h4l2d7",
                "[data-company-name='true']",
            ]),
            location: chain(&[
                "[data-testid='inlineHeader-companyLocation']",
                "[data-testid='job-location']",
            ]),
            recruiter: Vec::new(),
            description: chain(&["#jobDescriptionText", ".jobsearch-JobComponent-description"]),
        },
        badges: BadgeRules::Keywords {
            selectors: chain(&[
                ".js-match-insights-provider-18uwqyc",
                "[class*='match-insights-provider'] span",
                ".jobsearch-JobMetadataHeader-item",
                "[data-testid='attribute_snippet_testid']",
            ]),
        },
        page_param: PageParam::Offset {
            name: "start".to_string(),
            per_page: 10,
        },
        title_suffix: Some(" - job post".to_string()),
        location_from_description: true,
    }
}
