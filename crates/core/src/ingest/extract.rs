use crate::config::Settings;
use crate::domain::pickem::{BracketLabel, TeamEntry};
use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

const DEFAULT_SOURCE_URL: &str =
    "https://www.hltv.org/events/7148/pgl-major-copenhagen-2024";

/// The page URL and the selector set that goes with it, kept together as one
/// value. The markup structure is an unversioned external contract; when it
/// drifts, extraction returns empty results rather than failing.
#[derive(Debug, Clone)]
pub struct ScrapeTarget {
    pub url: String,
    pub sections: Vec<(BracketLabel, String)>,
    pub team_row: String,
    pub team_name: String,
    pub percentage: String,
    pub total_participants: String,
    /// Broad scan used when no bracket section matches; feeds name-list
    /// synthesis.
    pub team_scan: String,
}

impl Default for ScrapeTarget {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            sections: vec![
                (BracketLabel::ThreeZero, ".threeZero-section".to_string()),
                (BracketLabel::ZeroThree, ".zeroThree-section".to_string()),
                (BracketLabel::ThreeOne, ".threeOne-section".to_string()),
                (BracketLabel::ThreeTwo, ".threeTwo-section".to_string()),
            ],
            team_row: ".team-row".to_string(),
            team_name: ".team-name".to_string(),
            percentage: ".percentage".to_string(),
            total_participants: ".total-participants".to_string(),
            team_scan: ".team-box, .team-name, .teamName".to_string(),
        }
    }
}

impl ScrapeTarget {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut out = Self::default();
        if let Some(url) = settings.source_url.as_deref() {
            if !url.trim().is_empty() {
                out.url = url.trim().to_string();
            }
        }
        out
    }
}

/// Everything one pass over the markup yields. Bracket entries are in
/// document order; sorting is the consumer's job.
#[derive(Debug, Clone)]
pub struct PageExtract {
    pub brackets: BTreeMap<BracketLabel, Vec<TeamEntry>>,
    pub team_names: Vec<String>,
    pub total_participants: Option<u64>,
}

impl PageExtract {
    pub fn has_bracket_data(&self) -> bool {
        self.brackets.values().any(|entries| !entries.is_empty())
    }
}

pub fn extract_page(html: &str, target: &ScrapeTarget) -> Result<PageExtract> {
    let doc = Html::parse_document(html);

    let row_sel = sel(&target.team_row)?;
    let name_sel = sel(&target.team_name)?;
    let pct_sel = sel(&target.percentage)?;

    let mut brackets = BTreeMap::new();
    for (label, section) in &target.sections {
        let section_sel = sel(section)?;
        let mut entries = Vec::new();
        for section_el in doc.select(&section_sel) {
            for row in section_el.select(&row_sel) {
                let Some(name) = element_text(&row, &name_sel) else {
                    continue;
                };
                let Some(percentage) = element_text(&row, &pct_sel)
                    .as_deref()
                    .and_then(parse_percent)
                else {
                    continue;
                };
                entries.push(TeamEntry { name, percentage });
            }
        }
        brackets.insert(*label, entries);
    }

    let total_sel = sel(&target.total_participants)?;
    let total_participants = doc
        .select(&total_sel)
        .next()
        .map(text_of)
        .as_deref()
        .and_then(parse_count);

    let scan_sel = sel(&target.team_scan)?;
    let mut team_names = Vec::new();
    for el in doc.select(&scan_sel) {
        let name = text_of(el);
        if !name.is_empty() && !team_names.contains(&name) {
            team_names.push(name);
        }
    }

    Ok(PageExtract {
        brackets,
        team_names,
        total_participants,
    })
}

/// Parses `"28.5%"` (optionally with thousands separators) into `28.5`.
pub fn parse_percent(text: &str) -> Option<f64> {
    let t = text.trim().trim_end_matches('%').replace(',', "");
    let t = t.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok()
}

/// Parses `"147,832"` into `147832`.
pub fn parse_count(text: &str) -> Option<u64> {
    let t = text.trim().replace(',', "");
    if t.is_empty() {
        return None;
    }
    t.parse::<u64>().ok()
}

fn sel(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| anyhow!("invalid selector {raw:?}: {e}"))
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn element_text(scope: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(text_of)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRACKET_PAGE: &str = r#"
        <html><body>
          <div class="threeZero-section">
            <div class="team-row">
              <span class="team-name"> FaZe </span>
              <span class="percentage">28.5%</span>
            </div>
            <div class="team-row">
              <span class="team-name">NAVI</span>
              <span class="percentage">24.3%</span>
            </div>
            <div class="team-row">
              <span class="team-name">G2</span>
              <span class="percentage">18.7%</span>
            </div>
          </div>
          <div class="total-participants">147,832</div>
        </body></html>"#;

    #[test]
    fn extracts_rows_in_document_order() {
        let page = extract_page(BRACKET_PAGE, &ScrapeTarget::default()).unwrap();

        let entries = &page.brackets[&BracketLabel::ThreeZero];
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "FaZe");
        assert_eq!(entries[0].percentage, 28.5);
        assert_eq!(entries[1].percentage, 24.3);
        assert_eq!(entries[2].percentage, 18.7);

        assert!(page.brackets[&BracketLabel::ZeroThree].is_empty());
        assert_eq!(page.total_participants, Some(147_832));
        assert!(page.has_bracket_data());
    }

    #[test]
    fn unmatched_markup_yields_empty_extract() {
        let page =
            extract_page("<html><body><p>nothing here</p></body></html>", &ScrapeTarget::default())
                .unwrap();

        assert!(!page.has_bracket_data());
        assert!(page.brackets.values().all(Vec::is_empty));
        assert!(page.team_names.is_empty());
        assert_eq!(page.total_participants, None);
    }

    #[test]
    fn skips_rows_with_missing_name_or_bad_percentage() {
        let html = r#"
            <div class="threeZero-section">
              <div class="team-row">
                <span class="team-name"></span>
                <span class="percentage">10.0%</span>
              </div>
              <div class="team-row">
                <span class="team-name">MOUZ</span>
                <span class="percentage">n/a</span>
              </div>
              <div class="team-row">
                <span class="team-name">Spirit</span>
                <span class="percentage">31.2%</span>
              </div>
            </div>"#;

        let page = extract_page(html, &ScrapeTarget::default()).unwrap();
        let entries = &page.brackets[&BracketLabel::ThreeZero];
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Spirit");
    }

    #[test]
    fn generic_scan_collects_deduplicated_names() {
        let html = r#"
            <div class="team-box">Vitality</div>
            <div class="team-box">MOUZ</div>
            <div class="teamName">Vitality</div>
            <div class="team-box">  </div>"#;

        let page = extract_page(html, &ScrapeTarget::default()).unwrap();
        assert!(!page.has_bracket_data());
        assert_eq!(page.team_names, vec!["Vitality", "MOUZ"]);
    }

    #[test]
    fn parse_percent_strips_symbol_and_separators() {
        assert_eq!(parse_percent("28.5%"), Some(28.5));
        assert_eq!(parse_percent(" 1,234.5% "), Some(1234.5));
        assert_eq!(parse_percent("12"), Some(12.0));
        assert_eq!(parse_percent("n/a"), None);
        assert_eq!(parse_percent(""), None);
    }

    #[test]
    fn parse_count_strips_separators() {
        assert_eq!(parse_count("147,832"), Some(147_832));
        assert_eq!(parse_count("12"), Some(12));
        assert_eq!(parse_count("many"), None);
    }

    #[test]
    fn settings_url_overrides_default_target() {
        let settings = Settings {
            source_url: Some("https://example.test/pickem".to_string()),
            sentry_dsn: None,
        };
        let target = ScrapeTarget::from_settings(&settings);
        assert_eq!(target.url, "https://example.test/pickem");

        let unset = Settings { source_url: None, sentry_dsn: None };
        assert_eq!(ScrapeTarget::from_settings(&unset).url, DEFAULT_SOURCE_URL);
    }
}
