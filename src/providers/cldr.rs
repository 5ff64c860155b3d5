//! Unicode CLDR supplemental data: download and `currencyData` extraction.
use crate::core::config::SourceConfig;
use crate::core::history::{CurrencyValidity, RegionCurrencyHistory, RegionCurrencySource};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct CldrProvider {
    url: String,
    timeout: Duration,
}

impl CldrProvider {
    pub fn new(url: &str, timeout: Duration) -> Self {
        CldrProvider {
            url: url.to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(&config.url, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl RegionCurrencySource for CldrProvider {
    /// Single attempt; any transport error or non-2xx status is returned.
    async fn fetch_document(&self) -> Result<String> {
        debug!("Requesting CLDR data from {}", self.url);

        let client = reqwest::Client::builder()
            .user_agent(concat!("curmap/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .build()?;

        let response = client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("Failed to fetch CLDR data from {}", self.url))?;

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read CLDR response body from {}", self.url))?;

        info!("Successfully fetched CLDR currency data");
        Ok(body)
    }
}

fn attribute(element: &BytesStart, name: &str) -> Result<Option<String>> {
    match element.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn date_attribute(element: &BytesStart, name: &str) -> Result<Option<NaiveDate>> {
    match attribute(element, name)?.filter(|value| !value.is_empty()) {
        Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .map(Some)
            .with_context(|| format!("Invalid '{name}' date in CLDR currency data: '{value}'")),
        None => Ok(None),
    }
}

fn parse_currency(element: &BytesStart) -> Result<Option<CurrencyValidity>> {
    let Some(currency_code) = attribute(element, "iso4217")? else {
        warn!("Skipping currency element without iso4217 attribute");
        return Ok(None);
    };

    Ok(Some(CurrencyValidity {
        currency_code,
        valid_from: date_attribute(element, "from")?,
        valid_to: date_attribute(element, "to")?,
        is_tender: attribute(element, "tender")?.as_deref() != Some("false"),
    }))
}

/// A `region` element being read, with the depth it was opened at.
struct OpenRegion {
    code: Option<String>,
    depth: usize,
    currencies: Vec<CurrencyValidity>,
}

/// Extracts every `region` under `currencyData` with its direct `currency`
/// children, keeping document order. Regions without an `iso3166` code are
/// skipped; a repeated region code keeps the later list.
pub fn parse_currency_data(xml: &str) -> Result<RegionCurrencyHistory> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut history = RegionCurrencyHistory::new();
    let mut found_section = false;
    let mut section_depth: Option<usize> = None;
    let mut regions: Vec<OpenRegion> = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            anyhow!(
                "Failed to parse CLDR XML at position {}: {e}",
                reader.error_position()
            )
        })?;

        let (element, self_closing) = match event {
            Event::Start(element) => (element, false),
            Event::Empty(element) => (element, true),
            Event::End(_) => {
                close_element(depth, &mut section_depth, &mut regions, &mut history);
                depth -= 1;
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        depth += 1;
        match element.name().as_ref() {
            b"currencyData" if section_depth.is_none() => {
                found_section = true;
                section_depth = Some(depth);
            }
            b"region" if section_depth.is_some() => {
                regions.push(OpenRegion {
                    code: attribute(&element, "iso3166")?,
                    depth,
                    currencies: Vec::new(),
                });
            }
            b"currency" => {
                if let Some(region) = regions.last_mut().filter(|r| r.depth + 1 == depth)
                    && let Some(currency) = parse_currency(&element)?
                {
                    region.currencies.push(currency);
                }
            }
            _ => {}
        }

        if self_closing {
            close_element(depth, &mut section_depth, &mut regions, &mut history);
            depth -= 1;
        }
    }

    if depth != 0 {
        bail!("Failed to parse CLDR XML: document ended with unclosed elements");
    }
    if !found_section {
        bail!("Could not find currencyData section in XML");
    }

    info!("Parsed currency data for {} regions", history.len());
    Ok(history)
}

fn close_element(
    depth: usize,
    section_depth: &mut Option<usize>,
    regions: &mut Vec<OpenRegion>,
    history: &mut RegionCurrencyHistory,
) {
    if regions.last().is_some_and(|region| region.depth == depth)
        && let Some(region) = regions.pop()
    {
        match region.code {
            Some(code) => {
                history.insert(code, region.currencies);
            }
            None => debug!("Skipping region element without iso3166 attribute"),
        }
    } else if *section_depth == Some(depth) {
        *section_depth = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::validity;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE supplementalData SYSTEM "../../common/dtd/ldmlSupplemental.dtd">
<supplementalData>
    <version number="$Revision$"/>
    <currencyData>
        <fractions>
            <info iso4217="ADP" digits="0" rounding="0"/>
        </fractions>
        <region iso3166="DE">
            <currency iso4217="EUR" from="2002-01-01"/>
            <currency iso4217="DEM" from="1948-06-20" to="2002-02-28"/>
            <currency iso4217="XEU" from="1979-03-13" to="1998-12-31" tender="false"/>
        </region>
        <region iso3166="US">
            <currency iso4217="USD" from="1792-01-01"/>
            <currency iso4217="USN" tender="false"/>
        </region>
        <region>
            <currency iso4217="ZZZ" from="2000-01-01"/>
        </region>
        <region iso3166="AQ"/>
    </currencyData>
    <territoryContainment>
        <group type="001" contains="019 002"/>
    </territoryContainment>
</supplementalData>
"#;

    #[test]
    fn test_parse_currency_data() {
        let history = parse_currency_data(SAMPLE).unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(
            history.get("DE").unwrap(),
            &vec![
                validity("EUR", Some("2002-01-01"), None, true),
                validity("DEM", Some("1948-06-20"), Some("2002-02-28"), true),
                validity("XEU", Some("1979-03-13"), Some("1998-12-31"), false),
            ]
        );
        assert_eq!(
            history.get("US").unwrap(),
            &vec![
                validity("USD", Some("1792-01-01"), None, true),
                validity("USN", None, None, false),
            ]
        );
        assert!(history.get("AQ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_ignores_regions_outside_currency_data() {
        let xml = r#"<supplementalData>
            <other><region iso3166="FR"><currency iso4217="FRF"/></region></other>
            <currencyData><region iso3166="IT"><currency iso4217="EUR" from="2002-01-01"/></region></currencyData>
        </supplementalData>"#;

        let history = parse_currency_data(xml).unwrap();
        assert_eq!(history.keys().collect::<Vec<_>>(), vec!["IT"]);
    }

    #[test]
    fn test_parse_repeated_region_keeps_later_entry() {
        let xml = r#"<supplementalData><currencyData>
            <region iso3166="FR"><currency iso4217="FRF" from="1960-01-01"/></region>
            <region iso3166="FR"><currency iso4217="EUR" from="1999-01-01"/></region>
        </currencyData></supplementalData>"#;

        let history = parse_currency_data(xml).unwrap();
        assert_eq!(
            history.get("FR").unwrap(),
            &vec![validity("EUR", Some("1999-01-01"), None, true)]
        );
    }

    #[test]
    fn test_parse_missing_currency_data_section() {
        let result = parse_currency_data("<supplementalData><version/></supplementalData>");
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "Could not find currencyData section in XML"
        );
    }

    #[test]
    fn test_parse_malformed_markup() {
        let result = parse_currency_data("<supplementalData><currencyData></region></supplementalData>");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .starts_with("Failed to parse CLDR XML")
        );
    }

    #[test]
    fn test_parse_truncated_document() {
        let result = parse_currency_data("<supplementalData><currencyData><region iso3166=\"DE\">");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_invalid_date() {
        let xml = r#"<supplementalData><currencyData>
            <region iso3166="DE"><currency iso4217="EUR" from="2002-13-45"/></region>
        </currencyData></supplementalData>"#;

        let result = parse_currency_data(xml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid 'from' date"));
    }

    async fn create_cldr_mock_server(body: &str, status_code: u16) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/supplementalData.xml"))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_successful_fetch() {
        let mock_server = create_cldr_mock_server(SAMPLE, 200).await;
        let url = format!("{}/supplementalData.xml", mock_server.uri());

        let provider = CldrProvider::new(&url, Duration::from_secs(5));
        let body = provider.fetch_document().await.unwrap();

        assert_eq!(body, SAMPLE);
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let mock_server = create_cldr_mock_server("Server Error", 500).await;
        let url = format!("{}/supplementalData.xml", mock_server.uri());

        let provider = CldrProvider::new(&url, Duration::from_secs(5));
        let result = provider.fetch_document().await;

        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            format!("Failed to fetch CLDR data from {url}")
        );
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(SAMPLE)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let provider = CldrProvider::new(&mock_server.uri(), Duration::from_millis(200));
        let result = provider.fetch_document().await;

        assert!(result.is_err());
    }
}
