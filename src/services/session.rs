// src/services/session.rs

//! Stateful HTTP session with the orobnat portal.
//!
//! The portal keeps the current form selection server-side, keyed by the
//! session cookie, so every request goes through the same cookie-aware
//! client.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::blocking::Client;
use scraper::Html;
use serde::Serialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{OptionMap, PortalConfig, ResultPage, SearchTarget};
use crate::services::Portal;
use crate::utils::http::{create_client, read_page};
use crate::utils::{elem_text, normalize_whitespace, parse_selector};

static RE_REGION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"idRegion=(\d+)$").expect("invalid regex: region id"));

/// Value of the `methode` form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormAction {
    ChangeDepartment,
    ChangeNetwork,
    Search,
}

impl FormAction {
    fn as_str(&self) -> &'static str {
        match self {
            FormAction::ChangeDepartment => "changerDepartement",
            FormAction::ChangeNetwork => "changerReseau",
            FormAction::Search => "rechercher",
        }
    }
}

/// Form fields accepted by the search endpoint.
#[derive(Debug, Clone, Serialize)]
struct FormPayload<'a> {
    methode: &'a str,
    #[serde(rename = "idRegion")]
    region: &'a str,
    usd: &'a str,
    #[serde(rename = "posPLV")]
    position: usize,
    departement: &'a str,
    #[serde(rename = "communeDepartement")]
    commune: &'a str,
    reseau: &'a str,
}

impl<'a> FormPayload<'a> {
    /// Blank template every request starts from.
    fn base(program: &'a str) -> Self {
        Self {
            methode: "",
            region: "",
            usd: program,
            position: 0,
            departement: "",
            commune: "",
            reseau: "",
        }
    }

    fn action(mut self, action: FormAction) -> Self {
        self.methode = action.as_str();
        self
    }
}

/// Portal session. Released when dropped.
pub struct FormSession {
    client: Client,
    config: PortalConfig,
}

impl FormSession {
    /// Build the client and prime the server-side session.
    pub fn open(config: &PortalConfig) -> Result<Self> {
        let session = Self {
            client: create_client(config)?,
            config: config.clone(),
        };
        session.initialize()?;
        Ok(session)
    }

    /// Request the menu page once so the portal attaches a session to the cookie jar.
    pub fn initialize(&self) -> Result<()> {
        let url = self.menu_url(&self.config.bootstrap_region)?;
        log::debug!("Priming portal session: {}", url);
        self.client.get(url).send()?.error_for_status()?;
        Ok(())
    }

    /// Menu page URL for a region.
    fn menu_url(&self, region: &str) -> Result<Url> {
        Ok(Url::parse_with_params(
            &self.config.menu_url,
            &[
                ("methode", "menu"),
                ("usd", self.config.program.as_str()),
                ("idRegion", region),
            ],
        )?)
    }

    fn get(&self, url: &str) -> Result<String> {
        log::debug!("GET {}", url);
        Ok(read_page(self.client.get(url).send()?)?.body)
    }

    fn post(&self, payload: &FormPayload<'_>) -> Result<ResultPage> {
        log::debug!("POST {} {:?}", self.config.search_url, payload);
        read_page(
            self.client
                .post(&self.config.search_url)
                .form(payload)
                .send()?,
        )
    }
}

impl Portal for FormSession {
    fn list_regions(&self) -> Result<OptionMap> {
        parse_regions(&self.get(&self.config.regions_url)?)
    }

    fn list_departments(&self, region: &str) -> Result<OptionMap> {
        let url = self.menu_url(region)?;
        parse_select_options(&self.get(url.as_str())?, "departement")
    }

    fn list_communes(&self, region: &str, department: &str) -> Result<OptionMap> {
        let payload = FormPayload {
            region,
            departement: department,
            ..FormPayload::base(&self.config.program)
        }
        .action(FormAction::ChangeDepartment);
        parse_select_options(&self.post(&payload)?.body, "communeDepartement")
    }

    fn list_networks(&self, region: &str, department: &str, commune: &str) -> Result<OptionMap> {
        let payload = FormPayload {
            region,
            departement: department,
            commune,
            ..FormPayload::base(&self.config.program)
        }
        .action(FormAction::ChangeNetwork);
        parse_select_options(&self.post(&payload)?.body, "reseau")
    }

    fn fetch_result_page(&self, target: &SearchTarget, position: usize) -> Result<ResultPage> {
        let payload = FormPayload {
            region: &target.region,
            position,
            departement: &target.department,
            commune: &target.commune,
            reseau: &target.network,
            ..FormPayload::base(&self.config.program)
        }
        .action(FormAction::Search);
        self.post(&payload)
    }
}

impl Drop for FormSession {
    fn drop(&mut self) {
        log::debug!("Closing portal session");
    }
}

/// Extract region links from the informational page.
///
/// Links live in `blockquote.spip a.spip_out` and end with `idRegion=<id>`.
pub fn parse_regions(html: &str) -> Result<OptionMap> {
    let document = Html::parse_document(html);
    let container_sel = parse_selector("blockquote.spip")?;
    let link_sel = parse_selector("a.spip_out")?;

    let container = document
        .select(&container_sel)
        .next()
        .ok_or_else(|| AppError::parse("region list container 'blockquote.spip' not found"))?;

    let mut regions = OptionMap::new();
    for link in container.select(&link_sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        match RE_REGION_ID.captures(href.trim()) {
            Some(caps) => {
                regions.insert(caps[1].to_string(), normalize_whitespace(&elem_text(link)));
            }
            None => log::debug!("Skipping non-region link: {}", href),
        }
    }
    Ok(regions)
}

/// Extract the options of the `<select name="...">` form field.
///
/// Placeholder options without a value are skipped.
pub fn parse_select_options(html: &str, name: &str) -> Result<OptionMap> {
    let document = Html::parse_document(html);
    let select_sel = parse_selector(&format!("select[name=\"{name}\"]"))?;
    let option_sel = parse_selector("option")?;

    let select = document
        .select(&select_sel)
        .next()
        .ok_or_else(|| AppError::parse(format!("form field '{name}' not found")))?;

    Ok(select
        .select(&option_sel)
        .filter_map(|option| {
            let value = option.value().attr("value")?.trim();
            (!value.is_empty())
                .then(|| (value.to_string(), normalize_whitespace(&elem_text(option))))
        })
        .collect())
}
