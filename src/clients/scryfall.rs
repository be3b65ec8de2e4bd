//! Client for the Scryfall card database.
//!
//! Search syntax reference: <https://scryfall.com/docs/syntax>.
//! Card object reference: <https://scryfall.com/docs/api/cards>.

use crate::config::Config;
use crate::session::{CachedSession, SessionError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

const SCRYFALL_API: &str = "https://api.scryfall.com";

#[derive(Debug, Error)]
pub enum ScryfallError {
    /// The named lookup was called with neither or both of `exact`/`fuzzy`.
    #[error("provide exactly one of `exact` or `fuzzy`")]
    NameFilter,

    /// Scryfall returned an error envelope; the text is the provider's own.
    #[error("scryfall reported an error: {0}")]
    Provider(String),

    /// The payload decoded but violates the documented envelope contract.
    #[error("unexpected scryfall payload: {0}")]
    Payload(String),

    #[error("failed to decode scryfall response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// One card, projected onto the documented column set.
///
/// Undocumented provider fields ride along in `extra` until a simplified
/// search drops them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub mana_cost: Option<String>,
    pub cmc: Option<f64>,
    pub type_line: Option<String>,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub colors: Option<Vec<String>>,
    pub color_indicator: Option<Vec<String>>,
    #[serde(default)]
    pub color_identity: Vec<String>,
    pub rarity: String,
    pub oracle_text: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub produced_mana: Option<Vec<String>>,
    pub image_uris: Option<ImageUris>,
    pub flavor_text: Option<String>,
    /// Faces of a multi-face card, in printed order.
    pub card_faces: Option<Vec<CardFace>>,
    /// Closely related cards (tokens, meld parts, combo pieces).
    pub all_parts: Option<Vec<RelatedCard>>,
    pub legalities: Option<BTreeMap<String, String>>,
    pub released_at: NaiveDate,
    pub set: String,
    pub set_name: String,
    pub set_type: String,
    pub artist: Option<String>,
    pub prices: Option<BTreeMap<String, Option<String>>>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Card {
    /// Drops every field outside the documented column set.
    pub fn simplify(&mut self) {
        self.extra.clear();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardFace {
    pub name: String,
    pub mana_cost: Option<String>,
    pub type_line: Option<String>,
    pub oracle_text: Option<String>,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub colors: Option<Vec<String>>,
    pub flavor_text: Option<String>,
    pub artist: Option<String>,
    pub image_uris: Option<ImageUris>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedCard {
    pub id: String,
    pub component: String,
    pub name: String,
    pub type_line: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUris {
    pub small: Option<String>,
    pub normal: Option<String>,
    pub large: Option<String>,
    pub png: Option<String>,
    pub art_crop: Option<String>,
    pub border_crop: Option<String>,
}

/// Options for [`ScryfallClient::search_by_query`]. Defaults mirror the
/// provider's: no sort overrides, extras excluded, simplified output.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Strategy for omitting similar cards, e.g. `cards`, `art`, `prints`.
    pub unique: Option<String>,
    /// Sort key, e.g. `cmc`, `released`.
    pub order: Option<String>,
    /// Sort direction: `auto`, `asc` or `desc`.
    pub direction: Option<String>,
    /// Include extra cards (tokens, planes, ...).
    pub include_extras: bool,
    /// Include cards in every supported language.
    pub include_multilingual: bool,
    /// Include rare card variants.
    pub include_variations: bool,
    /// Project results onto the documented column set.
    pub simplified: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            unique: None,
            order: None,
            direction: None,
            include_extras: false,
            include_multilingual: false,
            include_variations: false,
            simplified: true,
        }
    }
}

impl SearchOptions {
    #[must_use]
    pub fn with_unique(mut self, unique: &str) -> Self {
        self.unique = Some(unique.to_string());
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: &str) -> Self {
        self.order = Some(order.to_string());
        self
    }

    #[must_use]
    pub fn with_direction(mut self, direction: &str) -> Self {
        self.direction = Some(direction.to_string());
        self
    }

    #[must_use]
    pub const fn with_extras(mut self) -> Self {
        self.include_extras = true;
        self
    }

    #[must_use]
    pub const fn with_multilingual(mut self) -> Self {
        self.include_multilingual = true;
        self
    }

    #[must_use]
    pub const fn with_variations(mut self) -> Self {
        self.include_variations = true;
        self
    }

    /// Keep every provider field instead of the documented column set.
    #[must_use]
    pub const fn full_fields(mut self) -> Self {
        self.simplified = false;
        self
    }
}

/// A named-card lookup. Construct with [`NamedLookup::exact`] or
/// [`NamedLookup::fuzzy`]; supplying neither or both filters is an error.
#[derive(Debug, Clone)]
pub struct NamedLookup {
    pub exact: Option<String>,
    pub fuzzy: Option<String>,
    /// Restrict the lookup to one set.
    pub set_code: Option<String>,
    pub simplified: bool,
}

impl Default for NamedLookup {
    fn default() -> Self {
        Self {
            exact: None,
            fuzzy: None,
            set_code: None,
            simplified: true,
        }
    }
}

impl NamedLookup {
    #[must_use]
    pub fn exact(name: &str) -> Self {
        Self {
            exact: Some(name.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn fuzzy(name: &str) -> Self {
        Self {
            fuzzy: Some(name.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_set_code(mut self, set_code: &str) -> Self {
        self.set_code = Some(set_code.to_string());
        self
    }

    #[must_use]
    pub const fn full_fields(mut self) -> Self {
        self.simplified = false;
        self
    }
}

/// One page of the search endpoint. The same shape doubles as the error
/// envelope (`object == "error"`), which carries `details` and nothing else.
#[derive(Debug, Deserialize)]
struct SearchPage {
    object: String,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    data: Vec<Card>,
    #[serde(default)]
    has_more: Option<bool>,
    #[serde(default)]
    next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorProbe {
    #[serde(default)]
    object: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Fails with the provider's own detail text if `body` is an error envelope.
fn reject_error_envelope(body: &str) -> Result<(), ScryfallError> {
    let probe: ErrorProbe = serde_json::from_str(body)?;
    if probe.object.as_deref() == Some("error") {
        return Err(ScryfallError::Provider(
            probe.details.unwrap_or_else(|| "no details given".to_string()),
        ));
    }
    Ok(())
}

pub struct ScryfallClient {
    session: CachedSession,
}

impl ScryfallClient {
    /// Builds a client from the on-disk configuration (or its defaults).
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(&Config::load()?)
    }

    pub fn with_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::with_session(CachedSession::from_config(
            config, "scryfall",
        )?))
    }

    #[must_use]
    pub const fn with_session(session: CachedSession) -> Self {
        Self { session }
    }

    /// Searches Scryfall with a fulltext query and accumulates every page of
    /// results, in page-arrival order.
    ///
    /// An error envelope on any page fails the whole search with the
    /// provider's detail text; a page whose `has_more` flag is missing is a
    /// contract violation and fails rather than risking an unbounded loop.
    pub async fn search_by_query(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<Card>, ScryfallError> {
        let mut params: Vec<(&str, String)> = vec![("q", query.to_string())];
        if let Some(unique) = &options.unique {
            params.push(("unique", unique.clone()));
        }
        if let Some(order) = &options.order {
            params.push(("order", order.clone()));
        }
        if let Some(direction) = &options.direction {
            params.push(("dir", direction.clone()));
        }
        params.push(("include_extras", options.include_extras.to_string()));
        params.push((
            "include_multilingual",
            options.include_multilingual.to_string(),
        ));
        params.push(("include_variations", options.include_variations.to_string()));
        params.push(("page", "1".to_string()));
        params.push(("format", "json".to_string()));
        params.push(("pretty", "false".to_string()));

        let mut url = format!("{SCRYFALL_API}/cards/search");
        let mut cards: Vec<Card> = Vec::new();

        loop {
            let response = self.session.get(&url, &params).await?;
            let page: SearchPage = serde_json::from_str(&response.body)?;

            if page.object == "error" {
                return Err(ScryfallError::Provider(
                    page.details.unwrap_or_else(|| "no details given".to_string()),
                ));
            }

            cards.extend(page.data);

            let has_more = page.has_more.ok_or_else(|| {
                ScryfallError::Payload("search page is missing `has_more`".to_string())
            })?;
            if !has_more {
                break;
            }

            // The next-page URL is absolute and self-contained.
            url = page.next_page.ok_or_else(|| {
                ScryfallError::Payload("`has_more` is set but `next_page` is missing".to_string())
            })?;
            params.clear();
        }

        debug!("Search for {query:?} returned {} cards", cards.len());

        if options.simplified {
            for card in &mut cards {
                card.simplify();
            }
        }

        Ok(cards)
    }

    /// Looks up a single card by exact or fuzzy name.
    ///
    /// Scryfall reports "no card" and "multiple distinct cards" through its
    /// error envelope, so both surface as [`ScryfallError::Provider`].
    pub async fn search_by_name(&self, lookup: NamedLookup) -> Result<Card, ScryfallError> {
        let name_filter = match (&lookup.exact, &lookup.fuzzy) {
            (Some(exact), None) => ("exact", exact.clone()),
            (None, Some(fuzzy)) => ("fuzzy", fuzzy.clone()),
            _ => return Err(ScryfallError::NameFilter),
        };

        let mut params = vec![name_filter];
        if let Some(set_code) = &lookup.set_code {
            params.push(("set", set_code.clone()));
        }
        params.push(("format", "json".to_string()));
        params.push(("pretty", "false".to_string()));

        let url = format!("{SCRYFALL_API}/cards/named");
        let response = self.session.get(&url, &params).await?;

        reject_error_envelope(&response.body)?;

        let mut card: Card = serde_json::from_str(&response.body)?;
        if lookup.simplified {
            card.simplify();
        }

        Ok(card)
    }
}
