//! Client for the 17Lands draft-analytics endpoints.
//!
//! Metric definitions: <https://www.17lands.com/metrics_definitions>.
//! Provider metric names are renamed to self-describing ones at the parse
//! boundary (e.g. `win_rate` becomes `games_played_win_rate`).

use crate::config::Config;
use crate::reshape::{self, ReshapeError};
use crate::session::{CachedSession, RawResponse, SessionError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::debug;

const SEVENTEEN_LANDS_API: &str = "https://www.17lands.com";

#[derive(Debug, Error)]
pub enum SeventeenLandsError {
    /// 17Lands has no error envelope; a non-200 status is the only signal.
    #[error("17lands returned HTTP {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The draft stream carried a tag other than `complete`.
    #[error("draft is not complete, stream type: `{status}`")]
    Incomplete { status: String },

    /// The payload decoded but violates the documented shape.
    #[error("unexpected 17lands payload: {0}")]
    Shape(String),

    #[error("inconsistent 17lands payload: {0}")]
    Reshape(#[from] ReshapeError),

    #[error("failed to decode 17lands response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Wins and games for one color combination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColorRating {
    pub is_summary: bool,
    pub color_name: String,
    pub wins: i64,
    pub games: i64,
}

/// Aggregate statistics for one card.
///
/// Win-rate style metrics may be absent for low-sample cards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardRating {
    pub name: String,
    pub color: String,
    pub rarity: String,
    pub seen_count: i64,
    #[serde(rename = "avg_seen")]
    pub avg_last_seen_at: Option<f64>,
    pub pick_count: i64,
    #[serde(rename = "avg_pick")]
    pub avg_taken_at: Option<f64>,
    #[serde(rename = "game_count")]
    pub games_played_count: i64,
    #[serde(rename = "win_rate")]
    pub games_played_win_rate: Option<f64>,
    pub opening_hand_game_count: i64,
    pub opening_hand_win_rate: Option<f64>,
    pub drawn_game_count: i64,
    pub drawn_win_rate: Option<f64>,
    #[serde(rename = "ever_drawn_game_count")]
    pub in_hand_game_count: i64,
    #[serde(rename = "ever_drawn_win_rate")]
    pub in_hand_win_rate: Option<f64>,
    #[serde(rename = "never_drawn_game_count")]
    pub not_drawn_game_count: i64,
    #[serde(rename = "never_drawn_win_rate")]
    pub not_drawn_win_rate: Option<f64>,
    #[serde(rename = "drawn_improvement_win_rate")]
    pub improvement_when_drawn: Option<f64>,
}

/// One (date, card) cell of the evaluation time series.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CardEvaluation {
    pub date: NaiveDate,
    pub name: String,
    pub pick_count: i64,
    pub avg_taken_at: Option<f64>,
    pub seen_count: i64,
    pub avg_last_seen_at: Option<f64>,
}

/// Play/draw statistics for one (expansion, event type) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayDrawStat {
    pub expansion: String,
    pub event_type: String,
    pub avg_game_length: f64,
    pub on_play_win_rate: f64,
}

/// One recent trophy deck. `draft_id` and `deck_index` feed
/// [`SeventeenLandsClient::get_draft`] and [`SeventeenLandsClient::get_deck`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrophyDeck {
    #[serde(deserialize_with = "deserialize_trophy_time")]
    pub time: NaiveDateTime,
    pub colors: String,
    pub wins: i64,
    pub losses: i64,
    pub start_rank: Option<String>,
    pub end_rank: Option<String>,
    #[serde(rename = "aggregate_id")]
    pub draft_id: String,
    pub deck_index: i64,
}

/// One pick of a draft, with the pool state at that point.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DraftPick {
    pub expansion: String,
    /// First pack is 0.
    pub pack_number: i64,
    /// First pick is 0.
    pub pick_number: i64,
    pub colors: String,
    pub pick: String,
    pub available: Vec<String>,
    pub known_missing: Vec<String>,
    pub pool: Vec<String>,
    pub possible_maindeck: Vec<String>,
    pub probable_sideboard: Vec<String>,
}

/// Card statistics computed at the time of a draft.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CardPerformance {
    pub name: String,
    pub seen_count: i64,
    pub avg_last_seen_at: Option<f64>,
    pub pick_count: i64,
    pub avg_taken_at: Option<f64>,
}

/// A fully streamed draft: pick-by-pick details plus the card statistics
/// 17Lands computed at draft time.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Draft {
    pub picks: Vec<DraftPick>,
    pub card_performance: Vec<CardPerformance>,
}

/// The two sections a deck card can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeckSection {
    Maindeck,
    Sideboard,
}

impl DeckSection {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "Maindeck" => Some(Self::Maindeck),
            "Sideboard" => Some(Self::Sideboard),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Maindeck => "Maindeck",
            Self::Sideboard => "Sideboard",
        }
    }
}

/// One (section, card) row of a deck.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeckCard {
    pub section: DeckSection,
    pub name: String,
}

/// Event totals and navigation links accompanying a deck.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeckMetadata {
    pub expansion: String,
    pub event_type: String,
    pub wins: i64,
    pub losses: i64,
    pub pool_link: String,
    pub deck_links: Vec<String>,
    pub details_link: String,
    pub draft_link: String,
    pub sealed_deck_tech_link: String,
}

fn deserialize_trophy_time<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_trophy_time(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized trophy time `{raw}`")))
}

fn parse_trophy_time(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.naive_utc());
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// The draft endpoint streams one SSE-style frame, `data: {...}` followed by
/// a blank line, instead of a bare JSON document.
fn strip_stream_frame(body: &str) -> Result<&str, SeventeenLandsError> {
    body.strip_prefix("data: ")
        .map(str::trim_end)
        .ok_or_else(|| {
            SeventeenLandsError::Shape("draft stream frame is missing its `data: ` prefix".into())
        })
}

fn ensure_ok(response: &RawResponse) -> Result<(), SeventeenLandsError> {
    if response.status == 200 {
        Ok(())
    } else {
        Err(SeventeenLandsError::UnexpectedStatus {
            status: response.status,
            url: response.url.clone(),
        })
    }
}

fn date_param(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn names(cards: Vec<RawCardRef>) -> Vec<String> {
    cards.into_iter().map(|card| card.name).collect()
}

#[derive(Debug, Deserialize)]
struct RawCardRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<RawDraftPayload>,
}

#[derive(Debug, Deserialize)]
struct RawDraftPayload {
    expansion: String,
    picks: Vec<RawPick>,
    card_performance_data: BTreeMap<String, RawCardPerformance>,
}

#[derive(Debug, Deserialize)]
struct RawPick {
    pack_number: i64,
    pick_number: i64,
    colors: String,
    pick: RawCardRef,
    available: Vec<RawCardRef>,
    known_missing: Vec<RawCardRef>,
    pool: Vec<RawCardRef>,
    /// Arrives as a list of card-object lists, one per deck row.
    possible_maindeck: Vec<Vec<RawCardRef>>,
    probable_sideboard: Vec<Vec<RawCardRef>>,
}

#[derive(Debug, Deserialize)]
struct RawCardPerformance {
    total_times_seen: i64,
    avg_seen_position: Option<f64>,
    total_times_picked: i64,
    avg_pick_position: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawEvaluations {
    dates: Vec<String>,
    cards: Vec<String>,
    data: Vec<Vec<RawEvaluationCell>>,
}

#[derive(Debug, Deserialize)]
struct RawEvaluationCell {
    pick_n: i64,
    pick_avg: Option<f64>,
    seen_n: i64,
    seen_avg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawDeck {
    groups: Vec<RawDeckGroup>,
    event_info: RawEventInfo,
    builder_link: String,
}

#[derive(Debug, Deserialize)]
struct RawDeckGroup {
    name: String,
    cards: Vec<RawCardRef>,
}

#[derive(Debug, Deserialize)]
struct RawEventInfo {
    expansion: String,
    #[serde(rename = "format")]
    event_type: String,
    wins: i64,
    losses: i64,
    pool_link: String,
    deck_links: Vec<String>,
    details_link: String,
    draft_link: String,
}

pub struct SeventeenLandsClient {
    session: CachedSession,
}

impl SeventeenLandsClient {
    /// Builds a client from the on-disk configuration (or its defaults).
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(&Config::load()?)
    }

    pub fn with_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::with_session(CachedSession::from_config(
            config, "17lands",
        )?))
    }

    #[must_use]
    pub const fn with_session(session: CachedSession) -> Self {
        Self { session }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, SeventeenLandsError> {
        let response = self.session.get(url, params).await?;
        ensure_ok(&response)?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// All color combinations 17Lands reports data for.
    pub async fn get_colors(&self) -> Result<Vec<String>, SeventeenLandsError> {
        self.get_json(&format!("{SEVENTEEN_LANDS_API}/data/colors"), &[])
            .await
    }

    /// All supported expansion codes.
    pub async fn get_expansions(&self) -> Result<Vec<String>, SeventeenLandsError> {
        self.get_json(&format!("{SEVENTEEN_LANDS_API}/data/expansions"), &[])
            .await
    }

    /// All supported event types. The most common ones are in
    /// [`crate::constants::event_types`].
    pub async fn get_event_types(&self) -> Result<Vec<String>, SeventeenLandsError> {
        self.get_json(&format!("{SEVENTEEN_LANDS_API}/data/formats"), &[])
            .await
    }

    /// Wins and games played per color combination.
    ///
    /// `combine_splash` aggregates splash decks together with their main
    /// colors; `user_group` filters to one player tier
    /// ([`crate::constants::player_tiers`]), all tiers when `None`.
    pub async fn get_color_ratings(
        &self,
        expansion: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        event_type: &str,
        combine_splash: bool,
        user_group: Option<&str>,
    ) -> Result<Vec<ColorRating>, SeventeenLandsError> {
        let mut params = vec![
            ("expansion", expansion.to_string()),
            ("event_type", event_type.to_string()),
            ("start_date", date_param(start_date)),
            ("end_date", date_param(end_date)),
            ("combine_splash", combine_splash.to_string()),
        ];
        if let Some(user_group) = user_group {
            params.push(("user_group", user_group.to_string()));
        }

        self.get_json(&format!("{SEVENTEEN_LANDS_API}/color_ratings/data"), &params)
            .await
    }

    /// Per-card aggregate statistics.
    ///
    /// `deck_colors` restricts the sample to decks of one color combination
    /// ([`crate::constants::colors`]).
    pub async fn get_card_ratings(
        &self,
        expansion: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        event_type: &str,
        user_group: Option<&str>,
        deck_colors: Option<&str>,
    ) -> Result<Vec<CardRating>, SeventeenLandsError> {
        let mut params = vec![
            ("expansion", expansion.to_string()),
            ("format", event_type.to_string()),
            ("start_date", date_param(start_date)),
            ("end_date", date_param(end_date)),
        ];
        if let Some(user_group) = user_group {
            params.push(("user_group", user_group.to_string()));
        }
        if let Some(deck_colors) = deck_colors {
            params.push(("colors", deck_colors.to_string()));
        }

        self.get_json(&format!("{SEVENTEEN_LANDS_API}/card_ratings/data"), &params)
            .await
    }

    /// Card evaluations through time: one record per (date, card) pair.
    ///
    /// The provider stores this as parallel `dates`/`cards` arrays plus a
    /// dates-by-cards metric matrix; a matrix that does not match both axes
    /// exactly fails rather than truncating. Repeated card names collapse to
    /// their first occurrence per date.
    pub async fn get_card_evaluations(
        &self,
        expansion: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        event_type: &str,
        rarity: Option<&str>,
        color: Option<&str>,
    ) -> Result<Vec<CardEvaluation>, SeventeenLandsError> {
        let mut params = vec![
            ("expansion", expansion.to_string()),
            ("format", event_type.to_string()),
            ("start_date", date_param(start_date)),
            ("end_date", date_param(end_date)),
        ];
        if let Some(rarity) = rarity {
            params.push(("rarity", rarity.to_string()));
        }
        if let Some(color) = color {
            params.push(("color", color.to_string()));
        }

        let raw: RawEvaluations = self
            .get_json(
                &format!("{SEVENTEEN_LANDS_API}/card_evaluation_metagame/data"),
                &params,
            )
            .await?;

        let dates = raw
            .dates
            .iter()
            .map(|day| {
                NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| {
                    SeventeenLandsError::Shape(format!("unparseable evaluation date `{day}`"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = reshape::cross_rows(&dates, &raw.cards, &raw.data, |date, card, cell| {
            CardEvaluation {
                date: *date,
                name: card.clone(),
                pick_count: cell.pick_n,
                avg_taken_at: cell.pick_avg,
                seen_count: cell.seen_n,
                avg_last_seen_at: cell.seen_avg,
            }
        })?;

        let mut seen = HashSet::new();
        records.retain(|record| seen.insert((record.date, record.name.clone())));

        Ok(records)
    }

    /// Play/draw statistics per (expansion, event type).
    pub async fn get_play_draw_stats(&self) -> Result<Vec<PlayDrawStat>, SeventeenLandsError> {
        self.get_json(&format!("{SEVENTEEN_LANDS_API}/data/play_draw"), &[])
            .await
    }

    /// Recent trophy decks for one expansion and event type.
    pub async fn get_trophy_decks(
        &self,
        expansion: &str,
        event_type: &str,
    ) -> Result<Vec<TrophyDeck>, SeventeenLandsError> {
        let params = vec![
            ("expansion", expansion.to_string()),
            ("format", event_type.to_string()),
        ];

        self.get_json(&format!("{SEVENTEEN_LANDS_API}/data/trophies"), &params)
            .await
    }

    /// Pick-by-pick details of one draft, plus the card statistics computed
    /// at draft time.
    ///
    /// The endpoint streams a framed document; only a `complete` stream
    /// yields data. Drafts still in progress (or cut-short streams) fail
    /// with the observed tag.
    pub async fn get_draft(&self, draft_id: &str) -> Result<Draft, SeventeenLandsError> {
        let params = vec![("draft_id", draft_id.to_string())];
        let response = self
            .session
            .get(&format!("{SEVENTEEN_LANDS_API}/data/draft/stream"), &params)
            .await?;
        ensure_ok(&response)?;

        let envelope: StreamEnvelope = serde_json::from_str(strip_stream_frame(&response.body)?)?;
        if envelope.kind != "complete" {
            return Err(SeventeenLandsError::Incomplete {
                status: envelope.kind,
            });
        }

        let payload = envelope.payload.ok_or_else(|| {
            SeventeenLandsError::Shape("complete draft stream is missing its payload".into())
        })?;

        let expansion = payload.expansion;
        let picks: Vec<DraftPick> = payload
            .picks
            .into_iter()
            .map(|pick| DraftPick {
                expansion: expansion.clone(),
                pack_number: pick.pack_number,
                pick_number: pick.pick_number,
                colors: pick.colors,
                pick: pick.pick.name,
                available: names(pick.available),
                known_missing: names(pick.known_missing),
                pool: names(pick.pool),
                possible_maindeck: names(pick.possible_maindeck.into_iter().flatten().collect()),
                probable_sideboard: names(pick.probable_sideboard.into_iter().flatten().collect()),
            })
            .collect();

        let card_performance = reshape::pivot_rows(payload.card_performance_data, |name, raw| {
            CardPerformance {
                name,
                seen_count: raw.total_times_seen,
                avg_last_seen_at: raw.avg_seen_position,
                pick_count: raw.total_times_picked,
                avg_taken_at: raw.avg_pick_position,
            }
        });

        debug!("Draft {draft_id} decoded with {} picks", picks.len());

        Ok(Draft {
            picks,
            card_performance,
        })
    }

    /// One deck of a draft, as (section, card) rows plus event metadata.
    ///
    /// Every group label must be one of the two fixed deck sections; any
    /// other label is a contract violation.
    pub async fn get_deck(
        &self,
        draft_id: &str,
        deck_index: i64,
    ) -> Result<(Vec<DeckCard>, DeckMetadata), SeventeenLandsError> {
        let params = vec![
            ("draft_id", draft_id.to_string()),
            ("deck_index", deck_index.to_string()),
        ];

        let raw: RawDeck = self
            .get_json(&format!("{SEVENTEEN_LANDS_API}/data/deck"), &params)
            .await?;

        let mut deck = Vec::new();
        for group in raw.groups {
            let section = DeckSection::from_label(&group.name).ok_or_else(|| {
                SeventeenLandsError::Shape(format!("unknown deck section `{}`", group.name))
            })?;
            deck.extend(group.cards.into_iter().map(|card| DeckCard {
                section,
                name: card.name,
            }));
        }

        let event_info = raw.event_info;
        let metadata = DeckMetadata {
            expansion: event_info.expansion,
            event_type: event_info.event_type,
            wins: event_info.wins,
            losses: event_info.losses,
            pool_link: event_info.pool_link,
            deck_links: event_info.deck_links,
            details_link: event_info.details_link,
            draft_link: event_info.draft_link,
            sealed_deck_tech_link: raw.builder_link,
        };

        Ok((deck, metadata))
    }
}
