//! End-to-end 17Lands flows driven through a scripted transport.

mod common;

use chrono::NaiveDate;
use common::{FakeTransport, ok_json, ok_text};
use draftdata::clients::seventeen_lands::{
    DeckSection, SeventeenLandsClient, SeventeenLandsError,
};
use draftdata::constants::event_types;
use serde_json::json;

fn client(transport: std::sync::Arc<FakeTransport>) -> SeventeenLandsClient {
    SeventeenLandsClient::with_session(common::session(transport))
}

fn dates() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2022, 1, 31).unwrap(),
    )
}

fn evaluation_cell(pick_n: i64) -> serde_json::Value {
    json!({
        "pick_n": pick_n,
        "pick_avg": 4.5,
        "seen_n": pick_n * 3,
        "seen_avg": 5.0
    })
}

#[tokio::test]
async fn vocabulary_endpoints_return_plain_lists() {
    let transport = FakeTransport::new(|url, _| {
        let body = match url.path() {
            "/data/colors" => json!(["W", "U", "WU"]),
            "/data/expansions" => json!(["DMU", "BRO"]),
            "/data/formats" => json!(["PremierDraft", "TradDraft"]),
            other => panic!("unexpected path: {other}"),
        };
        Ok(ok_json(&body))
    });
    let client = client(transport);

    assert_eq!(client.get_colors().await.unwrap(), vec!["W", "U", "WU"]);
    assert_eq!(client.get_expansions().await.unwrap(), vec!["DMU", "BRO"]);
    assert_eq!(
        client.get_event_types().await.unwrap(),
        vec!["PremierDraft", "TradDraft"]
    );
}

#[tokio::test]
async fn color_ratings_carry_query_filters_and_decode() {
    let transport = FakeTransport::new(|url, _| {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        assert!(pairs.contains(&("expansion".into(), "DMU".into())));
        assert!(pairs.contains(&("event_type".into(), "PremierDraft".into())));
        assert!(pairs.contains(&("start_date".into(), "2022-01-01".into())));
        assert!(pairs.contains(&("end_date".into(), "2022-01-31".into())));
        assert!(pairs.contains(&("combine_splash".into(), "false".into())));
        assert!(
            pairs.iter().all(|(name, _)| name != "user_group"),
            "unset filters must not be sent"
        );

        Ok(ok_json(&json!([{
            "is_summary": true,
            "color_name": "Two-color",
            "wins": 10,
            "games": 20,
            "extra_provider_field": 1
        }])))
    });

    let (start, end) = dates();
    let ratings = client(transport)
        .get_color_ratings("DMU", start, end, event_types::PREMIER_DRAFT, false, None)
        .await
        .unwrap();

    assert_eq!(ratings.len(), 1);
    assert!(ratings[0].is_summary);
    assert_eq!(ratings[0].color_name, "Two-color");
    assert_eq!((ratings[0].wins, ratings[0].games), (10, 20));
}

#[tokio::test]
async fn card_evaluations_emit_the_full_cross_product() {
    let transport = FakeTransport::new(|_, _| {
        Ok(ok_json(&json!({
            "dates": ["2022-01-01", "2022-01-02"],
            "cards": ["A", "B"],
            "data": [
                [evaluation_cell(1), evaluation_cell(2)],
                [evaluation_cell(3), evaluation_cell(4)]
            ]
        })))
    });

    let (start, end) = dates();
    let evaluations = client(transport)
        .get_card_evaluations("DMU", start, end, event_types::PREMIER_DRAFT, None, None)
        .await
        .unwrap();

    assert_eq!(evaluations.len(), 4);
    let pairs: Vec<(String, String)> = evaluations
        .iter()
        .map(|row| (row.date.to_string(), row.name.clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("2022-01-01".into(), "A".into()),
            ("2022-01-01".into(), "B".into()),
            ("2022-01-02".into(), "A".into()),
            ("2022-01-02".into(), "B".into()),
        ]
    );
    assert_eq!(evaluations[2].pick_count, 3);
    assert_eq!(evaluations[2].avg_taken_at, Some(4.5));
}

#[tokio::test]
async fn card_evaluations_deduplicate_repeated_names() {
    let transport = FakeTransport::new(|_, _| {
        Ok(ok_json(&json!({
            "dates": ["2022-01-01"],
            "cards": ["A", "A"],
            "data": [[evaluation_cell(1), evaluation_cell(99)]]
        })))
    });

    let (start, end) = dates();
    let evaluations = client(transport)
        .get_card_evaluations("DMU", start, end, event_types::PREMIER_DRAFT, None, None)
        .await
        .unwrap();

    assert_eq!(evaluations.len(), 1);
    assert_eq!(evaluations[0].pick_count, 1, "first occurrence wins");
}

#[tokio::test]
async fn mismatched_evaluation_matrix_fails_loudly() {
    let transport = FakeTransport::new(|_, _| {
        Ok(ok_json(&json!({
            "dates": ["2022-01-01", "2022-01-02"],
            "cards": ["A", "B"],
            "data": [[evaluation_cell(1), evaluation_cell(2)]]
        })))
    });

    let (start, end) = dates();
    let err = client(transport)
        .get_card_evaluations("DMU", start, end, event_types::PREMIER_DRAFT, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, SeventeenLandsError::Reshape(_)));
}

#[tokio::test]
async fn trophy_decks_rename_the_draft_id() {
    let transport = FakeTransport::new(|_, _| {
        Ok(ok_json(&json!([{
            "time": "2022-10-09 01:23:45",
            "colors": "WU",
            "wins": 7,
            "losses": 1,
            "start_rank": "Gold-1",
            "end_rank": "Platinum-4",
            "aggregate_id": "d4ce12d252824d699372e7d2ec82f813",
            "deck_index": 0
        }])))
    });

    let decks = client(transport)
        .get_trophy_decks("DMU", event_types::PREMIER_DRAFT)
        .await
        .unwrap();

    assert_eq!(decks.len(), 1);
    assert_eq!(decks[0].draft_id, "d4ce12d252824d699372e7d2ec82f813");
    assert_eq!(decks[0].wins, 7);
    assert_eq!(decks[0].time.date(), NaiveDate::from_ymd_opt(2022, 10, 9).unwrap());
}

fn framed(payload: &serde_json::Value) -> String {
    format!("data: {payload}\n\n")
}

fn draft_payload() -> serde_json::Value {
    json!({
        "type": "complete",
        "payload": {
            "expansion": "DMU",
            "picks": [{
                "pack_number": 0,
                "pick_number": 0,
                "colors": "WU",
                "pick": {"name": "Resolute Archangel"},
                "available": [{"name": "Resolute Archangel"}, {"name": "Shore Up"}],
                "known_missing": [],
                "pool": [],
                "possible_maindeck": [
                    [{"name": "Resolute Archangel"}],
                    [{"name": "Shore Up"}, {"name": "Tolarian Terror"}]
                ],
                "probable_sideboard": [[{"name": "Bog Badger"}]]
            }],
            "card_performance_data": {
                "Shore Up": {
                    "total_times_seen": 20,
                    "avg_seen_position": 6.1,
                    "total_times_picked": 9,
                    "avg_pick_position": 7.2
                },
                "Resolute Archangel": {
                    "total_times_seen": 4,
                    "avg_seen_position": 1.2,
                    "total_times_picked": 4,
                    "avg_pick_position": 1.1
                }
            }
        }
    })
}

#[tokio::test]
async fn complete_draft_streams_flatten_into_tables() {
    let transport = FakeTransport::new(|_, _| Ok(ok_text(&framed(&draft_payload()))));

    let draft = client(transport).get_draft("d4ce1").await.unwrap();

    assert_eq!(draft.picks.len(), 1);
    let pick = &draft.picks[0];
    assert_eq!(pick.expansion, "DMU");
    assert_eq!(pick.pick, "Resolute Archangel");
    assert_eq!(pick.available, vec!["Resolute Archangel", "Shore Up"]);
    assert_eq!(
        pick.possible_maindeck,
        vec!["Resolute Archangel", "Shore Up", "Tolarian Terror"],
        "nested deck-row lists must flatten in order"
    );
    assert_eq!(pick.probable_sideboard, vec!["Bog Badger"]);

    assert_eq!(draft.card_performance.len(), 2);
    // Pivoted rows come out sorted by card name.
    assert_eq!(draft.card_performance[0].name, "Resolute Archangel");
    assert_eq!(draft.card_performance[1].name, "Shore Up");
    assert_eq!(draft.card_performance[1].seen_count, 20);
    assert_eq!(draft.card_performance[1].avg_taken_at, Some(7.2));
}

#[tokio::test]
async fn incomplete_draft_streams_fail_with_the_observed_tag() {
    let transport = FakeTransport::new(|_, _| {
        Ok(ok_text(&framed(&json!({"type": "in_progress"}))))
    });

    let err = client(transport).get_draft("d4ce1").await.unwrap_err();

    assert!(
        matches!(err, SeventeenLandsError::Incomplete { ref status } if status == "in_progress"),
        "got: {err}"
    );
}

#[tokio::test]
async fn unframed_draft_bodies_are_rejected() {
    let transport = FakeTransport::new(|_, _| Ok(ok_text("{\"type\": \"complete\"}")));

    let err = client(transport).get_draft("d4ce1").await.unwrap_err();
    assert!(matches!(err, SeventeenLandsError::Shape(_)));
}

#[tokio::test]
async fn decks_flatten_into_two_fixed_sections() {
    let transport = FakeTransport::new(|_, _| {
        Ok(ok_json(&json!({
            "groups": [
                {"name": "Maindeck", "cards": [{"name": "Shore Up"}, {"name": "Plains"}]},
                {"name": "Sideboard", "cards": [{"name": "Bog Badger"}]}
            ],
            "event_info": {
                "expansion": "DMU",
                "format": "PremierDraft",
                "wins": 7,
                "losses": 1,
                "pool_link": "/pool/x",
                "deck_links": ["/deck/x/0"],
                "details_link": "/details/x",
                "draft_link": "/draft/x"
            },
            "builder_link": "https://sealeddeck.tech/x"
        })))
    });

    let (deck, metadata) = client(transport).get_deck("d4ce1", 0).await.unwrap();

    assert_eq!(deck.len(), 3);
    assert!(deck.iter().all(|row| matches!(
        row.section,
        DeckSection::Maindeck | DeckSection::Sideboard
    )));
    assert_eq!(deck[0].section, DeckSection::Maindeck);
    assert_eq!(deck[2].section, DeckSection::Sideboard);
    assert_eq!(deck[2].name, "Bog Badger");

    assert_eq!(metadata.event_type, "PremierDraft");
    assert_eq!(metadata.sealed_deck_tech_link, "https://sealeddeck.tech/x");
    assert_eq!((metadata.wins, metadata.losses), (7, 1));
}

#[tokio::test]
async fn unknown_deck_sections_are_rejected() {
    let transport = FakeTransport::new(|_, _| {
        Ok(ok_json(&json!({
            "groups": [{"name": "Tokens", "cards": [{"name": "Soldier"}]}],
            "event_info": {
                "expansion": "DMU",
                "format": "PremierDraft",
                "wins": 0,
                "losses": 0,
                "pool_link": "/pool/x",
                "deck_links": [],
                "details_link": "/details/x",
                "draft_link": "/draft/x"
            },
            "builder_link": "https://sealeddeck.tech/x"
        })))
    });

    let err = client(transport).get_deck("d4ce1", 0).await.unwrap_err();
    assert!(matches!(err, SeventeenLandsError::Shape(_)));
}

#[tokio::test]
async fn non_200_statuses_surface_as_errors() {
    let transport = FakeTransport::new(|_, _| {
        Ok(draftdata::session::TransportResponse {
            status: 429,
            cache_control: None,
            body: "slow down".to_string(),
        })
    });

    let err = client(transport).get_colors().await.unwrap_err();
    assert!(matches!(
        err,
        SeventeenLandsError::UnexpectedStatus { status: 429, .. }
    ));
}

#[tokio::test]
async fn aggregate_responses_are_replayed_from_cache() {
    let transport = FakeTransport::new(|_, _| Ok(ok_json(&json!(["W", "U"]))));
    let client = client(transport.clone());

    client.get_colors().await.unwrap();
    client.get_colors().await.unwrap();

    assert_eq!(transport.calls(), 1);
}
