mod common;

use marine_ingest::models::{IngestRecord, ObservationValue};
use marine_ingest::{
    Credentials, ErrorCategory, InMemoryRecordRepository, IngestDispatcher, Payload, Provenance,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn payload(value: serde_json::Value) -> Payload {
    Payload::from_value(value).unwrap()
}

#[tokio::test]
async fn test_open_meteo_records_carry_request_coordinates() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .and(path("/v1/marine"))
        .and(query_param("latitude", "20.59"))
        .and(query_param("longitude", "78.96"))
        .and(query_param("hourly", "wave_height,sea_surface_temperature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "latitude": 20.5,
            "longitude": 79.0,
            "hourly": {
                "time": ["2025-01-01T00:00", "2025-01-01T01:00"],
                "wave_height": [0.8, null],
                "sea_surface_temperature": [28.1, 28.3]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = dispatcher
        .ingest(
            "open-meteo",
            payload(json!({
                "latitude": 20.59,
                "longitude": 78.96,
                "hourly": ["wave_height", "sea_surface_temperature"]
            })),
        )
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 3);
    for record in &outcome.records {
        let IngestRecord::Observation(observation) = record else {
            panic!("expected observation, got {record:?}");
        };
        assert_eq!(observation.latitude, Some(20.59));
        assert_eq!(observation.longitude, Some(78.96));
        assert!(!matches!(observation.value, ObservationValue::Null));
        assert_eq!(observation.source(), "open-meteo");
    }
}

#[tokio::test]
async fn test_open_meteo_requires_coordinates() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = dispatcher
        .ingest("open-meteo", payload(json!({"latitude": 10.0})))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_noaa_rejects_bad_payload_before_any_call() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let missing_station = dispatcher
        .ingest("noaa", payload(json!({"product": "water_temperature"})))
        .await
        .unwrap_err();
    assert_eq!(missing_station.category(), ErrorCategory::Client);
    assert_eq!(
        missing_station.detail(),
        "Ingestion failed: Invalid input: Missing 'station' in payload"
    );

    let bogus_product = dispatcher
        .ingest("noaa", payload(json!({"station": "8723214", "product": "bogus"})))
        .await
        .unwrap_err();
    assert_eq!(bogus_product.status_code(), 400);
    assert!(bogus_product.detail().contains("bogus"));
    assert!(dispatcher.records().await.is_empty());
}

#[tokio::test]
async fn test_noaa_looks_up_station_coordinates() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .and(path("/api/prod/datagetter"))
        .and(query_param("station", "8723214"))
        .and(query_param("product", "water_temperature"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"t": "2025-01-01 00:00", "v": "24.1", "f": "0,0,0"},
                {"t": "2025-01-01 00:06", "v": "24.2", "f": "0,0,0"}
            ]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/mdapi/stations/8723214/metadata.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stations": [{"id": "8723214", "lat": 25.7317, "lng": -80.1617}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = dispatcher
        .ingest("noaa", payload(json!({"station": "8723214"})))
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 2);
    let IngestRecord::Observation(first) = &outcome.records[0] else {
        panic!("expected observation");
    };
    assert_eq!(first.latitude, Some(25.7317));
    assert_eq!(first.longitude, Some(-80.1617));
    assert_eq!(first.station.as_deref(), Some("8723214"));
    assert_eq!(first.value, ObservationValue::Number(24.1));
    assert_eq!(first.source, "NOAA");
}

#[tokio::test]
async fn test_noaa_metadata_failure_is_not_fatal() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .and(path("/api/prod/datagetter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"t": "2025-01-01 00:00", "v": "1.5"}]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/mdapi/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let outcome = dispatcher
        .ingest("noaa", payload(json!({"station": "9414290", "product": "water_level"})))
        .await
        .unwrap();
    let IngestRecord::Observation(record) = &outcome.records[0] else {
        panic!("expected observation");
    };
    assert_eq!(record.latitude, None);
    assert_eq!(record.parameter, "water_level");
}

#[tokio::test]
async fn test_noaa_empty_data_is_not_found() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .and(path("/api/prod/datagetter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"message": "No data was found."}
        })))
        .mount(&mock_server)
        .await;

    let err = dispatcher
        .ingest("noaa", payload(json!({"station": "8723214"})))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(err.detail(), "Ingestion failed: Not found: No data found from NOAA");
}

#[tokio::test]
async fn test_obis_occurrences() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .and(path("/v3/occurrence"))
        .and(query_param("scientificname", "Sardinella longiceps"))
        .and(query_param("size", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "results": [
                {
                    "decimalLatitude": 9.9,
                    "decimalLongitude": 76.2,
                    "scientificName": "Sardinella longiceps",
                    "family": "Clupeidae",
                    "depth": 12
                },
                {
                    "decimalLatitude": "10.1",
                    "scientificName": "Sardinella longiceps",
                    "eventDate": "2019-03-01"
                }
            ]
        })))
        .mount(&mock_server)
        .await;

    let outcome = dispatcher
        .ingest(
            "obis",
            payload(json!({"params": {"scientificname": "Sardinella longiceps", "size": 2}})),
        )
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 2);
    let IngestRecord::Occurrence(second) = &outcome.records[1] else {
        panic!("expected occurrence");
    };
    assert_eq!(second.latitude, Some(10.1));
    assert_eq!(second.longitude, None);
    assert_eq!(second.event_date.as_deref(), Some("2019-03-01"));
    assert_eq!(second.source, "obis/occurrence");
}

#[tokio::test]
async fn test_worms_bare_integer_response() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .and(path_regex(r"^/rest/AphiaIDByName/Sardinella"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(42)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = dispatcher
        .ingest(
            "worms",
            payload(json!({
                "endpoint": "AphiaIDByName",
                "params": {"scientificname": "Sardinella longiceps"}
            })),
        )
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    let IngestRecord::Taxon(taxon) = &outcome.records[0] else {
        panic!("expected taxon");
    };
    assert_eq!(taxon.aphia_id, Some(42));
    assert!(taxon.scientific_name.is_none());
    assert!(taxon.rank.is_none());
    assert_eq!(taxon.source, "worms/AphiaIDByName");
}

#[tokio::test]
async fn test_worms_list_is_truncated_to_limit() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .and(path("/rest/AphiaRecordsByName/Sardinella"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"AphiaID": 126421, "scientificname": "Sardinella", "rank": "Genus"},
            {"AphiaID": 217423, "scientificname": "Sardinella longiceps", "rank": "Species"},
            {"AphiaID": 217424, "scientificname": "Sardinella gibbosa", "rank": "Species"}
        ])))
        .mount(&mock_server)
        .await;

    let outcome = dispatcher
        .ingest(
            "worms",
            payload(json!({"params": {"scientificname": "Sardinella"}, "limit": 2})),
        )
        .await
        .unwrap();
    assert_eq!(outcome.records.len(), 2);
}

#[tokio::test]
async fn test_worms_requires_name_or_id() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    let err = dispatcher
        .ingest("worms", payload(json!({"params": {}})))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_bold_mapping_response_injects_ids() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .and(path("/bold/specimen"))
        .and(query_param("taxon", "Sardinella"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ABC123": {
                "processid": "FISH001-10",
                "species_name": "Sardinella longiceps",
                "lat": 9.9,
                "lon": "76.2"
            },
            "ABC124": {"processid": "FISH002-10", "species_name": "Sardinella gibbosa"},
            "meta": "not a specimen"
        })))
        .mount(&mock_server)
        .await;

    let outcome = dispatcher
        .ingest(
            "bold",
            payload(json!({"params": {"taxon": "Sardinella", "format": "json", "limit": 5}})),
        )
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 2);
    let ids: Vec<String> = outcome
        .records
        .iter()
        .filter_map(|record| match record {
            IngestRecord::Barcode(barcode) => barcode.id.clone(),
            _ => None,
        })
        .collect();
    assert_eq!(ids, vec!["ABC123", "ABC124"]);
}

#[tokio::test]
async fn test_bold_limit_keeps_upstream_order() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .and(path("/bold/specimen"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{
                "ZZZ9": {"processid": "FIRST"},
                "MMM5": {"processid": "SECOND"},
                "AAA1": {"processid": "THIRD"}
            }"#,
            "application/json",
        ))
        .mount(&mock_server)
        .await;

    let outcome = dispatcher
        .ingest("bold", payload(json!({"params": {"limit": 2}})))
        .await
        .unwrap();

    let kept: Vec<(Option<String>, Option<String>)> = outcome
        .records
        .iter()
        .filter_map(|record| match record {
            IngestRecord::Barcode(barcode) => {
                Some((barcode.id.clone(), barcode.processid.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        kept,
        vec![
            (Some("ZZZ9".to_string()), Some("FIRST".to_string())),
            (Some("MMM5".to_string()), Some("SECOND".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_fisheries_paginates_until_empty_page() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .and(path("/resource/fisheries"))
        .and(query_param("api-key", "test-key"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [
                {
                    "financial_year": "2018-19",
                    "total_fish_production_lakh_tonnes": "135.73",
                    "marine_fish_production_lakh_tonnes": "38.53",
                    "inland_fish_production_lakh_tonnes": "97.20",
                    "total_exports_crores": "46589.37"
                },
                {"financial_year": "2019-20", "total_fish_production_lakh_tonnes": "NA"},
                {"financial_year": "2019-20 (revised)", "total_exports_crores": 46662.85}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resource/fisheries"))
        .and(query_param("offset", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"financial_year": "2020-21", "total_fish_production_lakh_tonnes": 147.25}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resource/fisheries"))
        .and(query_param("offset", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = dispatcher.ingest("fisheries", Payload::new()).await.unwrap();

    let years: Vec<&str> = outcome
        .records
        .iter()
        .filter_map(|record| match record {
            IngestRecord::Statistic(stat) => Some(stat.year.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(years, vec!["2018-19", "2019-20 (revised)", "2020-21"]);
    assert_eq!(dispatcher.records().await.len(), 3);
}

#[tokio::test]
async fn test_fisheries_page_ceiling() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let mut config = common::mock_config(&mock_server.uri(), workdir.path());
    config.providers.fisheries_max_pages = 3;
    let dispatcher = common::dispatcher(&config);

    Mock::given(method("GET"))
        .and(path("/resource/fisheries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"financial_year": "2020-21"}]
        })))
        .expect(4)
        .mount(&mock_server)
        .await;

    let err = dispatcher.ingest("fisheries", Payload::new()).await.unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert_eq!(
        err.detail(),
        "Ingestion failed: Resource exhausted: fisheries pages - 4/3"
    );
    assert!(dispatcher.records().await.is_empty());
}

#[tokio::test]
async fn test_fisheries_exactly_at_page_ceiling() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let mut config = common::mock_config(&mock_server.uri(), workdir.path());
    config.providers.fisheries_max_pages = 2;
    let dispatcher = common::dispatcher(&config);

    for (offset, year) in [("0", "2021-22"), ("100", "2022-23")] {
        Mock::given(method("GET"))
            .and(path("/resource/fisheries"))
            .and(query_param("offset", offset))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [{"financial_year": year}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/resource/fisheries"))
        .and(query_param("offset", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = dispatcher.ingest("fisheries", Payload::new()).await.unwrap();
    assert_eq!(outcome.records.len(), 2);
}

#[tokio::test]
async fn test_upstream_auth_failure_propagates() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .and(path("/resource/fisheries"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Invalid API key"))
        .mount(&mock_server)
        .await;

    let err = dispatcher.ingest("fisheries", Payload::new()).await.unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert!(err.detail().starts_with("Ingestion failed: HTTP 403"));
}

#[tokio::test]
async fn test_fisheries_without_key_sends_empty_key() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let config = common::mock_config(&mock_server.uri(), workdir.path());
    let dispatcher = IngestDispatcher::from_config(
        &config,
        Credentials::default(),
        Arc::new(InMemoryRecordRepository::new()),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/resource/fisheries"))
        .and(query_param("api-key", ""))
        .respond_with(ResponseTemplate::new(403).set_body_string("Key not authorised"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = dispatcher.ingest("fisheries", Payload::new()).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Server);
    assert!(err.detail().starts_with("Ingestion failed: HTTP 403"));
    assert!(dispatcher.records().await.is_empty());
}

#[tokio::test]
async fn test_csv_over_http() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .and(path("/exports/landings.csv"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("state,tonnes\nKerala,580000\nGujarat,690000\n"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/exports/landings.csv", mock_server.uri());
    let outcome = dispatcher
        .ingest("csv", payload(json!({"url": url, "limit": 1})))
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    let IngestRecord::Tabular(row) = &outcome.records[0] else {
        panic!("expected tabular record");
    };
    assert_eq!(row.row["state"], "Kerala");
    assert_eq!(row.source, format!("csv/{url}"));
}

#[tokio::test]
async fn test_successive_ingestions_accumulate() {
    let mock_server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let dispatcher = common::dispatcher(&common::mock_config(&mock_server.uri(), workdir.path()));

    Mock::given(method("GET"))
        .and(path("/rest/AphiaIDByName/Thunnus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(126999)))
        .mount(&mock_server)
        .await;

    let request = json!({"endpoint": "AphiaIDByName", "params": {"scientificname": "Thunnus"}});
    let first = dispatcher.ingest("worms", payload(request.clone())).await.unwrap();
    let second = dispatcher.ingest("worms", payload(request)).await.unwrap();
    let failed = dispatcher.ingest("unknown", Payload::new()).await;

    assert!(failed.is_err());
    assert_eq!(
        dispatcher.records().await.len(),
        first.records.len() + second.records.len()
    );
}
