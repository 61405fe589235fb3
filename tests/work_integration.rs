//! Integration tests for end-to-end work resolution.
//!
//! A single mock server plays the RDF endpoint, the REST API and the canvas
//! service, so documents can reference it through the repository prefixes.

use std::time::Duration;

use libros_core::{
    FetchSettings, HarvestConfig, Language, RepositoryConfig, RetryPolicy, WorkError, WorkResolver,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

// ==================== Helper Functions ====================

fn config_for(server: &MockServer) -> HarvestConfig {
    HarvestConfig {
        repository: RepositoryConfig::with_server_root(&server.uri()),
        fetch: FetchSettings {
            retry: RetryPolicy::fixed(2, Duration::from_millis(10)),
            total_timeout: Duration::from_secs(10),
            max_in_flight: None,
        },
        ..HarvestConfig::default()
    }
}

fn work_document(root: &str) -> String {
    format!(
        r#"
@prefix dcterms: <http://purl.org/dc/terms/> .
@prefix dc: <http://purl.org/dc/elements/1.1/> .
@prefix bibo: <http://purl.org/ontology/bibo/> .
@prefix dspace: <http://digital-repositories.org/ontologies/dspace/0.1.0#> .

<{root}/resource/handle/1969.1/92214>
    dcterms:title "Libro de horas" ;
    dcterms:alternative "Horae Beatae Mariae Virginis" ;
    dc:contributor "Vostre, Simon" ;
    dcterms:created "1507"^^xsd:dateTime ;
    dc:language "la" ;
    dc:publisher "Paris" ;
    bibo:uri <https://hdl.handle.net/1969.1/92214> , <https://oaktrust.library.tamu.edu/handle/1969.1/92214> ;
    dspace:hasBitstream <{root}/bitstream/1969.1/92214/2/page-002.jpf> ,
        <{root}/bitstream/1969.1/92214/1/page-001.jpf> ,
        <{root}/bitstream/1969.1/92214/9/libro.pdf> .
"#
    )
}

fn canvas(page: u32) -> serde_json::Value {
    json!({
        "@id": format!("https://iiif.example.org/canvas/{page}"),
        "images": [{"@id": format!("https://iiif.example.org/iiif/2/page-{page}")}]
    })
}

async fn mount_document(server: &MockServer, handle: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/rdf/handle/1969.1/{handle}")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/turtle; charset=utf-8")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

async fn mount_identity(server: &MockServer, handle: &str, uuid: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/handle/1969.1/{handle}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uuid": uuid})))
        .mount(server)
        .await;
}

async fn mount_item_metadata(server: &MockServer, uuid: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/items/{uuid}/metadata")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"key": "dc.subject", "language": "en", "value": "Books of hours"},
            {"key": "dc.subject.other", "language": "es", "value": "Libros de horas"},
            {"key": "dc.subject", "language": "fr", "value": "Livres d'heures"},
            {"key": "dc.description", "language": "en", "value": "Printed on vellum."},
            {"key": "dc.description", "language": null, "value": "untagged"},
            {"key": "dc.title", "language": "en", "value": "ignored"}
        ])))
        .mount(server)
        .await;
}

async fn mount_canvas(server: &MockServer, page: u32, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/iiif-service/dspace/canvas/1969.1/92214/{page}/page-00{page}.jpf"
        )))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_full_work(server: &MockServer) {
    mount_document(server, "92214", work_document(&server.uri())).await;
    mount_identity(server, "92214", "5a1c-77e0").await;
    mount_item_metadata(server, "5a1c-77e0").await;
    mount_canvas(server, 1, ResponseTemplate::new(200).set_body_json(canvas(1))).await;
    mount_canvas(server, 2, ResponseTemplate::new(200).set_body_json(canvas(2))).await;
}

// ==================== Resolution Tests ====================

#[tokio::test]
async fn test_resolve_handle_end_to_end() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_full_work(&server).await;

    let work = WorkResolver::new(config_for(&server))
        .resolve_handle("92214")
        .await
        .unwrap();

    assert_eq!(work.identity().handle, "92214");
    assert_eq!(work.identity().internal_id.as_deref(), Some("5a1c-77e0"));
    assert_eq!(work.labels().get(Language::En), ["Libro de horas"]);
    assert_eq!(work.homepage(), Some("https://hdl.handle.net/1969.1/92214"));
    assert_eq!(
        work.image_service_ids(),
        [
            "https://iiif.example.org/iiif/2/page-1",
            "https://iiif.example.org/iiif/2/page-2"
        ]
    );
    assert_eq!(
        work.rendering_ids(),
        [format!(
            "{}/iiif-service/dspace/canvas/1969.1/92214/9/libro.pdf",
            server.uri()
        )]
    );
    assert_eq!(work.page_coverage().requested, 2);
    assert!(work.page_coverage().is_complete());

    let metadata = serde_json::to_value(work.metadata()).unwrap();
    assert_eq!(
        metadata,
        json!({
            "Subjects": {"en": ["Books of hours"], "es": ["Libros de horas"]},
            "Description": {"en": ["Printed on vellum."], "es": []},
            "Alternative Titles": ["Horae Beatae Mariae Virginis"],
            "Contributors": ["Vostre, Simon"],
            "Created date": ["1507"],
            "Language": ["la"],
            "Publisher": ["Paris"]
        })
    );
}

#[tokio::test]
async fn test_resolve_uri_uses_last_segment_as_handle() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_full_work(&server).await;

    let uri = format!("{}/rdf/handle/1969.1/92214", server.uri());
    let work = WorkResolver::new(config_for(&server))
        .resolve_uri(&uri)
        .await
        .unwrap();
    assert_eq!(work.identity().handle, "92214");
    assert!(work.identity().internal_id.is_some());
}

#[tokio::test]
async fn test_spawn_resolve_returns_work() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_full_work(&server).await;

    let handle = WorkResolver::new(config_for(&server)).spawn_resolve("92214".to_string());
    let work = handle.await.unwrap().unwrap();
    assert_eq!(work.image_service_ids().len(), 2);
}

#[tokio::test]
async fn test_identity_network_error_degrades_metadata() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_full_work(&server).await;

    let mut config = config_for(&server);
    // Nothing listens on port 9, so the handle lookup fails to connect.
    config.repository.rest_base = "http://127.0.0.1:9/rest".to_string();

    let work = WorkResolver::new(config).resolve_handle("92214").await.unwrap();
    assert_eq!(work.identity().internal_id, None);

    let metadata = serde_json::to_value(work.metadata()).unwrap();
    assert_eq!(metadata["Subjects"], json!({"en": [], "es": []}));
    assert_eq!(metadata["Description"], json!({"en": [], "es": []}));
    assert_eq!(metadata["Contributors"], json!(["Vostre, Simon"]));
    assert_eq!(work.image_service_ids().len(), 2);
}

#[tokio::test]
async fn test_missing_page_is_reported_in_coverage() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_document(&server, "92214", work_document(&server.uri())).await;
    mount_identity(&server, "92214", "5a1c-77e0").await;
    mount_item_metadata(&server, "5a1c-77e0").await;
    mount_canvas(&server, 1, ResponseTemplate::new(200).set_body_json(canvas(1))).await;
    mount_canvas(&server, 2, ResponseTemplate::new(404)).await;

    let work = WorkResolver::new(config_for(&server))
        .resolve_handle("92214")
        .await
        .unwrap();

    assert_eq!(
        work.image_service_ids(),
        ["https://iiif.example.org/iiif/2/page-1"]
    );
    assert_eq!(work.page_coverage().requested, 2);
    assert_eq!(work.page_coverage().resolved, 1);
    assert_eq!(work.page_coverage().missing(), 1);
}

#[tokio::test]
async fn test_canvas_without_images_is_dropped() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_document(&server, "92214", work_document(&server.uri())).await;
    mount_identity(&server, "92214", "5a1c-77e0").await;
    mount_item_metadata(&server, "5a1c-77e0").await;
    mount_canvas(&server, 1, ResponseTemplate::new(200).set_body_json(json!({"images": []}))).await;
    mount_canvas(&server, 2, ResponseTemplate::new(200).set_body_json(canvas(2))).await;

    let work = WorkResolver::new(config_for(&server))
        .resolve_handle("92214")
        .await
        .unwrap();
    assert_eq!(
        work.image_service_ids(),
        ["https://iiif.example.org/iiif/2/page-2"]
    );
    assert_eq!(work.page_coverage().resolved, 1);
}

#[tokio::test]
async fn test_turtle_served_as_text_plain_resolves() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/rdf/handle/1969.1/5"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain; charset=utf-8")
                .set_body_string(
                    "@prefix dcterms: <http://purl.org/dc/terms/> .\n<urn:w> dcterms:title \"T\" .\n",
                ),
        )
        .mount(&server)
        .await;
    mount_identity(&server, "5", "uuid-5").await;

    let work = WorkResolver::new(config_for(&server))
        .resolve_handle("5")
        .await
        .unwrap();
    assert_eq!(work.labels().get(Language::En), ["T"]);
    assert_eq!(work.page_coverage().requested, 0);
}

// ==================== Fatal Error Tests ====================

#[tokio::test]
async fn test_unparseable_document_is_fatal() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_document(&server, "1", "<urn:a> <urn:b> \"unterminated .".to_string()).await;
    mount_identity(&server, "1", "uuid-1").await;

    let error = WorkResolver::new(config_for(&server))
        .resolve_handle("1")
        .await
        .unwrap_err();
    assert!(matches!(error, WorkError::Graph { ref handle, .. } if handle == "1"));
}

#[tokio::test]
async fn test_document_without_title_is_fatal() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_document(
        &server,
        "2",
        "<urn:work> <http://purl.org/dc/elements/1.1/publisher> \"Paris\" .\n".to_string(),
    )
    .await;
    mount_identity(&server, "2", "uuid-2").await;

    let error = WorkResolver::new(config_for(&server))
        .resolve_handle("2")
        .await
        .unwrap_err();
    assert!(matches!(error, WorkError::MissingLabels { .. }));
}

#[tokio::test]
async fn test_document_status_is_fatal() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/rdf/handle/1969.1/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let error = WorkResolver::new(config_for(&server))
        .resolve_handle("3")
        .await
        .unwrap_err();
    assert!(matches!(error, WorkError::DocumentStatus { status: 500, .. }));
}
