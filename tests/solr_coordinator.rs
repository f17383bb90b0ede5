mod common;

use axum::Router;
use axum::body::Bytes;
use axum::http::{Method, StatusCode, Uri};
use common::test_client;
use solr_deployer::DeployerError;
use solr_deployer::coordinator::{
    AdminFile, CollectionSpec, Coordinator, RequestBody, SolrCoordinator,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use url::Url;

type Responder = Arc<dyn Fn(&str, &HashMap<String, String>) -> (u16, String) + Send + Sync>;

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    params: HashMap<String, String>,
    body: Vec<u8>,
}

struct FakeSolr {
    coordinator: SolrCoordinator,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeSolr {
    async fn serve<F>(respond: F) -> Self
    where
        F: Fn(&str, &HashMap<String, String>) -> (u16, String) + Send + Sync + 'static,
    {
        let respond: Responder = Arc::new(respond);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handler = {
            let requests = requests.clone();
            move |method: Method, uri: Uri, body: Bytes| {
                let requests = requests.clone();
                let respond = respond.clone();
                async move {
                    let params: HashMap<String, String> =
                        url::form_urlencoded::parse(uri.query().unwrap_or("").as_bytes())
                            .into_owned()
                            .collect();
                    let (status, reply) = respond(uri.path(), &params);
                    requests.lock().unwrap().push(Recorded {
                        method,
                        path: uri.path().to_string(),
                        params,
                        body: body.to_vec(),
                    });
                    (StatusCode::from_u16(status).unwrap(), reply)
                }
            }
        };
        let app = Router::new().fallback(handler);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base = Url::parse(&format!("http://{addr}/solr")).unwrap();
        Self {
            coordinator: SolrCoordinator::new(test_client(), base),
            requests,
        }
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

const OK: &str = r#"{"responseHeader":{"status":0,"QTime":1}}"#;

#[tokio::test]
async fn collection_names_are_listed() {
    let solr = FakeSolr::serve(|_, _| {
        (
            200,
            r#"{"responseHeader":{"status":0},"collections":["products",".system"]}"#.to_string(),
        )
    })
    .await;

    let names = solr
        .coordinator
        .list_collections(&CancellationToken::new())
        .await
        .unwrap();

    assert!(names.contains("products"));
    assert!(names.contains(".system"));
    let request = &solr.requests()[0];
    assert_eq!(request.path, "/solr/admin/collections");
    assert_eq!(request.params["action"], "LIST");
    assert_eq!(request.params["wt"], "json");
}

#[tokio::test]
async fn create_passes_shards_replicas_and_config() {
    let solr = FakeSolr::serve(|_, _| (200, OK.to_string())).await;
    let spec = CollectionSpec {
        name: "products".to_string(),
        config_name: Some("com.acme:conf:1.0".to_string()),
        num_shards: 2,
        num_replicas: 3,
    };

    solr.coordinator
        .create_collection(&spec, &CancellationToken::new())
        .await
        .unwrap();

    let params = &solr.requests()[0].params;
    assert_eq!(params["action"], "CREATE");
    assert_eq!(params["name"], "products");
    assert_eq!(params["numShards"], "2");
    assert_eq!(params["replicationFactor"], "3");
    assert_eq!(params["collection.configName"], "com.acme:conf:1.0");
}

#[tokio::test]
async fn link_and_reload_use_the_collections_api() {
    let solr = FakeSolr::serve(|_, _| (200, OK.to_string())).await;
    let cancel = CancellationToken::new();

    solr.coordinator
        .link_config_set("products", "com.acme:conf:1.1", &cancel)
        .await
        .unwrap();
    solr.coordinator
        .reload_collection("products", &cancel)
        .await
        .unwrap();

    let requests = solr.requests();
    assert_eq!(requests[0].params["action"], "MODIFYCOLLECTION");
    assert_eq!(requests[0].params["collection"], "products");
    assert_eq!(requests[0].params["collection.configName"], "com.acme:conf:1.1");
    assert_eq!(requests[1].params["action"], "RELOAD");
    assert_eq!(requests[1].params["name"], "products");
}

#[tokio::test]
async fn error_status_carries_coordinator_message() {
    let solr = FakeSolr::serve(|_, _| {
        (
            500,
            r#"{"responseHeader":{"status":500},"error":{"msg":"Could not load conf","code":500}}"#
                .to_string(),
        )
    })
    .await;

    let err = solr
        .coordinator
        .reload_collection("products", &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        DeployerError::RequestFailed { status, reason, .. } => {
            assert_eq!(status, Some(500));
            assert_eq!(reason, "Could not load conf");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unknown_collection_status_has_no_entry() {
    let solr = FakeSolr::serve(|_, _| {
        (
            400,
            r#"{"responseHeader":{"status":400},"error":{"msg":"Collection: products not found","code":400}}"#
                .to_string(),
        )
    })
    .await;

    let status = solr
        .coordinator
        .cluster_status(Some("products"), &CancellationToken::new())
        .await
        .unwrap();

    assert!(status.success);
    assert!(status.collections.is_empty());
}

#[tokio::test]
async fn admin_file_not_found_is_distinguished() {
    let solr = FakeSolr::serve(|path, params| {
        if path == "/solr/products/admin/file" && params["file"] == "runtimelibs.txt" {
            (200, "com.acme:lib:1.0\n".to_string())
        } else {
            (404, String::new())
        }
    })
    .await;
    let cancel = CancellationToken::new();

    let found = solr
        .coordinator
        .read_admin_file("products", "runtimelibs.txt", &cancel)
        .await
        .unwrap();
    assert_eq!(found, AdminFile::Found("com.acme:lib:1.0\n".into()));

    let missing = solr
        .coordinator
        .read_admin_file("products", "other.txt", &cancel)
        .await
        .unwrap();
    assert_eq!(missing, AdminFile::NotFound);
}

#[tokio::test]
async fn blob_query_asks_for_descending_versions() {
    let solr = FakeSolr::serve(|_, _| {
        (
            200,
            r#"{"responseHeader":{"status":0},"response":{"numFound":2,"docs":[
                {"blobName":"com.acme_lib_1.0","version":1},
                {"blobName":"com.acme_lib_1.0","version":2}]}}"#
                .to_string(),
        )
    })
    .await;

    let records = solr
        .coordinator
        .query_blob_store(".system", "com.acme_lib_1.0", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(records[0].version, 2);
    let request = &solr.requests()[0];
    assert_eq!(request.path, "/solr/.system/select");
    assert_eq!(request.params["q"], "blobName:\"com.acme_lib_1.0\"");
    assert_eq!(request.params["sort"], "version desc");
}

#[tokio::test]
async fn rejected_runtime_lib_command_fails() {
    let solr = FakeSolr::serve(|_, _| {
        (
            200,
            r#"{"responseHeader":{"status":0},"errorMessages":[{"add-runtimelib":{"name":"com.acme_lib_1.0","version":1},"errorMessages":["already exists"]}]}"#
                .to_string(),
        )
    })
    .await;

    let err = solr
        .coordinator
        .post_request(
            "products",
            "/config",
            RequestBody::Json(serde_json::json!({"add-runtimelib": {"name": "com.acme_lib_1.0", "version": 1}})),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DeployerError::RequestFailed { ref reason, .. } if reason == "already exists"));
    let request = &solr.requests()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/solr/products/config");
}

#[tokio::test]
async fn blob_upload_posts_file_content() {
    let solr = FakeSolr::serve(|_, _| (200, OK.to_string())).await;
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib-1.0.jar");
    std::fs::write(&jar, b"jar bytes").unwrap();

    solr.coordinator
        .post_request(
            ".system",
            "/blob/com.acme_lib_1.0",
            RequestBody::File(jar),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let request = &solr.requests()[0];
    assert_eq!(request.path, "/solr/.system/blob/com.acme_lib_1.0");
    assert_eq!(request.body, b"jar bytes");
}

#[tokio::test]
async fn large_blob_upload_arrives_intact() {
    let solr = FakeSolr::serve(|_, _| (200, OK.to_string())).await;
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("big-1.0.jar");
    let content: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
    std::fs::write(&jar, &content).unwrap();

    solr.coordinator
        .post_request(
            ".system",
            "/blob/com.acme_big_1.0",
            RequestBody::File(jar),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(solr.requests()[0].body, content);
}

#[tokio::test]
async fn missing_upload_file_fails_without_a_request() {
    let solr = FakeSolr::serve(|_, _| (200, OK.to_string())).await;
    let dir = tempfile::tempdir().unwrap();

    let err = solr
        .coordinator
        .post_request(
            ".system",
            "/blob/com.acme_lib_1.0",
            RequestBody::File(dir.path().join("absent.jar")),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DeployerError::Fs { .. }));
    assert!(solr.requests().is_empty());
}

#[tokio::test]
async fn config_upload_sends_zipped_directory() {
    let solr = FakeSolr::serve(|_, _| (200, OK.to_string())).await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("solrconfig.xml"), b"<config/>").unwrap();

    solr.coordinator
        .upload_config_set("com.acme:conf:1.0", dir.path(), true, &CancellationToken::new())
        .await
        .unwrap();

    let request = &solr.requests()[0];
    assert_eq!(request.path, "/solr/admin/configs");
    assert_eq!(request.params["action"], "UPLOAD");
    assert_eq!(request.params["name"], "com.acme:conf:1.0");
    assert_eq!(request.params["overwrite"], "true");

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(request.body.clone())).unwrap();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive.by_index(0).unwrap().name(), "solrconfig.xml");
}

#[tokio::test]
async fn cancelled_token_skips_the_request() {
    let solr = FakeSolr::serve(|_, _| (200, OK.to_string())).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = solr
        .coordinator
        .reload_collection("products", &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(solr.requests().is_empty());
}
