use crate::fixtures::test_app::TestApp;
use serde_json::Value;
use wiremock::matchers::{method, path, query_param_is_missing};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn search_requires_a_query() {
    let app = TestApp::spawn().await;
    app.sign_in().await;

    let resp = app
        .client
        .get(app.url("/api/search"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = app
        .client
        .get(app.url("/api/search?query="))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn search_returns_matches_with_a_total() {
    let app = TestApp::spawn().await;
    app.sign_in().await;

    // Unlike the listing endpoint, the plain search is unpaginated.
    Mock::given(method("GET"))
        .and(path("/me/drive/root/search(q='report')"))
        .and(query_param_is_missing("$top"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [
                {
                    "id": "file-7",
                    "name": "report.pdf",
                    "size": 4096,
                    "file": { "mimeType": "application/pdf" },
                    "@microsoft.graph.downloadUrl": "https://content.example/file-7"
                },
                {
                    "id": "dir-2",
                    "name": "reports",
                    "folder": { "childCount": 2 }
                }
            ]
        })))
        .expect(1)
        .mount(&app.remote)
        .await;

    let resp = app
        .client
        .get(app.url("/api/search?query=report"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["files"][0]["name"], "report.pdf");
    assert_eq!(json["files"][1]["isFolder"], true);
}

#[tokio::test]
async fn search_without_session_is_unauthorized() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .get(app.url("/api/search?query=report"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 401);
}
