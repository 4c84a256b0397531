//! Export a plan from a mocked org and import it into another.

use busbar_sf_rest::SalesforceRestClient;
use busbar_sf_tree::{ExportConfig, ImportConfig, TreeExporter, TreeImporter};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn source_org() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services/data/v62.0/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalSize": 1,
            "done": true,
            "records": [{
                "attributes": {"type": "Account", "url": "/services/data/v62.0/sobjects/Account/001A"},
                "Id": "001A",
                "Name": "Acme",
                "Contacts": {
                    "totalSize": 2,
                    "done": true,
                    "records": [
                        {
                            "attributes": {"type": "Contact", "url": "/services/data/v62.0/sobjects/Contact/003A"},
                            "Id": "003A",
                            "LastName": "Smith",
                            "AccountId": "001A"
                        },
                        {
                            "attributes": {"type": "Contact", "url": "/services/data/v62.0/sobjects/Contact/003B"},
                            "Id": "003B",
                            "LastName": "Jones",
                            "AccountId": "001A"
                        }
                    ]
                }
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/services/data/v62.0/sobjects/Account/describe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Account",
            "fields": [
                {"name": "Id", "type": "id"},
                {"name": "Name", "type": "string"}
            ],
            "childRelationships": [
                {"childSObject": "Contact", "field": "AccountId", "relationshipName": "Contacts"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/services/data/v62.0/sobjects/Contact/describe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Contact",
            "fields": [
                {"name": "Id", "type": "id"},
                {"name": "LastName", "type": "string"},
                {"name": "AccountId", "type": "reference", "referenceTo": ["Account"]}
            ],
            "childRelationships": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_plan_export_then_import() {
    let dir = tempfile::tempdir().unwrap();

    let source = source_org().await;
    let client = SalesforceRestClient::new(source.uri(), "source-token").unwrap();
    let mut exporter = TreeExporter::new(client);

    let export = exporter
        .export(
            &ExportConfig::new(
                "SELECT Id, Name, (SELECT Id, LastName, AccountId FROM Contacts) FROM Account",
            )
            .with_plan(true)
            .with_output_dir(dir.path()),
        )
        .await
        .expect("export should succeed");

    assert_eq!(export.files.len(), 3);
    let contacts: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&export.files[1]).unwrap()).unwrap();
    assert_eq!(contacts["records"][0]["AccountId"], "@AccountRef1");
    assert_eq!(contacts["records"][1]["AccountId"], "@AccountRef1");
    assert!(contacts["records"][0].get("Id").is_none());

    let target = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/services/data/v62.0/composite/tree/Account"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "hasErrors": false,
            "results": [{"referenceId": "AccountRef1", "id": "001NEW"}]
        })))
        .expect(1)
        .mount(&target)
        .await;

    Mock::given(method("POST"))
        .and(path("/services/data/v62.0/composite/tree/Contact"))
        .and(body_string_contains("001NEW"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "hasErrors": false,
            "results": [
                {"referenceId": "ContactRef1", "id": "003NEW1"},
                {"referenceId": "ContactRef2", "id": "003NEW2"}
            ]
        })))
        .expect(1)
        .mount(&target)
        .await;

    let importer =
        TreeImporter::new(SalesforceRestClient::new(target.uri(), "target-token").unwrap());
    let manifest = export.files.last().unwrap();
    let result = importer
        .import(&ImportConfig::plan(manifest))
        .await
        .expect("import should succeed");

    let ids: Vec<&str> = result.response_refs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["001NEW", "003NEW1", "003NEW2"]);
    assert_eq!(result.sobject_types["ContactRef2"], "Contact");
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_import_surfaces_tree_errors() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Accounts.json");
    std::fs::write(
        &file,
        json!({"records": [{"attributes": {"type": "Account", "referenceId": "AccountRef1"}}]})
            .to_string(),
    )
    .unwrap();

    let target = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/data/v62.0/composite/tree/Account"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "hasErrors": true,
            "results": [{
                "referenceId": "AccountRef1",
                "errors": [{
                    "statusCode": "REQUIRED_FIELD_MISSING",
                    "message": "Required fields are missing: [Name]",
                    "fields": ["Name"]
                }]
            }]
        })))
        .mount(&target)
        .await;

    let importer =
        TreeImporter::new(SalesforceRestClient::new(target.uri(), "target-token").unwrap());
    let err = importer
        .import(&ImportConfig::files([file]))
        .await
        .unwrap_err();

    assert!(matches!(
        err.kind,
        busbar_sf_tree::ErrorKind::TreeImport { ref errors, .. }
            if errors == &vec!["AccountRef1: REQUIRED_FIELD_MISSING: Required fields are missing: [Name] [Name]".to_string()]
    ));
}
