use assert_cmd::Command;
use mixcloud_test_utils::{Fixtures, ResourceBuilder};
use predicates::prelude::*;
use serde_json::{json, Value};
use std::error::Error;
use std::fs;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Fields drop in order: the server goes before the runtime it was started on.
struct Api {
    server: MockServer,
    runtime: tokio::runtime::Runtime,
}

impl Api {
    fn start() -> Self {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    fn uri(&self) -> String {
        self.server.uri()
    }
}

fn mixcloud() -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("mixcloud")?;
    cmd.env_remove("MIXCLOUD_ACCESS_TOKEN")
        .env_remove("MIXCLOUD_API_ROOT")
        .env_remove("MIXCLOUD_RAISE_EXCEPTIONS")
        .env_remove("RUST_LOG");
    Ok(cmd)
}

fn stdout_json(cmd: &mut Command) -> Result<Value, Box<dyn Error>> {
    let output = cmd.assert().success().get_output().stdout.clone();
    Ok(serde_json::from_slice(&output)?)
}

#[test]
fn help_lists_subcommands() -> Result<(), Box<dyn Error>> {
    mixcloud()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("discover"))
        .stdout(predicate::str::contains("authorize-url"));
    Ok(())
}

#[test]
fn get_prints_the_resource() -> Result<(), Box<dyn Error>> {
    let api = Api::start();
    api.mount(
        Mock::given(method("GET"))
            .and(path("/bob/"))
            .and(query_param("metadata", "1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(Fixtures::full_user("bob", &api.uri())),
            ),
    );

    let value = stdout_json(mixcloud()?.args(["--api-root", &api.uri(), "get", "/bob/"]))?;
    assert_eq!(value["key"], "/bob/");
    assert_eq!(value["follower_count"], 42);
    Ok(())
}

#[test]
fn config_file_supplies_api_root() -> Result<(), Box<dyn Error>> {
    let api = Api::start();
    api.mount(
        Mock::given(method("GET"))
            .and(path("/discover/house"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(ResourceBuilder::tag("house").build()),
            ),
    );

    let dir = tempfile::tempdir()?;
    let config = dir.path().join("mixcloud.toml");
    fs::write(&config, format!("[client]\napi_root = \"{}\"\n", api.uri()))?;

    let value = stdout_json(mixcloud()?.args([
        "--config",
        config.to_str().unwrap(),
        "discover",
        "house",
    ]))?;
    assert_eq!(value["type"], "tag");
    Ok(())
}

#[test]
fn search_passes_type_and_pagination() -> Result<(), Box<dyn Error>> {
    let api = Api::start();
    api.mount(
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "jazz"))
            .and(query_param("type", "tag"))
            .and(query_param("offset", "10"))
            .and(query_param("limit", "5"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(Fixtures::user_page("t", 2, None)),
            ),
    );

    let value = stdout_json(mixcloud()?.args([
        "--api-root",
        &api.uri(),
        "search",
        "jazz",
        "--type",
        "tag",
        "--page",
        "2",
        "--per-page",
        "5",
    ]))?;
    assert_eq!(value["data"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn connection_names_accept_hyphens() -> Result<(), Box<dyn Error>> {
    let api = Api::start();
    let listen_later = format!("{}/bob/listen-later/", api.uri());
    api.mount(
        Mock::given(method("GET"))
            .and(path("/bob/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                ResourceBuilder::user("bob")
                    .connection("listen-later", &listen_later)
                    .build(),
            )),
    );
    api.mount(
        Mock::given(method("GET"))
            .and(path("/bob/listen-later/"))
            .and(query_param("limit", "3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(Fixtures::user_page("queued", 3, None)),
            ),
    );

    let value = stdout_json(mixcloud()?.args([
        "--api-root",
        &api.uri(),
        "connection",
        "bob/",
        "listen-later",
        "--limit",
        "3",
    ]))?;
    assert_eq!(value["data"][2]["key"], "/queued2/");
    Ok(())
}

#[test]
fn mixed_pagination_fails() -> Result<(), Box<dyn Error>> {
    mixcloud()?
        .args(["--api-root", "http://127.0.0.1:9", "popular", "--page", "1", "--offset", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "page and offset/limit/since/until cannot be specified simultaneously",
        ));
    Ok(())
}

#[test]
fn personal_commands_need_a_token() -> Result<(), Box<dyn Error>> {
    mixcloud()?
        .arg("me")
        .assert()
        .failure()
        .stderr(predicate::str::contains("access_token must be set"));
    Ok(())
}

#[test]
fn action_uses_token_from_environment() -> Result<(), Box<dyn Error>> {
    let api = Api::start();
    api.mount(
        Mock::given(method("DELETE"))
            .and(path("/bob/mix/listen-later/"))
            .and(query_param("access_token", "env-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": {"success": true}})),
            ),
    );

    let value = stdout_json(
        mixcloud()?
            .env("MIXCLOUD_ACCESS_TOKEN", "env-token")
            .args(["--api-root", &api.uri(), "action", "unlisten-later", "bob/mix"]),
    )?;
    assert_eq!(value["result"]["success"], true);
    Ok(())
}

#[test]
fn api_errors_are_printed_or_raised() -> Result<(), Box<dyn Error>> {
    let api = Api::start();
    api.mount(
        Mock::given(method("GET"))
            .and(path("/nobody/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"type": "NotFound", "message": "Not found"}
            }))),
    );

    let value = stdout_json(mixcloud()?.args(["--api-root", &api.uri(), "get", "nobody/"]))?;
    assert_eq!(value["error"]["type"], "NotFound");

    mixcloud()?
        .args(["--api-root", &api.uri(), "--raise-exceptions", "get", "nobody/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound"));
    Ok(())
}

#[test]
fn embed_html_prints_a_json_string() -> Result<(), Box<dyn Error>> {
    let api = Api::start();
    api.mount(
        Mock::given(method("GET"))
            .and(path("/bob/mix/embed-html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<iframe></iframe>"),
            ),
    );

    let value = stdout_json(mixcloud()?.args([
        "--api-root",
        &api.uri(),
        "embed",
        "bob/mix",
        "--format",
        "html",
    ]))?;
    assert_eq!(value, Value::String("<iframe></iframe>".to_string()));
    Ok(())
}

#[test]
fn authorize_url_reads_oauth_settings() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("mixcloud.toml");
    fs::write(
        &config,
        "[oauth]\nclient_id = \"abc\"\nredirect_uri = \"https://example.com/cb\"\n",
    )?;

    mixcloud()?
        .args(["--config", config.to_str().unwrap(), "authorize-url"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "https://www.mixcloud.com/oauth/authorize?client_id=abc",
        ));

    mixcloud()?
        .arg("authorize-url")
        .assert()
        .failure()
        .stderr(predicate::str::contains("client_id must be set"));
    Ok(())
}

#[test]
fn access_token_prints_null_on_rejection() -> Result<(), Box<dyn Error>> {
    let api = Api::start();
    api.mount(
        Mock::given(method("GET"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad code"}))),
    );

    let dir = tempfile::tempdir()?;
    let config = dir.path().join("mixcloud.toml");
    fs::write(
        &config,
        format!(
            "[client]\noauth_root = \"{}/oauth\"\n\n[oauth]\nclient_id = \"id\"\nclient_secret = \"s\"\nredirect_uri = \"https://example.com/cb\"\n",
            api.uri()
        ),
    )?;

    let value = stdout_json(mixcloud()?.args([
        "--config",
        config.to_str().unwrap(),
        "access-token",
        "nope",
    ]))?;
    assert_eq!(value, json!({"access_token": null}));
    Ok(())
}
