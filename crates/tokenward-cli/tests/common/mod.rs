use std::path::Path;
use std::process::Output;

use serde_json::json;
use tokio::process::Command;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run the CLI with an isolated HOME so preference and jar files stay in `home`.
pub async fn run_cli(args: &[&str], home: &Path, api: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tokenward"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join("config"));
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env("TOKENWARD_API", api);
    cmd.env_remove("RUST_LOG");
    cmd.output().await.expect("Failed to execute CLI")
}

/// Run the CLI and expect success, returning stdout.
pub async fn run_cli_success(args: &[&str], home: &Path, api: &str) -> String {
    let output = run_cli(args, home, api).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn api_url(server: &MockServer) -> String {
    format!("http://127.0.0.1:{}", server.address().port())
}

/// `/auth` accepting ana and setting the refresh cookie.
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(body_json(json!({"user": "ana", "pwd": "Secret#123"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "jwt=R1; HttpOnly; Max-Age=86400; Path=/")
                .set_body_json(json!({
                    "accessToken": "T1",
                    "user": {"id": 7, "name": "ana"}
                })),
        )
        .mount(server)
        .await;
}

/// `/refresh` issuing T2 to whoever presents the R1 cookie.
pub async fn mount_refresh(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/refresh"))
        .and(header("cookie", "jwt=R1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "T2",
            "user": {"id": 7, "name": "ana"}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(10)
        .mount(server)
        .await;
}
