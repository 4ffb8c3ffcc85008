// system-tests/tests/helpers/microcks.rs
// ============================================================================
// Module: Microcks Fixture
// Description: Microcks container lifecycle and artifact import.
// Purpose: Resolve the Library API mock endpoint served by real Microcks.
// Dependencies: testcontainers, reqwest, contract-verifier
// ============================================================================

//! ## Overview
//! [`MicrocksFixture`] either reuses an instance named by
//! `CONTRACT_VERIFIER_SYSTEM_MICROCKS_URL` or starts the `microcks-uber`
//! image with `testcontainers`. Either way the OpenAPI artifact is imported
//! as a main artifact before the REST mock endpoint is resolved.
//! Invariants:
//! - A started container lives as long as the fixture.
//! - Docker must be reachable when no override URL is set.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use contract_verifier::MockEndpointResolver;
use contract_verifier::ResolveError;
use contract_verifier::resolver::parse_base_url;
use reqwest::blocking::Client;
use reqwest::blocking::multipart::Form;
use system_tests::config::SystemTestConfig;
use testcontainers::Container;
use testcontainers::GenericImage;
use testcontainers::ImageExt;
use testcontainers::core::IntoContainerPort;
use testcontainers::core::WaitFor;
use testcontainers::runners::SyncRunner;
use url::Url;

use super::timeouts::resolve_timeout;

/// HTTP port exposed by the `microcks-uber` image.
const MICROCKS_HTTP_PORT: u16 = 8080;
/// Log line printed once Microcks accepts requests.
const READY_LOG_LINE: &str = "Started MicrocksApplication";

/// Running Microcks instance with one imported contract.
pub struct MicrocksFixture {
    /// Microcks HTTP endpoint (console and API).
    http_endpoint: Url,
    /// Service name of the imported contract.
    service: String,
    /// Service version of the imported contract.
    version: String,
    /// Container handle; `None` when reusing an external instance.
    _container: Option<Container<GenericImage>>,
}

impl MicrocksFixture {
    /// Starts (or reuses) Microcks and imports `artifact` as main artifact.
    pub fn start(artifact: &Path, service: &str, version: &str) -> Result<Self, ResolveError> {
        let config = SystemTestConfig::load()?;
        let startup = resolve_timeout(Duration::from_secs(120));
        let (http_endpoint, container) = match &config.microcks_url {
            Some(url) => (parse_base_url(url)?, None),
            None => {
                ensure_docker_available()?;
                let container = GenericImage::new(&config.microcks_image, &config.microcks_tag)
                    .with_exposed_port(MICROCKS_HTTP_PORT.tcp())
                    .with_wait_for(WaitFor::message_on_stdout(READY_LOG_LINE))
                    .with_startup_timeout(startup)
                    .start()
                    .map_err(|err| provider(format!("failed to start microcks: {err}")))?;
                let port = container
                    .get_host_port_ipv4(MICROCKS_HTTP_PORT.tcp())
                    .map_err(|err| provider(format!("failed to resolve microcks port: {err}")))?;
                (parse_base_url(&format!("http://127.0.0.1:{port}"))?, Some(container))
            }
        };
        let fixture = Self {
            http_endpoint,
            service: service.to_string(),
            version: version.to_string(),
            _container: container,
        };
        fixture.import_main_artifact(artifact)?;
        Ok(fixture)
    }

    /// Returns the Microcks HTTP endpoint.
    pub const fn http_endpoint(&self) -> &Url {
        &self.http_endpoint
    }

    /// Uploads an OpenAPI artifact as main artifact.
    pub fn import_main_artifact(&self, artifact: &Path) -> Result<(), ResolveError> {
        let base = self.http_endpoint.as_str().trim_end_matches('/');
        let upload = Url::parse(&format!("{base}/api/artifact/upload?mainArtifact=true"))
            .map_err(|err| ResolveError::InvalidUrl(err.to_string()))?;
        let form = Form::new().file("file", artifact).map_err(|err| {
            provider(format!("cannot read artifact {}: {err}", artifact.display()))
        })?;
        let client = Client::builder()
            .timeout(resolve_timeout(Duration::from_secs(30)))
            .build()
            .map_err(|err| provider(format!("http client build failed: {err}")))?;
        let response = client
            .post(upload)
            .multipart(form)
            .send()
            .map_err(|err| provider(format!("artifact upload failed: {err}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(provider(format!("artifact upload rejected ({status}): {body}")));
        }
        Ok(())
    }

    /// Returns the REST mock endpoint for a service and version.
    pub fn rest_mock_endpoint(&self, service: &str, version: &str) -> Result<Url, ResolveError> {
        let base = self.http_endpoint.as_str().trim_end_matches('/');
        let service = service.replace(' ', "+");
        parse_base_url(&format!("{base}/rest/{service}/{version}"))
    }
}

impl MockEndpointResolver for MicrocksFixture {
    fn resolve(&self) -> Result<Url, ResolveError> {
        self.rest_mock_endpoint(&self.service, &self.version)
    }
}

fn provider(message: String) -> ResolveError {
    ResolveError::Provider(message)
}

fn ensure_docker_available() -> Result<(), ResolveError> {
    let output = Command::new("docker")
        .arg("info")
        .output()
        .map_err(|err| provider(format!("docker info failed: {err}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(provider(format!("docker info failed: {stderr}")));
    }
    Ok(())
}
