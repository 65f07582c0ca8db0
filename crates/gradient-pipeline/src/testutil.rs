//! Shared fixtures for pipeline tests.

use std::collections::HashMap;
use std::path::Path;

use tokio::sync::watch;

use gradient_core::config::{ApplicationConfig, DeployTargetConfig, InputConfig};
use gradient_core::types::{Container, RevisionTemplate, Service, ServiceRef, TrafficTarget};
use gradient_platform::{FakePlatform, PlatformClient};

use crate::context::StageContext;

pub fn app_config() -> ApplicationConfig {
    ApplicationConfig {
        name: "checkout".to_string(),
        labels: HashMap::new(),
        service_manifest_path: None,
        input: InputConfig::default(),
        quick_sync: None,
        pipeline: None,
    }
}

pub fn target_config() -> DeployTargetConfig {
    DeployTargetConfig {
        name: "staging".to_string(),
        project: "proj".to_string(),
        region: "eu-west1".to_string(),
        api_endpoint: None,
        credentials_file: None,
    }
}

pub fn stage_context<'a>(
    app: &'a ApplicationConfig,
    target: &'a DeployTargetConfig,
    app_dir: &'a Path,
    cancel: watch::Receiver<bool>,
) -> StageContext<'a> {
    StageContext::new(app, target, app_dir, cancel)
}

pub fn write_manifest(dir: &Path) {
    std::fs::write(
        dir.join("service.json"),
        r#"{
            "name": "checkout",
            "template": {
                "containers": [{"image": "registry.example.com/checkout:v1"}],
                "labels": {"app": "checkout"}
            },
            "traffic": [{"type": "latest", "percent": 100}]
        }"#,
    )
    .unwrap();
}

/// Deploy `n` template revisions directly through the platform client.
pub async fn deploy_revisions(platform: &FakePlatform, svc: &ServiceRef, n: usize) {
    for i in 1..=n {
        let desired = Service {
            name: svc.service.clone(),
            uri: String::new(),
            template: RevisionTemplate {
                revision: String::new(),
                containers: vec![Container {
                    image: format!("registry.example.com/{}:v{i}", svc.service),
                    port: None,
                    resources: None,
                }],
                labels: HashMap::new(),
                annotations: HashMap::new(),
                container_concurrency: None,
            },
            traffic: vec![TrafficTarget::Latest { percent: 100 }],
            conditions: vec![],
        };
        platform
            .create_or_update_service(svc, &desired)
            .await
            .unwrap();
    }
}
