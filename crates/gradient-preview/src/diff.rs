//! Service diff logic.
//!
//! Stateless comparison of a desired service spec against the live one.
//! Each category (image, traffic, resources, scaling) is compared
//! independently; string equality only, no unit normalization.

use std::collections::BTreeMap;
use std::fmt::Write;

use gradient_core::types::{
    RevisionTemplate, Service, TrafficTarget, MAX_SCALE_ANNOTATION, MIN_SCALE_ANNOTATION,
};

/// Read-only projection of what a sync would change for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanPreviewResult {
    pub deploy_target: String,
    pub summary: String,
    /// True when the live service already matches the desired state.
    pub no_change: bool,
    pub details: String,
}

/// Build the plan for creating a service that does not exist yet.
pub fn plan_create(
    desired: &Service,
    project: &str,
    region: &str,
    target_name: &str,
) -> PlanPreviewResult {
    let mut details = String::new();
    let _ = writeln!(details, "target: {target_name}");
    let _ = writeln!(details, "project: {project}");
    let _ = writeln!(details, "region: {region}");
    let _ = writeln!(details);
    let _ = writeln!(details, "new service will be created");
    let _ = writeln!(details);
    let _ = writeln!(details, "service: {}", desired.name);

    let image = desired.template.first_image();
    if !image.is_empty() {
        let _ = writeln!(details, "image: {image}");
    }

    if !desired.traffic.is_empty() {
        let _ = writeln!(details, "initial traffic:");
        for target in &desired.traffic {
            let _ = writeln!(details, "  - {}: {}%", target.key(), target.percent());
        }
    }

    let annotations = &desired.template.annotations;
    if annotations.contains_key(MIN_SCALE_ANNOTATION)
        || annotations.contains_key(MAX_SCALE_ANNOTATION)
    {
        let _ = writeln!(details, "scaling:");
        if let Some(min) = annotations.get(MIN_SCALE_ANNOTATION) {
            let _ = writeln!(details, "  - min instances: {min}");
        }
        if let Some(max) = annotations.get(MAX_SCALE_ANNOTATION) {
            let _ = writeln!(details, "  - max instances: {max}");
        }
    }

    PlanPreviewResult {
        deploy_target: target_name.to_string(),
        summary: format!(
            "new service '{}' will be created in {project}/{region}",
            desired.name
        ),
        no_change: false,
        details,
    }
}

/// Build the plan for updating an existing service.
pub fn plan_update(
    current: &Service,
    desired: &Service,
    project: &str,
    region: &str,
    target_name: &str,
) -> PlanPreviewResult {
    let mut details = String::new();
    let mut changes: Vec<&str> = Vec::new();

    let _ = writeln!(details, "target: {target_name}");
    let _ = writeln!(details, "project: {project}");
    let _ = writeln!(details, "region: {region}");
    let _ = writeln!(details, "service: {}", current.name);
    let _ = writeln!(details);

    let current_image = current.template.first_image();
    let desired_image = desired.template.first_image();
    if current_image != desired_image {
        changes.push("container image");
        let _ = writeln!(details, "container image:");
        let _ = writeln!(details, "  - current: {current_image}");
        let _ = writeln!(details, "  + desired: {desired_image}");
        let _ = writeln!(details);
    }

    if traffic_changed(&current.traffic, &desired.traffic) {
        changes.push("traffic allocation");
        let _ = writeln!(details, "traffic allocation:");
        let _ = writeln!(details, "  current:");
        for target in &current.traffic {
            let _ = writeln!(details, "    - {}: {}%", target.key(), target.percent());
        }
        let _ = writeln!(details, "  desired:");
        for target in &desired.traffic {
            let _ = writeln!(details, "    + {}: {}%", target.key(), target.percent());
        }
        let _ = writeln!(details);
    }

    if resources_changed(&current.template, &desired.template) {
        changes.push("resource limits");
        let _ = writeln!(details, "resource limits:");
        let _ = writeln!(
            details,
            "  - cpu: {}, memory: {}",
            limit(&current.template, "cpu"),
            limit(&current.template, "memory")
        );
        let _ = writeln!(
            details,
            "  + cpu: {}, memory: {}",
            limit(&desired.template, "cpu"),
            limit(&desired.template, "memory")
        );
        let _ = writeln!(details);
    }

    if scaling_changed(&current.template, &desired.template) {
        changes.push("scaling configuration");
        let _ = writeln!(details, "scaling configuration:");
        let _ = writeln!(
            details,
            "  - min: {}, max: {}",
            annotation(&current.template, MIN_SCALE_ANNOTATION),
            annotation(&current.template, MAX_SCALE_ANNOTATION)
        );
        let _ = writeln!(
            details,
            "  + min: {}, max: {}",
            annotation(&desired.template, MIN_SCALE_ANNOTATION),
            annotation(&desired.template, MAX_SCALE_ANNOTATION)
        );
        let _ = writeln!(details);
    }

    let no_change = changes.is_empty();
    let summary = if no_change {
        let _ = writeln!(details, "no changes detected, service matches desired state");
        format!(
            "no changes - service '{}' matches desired state",
            current.name
        )
    } else {
        let _ = writeln!(
            details,
            "a new revision will be created with {} change(s)",
            changes.len()
        );
        format!(
            "service '{}' will be updated ({})",
            current.name,
            changes.join(", ")
        )
    };

    PlanPreviewResult {
        deploy_target: target_name.to_string(),
        summary,
        no_change,
        details,
    }
}

/// Order-independent, size-sensitive allocation comparison keyed by
/// `"latest"` or revision name.
pub fn traffic_changed(current: &[TrafficTarget], desired: &[TrafficTarget]) -> bool {
    if current.len() != desired.len() {
        return true;
    }
    allocation_map(current) != allocation_map(desired)
}

fn allocation_map(targets: &[TrafficTarget]) -> BTreeMap<&str, u32> {
    targets.iter().map(|t| (t.key(), t.percent())).collect()
}

/// First-container cpu/memory limit comparison, string equality only.
pub fn resources_changed(current: &RevisionTemplate, desired: &RevisionTemplate) -> bool {
    limit(current, "cpu") != limit(desired, "cpu")
        || limit(current, "memory") != limit(desired, "memory")
}

/// minScale/maxScale annotation comparison, string equality only.
pub fn scaling_changed(current: &RevisionTemplate, desired: &RevisionTemplate) -> bool {
    annotation(current, MIN_SCALE_ANNOTATION) != annotation(desired, MIN_SCALE_ANNOTATION)
        || annotation(current, MAX_SCALE_ANNOTATION) != annotation(desired, MAX_SCALE_ANNOTATION)
}

fn limit<'t>(template: &'t RevisionTemplate, key: &str) -> &'t str {
    template
        .containers
        .first()
        .and_then(|c| c.resources.as_ref())
        .and_then(|r| r.limits.get(key))
        .map(String::as_str)
        .unwrap_or("")
}

fn annotation<'t>(template: &'t RevisionTemplate, key: &str) -> &'t str {
    template
        .annotations
        .get(key)
        .map(String::as_str)
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradient_core::types::{Container, ResourceRequirements};
    use std::collections::HashMap;

    fn service(image: &str) -> Service {
        let mut limits = HashMap::new();
        limits.insert("cpu".to_string(), "1000m".to_string());
        limits.insert("memory".to_string(), "512Mi".to_string());

        let mut annotations = HashMap::new();
        annotations.insert(MIN_SCALE_ANNOTATION.to_string(), "0".to_string());
        annotations.insert(MAX_SCALE_ANNOTATION.to_string(), "10".to_string());

        Service {
            name: "checkout".to_string(),
            uri: String::new(),
            template: RevisionTemplate {
                revision: String::new(),
                containers: vec![Container {
                    image: image.to_string(),
                    port: None,
                    resources: Some(ResourceRequirements { limits }),
                }],
                labels: HashMap::new(),
                annotations,
                container_concurrency: None,
            },
            traffic: vec![TrafficTarget::Latest { percent: 100 }],
            conditions: vec![],
        }
    }

    #[test]
    fn create_plan_enumerates_the_new_service() {
        let desired = service("registry.example.com/checkout:v1");
        let result = plan_create(&desired, "proj", "eu-west1", "staging");

        assert!(!result.no_change);
        assert!(result.summary.contains("new service 'checkout'"));
        assert!(result.details.contains("registry.example.com/checkout:v1"));
        assert!(result.details.contains("latest: 100%"));
        assert!(result.details.contains("max instances: 10"));
    }

    #[test]
    fn identical_services_are_no_change() {
        let svc = service("registry.example.com/checkout:v1");
        let result = plan_update(&svc, &svc, "proj", "eu-west1", "production");

        assert!(result.no_change);
        assert!(result.summary.contains("no changes"));
        assert!(result.details.contains("no changes detected"));
    }

    #[test]
    fn diff_is_a_pure_function() {
        let current = service("registry.example.com/checkout:v1");
        let desired = service("registry.example.com/checkout:v2");

        let first = plan_update(&current, &desired, "proj", "eu-west1", "production");
        let second = plan_update(&current, &desired, "proj", "eu-west1", "production");
        assert_eq!(first, second);
    }

    #[test]
    fn image_change_is_named_in_summary() {
        let current = service("registry.example.com/checkout:v1");
        let desired = service("registry.example.com/checkout:v2");
        let result = plan_update(&current, &desired, "proj", "eu-west1", "production");

        assert!(!result.no_change);
        assert!(result.summary.contains("container image"));
        assert!(result.details.contains("- current: registry.example.com/checkout:v1"));
        assert!(result.details.contains("+ desired: registry.example.com/checkout:v2"));
    }

    #[test]
    fn traffic_comparison_is_order_independent() {
        let a = vec![
            TrafficTarget::Latest { percent: 50 },
            TrafficTarget::Revision {
                revision: "checkout-00001".to_string(),
                percent: 50,
            },
        ];
        let b = vec![
            TrafficTarget::Revision {
                revision: "checkout-00001".to_string(),
                percent: 50,
            },
            TrafficTarget::Latest { percent: 50 },
        ];
        assert!(!traffic_changed(&a, &b));
    }

    #[test]
    fn traffic_comparison_is_size_sensitive() {
        let a = vec![TrafficTarget::Latest { percent: 100 }];
        let b = vec![
            TrafficTarget::Latest { percent: 50 },
            TrafficTarget::Revision {
                revision: "checkout-00001".to_string(),
                percent: 50,
            },
        ];
        assert!(traffic_changed(&a, &b));
    }

    #[test]
    fn traffic_comparison_sees_percent_changes() {
        let a = vec![TrafficTarget::Latest { percent: 100 }];
        let b = vec![TrafficTarget::Latest { percent: 50 }];
        assert!(traffic_changed(&a, &b));
        assert!(!traffic_changed(&a, &a));
    }

    #[test]
    fn resource_change_detected_by_string_equality() {
        let current = service("img:v1");
        let mut desired = service("img:v1");
        desired.template.containers[0]
            .resources
            .as_mut()
            .unwrap()
            .limits
            .insert("cpu".to_string(), "2000m".to_string());

        assert!(resources_changed(&current.template, &desired.template));

        let result = plan_update(&current, &desired, "proj", "eu-west1", "production");
        assert!(result.summary.contains("resource limits"));
        assert!(!result.summary.contains("container image"));
    }

    #[test]
    fn scaling_change_detected_by_string_equality() {
        let current = service("img:v1");
        let mut desired = service("img:v1");
        desired
            .template
            .annotations
            .insert(MAX_SCALE_ANNOTATION.to_string(), "20".to_string());

        assert!(scaling_changed(&current.template, &desired.template));

        let result = plan_update(&current, &desired, "proj", "eu-west1", "production");
        assert!(result.summary.contains("scaling configuration"));
    }

    #[test]
    fn multiple_changes_are_all_named() {
        let current = service("img:v1");
        let mut desired = service("img:v2");
        desired
            .template
            .annotations
            .insert(MIN_SCALE_ANNOTATION.to_string(), "2".to_string());
        desired.traffic = vec![TrafficTarget::Latest { percent: 50 }];

        let result = plan_update(&current, &desired, "proj", "eu-west1", "production");
        assert!(result.summary.contains("container image"));
        assert!(result.summary.contains("traffic allocation"));
        assert!(result.summary.contains("scaling configuration"));
        assert!(result.details.contains("3 change(s)"));
    }
}
