//! Built-in addon catalog

use serde_json::{Map, Value as JsonValue};

use crate::addon::{AddonDescriptor, HaVariant, ValuesSource};
use crate::error::Result;
use crate::values::Values;

const BITNAMI_REPO: (&str, &str) = ("bitnami", "https://charts.bitnami.com/bitnami");

const PROMETHEUS_VALUES: &str = include_str!("../addons/prometheus/values.yaml");
const GRAFANA_VALUES: &str = include_str!("../addons/grafana/values.yaml");
const KAFKA_VALUES: &str = include_str!("../addons/kafka/values.yaml");
const POSTGRES_VALUES: &str = include_str!("../addons/postgres/values.yaml");
const POSTGRES_HA_VALUES: &str = include_str!("../addons/postgres/values-ha.yaml");

/// Grafana dashboards shipped with kstack, keyed by name
const GRAFANA_DASHBOARDS: &[(&str, &str)] = &[(
    "cluster-overview",
    include_str!("../addons/grafana/dashboards/cluster-overview.json"),
)];

/// Every addon kstack knows about out of the box
pub fn addons() -> Vec<AddonDescriptor> {
    vec![
        AddonDescriptor::new(
            "prometheus",
            "prometheus-community/prometheus",
            "monitoring",
        )
        .with_repo(
            "prometheus-community",
            "https://prometheus-community.github.io/helm-charts",
        )
        .with_values(ValuesSource::embedded("prometheus", PROMETHEUS_VALUES)),
        AddonDescriptor::new("grafana", "grafana/grafana", "monitoring")
            .with_repo("grafana", "https://grafana.github.io/helm-charts")
            .with_values(ValuesSource::embedded("grafana", grafana_values())),
        AddonDescriptor::new("kafka", "bitnami/kafka", "kafka")
            .with_repo(BITNAMI_REPO.0, BITNAMI_REPO.1)
            .with_values(ValuesSource::embedded("kafka", KAFKA_VALUES)),
        AddonDescriptor::new("postgres", "bitnami/postgresql", "postgres")
            .with_repo(BITNAMI_REPO.0, BITNAMI_REPO.1)
            .with_values(ValuesSource::embedded("postgres", POSTGRES_VALUES))
            .with_ha(HaVariant {
                chart: "bitnami/postgresql-ha".to_string(),
                repo_name: BITNAMI_REPO.0.to_string(),
                repo_url: BITNAMI_REPO.1.to_string(),
                values: vec![ValuesSource::embedded("postgres-ha", POSTGRES_HA_VALUES)],
            }),
        AddonDescriptor::new("example-app", "./charts/example-app", "app")
            .with_values(ValuesSource::file("charts/example-app/values.yaml")),
    ]
}

fn grafana_values() -> String {
    match inject_dashboards(GRAFANA_VALUES, GRAFANA_DASHBOARDS) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!("failed to inject grafana dashboards: {}", e);
            GRAFANA_VALUES.to_string()
        }
    }
}

/// Place dashboards under `dashboards.default.<name>.json`
///
/// Base values that already define dashboards are returned untouched.
pub fn inject_dashboards(base: &str, dashboards: &[(&str, &str)]) -> Result<String> {
    if dashboards.is_empty() {
        return Ok(base.to_string());
    }

    let mut values = Values::from_yaml(base)?;
    let has_dashboards = match values.get("dashboards") {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::Object(map)) => !map.is_empty(),
        Some(_) => true,
    };
    if has_dashboards {
        return Ok(base.to_string());
    }

    let mut default = Map::new();
    for (name, json) in dashboards {
        let mut entry = Map::new();
        entry.insert("json".to_string(), JsonValue::String(json.trim_end().to_string()));
        default.insert((*name).to_string(), JsonValue::Object(entry));
    }
    let mut injected = Map::new();
    injected.insert("default".to_string(), JsonValue::Object(default));
    values.set("dashboards", JsonValue::Object(injected));

    values.to_yaml()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DASH: &[(&str, &str)] = &[("overview", "{\"title\": \"Overview\"}\n")];

    #[test]
    fn test_inject_replaces_empty_placeholder() {
        let out = inject_dashboards("adminUser: admin\ndashboards: {}\n", DASH).unwrap();
        let values = Values::from_yaml(&out).unwrap();

        assert_eq!(values.get("adminUser").unwrap(), "admin");
        assert_eq!(
            values.get("dashboards.default.overview.json").unwrap(),
            "{\"title\": \"Overview\"}"
        );
    }

    #[test]
    fn test_inject_appends_when_missing() {
        let out = inject_dashboards("adminUser: admin\n", DASH).unwrap();
        let values = Values::from_yaml(&out).unwrap();
        assert!(values.get("dashboards.default.overview").is_some());
    }

    #[test]
    fn test_inject_keeps_existing_dashboards() {
        let base = "dashboards:\n  custom:\n    mine:\n      json: '{}'\n";
        assert_eq!(inject_dashboards(base, DASH).unwrap(), base);
    }

    #[test]
    fn test_builtin_grafana_has_dashboards() {
        let grafana = addons().into_iter().find(|a| a.name == "grafana").unwrap();
        let ValuesSource::Embedded { content, .. } = &grafana.values[0] else {
            panic!("grafana defaults should be embedded");
        };
        let values = Values::from_yaml(content).unwrap();
        assert!(values
            .get("dashboards.default.cluster-overview.json")
            .is_some());
    }

    #[test]
    fn test_embedded_payloads_parse() {
        for addon in addons() {
            let sources = addon
                .values
                .iter()
                .chain(addon.ha.iter().flat_map(|ha| ha.values.iter()));
            for source in sources {
                if let ValuesSource::Embedded { name, content } = source {
                    let values = Values::from_yaml(content)
                        .unwrap_or_else(|e| panic!("{name} does not parse: {e}"));
                    assert!(values.inner().is_object(), "{name} is not a mapping");
                }
            }
        }
    }

    #[test]
    fn test_only_example_app_is_local() {
        for addon in addons() {
            let local = crate::addon::is_local_chart(&addon.chart);
            assert_eq!(local, addon.name == "example-app", "{}", addon.name);
            assert_eq!(local, addon.repo_url.is_empty(), "{}", addon.name);
        }
    }
}
