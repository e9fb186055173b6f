//! Rule file loading, router table replacement and hot reload.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use condition_router::config::{load_config, ConfigError, ConfigWatcher, RouterConfig};
use condition_router::endpoint::{Invoker, RpcInvocation, ServiceUrl};
use condition_router::routing::{ConditionRouterFactory, MalformedRuleError, RouterTable};

const RULES_V1: &str = r#"
[[rules]]
name = "same-host"
service = "com.foo.BarService"
rule = "true => host = $host"

[[providers]]
url = "dubbo://10.0.0.1:20880/com.foo.BarService"

[[providers]]
url = "dubbo://10.0.0.2:20880/com.foo.BarService"

[[providers]]
url = "dubbo://10.0.0.2:20881/com.foo.BarService"
"#;

const RULES_V2: &str = r#"
[[rules]]
name = "not-two"
service = "com.foo.BarService"
rule = "=> host != 10.0.0.2"

[[providers]]
url = "dubbo://10.0.0.1:20880/com.foo.BarService"

[[providers]]
url = "dubbo://10.0.0.2:20880/com.foo.BarService"
"#;

const RULES_BROKEN: &str = r#"
[[rules]]
name = "broken"
service = "com.foo.BarService"
rule = "host = 10.0.0.2"
"#;

fn temp_rule_file(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("condition-router-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("router.toml");
    std::fs::write(&path, content).unwrap();
    path
}

fn hosts(invokers: &[Arc<impl Invoker>]) -> Vec<String> {
    invokers.iter().map(|i| i.url().to_string()).collect()
}

#[test]
fn test_load_and_route() {
    let path = temp_rule_file("load", RULES_V1);
    let config = load_config(&path).unwrap();

    let table = RouterTable::new();
    table
        .replace_from_urls(&ConditionRouterFactory::service(), &config.rule_urls())
        .unwrap();
    let invokers = config.build_invokers().unwrap();

    let consumer = ServiceUrl::parse("consumer://10.0.0.2/com.foo.BarService").unwrap();
    let out = table.route(&invokers, &consumer, &RpcInvocation::new());
    assert_eq!(
        hosts(&out),
        vec![
            "dubbo://10.0.0.2:20880/com.foo.BarService",
            "dubbo://10.0.0.2:20881/com.foo.BarService"
        ]
    );
}

#[test]
fn test_broken_file_keeps_previous_routers() {
    let path = temp_rule_file("broken", RULES_V1);
    let config = load_config(&path).unwrap();
    let table = RouterTable::new();
    let factory = ConditionRouterFactory::service();
    table.replace_from_urls(&factory, &config.rule_urls()).unwrap();
    let before = table.snapshot();

    std::fs::write(&path, RULES_BROKEN).unwrap();
    assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));

    // Push the broken rules at the table anyway, bypassing validation.
    let broken: RouterConfig = toml::from_str(RULES_BROKEN).unwrap();
    let result = table.replace_from_urls(&factory, &broken.rule_urls());
    assert!(matches!(result, Err(MalformedRuleError::MissingSeparator { .. })));
    assert!(Arc::ptr_eq(&before, &table.snapshot()));
    assert_eq!(table.len(), 1);
}

#[tokio::test]
async fn test_watcher_publishes_new_rules() {
    let path = temp_rule_file("watch", RULES_V1);
    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let _watcher = watcher.run().unwrap();

    // Give the backend a moment to register the watch.
    tokio::time::sleep(Duration::from_millis(200)).await;
    std::fs::write(&path, RULES_V2).unwrap();

    let config = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match updates.recv().await {
                Some(config) if config.rules.iter().any(|r| r.name == "not-two") => break config,
                Some(_) => continue,
                None => panic!("watcher channel closed"),
            }
        }
    })
    .await
    .expect("No rule update received");

    let table = RouterTable::new();
    table
        .replace_from_urls(&ConditionRouterFactory::service(), &config.rule_urls())
        .unwrap();
    let invokers = config.build_invokers().unwrap();
    let consumer = ServiceUrl::parse("consumer://10.0.0.9/com.foo.BarService").unwrap();
    let out = table.route(&invokers, &consumer, &RpcInvocation::new());
    assert_eq!(hosts(&out), vec!["dubbo://10.0.0.1:20880/com.foo.BarService"]);
}
