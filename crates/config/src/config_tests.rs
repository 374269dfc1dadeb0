//! Unit tests for the configuration crate

#[cfg(test)]
mod tests {
    use crate::{
        config::{AccessLogConfig, CriteriaConfig, FilteringPolicy, MAX_QUEUE_SIZE},
        is_configuration_acceptable, load_config, load_config_from_str, ChangeNotifier,
        ChangeResult, ConfigChangeListener,
    };
    use accesslog_core::{Error, OpKind, ResultCode};
    use parking_lot::Mutex;
    use std::sync::{Arc, Weak};
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AccessLogConfig::default();
        assert_eq!(config.log_file_permissions, "640");
        assert!(config.asynchronous);
        assert_eq!(config.queue_size, 5000);
        assert!(config.suppress_internal_operations);
        assert!(!config.suppress_synchronization_operations);
        assert_eq!(config.filtering_policy, FilteringPolicy::NoFiltering);
        assert!(!config.file_writer_auto_flush());
    }

    #[test]
    fn test_file_writer_auto_flush_only_when_synchronous() {
        let config = AccessLogConfig::new("/tmp/access")
            .with_auto_flush(true)
            .with_asynchronous(false, 0);
        assert!(config.file_writer_auto_flush());

        let config = config.with_asynchronous(true, 10);
        assert!(!config.file_writer_auto_flush());
    }

    #[test]
    fn test_load_minimal_json() {
        let config = load_config_from_str(r#"{ "log_file": "/var/log/ds/access" }"#).unwrap();
        assert_eq!(config.log_file.to_str(), Some("/var/log/ds/access"));
        assert_eq!(config.buffer_size, 64 * 1024);
    }

    #[test]
    fn test_load_full_json() {
        let json = r#"{
            "name": "Audit Access Logger",
            "log_file": "/var/log/ds/audit",
            "log_file_permissions": "600",
            "append": false,
            "asynchronous": true,
            "queue_size": 0,
            "rotation_policies": ["Size Limit Rotation Policy"],
            "retention_policies": ["File Count Retention Policy"],
            "suppress_internal_operations": false,
            "filtering_policy": "inclusive",
            "criteria": [
                { "record_types": ["bind", "modify_dn"], "result_codes": [49] }
            ]
        }"#;
        let config = load_config_from_str(json).unwrap();
        assert_eq!(config.name, "Audit Access Logger");
        assert_eq!(config.queue_size, 0);
        assert!(!config.append);
        assert_eq!(config.filtering_policy, FilteringPolicy::Inclusive);
        assert_eq!(
            config.criteria[0].record_types,
            vec![OpKind::Bind, OpKind::ModifyDn]
        );
        assert_eq!(config.criteria[0].result_codes, vec![ResultCode::INVALID_CREDENTIALS]);
        assert_eq!(config.permission().unwrap().mode(), 0o600);
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let err = load_config_from_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access-log.json");
        std::fs::write(&path, r#"{ "queue_size": 42 }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.queue_size, 42);

        let err = load_config(dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("read configuration file"), "{err}");
    }

    #[test]
    fn test_acceptable_default() {
        let (ok, reasons) = is_configuration_acceptable(&AccessLogConfig::default());
        assert!(ok, "{reasons:?}");
        assert!(reasons.is_empty());
    }

    #[test]
    fn test_queue_size_is_bounded() {
        let at_limit = AccessLogConfig::default().with_asynchronous(true, MAX_QUEUE_SIZE);
        assert!(is_configuration_acceptable(&at_limit).0);

        let huge = AccessLogConfig::default().with_asynchronous(true, usize::MAX / 4);
        let (ok, reasons) = is_configuration_acceptable(&huge);
        assert!(!ok);
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("queue size"), "{reasons:?}");
    }

    #[test]
    fn test_rejects_non_owner_writable_mode() {
        let config = AccessLogConfig::default().with_permissions("440");
        let (ok, reasons) = is_configuration_acceptable(&config);
        assert!(!ok);
        assert!(reasons[0].contains("do not allow the owner to write"));
    }

    #[test]
    fn test_rejects_unparsable_mode() {
        let config = AccessLogConfig::default().with_permissions("rw-r-----");
        let (ok, reasons) = is_configuration_acceptable(&config);
        assert!(!ok);
        assert!(reasons[0].contains("invalid log file permissions"));
    }

    #[test]
    fn test_rejects_filtering_without_criteria() {
        let config = AccessLogConfig::default()
            .with_filtering(FilteringPolicy::Exclusive, vec![CriteriaConfig::default()]);
        let (ok, reasons) = is_configuration_acceptable(&config);
        assert!(!ok);
        assert_eq!(reasons.len(), 1);

        let config = AccessLogConfig::default().with_filtering(FilteringPolicy::Inclusive, vec![]);
        assert!(!is_configuration_acceptable(&config).0);
    }

    #[test]
    fn test_collects_every_reason() {
        let mut config = AccessLogConfig::default().with_permissions("000");
        config.buffer_size = 0;
        config.time_interval_ms = 0;
        let (ok, reasons) = is_configuration_acceptable(&config);
        assert!(!ok);
        assert_eq!(reasons.len(), 3);
    }

    struct RecordingListener {
        accept: bool,
        applied: Mutex<Vec<AccessLogConfig>>,
    }

    impl ConfigChangeListener for RecordingListener {
        fn is_configuration_change_acceptable(
            &self,
            config: &AccessLogConfig,
        ) -> (bool, Vec<String>) {
            if self.accept {
                is_configuration_acceptable(config)
            } else {
                (false, vec!["refused".to_string()])
            }
        }

        fn apply_configuration_change(&self, config: &AccessLogConfig) -> ChangeResult {
            self.applied.lock().push(config.clone());
            ChangeResult::success()
        }
    }

    fn listener(accept: bool) -> Arc<RecordingListener> {
        Arc::new(RecordingListener {
            accept,
            applied: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_notifier_applies_when_all_accept() {
        let notifier = ChangeNotifier::new();
        let a = listener(true);
        let b = listener(true);
        let weak_a: Weak<dyn ConfigChangeListener> = Arc::downgrade(&a) as _;
        let weak_b: Weak<dyn ConfigChangeListener> = Arc::downgrade(&b) as _;
        notifier.register(weak_a);
        notifier.register(weak_b);

        let results = notifier.publish(&AccessLogConfig::default()).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(ChangeResult::is_success));
        assert_eq!(a.applied.lock().len(), 1);
        assert_eq!(b.applied.lock().len(), 1);
    }

    #[test]
    fn test_notifier_rejection_applies_nothing() {
        let notifier = ChangeNotifier::new();
        let a = listener(true);
        let b = listener(false);
        notifier.register(Arc::downgrade(&a) as Weak<dyn ConfigChangeListener>);
        notifier.register(Arc::downgrade(&b) as Weak<dyn ConfigChangeListener>);

        let reasons = notifier.publish(&AccessLogConfig::default()).unwrap_err();
        assert_eq!(reasons, vec!["refused".to_string()]);
        assert!(a.applied.lock().is_empty());
        assert!(b.applied.lock().is_empty());
    }

    #[test]
    fn test_notifier_deregister_and_dropped_listeners() {
        let notifier = ChangeNotifier::new();
        let a = listener(true);
        let id = notifier.register(Arc::downgrade(&a) as Weak<dyn ConfigChangeListener>);
        {
            let short_lived = listener(true);
            notifier.register(Arc::downgrade(&short_lived) as Weak<dyn ConfigChangeListener>);
            assert_eq!(notifier.listener_count(), 2);
        }
        assert_eq!(notifier.listener_count(), 1);

        assert!(notifier.deregister(id));
        assert!(!notifier.deregister(id));
        assert_eq!(notifier.listener_count(), 0);
        assert_eq!(notifier.publish(&AccessLogConfig::default()).unwrap().len(), 0);
    }
}
