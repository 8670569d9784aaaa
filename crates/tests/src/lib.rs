//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - JSONL 日志 → 配置 → 任务流水线 → 报告输出 的 e2e 测试

#[cfg(test)]
mod contract_tests {
    use contracts::{AnalysisTaskConfig, SampleErrorKind};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_default_analysis_type() {
        let task = AnalysisTaskConfig::new("t", "/topic", &["x"], "x", "");
        let config = config_loader::ConfigLoader::load_from_str(
            r#"
[[analyses]]
id = "t"
topic_name = "/topic"
field_names = ["x"]
parse_string = "x"
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(config.analyses[0].analysis_type, "none");
        assert_eq!(task.id, config.analyses[0].id);
    }

    #[test]
    fn test_error_kind_names() {
        let names: Vec<&str> = [
            SampleErrorKind::FieldNotFound,
            SampleErrorKind::ByteRange,
            SampleErrorKind::Cast,
            SampleErrorKind::Expression,
        ]
        .iter()
        .map(SampleErrorKind::as_str)
        .collect();
        assert_eq!(names, ["field_not_found", "byte_range", "cast", "expression"]);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        AnalysisOutcome, ContractError, FieldValue, MessageRecord, MessageSource, Number,
        RunReport, SampleErrorKind,
    };
    use ingestion::MemorySource;
    use orchestrator::{PipelineOptions, TaskPipeline};
    use reporter::sinks::{DIAGNOSTICS_FILE, JSON_FILE, MARKDOWN_FILE};
    use reporter::{ReportDispatcher, SinkKind};
    use serde_json::{json, Value};
    use tempfile::tempdir;

    const T0: u64 = 1_700_000_000_000_000_000;
    const PERIOD_NS: u64 = 10_000_000;

    fn write_jsonl(path: &Path, records: &[Value]) {
        let mut file = fs::File::create(path).unwrap();
        for record in records {
            writeln!(file, "{record}").unwrap();
        }
    }

    fn imu_record(timestamp: u64) -> Value {
        json!({
            "topic": "/imu",
            "log_time": timestamp,
            "message": {"header": {"stamp": timestamp}, "accel": {"x": 0.5}}
        })
    }

    fn can_record(timestamp: u64, data: &[u8]) -> Value {
        json!({
            "topic": "/can",
            "log_time": timestamp,
            "message": {"id": 291, "data": {"$bytes": data}}
        })
    }

    fn open(paths: &[PathBuf]) -> Vec<Box<dyn MessageSource>> {
        paths
            .iter()
            .map(|p| ingestion::open_source(p).unwrap())
            .collect()
    }

    fn pipeline(toml: &str, concurrency: usize) -> Result<TaskPipeline, ContractError> {
        let config = ConfigLoader::load_from_str(toml, ConfigFormat::Toml)?;
        Ok(TaskPipeline::from_config(&config)?.with_options(PipelineOptions {
            concurrency,
            retain_series: true,
        }))
    }

    fn timestamp_outcome(report: &RunReport, task_id: &str) -> contracts::TimestampSummary {
        match &report.task(task_id).unwrap().result.outcome {
            AnalysisOutcome::Timestamp(summary) => summary.clone(),
            other => panic!("expected timestamp outcome, got {other:?}"),
        }
    }

    const DRIVE_CONFIG: &str = r#"
[[analyses]]
id = "imu_stamp"
topic_name = "/imu"
field_names = ["header.stamp"]
parse_string = "header.stamp"
analysis_type = "timestamp(freq:100)"

[[analyses]]
id = "wheel_speed"
topic_name = "/can"
field_names = ["data"]
parse_string = "data(byte:0-2,type:uint16) * 0.01"
analysis_type = "basic_stats"

[[analyses]]
id = "accel"
topic_name = "/imu"
field_names = ["accel.x"]
parse_string = "accel.x * 2"
"#;

    /// End-to-end: JSONL -> ConfigLoader -> TaskPipeline -> ReportDispatcher
    ///
    /// 验证完整的数据流：
    /// 1. JSONL 日志解码为消息
    /// 2. 任务按 topic 路由、提取、计算
    /// 3. 报告写出到结果目录
    #[tokio::test]
    async fn test_e2e_jsonl_pipeline() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("drive.jsonl");

        let mut records = Vec::new();
        for i in 0..20u64 {
            let ts = T0 + i * PERIOD_NS;
            records.push(imu_record(ts));
            if i % 4 == 0 {
                let raw = (1000 + i as u16 * 10).to_le_bytes();
                records.push(can_record(ts + 1, &[raw[0], raw[1], 0xFF]));
            }
        }
        // 截断的 CAN 帧：只影响这一条样本
        records.push(can_record(T0 + 20 * PERIOD_NS, &[0x01]));
        write_jsonl(&log, &records);

        let pipeline = pipeline(DRIVE_CONFIG, 2).unwrap();
        let report = pipeline.run(open(&[log])).await.unwrap();

        assert_eq!(report.stats.sources, 1);
        assert_eq!(report.stats.messages_read, 26);
        assert_eq!(report.stats.samples_rejected, 1);

        let stamp = timestamp_outcome(&report, "imu_stamp");
        assert_eq!(stamp.anomaly_count, 0);
        assert_eq!(stamp.period_s.count, 19);
        assert!((stamp.observed_frequency_hz.unwrap() - 100.0).abs() < 1e-9);
        assert!(stamp.jitter_s.unwrap() < 1e-12);

        let wheel = &report.task("wheel_speed").unwrap().result;
        assert_eq!(wheel.message_count, 6);
        assert_eq!(wheel.sample_count, 5);
        assert_eq!(wheel.error_counts.get(&SampleErrorKind::ByteRange), Some(&1));
        let AnalysisOutcome::BasicStats { stats } = &wheel.outcome else {
            panic!("expected basic stats");
        };
        assert_eq!(stats.count, 5);
        assert!((stats.min.unwrap() - 10.0).abs() < 1e-9);
        assert!((stats.max.unwrap() - 11.6).abs() < 1e-9);

        let accel = report.task("accel").unwrap();
        assert_eq!(accel.result.strategy, "none");
        assert_eq!(accel.series.len(), 20);
        assert!(accel
            .series
            .iter()
            .all(|s| s.computed_value == Number::Float(1.0)));

        let output = dir.path().join("results");
        ReportDispatcher::from_kinds(&SinkKind::ALL, &output)
            .unwrap()
            .dispatch(report)
            .await
            .unwrap();

        let markdown = fs::read_to_string(output.join(MARKDOWN_FILE)).unwrap();
        assert!(markdown.contains("## imu_stamp"));
        assert!(markdown.contains("## wheel_speed"));

        let summary: Value =
            serde_json::from_str(&fs::read_to_string(output.join(JSON_FILE)).unwrap()).unwrap();
        assert_eq!(summary["results"].as_array().unwrap().len(), 3);
        assert_eq!(summary["stats"]["messages_read"], 26);

        let wheel_csv = fs::read_to_string(output.join("wheel_speed.csv")).unwrap();
        assert!(wheel_csv.starts_with("timestamp_ns,raw_data,computed_value"));
        assert_eq!(wheel_csv.lines().count(), 6);

        let diagnostics = fs::read_to_string(output.join(DIAGNOSTICS_FILE)).unwrap();
        assert!(diagnostics.contains("wheel_speed"));
        assert!(diagnostics.contains("byte_range"));
    }

    /// 统计被拉取的消息数
    struct CountingSource {
        inner: MemorySource,
        reads: Arc<AtomicUsize>,
    }

    impl MessageSource for CountingSource {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn next_message(&mut self) -> Result<Option<MessageRecord>, ContractError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.next_message()
        }
    }

    async fn compile_and_run(
        toml: &str,
        sources: Vec<Box<dyn MessageSource>>,
    ) -> Result<RunReport, ContractError> {
        pipeline(toml, 1)?.run(sources).await
    }

    #[tokio::test]
    async fn test_compile_failure_before_reading() {
        let bad_analysis = |analysis_type: &str| {
            format!(
                r#"
[[analyses]]
id = "bad"
topic_name = "/imu"
field_names = ["header.stamp"]
parse_string = "header.stamp"
analysis_type = "{analysis_type}"
"#
            )
        };
        let mut configs: Vec<String> = ["histogram", "timestamp", "timestamp(freq:0)"]
            .into_iter()
            .map(bad_analysis)
            .collect();
        configs.push(
            r#"
[[analyses]]
id = "raw"
topic_name = "/can"
field_names = ["data"]
parse_string = "data(byte:0-3,type:int24)"
"#
            .to_string(),
        );

        for toml in &configs {
            let reads = Arc::new(AtomicUsize::new(0));
            // 被读取时会以 SourceError 结束
            let message = MessageRecord::new(
                "/imu",
                T0,
                FieldValue::structure([("header", FieldValue::Null)]),
            );
            let inner = MemorySource::new("imu", [message]).with_trailing_error("source was read");
            let source = CountingSource {
                inner,
                reads: Arc::clone(&reads),
            };

            let err = compile_and_run(toml, vec![Box::new(source)]).await.err().unwrap();
            assert!(err.is_config(), "{toml}: {err}");
            assert_eq!(reads.load(Ordering::SeqCst), 0);
        }

        let reads = Arc::new(AtomicUsize::new(0));
        let inner = MemorySource::new("imu", Vec::new());
        let source = CountingSource {
            inner,
            reads: Arc::clone(&reads),
        };
        let err = compile_and_run(&configs[3], vec![Box::new(source)])
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ContractError::Config { ref task_id, .. } if task_id == "raw"));
        assert_eq!(reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupt_line_aborts_run() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("part_1.jsonl");
        let bad = dir.path().join("part_2.jsonl");
        write_jsonl(&good, &[imu_record(T0), imu_record(T0 + PERIOD_NS)]);
        fs::write(
            &bad,
            format!("{}\n{{\"topic\": \"/imu\", \"log_time\": \n", imu_record(T0 + 2 * PERIOD_NS)),
        )
        .unwrap();

        let pipeline = pipeline(DRIVE_CONFIG, 2).unwrap();
        let err = pipeline.run(open(&[good, bad])).await.err().unwrap();
        let ContractError::Source { source_name, message } = &err else {
            panic!("expected source error, got {err}");
        };
        assert!(source_name.ends_with("part_2.jsonl"));
        assert!(message.contains("line 2"));
    }

    #[tokio::test]
    async fn test_multi_file_order() {
        let dir = tempdir().unwrap();
        let mut paths = Vec::new();
        for part in 0..3u64 {
            let path = dir.path().join(format!("drive_{part}.jsonl"));
            let records: Vec<Value> = (0..10u64)
                .map(|i| imu_record(T0 + (part * 10 + i) * PERIOD_NS))
                .collect();
            write_jsonl(&path, &records);
            paths.push(path);
        }

        let serial = pipeline(DRIVE_CONFIG, 1)
            .unwrap()
            .run(open(&paths))
            .await
            .unwrap();
        let parallel = pipeline(DRIVE_CONFIG, 3)
            .unwrap()
            .run(open(&paths))
            .await
            .unwrap();

        for report in [&serial, &parallel] {
            let stamp = timestamp_outcome(report, "imu_stamp");
            assert_eq!(stamp.anomaly_count, 0);
            assert_eq!(stamp.period_s.count, 29);
            assert_eq!(report.stats.sources, 3);
        }

        let timestamps = |report: &RunReport| -> Vec<u64> {
            report
                .task("imu_stamp")
                .unwrap()
                .series
                .iter()
                .map(|s| s.timestamp)
                .collect()
        };
        assert_eq!(timestamps(&serial), timestamps(&parallel));
        assert!(timestamps(&serial).windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_out_of_order_timestamps() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("jumpy.jsonl");
        let offsets = [0u64, 1, 3, 2, 4];
        let records: Vec<Value> = offsets
            .iter()
            .map(|o| imu_record(T0 + o * PERIOD_NS))
            .collect();
        write_jsonl(&log, &records);

        let report = pipeline(DRIVE_CONFIG, 1)
            .unwrap()
            .run(open(&[log]))
            .await
            .unwrap();

        let stamp = timestamp_outcome(&report, "imu_stamp");
        assert_eq!(stamp.anomaly_count, 1);
        assert_eq!(stamp.period_s.count, offsets.len() as u64 - 2);
        // 单个异常不会让整个任务失败
        assert_eq!(report.task("imu_stamp").unwrap().result.sample_count, 5);
    }

    #[tokio::test]
    async fn test_basic_stats_over_jsonl() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("values.jsonl");
        let records: Vec<Value> = (1..=5)
            .map(|v| json!({"topic": "/v", "log_time": v, "message": {"value": v}}))
            .collect();
        write_jsonl(&log, &records);

        let report = pipeline(
            r#"
[[analyses]]
id = "v"
topic_name = "/v"
field_names = ["value"]
parse_string = "value"
analysis_type = "basic_stats"
"#,
            1,
        )
        .unwrap()
        .run(open(&[log]))
        .await
        .unwrap();

        let AnalysisOutcome::BasicStats { stats } = &report.tasks[0].result.outcome else {
            panic!("expected basic stats");
        };
        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean, Some(3.0));
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(5.0));
        assert!((stats.std_dev.unwrap() - 2f64.sqrt()).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_float64_from_inline_bytes() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("raw.jsonl");
        let value = -1234.5678f64;
        let mut frame = vec![0xAA, 0xBB];
        frame.extend_from_slice(&value.to_le_bytes());
        write_jsonl(&log, &[can_record(T0, &frame)]);

        let report = pipeline(
            r#"
[[analyses]]
id = "raw"
topic_name = "/can"
field_names = ["data"]
parse_string = "data(byte:2-8,type:float64)"
"#,
            1,
        )
        .unwrap()
        .run(open(&[log]))
        .await
        .unwrap();

        let series = &report.tasks[0].series;
        assert_eq!(series.len(), 1);
        let sample = series.iter().next().unwrap();
        assert_eq!(sample.computed_value, Number::Float(value));
        assert_eq!(sample.timestamp, T0);
    }
}
