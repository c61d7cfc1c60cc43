//! End-to-end pipeline runs against a scripted API and a temp output dir.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;

use chrono::Utc;
use r2b2_extractor::config::load_config;
use r2b2_extractor::data::{StatsApi, StatsRequest};
use r2b2_extractor::domain::Endpoint;
use r2b2_extractor::error::AppError;
use r2b2_extractor::io::CsvSink;
use r2b2_extractor::pipeline::{Extractor, plan_windows};

struct ScriptedApi {
    bodies: RefCell<VecDeque<String>>,
    calls: RefCell<Vec<(Endpoint, StatsRequest)>>,
}

impl ScriptedApi {
    fn new(bodies: Vec<String>) -> Self {
        Self {
            bodies: RefCell::new(bodies.into()),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl StatsApi for ScriptedApi {
    fn access_token(&self, _scope: &str) -> Result<String, AppError> {
        Ok("token".to_string())
    }

    fn post_stats(&self, endpoint: Endpoint, request: &StatsRequest, _token: &str) -> Result<String, AppError> {
        self.calls.borrow_mut().push((endpoint, request.clone()));
        self.bodies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| AppError::remote("script exhausted"))
    }
}

fn write_config(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("config.json");
    fs::write(&path, body).unwrap();
    path
}

const FIXED_CONFIG: &str = r##"{
    "parameters": {
        "date_type": "fixed",
        "from": "2024-01-01",
        "to": "2024-01-03",
        "endpoints": ["stats"],
        "credentials": { "client_id": "publisher", "#client_secret": "secret" },
        "display_custom_name": true,
        "retry": { "max_attempts": 3, "delay_seconds": 0 }
    }
}"##;

const STATS_BODY: &str = r#"{"status":"ok","payload":[
    {"day":"2024-01-01","website":"example.cz","placement":"top","impressions":120,"revenue":1.5},
    {"day":"2024-01-02","website":"example.cz","placement":"top","impressions":80,"revenue":0.75}
]}"#;

#[test]
fn fixed_window_rerun_appends_duplicate_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let config_path = write_config(tmp.path(), FIXED_CONFIG);
    let out_dir = tmp.path().join("output");

    for _ in 0..2 {
        let config = load_config(&config_path).unwrap();
        let windows = plan_windows(&config.date_range, Utc::now()).unwrap();
        assert_eq!(windows.len(), 1);

        let api = ScriptedApi::new(vec![STATS_BODY.to_string()]);
        let extractor = Extractor::new(&api, config, CsvSink::new(&out_dir));
        let summary = extractor.run(&windows).unwrap();
        assert_eq!(summary.rows, 2);

        let calls = api.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.from, "2024-01-01T00:00:00.000Z");
        assert_eq!(calls[0].1.to, "2024-01-04T00:00:00.000Z");
        assert_eq!(calls[0].1.display_custom_name, Some(true));
    }

    let text = fs::read_to_string(out_dir.join("stats.csv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[0],
        "day,website,placement,impressions,revenue,date_from,date_to"
    );
    let row = "2024-01-01,example.cz,top,120,1.5,2024-01-01T00:00:00.000Z,2024-01-04T00:00:00.000Z";
    assert_eq!(lines[1], row);
    assert_eq!(lines[3], row);
    assert_eq!(lines[2], lines[4]);
}

#[test]
fn backfill_writes_one_append_per_day() {
    let tmp = tempfile::tempdir().unwrap();
    let config_path = write_config(
        tmp.path(),
        r##"{
            "parameters": {
                "date_type": "backfill",
                "date_interval": 3,
                "include_today": false,
                "endpoints": ["private-deals"],
                "credentials": { "client_id": "publisher", "#client_secret": "secret" }
            }
        }"##,
    );
    let out_dir = tmp.path().join("output");

    let config = load_config(&config_path).unwrap();
    let windows = plan_windows(&config.date_range, Utc::now()).unwrap();
    assert_eq!(windows.len(), 3);

    let bodies = vec![
        r#"{"status":"ok","payload":[{"deal_id":"d-1","buyer":"b","revenue":3}]}"#.to_string(),
        r#"{"status":"ok","payload":[]}"#.to_string(),
        r#"{"status":"ok","payload":[{"deal_id":"d-2","buyer":"b","revenue":4}]}"#.to_string(),
    ];
    let api = ScriptedApi::new(bodies);
    let extractor = Extractor::new(&api, config, CsvSink::new(&out_dir));
    let summary = extractor.run(&windows).unwrap();
    assert_eq!(summary.extractions, 3);
    assert_eq!(summary.empty, 1);
    assert_eq!(summary.rows, 2);

    let calls = api.calls.borrow();
    assert!(calls.iter().all(|(e, r)| *e == Endpoint::PrivateDeals && r.display_custom_name.is_none()));
    assert_eq!(calls[0].1.from, calls[1].1.to);
    assert_eq!(calls[1].1.from, calls[2].1.to);

    let text = fs::read_to_string(out_dir.join("private-deals.csv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "deal_id,buyer,revenue,date_from,date_to");
    assert!(lines[1].starts_with("d-1,b,3,"));
    assert!(lines[2].starts_with("d-2,b,4,"));
    assert!(!out_dir.join("stats.csv").exists());
}

#[test]
fn missing_config_fails_before_any_request() {
    let tmp = tempfile::tempdir().unwrap();
    let err = load_config(&tmp.path().join("nope.json")).unwrap_err();
    assert_eq!(err.exit_code(), r2b2_extractor::error::EXIT_CONFIG);
}
