use std::fs::File;
use std::io::Write;
use std::time::{Duration, SystemTime};

use hs_core::{AppAction, EventAction, MsgActState};
use hs_hal::TableService;
use hs_linux::{FileTables, TableFile};

const NODE_FILE: &str = r#"
[engine]
max_resets = 5
cpu_hogging = false
average_window = 8

[[app_monitor]]
name = "SCH"
cycle_count = 10
action = 2

[[app_monitor]]
name = "SPARE"
cycle_count = 0
action = 0

[[event_monitor]]
app_name = "CI"
event_id = 12
action = 4

[[message_action]]
state = 1
cooldown = 10
message = [0x18, 0x99, 0xC0, 0x00]

[[process]]
name = "SCH"
command = "/bin/sleep"
args = ["60"]
"#;

#[test]
fn test_parse_full_file() {
    let file = TableFile::parse(NODE_FILE).unwrap();

    let amt = file.app_monitor_table().unwrap();
    assert_eq!(amt.len(), 2);
    assert_eq!(amt[0].name.as_str(), "SCH");
    assert_eq!(amt[0].action, AppAction::AppRestart);

    let emt = file.event_monitor_table().unwrap();
    assert_eq!(emt[0].action, EventAction::MessageAction(0));

    let mat = file.message_action_table().unwrap();
    assert_eq!(mat[0].state, MsgActState::Enabled);
    assert_eq!(mat[0].payload.as_slice(), &[0x18, 0x99, 0xC0, 0x00]);

    let procs = file.processes().unwrap();
    assert_eq!(procs[0].args, vec!["60".to_string()]);
}

#[test]
fn test_engine_overrides() {
    let config = TableFile::parse(NODE_FILE).unwrap().engine_config();

    assert_eq!(config.default_max_resets, 5);
    assert!(!config.cpu_hogging_enabled);
    assert!(config.app_monitor_enabled);
    assert_eq!(config.utilization.average_window, 8);
    assert_eq!(config.utilization.hogging_threshold, 9_900);
}

#[test]
fn test_bad_rows_rejected() {
    let invalid_action = TableFile::parse(
        "[[app_monitor]]\nname = \"A\"\ncycle_count = 3\naction = 99\n",
    )
    .unwrap();
    assert!(invalid_action.app_monitor_table().is_err());

    let empty_payload = TableFile::parse("[[message_action]]\nstate = 1\nmessage = []\n").unwrap();
    assert!(empty_payload.message_action_table().is_err());

    let bad_state = TableFile::parse("[[message_action]]\nstate = 7\nmessage = [1]\n").unwrap();
    assert!(bad_state.message_action_table().is_err());

    let long_name = TableFile::parse(
        "[[event_monitor]]\napp_name = \"ABCDEFGHIJKLMNOPQRSTUVWXYZ\"\nevent_id = 1\naction = 1\n",
    )
    .unwrap();
    assert!(long_name.event_monitor_table().is_err());
}

#[test]
fn test_too_many_rows_rejected() {
    let text: String = (0..17)
        .map(|i| format!("[[event_monitor]]\napp_name = \"A{}\"\nevent_id = 1\naction = 0\n", i))
        .collect();
    let file = TableFile::parse(&text).unwrap();

    assert!(file.event_monitor_table().is_err());
}

#[test]
fn test_unknown_keys_rejected() {
    assert!(TableFile::parse("[engine]\nmax_reset = 3\n").is_err());
}

#[test]
fn test_file_tables_reload_on_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hs.toml");
    std::fs::write(&path, NODE_FILE).unwrap();
    let mut tables = FileTables::new(&path);

    let first = tables.poll_update().expect("initial load");
    assert_eq!(first.app_monitor.unwrap().len(), 2);
    assert!(tables.poll_update().is_none());

    // Broken edit: rejected, nothing published.
    let mut f = File::create(&path).unwrap();
    f.write_all(b"[[app_monitor]]\nname = \"X\"\ncycle_count = 1\naction = 500\n").unwrap();
    f.set_modified(SystemTime::now() + Duration::from_secs(10)).unwrap();
    drop(f);
    assert!(tables.poll_update().is_none());

    let mut f = File::create(&path).unwrap();
    f.write_all(b"[[app_monitor]]\nname = \"X\"\ncycle_count = 1\naction = 3\n").unwrap();
    f.set_modified(SystemTime::now() + Duration::from_secs(20)).unwrap();
    drop(f);
    let update = tables.poll_update().expect("reload");
    assert_eq!(update.app_monitor.unwrap()[0].name.as_str(), "X");
    assert_eq!(update.message_actions.unwrap().len(), 0);
}

#[test]
fn test_missing_file_publishes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut tables = FileTables::new(dir.path().join("absent.toml"));

    assert!(tables.poll_update().is_none());
}
