use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

use hs_core::{
    validate_app_monitor_table, validate_event_monitor_table, validate_message_action_table,
    AppMonEntry, AppName, EventMonEntry, MessageActionEntry, MsgActState, TableValidation,
};
use hs_engine::EngineConfig;

use crate::process::ProcessSpec;

/// The node's table file.
///
/// ```toml
/// [engine]
/// max_resets = 3
///
/// [[app_monitor]]
/// name = "SCH"
/// cycle_count = 10
/// action = 2
///
/// [[event_monitor]]
/// app_name = "CI"
/// event_id = 12
/// action = 4
///
/// [[message_action]]
/// state = 1
/// cooldown = 10
/// message = [0x18, 0x99, 0xC0, 0x00]
///
/// [[process]]
/// name = "SCH"
/// command = "/usr/bin/sch"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableFile {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub app_monitor: Vec<AppMonRow>,
    #[serde(default)]
    pub event_monitor: Vec<EventMonRow>,
    #[serde(default)]
    pub message_action: Vec<MessageActionRow>,
    #[serde(default)]
    pub process: Vec<ProcessRow>,
}

/// Overrides for `EngineConfig`. Anything absent keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    pub app_monitor: Option<bool>,
    pub event_monitor: Option<bool>,
    pub cpu_hogging: Option<bool>,
    pub message_actions: Option<bool>,
    pub max_resets: Option<u16>,
    pub reset_delay_ms: Option<u32>,
    pub cycles_per_interval: Option<u32>,
    pub average_window: Option<usize>,
    pub hogging_threshold: Option<u32>,
    pub max_hogging_intervals: Option<u32>,
}

impl EngineSection {
    pub fn apply(&self, config: &mut EngineConfig) {
        let util = &mut config.utilization;
        if let Some(v) = self.app_monitor { config.app_monitor_enabled = v; }
        if let Some(v) = self.event_monitor { config.event_monitor_enabled = v; }
        if let Some(v) = self.cpu_hogging { config.cpu_hogging_enabled = v; }
        if let Some(v) = self.message_actions { config.message_actions_enabled = v; }
        if let Some(v) = self.max_resets { config.default_max_resets = v; }
        if let Some(v) = self.reset_delay_ms { config.reset_delay_ms = v; }
        if let Some(v) = self.cycles_per_interval { util.cycles_per_interval = v; }
        if let Some(v) = self.average_window { util.average_window = v; }
        if let Some(v) = self.hogging_threshold { util.hogging_threshold = v; }
        if let Some(v) = self.max_hogging_intervals { util.max_hogging_intervals = v; }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppMonRow {
    pub name: String,
    pub cycle_count: u16,
    pub action: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventMonRow {
    pub app_name: String,
    pub event_id: u16,
    pub action: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageActionRow {
    pub state: u8,
    #[serde(default)]
    pub cooldown: u16,
    pub message: Vec<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessRow {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

fn check(which: &str, verdict: TableValidation) -> anyhow::Result<()> {
    if let Some(row) = verdict.first_bad {
        bail!("{} table: {} bad rows, first at row {}", which, verdict.bad, row);
    }
    log::debug!(
        "{} table: {} good, {} unused",
        which, verdict.good, verdict.unused
    );
    Ok(())
}

impl TableFile {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        self.engine.apply(&mut config);
        config
    }

    pub fn app_monitor_table(&self) -> anyhow::Result<Vec<AppMonEntry>> {
        let rows = self
            .app_monitor
            .iter()
            .map(|r| AppMonEntry::new(&r.name, r.cycle_count, r.action))
            .collect::<Result<Vec<_>, _>>()?;
        check("Application Monitor", validate_app_monitor_table(&rows)?)?;
        Ok(rows)
    }

    pub fn event_monitor_table(&self) -> anyhow::Result<Vec<EventMonEntry>> {
        let rows = self
            .event_monitor
            .iter()
            .map(|r| EventMonEntry::new(&r.app_name, r.event_id, r.action))
            .collect::<Result<Vec<_>, _>>()?;
        check("Event Monitor", validate_event_monitor_table(&rows)?)?;
        Ok(rows)
    }

    pub fn message_action_table(&self) -> anyhow::Result<Vec<MessageActionEntry>> {
        let rows = self
            .message_action
            .iter()
            .map(|r| MessageActionEntry::new(MsgActState::decode(r.state)?, r.cooldown, &r.message))
            .collect::<Result<Vec<_>, _>>()?;
        check("Message Actions", validate_message_action_table(&rows)?)?;
        Ok(rows)
    }

    pub fn processes(&self) -> anyhow::Result<Vec<ProcessSpec>> {
        self.process
            .iter()
            .map(|r| -> anyhow::Result<ProcessSpec> {
                Ok(ProcessSpec {
                    name: AppName::new(&r.name)?,
                    command: r.command.clone(),
                    args: r.args.clone(),
                })
            })
            .collect()
    }
}
