#![no_std]
extern crate alloc;
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use log::{debug, info};

use hs_core::{AppMonEntry, EventId, EventMonEntry, EventRecord, HsResult, MessageActionEntry, Severity};
use hs_hal::{
    AppControl, CounterStorage, EventSink, MessageBus, ProcessorControl, TableService,
    UtilizationSource,
};

pub mod app_mon;
pub mod cooldown;
pub mod cpu;
pub mod event_mon;
pub mod governor;
pub mod msg_action;

use app_mon::{AppMonitor, ENABLE_WORDS};
use cpu::{UtilizationConfig, UtilizationTracker};
use event_mon::EventMonitor;
use governor::{ResetGovernor, ResetOutcome};
use msg_action::{DispatchOutcome, MessageActions, MonitorContext};

/// Upper bound on event messages drained in one cycle.
pub const MAX_EVENTS_PER_CYCLE: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub app_monitor_enabled: bool,
    pub event_monitor_enabled: bool,
    pub cpu_hogging_enabled: bool,
    pub message_actions_enabled: bool,
    /// Max resets used when the durable counters are missing or corrupt.
    pub default_max_resets: u16,
    /// Pause before a processor reset so queued notifications flush.
    pub reset_delay_ms: u32,
    pub utilization: UtilizationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_monitor_enabled: true,
            event_monitor_enabled: true,
            cpu_hogging_enabled: true,
            message_actions_enabled: true,
            default_max_resets: 3,
            reset_delay_ms: 50,
            utilization: UtilizationConfig::default(),
        }
    }
}

/// Everything the engine talks to.
pub struct Platform {
    pub apps: Box<dyn AppControl>,
    pub bus: Box<dyn MessageBus>,
    pub storage: Box<dyn CounterStorage>,
    pub cpu: Box<dyn UtilizationSource>,
    pub processor: Box<dyn ProcessorControl>,
    pub sink: Box<dyn EventSink>,
    pub tables: Box<dyn TableService>,
}

/// Collaborators and shared responders lent to a monitor for one scan.
pub struct ActionContext<'a> {
    pub apps: &'a mut dyn AppControl,
    pub bus: &'a mut dyn MessageBus,
    pub storage: &'a mut dyn CounterStorage,
    pub processor: &'a mut dyn ProcessorControl,
    pub sink: &'a mut dyn EventSink,
    pub governor: &'a mut ResetGovernor,
    pub msg_actions: &'a mut MessageActions,
    pub msg_table: &'a [MessageActionEntry],
    pub reset_delay_ms: u32,
}

impl ActionContext<'_> {
    pub fn processor_reset(&mut self) -> ResetOutcome {
        self.governor.escalate(
            &mut *self.storage,
            &mut *self.processor,
            &mut *self.sink,
            self.reset_delay_ms,
        )
    }

    pub fn message_action(&mut self, index: usize, context: &MonitorContext<'_>) -> DispatchOutcome {
        self.msg_actions.dispatch(self.msg_table, index, context, &mut *self.bus, &mut *self.sink)
    }
}

/// Telemetry view of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Housekeeping {
    pub app_monitor_enabled: bool,
    pub event_monitor_enabled: bool,
    pub cpu_hogging_enabled: bool,
    pub message_actions_enabled: bool,
    pub resets_performed: u16,
    pub max_resets: u16,
    pub events_monitored: u32,
    pub invalid_events: u32,
    pub msg_acts_executed: u16,
    pub utilization_average: u32,
    pub utilization_peak: u32,
    pub app_monitor_enables: [u32; ENABLE_WORDS],
    pub cycles: u32,
}

/// Split the engine into the monitor being run and the context it acts through.
macro_rules! action_context {
    ($engine:ident) => {
        ActionContext {
            apps: &mut *$engine.platform.apps,
            bus: &mut *$engine.platform.bus,
            storage: &mut *$engine.platform.storage,
            processor: &mut *$engine.platform.processor,
            sink: &mut *$engine.platform.sink,
            governor: &mut $engine.governor,
            msg_actions: &mut $engine.msg_actions,
            msg_table: &$engine.mat,
            reset_delay_ms: $engine.config.reset_delay_ms,
        }
    };
}

/// The Health & Safety engine. One call to `run_cycle` per processing cycle.
pub struct HsEngine {
    platform: Platform,
    config: EngineConfig,

    amt: Arc<[AppMonEntry]>,
    emt: Arc<[EventMonEntry]>,
    mat: Arc<[MessageActionEntry]>,

    app_monitor: AppMonitor,
    event_monitor: EventMonitor,
    msg_actions: MessageActions,
    utilization: UtilizationTracker,
    governor: ResetGovernor,

    cycles: u32,
}

impl HsEngine {
    pub fn new(mut platform: Platform, config: EngineConfig) -> HsResult<Self> {
        config.utilization.validate()?;
        let governor = ResetGovernor::load(
            &mut *platform.storage,
            &mut *platform.sink,
            config.default_max_resets,
        );

        info!(
            ">>> [HS] ENGINE UP: resets {}/{}",
            governor.resets_performed(),
            governor.max_resets()
        );

        let mut engine = Self {
            platform,
            config,
            amt: Arc::from(Vec::new()),
            emt: Arc::from(Vec::new()),
            mat: Arc::from(Vec::new()),
            app_monitor: AppMonitor::new(config.app_monitor_enabled),
            event_monitor: EventMonitor::new(config.event_monitor_enabled),
            msg_actions: MessageActions::new(config.message_actions_enabled),
            utilization: UtilizationTracker::new(config.utilization, config.cpu_hogging_enabled),
            governor,
            cycles: 0,
        };
        engine.reacquire_tables();
        Ok(engine)
    }

    /// One processing cycle. Fixed order: tables, watchdog, cooldowns,
    /// CPU, application scan, queued events.
    pub fn run_cycle(&mut self) {
        self.reacquire_tables();
        self.platform.processor.service_watchdog();

        self.msg_actions.tick();
        self.utilization
            .on_cycle(&mut *self.platform.cpu, &mut *self.platform.sink);

        if self.app_monitor.is_enabled() {
            let amt = self.amt.clone();
            let mut cx = action_context!(self);
            self.app_monitor.scan(&amt, &mut cx);
        }

        self.drain_events();
        self.cycles = self.cycles.wrapping_add(1);
    }

    /// Run one event message through the Event Monitor.
    pub fn monitor_event(&mut self, record: &EventRecord) {
        let emt = self.emt.clone();
        let mut cx = action_context!(self);
        self.event_monitor.monitor_event(&emt, record, &mut cx);
    }

    fn drain_events(&mut self) {
        for _ in 0..MAX_EVENTS_PER_CYCLE {
            match self.platform.bus.receive_event() {
                Ok(record) => self.monitor_event(&record),
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => {
                    debug!("Dropped undecodable event message: {:?}", e);
                    self.event_monitor.note_invalid();
                }
            }
        }
    }

    /// The single reacquisition point for table contents.
    fn reacquire_tables(&mut self) {
        let update = match self.platform.tables.poll_update() {
            Some(update) if !update.is_empty() => update,
            _ => return,
        };
        if let Some(amt) = update.app_monitor {
            self.app_monitor.reload(&self.amt, &amt);
            self.amt = amt;
            self.table_loaded("Application Monitor", self.amt.len());
        }
        if let Some(emt) = update.event_monitor {
            self.emt = emt;
            self.table_loaded("Event Monitor", self.emt.len());
        }
        if let Some(mat) = update.message_actions {
            self.mat = mat;
            self.msg_actions.reset_cooldowns();
            self.table_loaded("Message Actions", self.mat.len());
        }
    }

    fn table_loaded(&mut self, which: &str, rows: usize) {
        info!("[HS] {} table loaded ({} rows)", which, rows);
        self.platform.sink.notify(
            Severity::Debug,
            EventId::TableLoaded,
            format_args!("{} table loaded: {} rows", which, rows),
        );
    }

    // --- Commands ---

    /// Enabling always refreshes every slot.
    pub fn enable_app_monitor(&mut self) {
        self.app_monitor.refresh(&self.amt);
        self.app_monitor.set_enabled(true);
        self.ack(EventId::AppMonEnabled, "Application Monitoring Enabled");
    }

    pub fn disable_app_monitor(&mut self) {
        self.app_monitor.set_enabled(false);
        self.ack(EventId::AppMonDisabled, "Application Monitoring Disabled");
    }

    /// Re-arm every monitored slot without changing the enable state.
    pub fn refresh_app_status(&mut self) {
        self.app_monitor.refresh(&self.amt);
    }

    pub fn enable_event_monitor(&mut self) {
        self.event_monitor.set_enabled(true);
        self.ack(EventId::EventMonEnabled, "Event Monitoring Enabled");
    }

    pub fn disable_event_monitor(&mut self) {
        self.event_monitor.set_enabled(false);
        self.ack(EventId::EventMonDisabled, "Event Monitoring Disabled");
    }

    pub fn enable_cpu_hogging(&mut self) {
        self.utilization.set_hogging_enabled(true);
        self.ack(EventId::CpuHogEnabled, "CPU Hogging Indicator Enabled");
    }

    pub fn disable_cpu_hogging(&mut self) {
        self.utilization.set_hogging_enabled(false);
        self.ack(EventId::CpuHogDisabled, "CPU Hogging Indicator Disabled");
    }

    pub fn enable_message_actions(&mut self) {
        self.msg_actions.set_enabled(true);
        self.ack(EventId::MsgActsEnabled, "Message Actions Enabled");
    }

    pub fn disable_message_actions(&mut self) {
        self.msg_actions.set_enabled(false);
        self.ack(EventId::MsgActsDisabled, "Message Actions Disabled");
    }

    pub fn reset_resets_performed(&mut self) {
        self.governor.clear_resets(&mut *self.platform.storage);
        self.ack(EventId::ResetsCleared, "Processor Resets Performed by HS Counter has been Reset");
    }

    pub fn set_max_resets(&mut self, max_resets: u16) {
        self.governor.set_max_resets(&mut *self.platform.storage, max_resets);
        self.platform.sink.notify(
            Severity::Debug,
            EventId::MaxResetsSet,
            format_args!("Max Resets Performable by HS has been set to {}", max_resets),
        );
    }

    fn ack(&mut self, id: EventId, text: &str) {
        self.platform
            .sink
            .notify(Severity::Debug, id, format_args!("{}", text));
    }

    // --- Telemetry ---

    pub fn housekeeping(&self) -> Housekeeping {
        Housekeeping {
            app_monitor_enabled: self.app_monitor.is_enabled(),
            event_monitor_enabled: self.event_monitor.is_enabled(),
            cpu_hogging_enabled: self.utilization.hogging_enabled(),
            message_actions_enabled: self.msg_actions.is_enabled(),
            resets_performed: self.governor.resets_performed(),
            max_resets: self.governor.max_resets(),
            events_monitored: self.event_monitor.events_monitored(),
            invalid_events: self.event_monitor.invalid_events(),
            msg_acts_executed: self.msg_actions.executed(),
            utilization_average: self.utilization.average(),
            utilization_peak: self.utilization.peak(),
            app_monitor_enables: self.app_monitor.enable_bits(),
            cycles: self.cycles,
        }
    }

    pub fn app_monitor(&self) -> &AppMonitor {
        &self.app_monitor
    }

    pub fn event_monitor(&self) -> &EventMonitor {
        &self.event_monitor
    }

    pub fn message_actions(&self) -> &MessageActions {
        &self.msg_actions
    }

    pub fn utilization(&self) -> &UtilizationTracker {
        &self.utilization
    }

    pub fn governor(&self) -> &ResetGovernor {
        &self.governor
    }
}
