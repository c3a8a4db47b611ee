#![allow(dead_code)]
// Shared mocks. Each mock is a cheap handle onto shared state so a test can
// hand one copy to the engine and keep another for inspection.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use hs_core::{
    AppMonEntry, AppName, EventId, EventMonEntry, EventRecord, HsError, HsResult,
    MessageActionEntry, MsgActState, ResetCounters, Severity,
};
use hs_engine::governor::ResetGovernor;
use hs_engine::msg_action::MessageActions;
use hs_engine::{ActionContext, Platform};
use hs_hal::{
    AppControl, AppHandle, CounterStorage, EventSink, MessageBus, ProcessorControl, TableService,
    TableUpdate, UtilizationSource,
};

pub const RESET_DELAY_MS: u32 = 50;

// --- Notifications ---

#[derive(Debug, Clone)]
pub struct Note {
    pub severity: Severity,
    pub id: EventId,
    pub text: String,
}

#[derive(Clone, Default)]
pub struct RecordingSink(pub Rc<RefCell<Vec<Note>>>);

impl RecordingSink {
    pub fn count(&self, id: EventId) -> usize {
        self.0.borrow().iter().filter(|n| n.id == id).count()
    }
    pub fn with_id(&self, id: EventId) -> Vec<Note> {
        self.0.borrow().iter().filter(|n| n.id == id).cloned().collect()
    }
    pub fn ids(&self) -> Vec<EventId> {
        self.0.borrow().iter().map(|n| n.id).collect()
    }
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl EventSink for RecordingSink {
    fn notify(&mut self, severity: Severity, id: EventId, text: core::fmt::Arguments<'_>) {
        self.0.borrow_mut().push(Note { severity, id, text: text.to_string() });
    }
}

// --- Applications ---

#[derive(Default)]
pub struct AppsState {
    pub apps: Vec<(String, u32)>,
    pub counter_fails: bool,
    pub restart_error: Option<HsError>,
    pub delete_error: Option<HsError>,
    pub restarted: Vec<String>,
    pub deleted: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MockApps(pub Rc<RefCell<AppsState>>);

impl MockApps {
    pub fn add(&self, name: &str, counter: u32) {
        self.0.borrow_mut().apps.push((name.to_string(), counter));
    }
    /// The application checked in.
    pub fn bump(&self, name: &str) {
        let mut state = self.0.borrow_mut();
        if let Some(app) = state.apps.iter_mut().find(|(n, _)| n == name) {
            app.1 += 1;
        }
    }
}

impl AppControl for MockApps {
    fn resolve(&mut self, name: &AppName) -> HsResult<AppHandle> {
        self.0
            .borrow()
            .apps
            .iter()
            .position(|(n, _)| n == name.as_str())
            .map(|i| AppHandle(i as u32))
            .ok_or(HsError::NotFound)
    }
    fn execution_counter(&mut self, handle: AppHandle) -> HsResult<u32> {
        let state = self.0.borrow();
        if state.counter_fails {
            return Err(HsError::HalError);
        }
        Ok(state.apps[handle.0 as usize].1)
    }
    fn restart(&mut self, handle: AppHandle) -> HsResult<()> {
        let mut state = self.0.borrow_mut();
        if let Some(e) = state.restart_error {
            return Err(e);
        }
        let name = state.apps[handle.0 as usize].0.clone();
        state.restarted.push(name);
        Ok(())
    }
    fn delete(&mut self, handle: AppHandle) -> HsResult<()> {
        let mut state = self.0.borrow_mut();
        if let Some(e) = state.delete_error {
            return Err(e);
        }
        let name = state.apps[handle.0 as usize].0.clone();
        state.deleted.push(name);
        Ok(())
    }
}

// --- Bus ---

#[derive(Default)]
pub struct BusState {
    pub sent: Vec<Vec<u8>>,
    pub inbox: VecDeque<Result<EventRecord, HsError>>,
}

#[derive(Clone, Default)]
pub struct MockBus(pub Rc<RefCell<BusState>>);

impl MockBus {
    pub fn sent(&self) -> usize {
        self.0.borrow().sent.len()
    }
    pub fn push_event(&self, app: &str, event_id: u16) {
        let record = EventRecord::new(AppName::new(app).unwrap(), event_id);
        self.0.borrow_mut().inbox.push_back(Ok(record));
    }
    pub fn push_garbage(&self) {
        self.0.borrow_mut().inbox.push_back(Err(HsError::WireFormatError));
    }
}

impl MessageBus for MockBus {
    fn send(&mut self, message: &[u8]) -> nb::Result<usize, HsError> {
        self.0.borrow_mut().sent.push(message.to_vec());
        Ok(message.len())
    }
    fn receive_event(&mut self) -> nb::Result<EventRecord, HsError> {
        match self.0.borrow_mut().inbox.pop_front() {
            Some(Ok(record)) => Ok(record),
            Some(Err(e)) => Err(nb::Error::Other(e)),
            None => Err(nb::Error::WouldBlock),
        }
    }
}

// --- Durable storage ---

#[derive(Default)]
pub struct StorageState {
    pub stored: Option<ResetCounters>,
    pub load_error: Option<HsError>,
    pub writes: usize,
}

#[derive(Clone, Default)]
pub struct MockStorage(pub Rc<RefCell<StorageState>>);

impl MockStorage {
    pub fn holding(counters: ResetCounters) -> Self {
        let storage = Self::default();
        storage.0.borrow_mut().stored = Some(counters);
        storage
    }
    pub fn writes(&self) -> usize {
        self.0.borrow().writes
    }
    pub fn stored(&self) -> Option<ResetCounters> {
        self.0.borrow().stored
    }
}

impl CounterStorage for MockStorage {
    fn load(&mut self) -> HsResult<Option<ResetCounters>> {
        let state = self.0.borrow();
        match state.load_error {
            Some(e) => Err(e),
            None => Ok(state.stored),
        }
    }
    fn store(&mut self, counters: &ResetCounters) -> HsResult<()> {
        let mut state = self.0.borrow_mut();
        state.stored = Some(*counters);
        state.writes += 1;
        Ok(())
    }
}

// --- CPU ---

#[derive(Clone, Default)]
pub struct MockCpu(pub Rc<RefCell<VecDeque<Option<u32>>>>);

impl MockCpu {
    pub fn feed(&self, samples: &[Option<u32>]) {
        self.0.borrow_mut().extend(samples.iter().copied());
    }
}

impl UtilizationSource for MockCpu {
    fn sample(&mut self) -> Option<u32> {
        self.0.borrow_mut().pop_front().flatten()
    }
}

// --- Processor ---

#[derive(Default)]
pub struct ProcessorState {
    pub serviced: usize,
    pub watchdog_disabled: bool,
    pub delays: Vec<u32>,
    pub resets: usize,
}

#[derive(Clone, Default)]
pub struct MockProcessor(pub Rc<RefCell<ProcessorState>>);

impl MockProcessor {
    pub fn resets(&self) -> usize {
        self.0.borrow().resets
    }
}

impl ProcessorControl for MockProcessor {
    fn service_watchdog(&mut self) {
        self.0.borrow_mut().serviced += 1;
    }
    fn disable_watchdog(&mut self) {
        self.0.borrow_mut().watchdog_disabled = true;
    }
    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().delays.push(ms);
    }
    // Records instead of resetting so the scan can be observed afterwards.
    fn processor_reset(&mut self) {
        self.0.borrow_mut().resets += 1;
    }
}

// --- Tables ---

#[derive(Clone, Default)]
pub struct MockTables(pub Rc<RefCell<Option<TableUpdate>>>);

impl MockTables {
    pub fn publish(&self, update: TableUpdate) {
        *self.0.borrow_mut() = Some(update);
    }
    pub fn publish_amt(&self, rows: Vec<AppMonEntry>) {
        self.publish(TableUpdate { app_monitor: Some(rows.into()), ..Default::default() });
    }
}

impl TableService for MockTables {
    fn poll_update(&mut self) -> Option<TableUpdate> {
        self.0.borrow_mut().take()
    }
}

// --- Rig ---

/// All collaborators plus the shared responders a monitor needs.
pub struct Rig {
    pub apps: MockApps,
    pub bus: MockBus,
    pub storage: MockStorage,
    pub cpu: MockCpu,
    pub processor: MockProcessor,
    pub sink: RecordingSink,
    pub tables: MockTables,
    pub governor: ResetGovernor,
    pub msg_actions: MessageActions,
    pub msg_table: Vec<MessageActionEntry>,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_storage(MockStorage::holding(ResetCounters::new(0, 3)))
    }

    pub fn with_storage(mut storage: MockStorage) -> Self {
        let mut sink = RecordingSink::default();
        let governor = ResetGovernor::load(&mut storage, &mut sink, 3);
        Self {
            apps: MockApps::default(),
            bus: MockBus::default(),
            storage,
            cpu: MockCpu::default(),
            processor: MockProcessor::default(),
            sink,
            tables: MockTables::default(),
            governor,
            msg_actions: MessageActions::new(true),
            msg_table: Vec::new(),
        }
    }

    pub fn cx(&mut self) -> ActionContext<'_> {
        ActionContext {
            apps: &mut self.apps,
            bus: &mut self.bus,
            storage: &mut self.storage,
            processor: &mut self.processor,
            sink: &mut self.sink,
            governor: &mut self.governor,
            msg_actions: &mut self.msg_actions,
            msg_table: &self.msg_table,
            reset_delay_ms: RESET_DELAY_MS,
        }
    }

    pub fn platform(&self) -> Platform {
        Platform {
            apps: Box::new(self.apps.clone()),
            bus: Box::new(self.bus.clone()),
            storage: Box::new(self.storage.clone()),
            cpu: Box::new(self.cpu.clone()),
            processor: Box::new(self.processor.clone()),
            sink: Box::new(self.sink.clone()),
            tables: Box::new(self.tables.clone()),
        }
    }
}

pub fn amt(name: &str, cycle_count: u16, action_code: u16) -> AppMonEntry {
    AppMonEntry::new(name, cycle_count, action_code).unwrap()
}

pub fn emt(name: &str, event_id: u16, action_code: u16) -> EventMonEntry {
    EventMonEntry::new(name, event_id, action_code).unwrap()
}

pub fn mat(state: MsgActState, cooldown: u16, payload: &[u8]) -> MessageActionEntry {
    MessageActionEntry::new(state, cooldown, payload).unwrap()
}
