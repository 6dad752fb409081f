use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::Instant;

/// Key/string store shared with the backend.
pub trait WidgetStateManager {
    fn get_string_value(&self, widget_id: &str) -> Option<String>;

    fn set_string_value(
        &mut self,
        widget_id: &str,
        value: String,
        from_ui: bool,
        fragment_id: Option<&str>,
    );
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WidgetWrite {
    pub widget_id: String,
    pub value: String,
    pub from_ui: bool,
    pub fragment_id: Option<String>,
}

/// In-process widget state store that records every write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryWidgetState {
    values: BTreeMap<String, String>,
    writes: Vec<WidgetWrite>,
}

impl InMemoryWidgetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> &[WidgetWrite] {
        &self.writes
    }

    pub fn value_json(&self, widget_id: &str) -> Option<Value> {
        serde_json::from_str(self.values.get(widget_id)?).ok()
    }
}

impl WidgetStateManager for InMemoryWidgetState {
    fn get_string_value(&self, widget_id: &str) -> Option<String> {
        self.values.get(widget_id).cloned()
    }

    fn set_string_value(
        &mut self,
        widget_id: &str,
        value: String,
        from_ui: bool,
        fragment_id: Option<&str>,
    ) {
        self.values.insert(widget_id.to_string(), value.clone());
        self.writes.push(WidgetWrite {
            widget_id: widget_id.to_string(),
            value,
            from_ui,
            fragment_id: fragment_id.map(str::to_string),
        });
    }
}

/// Trailing-edge debounce over an explicit clock.
#[derive(Clone, Debug, PartialEq)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Restarts the window from `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consumes the pending trigger once its window has passed.
    pub fn take_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncChannel {
    Selection,
    Editing,
}

#[derive(Clone, Debug, PartialEq)]
struct ChannelState {
    debouncer: Debouncer,
    last_sent: Option<String>,
}

/// Two debounced channels pushing selection and editing state to one widget value.
///
/// Each channel owns a subset of the keys in the stored JSON object and only
/// writes when its own part differs from what it last sent.
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetStateSync {
    widget_id: String,
    fragment_id: Option<String>,
    selection: ChannelState,
    editing: ChannelState,
    unmounted: bool,
}

impl WidgetStateSync {
    pub fn new(widget_id: impl Into<String>, fragment_id: Option<String>, window: Duration) -> Self {
        let channel = ChannelState {
            debouncer: Debouncer::new(window),
            last_sent: None,
        };
        Self {
            widget_id: widget_id.into(),
            fragment_id,
            selection: channel.clone(),
            editing: channel,
            unmounted: false,
        }
    }

    pub fn widget_id(&self) -> &str {
        &self.widget_id
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    fn channel_mut(&mut self, channel: SyncChannel) -> &mut ChannelState {
        match channel {
            SyncChannel::Selection => &mut self.selection,
            SyncChannel::Editing => &mut self.editing,
        }
    }

    /// Pushes both parts at once, without debouncing, so the backend has a baseline.
    pub fn establish_initial(
        &mut self,
        manager: &mut dyn WidgetStateManager,
        selection: Map<String, Value>,
        editing: Map<String, Value>,
    ) {
        if self.unmounted {
            return;
        }
        self.selection.last_sent = Some(Value::Object(selection.clone()).to_string());
        self.editing.last_sent = Some(Value::Object(editing.clone()).to_string());

        let mut stored = self.stored_object(manager);
        stored.extend(selection);
        stored.extend(editing);
        self.write(manager, stored);
    }

    pub fn schedule(&mut self, channel: SyncChannel, now: Instant) {
        if self.unmounted {
            return;
        }
        self.channel_mut(channel).debouncer.schedule(now);
    }

    pub fn is_pending(&self, channel: SyncChannel) -> bool {
        match channel {
            SyncChannel::Selection => self.selection.debouncer.is_pending(),
            SyncChannel::Editing => self.editing.debouncer.is_pending(),
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.selection.debouncer.deadline(), self.editing.debouncer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Channels whose debounce window has passed. Their pending triggers are
    /// consumed; the caller renders each part from current state and pushes it.
    pub fn take_due(&mut self, now: Instant) -> Vec<SyncChannel> {
        if self.unmounted {
            return Vec::new();
        }
        [SyncChannel::Selection, SyncChannel::Editing]
            .into_iter()
            .filter(|channel| self.channel_mut(*channel).debouncer.take_if_due(now))
            .collect()
    }

    /// Pushes `part` for `channel` unless it equals the last value sent.
    pub fn push(
        &mut self,
        channel: SyncChannel,
        manager: &mut dyn WidgetStateManager,
        part: Map<String, Value>,
    ) -> bool {
        if self.unmounted {
            return false;
        }
        let encoded = Value::Object(part.clone()).to_string();
        let state = self.channel_mut(channel);
        if state.last_sent.as_deref() == Some(encoded.as_str()) {
            return false;
        }
        state.last_sent = Some(encoded);

        let mut stored = self.stored_object(manager);
        stored.extend(part);
        log::debug!("pushing {channel:?} state for widget {}", self.widget_id);
        self.write(manager, stored);
        true
    }

    /// Cancels pending pushes; later calls become no-ops.
    pub fn unmount(&mut self) {
        self.selection.debouncer.cancel();
        self.editing.debouncer.cancel();
        self.unmounted = true;
    }

    fn stored_object(&self, manager: &dyn WidgetStateManager) -> Map<String, Value> {
        manager
            .get_string_value(&self.widget_id)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn write(&self, manager: &mut dyn WidgetStateManager, stored: Map<String, Value>) {
        manager.set_string_value(
            &self.widget_id,
            Value::Object(stored).to_string(),
            true,
            self.fragment_id.as_deref(),
        );
    }
}

/// What a sync driver should do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncPoll {
    Idle,
    At(Instant),
    Stopped,
}

/// Drives debounced pushes: sleeps until the next deadline, then flushes.
/// Returns once `poll` reports [`SyncPoll::Stopped`].
pub async fn run_sync_loop(
    idle_interval: Duration,
    mut poll: impl FnMut() -> SyncPoll,
    mut flush: impl FnMut(Instant),
) {
    loop {
        match poll() {
            SyncPoll::Stopped => break,
            SyncPoll::Idle => tokio::time::sleep(idle_interval).await,
            SyncPoll::At(deadline) => {
                tokio::time::sleep_until(deadline).await;
                flush(Instant::now());
            }
        }
    }
}
