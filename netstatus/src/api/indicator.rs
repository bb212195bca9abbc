//! The running indicator.
//!
//! [`Indicator`] owns the single event queue. Platform monitors and callers
//! push events onto it; one event loop task drains it, runs every batch
//! through [`IndicatorCore`] and publishes a [`Snapshot`]. Effects go to a
//! separate executor task that runs them one after another, so the loop
//! never waits on the platform.

use futures::Future;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use zbus::Connection;

use crate::api::models::{IndicatorError, IndicatorOptions, ViewModel};
use crate::core::dispatch::IndicatorCore;
use crate::core::events::{Effect, IndicatorEvent, NotificationEvent};
use crate::core::menu::{MenuModel, Variant};
use crate::core::root_state::ViewUpdate;
use crate::dbus::NMProxy;
use crate::monitoring::platform::{DbusPlatform, Platform};
use crate::monitoring::{EventSender, modem, network, notifications, rfkill, wifi};
use crate::Result;

/// An item of the event queue.
#[derive(Debug)]
pub(crate) enum Message {
    Event(IndicatorEvent),
    /// A menu action, translated against the last published state.
    Action {
        name: String,
        parameter: Option<Variant>,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Published state after a processing step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub view: ViewModel,
    pub menu: MenuModel,
    /// Snap-decision menus of the unlock notifications, by SIM slot.
    pub unlock_menus: BTreeMap<u32, MenuModel>,
    /// Changes of the step that produced this snapshot. Subscribers that
    /// skip snapshots should resynchronise from `view`.
    pub updates: Vec<ViewUpdate>,
}

/// Handle to a running indicator.
///
/// # Example
///
/// ```no_run
/// use netstatus::{Indicator, IndicatorOptions};
///
/// # async fn example() -> netstatus::Result<()> {
/// let indicator = Indicator::start(IndicatorOptions::default()).await?;
/// let mut snapshots = indicator.subscribe();
///
/// indicator.invoke("indicator.wifi.enable", None).await?;
/// snapshots.changed().await.ok();
/// println!("{:?}", snapshots.borrow().view.indicator_icons);
///
/// indicator.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Indicator {
    queue: EventSender,
    snapshot: watch::Receiver<Snapshot>,
    event_loop: JoinHandle<()>,
    executor: JoinHandle<()>,
    monitors: Vec<JoinHandle<()>>,
}

impl Indicator {
    /// Connects to the buses, starts every platform monitor and the event
    /// loop.
    ///
    /// Fails with [`IndicatorError::ManagerUnavailable`] when NetworkManager
    /// cannot be reached. ofono, URfkill and the notification daemon are
    /// optional: their monitors log and stop if the service is missing.
    pub async fn start(options: IndicatorOptions) -> Result<Self> {
        let system = Connection::system()
            .await
            .map_err(|e| IndicatorError::ManagerUnavailable(e.to_string()))?;
        let nm = NMProxy::new(&system).await?;
        let state = nm
            .state()
            .await
            .map_err(|e| IndicatorError::ManagerUnavailable(e.to_string()))?;
        debug!("NetworkManager reachable, state {state}");

        let session = Connection::session().await?;
        let platform = DbusPlatform::new(system.clone(), session.clone(), options.clone());
        let mut indicator = Self::with_platform(&options, platform);

        indicator.monitors = vec![
            spawn_monitor("connectivity", network::monitor_connectivity(system.clone(), indicator.queue.clone())),
            spawn_monitor("wifi", wifi::monitor_wifi(system.clone(), indicator.queue.clone())),
            spawn_monitor(
                "saved connections",
                wifi::monitor_saved_connections(system.clone(), indicator.queue.clone()),
            ),
            spawn_monitor("modem", modem::monitor_modems(system.clone(), indicator.queue.clone())),
            spawn_monitor("kill-switch", rfkill::monitor_radios(system, indicator.queue.clone())),
            spawn_monitor(
                "notification",
                notifications::monitor_notifications(session, indicator.queue.clone()),
            ),
        ];

        info!("Indicator started ({} profile)", options.profile);
        Ok(indicator)
    }

    /// Starts the event loop and effect executor without any monitor.
    ///
    /// Events are fed with [`Indicator::send`]. Must be called within a
    /// tokio runtime.
    pub fn with_platform(options: &IndicatorOptions, platform: impl Platform + 'static) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        let (effects, effects_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(Snapshot::default());

        let core = IndicatorCore::new(options);
        let executor = tokio::spawn(execute_effects(platform, effects_rx, queue.clone()));
        let event_loop = tokio::spawn(run_loop(core, rx, effects, snapshot_tx));

        Self {
            queue,
            snapshot,
            event_loop,
            executor,
            monitors: Vec::new(),
        }
    }

    /// Pushes an event onto the queue.
    pub fn send(&self, event: IndicatorEvent) -> Result<()> {
        self.queue
            .send(Message::Event(event))
            .map_err(|_| IndicatorError::QueueClosed)
    }

    /// Invokes a menu action, e.g. `indicator.airplane.enabled`.
    ///
    /// Resolves once the action has been translated and queued for
    /// processing, with an error for unknown actions or bad parameters.
    pub async fn invoke(&self, name: &str, parameter: Option<Variant>) -> Result<()> {
        let (reply, answer) = oneshot::channel();
        self.queue
            .send(Message::Action {
                name: name.to_string(),
                parameter,
                reply,
            })
            .map_err(|_| IndicatorError::QueueClosed)?;
        answer.await.map_err(|_| IndicatorError::QueueClosed)?
    }

    /// Watches the published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.clone()
    }

    /// The last published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// Cancels every unlock session, runs the remaining effects and stops
    /// all tasks.
    pub async fn shutdown(self) -> Result<()> {
        for monitor in &self.monitors {
            monitor.abort();
        }
        self.send(IndicatorEvent::Shutdown)?;
        if let Err(e) = self.event_loop.await {
            warn!("Event loop ended abnormally: {e}");
        }
        if let Err(e) = self.executor.await {
            warn!("Effect executor ended abnormally: {e}");
        }
        info!("Indicator stopped");
        Ok(())
    }
}

fn spawn_monitor<F>(name: &'static str, monitor: F) -> JoinHandle<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = monitor.await {
            warn!("{name} monitor stopped: {e}");
        }
    })
}

/// Drains the queue batch by batch until a shutdown is processed.
async fn run_loop(
    mut core: IndicatorCore,
    mut rx: mpsc::UnboundedReceiver<Message>,
    effects: mpsc::UnboundedSender<Effect>,
    snapshot: watch::Sender<Snapshot>,
) {
    while let Some(first) = rx.recv().await {
        let mut batch = Vec::new();
        let mut replies = Vec::new();

        let mut next = Some(first);
        while let Some(message) = next {
            match message {
                Message::Event(event) => batch.push(event),
                Message::Action {
                    name,
                    parameter,
                    reply,
                } => match core.action(&name, parameter.as_ref()) {
                    Ok(event) => {
                        batch.push(event);
                        replies.push(reply);
                    }
                    Err(e) => {
                        debug!("Rejected action {name}: {e}");
                        let _ = reply.send(Err(e));
                    }
                },
            }
            next = rx.try_recv().ok();
        }

        let step = core.process(batch);
        for effect in step.effects {
            if effects.send(effect).is_err() {
                warn!("Effect executor gone, dropping effect");
            }
        }

        let unlock_menus = core.unlock_menus();
        if !step.updates.is_empty() || snapshot.borrow().unlock_menus != unlock_menus {
            snapshot.send_replace(Snapshot {
                view: core.view().clone(),
                menu: core.menu(),
                unlock_menus,
                updates: step.updates,
            });
        }
        for reply in replies {
            let _ = reply.send(Ok(()));
        }

        if step.shutdown {
            break;
        }
    }
    debug!("Event loop finished");
}

/// Runs effects in emission order and feeds their answers back.
///
/// Ends once the event loop is gone and every queued effect has run.
async fn execute_effects<P: Platform>(
    platform: P,
    mut effects: mpsc::UnboundedReceiver<Effect>,
    queue: EventSender,
) {
    while let Some(effect) = effects.recv().await {
        let failure = match &effect {
            Effect::Notify { modem, request, .. } => Some(NotificationEvent::Failed {
                modem: modem.clone(),
                request: *request,
            }),
            _ => None,
        };
        // The loop may already be gone after a shutdown.
        match platform.execute(effect).await {
            Ok(Some(event)) => {
                let _ = queue.send(Message::Event(event));
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Platform request failed: {e}");
                if let Some(failure) = failure {
                    let _ = queue.send(Message::Event(IndicatorEvent::Notification(failure)));
                }
            }
        }
    }
    debug!("Effect executor finished");
}
