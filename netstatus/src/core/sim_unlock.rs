//! SIM PIN/PUK unlock sessions.
//!
//! Each locked modem has at most one session, and each session at most one
//! outstanding notification. Transitions are pure: they update the session
//! and return the [`Effect`]s to run. Outcomes of `EnterPin` and `ResetPin`
//! are never returned directly; they are observed as lock state and retry
//! changes of the modem.

use log::{debug, error, warn};
use std::collections::{HashMap, HashSet};

use crate::api::models::{LockState, ModemId, NotificationId, NotifyRequest, PinType, Retries};
use crate::core::events::{Effect, UnlockNotification};
use crate::core::modem_set::ModemSet;
use crate::types::constants::pin_length;

const INCORRECT_PIN: &str = "Sorry, incorrect PIN";
const INCORRECT_PUK: &str = "Sorry, incorrect PUK";
const PIN_MISMATCH: &str = "PIN codes did not match";

/// State of an unlock session. A modem without a session is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockState {
    AwaitingPin,
    AwaitingPuk,
    /// The PUK is staged until the new PIN is confirmed.
    AwaitingNewPin { puk: String },
    AwaitingPinConfirm { puk: String, new_pin: String },
    /// PUK attempts are exhausted; the SIM is not prompted for again.
    Closed,
}

impl UnlockState {
    fn pin_min_max(&self) -> (u8, u8) {
        match self {
            Self::AwaitingPuk => (pin_length::PUK_MIN, pin_length::PUK_MAX),
            _ => (pin_length::PIN_MIN, pin_length::PIN_MAX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presentation {
    Hidden,
    /// `request` was sent to the daemon, id not known yet. `stale` is set
    /// when the content changed in the meantime.
    Pending { request: NotifyRequest, stale: bool },
    Shown(NotificationId),
}

#[derive(Debug, Clone)]
struct Session {
    state: UnlockState,
    lock: LockState,
    retries: Retries,
    error: Option<String>,
    popup: Option<String>,
    presentation: Presentation,
}

#[derive(Debug, Default)]
pub(crate) struct SimUnlockController {
    sessions: HashMap<ModemId, Session>,
    /// Session the notification's menu actions refer to.
    foreground: Option<ModemId>,
    /// Requests of sessions that ended before the daemon answered; their
    /// ids are closed on arrival.
    orphans: HashSet<NotifyRequest>,
    next_request: NotifyRequest,
}

impl SimUnlockController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, modem: &ModemId) -> Option<&UnlockState> {
        self.sessions.get(modem).map(|s| &s.state)
    }

    pub fn notification(&self, modem: &ModemId) -> Option<NotificationId> {
        match self.sessions.get(modem)?.presentation {
            Presentation::Shown(id) => Some(id),
            _ => None,
        }
    }

    /// Content of every notification requested or on screen, by SIM slot.
    pub fn presented(&self, modems: &ModemSet) -> Vec<(u32, UnlockNotification)> {
        let multi_sim = modems.is_multi_sim();
        let mut presented: Vec<_> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.presentation != Presentation::Hidden && s.state != UnlockState::Closed)
            .filter_map(|(id, session)| {
                let slot = modems.get(id)?.slot;
                Some((slot, render(session, &sim_name(modems, id), multi_sim)))
            })
            .collect();
        presented.sort_by_key(|(slot, _)| *slot);
        presented
    }

    /// The user activated the locked indicator of `modem`.
    ///
    /// Starts a session for a locked SIM, or re-presents the active one.
    pub fn activate(&mut self, modem: &ModemId, modems: &ModemSet) -> Vec<Effect> {
        let Some(m) = modems.get(modem) else {
            warn!("Unlock requested for unknown modem {modem}");
            return Vec::new();
        };

        if let Some(session) = self.sessions.get(modem) {
            if session.state == UnlockState::Closed {
                debug!("SIM of {modem} is blocked, not prompting");
                return Vec::new();
            }
            self.foreground = Some(modem.clone());
            return self.present(modem, modems);
        }

        let state = match m.lock_state {
            LockState::None => {
                debug!("SIM of {modem} is not locked");
                return Vec::new();
            }
            LockState::PinRequired => UnlockState::AwaitingPin,
            LockState::PukRequired if m.retries.puk == Some(0) => UnlockState::Closed,
            LockState::PukRequired => UnlockState::AwaitingPuk,
        };
        debug!("Unlock session for {modem} started in {state:?}");

        let closed = state == UnlockState::Closed;
        self.sessions.insert(
            modem.clone(),
            Session {
                state,
                lock: m.lock_state,
                retries: m.retries,
                error: None,
                popup: None,
                presentation: Presentation::Hidden,
            },
        );
        if closed {
            error!("SIM of {modem} is permanently blocked");
            return Vec::new();
        }

        self.foreground = Some(modem.clone());
        self.present(modem, modems)
    }

    /// Text submitted in the notification of the foreground session.
    pub fn submit(&mut self, text: &str, modems: &ModemSet) -> Vec<Effect> {
        let Some(modem) = self.foreground.clone() else {
            warn!("PIN submitted without an unlock session");
            return Vec::new();
        };
        let Some(session) = self.sessions.get_mut(&modem) else {
            return Vec::new();
        };

        let state = std::mem::replace(&mut session.state, UnlockState::Closed);
        session.state = match state {
            UnlockState::AwaitingPin => {
                session.state = UnlockState::AwaitingPin;
                return vec![Effect::EnterPin {
                    modem,
                    pin_type: PinType::Pin,
                    pin: text.to_string(),
                }];
            }
            UnlockState::AwaitingPuk => UnlockState::AwaitingNewPin {
                puk: text.to_string(),
            },
            UnlockState::AwaitingNewPin { puk } => UnlockState::AwaitingPinConfirm {
                puk,
                new_pin: text.to_string(),
            },
            UnlockState::AwaitingPinConfirm { puk, new_pin } if new_pin == text => {
                let effect = Effect::ResetPin {
                    modem,
                    pin_type: PinType::Puk,
                    puk: puk.clone(),
                    new_pin: new_pin.clone(),
                };
                session.state = UnlockState::AwaitingPinConfirm { puk, new_pin };
                return vec![effect];
            }
            UnlockState::AwaitingPinConfirm { .. } => {
                session.error = Some(PIN_MISMATCH.to_string());
                UnlockState::AwaitingPuk
            }
            UnlockState::Closed => return Vec::new(),
        };

        self.present(&modem, modems)
    }

    /// Observed changes of a modem: retries and lock state.
    pub fn modem_changed(&mut self, modem: &ModemId, modems: &ModemSet) -> Vec<Effect> {
        let Some(m) = modems.get(modem) else {
            return Vec::new();
        };
        let sim = sim_name(modems, modem);
        let Some(session) = self.sessions.get_mut(modem) else {
            return Vec::new();
        };

        if session.state == UnlockState::Closed {
            if !m.lock_state.is_locked() {
                self.sessions.remove(modem);
            }
            return Vec::new();
        }

        if !m.lock_state.is_locked() {
            debug!("SIM of {modem} unlocked");
            return self.end(modem);
        }

        let mut dirty = false;

        if decreased(session.retries.pin, m.retries.pin) {
            session.error = Some(INCORRECT_PIN.to_string());
            if m.retries.pin == Some(1) {
                session.popup = Some(format!(
                    "Sorry, incorrect {sim} PIN. This will be your last attempt. \
                     If {sim} PIN is entered incorrectly you will require your PUK code to unlock."
                ));
            }
        }
        if decreased(session.retries.puk, m.retries.puk) {
            session.error = Some(INCORRECT_PUK.to_string());
            session.state = UnlockState::AwaitingPuk;
            if m.retries.puk == Some(1) {
                session.popup = Some(format!(
                    "Sorry, incorrect {sim} PUK. This will be your last attempt. \
                     If {sim} PUK is entered incorrectly, your SIM card will be blocked \
                     and would require replacement. Please contact your carrier."
                ));
            }
        }
        if session.retries != m.retries {
            session.retries = m.retries;
            dirty = true;
        }

        if session.lock != m.lock_state {
            match m.lock_state {
                LockState::PukRequired => {
                    session.state = UnlockState::AwaitingPuk;
                    session.popup = Some(format!(
                        "Sorry, your {sim} is now blocked. Please enter your PUK code to \
                         unblock SIM card. You may need to contact your network provider \
                         for PUK code."
                    ));
                }
                LockState::PinRequired => session.state = UnlockState::AwaitingPin,
                LockState::None => {}
            }
            session.lock = m.lock_state;
            dirty = true;
        }

        if m.lock_state == LockState::PukRequired && m.retries.puk == Some(0) {
            error!("PUK attempts exhausted, SIM of {modem} is permanently blocked");
            session.state = UnlockState::Closed;
            let presentation = std::mem::replace(&mut session.presentation, Presentation::Hidden);
            if self.foreground.as_ref() == Some(modem) {
                self.foreground = None;
            }
            return self.close(presentation).into_iter().collect();
        }

        if dirty {
            self.present(modem, modems)
        } else {
            Vec::new()
        }
    }

    /// The user cancelled the foreground notification.
    pub fn dismiss(&mut self) -> Vec<Effect> {
        match self.foreground.clone() {
            Some(modem) => self.cancel(&modem),
            None => Vec::new(),
        }
    }

    /// Cancels the session of `modem`. Cancelling twice is a no-op and a
    /// blocked SIM keeps its terminal session.
    pub fn cancel(&mut self, modem: &ModemId) -> Vec<Effect> {
        match self.sessions.get(modem) {
            Some(s) if s.state != UnlockState::Closed => {
                debug!("Unlock session for {modem} cancelled");
                self.end(modem)
            }
            _ => Vec::new(),
        }
    }

    /// The daemon closed a notification.
    pub fn closed(&mut self, id: NotificationId) -> Vec<Effect> {
        let owner = self
            .sessions
            .iter()
            .find(|(_, s)| s.presentation == Presentation::Shown(id))
            .map(|(m, _)| m.clone());

        if let Some(modem) = owner {
            debug!("Unlock notification {id} of {modem} closed by the daemon");
            self.sessions.remove(&modem);
            if self.foreground.as_ref() == Some(&modem) {
                self.foreground = None;
            }
        }
        Vec::new()
    }

    pub fn dismiss_error(&mut self, modems: &ModemSet) -> Vec<Effect> {
        self.clear_text(modems, |s| s.error.take().is_some())
    }

    pub fn dismiss_popup(&mut self, modems: &ModemSet) -> Vec<Effect> {
        self.clear_text(modems, |s| s.popup.take().is_some())
    }

    /// The daemon answered `request` of `modem` with `id`.
    pub fn shown(
        &mut self,
        modem: &ModemId,
        request: NotifyRequest,
        id: NotificationId,
        modems: &ModemSet,
    ) -> Vec<Effect> {
        if self.orphans.remove(&request) {
            debug!("Closing late notification {id} of ended session for {modem}");
            return vec![Effect::CloseNotification(id)];
        }

        let Some(session) = self.sessions.get_mut(modem) else {
            return vec![Effect::CloseNotification(id)];
        };

        match session.presentation {
            Presentation::Pending { request: pending, stale } if pending == request => {
                session.presentation = Presentation::Shown(id);
                if stale {
                    self.present(modem, modems)
                } else {
                    Vec::new()
                }
            }
            Presentation::Shown(current) if current == id => Vec::new(),
            _ => vec![Effect::CloseNotification(id)],
        }
    }

    /// `request` of `modem` never reached the daemon.
    ///
    /// A session still waiting for it goes back to hidden, so the next
    /// activation or content change requests a new notification. A failed
    /// replacement keeps the notification that is already shown.
    pub fn failed(&mut self, modem: &ModemId, request: NotifyRequest) -> Vec<Effect> {
        if self.orphans.remove(&request) {
            return Vec::new();
        }
        let Some(session) = self.sessions.get_mut(modem) else {
            return Vec::new();
        };
        match session.presentation {
            Presentation::Pending { request: pending, .. } if pending == request => {
                warn!("Unlock notification for {modem} could not be shown");
                session.presentation = Presentation::Hidden;
            }
            _ => debug!("Stale notification failure for {modem}"),
        }
        Vec::new()
    }

    /// The modem disappeared; its session ends whatever its state.
    pub fn modem_removed(&mut self, modem: &ModemId) -> Vec<Effect> {
        if self.sessions.contains_key(modem) {
            self.end(modem)
        } else {
            Vec::new()
        }
    }

    /// Ends every session.
    pub fn shutdown(&mut self) -> Vec<Effect> {
        let mut modems: Vec<ModemId> = self.sessions.keys().cloned().collect();
        modems.sort();
        modems.iter().flat_map(|m| self.end(m)).collect()
    }

    fn clear_text(
        &mut self,
        modems: &ModemSet,
        clear: impl FnOnce(&mut Session) -> bool,
    ) -> Vec<Effect> {
        let Some(modem) = self.foreground.clone() else {
            return Vec::new();
        };
        if self.sessions.get_mut(&modem).is_some_and(clear) {
            self.present(&modem, modems)
        } else {
            Vec::new()
        }
    }

    /// Removes a session and closes its notification.
    fn end(&mut self, modem: &ModemId) -> Vec<Effect> {
        if self.foreground.as_ref() == Some(modem) {
            self.foreground = None;
        }
        match self.sessions.remove(modem) {
            Some(session) => self.close(session.presentation).into_iter().collect(),
            None => Vec::new(),
        }
    }

    fn close(&mut self, presentation: Presentation) -> Option<Effect> {
        match presentation {
            Presentation::Shown(id) => Some(Effect::CloseNotification(id)),
            Presentation::Pending { request, .. } => {
                self.orphans.insert(request);
                None
            }
            Presentation::Hidden => None,
        }
    }

    /// Shows or refreshes the notification of a session.
    fn present(&mut self, modem: &ModemId, modems: &ModemSet) -> Vec<Effect> {
        let sim = sim_name(modems, modem);
        let multi_sim = modems.is_multi_sim();
        let Some(slot) = modems.get(modem).map(|m| m.slot) else {
            return Vec::new();
        };
        let Some(session) = self.sessions.get_mut(modem) else {
            return Vec::new();
        };
        if session.state == UnlockState::Closed {
            return Vec::new();
        }

        let request = self.next_request;
        let replaces = match session.presentation {
            Presentation::Pending { request, .. } => {
                session.presentation = Presentation::Pending {
                    request,
                    stale: true,
                };
                return Vec::new();
            }
            Presentation::Hidden => {
                session.presentation = Presentation::Pending {
                    request,
                    stale: false,
                };
                None
            }
            Presentation::Shown(id) => Some(id),
        };
        self.next_request += 1;

        vec![Effect::Notify {
            modem: modem.clone(),
            slot,
            request,
            replaces,
            content: render(session, &sim, multi_sim),
        }]
    }
}

fn decreased(old: Option<u8>, new: Option<u8>) -> bool {
    matches!((old, new), (Some(o), Some(n)) if n < o)
}

/// `"SIM"` for a single modem, `"SIM N"` otherwise.
fn sim_name(modems: &ModemSet, modem: &ModemId) -> String {
    modems
        .get(modem)
        .and_then(|m| modems.sim_identifier(m))
        .unwrap_or_else(|| "SIM".to_string())
}

fn attempts(remaining: Option<u8>) -> String {
    match remaining {
        Some(1) => "1 attempt remaining".to_string(),
        Some(n) => format!("{n} attempts remaining"),
        None => String::new(),
    }
}

fn render(session: &Session, sim: &str, multi_sim: bool) -> UnlockNotification {
    let (title, body) = match &session.state {
        UnlockState::AwaitingPin => (format!("Enter {sim} PIN"), attempts(session.retries.pin)),
        UnlockState::AwaitingPuk if multi_sim => {
            (format!("Enter {sim} PUK code"), attempts(session.retries.puk))
        }
        UnlockState::AwaitingPuk => ("Enter PUK code".to_string(), attempts(session.retries.puk)),
        UnlockState::AwaitingNewPin { .. } => {
            (format!("Enter new {sim} PIN"), "Create new PIN".to_string())
        }
        UnlockState::AwaitingPinConfirm { .. } | UnlockState::Closed => {
            (format!("Confirm new {sim} PIN"), "Create new PIN".to_string())
        }
    };

    UnlockNotification {
        title,
        body,
        pin_min_max: session.state.pin_min_max(),
        popup: session.popup.clone().unwrap_or_default(),
        error: session.error.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ModemProperty;

    fn locked_modem(modems: &mut ModemSet, id: &ModemId, lock: LockState, pin: u8, puk: u8) {
        modems.add_modem(id.clone());
        modems.update_properties(
            id,
            vec![
                ModemProperty::SimPresent(true),
                ModemProperty::LockState(lock),
                ModemProperty::Retries(Retries {
                    pin: Some(pin),
                    puk: Some(puk),
                }),
            ],
        );
    }

    fn retries(modems: &mut ModemSet, id: &ModemId, pin: u8, puk: u8) {
        modems.update_property(
            id,
            ModemProperty::Retries(Retries {
                pin: Some(pin),
                puk: Some(puk),
            }),
        );
    }

    fn request_of(effects: &[Effect]) -> NotifyRequest {
        match effects {
            [Effect::Notify { request, .. }] => *request,
            other => panic!("expected one Notify, got {other:?}"),
        }
    }

    /// Answers the outstanding notification request of `modem` with `id`.
    fn show(
        ctl: &mut SimUnlockController,
        modem: &ModemId,
        id: NotificationId,
        modems: &ModemSet,
    ) -> Vec<Effect> {
        let request = match ctl.sessions.get(modem).map(|s| s.presentation) {
            Some(Presentation::Pending { request, .. }) => request,
            other => panic!("no notification requested for {modem}: {other:?}"),
        };
        ctl.shown(modem, request, id, modems)
    }

    fn notify_content(effects: &[Effect]) -> &UnlockNotification {
        match effects {
            [Effect::Notify { content, .. }] => content,
            other => panic!("expected one Notify, got {other:?}"),
        }
    }

    #[test]
    fn activation_prompts_for_pin() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PinRequired, 3, 10);
        let mut ctl = SimUnlockController::new();

        let effects = ctl.activate(&id, &modems);
        let content = notify_content(&effects);
        assert_eq!(content.title, "Enter SIM PIN");
        assert_eq!(content.body, "3 attempts remaining");
        assert_eq!(content.pin_min_max, (4, 8));
        assert!(matches!(effects[0], Effect::Notify { replaces: None, .. }));
        assert_eq!(ctl.state(&id), Some(&UnlockState::AwaitingPin));
    }

    #[test]
    fn unlocked_sim_has_nothing_to_do() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::None, 3, 10);
        let mut ctl = SimUnlockController::new();
        assert!(ctl.activate(&id, &modems).is_empty());
        assert_eq!(ctl.state(&id), None);
    }

    #[test]
    fn reactivation_reuses_notification() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PinRequired, 3, 10);
        let mut ctl = SimUnlockController::new();
        ctl.activate(&id, &modems);
        assert!(show(&mut ctl, &id, 7, &modems).is_empty());

        let effects = ctl.activate(&id, &modems);
        assert!(matches!(effects[..], [Effect::Notify { replaces: Some(7), .. }]));
    }

    #[test]
    fn wrong_pin_then_right_pin() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PinRequired, 3, 10);
        let mut ctl = SimUnlockController::new();
        ctl.activate(&id, &modems);
        show(&mut ctl, &id, 1, &modems);

        assert_eq!(
            ctl.submit("1111", &modems),
            vec![Effect::EnterPin {
                modem: id.clone(),
                pin_type: PinType::Pin,
                pin: "1111".into(),
            }]
        );

        retries(&mut modems, &id, 2, 10);
        let effects = ctl.modem_changed(&id, &modems);
        assert!(matches!(effects[..], [Effect::Notify { replaces: Some(1), .. }]));
        let content = notify_content(&effects);
        assert_eq!(content.body, "2 attempts remaining");
        assert_eq!(content.error, "Sorry, incorrect PIN");
        assert_eq!(content.popup, "");

        ctl.submit("1234", &modems);
        modems.update_property(&id, ModemProperty::LockState(LockState::None));
        assert_eq!(
            ctl.modem_changed(&id, &modems),
            vec![Effect::CloseNotification(1)]
        );
        assert_eq!(ctl.state(&id), None);
    }

    #[test]
    fn last_pin_attempt_shows_popup() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PinRequired, 2, 10);
        let mut ctl = SimUnlockController::new();
        ctl.activate(&id, &modems);
        show(&mut ctl, &id, 1, &modems);

        retries(&mut modems, &id, 1, 10);
        let effects = ctl.modem_changed(&id, &modems);
        let content = notify_content(&effects);
        assert_eq!(content.body, "1 attempt remaining");
        assert!(content.popup.starts_with("Sorry, incorrect SIM PIN. This will be your last attempt."));

        let effects = ctl.dismiss_popup(&modems);
        assert_eq!(notify_content(&effects).popup, "");
        let effects = ctl.dismiss_error(&modems);
        assert_eq!(notify_content(&effects).error, "");
        assert!(ctl.dismiss_error(&modems).is_empty());
    }

    #[test]
    fn pin_exhaustion_moves_to_puk() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PinRequired, 1, 10);
        let mut ctl = SimUnlockController::new();
        ctl.activate(&id, &modems);
        show(&mut ctl, &id, 1, &modems);

        retries(&mut modems, &id, 0, 10);
        modems.update_property(&id, ModemProperty::LockState(LockState::PukRequired));
        let effects = ctl.modem_changed(&id, &modems);
        let content = notify_content(&effects);
        assert_eq!(content.title, "Enter PUK code");
        assert_eq!(content.body, "10 attempts remaining");
        assert_eq!(content.pin_min_max, (8, 8));
        assert_eq!(content.error, "Sorry, incorrect PIN");
        assert!(content.popup.starts_with("Sorry, your SIM is now blocked."));
        assert_eq!(ctl.state(&id), Some(&UnlockState::AwaitingPuk));
    }

    #[test]
    fn puk_flow_with_mismatch_and_wrong_puk() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PukRequired, 0, 10);
        let mut ctl = SimUnlockController::new();
        ctl.activate(&id, &modems);
        show(&mut ctl, &id, 4, &modems);

        let effects = ctl.submit("87654321", &modems);
        assert_eq!(notify_content(&effects).title, "Enter new SIM PIN");
        assert_eq!(notify_content(&effects).body, "Create new PIN");

        let effects = ctl.submit("4321", &modems);
        assert_eq!(notify_content(&effects).title, "Confirm new SIM PIN");

        let effects = ctl.submit("9999", &modems);
        assert_eq!(notify_content(&effects).title, "Enter PUK code");
        assert_eq!(notify_content(&effects).error, "PIN codes did not match");

        ctl.submit("87654321", &modems);
        ctl.submit("4321", &modems);
        assert_eq!(
            ctl.submit("4321", &modems),
            vec![Effect::ResetPin {
                modem: id.clone(),
                pin_type: PinType::Puk,
                puk: "87654321".into(),
                new_pin: "4321".into(),
            }]
        );

        retries(&mut modems, &id, 0, 9);
        let effects = ctl.modem_changed(&id, &modems);
        assert!(matches!(effects[..], [Effect::Notify { replaces: Some(4), .. }]));
        assert_eq!(notify_content(&effects).title, "Enter PUK code");
        assert_eq!(notify_content(&effects).body, "9 attempts remaining");
        assert_eq!(notify_content(&effects).error, "Sorry, incorrect PUK");
        assert_eq!(ctl.state(&id), Some(&UnlockState::AwaitingPuk));
    }

    #[test]
    fn puk_exhaustion_is_terminal() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PukRequired, 0, 1);
        let mut ctl = SimUnlockController::new();
        ctl.activate(&id, &modems);
        show(&mut ctl, &id, 2, &modems);
        ctl.submit("11111111", &modems);
        ctl.submit("1234", &modems);
        ctl.submit("1234", &modems);

        retries(&mut modems, &id, 0, 0);
        assert_eq!(
            ctl.modem_changed(&id, &modems),
            vec![Effect::CloseNotification(2)]
        );
        assert_eq!(ctl.state(&id), Some(&UnlockState::Closed));
        assert!(ctl.activate(&id, &modems).is_empty());
        assert!(ctl.submit("1234", &modems).is_empty());
        assert!(ctl.cancel(&id).is_empty());
        assert_eq!(ctl.state(&id), Some(&UnlockState::Closed));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PinRequired, 3, 10);
        let mut ctl = SimUnlockController::new();
        ctl.activate(&id, &modems);
        show(&mut ctl, &id, 5, &modems);

        assert_eq!(ctl.dismiss(), vec![Effect::CloseNotification(5)]);
        assert!(ctl.dismiss().is_empty());
        assert!(ctl.cancel(&id).is_empty());
        assert_eq!(ctl.state(&id), None);
    }

    #[test]
    fn late_id_of_cancelled_session_is_closed() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PinRequired, 3, 10);
        let mut ctl = SimUnlockController::new();
        let first = request_of(&ctl.activate(&id, &modems));
        assert!(ctl.dismiss().is_empty());

        let second = request_of(&ctl.activate(&id, &modems));
        assert_ne!(first, second);
        assert_eq!(ctl.shown(&id, first, 8, &modems), vec![Effect::CloseNotification(8)]);
        assert!(ctl.shown(&id, second, 9, &modems).is_empty());
        assert_eq!(ctl.notification(&id), Some(9));
    }

    #[test]
    fn content_change_before_id_is_refreshed() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PinRequired, 3, 10);
        let mut ctl = SimUnlockController::new();
        ctl.activate(&id, &modems);

        retries(&mut modems, &id, 2, 10);
        assert!(ctl.modem_changed(&id, &modems).is_empty());
        let effects = show(&mut ctl, &id, 3, &modems);
        assert!(matches!(effects[..], [Effect::Notify { replaces: Some(3), .. }]));
        assert_eq!(notify_content(&effects).body, "2 attempts remaining");
    }

    #[test]
    fn multi_sim_titles() {
        let mut modems = ModemSet::new();
        let a = ModemId::new("/ril_0");
        let b = ModemId::new("/ril_1");
        locked_modem(&mut modems, &a, LockState::None, 3, 10);
        locked_modem(&mut modems, &b, LockState::PukRequired, 0, 10);
        let mut ctl = SimUnlockController::new();

        let effects = ctl.activate(&b, &modems);
        assert_eq!(notify_content(&effects).title, "Enter SIM 2 PUK code");
        show(&mut ctl, &b, 1, &modems);
        let effects = ctl.submit("12345678", &modems);
        assert_eq!(notify_content(&effects).title, "Enter new SIM 2 PIN");
    }

    #[test]
    fn daemon_close_and_shutdown() {
        let mut modems = ModemSet::new();
        let a = ModemId::new("/ril_0");
        let b = ModemId::new("/ril_1");
        locked_modem(&mut modems, &a, LockState::PinRequired, 3, 10);
        locked_modem(&mut modems, &b, LockState::PinRequired, 3, 10);
        let mut ctl = SimUnlockController::new();
        ctl.activate(&a, &modems);
        show(&mut ctl, &a, 1, &modems);
        ctl.activate(&b, &modems);
        show(&mut ctl, &b, 2, &modems);

        assert!(ctl.closed(1).is_empty());
        assert_eq!(ctl.state(&a), None);
        assert_eq!(ctl.shutdown(), vec![Effect::CloseNotification(2)]);
        assert!(ctl.shutdown().is_empty());
    }

    #[test]
    fn removed_modem_ends_session() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PinRequired, 3, 10);
        let mut ctl = SimUnlockController::new();
        ctl.activate(&id, &modems);
        show(&mut ctl, &id, 6, &modems);
        modems.remove_modem(&id);
        assert_eq!(ctl.modem_removed(&id), vec![Effect::CloseNotification(6)]);
        assert!(ctl.modem_changed(&id, &modems).is_empty());
    }

    #[test]
    fn failed_notification_can_be_requested_again() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PinRequired, 3, 10);
        let mut ctl = SimUnlockController::new();

        let first = request_of(&ctl.activate(&id, &modems));
        assert!(ctl.failed(&id, first).is_empty());
        assert_eq!(ctl.state(&id), Some(&UnlockState::AwaitingPin));

        let effects = ctl.activate(&id, &modems);
        assert!(matches!(effects[..], [Effect::Notify { replaces: None, .. }]));
        let second = request_of(&effects);
        assert_ne!(first, second);
        assert!(ctl.shown(&id, second, 4, &modems).is_empty());
        assert_eq!(ctl.notification(&id), Some(4));
    }

    #[test]
    fn failed_content_refresh_keeps_pending_session_recoverable() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PinRequired, 3, 10);
        let mut ctl = SimUnlockController::new();

        let request = request_of(&ctl.activate(&id, &modems));
        retries(&mut modems, &id, 2, 10);
        assert!(ctl.modem_changed(&id, &modems).is_empty());
        ctl.failed(&id, request);

        retries(&mut modems, &id, 1, 10);
        let effects = ctl.modem_changed(&id, &modems);
        assert!(matches!(effects[..], [Effect::Notify { replaces: None, .. }]));
        assert_eq!(notify_content(&effects).body, "1 attempt remaining");
    }

    #[test]
    fn failed_replacement_keeps_shown_notification() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PinRequired, 3, 10);
        let mut ctl = SimUnlockController::new();
        ctl.activate(&id, &modems);
        show(&mut ctl, &id, 3, &modems);

        let replacement = request_of(&ctl.activate(&id, &modems));
        assert!(ctl.failed(&id, replacement).is_empty());
        assert_eq!(ctl.notification(&id), Some(3));
    }

    #[test]
    fn unanswered_request_of_ended_session_spares_next_notification() {
        let mut modems = ModemSet::new();
        let id = ModemId::new("/ril_0");
        locked_modem(&mut modems, &id, LockState::PinRequired, 3, 10);
        let mut ctl = SimUnlockController::new();

        let lost = request_of(&ctl.activate(&id, &modems));
        modems.update_property(&id, ModemProperty::LockState(LockState::None));
        assert!(ctl.modem_changed(&id, &modems).is_empty());
        assert_eq!(ctl.state(&id), None);

        modems.update_property(&id, ModemProperty::LockState(LockState::PinRequired));
        ctl.modem_changed(&id, &modems);
        let fresh = request_of(&ctl.activate(&id, &modems));
        assert!(ctl.shown(&id, fresh, 42, &modems).is_empty());
        assert_eq!(ctl.notification(&id), Some(42));

        // The lost request still closes its notification if it shows up.
        assert_eq!(ctl.shown(&id, lost, 41, &modems), vec![Effect::CloseNotification(41)]);
        assert_eq!(ctl.notification(&id), Some(42));
        assert!(ctl.failed(&id, lost).is_empty());
    }
}
