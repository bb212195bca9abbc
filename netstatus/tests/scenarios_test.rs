use netstatus::{
    AccessPointId, AccessPointProps, ActiveAccessPoint, ActiveConnectionId, ConnectionStatus,
    DeviceId, Effect, IndicatorCore, IndicatorEvent, IndicatorOptions, LockState, ModemEvent,
    ModemId, ModemProperty, NotificationEvent, PinType, RadioBlock, RadioEvent, RadioType,
    Retries, UnlockState, Variant, ViewUpdate, WifiEvent,
};

fn core() -> IndicatorCore {
    IndicatorCore::new(&IndicatorOptions::default())
}

fn modem_event(id: &ModemId, properties: Vec<ModemProperty>) -> IndicatorEvent {
    IndicatorEvent::Modem(ModemEvent::Properties(id.clone(), properties))
}

fn retries(pin: u8, puk: u8) -> ModemProperty {
    ModemProperty::Retries(Retries {
        pin: Some(pin),
        puk: Some(puk),
    })
}

fn pin_locked_modem(core: &mut IndicatorCore, id: &ModemId) {
    core.process([
        IndicatorEvent::Modem(ModemEvent::Added(id.clone())),
        modem_event(
            id,
            vec![
                ModemProperty::SimPresent(true),
                ModemProperty::LockState(LockState::PinRequired),
                retries(3, 10),
            ],
        ),
    ]);
}

fn secured(ssid: &str, strength: u8) -> AccessPointProps {
    AccessPointProps {
        ssid: ssid.as_bytes().to_vec(),
        secured: true,
        adhoc: false,
        strength,
    }
}

fn wifi(event: WifiEvent) -> IndicatorEvent {
    IndicatorEvent::Wifi(event)
}

#[test]
fn wrong_pin_decrements_attempts_on_same_notification() {
    let mut core = core();
    let id = ModemId::new("/ril_0");
    pin_locked_modem(&mut core, &id);

    let unlock = core.action("indicator.modem.1::locked", None).expect("lock action");
    let step = core.process([unlock]);
    let [
        Effect::Notify {
            content,
            request,
            replaces: None,
            ..
        },
    ] = &step.effects[..]
    else {
        panic!("expected one notification, got {:?}", step.effects);
    };
    assert_eq!(content.title, "Enter SIM PIN");
    assert_eq!(content.body, "3 attempts remaining");

    core.process([IndicatorEvent::Notification(NotificationEvent::Shown {
        modem: id.clone(),
        request: *request,
        id: 1,
    })]);
    assert_eq!(core.unlock_notification(&id), Some(1));

    let submit = core
        .action("indicator.notifications.simunlock", Some(&Variant::from("0000")))
        .expect("submit action");
    let step = core.process([submit]);
    assert_eq!(
        step.effects,
        vec![Effect::EnterPin {
            modem: id.clone(),
            pin_type: PinType::Pin,
            pin: "0000".into(),
        }]
    );

    let step = core.process([modem_event(&id, vec![retries(2, 10)])]);
    let [Effect::Notify { content, replaces: Some(1), .. }] = &step.effects[..] else {
        panic!("expected the notification to be replaced, got {:?}", step.effects);
    };
    assert_eq!(content.body, "2 attempts remaining");
    assert_eq!(content.error, "Sorry, incorrect PIN");
    assert_eq!(core.unlock_notification(&id), Some(1));
}

#[test]
fn correct_pin_closes_original_notification() {
    let mut core = core();
    let id = ModemId::new("/ril_0");
    pin_locked_modem(&mut core, &id);

    let unlock = core.action("indicator.modem.1::locked", None).expect("lock action");
    let step = core.process([unlock]);
    let [Effect::Notify { request, .. }] = &step.effects[..] else {
        panic!("expected one notification, got {:?}", step.effects);
    };
    core.process([IndicatorEvent::Notification(NotificationEvent::Shown {
        modem: id.clone(),
        request: *request,
        id: 7,
    })]);
    let submit = core
        .action("indicator.notifications.simunlock", Some(&Variant::from("1234")))
        .expect("submit action");
    core.process([submit]);

    let step = core.process([modem_event(
        &id,
        vec![ModemProperty::LockState(LockState::None)],
    )]);
    assert_eq!(step.effects, vec![Effect::CloseNotification(7)]);
    assert_eq!(core.unlock_state(&id), None);
    assert!(!core.view().sim_slots[0].locked);
}

#[test]
fn exhausted_puk_is_never_prompted_again() {
    let mut core = core();
    let id = ModemId::new("/ril_0");
    core.process([
        IndicatorEvent::Modem(ModemEvent::Added(id.clone())),
        modem_event(
            &id,
            vec![
                ModemProperty::SimPresent(true),
                ModemProperty::LockState(LockState::PukRequired),
                retries(0, 1),
            ],
        ),
    ]);
    let unlock = core.action("indicator.modem.1::locked", None).expect("lock action");
    core.process([unlock]);
    assert_eq!(core.unlock_state(&id), Some(&UnlockState::AwaitingPuk));

    core.process([modem_event(&id, vec![retries(0, 0)])]);
    assert_eq!(core.unlock_state(&id), Some(&UnlockState::Closed));

    // Further changes and activations do not reopen the prompt.
    let step = core.process([modem_event(&id, vec![ModemProperty::Online(true)])]);
    assert!(step.effects.iter().all(|e| !matches!(e, Effect::Notify { .. })));
    let unlock = core.action("indicator.modem.1::locked", None).expect("lock action");
    let step = core.process([unlock]);
    assert!(step.effects.is_empty());
}

#[test]
fn access_points_with_same_identity_collapse() {
    let mut core = core();
    let device = DeviceId::new("/dev/wlan0");
    core.process([
        wifi(WifiEvent::DeviceAdded(device.clone())),
        wifi(WifiEvent::AccessPointAdded {
            device: device.clone(),
            id: AccessPointId::new("/ap/1"),
            props: secured("groupA", 40),
        }),
        wifi(WifiEvent::AccessPointAdded {
            device: device.clone(),
            id: AccessPointId::new("/ap/2"),
            props: secured("groupA", 60),
        }),
    ]);

    let visible = &core.view().access_points;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].label, "groupA");
    assert_eq!(visible[0].strength, 60);

    let step = core.process([wifi(WifiEvent::AccessPointRemoved(AccessPointId::new("/ap/2")))]);
    let visible = &core.view().access_points;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].strength, 40);
    assert!(step.updates.iter().any(|u| matches!(u, ViewUpdate::AccessPoint(_))));
}

#[test]
fn connected_group_is_listed_first() {
    let mut core = core();
    let device = DeviceId::new("/dev/wlan0");
    core.process([
        wifi(WifiEvent::DeviceAdded(device.clone())),
        wifi(WifiEvent::AccessPointAdded {
            device: device.clone(),
            id: AccessPointId::new("/ap/1"),
            props: secured("alpha", 30),
        }),
        wifi(WifiEvent::AccessPointAdded {
            device: device.clone(),
            id: AccessPointId::new("/ap/2"),
            props: secured("zulu", 90),
        }),
        wifi(WifiEvent::ActiveConnectionChanged {
            device,
            active: Some(ActiveAccessPoint {
                connection: ActiveConnectionId::new("/active/1"),
                access_point: AccessPointId::new("/ap/2"),
                status: ConnectionStatus::Connected,
            }),
        }),
    ]);

    let labels: Vec<_> = core
        .view()
        .access_points
        .iter()
        .map(|a| a.label.as_str())
        .collect();
    assert_eq!(labels, ["zulu", "alpha"]);
    assert_eq!(core.view().wifi_icon.as_deref(), Some("nm-signal-100-secure"));
    assert_eq!(
        core.view().indicator_icons.last().map(String::as_str),
        Some("nm-signal-100-secure")
    );
}

#[test]
fn second_modem_without_sim() {
    let mut core = core();
    let first = ModemId::new("/ril_0");
    let second = ModemId::new("/ril_1");
    core.process([
        IndicatorEvent::Modem(ModemEvent::Added(first.clone())),
        IndicatorEvent::Modem(ModemEvent::Added(second.clone())),
        modem_event(
            &first,
            vec![
                ModemProperty::SimPresent(true),
                ModemProperty::Online(true),
                ModemProperty::Operator("carrier".into()),
            ],
        ),
        modem_event(&second, vec![ModemProperty::SimPresent(false)]),
    ]);

    let slots = &core.view().sim_slots;
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].sim_identifier, "SIM 1");
    assert_eq!(slots[1].sim_identifier, "SIM 2");
    assert_eq!(slots[1].label, "No SIM");
    assert_eq!(slots[1].icon, "no-simcard");
}

#[test]
fn flight_mode_hides_access_points() {
    let mut core = core();
    let device = DeviceId::new("/dev/wlan0");
    core.process([
        wifi(WifiEvent::DeviceAdded(device.clone())),
        wifi(WifiEvent::AccessPointAdded {
            device,
            id: AccessPointId::new("/ap/1"),
            props: secured("home", 70),
        }),
    ]);
    assert_eq!(core.view().access_points.len(), 1);

    let toggle = core.action("indicator.airplane.enabled", None).expect("switch");
    let step = core.process([toggle]);
    assert_eq!(step.effects, vec![Effect::SetFlightMode(true)]);
    assert!(core.view().flight_mode);

    core.process([
        IndicatorEvent::Radio(RadioEvent::BlockChanged {
            radio: RadioType::Wifi,
            block: RadioBlock {
                soft: true,
                hard: false,
            },
        }),
        IndicatorEvent::Radio(RadioEvent::FlightModeChanged(true)),
    ]);
    assert!(core.view().access_points.is_empty());
    assert_eq!(
        core.view().indicator_icons.first().map(String::as_str),
        Some("airplane-mode")
    );
}

#[test]
fn undecodable_ssid_is_still_listed() {
    let mut core = core();
    let device = DeviceId::new("/dev/wlan0");
    core.process([
        wifi(WifiEvent::DeviceAdded(device.clone())),
        wifi(WifiEvent::AccessPointAdded {
            device,
            id: AccessPointId::new("/ap/1"),
            props: AccessPointProps {
                ssid: b"DGN\xff".to_vec(),
                secured: false,
                adhoc: false,
                strength: 50,
            },
        }),
    ]);
    assert_eq!(core.view().access_points[0].label, "DGN\u{FFFD}");
}

#[test]
fn undelivered_notification_does_not_block_unlocking() {
    let mut core = core();
    let id = ModemId::new("/ril_0");
    pin_locked_modem(&mut core, &id);

    let unlock = core.action("indicator.modem.1::locked", None).expect("lock action");
    let step = core.process([unlock.clone()]);
    let [Effect::Notify { request, .. }] = &step.effects[..] else {
        panic!("expected one notification, got {:?}", step.effects);
    };
    core.process([IndicatorEvent::Notification(NotificationEvent::Failed {
        modem: id.clone(),
        request: *request,
    })]);

    let step = core.process([unlock]);
    assert!(
        matches!(step.effects[..], [Effect::Notify { replaces: None, .. }]),
        "expected a new notification, got {:?}",
        step.effects
    );
}
