use super::*;

fn pong(probe: u64) -> ServerEnvelope {
    ServerEnvelope::Pong { probe }
}

fn error(message: &str) -> ServerEnvelope {
    ServerEnvelope::Error { message: message.to_owned(), code: None }
}

#[test]
fn kind_handlers_run_in_insertion_order_then_wildcard() {
    let bus = EventBus::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    let o = Rc::clone(&order);
    bus.on(EnvelopeKind::Pong, move |_| o.borrow_mut().push("first"));
    let o = Rc::clone(&order);
    bus.on_any(move |_| o.borrow_mut().push("wildcard"));
    let o = Rc::clone(&order);
    bus.on(EnvelopeKind::Pong, move |_| o.borrow_mut().push("second"));

    bus.dispatch(&pong(1));
    assert_eq!(*order.borrow(), vec!["first", "second", "wildcard"]);
}

#[test]
fn handlers_only_see_their_kind() {
    let bus = EventBus::new();
    let hits = Rc::new(RefCell::new(0));
    let h = Rc::clone(&hits);
    bus.on(EnvelopeKind::Pong, move |_| *h.borrow_mut() += 1);

    bus.dispatch(&error("nope"));
    assert_eq!(*hits.borrow(), 0);
    bus.dispatch(&pong(1));
    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn wildcard_sees_every_kind() {
    let bus = EventBus::new();
    let hits = Rc::new(RefCell::new(0));
    let h = Rc::clone(&hits);
    bus.on_any(move |_| *h.borrow_mut() += 1);

    bus.dispatch(&pong(1));
    bus.dispatch(&error("x"));
    assert_eq!(*hits.borrow(), 2);
}

#[test]
fn once_fires_exactly_once() {
    let bus = EventBus::new();
    let hits = Rc::new(RefCell::new(0));
    let h = Rc::clone(&hits);
    bus.once(EnvelopeKind::Pong, move |_| *h.borrow_mut() += 1);

    bus.dispatch(&pong(1));
    bus.dispatch(&pong(2));
    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn off_unsubscribes_and_reports_removal() {
    let bus = EventBus::new();
    let hits = Rc::new(RefCell::new(0));
    let h = Rc::clone(&hits);
    let id = bus.on(EnvelopeKind::Pong, move |_| *h.borrow_mut() += 1);

    assert!(bus.off(EnvelopeKind::Pong, id));
    assert!(!bus.off(EnvelopeKind::Pong, id));
    bus.dispatch(&pong(1));
    assert_eq!(*hits.borrow(), 0);
}

#[test]
fn off_any_unsubscribes_the_wildcard_channel() {
    let bus = EventBus::new();
    let hits = Rc::new(RefCell::new(0));
    let h = Rc::clone(&hits);
    let id = bus.on_any(move |_| *h.borrow_mut() += 1);

    assert!(bus.off_any(id));
    bus.dispatch(&pong(1));
    assert_eq!(*hits.borrow(), 0);
}

#[test]
fn reentrant_unsubscribe_does_not_block_later_handlers() {
    let bus = Rc::new(EventBus::new());
    let order = Rc::new(RefCell::new(Vec::new()));

    let ids: Rc<RefCell<Vec<SubscriptionId>>> = Rc::new(RefCell::new(Vec::new()));
    let o = Rc::clone(&order);
    let b = Rc::clone(&bus);
    let i = Rc::clone(&ids);
    let first = bus.on(EnvelopeKind::Pong, move |_| {
        o.borrow_mut().push("first");
        // Remove the second subscriber mid-dispatch.
        for id in i.borrow().iter() {
            b.off(EnvelopeKind::Pong, *id);
        }
    });
    let o = Rc::clone(&order);
    let second = bus.on(EnvelopeKind::Pong, move |_| o.borrow_mut().push("second"));
    ids.borrow_mut().push(second);

    // The dispatch snapshot still delivers to "second" this round.
    bus.dispatch(&pong(1));
    assert_eq!(*order.borrow(), vec!["first", "second"]);

    // Next round it is gone.
    bus.dispatch(&pong(2));
    assert_eq!(*order.borrow(), vec!["first", "second", "first"]);

    bus.off(EnvelopeKind::Pong, first);
}
