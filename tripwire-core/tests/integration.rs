//! Integration Tests for the Reactive Engine
//!
//! These tests verify that triggers, watchers, computed triggers, mutators
//! and tracked containers work together correctly.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tripwire_core::{
    mutation_scope, Computed, Depth, Manager, Mutator, TrackedRecord, TrackedVec, Trigger,
    Watcher,
};

/// A responder that counts how many times it was called.
fn counter() -> (Rc<Cell<usize>>, impl Fn() + 'static) {
    let hits = Rc::new(Cell::new(0));
    let handle = hits.clone();
    (hits, move || handle.set(handle.get() + 1))
}

/// Edges exist in both directions right after the execution returns.
#[test]
fn edges_are_bidirectional_after_execution() {
    let a = Trigger::new(1);
    let b = Trigger::new(2);

    let (x, y) = (a.clone(), b.clone());
    let watcher = Watcher::new(move |()| x.get() * y.get(), || {});
    assert_eq!(watcher.run().unwrap(), 2);

    for trigger in [a.id(), b.id()] {
        assert_eq!(Manager::is_subscribed(trigger, watcher.id()), Some(true));
    }
    assert_eq!(watcher.tracked_count(), 2);
}

/// Branching on another trigger swaps the dependency set entirely.
#[test]
fn dependency_set_follows_latest_branch() {
    let pick_first = Trigger::new(true);
    let first = Trigger::new("first");
    let second = Trigger::new("second");

    let (flag, t1, t2) = (pick_first.clone(), first.clone(), second.clone());
    let (hits, responder) = counter();
    let watcher = Watcher::new(
        move |()| if flag.get() { t1.get() } else { t2.get() },
        responder,
    );

    assert_eq!(watcher.run().unwrap(), "first");
    pick_first.set(false);
    assert_eq!(hits.get(), 1);
    assert_eq!(watcher.run().unwrap(), "second");

    assert_eq!(Manager::is_subscribed(first.id(), watcher.id()), Some(false));
    assert_eq!(Manager::is_subscribed(second.id(), watcher.id()), Some(true));

    // The abandoned branch no longer reaches the watcher.
    first.set("changed");
    assert_eq!(hits.get(), 1);
    second.set("changed");
    assert_eq!(hits.get(), 2);
}

/// Repeated writes within one scope notify each dependent once.
#[test]
fn repeated_writes_in_scope_notify_once() {
    let trigger = Trigger::new(0);
    let source = trigger.clone();
    let (hits, responder) = counter();
    let watcher = Watcher::new(move |()| source.get(), responder);
    watcher.run().unwrap();

    mutation_scope(|| {
        for value in 1..=5 {
            trigger.set(value);
        }
        assert_eq!(hits.get(), 0);
    });
    assert_eq!(hits.get(), 1);
}

/// Two enters and one exit keep everything deferred.
#[test]
fn inner_exit_does_not_drain() {
    let trigger = Trigger::new(0);
    let source = trigger.clone();
    let (hits, responder) = counter();
    let watcher = Watcher::new(move |()| source.get(), responder);
    watcher.run().unwrap();

    Manager::enter_mutation_scope();
    Manager::enter_mutation_scope();
    trigger.set(1);
    Manager::exit_mutation_scope().unwrap();
    assert_eq!(hits.get(), 0);
    assert_eq!(Manager::deferred_count(), 1);

    Manager::exit_mutation_scope().unwrap();
    assert_eq!(hits.get(), 1);
    assert!(Manager::exit_mutation_scope().is_err());
}

/// An unobserved computed trigger computes at most once per read.
#[test]
fn unobserved_computed_is_lazy() {
    let base = Trigger::new(0);
    let source = base.clone();
    let computed = Computed::new(move || source.get() + 1);
    computed.get().unwrap();

    for value in 1..=10 {
        base.set(value);
    }
    assert_eq!(computed.compute_count(), 1);
    assert_eq!(computed.get().unwrap(), 11);
    assert_eq!(computed.compute_count(), 2);
}

/// An observed computed trigger refreshes before anyone reads it again.
#[test]
fn observed_computed_is_eager() {
    let base = Trigger::new(0);
    let source = base.clone();
    let computed = Computed::new(move || source.get() * 3);

    let reader = computed.clone();
    let watcher: Watcher<(), i32> = Watcher::new(move |()| reader.get().unwrap(), || {});
    watcher.run().unwrap();

    base.set(4);
    assert_eq!(computed.compute_count(), 2);
    assert_eq!(computed.peek(), Some(12));
}

/// A watcher reading a computed trigger depends on the base twice: through
/// the computed trigger and directly. One batch still means one response.
#[test]
fn computed_reader_responds_once_per_batch() {
    let base = Trigger::new(1);
    let source = base.clone();
    let doubled = Computed::new(move || source.get() * 2);

    let reader = doubled.clone();
    let (hits, responder) = counter();
    let watcher = Watcher::new(move |()| reader.get().unwrap(), responder);
    assert_eq!(watcher.run().unwrap(), 2);
    assert_eq!(base.subscriber_count(), 2);
    assert_eq!(doubled.subscriber_count(), 1);

    mutation_scope(|| {
        base.set(2);
        base.set(3);
    });
    assert_eq!(hits.get(), 1);
    assert_eq!(doubled.peek(), Some(6));

    // Without a scope the same holds for a single write.
    base.set(4);
    assert_eq!(hits.get(), 2);
    assert_eq!(doubled.peek(), Some(8));
}

/// Watchers that subscribe during an immediate dispatch wait for the next
/// change, and a sibling disposed before its turn is skipped.
#[test]
fn immediate_dispatch_uses_subscribers_at_change_time() {
    let t = Trigger::new(0);
    let (late_hits, late_responder) = counter();
    let late_responder = Rc::new(late_responder);
    let (second_hits, second_responder) = counter();

    let source = t.clone();
    let second = Watcher::new(move |()| source.get(), second_responder);

    let newcomer: Rc<RefCell<Option<Watcher<(), i32>>>> = Rc::new(RefCell::new(None));
    let (slot, victim, reader, source) = (newcomer.clone(), second.clone(), t.clone(), t.clone());
    let first = Watcher::new(
        move |()| reader.get(),
        move || {
            victim.dispose();
            if slot.borrow().is_some() {
                return;
            }
            let (s, respond) = (source.clone(), late_responder.clone());
            let late = Watcher::new(move |()| s.get(), move || respond());
            late.run().unwrap();
            *slot.borrow_mut() = Some(late);
        },
    );

    first.run().unwrap();
    second.run().unwrap();

    t.set(1);
    assert_eq!(second_hits.get(), 0);
    assert!(second.is_disposed());
    assert_eq!(late_hits.get(), 0);
    assert_eq!(t.subscriber_count(), 2);

    // From the next change on, the newcomer is a regular subscriber.
    t.set(2);
    assert_eq!(late_hits.get(), 1);
    assert_eq!(second_hits.get(), 0);
}

fn person(name: &str) -> TrackedRecord<String> {
    [("name", name.to_string())].into_iter().collect()
}

fn rename_first(people: &mut TrackedVec<TrackedRecord<String>>) {
    if let Some(first) = people.get_mut(0) {
        first.set("name", "renamed".to_string());
    }
}

/// Shallow sees element replacement but not writes inside elements.
#[test]
fn shallow_depth_stops_at_elements() {
    let people = Trigger::with_depth(TrackedVec::from_vec(vec![person("ada")]), Depth::Shallow);
    let source = people.clone();
    let (hits, responder) = counter();
    let watcher = Watcher::new(move |()| source.with(|people| people.len()), responder);
    watcher.run().unwrap();

    people.with_mut(|people| {
        let _ = people.set(0, person("grace"));
    });
    assert_eq!(hits.get(), 1);

    people.with_mut(rename_first);
    assert_eq!(hits.get(), 1);
}

/// Deep sees both.
#[test]
fn deep_depth_reaches_inside_elements() {
    let people = Trigger::with_depth(TrackedVec::from_vec(vec![person("ada")]), Depth::Deep);
    let source = people.clone();
    let (hits, responder) = counter();
    let watcher = Watcher::new(move |()| source.with(|people| people.len()), responder);
    watcher.run().unwrap();

    people.with_mut(|people| {
        let _ = people.set(0, person("grace"));
    });
    assert_eq!(hits.get(), 1);

    // The replacement was instrumented on the way in.
    people.with_mut(rename_first);
    assert_eq!(hits.get(), 2);
    let name = people.with(|people| people.get(0).and_then(|p| p.get("name")).cloned());
    assert_eq!(name.as_deref(), Some("renamed"));
}

/// Watch `t + 1`, then change `t`.
#[test]
fn change_notifies_before_set_returns() {
    let t = Trigger::with_depth(10, Depth::Value);
    let source = t.clone();
    let (hits, responder) = counter();
    let w = Watcher::new(move |()| source.get() + 1, responder);

    assert_eq!(w.run().unwrap(), 11);
    assert_eq!(hits.get(), 0);

    t.set(20);
    assert_eq!(hits.get(), 1);
}

/// Two writes inside one mutator call, one response.
#[test]
fn mutator_call_responds_once() {
    let width = Trigger::new(1);
    let height = Trigger::new(1);
    let (w, h) = (width.clone(), height.clone());
    let (hits, responder) = counter();
    let area = Watcher::new(move |()| w.get() * h.get(), responder);
    area.run().unwrap();

    let (w, h) = (width.clone(), height.clone());
    let resize = Mutator::new(move |(new_w, new_h): (i32, i32)| {
        w.set(new_w);
        h.set(new_h);
    });
    resize.call((3, 4)).unwrap();

    assert_eq!(hits.get(), 1);
    assert_eq!(area.run().unwrap(), 12);
}

/// A disposed watcher never responds again.
#[test]
fn disposed_watcher_is_silent() {
    let t = Trigger::new(0);
    let source = t.clone();
    let (hits, responder) = counter();
    let w = Watcher::new(move |()| source.get(), responder);
    w.run().unwrap();

    w.dispose();
    t.set(1);
    assert_eq!(hits.get(), 0);
    assert!(w.run().is_err());
}

/// A watcher disposed by a sibling earlier in the same batch is skipped.
#[test]
fn sibling_disposal_during_drain() {
    let t = Trigger::new(0);
    let (second_hits, second_responder) = counter();

    let source = t.clone();
    let second = Watcher::new(move |()| source.get(), second_responder);

    let victim = second.clone();
    let source = t.clone();
    let first = Watcher::new(move |()| source.get(), move || victim.dispose());

    first.run().unwrap();
    second.run().unwrap();

    mutation_scope(|| t.set(1));
    assert_eq!(second_hits.get(), 0);
    assert!(second.is_disposed());
}

/// Responders may write triggers; the follow-up change is delivered too.
#[test]
fn responder_writes_cascade() {
    let source = Trigger::new(1);
    let mirror = Trigger::new(0);

    let (s, m) = (source.clone(), mirror.clone());
    let copier = Watcher::new(move |()| s.get(), move || m.set(m.peek() + 1));
    copier.run().unwrap();

    let m = mirror.clone();
    let (hits, responder) = counter();
    let observer = Watcher::new(move |()| m.get(), responder);
    observer.run().unwrap();

    source.set(2);
    assert_eq!(mirror.peek(), 1);
    assert_eq!(hits.get(), 1);
}
