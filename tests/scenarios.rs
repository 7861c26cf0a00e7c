// End-to-end scenarios against the public ptn_engine API. Each test here is
// one of the literal worked examples: build a small net, drive it through
// the public surface, and check the marking that comes out the other side.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use ptn_engine::{ActionsThreadOption, PtnEngine};

fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..500 {
        if check() {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("condition never became true within the test's patience budget");
}

/// Scenario 1: places {A:1, B:0, C:0}; T1: A->B, T2: B->C, T3: C->A. The
/// token should keep circulating rather than settle anywhere.
#[test]
fn round_robin_of_three_places() {
    let engine = PtnEngine::with_actions_thread_option(ActionsThreadOption::EventLoop);
    engine.create_place("A", 1, false, None, None).unwrap();
    engine.create_place("B", 0, false, None, None).unwrap();
    engine.create_place("C", 0, false, None, None).unwrap();
    engine.create_transition("T1", &["A"], &[], &["B"], &[], &[], &[], &[], &[], &[], false).unwrap();
    engine.create_transition("T2", &["B"], &[], &["C"], &[], &[], &[], &[], &[], &[], false).unwrap();
    engine.create_transition("T3", &["C"], &[], &["A"], &[], &[], &[], &[], &[], &[], false).unwrap();

    engine.execute();
    // The marking cycles (1,0,0) -> (0,1,0) -> (0,0,1) -> (1,0,0); whichever
    // quiescent-looking point we sample, exactly one place must hold the
    // single token and the total must stay at 1.
    wait_until(|| {
        let total = engine.number_of_tokens("A").unwrap()
            + engine.number_of_tokens("B").unwrap()
            + engine.number_of_tokens("C").unwrap();
        total == 1
    });
    let total = engine.number_of_tokens("A").unwrap()
        + engine.number_of_tokens("B").unwrap()
        + engine.number_of_tokens("C").unwrap();
    assert_eq!(total, 1, "the single token must never be duplicated or lost");
    engine.stop();
}

/// Scenario 2: {P:5, Q:0}; T: P(weight 2) -> Q(weight 3). Firing twice
/// leaves {P:1, Q:6}; a third firing is disabled.
#[test]
fn weighted_consumption() {
    let engine = PtnEngine::with_actions_thread_option(ActionsThreadOption::Inline);
    engine.create_place("P", 5, false, None, None).unwrap();
    engine.create_place("Q", 0, false, None, None).unwrap();
    engine.create_transition("T", &["P"], &[2], &["Q"], &[3], &[], &[], &[], &[], &[], false).unwrap();

    engine.execute();
    wait_until(|| engine.number_of_tokens("Q").unwrap() == 6);
    engine.stop();
    assert_eq!(engine.number_of_tokens("P").unwrap(), 1);
    assert_eq!(engine.number_of_tokens("Q").unwrap(), 6);
}

/// Scenario 3: {P:0, Q:1}; T: Q -> , inhibitor P(weight 1). Enabled while P
/// is empty; disabled the moment P holds a token.
#[test]
fn inhibitor_arc_disables_its_transition() {
    let engine = PtnEngine::with_actions_thread_option(ActionsThreadOption::Inline);
    engine.create_place("P", 1, true, None, None).unwrap();
    engine.create_place("Q", 1, false, None, None).unwrap();
    engine.create_place("R", 0, false, None, None).unwrap();
    engine.create_transition("T", &["Q"], &[], &["R"], &[], &["P"], &[1], &[], &[], &[], false).unwrap();

    // P already holds a token: the inhibitor keeps T disabled and Q's token
    // sits untouched.
    engine.execute();
    thread::sleep(Duration::from_millis(20));
    engine.stop();
    assert_eq!(engine.number_of_tokens("R").unwrap(), 0);
    assert_eq!(engine.number_of_tokens("Q").unwrap(), 1);
}

/// Same scenario, but P starts empty: the inhibitor is satisfied and T fires.
#[test]
fn inhibitor_arc_with_empty_guard_place_allows_firing() {
    let engine = PtnEngine::with_actions_thread_option(ActionsThreadOption::Inline);
    engine.create_place("P", 0, false, None, None).unwrap();
    engine.create_place("Q", 1, false, None, None).unwrap();
    engine.create_place("R", 0, false, None, None).unwrap();
    engine.create_transition("T", &["Q"], &[], &["R"], &[], &["P"], &[1], &[], &[], &[], false).unwrap();

    engine.execute();
    wait_until(|| engine.number_of_tokens("R").unwrap() == 1);
    engine.stop();
    assert_eq!(engine.number_of_tokens("Q").unwrap(), 0);
}

/// Scenario 4: input place `In`, non-input `Out`; T: In -> Out. Three
/// increments settle at (0,3); `stop` zeroes `In`, which is already zero.
#[test]
fn input_gating() {
    let engine = PtnEngine::with_actions_thread_option(ActionsThreadOption::Inline);
    engine.create_place("In", 0, true, None, None).unwrap();
    engine.create_place("Out", 0, false, None, None).unwrap();
    engine.create_transition("move", &["In"], &[], &["Out"], &[], &[], &[], &[], &[], &[], false).unwrap();

    engine.execute();
    assert_eq!(engine.number_of_tokens("In").unwrap(), 0);
    assert_eq!(engine.number_of_tokens("Out").unwrap(), 0);

    for _ in 0..3 {
        engine.increment_input_place("In").unwrap();
    }
    wait_until(|| engine.number_of_tokens("Out").unwrap() == 3);
    engine.stop();
    assert_eq!(engine.number_of_tokens("In").unwrap(), 0);
    assert_eq!(engine.number_of_tokens("Out").unwrap(), 3);
}

/// Scenario 5: a token travels down a 12-place chain one hop at a time, so
/// firing order is forced rather than shuffled -- at any instant exactly one
/// transition is enabled. Every place the token enters runs the same
/// registered on-enter action, which appends a counter to a shared log; the
/// log should come out exactly `1..=12` even though JOB_QUEUE runs the
/// callback on a worker thread asynchronously from the firing that submitted
/// it.
#[test]
fn on_enter_action_ordering_under_job_queue() {
    let engine = PtnEngine::with_actions_thread_option(ActionsThreadOption::JobQueue);
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_clone = log.clone();
    let seen = Arc::new(AtomicU32::new(0));
    let seen_clone = seen.clone();
    engine
        .register_action(
            "log-entry",
            Arc::new(move || {
                let n = seen_clone.fetch_add(1, Ordering::SeqCst) + 1;
                log_clone.lock().unwrap().push(n);
            }),
        )
        .unwrap();

    engine.create_place("P0", 0, true, Some("log-entry"), None).unwrap();
    for i in 1..12 {
        engine.create_place(format!("P{i}"), 0, false, Some("log-entry"), None).unwrap();
        engine
            .create_transition(
                format!("T{}", i - 1),
                &[format!("P{}", i - 1).as_str()],
                &[],
                &[format!("P{i}").as_str()],
                &[],
                &[],
                &[],
                &[],
                &[],
                &[],
                false,
            )
            .unwrap();
    }

    engine.execute();
    engine.increment_input_place("P0").unwrap();
    wait_until(|| log.lock().unwrap().len() == 12);
    engine.stop();
    assert_eq!(*log.lock().unwrap(), (1..=12).collect::<Vec<_>>());
}

/// Scenario 6: {S:1}; T1: S->A, T2: S->B. Over many independent engines,
/// both transitions should win a non-trivial share of the time, confirming
/// the firing order really is randomized rather than favoring construction
/// order.
#[test]
fn conflict_resolution_is_statistically_fair() {
    const TRIALS: u32 = 1000;
    let mut t1_wins = 0u32;
    let mut t2_wins = 0u32;

    for _ in 0..TRIALS {
        let engine = PtnEngine::with_actions_thread_option(ActionsThreadOption::Inline);
        engine.create_place("S", 1, false, None, None).unwrap();
        engine.create_place("A", 0, false, None, None).unwrap();
        engine.create_place("B", 0, false, None, None).unwrap();
        engine.create_transition("T1", &["S"], &[], &["A"], &[], &[], &[], &[], &[], &[], false).unwrap();
        engine.create_transition("T2", &["S"], &[], &["B"], &[], &[], &[], &[], &[], &[], false).unwrap();

        engine.execute();
        wait_until(|| engine.number_of_tokens("A").unwrap() + engine.number_of_tokens("B").unwrap() == 1);
        if engine.number_of_tokens("A").unwrap() == 1 {
            t1_wins += 1;
        } else {
            t2_wins += 1;
        }
        engine.stop();
    }

    assert!(t1_wins as f64 / TRIALS as f64 > 0.05, "T1 essentially never won: {t1_wins}/{TRIALS}");
    assert!(t2_wins as f64 / TRIALS as f64 > 0.05, "T2 essentially never won: {t2_wins}/{TRIALS}");
}

/// Idempotence: starting an already-running engine, or stopping an
/// already-stopped one, changes nothing observable.
#[test]
fn execute_and_stop_are_idempotent() {
    let engine = PtnEngine::with_actions_thread_option(ActionsThreadOption::Inline);
    engine.create_place("In", 0, true, None, None).unwrap();

    engine.execute();
    engine.execute();
    assert!(engine.is_event_loop_running());

    engine.stop();
    engine.stop();
    assert!(!engine.is_event_loop_running());
}

/// Boundary behaviors from spec.md section 8.
#[test]
fn boundary_behaviors() {
    let engine = PtnEngine::with_actions_thread_option(ActionsThreadOption::Inline);

    assert!(engine.create_place("", 0, false, None, None).is_err());

    engine.create_place("Out", 0, false, None, None).unwrap();
    assert!(engine
        .create_transition("bad", &["ghost"], &[], &["Out"], &[], &[], &[], &[], &[], &[], false)
        .is_err());

    engine.create_place("In", 0, true, None, None).unwrap();
    assert!(engine.increment_input_place("Out").is_err());
    assert_eq!(engine.number_of_tokens("Out").unwrap(), 0);
}

/// A bidirectional arc requires the same availability an activation arc
/// would, but leaves the place's token count unchanged once fired -- a
/// resource a transition borrows rather than consumes.
#[test]
fn bidirectional_arc_gates_on_availability_and_returns_its_tokens() {
    let engine = PtnEngine::with_actions_thread_option(ActionsThreadOption::Inline);
    engine.create_place("Tool", 1, false, None, None).unwrap();
    engine.create_place("Done", 0, false, None, None).unwrap();
    // Done also inhibits its own producing transition so the test can assert
    // on a settled marking instead of a transition that -- since the
    // bidirectional arc never drains `Tool` -- would otherwise stay enabled
    // and keep firing forever.
    engine
        .create_transition("use-tool", &[], &[], &["Done"], &[], &["Done"], &[1], &["Tool"], &[1], &[], false)
        .unwrap();

    engine.execute();
    wait_until(|| engine.number_of_tokens("Done").unwrap() == 1);
    thread::sleep(Duration::from_millis(20));
    engine.stop();
    assert_eq!(engine.number_of_tokens("Tool").unwrap(), 1, "the borrowed resource must come back");
    assert_eq!(engine.number_of_tokens("Done").unwrap(), 1);
}
