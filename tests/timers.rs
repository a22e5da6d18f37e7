use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crt_tv::timer::{ManualTimers, Timers};

#[test]
fn fires_in_due_order_and_honours_cancel() {
    let timers = ManualTimers::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    timers.schedule(30, Box::new(move || l.borrow_mut().push("late")));
    let l = log.clone();
    let doomed = timers.schedule(10, Box::new(move || l.borrow_mut().push("doomed")));
    let l = log.clone();
    timers.schedule(20, Box::new(move || l.borrow_mut().push("early")));

    timers.cancel(doomed);
    timers.advance(25);
    assert_eq!(*log.borrow(), vec!["early"]);
    assert_eq!(timers.pending(), 1);

    timers.advance(5);
    assert_eq!(*log.borrow(), vec!["early", "late"]);
    assert_eq!(timers.now(), 30);
}

#[test]
fn tasks_scheduled_while_firing_run_in_the_same_window() {
    let timers = ManualTimers::new();
    let hits = Rc::new(Cell::new(0));

    let t = timers.clone();
    let h = hits.clone();
    timers.schedule(
        10,
        Box::new(move || {
            h.set(h.get() + 1);
            let h = h.clone();
            t.schedule(5, Box::new(move || h.set(h.get() + 1)));
        }),
    );

    timers.advance(15);
    assert_eq!(hits.get(), 2);
    assert_eq!(timers.pending(), 0);
}
