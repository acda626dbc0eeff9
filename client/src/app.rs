use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Interval;
use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, Document, Element, Event, HtmlCanvasElement, HtmlElement};

use prizewheel_shared::{completed_history, Clock, CycleEvent, PollOutcome, WinnerReport};

use crate::dom::{get_element, resize_canvas, set_status, show_session};
use crate::history::render_history;
use crate::net::{fetch_active_session, fetch_history, report_winner};
use crate::render::redraw;
use crate::state::{SessionHeader, State, StatusLine};
use crate::util::{debug_enabled, fallback_policy};

type SharedState = Rc<RefCell<State>>;

fn document_ready_state(document: &Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

fn show_status(state: &State, kind: &str, text: &str) {
    set_status(&state.status.root, &state.status.text, kind, text);
}

fn refresh_history(state: SharedState, document: Document) {
    spawn_local(async move {
        match fetch_history().await {
            Ok(sessions) => {
                let entries = completed_history(&sessions);
                let state = state.borrow();
                state.log(&format!("history refreshed entries={}", entries.len()));
                render_history(&document, &state.history_el, &entries);
            }
            Err(error) => {
                web_sys::console::warn_1(&format!("history fetch failed: {error}").into());
            }
        }
    });
}

fn sync_header(state: &mut State) {
    let current = state.viewer.session().map(|session| session.id.clone());
    if current == state.shown_session {
        return;
    }
    show_session(&state.header, state.viewer.session());
    state.shown_session = current;
}

fn handle_poll_outcome(state: &mut State, outcome: PollOutcome) {
    let idle = state.viewer.cycle().is_idle();
    match outcome {
        PollOutcome::NoSession => {
            if idle {
                show_status(state, "idle", "Waiting for a reward draw");
            }
        }
        PollOutcome::Waiting => {
            if idle {
                let completed = state
                    .viewer
                    .session()
                    .is_some_and(|session| session.is_completed());
                if completed {
                    show_status(state, "done", "Draw complete");
                } else {
                    show_status(state, "ready", "Waiting for the host to start");
                }
            }
        }
        PollOutcome::Started { marker } => {
            state.log(&format!("draw started marker={marker}"));
            show_status(state, "live", "Draw starting");
        }
        PollOutcome::AlreadySeen => {}
        PollOutcome::Deferred { marker } => {
            state.log(&format!("draw deferred while busy marker={marker}"));
        }
        PollOutcome::Refused { marker, error } => {
            web_sys::console::warn_1(&format!("draw refused marker={marker}: {error}").into());
            show_status(state, "error", &error.to_string());
        }
    }
}

fn poll_once(state: SharedState) {
    let (ticket, timeout_ms) = {
        let mut guard = state.borrow_mut();
        let timeout_ms = guard.viewer.cycle().timings().poll_interval_ms;
        let now_ms = guard.viewer.clock().now_ms();
        match guard.poll_gate.try_begin(now_ms, f64::from(timeout_ms)) {
            Some(ticket) => (ticket, timeout_ms),
            None => return,
        }
    };
    spawn_local(async move {
        let fetched = fetch_active_session(timeout_ms).await;
        let mut state = state.borrow_mut();
        if !state.poll_gate.finish(ticket) {
            state.log(&format!("stale poll answer dropped ticket={ticket}"));
            return;
        }
        match fetched {
            Ok(session) => {
                let outcome = state.viewer.apply_poll(session);
                handle_poll_outcome(&mut state, outcome);
                sync_header(&mut state);
            }
            Err(error) => {
                // The previous session stays on screen; the next tick retries.
                web_sys::console::warn_1(&format!("poll failed: {error}").into());
                if state.viewer.cycle().is_idle() {
                    show_status(&state, "offline", "Reconnecting…");
                }
            }
        }
    });
}

fn send_report(state: SharedState, document: Document, session_id: String, report: WinnerReport) {
    spawn_local(async move {
        match report_winner(&session_id, &report).await {
            Ok(session) => {
                state.borrow().log(&format!(
                    "winner recorded session={} winner={:?}",
                    session.id,
                    session.winner.as_ref().map(|winner| winner.name.as_str())
                ));
                refresh_history(state, document);
            }
            Err(error) => {
                web_sys::console::error_1(
                    &format!("winner report failed session={session_id}: {error}").into(),
                );
            }
        }
    });
}

fn handle_cycle_events(state: &SharedState, document: &Document, events: Vec<CycleEvent>) {
    for event in events {
        match event {
            CycleEvent::SpinStarted {
                marker,
                index,
                full_spins,
            } => {
                let state = state.borrow();
                state.log(&format!(
                    "spin started marker={marker} index={index} spins={full_spins}"
                ));
                show_status(&state, "live", "Spinning");
            }
            CycleEvent::Settled { marker, resolution } => {
                let state = state.borrow();
                state.log(&format!(
                    "wheel settled marker={marker} index={} source={:?}",
                    resolution.index, resolution.source
                ));
                let text = if resolution.is_consistent() {
                    format!("Winner: {}", resolution.participant.name)
                } else {
                    format!("Winner (local pick): {}", resolution.participant.name)
                };
                show_status(&state, "winner", &text);
            }
            CycleEvent::ReportDue { session_id, report } => {
                send_report(state.clone(), document.clone(), session_id, report);
            }
            CycleEvent::Finished { marker } => {
                let state = state.borrow();
                state.log(&format!("draw finished marker={marker}"));
                show_status(&state, "done", "Draw complete");
            }
            CycleEvent::Aborted { marker, error } => {
                web_sys::console::warn_1(&format!("draw aborted marker={marker}: {error}").into());
                show_status(&state.borrow(), "error", &error.to_string());
            }
        }
    }
}

fn start_frame_loop(window: web_sys::Window, document: Document, state: SharedState) {
    let frame_cb: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let next_frame = frame_cb.clone();
    let window_cb = window.clone();
    *frame_cb.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
        let events = {
            let mut guard = state.borrow_mut();
            let mut rng = guard.rng;
            let events = guard.viewer.tick(&mut rng);
            redraw(&mut guard);
            events
        };
        handle_cycle_events(&state, &document, events);
        if let Some(callback) = next_frame.borrow().as_ref() {
            let _ = window_cb.request_animation_frame(callback.as_ref().unchecked_ref());
        };
    }));
    let first_frame = frame_cb.borrow();
    if let Some(callback) = first_frame.as_ref() {
        let _ = window.request_animation_frame(callback.as_ref().unchecked_ref());
    }
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() == Some("complete") {
        started.set(true);
        return start_app();
    }

    let onload_started = started.clone();
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    window.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();

    Ok(())
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    let debug = debug_enabled(&window);
    let policy = fallback_policy(&window);
    if debug {
        web_sys::console::log_1(&format!("prize wheel debug enabled policy={policy:?}").into());
    }

    let canvas: HtmlCanvasElement = get_element(&document, "wheel")?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    let status = StatusLine {
        root: get_element::<Element>(&document, "status")?,
        text: get_element::<Element>(&document, "status-text")?,
    };
    let header = SessionHeader {
        title: get_element::<HtmlElement>(&document, "session-title")?,
        description: get_element::<HtmlElement>(&document, "session-description")?,
        banner: get_element::<HtmlElement>(&document, "session-banner")?,
    };
    let history_el: HtmlElement = get_element(&document, "history-list")?;

    let state = Rc::new(RefCell::new(State::new(
        canvas, ctx, status, header, history_el, policy, debug,
    )));
    {
        let mut guard = state.borrow_mut();
        show_status(&guard, "offline", "Connecting…");
        show_session(&guard.header, None);
        resize_canvas(&window, &mut guard);
    }

    {
        let resize_state = state.clone();
        let window_cb = window.clone();
        let onresize = Closure::<dyn FnMut()>::new(move || {
            let mut state = resize_state.borrow_mut();
            resize_canvas(&window_cb, &mut state);
        });
        window.add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    refresh_history(state.clone(), document.clone());
    poll_once(state.clone());
    {
        let poll_state = state.clone();
        let interval_ms = state.borrow().viewer.cycle().timings().poll_interval_ms;
        let interval = Interval::new(interval_ms, move || poll_once(poll_state.clone()));
        interval.forget();
    }

    start_frame_loop(window, document, state);
    Ok(())
}
