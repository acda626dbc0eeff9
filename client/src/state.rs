use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement, HtmlElement};

use prizewheel_shared::{DrawTimings, FallbackPolicy, SessionViewer};

use crate::util::{BrowserClock, JsRng};

pub struct StatusLine {
    pub root: Element,
    pub text: Element,
}

pub struct SessionHeader {
    pub title: HtmlElement,
    pub description: HtmlElement,
    pub banner: HtmlElement,
}

/// Allows one poll at a time. A request older than the timeout no longer
/// holds the gate, and its late answer is ignored.
#[derive(Debug, Default)]
pub struct PollGate {
    next_ticket: u64,
    in_flight: Option<(u64, f64)>,
}

impl PollGate {
    pub fn try_begin(&mut self, now_ms: f64, timeout_ms: f64) -> Option<u64> {
        if let Some((_, started_at)) = self.in_flight {
            if now_ms - started_at < timeout_ms {
                return None;
            }
        }
        self.next_ticket += 1;
        self.in_flight = Some((self.next_ticket, now_ms));
        Some(self.next_ticket)
    }

    /// True when `ticket` is still the current poll and its result should apply.
    pub fn finish(&mut self, ticket: u64) -> bool {
        match self.in_flight {
            Some((current, _)) if current == ticket => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }
}

pub struct State {
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub width: f64,
    pub height: f64,
    pub viewer: SessionViewer<BrowserClock>,
    pub rng: JsRng,
    pub colors: Vec<String>,
    pub status: StatusLine,
    pub header: SessionHeader,
    pub history_el: HtmlElement,
    pub debug: bool,
    pub poll_gate: PollGate,
    /// Session id whose header was last written to the DOM.
    pub shown_session: Option<String>,
}

impl State {
    pub fn new(
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        status: StatusLine,
        header: SessionHeader,
        history_el: HtmlElement,
        policy: FallbackPolicy,
        debug: bool,
    ) -> Self {
        Self {
            canvas,
            ctx,
            width: 0.0,
            height: 0.0,
            viewer: SessionViewer::new(BrowserClock, DrawTimings::default(), policy),
            rng: JsRng,
            colors: Vec::new(),
            status,
            header,
            history_el,
            debug,
            poll_gate: PollGate::default(),
            shown_session: None,
        }
    }

    pub fn log(&self, message: &str) {
        if self.debug {
            web_sys::console::log_1(&message.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PollGate;

    #[test]
    fn second_poll_waits_for_the_first() {
        let mut gate = PollGate::default();
        let first = gate.try_begin(0.0, 3_000.0).unwrap();
        assert_eq!(gate.try_begin(1_000.0, 3_000.0), None);
        assert!(gate.finish(first));
        assert!(gate.try_begin(1_500.0, 3_000.0).is_some());
    }

    #[test]
    fn hung_poll_releases_the_gate_after_the_timeout() {
        let mut gate = PollGate::default();
        let hung = gate.try_begin(0.0, 3_000.0).unwrap();
        let retry = gate.try_begin(3_000.0, 3_000.0).unwrap();
        assert_ne!(hung, retry);
        assert!(!gate.finish(hung));
        assert_eq!(gate.try_begin(4_000.0, 3_000.0), None);
        assert!(gate.finish(retry));
    }
}
