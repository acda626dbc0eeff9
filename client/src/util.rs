use prizewheel_shared::{Clock, FallbackPolicy};
use rand::RngCore;
use wasm_bindgen::JsValue;
use web_sys::Window;

fn random_u32() -> u32 {
    (js_sys::Math::random() * (u32::MAX as f64 + 1.0)) as u32
}

fn random_u64() -> u64 {
    (u64::from(random_u32()) << 32) | u64::from(random_u32())
}

/// `Math.random` behind the `rand` traits. Only feeds cosmetic spins and the
/// opt-in local fallback, never anything that must agree across viewers.
#[derive(Clone, Copy, Default)]
pub struct JsRng;

impl RngCore for JsRng {
    fn next_u32(&mut self) -> u32 {
        random_u32()
    }

    fn next_u64(&mut self) -> u64 {
        random_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = random_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[derive(Clone, Copy, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

fn query_has(window: &Window, pairs: &[&str]) -> bool {
    let search = window.location().search().ok().unwrap_or_default();
    search
        .trim_start_matches('?')
        .split('&')
        .any(|pair| pairs.contains(&pair))
}

pub fn debug_enabled(window: &Window) -> bool {
    query_has(window, &["debug=1", "debug=true", "log=1", "log=true"])
}

pub fn fallback_policy(window: &Window) -> FallbackPolicy {
    if query_has(window, &["fallback=local"]) {
        FallbackPolicy::AllowLocalRandom
    } else {
        FallbackPolicy::RequireCommitted
    }
}

pub fn format_timestamp(ms: u64) -> String {
    let date = js_sys::Date::new(&JsValue::from_f64(ms as f64));
    String::from(date.to_locale_string("default", &JsValue::UNDEFINED))
}
