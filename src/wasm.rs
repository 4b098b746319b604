#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Document, HtmlAnchorElement, HtmlCanvasElement, Window};

use crate::captures::{route_from_hash, Capture, CaptureOptions, ROUTES};
use crate::gl::{GlCanvas, WebGl2Context, DEFAULT_CANVAS_SIZE};

const CANVAS_ID: &str = "canvas";

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let window = window().ok_or_else(|| JsValue::from_str("window not available"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("document not available"))?;
    build_menu(&document).map_err(to_js)?;

    let router = Rc::new(RefCell::new(Router::default()));
    let on_hash_change = {
        let router = Rc::clone(&router);
        Closure::wrap(Box::new(move || {
            if let Err(err) = router.borrow_mut().navigate() {
                report(&err);
            }
        }) as Box<dyn FnMut()>)
    };
    window.set_onhashchange(Some(on_hash_change.as_ref().unchecked_ref()));
    // The listener stays registered for the lifetime of the page.
    on_hash_change.forget();

    let result = router.borrow_mut().navigate();
    result.map_err(to_js)
}

#[derive(Default)]
struct Router {
    running: Option<Running>,
}

impl Router {
    /// Tears down the current capture and starts the one named by the
    /// location hash, if any.
    fn navigate(&mut self) -> Result<()> {
        self.running = None;

        let window = window().ok_or_else(|| anyhow!("window not available"))?;
        let document = window
            .document()
            .ok_or_else(|| anyhow!("document not available"))?;
        let hash = window.location().hash().map_err(js_error)?;
        let hash = String::from(js_sys::decode_uri_component(&hash).map_err(js_error)?);
        let Some(route) = route_from_hash(&hash) else {
            if !hash.is_empty() {
                warn!("no capture named '{hash}'");
            }
            return Ok(());
        };

        let element = replace_canvas(&document)?;
        let context = WebGl2Context::from_canvas(&element)?;
        let canvas = GlCanvas::new(Arc::new(context), DEFAULT_CANVAS_SIZE, DEFAULT_CANVAS_SIZE)?;
        let options = CaptureOptions {
            seed: (js_sys::Math::random() * f64::from(u32::MAX)) as u64,
            ..CaptureOptions::default()
        };
        let capture = route.start(&canvas, &options)?;
        info!("started capture '{}'", route.name);
        self.running = Some(Running::schedule(&window, capture)?);
        Ok(())
    }
}

/// A started capture and the interval timer ticking it.
struct Running {
    timer: Option<i32>,
    _tick: Option<Closure<dyn FnMut()>>,
    _capture: Rc<RefCell<Box<dyn Capture>>>,
}

impl Running {
    fn schedule(window: &Window, capture: Box<dyn Capture>) -> Result<Self> {
        let interval = capture.interval();
        let capture = Rc::new(RefCell::new(capture));
        let Some(interval) = interval else {
            return Ok(Self {
                timer: None,
                _tick: None,
                _capture: capture,
            });
        };

        let tick_capture = Rc::clone(&capture);
        let tick = Closure::wrap(Box::new(move || {
            if let Err(err) = tick_capture.borrow_mut().frame() {
                report(&err);
            }
        }) as Box<dyn FnMut()>);
        let timer = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                interval.as_millis() as i32,
            )
            .map_err(js_error)?;

        Ok(Self {
            timer: Some(timer),
            _tick: Some(tick),
            _capture: capture,
        })
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        if let (Some(timer), Some(window)) = (self.timer, window()) {
            window.clear_interval_with_handle(timer);
        }
    }
}

fn build_menu(document: &Document) -> Result<()> {
    let body = document.body().ok_or_else(|| anyhow!("document has no body"))?;
    for route in ROUTES {
        let link = document
            .create_element("a")
            .map_err(js_error)?
            .dyn_into::<HtmlAnchorElement>()
            .map_err(|_| anyhow!("created element is not an anchor"))?;
        link.set_href(&format!("#{}", route.name));
        link.set_text_content(Some(route.name));
        body.append_child(&link).map_err(js_error)?;
    }
    Ok(())
}

/// Swaps in a fresh canvas so the previous capture's context goes with the
/// old element.
fn replace_canvas(document: &Document) -> Result<HtmlCanvasElement> {
    if let Some(previous) = document.get_element_by_id(CANVAS_ID) {
        previous.remove();
    }
    let canvas = document
        .create_element("canvas")
        .map_err(js_error)?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| anyhow!("created element is not a canvas"))?;
    canvas.set_id(CANVAS_ID);
    canvas.set_width(DEFAULT_CANVAS_SIZE);
    canvas.set_height(DEFAULT_CANVAS_SIZE);
    let body = document.body().ok_or_else(|| anyhow!("document has no body"))?;
    body.append_child(&canvas).map_err(js_error)?;
    Ok(canvas)
}

fn js_error(err: JsValue) -> anyhow::Error {
    anyhow!("{err:?}")
}

fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

fn report(err: &anyhow::Error) {
    web_sys::console::error_1(&JsValue::from_str(&format!("{err:#}")));
}
