//! `HTMLAudioElement`-backed media element

use crate::backend::{ElementSignal, MediaElement, SignalSink};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlAudioElement;

type SharedSink = Rc<RefCell<Option<SignalSink>>>;

/// One audio element reused for every direct track
///
/// Native listeners are installed once; they forward to whichever sink is
/// currently bound, and go quiet while unbound.
pub struct WebAudioElement {
    element: HtmlAudioElement,
    sink: SharedSink,
    listeners: Vec<(&'static str, Closure<dyn FnMut()>)>,
}

impl WebAudioElement {
    pub fn new() -> Result<Self, JsValue> {
        let element = HtmlAudioElement::new()?;
        element.set_preload("auto");

        let mut this = Self {
            element,
            sink: Rc::new(RefCell::new(None)),
            listeners: Vec::new(),
        };

        this.listen("loadedmetadata", |_| ElementSignal::MetadataLoaded)?;
        this.listen("durationchange", |_| ElementSignal::DurationChanged)?;
        this.listen("timeupdate", |_| ElementSignal::TimeUpdate)?;
        this.listen("playing", |_| ElementSignal::Playing)?;
        this.listen("pause", |_| ElementSignal::Paused)?;
        this.listen("ended", |_| ElementSignal::Ended)?;
        this.listen("error", |element| {
            let code = element.error().map_or(0, |e| e.code());
            ElementSignal::Error(format!("media error code {code}"))
        })?;

        Ok(this)
    }

    fn listen(
        &mut self,
        event: &'static str,
        signal: impl Fn(&HtmlAudioElement) -> ElementSignal + 'static,
    ) -> Result<(), JsValue> {
        let sink = Rc::clone(&self.sink);
        let element = self.element.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            if let Some(sink) = sink.borrow().as_ref() {
                sink.element(signal(&element));
            }
        });

        self.element
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        self.listeners.push((event, closure));
        Ok(())
    }

    fn emit(&self, signal: ElementSignal) {
        if let Some(sink) = self.sink.borrow().as_ref() {
            sink.element(signal);
        }
    }
}

impl MediaElement for WebAudioElement {
    fn bind(&mut self, sink: SignalSink) {
        *self.sink.borrow_mut() = Some(sink);
    }

    fn unbind(&mut self) {
        *self.sink.borrow_mut() = None;
    }

    fn set_source(&mut self, url: &str) {
        self.element.set_src(url);
    }

    fn clear_source(&mut self) {
        let _ = self.element.remove_attribute("src");
        self.element.load();
    }

    fn play(&mut self) {
        let promise = match self.element.play() {
            Ok(promise) => promise,
            Err(e) => {
                self.emit(ElementSignal::PlayRejected(format!("{e:?}")));
                return;
            }
        };

        // Rejections land after the call returns; report them to the sink
        // that was bound when play was requested
        let sink = self.sink.borrow().clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                if let Some(sink) = sink {
                    sink.element(ElementSignal::PlayRejected(format!("{e:?}")));
                }
            }
        });
    }

    fn pause(&mut self) {
        let _ = self.element.pause();
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.element.set_current_time(seconds);
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn duration(&self) -> f64 {
        self.element.duration()
    }

    fn set_volume(&mut self, fraction: f64) {
        self.element.set_volume(fraction.clamp(0.0, 1.0));
    }
}

impl Drop for WebAudioElement {
    fn drop(&mut self) {
        let _ = self.element.pause();
        for (event, closure) in self.listeners.drain(..) {
            let _ = self
                .element
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }
}
